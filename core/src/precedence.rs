//! Deterministic precedence resolution across scopes.
//!
//! A pure, synchronous function over the candidate list: no I/O, and the
//! same input set (in any order) always produces the same winners. Within
//! one identity the highest scope rank wins; ranks are unique per scope in a
//! single resolution, so a rank tie means the caller discovered the same
//! physical scope twice — first-discovered wins deterministically.

use crate::artifact::{ArtifactCandidate, ConflictRecord, DiscoverySnapshot};
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Mark exactly one candidate per identity active, set `overridden_by` on
/// every loser, and emit one conflict record per identity with two or more
/// candidates.
pub fn resolve(mut candidates: Vec<ArtifactCandidate>) -> DiscoverySnapshot {
    for candidate in &mut candidates {
        candidate.is_active = false;
        candidate.overridden_by = None;
    }

    // BTreeMap keeps conflict output ordered by identity regardless of
    // discovery order.
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, candidate) in candidates.iter().enumerate() {
        groups.entry(candidate.full_identity()).or_default().push(idx);
    }

    let mut conflicts = Vec::new();

    for (identity, mut group) in groups {
        // Stable: equal ranks keep discovery order, so the first-discovered
        // candidate wins a (caller-bug) tie.
        group.sort_by(|a, b| candidates[*b].scope_rank.cmp(&candidates[*a].scope_rank));

        let winner_idx = group[0];
        candidates[winner_idx].is_active = true;
        let winner_path = candidates[winner_idx].path.clone();

        for &loser_idx in &group[1..] {
            candidates[loser_idx].overridden_by = Some(winner_path.clone());
        }

        if group.len() >= 2 {
            tracing::debug!(
                "identity '{identity}' has {} candidates; {} wins",
                group.len(),
                winner_path.display()
            );
            conflicts.push(ConflictRecord {
                identity,
                resolved: candidates[winner_idx].clone(),
                conflicting_candidates: group.iter().map(|&i| candidates[i].clone()).collect(),
            });
        }
    }

    let namespaces: BTreeSet<String> = candidates
        .iter()
        .filter_map(|c| c.namespace.clone())
        .collect();

    DiscoverySnapshot {
        candidates,
        conflicts,
        namespaces,
    }
}
