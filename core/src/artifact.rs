//! Core data model: artifact kinds, discovered candidates, conflict records,
//! discovery snapshots, and the request/outcome types shared by every CRUD
//! operation.
//!
//! Candidates and snapshots are constructed fresh per discovery call and
//! discarded after use; there is no long-lived in-memory index.

use crate::error::ArtifactError;
use crate::scope::ScopeKind;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Maximum namespace nesting depth for command artifacts.
pub const MAX_NAMESPACE_DEPTH: usize = 3;

/// The three artifact families managed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Namespaced markdown slash-command files with optional YAML frontmatter.
    Command,
    /// JSON settings files (`settings.json`, `settings.local.json`).
    Settings,
    /// Markdown memory files (`CLAUDE.md`).
    Memory,
}

impl ArtifactKind {
    /// File extension (without the dot) expected for this kind.
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Command | ArtifactKind::Memory => "md",
            ArtifactKind::Settings => "json",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Command => "command",
            ArtifactKind::Settings => "settings",
            ArtifactKind::Memory => "memory",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical content of an artifact after decoding.
///
/// For commands the metadata is the YAML frontmatter mapping (converted to a
/// JSON value) and the body is the markdown below it. For settings the whole
/// JSON document is the metadata and the body is empty. For memory files the
/// body is the whole file.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParsedContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub body: String,
}

impl ParsedContent {
    pub fn body_only(body: impl Into<String>) -> Self {
        Self {
            metadata: None,
            body: body.into(),
        }
    }

    pub fn with_metadata(metadata: serde_json::Value, body: impl Into<String>) -> Self {
        Self {
            metadata: Some(metadata),
            body: body.into(),
        }
    }
}

/// One discovered file on disk, annotated with scope and identity.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactCandidate {
    /// Logical identifier: filename minus extension, or a fixed constant for
    /// settings and memory files.
    pub name: String,
    /// Slash-joined relative directory path under the scope base, if nested.
    pub namespace: Option<String>,
    pub scope: ScopeKind,
    pub scope_rank: i32,
    pub path: PathBuf,
    /// Present only when the file parsed cleanly; corrupted files are still
    /// discovered, just without parsed content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ParsedContent>,
    /// Set by the precedence resolver: exactly one candidate per identity.
    pub is_active: bool,
    /// Absolute path of the winning candidate, set on every losing candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overridden_by: Option<PathBuf>,
}

impl ArtifactCandidate {
    /// Conflict-grouping key: `namespace:name` when namespaced, else `name`.
    pub fn full_identity(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}:{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Emitted once per identity that had two or more candidates.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictRecord {
    pub identity: String,
    /// The winning candidate (also present in `conflicting_candidates`).
    pub resolved: ArtifactCandidate,
    pub conflicting_candidates: Vec<ArtifactCandidate>,
}

/// Immutable result of one discovery pass over every scope of one kind.
///
/// Recomputed on demand; discovery always re-reads the filesystem so the
/// snapshot reflects concurrent external edits.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoverySnapshot {
    pub candidates: Vec<ArtifactCandidate>,
    pub conflicts: Vec<ConflictRecord>,
    pub namespaces: BTreeSet<String>,
}

impl DiscoverySnapshot {
    /// Candidates that won precedence resolution.
    pub fn active(&self) -> impl Iterator<Item = &ArtifactCandidate> {
        self.candidates.iter().filter(|c| c.is_active)
    }

    /// The active candidate for an identity, if any copy exists.
    pub fn find(&self, identity: &str) -> Option<&ArtifactCandidate> {
        self.candidates
            .iter()
            .find(|c| c.is_active && c.full_identity() == identity)
    }

    /// All candidates for an identity, winner first.
    pub fn all_for(&self, identity: &str) -> Vec<&ArtifactCandidate> {
        let mut group: Vec<&ArtifactCandidate> = self
            .candidates
            .iter()
            .filter(|c| c.full_identity() == identity)
            .collect();
        group.sort_by(|a, b| b.scope_rank.cmp(&a.scope_rank));
        group
    }
}

/// Per-call behavior switches for CRUD operations. Never persisted.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationOptions {
    /// Report the would-be effect without touching the filesystem.
    pub dry_run: bool,
    /// Copy the current target to a timestamped sibling before mutating.
    pub backup: bool,
    /// Overwrite on create, clobber the destination on move.
    pub force: bool,
}

/// Payload for `update`: only the supplied parts change.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    /// Shallow-merged over the existing metadata; supplied keys win.
    pub metadata: Option<serde_json::Value>,
    /// Replaces the body wholesale when present.
    pub body: Option<String>,
}

/// Synchronous result of one CRUD operation. Ephemeral, never stored.
#[derive(Debug)]
pub struct OperationOutcome {
    pub success: bool,
    pub message: String,
    pub file_path: Option<PathBuf>,
    pub warnings: Vec<String>,
    pub error: Option<ArtifactError>,
}

impl OperationOutcome {
    pub fn succeeded(message: impl Into<String>, path: &Path) -> Self {
        Self {
            success: true,
            message: message.into(),
            file_path: Some(path.to_path_buf()),
            warnings: Vec::new(),
            error: None,
        }
    }

    pub fn failed(error: ArtifactError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            file_path: None,
            warnings: Vec::new(),
            error: Some(error),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}
