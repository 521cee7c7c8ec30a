//! Multi-scope artifact discovery.
//!
//! `ScopeWalker` is an explicit, lazy iterator over the files of one scope
//! base directory, decoupled from candidate construction. `discover` drives
//! one walker per scope, builds annotated candidates, and hands the flat
//! list to the precedence resolver.
//!
//! Discovery never raises: missing scope directories contribute zero
//! candidates, and a file that fails to parse is still reported as a
//! candidate without parsed content.

use crate::artifact::{ArtifactCandidate, ArtifactKind, DiscoverySnapshot, MAX_NAMESPACE_DEPTH};
use crate::codec;
use crate::fsx::Fs;
use crate::paths::{MEMORY_FILE, PathResolver, SETTINGS_FILE, SETTINGS_LOCAL_FILE};
use crate::precedence;
use crate::scope::{ScopeDir, ScopeKind};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Suffix marking an artifact as disabled by the surrounding tooling.
/// Discovery still reports such files; the suffix stays part of the name.
pub const INACTIVE_SUFFIX: &str = ".inactive";

enum WalkItem {
    Dir(PathBuf, usize),
    File(PathBuf),
}

/// Lazy depth-first walk of one scope directory: within each directory,
/// subdirectories are visited before files, both in sorted order. The walk
/// refuses to enter the same physical directory twice (symlink cycles) and
/// never descends past the namespace depth bound.
pub struct ScopeWalker<'a> {
    fs: &'a dyn Fs,
    extension: &'static str,
    stack: Vec<WalkItem>,
    visited: HashSet<PathBuf>,
}

impl<'a> ScopeWalker<'a> {
    pub fn new(fs: &'a dyn Fs, base: &Path, extension: &'static str) -> Self {
        Self {
            fs,
            extension,
            stack: vec![WalkItem::Dir(base.to_path_buf(), 0)],
            visited: HashSet::new(),
        }
    }

    fn expand_dir(&mut self, dir: PathBuf, depth: usize) {
        // Guard against symlink cycles via the physical directory identity.
        match self.fs.canonicalize(&dir) {
            Ok(physical) => {
                if !self.visited.insert(physical) {
                    tracing::debug!("skipping already-visited directory {}", dir.display());
                    return;
                }
            }
            Err(_) => return,
        }

        let entries = match self.fs.list_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("cannot list {}: {e}", dir.display());
                return;
            }
        };

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in entries {
            match self.fs.stat(&entry) {
                Ok(stat) if stat.is_dir => dirs.push(entry),
                Ok(stat) if stat.is_file => files.push(entry),
                _ => {}
            }
        }

        // LIFO stack: push files first so directories pop (and recurse)
        // before this directory's own files are yielded.
        for file in files.into_iter().rev() {
            self.stack.push(WalkItem::File(file));
        }
        if depth < MAX_NAMESPACE_DEPTH {
            for sub in dirs.into_iter().rev() {
                self.stack.push(WalkItem::Dir(sub, depth + 1));
            }
        } else if !dirs.is_empty() {
            tracing::debug!(
                "not descending below {} (namespace depth limit {MAX_NAMESPACE_DEPTH})",
                dir.display()
            );
        }
    }
}

impl Iterator for ScopeWalker<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            match self.stack.pop()? {
                WalkItem::File(path) => {
                    let matches = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .and_then(|n| artifact_name(n, self.extension))
                        .is_some();
                    if matches {
                        return Some(path);
                    }
                }
                WalkItem::Dir(dir, depth) => self.expand_dir(dir, depth),
            }
        }
    }
}

/// Derive the logical name from a file name, or `None` when the extension
/// does not match the kind. An `.inactive` variant keeps the suffix in the
/// derived name, so it never collides with its active sibling.
pub(crate) fn artifact_name(file_name: &str, extension: &str) -> Option<String> {
    let active = format!(".{extension}");
    if let Some(stem) = file_name.strip_suffix(&active) {
        return Some(stem.to_string());
    }
    let inactive = format!(".{extension}{INACTIVE_SUFFIX}");
    file_name
        .strip_suffix(&inactive)
        .map(|stem| format!("{stem}{INACTIVE_SUFFIX}"))
}

fn namespace_of(base: &Path, file: &Path) -> Option<String> {
    let parent = file.parent()?;
    let relative = parent.strip_prefix(base).ok()?;
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

fn build_candidate(
    fs: &dyn Fs,
    kind: ArtifactKind,
    scope: &ScopeDir,
    path: PathBuf,
    name: String,
    namespace: Option<String>,
) -> ArtifactCandidate {
    let content = match fs.read_to_string(&path) {
        Ok(raw) => match codec::parse(kind, &raw) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("cannot parse {}: {e}", path.display());
                None
            }
        },
        Err(e) => {
            tracing::warn!("cannot read {}: {e}", path.display());
            None
        }
    };

    ArtifactCandidate {
        name,
        namespace,
        scope: scope.kind,
        scope_rank: scope.rank,
        path,
        content,
        is_active: false,
        overridden_by: None,
    }
}

/// Fixed-name artifacts (settings and memory) are probed directly instead of
/// walked; the `.inactive` variant of each file is probed as well.
fn probe_fixed(
    fs: &dyn Fs,
    kind: ArtifactKind,
    scope: &ScopeDir,
    file_name: &str,
    out: &mut Vec<ArtifactCandidate>,
) {
    for candidate_name in [file_name.to_string(), format!("{file_name}{INACTIVE_SUFFIX}")] {
        let path = scope.dir.join(&candidate_name);
        if !fs.exists(&path) {
            continue;
        }
        if let Some(name) = artifact_name(&candidate_name, kind.extension()) {
            out.push(build_candidate(fs, kind, scope, path, name, None));
        }
    }
}

/// Walk every scope for an artifact kind and resolve precedence.
///
/// Returns a fresh snapshot on every call; nothing is cached, so the result
/// always reflects the filesystem as it was at scan time.
pub fn discover(resolver: &PathResolver, kind: ArtifactKind, fs: &dyn Fs) -> DiscoverySnapshot {
    let mut candidates = Vec::new();

    for scope in resolver.scopes(kind, fs) {
        match kind {
            ArtifactKind::Command => {
                for path in ScopeWalker::new(fs, &scope.dir, kind.extension()) {
                    let Some(name) = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .and_then(|n| artifact_name(n, kind.extension()))
                    else {
                        continue;
                    };
                    let namespace = namespace_of(&scope.dir, &path);
                    candidates.push(build_candidate(fs, kind, &scope, path, name, namespace));
                }
            }
            ArtifactKind::Settings => {
                probe_fixed(fs, kind, &scope, SETTINGS_FILE, &mut candidates);
                // The local overlay exists at project scope only.
                if scope.kind == ScopeKind::Project {
                    probe_fixed(fs, kind, &scope, SETTINGS_LOCAL_FILE, &mut candidates);
                }
            }
            ArtifactKind::Memory => {
                probe_fixed(fs, kind, &scope, MEMORY_FILE, &mut candidates);
            }
        }
    }

    tracing::debug!("discovered {} {kind} candidate(s)", candidates.len());
    precedence::resolve(candidates)
}
