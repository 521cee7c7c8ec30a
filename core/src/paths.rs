//! Scope directory resolution.
//!
//! Computes the absolute base directories that constitute each scope (user,
//! project, ancestors) for a given artifact kind. Resolution never errors:
//! an inaccessible or nonexistent directory simply contributes zero
//! candidates downstream.

use crate::artifact::ArtifactKind;
use crate::fsx::Fs;
use crate::scope::ScopeDir;
use std::path::{Path, PathBuf};

/// App directory name used at every scope.
pub const DEFAULT_APP_DIR: &str = ".claude";
/// Subdirectory of the app dir holding slash-command files.
pub const COMMANDS_DIR: &str = "commands";
/// Fixed memory file name.
pub const MEMORY_FILE: &str = "CLAUDE.md";
/// Fixed settings file names at any scope.
pub const SETTINGS_FILE: &str = "settings.json";
/// Project-only settings overlay, kept out of version control by convention.
pub const SETTINGS_LOCAL_FILE: &str = "settings.local.json";
/// How many ancestor levels the parent walk may climb before giving up.
pub const DEFAULT_MAX_PARENT_DEPTH: u32 = 10;

/// Computes scope base directories for one project root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    project_root: PathBuf,
    home_dir: PathBuf,
    app_dir: String,
    max_parent_depth: u32,
}

impl PathResolver {
    /// The home directory is injected rather than read from the environment
    /// so tests and embedders control the user scope.
    pub fn new(project_root: impl Into<PathBuf>, home_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            home_dir: home_dir.into(),
            app_dir: DEFAULT_APP_DIR.to_string(),
            max_parent_depth: DEFAULT_MAX_PARENT_DEPTH,
        }
    }

    pub fn with_app_dir(mut self, app_dir: impl Into<String>) -> Self {
        self.app_dir = app_dir.into();
        self
    }

    pub fn with_max_parent_depth(mut self, depth: u32) -> Self {
        self.max_parent_depth = depth;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    /// Base directory for a kind under one scope root.
    ///
    /// Memory files live directly at the scope root (`<root>/CLAUDE.md`),
    /// except at user scope where they live inside the app dir.
    fn base_under(&self, root: &Path, kind: ArtifactKind) -> PathBuf {
        match kind {
            ArtifactKind::Command => root.join(&self.app_dir).join(COMMANDS_DIR),
            ArtifactKind::Settings => root.join(&self.app_dir),
            ArtifactKind::Memory => root.to_path_buf(),
        }
    }

    /// Whether an ancestor directory carries this kind's fixed subpath and
    /// therefore becomes a PARENT scope entry.
    fn ancestor_qualifies(&self, fs: &dyn Fs, root: &Path, kind: ArtifactKind) -> bool {
        match kind {
            ArtifactKind::Command => fs.exists(&root.join(&self.app_dir).join(COMMANDS_DIR)),
            ArtifactKind::Settings => {
                let app = root.join(&self.app_dir);
                fs.exists(&app.join(SETTINGS_FILE)) || fs.exists(&app.join(SETTINGS_LOCAL_FILE))
            }
            ArtifactKind::Memory => fs.exists(&root.join(MEMORY_FILE)),
        }
    }

    /// All scope base directories for a kind, highest precedence first:
    /// project, then ancestors nearest-first, then user.
    ///
    /// The parent walk climbs from the project root's parent and stops at
    /// the first ancestor without the kind's fixed subpath, at the
    /// filesystem root, or once `max_parent_depth` is exceeded.
    pub fn scopes(&self, kind: ArtifactKind, fs: &dyn Fs) -> Vec<ScopeDir> {
        let mut scopes = vec![ScopeDir::project(self.base_under(&self.project_root, kind))];

        let mut current = self.project_root.parent();
        let mut level: u32 = 1;
        while let Some(ancestor) = current {
            if level > self.max_parent_depth {
                tracing::debug!(
                    "parent walk stopped at depth {} above {}",
                    self.max_parent_depth,
                    self.project_root.display()
                );
                break;
            }
            if !self.ancestor_qualifies(fs, ancestor, kind) {
                break;
            }
            scopes.push(ScopeDir::parent(self.base_under(ancestor, kind), level));
            current = ancestor.parent();
            level += 1;
        }

        let user_base = match kind {
            // User memory sits inside the app dir, not at $HOME itself.
            ArtifactKind::Memory => self.home_dir.join(&self.app_dir),
            _ => self.base_under(&self.home_dir, kind),
        };
        scopes.push(ScopeDir::user(user_base));

        scopes
    }
}
