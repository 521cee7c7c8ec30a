//! Scope model: where an artifact lives and how strongly it binds.
//!
//! Three scope kinds exist per resolution: one user scope, one project scope,
//! and zero or more parent scopes walking upward from the project directory.
//! Precedence is decided purely by integer rank: PROJECT outranks every
//! PARENT, nearer parents outrank farther ones, and USER ranks lowest.

use serde::Serialize;
use std::path::PathBuf;

/// Rank of the project scope. Always wins.
pub const PROJECT_RANK: i32 = 300;
/// Base rank of the nearest parent scope; each level farther up subtracts one.
pub const PARENT_BASE_RANK: i32 = 200;
/// Rank of the user-home scope. Always loses to project and parent scopes.
pub const USER_RANK: i32 = 100;

/// The kind of scope a discovered artifact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// `<home>/.claude/...` — applies to every project of the user.
    User,
    /// `<project-root>/.claude/...` — the project itself.
    Project,
    /// An ancestor directory of the project root carrying its own app dir.
    Parent,
}

impl ScopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeKind::User => "user",
            ScopeKind::Project => "project",
            ScopeKind::Parent => "parent",
        }
    }
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resolved scope base directory for a given artifact kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeDir {
    pub kind: ScopeKind,
    /// Precedence rank; unique per scope within one resolution.
    pub rank: i32,
    /// Base directory the discoverer walks for this scope.
    pub dir: PathBuf,
}

impl ScopeDir {
    pub fn project(dir: PathBuf) -> Self {
        Self {
            kind: ScopeKind::Project,
            rank: PROJECT_RANK,
            dir,
        }
    }

    /// `level` is 1-based: 1 is the directory immediately above the project.
    pub fn parent(dir: PathBuf, level: u32) -> Self {
        Self {
            kind: ScopeKind::Parent,
            rank: PARENT_BASE_RANK - (level as i32 - 1),
            dir,
        }
    }

    pub fn user(dir: PathBuf) -> Self {
        Self {
            kind: ScopeKind::User,
            rank: USER_RANK,
            dir,
        }
    }
}
