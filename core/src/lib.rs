//! confscope-core: discovery, precedence resolution, and generic CRUD for
//! layered Claude-style configuration artifacts.
//!
//! Three artifact kinds — markdown slash commands, JSON settings files, and
//! markdown memory files — may exist at a user scope, a project scope, and
//! any number of ancestor scopes at once. This crate finds every copy,
//! decides deterministically which one is authoritative, and applies one
//! validate → backup → write → cleanup lifecycle to every mutation.
//!
//! The library never installs a logging subscriber or reads the
//! environment: the home directory is injected into [`paths::PathResolver`],
//! byte-level I/O goes through the [`fsx::Fs`] collaborator, and `tracing`
//! events go to whatever dispatcher the embedding application configured.

pub mod artifact;
pub mod codec;
pub mod discover;
pub mod error;
pub mod fsx;
pub mod hooks;
pub mod ops;
pub mod paths;
pub mod precedence;
pub mod scope;
pub mod validate;

pub use artifact::{
    ArtifactCandidate, ArtifactKind, ConflictRecord, DiscoverySnapshot, OperationOptions,
    OperationOutcome, ParsedContent, UpdateRequest,
};
pub use discover::discover;
pub use error::ArtifactError;
pub use fsx::{Fs, RealFs};
pub use ops::{ArtifactProfile, CrudEngine, command_profile, memory_profile, settings_profile};
pub use paths::PathResolver;
pub use scope::{ScopeDir, ScopeKind};
pub use validate::ValidationReport;
