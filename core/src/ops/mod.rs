//! Generic CRUD operation engine.
//!
//! One engine implements the create/update/move/delete lifecycle for every
//! artifact type. Per-type behavior is injected through an
//! `ArtifactProfile`: a struct of closures instead of an inheritance
//! hierarchy, so each hook stays swappable and independently testable.
//!
//! Every public operation is async at the call boundary and runs as a single
//! logical transaction: no internal parallelism, no cancellation, no retry.
//! Writes go through the filesystem collaborator's atomic temp-write +
//! rename, so an individual write is never observed half-done; two
//! concurrent updates of the same path can still race at the
//! check-merge-write level, which is an accepted limitation. No error
//! escapes a public operation call — everything becomes a typed outcome.

mod profiles;

pub use profiles::{command_profile, memory_profile, settings_profile};

use crate::artifact::{
    ArtifactKind, OperationOptions, OperationOutcome, ParsedContent, UpdateRequest,
};
use crate::error::ArtifactError;
use crate::fsx::Fs;
use crate::validate::ValidationReport;
use std::path::{Path, PathBuf};

/// Per-artifact-type behavior consumed by the engine.
pub struct ArtifactProfile<'a> {
    pub kind: ArtifactKind,
    /// Validates name, namespace, and placement of a target path.
    pub validate_path: Box<dyn Fn(&Path) -> ValidationReport + Send + Sync + 'a>,
    /// Type-specific content shape check (markdown rules, settings schema).
    pub validate_content: Box<dyn Fn(&ParsedContent) -> ValidationReport + Send + Sync + 'a>,
    pub read_content:
        Box<dyn Fn(&dyn Fs, &Path) -> Result<ParsedContent, ArtifactError> + Send + Sync + 'a>,
    pub write_content:
        Box<dyn Fn(&dyn Fs, &Path, &ParsedContent) -> Result<(), ArtifactError> + Send + Sync + 'a>,
    /// Merge an update request into existing content; pure.
    pub merge_content:
        Box<dyn Fn(ParsedContent, &UpdateRequest) -> ParsedContent + Send + Sync + 'a>,
    /// Post-operation hook, run after a successful mutation. The command
    /// profile uses it to prune now-empty namespace directories.
    pub post_mutate: Box<dyn Fn(&dyn Fs, &Path) + Send + Sync + 'a>,
    /// Subclass-style switch: profiles (or callers) may disable content
    /// validation per call.
    pub validate_content_enabled: bool,
}

/// The generic operation engine. Stateless apart from the injected
/// filesystem collaborator; safe to share across calls.
pub struct CrudEngine<'f> {
    fs: &'f dyn Fs,
}

impl<'f> CrudEngine<'f> {
    pub fn new(fs: &'f dyn Fs) -> Self {
        Self { fs }
    }

    /// Create a new artifact. Fails with `FileAlreadyExists` when the target
    /// exists, unless `force` is set.
    pub async fn create(
        &self,
        profile: &ArtifactProfile<'_>,
        path: &Path,
        content: ParsedContent,
        options: OperationOptions,
    ) -> OperationOutcome {
        if options.dry_run {
            return OperationOutcome::succeeded(
                format!("dry run: would create {} {}", profile.kind, path.display()),
                path,
            );
        }
        self.run(|| self.do_create(profile, path, content, options))
    }

    /// Update an artifact: shallow-merge metadata, replace the body when
    /// supplied. A missing target is created instead of failing.
    pub async fn update(
        &self,
        profile: &ArtifactProfile<'_>,
        path: &Path,
        request: UpdateRequest,
        options: OperationOptions,
    ) -> OperationOutcome {
        if options.dry_run {
            return OperationOutcome::succeeded(
                format!("dry run: would update {} {}", profile.kind, path.display()),
                path,
            );
        }
        self.run(|| self.do_update(profile, path, request, options))
    }

    /// Move an artifact. The source must exist; the destination must not,
    /// unless `force` is set.
    pub async fn move_artifact(
        &self,
        profile: &ArtifactProfile<'_>,
        from: &Path,
        to: &Path,
        options: OperationOptions,
    ) -> OperationOutcome {
        if options.dry_run {
            return OperationOutcome::succeeded(
                format!(
                    "dry run: would move {} {} to {}",
                    profile.kind,
                    from.display(),
                    to.display()
                ),
                to,
            );
        }
        self.run(|| self.do_move(profile, from, to, options))
    }

    /// Delete an artifact. The target must exist.
    pub async fn delete(
        &self,
        profile: &ArtifactProfile<'_>,
        path: &Path,
        options: OperationOptions,
    ) -> OperationOutcome {
        if options.dry_run {
            return OperationOutcome::succeeded(
                format!("dry run: would delete {} {}", profile.kind, path.display()),
                path,
            );
        }
        self.run(|| self.do_delete(profile, path, options))
    }

    /// Central failure boundary: errors raised anywhere in an operation
    /// become a typed failure outcome.
    fn run(
        &self,
        op: impl FnOnce() -> Result<OperationOutcome, ArtifactError>,
    ) -> OperationOutcome {
        match op() {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::debug!("operation failed: {error}");
                OperationOutcome::failed(error)
            }
        }
    }

    fn do_create(
        &self,
        profile: &ArtifactProfile<'_>,
        path: &Path,
        content: ParsedContent,
        options: OperationOptions,
    ) -> Result<OperationOutcome, ArtifactError> {
        self.check_path(profile, path)?;

        if self.fs.exists(path) && !options.force {
            return Err(ArtifactError::FileAlreadyExists {
                path: path.to_path_buf(),
            });
        }

        self.check_content(profile, &content)?;
        self.ensure_parent(path)?;

        let mut outcome = OperationOutcome::succeeded(
            format!("created {} {}", profile.kind, path.display()),
            path,
        );
        self.maybe_backup(path, options, &mut outcome);

        (profile.write_content)(self.fs, path, &content)?;
        (profile.post_mutate)(self.fs, path);
        Ok(outcome)
    }

    fn do_update(
        &self,
        profile: &ArtifactProfile<'_>,
        path: &Path,
        request: UpdateRequest,
        options: OperationOptions,
    ) -> Result<OperationOutcome, ArtifactError> {
        self.check_path(profile, path)?;

        // Update creates when the target is missing; there is nothing to
        // merge with in that case.
        let merged = if self.fs.exists(path) {
            let existing = (profile.read_content)(self.fs, path)?;
            (profile.merge_content)(existing, &request)
        } else {
            ParsedContent {
                metadata: request.metadata.clone(),
                body: request.body.clone().unwrap_or_default(),
            }
        };

        self.check_content(profile, &merged)?;
        self.ensure_parent(path)?;

        let mut outcome = OperationOutcome::succeeded(
            format!("updated {} {}", profile.kind, path.display()),
            path,
        );
        self.maybe_backup(path, options, &mut outcome);

        (profile.write_content)(self.fs, path, &merged)?;
        (profile.post_mutate)(self.fs, path);
        Ok(outcome)
    }

    fn do_move(
        &self,
        profile: &ArtifactProfile<'_>,
        from: &Path,
        to: &Path,
        options: OperationOptions,
    ) -> Result<OperationOutcome, ArtifactError> {
        self.check_path(profile, from)?;
        self.check_path(profile, to)?;

        if !self.fs.exists(from) {
            return Err(ArtifactError::FileNotFound {
                path: from.to_path_buf(),
            });
        }
        if self.fs.exists(to) && !options.force {
            return Err(ArtifactError::FileAlreadyExists {
                path: to.to_path_buf(),
            });
        }

        self.ensure_parent(to)?;

        let mut outcome = OperationOutcome::succeeded(
            format!("moved {} {} to {}", profile.kind, from.display(), to.display()),
            to,
        );
        self.maybe_backup(to, options, &mut outcome);

        self.fs
            .rename(from, to)
            .map_err(|e| ArtifactError::from_io(e, from, "move"))?;

        (profile.post_mutate)(self.fs, from);
        Ok(outcome)
    }

    fn do_delete(
        &self,
        profile: &ArtifactProfile<'_>,
        path: &Path,
        options: OperationOptions,
    ) -> Result<OperationOutcome, ArtifactError> {
        self.check_path(profile, path)?;

        if !self.fs.exists(path) {
            return Err(ArtifactError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut outcome = OperationOutcome::succeeded(
            format!("deleted {} {}", profile.kind, path.display()),
            path,
        );
        self.maybe_backup(path, options, &mut outcome);

        self.fs
            .remove_file(path)
            .map_err(|e| ArtifactError::from_io(e, path, "delete"))?;

        (profile.post_mutate)(self.fs, path);
        Ok(outcome)
    }

    fn check_path(&self, profile: &ArtifactProfile<'_>, path: &Path) -> Result<(), ArtifactError> {
        let report = (profile.validate_path)(path);
        if report.valid {
            Ok(())
        } else {
            Err(ArtifactError::InvalidPath {
                path: path.to_path_buf(),
                reason: join_errors(&report),
            })
        }
    }

    fn check_content(
        &self,
        profile: &ArtifactProfile<'_>,
        content: &ParsedContent,
    ) -> Result<(), ArtifactError> {
        if !profile.validate_content_enabled {
            return Ok(());
        }
        let report = (profile.validate_content)(content);
        if report.valid {
            Ok(())
        } else {
            Err(ArtifactError::InvalidContent(join_errors(&report)))
        }
    }

    fn ensure_parent(&self, path: &Path) -> Result<(), ArtifactError> {
        if let Some(parent) = path.parent() {
            self.fs
                .create_dir_all(parent)
                .map_err(|e| ArtifactError::from_io(e, parent, "create directory"))?;
        }
        Ok(())
    }

    /// Best-effort backup of the current target. A failure to back up is a
    /// warning on the outcome, never an abort of the primary operation.
    fn maybe_backup(&self, path: &Path, options: OperationOptions, outcome: &mut OperationOutcome) {
        if !options.backup || !self.fs.exists(path) {
            return;
        }
        let backup_path = backup_path_for(path);
        match self.fs.copy(path, &backup_path) {
            Ok(()) => {
                outcome
                    .warnings
                    .push(format!("backup written to {}", backup_path.display()));
            }
            Err(e) => {
                tracing::warn!("backup of {} failed: {e}", path.display());
                outcome
                    .warnings
                    .push(format!("backup of {} failed: {e}", path.display()));
            }
        }
    }
}

/// Timestamped sibling path: `<original>.backup.<rfc3339>` with colons
/// replaced so the name is portable.
fn backup_path_for(path: &Path) -> PathBuf {
    let stamp = chrono::Utc::now()
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        .replace(':', "-");
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".backup.{stamp}"));
    PathBuf::from(name)
}

fn join_errors(report: &ValidationReport) -> String {
    report
        .errors
        .iter()
        .map(|i| i.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}
