//! Artifact profiles: the per-type hook sets consumed by the engine.
//!
//! Each constructor captures the scope base directory it operates under;
//! path validation and empty-directory pruning are both anchored there.

use super::ArtifactProfile;
use crate::artifact::{ArtifactKind, ParsedContent, UpdateRequest};
use crate::codec;
use crate::discover::{INACTIVE_SUFFIX, artifact_name};
use crate::error::ArtifactError;
use crate::fsx::Fs;
use crate::paths::{MEMORY_FILE, SETTINGS_FILE, SETTINGS_LOCAL_FILE};
use crate::validate::{
    ValidationReport, validate_command_markdown, validate_name, validate_namespace,
    validate_placement, validate_settings_schema,
};
use std::path::{Path, PathBuf};

fn extend(into: &mut ValidationReport, from: ValidationReport) {
    if !from.valid {
        into.valid = false;
    }
    into.errors.extend(from.errors);
    into.warnings.extend(from.warnings);
}

/// Shallow merge per the update contract: supplied metadata keys win,
/// the body is replaced only when the request carries one.
fn merge_shallow(existing: ParsedContent, request: &UpdateRequest) -> ParsedContent {
    let metadata = match (existing.metadata, request.metadata.clone()) {
        (current, None) => current,
        (Some(serde_json::Value::Object(mut base)), Some(serde_json::Value::Object(update))) => {
            for (key, value) in update {
                base.insert(key, value);
            }
            Some(serde_json::Value::Object(base))
        }
        // Existing metadata absent or not an object: the update wins wholesale.
        (_, Some(update)) => Some(update),
    };

    ParsedContent {
        metadata,
        body: request.body.clone().unwrap_or(existing.body),
    }
}

fn read_via_codec(kind: ArtifactKind, fs: &dyn Fs, path: &Path) -> Result<ParsedContent, ArtifactError> {
    let raw = fs
        .read_to_string(path)
        .map_err(|e| ArtifactError::from_io(e, path, "read"))?;
    codec::parse(kind, &raw)
}

fn write_via_codec(
    kind: ArtifactKind,
    fs: &dyn Fs,
    path: &Path,
    content: &ParsedContent,
) -> Result<(), ArtifactError> {
    let raw = codec::serialize(kind, content)?;
    fs.write_atomic(path, &raw)
        .map_err(|e| ArtifactError::from_io(e, path, "write"))
}

/// Derive the namespace from a path's parent relative to the base. `Err`
/// when the path is not under the base at all.
fn namespace_under(base: &Path, path: &Path) -> Result<Option<String>, String> {
    let parent = path
        .parent()
        .ok_or_else(|| format!("'{}' has no parent directory", path.display()))?;
    let relative = parent
        .strip_prefix(base)
        .map_err(|_| format!("'{}' is outside the scope directory {}", path.display(), base.display()))?;
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    })
}

/// Prune namespace directories that became empty, walking upward and
/// stopping at the scope's commands base.
fn prune_empty_dirs(fs: &dyn Fs, base: &Path, start: &Path) {
    let mut current = start.parent();
    while let Some(dir) = current {
        if dir == base || !dir.starts_with(base) {
            break;
        }
        match fs.list_dir(dir) {
            Ok(entries) if entries.is_empty() => {
                if let Err(e) = fs.remove_empty_dir(dir) {
                    tracing::debug!("could not prune {}: {e}", dir.display());
                    break;
                }
                tracing::debug!("pruned empty namespace directory {}", dir.display());
            }
            _ => break,
        }
        current = dir.parent();
    }
}

/// Profile for namespaced markdown slash-command files under one scope's
/// commands directory.
pub fn command_profile(base: &Path) -> ArtifactProfile<'static> {
    let validate_base = base.to_path_buf();
    let prune_base = base.to_path_buf();

    ArtifactProfile {
        kind: ArtifactKind::Command,
        validate_path: Box::new(move |path: &Path| {
            let mut report = ValidationReport::ok();

            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| artifact_name(n, "md"));
            let Some(name) = name else {
                report.push_error(
                    format!("'{}' is not a markdown command file", path.display()),
                    Some("command files use the .md extension".to_string()),
                );
                return report;
            };
            let bare = name.strip_suffix(INACTIVE_SUFFIX).unwrap_or(&name);
            extend(&mut report, validate_name(bare));

            match namespace_under(&validate_base, path) {
                Err(reason) => report.push_error(reason, None),
                Ok(None) => {}
                Ok(Some(ns)) => {
                    extend(&mut report, validate_namespace(&ns));
                    extend(&mut report, validate_placement(path, &validate_base, Some(&ns)));
                }
            }

            report
        }),
        validate_content: Box::new(|content: &ParsedContent| {
            match codec::serialize_frontmatter(content) {
                Ok(raw) => validate_command_markdown(&raw),
                Err(e) => {
                    let mut report = ValidationReport::ok();
                    report.push_error(format!("content cannot be serialized: {e}"), None);
                    report
                }
            }
        }),
        read_content: Box::new(|fs, path| read_via_codec(ArtifactKind::Command, fs, path)),
        write_content: Box::new(|fs, path, content| {
            write_via_codec(ArtifactKind::Command, fs, path, content)
        }),
        merge_content: Box::new(merge_shallow),
        post_mutate: Box::new(move |fs, path| prune_empty_dirs(fs, &prune_base, path)),
        validate_content_enabled: true,
    }
}

/// Profile for the fixed-name JSON settings files of one scope.
pub fn settings_profile(base: &Path) -> ArtifactProfile<'static> {
    let validate_base = base.to_path_buf();

    ArtifactProfile {
        kind: ArtifactKind::Settings,
        validate_path: Box::new(move |path: &Path| {
            let mut report = ValidationReport::ok();

            let allowed = [
                SETTINGS_FILE.to_string(),
                SETTINGS_LOCAL_FILE.to_string(),
                format!("{SETTINGS_FILE}{INACTIVE_SUFFIX}"),
                format!("{SETTINGS_LOCAL_FILE}{INACTIVE_SUFFIX}"),
            ];
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if !allowed.contains(&file_name.to_string()) {
                report.push_error(
                    format!("'{file_name}' is not a settings file"),
                    Some(format!("use {SETTINGS_FILE} or {SETTINGS_LOCAL_FILE}")),
                );
            }
            extend(&mut report, validate_placement(path, &validate_base, None));
            report
        }),
        validate_content: Box::new(|content: &ParsedContent| {
            let empty = serde_json::Value::Object(serde_json::Map::new());
            validate_settings_schema(content.metadata.as_ref().unwrap_or(&empty))
        }),
        read_content: Box::new(|fs, path| read_via_codec(ArtifactKind::Settings, fs, path)),
        write_content: Box::new(|fs, path, content| {
            write_via_codec(ArtifactKind::Settings, fs, path, content)
        }),
        merge_content: Box::new(merge_shallow),
        post_mutate: Box::new(|_fs, _path| {}),
        validate_content_enabled: true,
    }
}

/// Profile for the fixed-name markdown memory file of one scope.
pub fn memory_profile(base: &Path) -> ArtifactProfile<'static> {
    let validate_base: PathBuf = base.to_path_buf();

    ArtifactProfile {
        kind: ArtifactKind::Memory,
        validate_path: Box::new(move |path: &Path| {
            let mut report = ValidationReport::ok();

            let allowed = [
                MEMORY_FILE.to_string(),
                format!("{MEMORY_FILE}{INACTIVE_SUFFIX}"),
            ];
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if !allowed.contains(&file_name.to_string()) {
                report.push_error(
                    format!("'{file_name}' is not a memory file"),
                    Some(format!("memory files are named {MEMORY_FILE}")),
                );
            }
            extend(&mut report, validate_placement(path, &validate_base, None));
            report
        }),
        validate_content: Box::new(|content: &ParsedContent| {
            let mut report = ValidationReport::ok();
            if content.body.trim().is_empty() && content.metadata.is_none() {
                report.push_error(
                    "memory content must not be empty",
                    Some("write the instructions the file should carry".to_string()),
                );
            }
            report
        }),
        read_content: Box::new(|fs, path| read_via_codec(ArtifactKind::Memory, fs, path)),
        write_content: Box::new(|fs, path, content| {
            write_via_codec(ArtifactKind::Memory, fs, path, content)
        }),
        merge_content: Box::new(merge_shallow),
        post_mutate: Box::new(|_fs, _path| {}),
        validate_content_enabled: true,
    }
}
