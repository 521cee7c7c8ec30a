//! Pure validation of artifact names, namespaces, path placement, and
//! type-specific content shape.
//!
//! Validators never panic and never return `Err`: every check produces a
//! `ValidationReport` and callers decide whether a failed report becomes a
//! typed error.

use crate::artifact::MAX_NAMESPACE_DEPTH;
use crate::codec::FRONTMATTER_DELIMITER;
use crate::hooks::HookEvent;
use serde::Serialize;
use std::path::Path;

/// Longest accepted artifact name.
pub const MAX_NAME_LEN: usize = 50;

/// Names reserved for built-in commands of the surrounding tooling.
pub const RESERVED_NAMES: &[&str] = &[
    "help", "clear", "compact", "config", "cost", "doctor", "exit", "init", "login", "logout",
    "memory", "model", "quit", "review", "settings", "status",
];

/// One validation failure with a human-readable fix suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Uniform result shape shared by every validator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn push_error(&mut self, message: impl Into<String>, suggestion: Option<String>) {
        self.valid = false;
        self.errors.push(ValidationIssue {
            message: message.into(),
            suggestion,
        });
    }

    pub fn push_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// First error message, for callers that surface a single reason.
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(|i| i.message.as_str())
    }
}

/// Character-pattern check shared by names and namespace segments:
/// starts alphanumeric, then alphanumeric, hyphen, or underscore.
fn name_pattern_ok(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Validate a logical artifact name.
pub fn validate_name(name: &str) -> ValidationReport {
    let mut report = ValidationReport::ok();

    if name.trim().is_empty() {
        report.push_error(
            "name must not be empty",
            Some("choose a short descriptive name like 'deploy'".to_string()),
        );
        return report;
    }

    if RESERVED_NAMES.contains(&name) {
        report.push_error(
            format!("'{name}' is a reserved name"),
            Some(format!("prefix it with your project, e.g. 'my-{name}'")),
        );
    }

    if name.len() > MAX_NAME_LEN {
        report.push_error(
            format!("name is {} characters, maximum is {MAX_NAME_LEN}", name.len()),
            Some("shorten the name".to_string()),
        );
    }

    if !name_pattern_ok(name) {
        report.push_error(
            format!("'{name}' must start with a letter or digit and contain only letters, digits, hyphens, and underscores"),
            Some("replace spaces and punctuation with hyphens".to_string()),
        );
    }

    report
}

/// Validate a slash-joined namespace string.
///
/// Segments are checked against the name character pattern only; the
/// reserved-name list does not apply per-segment.
pub fn validate_namespace(namespace: &str) -> ValidationReport {
    let mut report = ValidationReport::ok();

    if namespace.is_empty() {
        report.push_error(
            "namespace must not be empty",
            Some("omit the namespace entirely for a top-level artifact".to_string()),
        );
        return report;
    }

    if namespace.starts_with('/') || namespace.ends_with('/') || namespace.contains("//") {
        report.push_error(
            format!("'{namespace}' has a leading, trailing, or doubled slash"),
            Some("use the form 'parent/child' with single separators".to_string()),
        );
        return report;
    }

    let segments: Vec<&str> = namespace.split('/').collect();
    if segments.len() > MAX_NAMESPACE_DEPTH {
        report.push_error(
            format!(
                "namespace '{namespace}' is {} levels deep, maximum is {MAX_NAMESPACE_DEPTH}",
                segments.len()
            ),
            Some("flatten the directory structure".to_string()),
        );
    }

    for segment in segments {
        if !name_pattern_ok(segment) {
            report.push_error(
                format!("namespace segment '{segment}' must start with a letter or digit and contain only letters, digits, hyphens, and underscores"),
                None,
            );
        }
    }

    report
}

/// Check that a file sits exactly where its scope base and namespace say it
/// should. Catches files manually dropped in the wrong folder.
pub fn validate_placement(path: &Path, base: &Path, namespace: Option<&str>) -> ValidationReport {
    let mut report = ValidationReport::ok();

    let mut expected = base.to_path_buf();
    if let Some(ns) = namespace {
        for segment in ns.split('/') {
            expected.push(segment);
        }
    }

    match path.parent() {
        Some(parent) if parent == expected => {}
        Some(parent) => {
            report.push_error(
                format!(
                    "file is in {} but its namespace places it in {}",
                    parent.display(),
                    expected.display()
                ),
                Some("move the file or adjust the namespace".to_string()),
            );
        }
        None => {
            report.push_error(
                format!("'{}' has no parent directory", path.display()),
                None,
            );
        }
    }

    report
}

/// Structural rules for command markdown: non-empty, a frontmatter block
/// that opens must close, and special-syntax tokens must be well formed.
pub fn validate_command_markdown(raw: &str) -> ValidationReport {
    let mut report = ValidationReport::ok();

    if raw.trim().is_empty() {
        report.push_error(
            "command content must not be empty",
            Some("write the prompt the command should expand to".to_string()),
        );
        return report;
    }

    let lines: Vec<&str> = raw.split('\n').collect();
    if lines
        .first()
        .map(|l| l.trim_end_matches('\r') == FRONTMATTER_DELIMITER)
        .unwrap_or(false)
    {
        let closed = lines
            .iter()
            .skip(1)
            .any(|l| l.trim_end_matches('\r') == FRONTMATTER_DELIMITER);
        if !closed {
            report.push_error(
                "frontmatter block is opened but never closed",
                Some(format!("add a closing '{FRONTMATTER_DELIMITER}' line")),
            );
        }
    }

    for (idx, line) in lines.iter().enumerate() {
        // Inline bash: !`cmd` must close its backtick on the same line.
        let mut rest = *line;
        while let Some(pos) = rest.find("!`") {
            let after = &rest[pos + 2..];
            match after.find('`') {
                Some(end) => rest = &after[end + 1..],
                None => {
                    report.push_error(
                        format!("line {}: inline bash '!`' is missing its closing backtick", idx + 1),
                        None,
                    );
                    break;
                }
            }
        }

        // File references: a bare '@' with nothing after it names no file.
        for token in line.split_whitespace() {
            if token == "@" {
                report.push_error(
                    format!("line {}: file reference '@' must name a path", idx + 1),
                    Some("write '@path/to/file' with no space after '@'".to_string()),
                );
            }
        }
    }

    report
}

/// Recognized top-level settings keys and their expected JSON types.
const SETTINGS_KEYS: &[(&str, &str)] = &[
    ("apiKeyHelper", "string"),
    ("cleanupPeriodDays", "number"),
    ("disabledMcpjsonServers", "array"),
    ("enableAllProjectMcpServers", "boolean"),
    ("enabledMcpjsonServers", "array"),
    ("env", "object"),
    ("forceLoginMethod", "string"),
    ("hooks", "object"),
    ("includeCoAuthoredBy", "boolean"),
    ("model", "string"),
    ("permissions", "object"),
    ("statusLine", "object"),
];

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Validate a parsed settings document against the known schema.
pub fn validate_settings_schema(parsed: &serde_json::Value) -> ValidationReport {
    let mut report = ValidationReport::ok();

    let Some(object) = parsed.as_object() else {
        report.push_error(
            format!("settings must be a JSON object, got {}", json_type_name(parsed)),
            Some("wrap the configuration in '{ ... }'".to_string()),
        );
        return report;
    };

    for (key, value) in object {
        match SETTINGS_KEYS.iter().find(|(k, _)| k == key) {
            None => report.push_warning(format!("unknown settings key '{key}'")),
            Some((_, expected)) => {
                let actual = json_type_name(value);
                if actual != *expected {
                    report.push_error(
                        format!("settings key '{key}' must be a {expected}, got {actual}"),
                        None,
                    );
                } else if *key == "hooks" {
                    validate_hooks_section(value, &mut report);
                }
            }
        }
    }

    report
}

fn validate_hooks_section(hooks: &serde_json::Value, report: &mut ValidationReport) {
    let Some(events) = hooks.as_object() else {
        return;
    };

    for (event_name, matchers) in events {
        if HookEvent::parse(event_name).is_none() {
            report.push_error(
                format!(
                    "'{event_name}' is not a valid hook event; valid events are: {}",
                    HookEvent::valid_names()
                ),
                None,
            );
            continue;
        }

        let Some(entries) = matchers.as_array() else {
            report.push_error(
                format!(
                    "hooks for '{event_name}' must be an array of matchers, got {}",
                    json_type_name(matchers)
                ),
                None,
            );
            continue;
        };

        for (idx, entry) in entries.iter().enumerate() {
            validate_hook_matcher(event_name, idx, entry, report);
        }
    }
}

fn validate_hook_matcher(
    event_name: &str,
    idx: usize,
    entry: &serde_json::Value,
    report: &mut ValidationReport,
) {
    let at = format!("hooks.{event_name}[{idx}]");

    let Some(object) = entry.as_object() else {
        report.push_error(format!("{at} must be an object"), None);
        return;
    };

    if !object.get("matcher").map(serde_json::Value::is_string).unwrap_or(false) {
        report.push_error(format!("{at} must have a string 'matcher'"), None);
    }

    let Some(defs) = object.get("hooks").and_then(serde_json::Value::as_array) else {
        report.push_error(format!("{at} must have a 'hooks' array"), None);
        return;
    };

    for (def_idx, def) in defs.iter().enumerate() {
        let def_at = format!("{at}.hooks[{def_idx}]");
        let Some(def_obj) = def.as_object() else {
            report.push_error(format!("{def_at} must be an object"), None);
            continue;
        };

        if def_obj.get("type").and_then(serde_json::Value::as_str) != Some("command") {
            report.push_error(
                format!("{def_at} must have type \"command\""),
                None,
            );
        }

        if !def_obj.get("command").map(serde_json::Value::is_string).unwrap_or(false) {
            report.push_error(format!("{def_at} must have a string 'command'"), None);
        }

        if let Some(timeout) = def_obj.get("timeout") {
            let positive = timeout.as_f64().map(|t| t > 0.0).unwrap_or(false);
            if !positive {
                report.push_error(
                    format!("{def_at} timeout must be a positive number"),
                    None,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn valid_names_pass() {
        for name in ["deploy", "git-flow", "a", "release_2", "A1"] {
            assert!(validate_name(name).valid, "{name} should be valid");
        }
    }

    #[test]
    fn empty_name_fails_with_suggestion() {
        let report = validate_name("  ");
        assert!(!report.valid);
        assert!(report.errors[0].suggestion.is_some());
    }

    #[test]
    fn reserved_name_fails() {
        let report = validate_name("help");
        assert!(!report.valid);
        assert!(report.first_error().unwrap().contains("reserved"));
    }

    #[test]
    fn overlong_name_fails() {
        let name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(!validate_name(&name).valid);
    }

    #[test]
    fn bad_pattern_names_fail() {
        for name in ["-leading", "has space", "uni/code", "_underscore"] {
            assert!(!validate_name(name).valid, "{name} should be invalid");
        }
    }

    #[test]
    fn namespace_depth_boundary() {
        assert!(validate_namespace("a/b/c").valid);
        let report = validate_namespace("a/b/c/d");
        assert!(!report.valid);
        assert!(report.first_error().unwrap().contains("deep"));
    }

    #[test]
    fn namespace_slash_placement_fails() {
        for ns in ["/lead", "trail/", "dou//ble", ""] {
            assert!(!validate_namespace(ns).valid, "{ns:?} should be invalid");
        }
    }

    #[test]
    fn namespace_segments_skip_reserved_word_check() {
        // 'help' is reserved as a name but fine as a namespace segment.
        assert!(validate_namespace("help/tools").valid);
    }

    #[test]
    fn placement_accepts_matching_namespace_dir() {
        let base = PathBuf::from("/p/.claude/commands");
        let path = base.join("git/flow/sync.md");
        assert!(validate_placement(&path, &base, Some("git/flow")).valid);
    }

    #[test]
    fn placement_rejects_wrong_directory() {
        let base = PathBuf::from("/p/.claude/commands");
        let path = base.join("git/sync.md");
        let report = validate_placement(&path, &base, Some("git/flow"));
        assert!(!report.valid);
    }

    #[test]
    fn command_markdown_rejects_empty_and_unclosed_frontmatter() {
        assert!(!validate_command_markdown("   \n").valid);

        let report = validate_command_markdown("---\ndescription: x\nbody without close");
        assert!(!report.valid);
        assert!(report.first_error().unwrap().contains("never closed"));
    }

    #[test]
    fn command_markdown_checks_special_syntax() {
        assert!(validate_command_markdown("Run !`git status` then report.").valid);
        assert!(!validate_command_markdown("Run !`git status then report.").valid);
        assert!(!validate_command_markdown("Look at @ and summarize.").valid);
        assert!(validate_command_markdown("Look at @src/main.rs and $ARGUMENTS.").valid);
    }

    #[test]
    fn settings_schema_accepts_known_shape() {
        let settings = json!({
            "model": "opus",
            "cleanupPeriodDays": 30,
            "env": {"FOO": "bar"},
            "includeCoAuthoredBy": false,
            "enabledMcpjsonServers": ["memory"],
            "hooks": {
                "PreToolUse": [
                    {"matcher": "Bash", "hooks": [{"type": "command", "command": "echo hi", "timeout": 10}]}
                ]
            }
        });
        let report = validate_settings_schema(&settings);
        assert!(report.valid, "{:?}", report.errors);
    }

    #[test]
    fn settings_schema_rejects_non_object() {
        assert!(!validate_settings_schema(&json!([1, 2])).valid);
        assert!(!validate_settings_schema(&json!("text")).valid);
    }

    #[test]
    fn settings_schema_warns_on_unknown_key() {
        let report = validate_settings_schema(&json!({"mystery": 1}));
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn settings_schema_type_checks_known_keys() {
        let report = validate_settings_schema(&json!({"model": 42}));
        assert!(!report.valid);
        assert!(report.first_error().unwrap().contains("'model'"));
    }

    #[test]
    fn bad_hook_event_names_the_event_and_lists_valid_set() {
        let report = validate_settings_schema(&json!({"hooks": {"BadEvent": []}}));
        assert!(!report.valid);
        let msg = report.first_error().unwrap();
        assert!(msg.contains("BadEvent"));
        assert!(msg.contains("PreToolUse"));
        assert!(msg.contains("SessionEnd"));
    }

    #[test]
    fn hook_definitions_are_checked_recursively() {
        let report = validate_settings_schema(&json!({
            "hooks": {
                "Stop": [
                    {"matcher": "*", "hooks": [{"type": "script", "command": 3, "timeout": -1}]}
                ]
            }
        }));
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 3);
    }
}
