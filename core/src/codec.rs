//! Content codecs: YAML-frontmatter-delimited markdown for commands and
//! memory files, strict JSON for settings.
//!
//! Both codecs are pure functions over strings. They perform no I/O, are
//! deterministic, and round-trip stable for well-formed input: serializing a
//! parse result yields text that parses back to the same logical content
//! (byte equality is not promised because of normalization).

use crate::artifact::{ArtifactKind, ParsedContent};
use crate::error::ArtifactError;

/// Line that opens and closes a frontmatter block.
pub const FRONTMATTER_DELIMITER: &str = "---";

/// Decode raw file text for the given artifact kind.
pub fn parse(kind: ArtifactKind, raw: &str) -> Result<ParsedContent, ArtifactError> {
    match kind {
        ArtifactKind::Command | ArtifactKind::Memory => parse_frontmatter(raw),
        ArtifactKind::Settings => {
            let value = parse_settings(raw)?;
            Ok(ParsedContent {
                metadata: Some(value),
                body: String::new(),
            })
        }
    }
}

/// Encode logical content back to file text for the given artifact kind.
pub fn serialize(kind: ArtifactKind, content: &ParsedContent) -> Result<String, ArtifactError> {
    match kind {
        ArtifactKind::Command | ArtifactKind::Memory => serialize_frontmatter(content),
        ArtifactKind::Settings => {
            let value = content
                .metadata
                .clone()
                .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));
            serialize_settings(&value)
        }
    }
}

/// Parse markdown with an optional leading YAML frontmatter block.
///
/// If the first line is the delimiter and a matching closing delimiter
/// exists, the block between them must parse as a YAML mapping; anything
/// else in the block is a `ParseFailure`. A missing opening or closing
/// delimiter is a deliberate recovery path: the whole text becomes the body
/// with no metadata.
pub fn parse_frontmatter(raw: &str) -> Result<ParsedContent, ArtifactError> {
    let lines: Vec<&str> = raw.split('\n').collect();
    let first = lines.first().map(|l| l.trim_end_matches('\r'));
    if first != Some(FRONTMATTER_DELIMITER) {
        return Ok(ParsedContent::body_only(raw));
    }

    let Some(close) = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, l)| l.trim_end_matches('\r') == FRONTMATTER_DELIMITER)
        .map(|(idx, _)| idx)
    else {
        // Opening delimiter with no close: treat the whole text as body.
        return Ok(ParsedContent::body_only(raw));
    };

    let block = lines[1..close].join("\n");
    let yaml: serde_yaml::Value = serde_yaml::from_str(&block)
        .map_err(|e| ArtifactError::ParseFailure(format!("frontmatter YAML: {e}")))?;

    let metadata = match yaml {
        // An empty block is an empty mapping, not an error.
        serde_yaml::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
        serde_yaml::Value::Mapping(_) => serde_json::to_value(&yaml)
            .map_err(|e| ArtifactError::ParseFailure(format!("frontmatter mapping: {e}")))?,
        other => {
            return Err(ArtifactError::ParseFailure(format!(
                "frontmatter must be a mapping, got {}",
                yaml_type_name(&other)
            )));
        }
    };

    let body = lines[close + 1..].join("\n");
    Ok(ParsedContent {
        metadata: Some(metadata),
        body,
    })
}

/// Re-emit `---`, dumped metadata, `---`, body — or the body unchanged when
/// no metadata is present.
pub fn serialize_frontmatter(content: &ParsedContent) -> Result<String, ArtifactError> {
    match &content.metadata {
        None => Ok(content.body.clone()),
        Some(metadata) => {
            let yaml = serde_yaml::to_string(metadata)
                .map_err(|e| ArtifactError::ParseFailure(format!("frontmatter dump: {e}")))?;
            Ok(format!(
                "{FRONTMATTER_DELIMITER}\n{yaml}{FRONTMATTER_DELIMITER}\n{}",
                content.body
            ))
        }
    }
}

/// Parse a settings document. Empty or whitespace-only input is an empty
/// object; anything else must be strict JSON. A leading UTF-8 byte-order
/// mark is stripped so it never survives a round trip.
pub fn parse_settings(raw: &str) -> Result<serde_json::Value, ArtifactError> {
    let stripped = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    if stripped.trim().is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(stripped)
        .map_err(|e| ArtifactError::ParseFailure(format!("settings JSON: {e}")))
}

/// Pretty-print settings with 2-space indentation and a trailing newline.
pub fn serialize_settings(value: &serde_json::Value) -> Result<String, ArtifactError> {
    serde_json::to_string_pretty(value)
        .map(|s| format!("{s}\n"))
        .map_err(|e| ArtifactError::ParseFailure(format!("settings dump: {e}")))
}

fn yaml_type_name(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "bool",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parse_frontmatter_extracts_metadata_and_body() {
        let raw = "---\ndescription: Deploy the app\nallowed-tools: Bash\n---\nRun the deploy.\n";
        let parsed = parse_frontmatter(raw).unwrap();

        assert_eq!(
            parsed.metadata,
            Some(json!({"description": "Deploy the app", "allowed-tools": "Bash"}))
        );
        assert_eq!(parsed.body, "Run the deploy.\n");
    }

    #[test]
    fn parse_frontmatter_without_delimiter_is_all_body() {
        let raw = "Just a plain command body.";
        let parsed = parse_frontmatter(raw).unwrap();
        assert_eq!(parsed.metadata, None);
        assert_eq!(parsed.body, raw);
    }

    #[test]
    fn parse_frontmatter_unclosed_delimiter_recovers_as_body() {
        let raw = "---\ndescription: oops\nno closing line";
        let parsed = parse_frontmatter(raw).unwrap();
        assert_eq!(parsed.metadata, None);
        assert_eq!(parsed.body, raw);
    }

    #[test]
    fn parse_frontmatter_bad_yaml_is_parse_failure() {
        let raw = "---\ndescription: [unterminated\n---\nbody";
        let err = parse_frontmatter(raw).unwrap_err();
        assert!(matches!(err, ArtifactError::ParseFailure(_)), "{err:?}");
    }

    #[test]
    fn parse_frontmatter_scalar_block_is_parse_failure() {
        let raw = "---\njust a string\n---\nbody";
        let err = parse_frontmatter(raw).unwrap_err();
        assert!(err.to_string().contains("mapping"), "{err}");
    }

    #[test]
    fn parse_frontmatter_empty_block_is_empty_mapping() {
        let raw = "---\n---\nbody";
        let parsed = parse_frontmatter(raw).unwrap();
        assert_eq!(parsed.metadata, Some(json!({})));
        assert_eq!(parsed.body, "body");
    }

    #[test]
    fn serialize_frontmatter_without_metadata_is_body_unchanged() {
        let content = ParsedContent::body_only("plain body\n");
        assert_eq!(serialize_frontmatter(&content).unwrap(), "plain body\n");
    }

    #[test]
    fn frontmatter_round_trip_is_semantically_stable() {
        let raw = "---\ndescription: Review a PR\nargument-hint: \"[pr-number]\"\n---\nReview PR $ARGUMENTS.\n";
        let once = parse_frontmatter(raw).unwrap();
        let twice = parse_frontmatter(&serialize_frontmatter(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn parse_settings_empty_input_is_empty_object() {
        assert_eq!(parse_settings("").unwrap(), json!({}));
        assert_eq!(parse_settings("  \n\t ").unwrap(), json!({}));
    }

    #[test]
    fn parse_settings_strips_bom() {
        let raw = "\u{feff}{\"model\": \"opus\"}";
        assert_eq!(parse_settings(raw).unwrap(), json!({"model": "opus"}));
    }

    #[test]
    fn parse_settings_rejects_malformed_json() {
        let err = parse_settings("{not json").unwrap_err();
        assert!(matches!(err, ArtifactError::ParseFailure(_)));
    }

    #[test]
    fn serialize_settings_pretty_prints_with_trailing_newline() {
        let out = serialize_settings(&json!({"model": "opus"})).unwrap();
        assert_eq!(out, "{\n  \"model\": \"opus\"\n}\n");
    }

    #[test]
    fn settings_round_trip_is_semantically_stable() {
        let raw = "{\"hooks\":{\"PreToolUse\":[]},\"model\":\"opus\"}";
        let once = parse_settings(raw).unwrap();
        let twice = parse_settings(&serialize_settings(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn kind_dispatch_settings_puts_document_in_metadata() {
        let parsed = parse(ArtifactKind::Settings, "{\"model\": \"opus\"}").unwrap();
        assert_eq!(parsed.metadata, Some(json!({"model": "opus"})));
        assert_eq!(parsed.body, "");

        let out = serialize(ArtifactKind::Settings, &parsed).unwrap();
        assert!(out.ends_with('\n'));
    }
}
