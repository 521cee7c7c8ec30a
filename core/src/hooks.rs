//! Typed model for the `hooks` section of a settings document, plus pure
//! editing helpers.
//!
//! Editing never mutates the caller's JSON: every helper takes the current
//! settings value and returns a new one. Matcher arrays are rebuilt, not
//! spliced in place.

use serde::{Deserialize, Serialize};

/// Lifecycle events a hook can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
    Notification,
    UserPromptSubmit,
    Stop,
    SubagentStop,
    PreCompact,
    SessionStart,
    SessionEnd,
}

impl HookEvent {
    pub const ALL: [HookEvent; 9] = [
        HookEvent::PreToolUse,
        HookEvent::PostToolUse,
        HookEvent::Notification,
        HookEvent::UserPromptSubmit,
        HookEvent::Stop,
        HookEvent::SubagentStop,
        HookEvent::PreCompact,
        HookEvent::SessionStart,
        HookEvent::SessionEnd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HookEvent::PreToolUse => "PreToolUse",
            HookEvent::PostToolUse => "PostToolUse",
            HookEvent::Notification => "Notification",
            HookEvent::UserPromptSubmit => "UserPromptSubmit",
            HookEvent::Stop => "Stop",
            HookEvent::SubagentStop => "SubagentStop",
            HookEvent::PreCompact => "PreCompact",
            HookEvent::SessionStart => "SessionStart",
            HookEvent::SessionEnd => "SessionEnd",
        }
    }

    pub fn parse(name: &str) -> Option<HookEvent> {
        HookEvent::ALL.into_iter().find(|e| e.as_str() == name)
    }

    /// Comma-separated list of every valid event name, for error messages.
    pub fn valid_names() -> String {
        HookEvent::ALL
            .iter()
            .map(|e| e.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A single hook: currently only `command` hooks exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookDefinition {
    #[serde(rename = "type")]
    pub hook_type: String,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
}

impl HookDefinition {
    pub fn command(command: impl Into<String>, timeout: Option<f64>) -> Self {
        Self {
            hook_type: "command".to_string(),
            command: command.into(),
            timeout,
        }
    }
}

/// One matcher entry under an event: a tool-name pattern plus its hooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookMatcher {
    pub matcher: String,
    pub hooks: Vec<HookDefinition>,
}

/// Return a new settings value with `definition` appended under
/// `event`/`matcher`. Creates the `hooks` section, the event array, and the
/// matcher entry as needed. The input is left untouched.
pub fn add_hook(
    settings: &serde_json::Value,
    event: HookEvent,
    matcher: &str,
    definition: HookDefinition,
) -> serde_json::Value {
    let mut root = as_object(settings);
    let mut hooks = root
        .get("hooks")
        .map(as_object)
        .unwrap_or_default();

    let mut matchers: Vec<HookMatcher> = hooks
        .get(event.as_str())
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();

    match matchers.iter_mut().find(|m| m.matcher == matcher) {
        Some(entry) => entry.hooks.push(definition),
        None => matchers.push(HookMatcher {
            matcher: matcher.to_string(),
            hooks: vec![definition],
        }),
    }

    hooks.insert(
        event.as_str().to_string(),
        serde_json::to_value(matchers).unwrap_or_default(),
    );
    root.insert("hooks".to_string(), serde_json::Value::Object(hooks));
    serde_json::Value::Object(root)
}

/// Return a new settings value without the given matcher entry. Removes the
/// event key when its last matcher goes, and the `hooks` section when its
/// last event goes.
pub fn remove_matcher(
    settings: &serde_json::Value,
    event: HookEvent,
    matcher: &str,
) -> serde_json::Value {
    let mut root = as_object(settings);
    let Some(hooks_value) = root.get("hooks") else {
        return serde_json::Value::Object(root);
    };
    let mut hooks = as_object(hooks_value);

    if let Some(entries) = hooks.get(event.as_str()) {
        let mut matchers: Vec<HookMatcher> =
            serde_json::from_value(entries.clone()).unwrap_or_default();
        matchers.retain(|m| m.matcher != matcher);
        if matchers.is_empty() {
            hooks.remove(event.as_str());
        } else {
            hooks.insert(
                event.as_str().to_string(),
                serde_json::to_value(matchers).unwrap_or_default(),
            );
        }
    }

    if hooks.is_empty() {
        root.remove("hooks");
    } else {
        root.insert("hooks".to_string(), serde_json::Value::Object(hooks));
    }
    serde_json::Value::Object(root)
}

/// Return a new settings value without any hooks for the given event.
pub fn remove_event(settings: &serde_json::Value, event: HookEvent) -> serde_json::Value {
    let mut root = as_object(settings);
    if let Some(hooks_value) = root.get("hooks") {
        let mut hooks = as_object(hooks_value);
        hooks.remove(event.as_str());
        if hooks.is_empty() {
            root.remove("hooks");
        } else {
            root.insert("hooks".to_string(), serde_json::Value::Object(hooks));
        }
    }
    serde_json::Value::Object(root)
}

fn as_object(value: &serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn add_hook_creates_section_event_and_matcher() {
        let settings = json!({"model": "opus"});
        let updated = add_hook(
            &settings,
            HookEvent::PreToolUse,
            "Bash",
            HookDefinition::command("echo pre", Some(5.0)),
        );

        assert_eq!(
            updated,
            json!({
                "model": "opus",
                "hooks": {
                    "PreToolUse": [
                        {"matcher": "Bash", "hooks": [{"type": "command", "command": "echo pre", "timeout": 5.0}]}
                    ]
                }
            })
        );
        // Input untouched.
        assert_eq!(settings, json!({"model": "opus"}));
    }

    #[test]
    fn add_hook_appends_to_existing_matcher() {
        let settings = add_hook(
            &json!({}),
            HookEvent::PostToolUse,
            "Edit",
            HookDefinition::command("first", None),
        );
        let updated = add_hook(
            &settings,
            HookEvent::PostToolUse,
            "Edit",
            HookDefinition::command("second", None),
        );

        let hooks = &updated["hooks"]["PostToolUse"][0]["hooks"];
        assert_eq!(hooks.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn remove_matcher_prunes_empty_event_and_section() {
        let settings = add_hook(
            &json!({"model": "opus"}),
            HookEvent::Stop,
            "*",
            HookDefinition::command("notify", None),
        );
        let updated = remove_matcher(&settings, HookEvent::Stop, "*");
        assert_eq!(updated, json!({"model": "opus"}));
    }

    #[test]
    fn remove_event_drops_all_matchers_for_that_event() {
        let mut settings = add_hook(
            &json!({}),
            HookEvent::PreToolUse,
            "Bash",
            HookDefinition::command("a", None),
        );
        settings = add_hook(
            &settings,
            HookEvent::PreToolUse,
            "Edit",
            HookDefinition::command("b", None),
        );
        settings = add_hook(
            &settings,
            HookEvent::Stop,
            "*",
            HookDefinition::command("c", None),
        );

        let updated = remove_event(&settings, HookEvent::PreToolUse);
        assert!(updated["hooks"].get("PreToolUse").is_none());
        assert!(updated["hooks"].get("Stop").is_some());
    }

    #[test]
    fn event_parse_round_trips_every_name() {
        for event in HookEvent::ALL {
            assert_eq!(HookEvent::parse(event.as_str()), Some(event));
        }
        assert_eq!(HookEvent::parse("BadEvent"), None);
    }
}
