//! Untrusted status deltas proposed by the generative layer.
//!
//! Parsing never fails: a malformed delta is empty, a malformed entry is
//! dropped.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// A proposed duration, either structured or free text ("3 rounds").
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawDuration {
    Structured {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        value: Option<Value>,
    },
    Text(String),
}

/// One proposed status, before validation. Every field is optional here so
/// that missing fields are reported by the normalizer, not the parser.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatusEntry {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub mechanics: Option<String>,
    pub trigger: Option<String>,
    pub duration: Option<RawDuration>,
    pub cure: Option<String>,
    pub source: Option<String>,
    pub severity: Option<Value>,
}

/// A parsed proposal: statuses to add, statuses to replace, ids to drop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusDelta {
    pub apply: Vec<RawStatusEntry>,
    pub update: Vec<RawStatusEntry>,
    pub remove: Vec<String>,
}

impl StatusDelta {
    /// Returns `true` if the delta proposes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apply.is_empty() && self.update.is_empty() && self.remove.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawDelta {
    #[serde(default)]
    apply: Vec<Value>,
    #[serde(default)]
    update: Vec<Value>,
    #[serde(default)]
    remove: Vec<Value>,
}

/// Parses a delta from raw text, which may wrap the JSON object in prose.
#[must_use]
pub fn safe_parse_status_delta(raw: &str) -> StatusDelta {
    let Some(json) = extract_json_object(raw) else {
        return StatusDelta::default();
    };
    match serde_json::from_str::<Value>(json) {
        Ok(value) => status_delta_from_value(value),
        Err(err) => {
            debug!(error = %err, "status delta is not valid JSON");
            StatusDelta::default()
        }
    }
}

/// Parses a delta from an already-decoded JSON value.
#[must_use]
pub fn status_delta_from_value(value: Value) -> StatusDelta {
    let raw: RawDelta = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(err) => {
            debug!(error = %err, "status delta does not match the expected shape");
            return StatusDelta::default();
        }
    };

    StatusDelta {
        apply: entries(raw.apply),
        update: entries(raw.update),
        remove: raw.remove.into_iter().filter_map(tombstone_id).collect(),
    }
}

fn entries(values: Vec<Value>) -> Vec<RawStatusEntry> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(error = %err, "dropping malformed status entry");
                None
            }
        })
        .collect()
}

fn tombstone_id(value: Value) -> Option<String> {
    let id = match value {
        Value::String(id) => id,
        Value::Object(mut map) => match map.remove("id") {
            Some(Value::String(id)) => id,
            _ => return None,
        },
        _ => return None,
    };
    let id = id.trim().to_owned();
    (!id.is_empty()).then_some(id)
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_full_delta() {
        let delta = safe_parse_status_delta(
            r#"{"apply":[{"id":"poisoned","name":"Poisoned","mechanics":"disadvantage on attacks","trigger":"spider bite","duration":{"type":"hours","value":1},"cure":"antitoxin"}],"remove":["blessed",{"id":"inspired"}]}"#,
        );
        assert_eq!(delta.apply.len(), 1);
        assert_eq!(delta.apply[0].id.as_deref(), Some("poisoned"));
        assert_eq!(delta.remove, vec!["blessed", "inspired"]);
        assert!(delta.update.is_empty());
    }

    #[test]
    fn test_prose_wrapped_delta_is_extracted() {
        let delta = safe_parse_status_delta(
            "Here you go:\n```json\n{\"remove\":[\"stunned\"]}\n```",
        );
        assert_eq!(delta.remove, vec!["stunned"]);
    }

    #[test]
    fn test_garbage_yields_empty_delta() {
        assert!(safe_parse_status_delta("no statuses this time").is_empty());
        assert!(safe_parse_status_delta("{not json}").is_empty());
        assert!(safe_parse_status_delta(r#"{"apply":"poisoned"}"#).is_empty());
    }

    #[test]
    fn test_malformed_entries_are_dropped_individually() {
        let delta = safe_parse_status_delta(
            r#"{"apply":[42,{"id":"blinded"}],"remove":[7,"  ",{"name":"x"},"cursed"]}"#,
        );
        assert_eq!(delta.apply.len(), 1);
        assert_eq!(delta.remove, vec!["cursed"]);
    }

    #[test]
    fn test_free_text_duration_is_accepted_by_the_parser() {
        let delta = safe_parse_status_delta(r#"{"apply":[{"id":"stunned","duration":"1 round"}]}"#);
        assert_eq!(
            delta.apply[0].duration,
            Some(RawDuration::Text("1 round".to_owned()))
        );
    }
}
