//! The status normalizer: validates proposed deltas against the canonical
//! catalog and merges the survivors into a character's statuses.
//!
//! Fail-closed. An entry that is incomplete, scene-bound, mechanically
//! vague, or not in the catalog is dropped, never applied.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use talewright_core::clock::Clock;
use thiserror::Error;
use tracing::debug;

use super::catalog::{StatusId, canonical};
use super::delta::{RawDuration, RawStatusEntry, StatusDelta};
use super::effect::{DurationKind, StatusDuration, StatusEffect};

/// New statuses accepted per update.
pub const MAX_APPLY_PER_UPDATE: usize = 1;

static SCENE_VOCABULARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(crowds?|tavern|inn|reputation|rumou?rs?|gossip|fame|famous|infamy|notoriety|favou?r|guild|town|village|market|audience|patrons|scene|mood|atmosphere|relationship|friendship|trust|standing|bounty|wanted)\b",
    )
    .expect("valid regex")
});
static MECHANICAL_EFFECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(advantage|disadvantage|speed|damage|saving throw|\bsaves?\b|attack|\bac\b|armor class|hit points?|\bhp\b|movement|incapacitated|resistan|vulnerab|bonus|penalty|\bchecks?\b|\brolls?\b|[+-]\d|\bd\d+|can(no|')t|unable|fails?)",
    )
    .expect("valid regex")
});
static CONCRETE_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\bsave\b|saving throw|spell|\bhit\b|damage|ritual|poison|venom|bite|sting|curse|wound|attack|trap|potion|failed|critical|exposure|touch|gaze|scream|bless|prayer|drink|fall|exhaust|march|sleep|strike|blow|blast|gas|toxin|ingest|inhal|cast)",
    )
    .expect("valid regex")
});
static TEXT_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s*(round|turn|minute|min|hour|hr|day)s?\s*$").expect("valid regex")
});
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Why a proposed entry was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusRejection {
    #[error("status {0} is already active")]
    AlreadyActive(String),

    #[error("only {MAX_APPLY_PER_UPDATE} new status may be applied per update")]
    OverCap,

    #[error("missing required field {0}")]
    MissingField(&'static str),

    #[error("{0} is scene-bound rather than character-bound")]
    SceneBound(&'static str),

    #[error("mechanics describe no mechanical effect")]
    NoMechanicalEffect,

    #[error("trigger names no concrete event")]
    NoConcreteTrigger,

    #[error("duration is not understood")]
    InvalidDuration,

    #[error("no canonical status for id {0}")]
    UnknownId(String),

    #[error("status {0} is not active")]
    NotActive(String),
}

/// A validated delta, ready to merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedStatusUpdate {
    pub apply: Vec<StatusEffect>,
    pub update: Vec<StatusEffect>,
    /// Ids to remove, canonicalized where possible.
    pub remove: Vec<String>,
}

impl NormalizedStatusUpdate {
    /// Returns `true` if nothing survived normalization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apply.is_empty() && self.update.is_empty() && self.remove.is_empty()
    }
}

/// Normalizes a proposed delta against the character's active statuses.
///
/// `apply`: entries already active are dropped, then at most one entry is
/// kept, then it is validated and canonicalized. `update`: every entry is
/// validated and must name an active status. `remove`: ids pass through.
#[must_use]
pub fn normalize_status_update(
    delta: &StatusDelta,
    active: &[StatusEffect],
    clock: &dyn Clock,
) -> NormalizedStatusUpdate {
    let is_active = |key: &str| active.iter().any(|s| s.id.as_str() == key);

    let fresh: Vec<&RawStatusEntry> = delta
        .apply
        .iter()
        .filter(|entry| {
            let key = entry.id.as_deref().map(canonical_key).unwrap_or_default();
            if is_active(&key) {
                log_rejection(entry, &StatusRejection::AlreadyActive(key));
                false
            } else {
                true
            }
        })
        .collect();
    for entry in fresh.iter().skip(MAX_APPLY_PER_UPDATE) {
        log_rejection(entry, &StatusRejection::OverCap);
    }

    let apply = fresh
        .into_iter()
        .take(MAX_APPLY_PER_UPDATE)
        .filter_map(|entry| keep(entry, validate_entry(entry, clock)))
        .collect();

    let update = delta
        .update
        .iter()
        .filter_map(|entry| {
            let result = validate_entry(entry, clock).and_then(|mut effect| {
                let current = active
                    .iter()
                    .find(|s| s.id == effect.id)
                    .ok_or_else(|| StatusRejection::NotActive(effect.id.to_string()))?;
                effect.applied_at = current.applied_at.or(effect.applied_at);
                Ok(effect)
            });
            keep(entry, result)
        })
        .collect();

    let remove = delta.remove.iter().map(|id| canonical_key(id)).collect();

    NormalizedStatusUpdate {
        apply,
        update,
        remove,
    }
}

/// Validates one entry and maps it to its canonical definition.
///
/// # Errors
///
/// Returns the first `StatusRejection` the entry triggers.
pub fn validate_entry(
    entry: &RawStatusEntry,
    clock: &dyn Clock,
) -> Result<StatusEffect, StatusRejection> {
    let id = required(entry.id.as_deref(), "id")?;
    let name = required(entry.name.as_deref(), "name")?;
    let mechanics = required(entry.mechanics.as_deref(), "mechanics")?;
    let trigger = required(entry.trigger.as_deref(), "trigger")?;
    let raw_duration = entry
        .duration
        .as_ref()
        .ok_or(StatusRejection::MissingField("duration"))?;
    let cure = required(entry.cure.as_deref(), "cure")?;

    for (field, text) in [
        ("name", name),
        ("mechanics", mechanics),
        ("trigger", trigger),
        ("cure", cure),
    ] {
        if SCENE_VOCABULARY.is_match(text) {
            return Err(StatusRejection::SceneBound(field));
        }
    }
    if !MECHANICAL_EFFECT.is_match(mechanics) {
        return Err(StatusRejection::NoMechanicalEffect);
    }
    if !CONCRETE_TRIGGER.is_match(trigger) {
        return Err(StatusRejection::NoConcreteTrigger);
    }

    let duration = parse_duration(raw_duration).ok_or(StatusRejection::InvalidDuration)?;
    let status_id = StatusId::from_alias(id).ok_or_else(|| StatusRejection::UnknownId(id.to_owned()))?;
    let severity = severity_for(status_id, entry.severity.as_ref(), name);
    let definition = canonical(status_id, severity);

    Ok(StatusEffect {
        id: status_id,
        name: definition.name,
        kind: definition.kind,
        mechanics: definition.mechanics,
        trigger: trigger.to_owned(),
        modifiers: definition.modifiers,
        restrictions: definition.restrictions,
        narration_cues: definition.narration_cues,
        duration,
        cure: cure.to_owned(),
        source: entry
            .source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned),
        severity,
        applied_at: Some(clock.now()),
    })
}

/// Merges a normalized update: removals first, then replacements, then
/// additions.
#[must_use]
pub fn apply_status_update(
    active: &[StatusEffect],
    update: &NormalizedStatusUpdate,
) -> Vec<StatusEffect> {
    let mut statuses: Vec<StatusEffect> = active
        .iter()
        .filter(|s| !update.remove.iter().any(|id| id == s.id.as_str()))
        .cloned()
        .collect();

    for replacement in &update.update {
        if let Some(slot) = statuses.iter_mut().find(|s| s.id == replacement.id) {
            *slot = replacement.clone();
        }
    }

    for added in &update.apply {
        if !statuses.iter().any(|s| s.id == added.id) {
            statuses.push(added.clone());
        }
    }
    statuses
}

fn keep(entry: &RawStatusEntry, result: Result<StatusEffect, StatusRejection>) -> Option<StatusEffect> {
    result
        .inspect_err(|rejection| log_rejection(entry, rejection))
        .ok()
}

fn log_rejection(entry: &RawStatusEntry, rejection: &StatusRejection) {
    debug!(
        id = entry.id.as_deref().unwrap_or("<none>"),
        reason = %rejection,
        "status proposal dropped"
    );
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, StatusRejection> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(StatusRejection::MissingField(field))
}

fn canonical_key(raw: &str) -> String {
    StatusId::from_alias(raw).map_or_else(|| raw.trim().to_lowercase(), |id| id.as_str().to_owned())
}

fn parse_duration(raw: &RawDuration) -> Option<StatusDuration> {
    match raw {
        RawDuration::Structured { kind, value } => {
            let kind = duration_kind(kind)?;
            let value = value.as_ref().and_then(positive_count);
            build_duration(kind, value)
        }
        RawDuration::Text(text) => {
            if let Some(caps) = TEXT_DURATION.captures(text) {
                let count = caps[1].parse::<u32>().ok().filter(|n| *n > 0)?;
                let kind = duration_kind(&caps[2])?;
                return build_duration(kind, Some(count));
            }
            build_duration(duration_kind(text)?, None)
        }
    }
}

fn build_duration(kind: DurationKind, value: Option<u32>) -> Option<StatusDuration> {
    if kind.is_timed() {
        value.map(|v| StatusDuration {
            kind,
            value: Some(v),
        })
    } else {
        Some(StatusDuration { kind, value: None })
    }
}

fn duration_kind(raw: &str) -> Option<DurationKind> {
    let key: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
        .collect();
    let kind = match key.as_str() {
        "round" | "rounds" | "turn" | "turns" => DurationKind::Rounds,
        "minute" | "minutes" | "min" => DurationKind::Minutes,
        "hour" | "hours" | "hr" => DurationKind::Hours,
        "day" | "days" => DurationKind::Days,
        "until_cured" | "until_removed" | "indefinite" => DurationKind::UntilCured,
        "until_long_rest" | "long_rest" | "until_rest" => DurationKind::UntilLongRest,
        "permanent" => DurationKind::Permanent,
        _ => return None,
    };
    Some(kind)
}

fn positive_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
    .filter(|n| *n > 0)
}

fn severity_for(id: StatusId, proposed: Option<&Value>, name: &str) -> Option<u8> {
    let range = id.severity_range()?;
    let from_field = proposed.and_then(|value| match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => DIGITS.find(s).and_then(|m| m.as_str().parse().ok()),
        _ => None,
    });
    let from_name = || DIGITS.find(name).and_then(|m| m.as_str().parse::<i64>().ok());
    let raw = from_field.or_else(from_name).unwrap_or(i64::from(*range.start()));
    let clamped = raw.clamp(i64::from(*range.start()), i64::from(*range.end()));
    u8::try_from(clamped).ok()
}
