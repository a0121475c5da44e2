//! Canonical status effect types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::StatusId;

/// Broad category of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Condition,
    Buff,
    Debuff,
}

/// How a modifier changes what it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ModifierEffect {
    Advantage,
    Disadvantage,
    /// Flat bonus (positive) or penalty (negative).
    Flat(i32),
    /// Extra die added to the roll, e.g. "1d4".
    Die(String),
    /// Rolls fail automatically.
    AutoFail,
    Halved,
    /// Reduced to zero.
    Zero,
}

/// One mechanical modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modifier {
    /// What is modified: "attack_rolls", "saving_throws:DEX", "speed", ...
    pub applies_to: String,
    pub effect: ModifierEffect,
}

impl Modifier {
    pub(crate) fn new(applies_to: &str, effect: ModifierEffect) -> Self {
        Self {
            applies_to: applies_to.to_owned(),
            effect,
        }
    }
}

/// Unit of a status duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationKind {
    Rounds,
    Minutes,
    Hours,
    Days,
    UntilCured,
    UntilLongRest,
    Permanent,
}

impl DurationKind {
    /// Returns `true` if the kind needs a count.
    #[must_use]
    pub fn is_timed(self) -> bool {
        matches!(
            self,
            Self::Rounds | Self::Minutes | Self::Hours | Self::Days
        )
    }
}

/// How long a status lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDuration {
    #[serde(rename = "type")]
    pub kind: DurationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u32>,
}

/// A canonical status on a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEffect {
    pub id: StatusId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: StatusKind,
    pub mechanics: String,
    pub trigger: String,
    pub modifiers: Vec<Modifier>,
    pub restrictions: Vec<String>,
    pub narration_cues: Vec<String>,
    pub duration: StatusDuration,
    pub cure: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Exhaustion level or corruption tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<DateTime<Utc>>,
}
