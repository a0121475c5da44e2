//! The per-turn `IntentDecision` and its strict parser for untrusted
//! generative output.

use std::fmt;

use serde::{Deserialize, Serialize};
use talewright_core::error::DomainError;
use thiserror::Error;

use super::annotator::select_primary;
use super::classifier::{IntentClassification, SuggestedCheck};
use super::segmenter::{IntentHint, Segment};

/// Highest difficulty class a decision may carry.
pub const MAX_DC: u8 = 30;

/// Rules domain an action falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Resolved by the combat engine.
    Combat,
    /// Sneaking, hiding, sleight of hand.
    Stealth,
    /// Talking someone into (or out of) something.
    Social,
    /// Athletics, acrobatics, endurance.
    Physical,
    /// No mechanical domain; narrated freely.
    None,
}

impl From<SuggestedCheck> for Domain {
    fn from(check: SuggestedCheck) -> Self {
        match check {
            SuggestedCheck::Combat => Self::Combat,
            SuggestedCheck::Stealth => Self::Stealth,
            SuggestedCheck::Social => Self::Social,
            SuggestedCheck::Physical => Self::Physical,
            SuggestedCheck::None => Self::None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Combat => "combat",
            Self::Stealth => "stealth",
            Self::Social => "social",
            Self::Physical => "physical",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Ability {
    /// Strength.
    Str,
    /// Dexterity.
    Dex,
    /// Constitution.
    Con,
    /// Intelligence.
    Int,
    /// Wisdom.
    Wis,
    /// Charisma.
    Cha,
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Str => "STR",
            Self::Dex => "DEX",
            Self::Con => "CON",
            Self::Int => "INT",
            Self::Wis => "WIS",
            Self::Cha => "CHA",
        };
        f.write_str(name)
    }
}

/// What the player's turn means, mechanically. Produced fresh each turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentDecision {
    /// The segment the decision is about.
    pub primary_segment_id: Option<String>,
    /// The hint of the primary segment.
    pub intent_type: IntentHint,
    /// Rules domain.
    pub domain: Domain,
    /// Whether dice decide the outcome.
    pub should_roll: bool,
    /// Explicit ability, when known.
    pub stat: Option<Ability>,
    /// Explicit skill, when known.
    pub skill: Option<String>,
    /// Explicit difficulty class, when known.
    pub dc: Option<u8>,
    /// Short label for the action ("attack guard").
    pub action_label: String,
    /// Optional narration hint.
    pub narration: Option<String>,
}

impl IntentDecision {
    /// Derives a decision from annotated segments and the deterministic
    /// classification. Stat, skill and DC are left for the check builder.
    #[must_use]
    pub fn from_classification(segments: &[Segment], classification: &IntentClassification) -> Self {
        let primary = select_primary(segments);
        let domain = Domain::from(classification.suggested_check);
        let primary_rolls = primary.is_some_and(|s| !s.no_roll_candidate);
        let should_roll = domain != Domain::None && primary_rolls;

        Self {
            primary_segment_id: primary.map(|s| s.id.clone()),
            intent_type: primary.map_or(IntentHint::Unknown, |s| s.hint),
            domain,
            should_roll,
            stat: None,
            skill: None,
            dc: None,
            action_label: classification.label(),
            narration: None,
        }
    }

    /// Returns `true` if resolving this decision should overwrite the
    /// campaign's last resolved action.
    #[must_use]
    pub fn updates_last_action(&self) -> bool {
        !matches!(self.intent_type, IntentHint::Speech | IntentHint::PastRef)
    }
}

/// Reasons a generative decision is rejected.
#[derive(Debug, Error)]
pub enum DecisionParseError {
    /// The output contains no JSON object.
    #[error("no JSON object found in router output")]
    NoJson,

    /// The JSON does not match the decision schema.
    #[error("router output does not match the decision schema: {0}")]
    Schema(#[from] serde_json::Error),

    /// The difficulty class is outside `1..=30`.
    #[error("difficulty class {0} is outside 1..={MAX_DC}")]
    DcOutOfRange(u8),

    /// The action label is blank.
    #[error("action label must not be empty")]
    EmptyLabel,

    /// The decision names a segment that does not exist.
    #[error("unknown segment id {0}")]
    UnknownSegment(String),

    /// The fields contradict each other or the annotated segments.
    #[error("inconsistent decision: {0}")]
    Inconsistent(&'static str),
}

impl From<DecisionParseError> for DomainError {
    fn from(err: DecisionParseError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Wire schema of the generative router's decision. Every required field is
/// non-optional so a missing field fails deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIntentDecision {
    #[serde(default)]
    primary_segment_id: Option<String>,
    intent_type: IntentHint,
    domain: Domain,
    should_roll: bool,
    #[serde(default)]
    stat: Option<Ability>,
    #[serde(default)]
    skill: Option<String>,
    #[serde(default)]
    dc: Option<u8>,
    action_label: String,
    #[serde(default)]
    narration: Option<String>,
}

/// Parses and validates raw router output against the annotated segments.
///
/// Accepts a bare JSON object or one wrapped in prose or code fences.
///
/// # Errors
///
/// Returns a `DecisionParseError` describing the first violated rule.
pub fn parse_intent_decision(
    raw: &str,
    segments: &[Segment],
) -> Result<IntentDecision, DecisionParseError> {
    let json = extract_json_object(raw).ok_or(DecisionParseError::NoJson)?;
    let decision: RawIntentDecision = serde_json::from_str(json)?;

    let action_label = decision.action_label.trim().to_owned();
    if action_label.is_empty() {
        return Err(DecisionParseError::EmptyLabel);
    }
    if let Some(dc) = decision.dc {
        if dc == 0 || dc > MAX_DC {
            return Err(DecisionParseError::DcOutOfRange(dc));
        }
    }
    if decision.should_roll && decision.domain == Domain::None {
        return Err(DecisionParseError::Inconsistent(
            "a roll requires a mechanical domain",
        ));
    }
    if decision.should_roll
        && matches!(decision.intent_type, IntentHint::Speech | IntentHint::PastRef)
    {
        return Err(DecisionParseError::Inconsistent(
            "speech and past references never roll",
        ));
    }

    let primary_segment_id = match decision.primary_segment_id {
        Some(id) => {
            let segment = segments
                .iter()
                .find(|s| s.id == id)
                .ok_or_else(|| DecisionParseError::UnknownSegment(id.clone()))?;
            if decision.should_roll && segment.no_roll_candidate {
                return Err(DecisionParseError::Inconsistent(
                    "primary segment is a no-roll segment",
                ));
            }
            Some(id)
        }
        None => select_primary(segments).map(|s| s.id.clone()),
    };

    Ok(IntentDecision {
        primary_segment_id,
        intent_type: decision.intent_type,
        domain: decision.domain,
        should_roll: decision.should_roll,
        stat: decision.stat,
        skill: decision
            .skill
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty()),
        dc: decision.dc,
        action_label,
        narration: decision
            .narration
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty()),
    })
}

/// Parses router output, returning `fallback` unchanged on any failure.
#[must_use]
pub fn safe_parse_intent_decision(
    raw: &str,
    segments: &[Segment],
    fallback: IntentDecision,
) -> IntentDecision {
    parse_intent_decision(raw, segments).unwrap_or(fallback)
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}
