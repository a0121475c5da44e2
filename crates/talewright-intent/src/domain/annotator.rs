//! Heuristic intent annotation of segments.
//!
//! Pattern families are tried in a fixed priority order:
//! PAST_REF > SPEECH > REQUEST > ACTION_NOW > PLAN > UNKNOWN.

use std::sync::LazyLock;

use regex::Regex;

use super::last_action::LastResolvedAction;
use super::segmenter::{IntentHint, Segment, SegmentMarker};

const PAST_REF_CONFIDENCE: f32 = 0.85;
const ANCHORED_PAST_REF_CONFIDENCE: f32 = 0.95;
const SPEECH_CONFIDENCE: f32 = 0.9;
const REQUEST_CONFIDENCE: f32 = 0.75;
const ACTION_NOW_CONFIDENCE: f32 = 0.8;
const PLAN_CONFIDENCE: f32 = 0.6;
const UNKNOWN_CONFIDENCE: f32 = 0.3;

static PAST_TENSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(i|we)\s+(already\s+|just\s+)?(said|told|asked|attacked|paid|gave|took|tried|went|did|meant|was|were|had|left|bought|ordered)\b",
    )
    .expect("valid regex")
});
static RETRACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(i meant|what i meant|i didn'?t mean|never ?mind|scratch that|take (that|it) back|as i said|like i said|i already|earlier i|last time|previously)\b",
    )
    .expect("valid regex")
});
static SPEECH_LEAD_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(and\s+|then\s+)?(i|we)\s+(say|tell|ask|shout|yell|whisper|reply|answer|mutter|call out|exclaim|respond)\b",
    )
    .expect("valid regex")
});
static POLITE_ASK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(can i|could i|may i|can you|could you|would you|will you|please|i'?d like|i would like|i want to (buy|order|rent|get|have)|i order)\b",
    )
    .expect("valid regex")
});
static TRIVIAL_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(drinks?|ale|beer|wine|mead|water|food|meal|stew|bread|room|bed|name|names|directions|information|info|news)\b",
    )
    .expect("valid regex")
});
static AGGRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(threat\w*|insult\w*|intimidat\w*|steal\w*|stole|demand\w*)\b")
        .expect("valid regex")
});
static IMPERATIVE_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(and\s+|then\s+|so\s+)?(i\s+)?(attack|strike|stab|slash|shoot|punch|kick|sneak|hide|climb|jump|leap|run|dash|grab|draw|charge|swing|dodge|cast|throw|push|pull|break|pick|search|move|step|open|lunge|tackle|flee|creep|block|parry|duck|fire)\b",
    )
    .expect("valid regex")
});
static FUTURE_TENSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(i'?ll|i will|i'?m going to|i am going to|i plan to|i intend to|next i|later i)\b",
    )
    .expect("valid regex")
});

/// Annotates every segment in place and returns them.
#[must_use]
pub fn annotate_segments(
    mut segments: Vec<Segment>,
    last_action: Option<&LastResolvedAction>,
) -> Vec<Segment> {
    for segment in &mut segments {
        annotate_segment(segment, last_action);
    }
    segments
}

/// Assigns a hint, confidence, anchor flag, markers and no-roll flag to one
/// segment.
pub fn annotate_segment(segment: &mut Segment, last_action: Option<&LastResolvedAction>) {
    let text = segment.text.as_str();
    let mut markers = Vec::new();
    if segment.has_marker(SegmentMarker::Quoted) {
        markers.push(SegmentMarker::Quoted);
    }

    segment.anchor_match = last_action.is_some_and(|action| action.matches_anchor(text));

    let past_tense = PAST_TENSE.is_match(text);
    let retraction = RETRACTION.is_match(text);
    let quoted = markers.contains(&SegmentMarker::Quoted);
    let speech_lead_in = SPEECH_LEAD_IN.is_match(text);

    let (hint, confidence) = if past_tense || retraction {
        if past_tense {
            markers.push(SegmentMarker::PastTense);
        }
        if retraction {
            markers.push(SegmentMarker::Retraction);
        }
        if segment.anchor_match {
            markers.push(SegmentMarker::AnchorPastRef);
            (IntentHint::PastRef, ANCHORED_PAST_REF_CONFIDENCE)
        } else {
            (IntentHint::PastRef, PAST_REF_CONFIDENCE)
        }
    } else if quoted || speech_lead_in {
        if speech_lead_in {
            markers.push(SegmentMarker::SpeechLeadIn);
        }
        (IntentHint::Speech, SPEECH_CONFIDENCE)
    } else if POLITE_ASK.is_match(text) {
        markers.push(SegmentMarker::PoliteAsk);
        (IntentHint::Request, REQUEST_CONFIDENCE)
    } else if IMPERATIVE_VERB.is_match(text) {
        markers.push(SegmentMarker::ImperativeVerb);
        (IntentHint::ActionNow, ACTION_NOW_CONFIDENCE)
    } else if FUTURE_TENSE.is_match(text) {
        markers.push(SegmentMarker::FutureTense);
        (IntentHint::Plan, PLAN_CONFIDENCE)
    } else {
        (IntentHint::Unknown, UNKNOWN_CONFIDENCE)
    };

    let no_roll = match hint {
        IntentHint::PastRef | IntentHint::Speech => true,
        IntentHint::Request => {
            let trivial = TRIVIAL_ITEM.is_match(text);
            let aggressive = AGGRESSION.is_match(text);
            if trivial {
                markers.push(SegmentMarker::TrivialRequest);
            }
            if aggressive {
                markers.push(SegmentMarker::Aggression);
            }
            trivial && !aggressive
        }
        IntentHint::ActionNow | IntentHint::Plan | IntentHint::Unknown => false,
    };

    segment.hint = hint;
    segment.confidence = confidence;
    segment.no_roll_candidate = no_roll;
    segment.markers = markers;
}

/// Picks the segment that best represents the player's intent: the first
/// ACTION_NOW, else REQUEST, else PLAN/UNKNOWN, else SPEECH, else PAST_REF.
#[must_use]
pub fn select_primary(segments: &[Segment]) -> Option<&Segment> {
    let rank = |hint: IntentHint| match hint {
        IntentHint::ActionNow => 0,
        IntentHint::Request => 1,
        IntentHint::Plan | IntentHint::Unknown => 2,
        IntentHint::Speech => 3,
        IntentHint::PastRef => 4,
    };
    // min_by_key keeps the first of equally ranked segments.
    segments.iter().min_by_key(|s| rank(s.hint))
}
