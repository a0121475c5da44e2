//! Message segmentation.
//!
//! Splits a player utterance into atomic segments: one per line, with quoted
//! speech separated from the narration around it, and overly long narration
//! clauses broken into sentences.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Narration clauses longer than this (in characters) are re-split into
/// sentences when they contain sentence punctuation.
pub const LONG_CLAUSE_CHARS: usize = 120;

static QUOTED_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]*"|“[^”]*”"#).expect("valid regex"));
static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]+|[^.!?]+$").expect("valid regex"));
static SENTENCE_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]").expect("valid regex"));

/// Heuristic hint attached to a segment by the annotator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentHint {
    /// Quoted or reported in-character speech.
    Speech,
    /// A polite ask for an item, service or favor.
    Request,
    /// An immediate action.
    ActionNow,
    /// A reference back to something already said or done.
    PastRef,
    /// A stated future intention.
    Plan,
    /// Nothing recognizable.
    Unknown,
}

/// Evidence recorded on a segment while it is annotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentMarker {
    /// The segment is a quoted span.
    Quoted,
    /// "I say/tell/ask..." lead-in.
    SpeechLeadIn,
    /// Past-tense self narration ("I already paid").
    PastTense,
    /// Retraction or back-reference phrasing ("scratch that", "I meant").
    Retraction,
    /// The segment shares keywords with the last resolved action.
    AnchorPastRef,
    /// Polite-ask phrasing.
    PoliteAsk,
    /// The request concerns a trivial item or service.
    TrivialRequest,
    /// An aggression verb is present.
    Aggression,
    /// Leading imperative verb of combat, stealth or motion.
    ImperativeVerb,
    /// Future-tense intention phrasing.
    FutureTense,
}

/// One atomic piece of a player message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Sequential identifier (`seg-1`, `seg-2`, ...).
    pub id: String,
    /// The segment text, trimmed.
    pub text: String,
    /// Annotator hint.
    pub hint: IntentHint,
    /// Annotator confidence in `[0, 1]`.
    pub confidence: f32,
    /// Whether the text overlaps the last resolved action's keywords.
    pub anchor_match: bool,
    /// Whether this segment alone never warrants a roll.
    pub no_roll_candidate: bool,
    /// Evidence gathered during annotation.
    pub markers: Vec<SegmentMarker>,
}

impl Segment {
    fn new(index: usize, text: String, quoted: bool) -> Self {
        Self {
            id: format!("seg-{}", index + 1),
            text,
            hint: IntentHint::Unknown,
            confidence: 0.0,
            anchor_match: false,
            no_roll_candidate: false,
            markers: if quoted {
                vec![SegmentMarker::Quoted]
            } else {
                Vec::new()
            },
        }
    }

    /// Returns `true` if the marker was recorded on this segment.
    #[must_use]
    pub fn has_marker(&self, marker: SegmentMarker) -> bool {
        self.markers.contains(&marker)
    }
}

/// Splits raw player text into un-annotated segments, preserving order.
///
/// Empty (or whitespace-only) input yields no segments; any other input
/// yields at least one.
#[must_use]
pub fn segment_message(text: &str) -> Vec<Segment> {
    let mut pieces: Vec<(String, bool)> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut cursor = 0;
        for span in QUOTED_SPAN.find_iter(line) {
            push_narration(&line[cursor..span.start()], &mut pieces);
            let quoted = span.as_str().trim();
            if has_content(quoted) {
                pieces.push((quoted.to_owned(), true));
            }
            cursor = span.end();
        }
        push_narration(&line[cursor..], &mut pieces);
    }

    let trimmed = text.trim();
    if pieces.is_empty() && !trimmed.is_empty() {
        pieces.push((trimmed.to_owned(), false));
    }

    pieces
        .into_iter()
        .enumerate()
        .map(|(index, (text, quoted))| Segment::new(index, text, quoted))
        .collect()
}

fn push_narration(raw: &str, pieces: &mut Vec<(String, bool)>) {
    let clause = raw.trim();
    if !has_content(clause) {
        return;
    }
    if clause.chars().count() > LONG_CLAUSE_CHARS && SENTENCE_PUNCTUATION.is_match(clause) {
        for sentence in SENTENCE.find_iter(clause) {
            let sentence = sentence.as_str().trim();
            if has_content(sentence) {
                pieces.push((sentence.to_owned(), false));
            }
        }
    } else {
        pieces.push((clause.to_owned(), false));
    }
}

fn has_content(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_no_segments() {
        assert!(segment_message("").is_empty());
        assert!(segment_message("   \n\t ").is_empty());
    }

    #[test]
    fn test_plain_sentence_is_single_segment() {
        let segments = segment_message("I open the door.");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].id, "seg-1");
        assert_eq!(segments[0].text, "I open the door.");
        assert!(!segments[0].has_marker(SegmentMarker::Quoted));
    }

    #[test]
    fn test_quoted_speech_is_split_from_narration() {
        let segments = segment_message(r#"I say "hello there" and step back."#);
        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["I say", "\"hello there\"", "and step back."]);
        assert!(segments[1].has_marker(SegmentMarker::Quoted));
        let ids: Vec<&str> = segments.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["seg-1", "seg-2", "seg-3"]);
    }

    #[test]
    fn test_smart_quotes_are_recognized() {
        let segments = segment_message("“Stand aside,” I growl.");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "“Stand aside,”");
        assert!(segments[0].has_marker(SegmentMarker::Quoted));
        assert_eq!(segments[1].text, "I growl.");
    }

    #[test]
    fn test_lines_become_separate_segments() {
        let segments = segment_message("I draw my sword.\n\nI charge at the orc.");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].text, "I charge at the orc.");
    }

    #[test]
    fn test_long_clause_is_split_into_sentences() {
        let text = "I creep along the wall keeping to the shadows as best I can. \
                    When I reach the end of the corridor I peek around the corner. \
                    Then I wait for the patrol to pass.";
        assert!(text.chars().count() > LONG_CLAUSE_CHARS);
        let segments = segment_message(text);
        assert_eq!(segments.len(), 3);
        assert!(segments[0].text.ends_with("can."));
        assert_eq!(segments[2].text, "Then I wait for the patrol to pass.");
    }

    #[test]
    fn test_long_clause_without_punctuation_is_kept_whole() {
        let text = "a".repeat(LONG_CLAUSE_CHARS + 10);
        let segments = segment_message(&text);
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_punctuation_only_input_still_yields_a_segment() {
        let segments = segment_message("...");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "...");
    }

    #[test]
    fn test_unterminated_quote_stays_with_narration() {
        let segments = segment_message(r#"I say "wait"#);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, r#"I say "wait"#);
    }
}
