//! The campaign's last resolved action, used as an anchor for detecting
//! back-references in later messages.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use talewright_core::clock::Clock;

use super::decision::{Ability, Domain};

/// Maximum number of anchor keywords kept per action.
const MAX_KEYWORDS: usize = 8;

const STOPWORDS: &[&str] = &[
    "about", "after", "again", "against", "also", "been", "before", "being", "from", "have",
    "here", "into", "just", "more", "over", "really", "some", "than", "that", "their", "them",
    "then", "there", "they", "this", "through", "very", "want", "were", "what", "when", "where",
    "which", "while", "will", "with", "would", "your",
];

/// Summary of the most recent non-speech, non-back-reference action that
/// resolved in a campaign. One per campaign, overwritten on each resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastResolvedAction {
    /// Short human-readable summary ("sneak past guard").
    pub summary: String,
    /// The action's domain.
    pub domain: Domain,
    /// Ability used, if a check was rolled.
    pub stat: Option<Ability>,
    /// Skill used, if any.
    pub skill: Option<String>,
    /// When the action resolved.
    pub timestamp: DateTime<Utc>,
    /// Lower-case anchor keywords extracted from the summary.
    pub keywords: Vec<String>,
}

impl LastResolvedAction {
    /// Builds a record, extracting anchor keywords from `summary`.
    #[must_use]
    pub fn new(
        summary: impl Into<String>,
        domain: Domain,
        stat: Option<Ability>,
        skill: Option<String>,
        clock: &dyn Clock,
    ) -> Self {
        let summary = summary.into();
        let keywords = extract_keywords(&summary);
        Self {
            summary,
            domain,
            stat,
            skill,
            timestamp: clock.now(),
            keywords,
        }
    }

    /// Returns `true` if `text` contains any of this action's keywords.
    #[must_use]
    pub fn matches_anchor(&self, text: &str) -> bool {
        let words: HashSet<String> = words_of(text).collect();
        self.keywords.iter().any(|k| words.contains(k))
    }
}

/// Extracts up to eight distinct, lower-case content words (four letters or
/// longer, not stopwords) from `text`, in order of appearance.
#[must_use]
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    words_of(text)
        .filter(|w| w.chars().count() >= 4 && !STOPWORDS.contains(&w.as_str()))
        .filter(|w| seen.insert(w.clone()))
        .take(MAX_KEYWORDS)
        .collect()
}

fn words_of(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use talewright_test_support::fixed_clock;

    #[test]
    fn test_extract_keywords_drops_short_words_and_stopwords() {
        let keywords = extract_keywords("I sneak past the guard with that lantern");
        assert_eq!(keywords, vec!["sneak", "past", "guard", "lantern"]);
    }

    #[test]
    fn test_extract_keywords_dedupes_and_caps() {
        let keywords = extract_keywords(
            "guard guard alpha bravo charlie delta echo foxtrot golf hotel india",
        );
        assert_eq!(keywords.len(), MAX_KEYWORDS);
        assert_eq!(keywords[0], "guard");
        assert_eq!(keywords.iter().filter(|k| *k == "guard").count(), 1);
    }

    #[test]
    fn test_new_records_clock_time_and_keywords() {
        let clock = fixed_clock();
        let action = LastResolvedAction::new(
            "pick the lock",
            Domain::Physical,
            Some(Ability::Dex),
            Some("sleight_of_hand".to_owned()),
            &clock,
        );
        assert_eq!(action.timestamp, clock.0);
        assert_eq!(action.keywords, vec!["pick", "lock"]);
    }

    #[test]
    fn test_matches_anchor_is_case_insensitive_whole_word() {
        let action =
            LastResolvedAction::new("bribe the Bartender", Domain::Social, None, None, &fixed_clock());
        assert!(action.matches_anchor("I already paid the BARTENDER"));
        assert!(!action.matches_anchor("I look at the bar"));
    }
}
