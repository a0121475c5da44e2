//! Deterministic intent classification.
//!
//! `classify_intent` runs the ordered matcher library from
//! [`patterns`](super::patterns): the first matcher that accepts the input
//! fully determines the result. Target resolution and stakes escalation are
//! applied uniformly afterwards.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::last_action::LastResolvedAction;
use super::patterns::default_library;

static ROLE_NOUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(guard|guards|bartender|barkeep|innkeeper|merchant|shopkeeper|soldier|captain|priest|thief|stranger|bandit|goblin|orc|cultist|noble|beggar|sailor|knight|wizard|man|woman)\b",
    )
    .expect("valid regex")
});
static LETHAL_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(kill|murder|strangle|choke|gut|cripple|behead|execute|slit (his|her|their) throat)\b",
    )
    .expect("valid regex")
});

/// The action a player's text describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Attack,
    Defend,
    Move,
    Item,
    Spell,
    Surrender,
    SelfHarm,
    Threaten,
    Sneak,
    Deceive,
    Persuade,
    Influence,
    Stunt,
    Attempt,
    Talk,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Attack => "attack",
            Self::Defend => "defend",
            Self::Move => "move",
            Self::Item => "item",
            Self::Spell => "spell",
            Self::Surrender => "surrender",
            Self::SelfHarm => "self_harm",
            Self::Threaten => "threaten",
            Self::Sneak => "sneak",
            Self::Deceive => "deceive",
            Self::Persuade => "persuade",
            Self::Influence => "influence",
            Self::Stunt => "stunt",
            Self::Attempt => "attempt",
            Self::Talk => "talk",
        };
        f.write_str(name)
    }
}

/// Coarse tags describing the character of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentTag {
    Violence,
    Surrender,
    SelfHarm,
    Coercion,
    Stealth,
    Social,
    Deception,
    Persuasion,
    Physical,
    Combat,
    Magic,
    Item,
    Movement,
}

/// How much is riding on the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stakes {
    Low,
    Medium,
    High,
}

/// The kind of check the classifier suggests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedCheck {
    Combat,
    Stealth,
    Social,
    Physical,
    None,
}

/// Scene conditions that affect difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentTag {
    Cluttered,
    Armored,
    Indoor,
    Outdoor,
    Dark,
    Crowded,
}

/// Game state visible to the classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameContext {
    /// A battle is in progress for the campaign.
    pub in_combat: bool,
    /// Scene conditions.
    #[serde(default)]
    pub environment: Vec<EnvironmentTag>,
}

/// Everything the classifier looks at.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierInput<'a> {
    /// Raw player text.
    pub text: &'a str,
    /// Names of characters present in the scene.
    pub scene_participants: &'a [String],
    /// Game state.
    pub game_context: &'a GameContext,
    /// The campaign's last resolved action, if any.
    pub last_resolved_action: Option<&'a LastResolvedAction>,
    /// Target explicitly selected in the UI, if any.
    pub selected_target: Option<&'a str>,
}

impl<'a> ClassifierInput<'a> {
    /// Input with no anchor action and no UI-selected target.
    #[must_use]
    pub fn new(text: &'a str, scene_participants: &'a [String], game_context: &'a GameContext) -> Self {
        Self {
            text,
            scene_participants,
            game_context,
            last_resolved_action: None,
            selected_target: None,
        }
    }

    /// Sets the anchor action.
    #[must_use]
    pub fn with_last_action(mut self, last: Option<&'a LastResolvedAction>) -> Self {
        self.last_resolved_action = last;
        self
    }

    /// Sets the UI-selected target.
    #[must_use]
    pub fn with_selected_target(mut self, target: Option<&'a str>) -> Self {
        self.selected_target = target;
        self
    }
}

/// Result of deterministic classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub action: ActionKind,
    pub target: Option<String>,
    pub tags: Vec<IntentTag>,
    pub stakes: Stakes,
    pub suggested_check: SuggestedCheck,
    pub reason: String,
    /// Name of the matcher that produced this result.
    pub rule: String,
}

impl IntentClassification {
    /// Short label: the action, followed by the target when there is one.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.target {
            Some(target) => format!("{} {target}", self.action),
            None => self.action.to_string(),
        }
    }

    /// Returns `true` if the classification carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: IntentTag) -> bool {
        self.tags.contains(&tag)
    }
}

/// What a matcher decided, before target and stakes post-processing.
#[derive(Debug, Clone)]
pub struct RuleOutcome {
    pub rule: &'static str,
    pub action: ActionKind,
    pub tags: Vec<IntentTag>,
    pub stakes: Stakes,
    pub suggested_check: SuggestedCheck,
    pub reason: String,
}

/// Classifies player text with the default matcher library.
#[must_use]
pub fn classify_intent(input: &ClassifierInput<'_>) -> IntentClassification {
    default_library().classify(input)
}

/// Applies target resolution, lethal-verb stakes escalation and anchor notes
/// to a matcher's outcome.
#[must_use]
pub fn finish(input: &ClassifierInput<'_>, outcome: RuleOutcome) -> IntentClassification {
    let stakes = if LETHAL_VERB.is_match(input.text) {
        Stakes::High
    } else {
        outcome.stakes
    };

    let mut reason = outcome.reason;
    if let Some(last) = input.last_resolved_action {
        if last.matches_anchor(input.text) {
            reason.push_str(&format!("; echoes previous action \"{}\"", last.summary));
        }
    }

    IntentClassification {
        action: outcome.action,
        target: resolve_target(input.text, input.scene_participants, input.selected_target),
        tags: outcome.tags,
        stakes,
        suggested_check: outcome.suggested_check,
        reason,
        rule: outcome.rule.to_owned(),
    }
}

/// Resolves the action's target: the UI selection, else a scene participant
/// named in the text, else a generic role noun.
#[must_use]
pub fn resolve_target(
    text: &str,
    scene_participants: &[String],
    selected_target: Option<&str>,
) -> Option<String> {
    if let Some(selected) = selected_target.map(str::trim).filter(|s| !s.is_empty()) {
        return Some(selected.to_owned());
    }

    let lower = text.to_lowercase();
    let named = scene_participants.iter().find(|name| {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return false;
        }
        contains_word(&lower, &name)
            || name
                .split_whitespace()
                .next()
                .is_some_and(|first| first.chars().count() >= 3 && contains_word(&lower, first))
    });
    if let Some(name) = named {
        return Some(name.trim().to_owned());
    }

    ROLE_NOUN
        .find(text)
        .map(|m| m.as_str().to_lowercase())
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decision::Domain;
    use talewright_test_support::fixed_clock;

    fn classify(text: &str) -> IntentClassification {
        let context = GameContext::default();
        classify_intent(&ClassifierInput::new(text, &[], &context))
    }

    fn classify_in_combat(text: &str) -> IntentClassification {
        let context = GameContext {
            in_combat: true,
            environment: Vec::new(),
        };
        classify_intent(&ClassifierInput::new(text, &[], &context))
    }

    // --- named patterns ---

    #[test]
    fn test_attack_the_guard() {
        let result = classify("I attack the guard");
        assert_eq!(result.action, ActionKind::Attack);
        assert_eq!(result.tags, vec![IntentTag::Violence]);
        assert_eq!(result.suggested_check, SuggestedCheck::Combat);
        assert_eq!(result.target.as_deref(), Some("guard"));
        assert_eq!(result.rule, "explicit_attack");
    }

    #[test]
    fn test_surrender_wins_over_attack() {
        let result = classify("I surrender before they attack me");
        assert_eq!(result.action, ActionKind::Surrender);
        assert_eq!(result.suggested_check, SuggestedCheck::None);
    }

    #[test]
    fn test_self_harm_is_high_stakes_without_check() {
        let result = classify("I stab myself with the dagger");
        assert_eq!(result.action, ActionKind::SelfHarm);
        assert_eq!(result.stakes, Stakes::High);
        assert_eq!(result.suggested_check, SuggestedCheck::None);
    }

    #[test]
    fn test_threat_is_coercion() {
        let result = classify("I threaten the merchant until he lowers his price");
        assert_eq!(result.action, ActionKind::Threaten);
        assert!(result.has_tag(IntentTag::Coercion));
        assert_eq!(result.suggested_check, SuggestedCheck::Social);
        assert_eq!(result.target.as_deref(), Some("merchant"));
    }

    #[test]
    fn test_stealth_pattern() {
        let result = classify("I sneak past the sleeping dog");
        assert_eq!(result.action, ActionKind::Sneak);
        assert_eq!(result.suggested_check, SuggestedCheck::Stealth);
    }

    #[test]
    fn test_deception_pattern() {
        let result = classify("I bluff about being a royal courier");
        assert_eq!(result.action, ActionKind::Deceive);
        assert_eq!(result.tags, vec![IntentTag::Social, IntentTag::Deception]);
    }

    #[test]
    fn test_persuasion_pattern() {
        let result = classify("I try to convince the captain to let us pass");
        assert_eq!(result.action, ActionKind::Persuade);
        assert_eq!(result.target.as_deref(), Some("captain"));
    }

    #[test]
    fn test_physical_stunt_pattern() {
        let result = classify("I kick down the door");
        assert_eq!(result.action, ActionKind::Stunt);
        assert_eq!(result.suggested_check, SuggestedCheck::Physical);
    }

    // --- combat-only patterns ---

    #[test]
    fn test_defend_only_matches_in_combat() {
        assert_eq!(classify_in_combat("I raise my shield and defend").action, ActionKind::Defend);
        assert_ne!(classify("I defend my honor").action, ActionKind::Defend);
    }

    #[test]
    fn test_spell_and_item_in_combat() {
        assert_eq!(classify_in_combat("I cast fire bolt").action, ActionKind::Spell);
        assert_eq!(classify_in_combat("I drink a potion").action, ActionKind::Item);
        assert_eq!(classify_in_combat("I retreat behind the pillar").action, ActionKind::Move);
    }

    // --- buckets, attempt, default ---

    #[test]
    fn test_violence_bucket() {
        let result = classify("I punch him in the jaw");
        assert_eq!(result.action, ActionKind::Attack);
        assert_eq!(result.rule, "violence_bucket");
    }

    #[test]
    fn test_stealth_bucket() {
        let result = classify("I move quietly along the hall");
        assert_eq!(result.action, ActionKind::Sneak);
        assert_eq!(result.rule, "stealth_bucket");
    }

    #[test]
    fn test_social_bucket() {
        let result = classify("I taunt the ogre");
        assert_eq!(result.action, ActionKind::Influence);
        assert_eq!(result.suggested_check, SuggestedCheck::Social);
    }

    #[test]
    fn test_physical_bucket() {
        let result = classify("I drag the crate to the window");
        assert_eq!(result.action, ActionKind::Stunt);
        assert_eq!(result.rule, "physical_bucket");
    }

    #[test]
    fn test_attempt_lead_in() {
        let result = classify("I try to remember the old song");
        assert_eq!(result.action, ActionKind::Attempt);
        assert_eq!(result.tags, vec![IntentTag::Physical]);
        assert_eq!(result.suggested_check, SuggestedCheck::Physical);
    }

    #[test]
    fn test_default_is_no_roll_talk() {
        let result = classify("Good evening to you all");
        assert_eq!(result.action, ActionKind::Talk);
        assert!(result.tags.is_empty());
        assert_eq!(result.suggested_check, SuggestedCheck::None);
        assert_eq!(result.stakes, Stakes::Low);
    }

    // --- stakes ---

    #[test]
    fn test_lethal_verb_escalates_stakes() {
        assert_eq!(classify("I attack the guard").stakes, Stakes::Medium);
        assert_eq!(classify("I strangle the guard").stakes, Stakes::High);
        assert_eq!(classify("I sneak up and choke him").stakes, Stakes::High);
    }

    // --- target resolution ---

    #[test]
    fn test_selected_target_wins() {
        let participants = vec!["Mira".to_owned()];
        let target = resolve_target("I attack Mira", &participants, Some(" Goblin Chief "));
        assert_eq!(target.as_deref(), Some("Goblin Chief"));
    }

    #[test]
    fn test_participant_name_match() {
        let participants = vec!["Old Tom".to_owned(), "Mira Vell".to_owned()];
        assert_eq!(
            resolve_target("I wink at mira", &participants, None).as_deref(),
            Some("Mira Vell")
        );
        assert_eq!(
            resolve_target("I shove old tom aside", &participants, None).as_deref(),
            Some("Old Tom")
        );
    }

    #[test]
    fn test_participant_match_requires_word_boundary() {
        let participants = vec!["Al".to_owned()];
        assert_eq!(resolve_target("I walk to the altar", &participants, None), None);
    }

    #[test]
    fn test_role_noun_fallback() {
        assert_eq!(
            resolve_target("I wave to the Bartender", &[], Some("  ")).as_deref(),
            Some("bartender")
        );
        assert_eq!(resolve_target("I wave", &[], None), None);
    }

    #[test]
    fn test_anchor_is_noted_in_reason() {
        let last = LastResolvedAction::new(
            "climb the tower",
            Domain::Physical,
            None,
            None,
            &fixed_clock(),
        );
        let context = GameContext::default();
        let input = ClassifierInput::new("I climb the tower again", &[], &context)
            .with_last_action(Some(&last));
        let result = classify_intent(&input);
        assert!(result.reason.contains("echoes previous action"));
    }

    #[test]
    fn test_label_includes_target() {
        let result = classify("I attack the guard");
        assert_eq!(result.label(), "attack guard");
        assert_eq!(classify("hello").label(), "talk");
    }
}
