//! Ordered matcher library for intent classification.
//!
//! Stages, in evaluation order:
//! 1. named patterns (surrender/self-harm, explicit attack, combat-only
//!    actions, coercion, covert stealth, deception, persuasion, stunts);
//! 2. keyword buckets (violence, stealth, social, physical);
//! 3. an "I try to..." attempt lead-in;
//! 4. the no-roll talk default, which always matches.
//!
//! The first matcher that accepts the input wins.

use std::sync::LazyLock;

use regex::Regex;

use super::classifier::{
    ActionKind, ClassifierInput, IntentClassification, IntentTag, RuleOutcome, Stakes,
    SuggestedCheck, finish,
};

/// One entry of the matcher library.
pub trait IntentMatcher: Send + Sync {
    /// Stable rule name, reported in `IntentClassification::rule`.
    fn name(&self) -> &'static str;

    /// Whether this matcher accepts the input.
    fn matches(&self, input: &ClassifierInput<'_>) -> bool;

    /// Builds the classification for an accepted input.
    fn build(&self, input: &ClassifierInput<'_>) -> IntentClassification;
}

/// A regex-driven rule with a fixed outcome.
#[derive(Debug)]
pub struct PatternRule {
    name: &'static str,
    pattern: Regex,
    combat_only: bool,
    action: ActionKind,
    tags: &'static [IntentTag],
    stakes: Stakes,
    check: SuggestedCheck,
    reason: &'static str,
}

impl PatternRule {
    /// Compiles a rule.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is not a valid regex; patterns are static literals.
    #[must_use]
    pub fn new(
        name: &'static str,
        pattern: &str,
        action: ActionKind,
        tags: &'static [IntentTag],
        stakes: Stakes,
        check: SuggestedCheck,
        reason: &'static str,
    ) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("valid regex"),
            combat_only: false,
            action,
            tags,
            stakes,
            check,
            reason,
        }
    }

    /// Restricts the rule to inputs made while a battle is in progress.
    #[must_use]
    pub fn combat_only(mut self) -> Self {
        self.combat_only = true;
        self
    }
}

impl IntentMatcher for PatternRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn matches(&self, input: &ClassifierInput<'_>) -> bool {
        (!self.combat_only || input.game_context.in_combat) && self.pattern.is_match(input.text)
    }

    fn build(&self, input: &ClassifierInput<'_>) -> IntentClassification {
        let matched = self
            .pattern
            .find(input.text)
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_default();
        finish(
            input,
            RuleOutcome {
                rule: self.name,
                action: self.action,
                tags: self.tags.to_vec(),
                stakes: self.stakes,
                suggested_check: self.check,
                reason: format!("{} (\"{matched}\")", self.reason),
            },
        )
    }
}

/// Always matches; yields a no-roll talk action.
#[derive(Debug)]
pub struct DefaultTalk;

impl IntentMatcher for DefaultTalk {
    fn name(&self) -> &'static str {
        "default_talk"
    }

    fn matches(&self, _input: &ClassifierInput<'_>) -> bool {
        true
    }

    fn build(&self, input: &ClassifierInput<'_>) -> IntentClassification {
        finish(
            input,
            RuleOutcome {
                rule: self.name(),
                action: ActionKind::Talk,
                tags: Vec::new(),
                stakes: Stakes::Low,
                suggested_check: SuggestedCheck::None,
                reason: "no mechanical pattern matched".to_owned(),
            },
        )
    }
}

/// An ordered list of matchers; the first match wins.
pub struct IntentLibrary {
    matchers: Vec<Box<dyn IntentMatcher>>,
}

impl IntentLibrary {
    /// Builds a library from matchers in evaluation order. A `DefaultTalk`
    /// matcher is appended so classification always produces a result.
    #[must_use]
    pub fn new(mut matchers: Vec<Box<dyn IntentMatcher>>) -> Self {
        matchers.push(Box::new(DefaultTalk));
        Self { matchers }
    }

    /// Rule names in evaluation order.
    #[must_use]
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    /// Classifies `input` with the first accepting matcher.
    #[must_use]
    pub fn classify(&self, input: &ClassifierInput<'_>) -> IntentClassification {
        self.matchers
            .iter()
            .find(|m| m.matches(input))
            .map_or_else(|| DefaultTalk.build(input), |m| m.build(input))
    }
}

impl std::fmt::Debug for IntentLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentLibrary")
            .field("rules", &self.rule_names())
            .finish()
    }
}

static DEFAULT_LIBRARY: LazyLock<IntentLibrary> = LazyLock::new(|| {
    let mut matchers: Vec<Box<dyn IntentMatcher>> = Vec::new();
    matchers.extend(named_patterns().into_iter().map(boxed));
    matchers.extend(keyword_buckets().into_iter().map(boxed));
    matchers.push(boxed(attempt_lead_in()));
    IntentLibrary::new(matchers)
});

/// The library used by `classify_intent`.
#[must_use]
pub fn default_library() -> &'static IntentLibrary {
    &DEFAULT_LIBRARY
}

fn boxed(rule: PatternRule) -> Box<dyn IntentMatcher> {
    Box::new(rule)
}

fn named_patterns() -> Vec<PatternRule> {
    use ActionKind as A;
    use IntentTag as T;
    use SuggestedCheck as C;

    vec![
        PatternRule::new(
            "surrender",
            r"(?i)\b(surrender|yield|give up|lay down my (arms|weapons?)|drop my (weapon|sword|blade|bow|axe)|beg for mercy)\b",
            A::Surrender,
            &[T::Surrender],
            Stakes::Low,
            C::None,
            "player gives up the fight",
        ),
        PatternRule::new(
            "self_harm",
            r"(?i)\b(kill|stab|cut|hurt|wound|hang|poison|harm|burn)\s+myself\b",
            A::SelfHarm,
            &[T::SelfHarm, T::Violence],
            Stakes::High,
            C::None,
            "player turns violence on their own character",
        ),
        PatternRule::new(
            "explicit_attack",
            r"(?i)\b(attack|attacks|strike|stab|slash|shoot|swing at|lunge at|charge at|fight|tackle|kill|murder|behead|strangle|choke)\b",
            A::Attack,
            &[T::Violence],
            Stakes::Medium,
            C::Combat,
            "explicit attack verb",
        ),
        PatternRule::new(
            "combat_defend",
            r"(?i)\b(defend|block|parry|brace|take cover|raise my shield|dodge)\b",
            A::Defend,
            &[T::Combat],
            Stakes::Low,
            C::Combat,
            "defensive stance in battle",
        )
        .combat_only(),
        PatternRule::new(
            "combat_spell",
            r"(?i)\b(cast|casts|spell|incantation|fire ?bolt|magic missile)\b",
            A::Spell,
            &[T::Combat, T::Magic],
            Stakes::Medium,
            C::Combat,
            "spellcasting in battle",
        )
        .combat_only(),
        PatternRule::new(
            "combat_item",
            r"(?i)\b((drink|quaff|use|throw|apply)\s+(a |an |my |the )?(potion|flask|bomb|vial|scroll|salve|item)|use my)\b",
            A::Item,
            &[T::Combat, T::Item],
            Stakes::Low,
            C::Combat,
            "item use in battle",
        )
        .combat_only(),
        PatternRule::new(
            "combat_move",
            r"(?i)\b(move|retreat|flee|run|step back|fall back|advance|reposition)\b",
            A::Move,
            &[T::Combat, T::Movement],
            Stakes::Low,
            C::Combat,
            "movement in battle",
        )
        .combat_only(),
        PatternRule::new(
            "coercion",
            r"(?i)\b(threaten|threatens|intimidate|menace|coerce|blackmail|extort|or else|at knifepoint|at swordpoint)\b",
            A::Threaten,
            &[T::Social, T::Coercion],
            Stakes::Medium,
            C::Social,
            "coercion or threat",
        ),
        PatternRule::new(
            "covert_stealth",
            r"(?i)\b(sneak|sneaks|hide|creep|pickpocket|steal|slip past|tiptoe|eavesdrop|lift (his|her|their) (purse|coin|wallet)|shadow (him|her|them))\b",
            A::Sneak,
            &[T::Stealth],
            Stakes::Medium,
            C::Stealth,
            "covert action",
        ),
        PatternRule::new(
            "social_deception",
            r"(?i)\b(lie|lies|bluff|deceive|pretend|trick|con|feint|disguise|pass (myself )?off as|fake)\b",
            A::Deceive,
            &[T::Social, T::Deception],
            Stakes::Medium,
            C::Social,
            "deception",
        ),
        PatternRule::new(
            "social_persuasion",
            r"(?i)\b(persuade|convince|negotiate|bargain|haggle|plead|beg|charm|flatter|reason with|bribe)\b",
            A::Persuade,
            &[T::Social, T::Persuasion],
            Stakes::Low,
            C::Social,
            "persuasion",
        ),
        PatternRule::new(
            "physical_stunt",
            r"(?i)\b(climb|jump|leap|vault|swing from|balance|tumble|somersault|flip|scale|swim|break down|kick down|force open|lift|shove|sprint|dive)\b",
            A::Stunt,
            &[T::Physical],
            Stakes::Medium,
            C::Physical,
            "physical stunt",
        ),
    ]
}

fn keyword_buckets() -> Vec<PatternRule> {
    use ActionKind as A;
    use IntentTag as T;
    use SuggestedCheck as C;

    vec![
        PatternRule::new(
            "violence_bucket",
            r"(?i)\b(hit|punch|kick|slap|headbutt|wound|blade|sword|axe|dagger|mace|bow|arrow|blood|brawl)\b",
            A::Attack,
            &[T::Violence],
            Stakes::Medium,
            C::Combat,
            "violent keyword",
        ),
        PatternRule::new(
            "stealth_bucket",
            r"(?i)\b(quiet|quietly|silently|unseen|unnoticed|shadows|stealthily|hidden|conceal)\b",
            A::Sneak,
            &[T::Stealth],
            Stakes::Medium,
            C::Stealth,
            "stealthy keyword",
        ),
        PatternRule::new(
            "social_bucket",
            r"(?i)\b(sway|impress|flirt|seduce|insult|mock|taunt|rally|inspire|calm|soothe)\b",
            A::Influence,
            &[T::Social],
            Stakes::Low,
            C::Social,
            "social keyword",
        ),
        PatternRule::new(
            "physical_bucket",
            r"(?i)\b(push|pull|carry|drag|run|crawl|dig|break|force|bend|throw|catch|hold on)\b",
            A::Stunt,
            &[T::Physical],
            Stakes::Medium,
            C::Physical,
            "physical keyword",
        ),
    ]
}

fn attempt_lead_in() -> PatternRule {
    PatternRule::new(
        "attempt",
        r"(?i)\b(i|we)\s+(try|tries|attempt|attempts)\s+to\b",
        ActionKind::Attempt,
        &[IntentTag::Physical],
        Stakes::Medium,
        SuggestedCheck::Physical,
        "generic attempt",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::classifier::GameContext;

    #[test]
    fn test_default_library_order() {
        let names = default_library().rule_names();
        assert_eq!(names.first(), Some(&"surrender"));
        assert_eq!(names.last(), Some(&"default_talk"));
        let position = |rule: &str| names.iter().position(|n| *n == rule).unwrap();
        assert!(position("explicit_attack") < position("coercion"));
        assert!(position("coercion") < position("covert_stealth"));
        assert!(position("physical_stunt") < position("violence_bucket"));
        assert!(position("physical_bucket") < position("attempt"));
    }

    #[test]
    fn test_every_named_pattern_matches_its_example() {
        let context = GameContext {
            in_combat: true,
            environment: Vec::new(),
        };
        let examples = [
            ("surrender", "I yield!"),
            ("self_harm", "I cut myself"),
            ("explicit_attack", "I shoot the bandit"),
            ("combat_defend", "I parry"),
            ("combat_spell", "I cast a spell"),
            ("combat_item", "I quaff my potion"),
            ("combat_move", "I fall back"),
            ("coercion", "Pay up or else"),
            ("covert_stealth", "I pickpocket the noble"),
            ("social_deception", "I pretend to be a guard"),
            ("social_persuasion", "I haggle over the price"),
            ("physical_stunt", "I vault over the table"),
        ];
        for (rule, text) in examples {
            let input = ClassifierInput::new(text, &[], &context);
            let result = default_library().classify(&input);
            assert_eq!(result.rule, rule, "{text:?}");
        }
    }

    #[test]
    fn test_combat_only_rule_is_skipped_outside_combat() {
        let context = GameContext::default();
        let rule = PatternRule::new(
            "probe",
            r"(?i)\bparry\b",
            ActionKind::Defend,
            &[IntentTag::Combat],
            Stakes::Low,
            SuggestedCheck::Combat,
            "probe",
        )
        .combat_only();
        assert!(!rule.matches(&ClassifierInput::new("I parry", &[], &context)));
    }

    #[test]
    fn test_custom_library_falls_through_to_default() {
        let library = IntentLibrary::new(Vec::new());
        let context = GameContext::default();
        let result = library.classify(&ClassifierInput::new("I attack", &[], &context));
        assert_eq!(result.rule, "default_talk");
    }
}
