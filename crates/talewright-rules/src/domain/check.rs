//! Mapping an `IntentDecision` to a `PendingCheck`.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use talewright_core::clock::Clock;
use talewright_intent::domain::classifier::{ActionKind, EnvironmentTag, IntentClassification};
use talewright_intent::domain::decision::{Ability, Domain, IntentDecision};
use talewright_intent::domain::segmenter::IntentHint;
use uuid::Uuid;

/// Fixed armor class every attack roll is compared against.
pub const ARMOR_CLASS: u8 = 10;

static FORCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(break|smash|force|lift|push|pull|drag|shove|kick down|bend|carry|hold|wrestle|grapple|heave|pry)\b",
    )
    .expect("valid regex")
});
static ENDURANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(endure|resist|withstand|hold my breath|stay awake|keep going|march|survive|shake off|fight off)\b",
    )
    .expect("valid regex")
});

/// Kind of roll a pending check asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    Skill,
    Save,
    Attack,
}

/// Standard difficulty ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Difficulty {
    VeryEasy,
    Easy,
    Medium,
    Hard,
    VeryHard,
    NearlyImpossible,
}

impl Difficulty {
    /// The difficulty class of this step.
    #[must_use]
    pub fn dc(self) -> u8 {
        match self {
            Self::VeryEasy => 5,
            Self::Easy => 10,
            Self::Medium => 15,
            Self::Hard => 20,
            Self::VeryHard => 25,
            Self::NearlyImpossible => 30,
        }
    }

    /// One step harder; the top step stays put.
    #[must_use]
    pub fn step_up(self) -> Self {
        match self {
            Self::VeryEasy => Self::Easy,
            Self::Easy => Self::Medium,
            Self::Medium => Self::Hard,
            Self::Hard => Self::VeryHard,
            Self::VeryHard | Self::NearlyImpossible => Self::NearlyImpossible,
        }
    }
}

/// An outstanding request for a roll. At most one exists per campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCheck {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub check_type: CheckType,
    /// Who rolls.
    pub actor: String,
    pub target: Option<String>,
    pub stat: Ability,
    /// Difficulty class the total must meet.
    pub difficulty: u8,
    /// Player text the check was opened for.
    pub context: String,
    /// How stat and difficulty were chosen.
    pub reason: String,
    pub domain: Domain,
    pub skill: Option<String>,
    pub intent_type: IntentHint,
    pub intent: IntentDecision,
    pub created_at: DateTime<Utc>,
}

/// Where a decision goes next.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckRoute {
    /// Narrate without rolling.
    NoRoll,
    /// Hand over to the combat engine.
    Combat,
    /// Ask the player for a roll.
    Check(Box<PendingCheck>),
}

/// Inputs to `build_check` besides the decision itself.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub actor: &'a str,
    pub text: &'a str,
    pub classification: &'a IntentClassification,
    pub environment: &'a [EnvironmentTag],
}

/// Routes a decision: no roll, combat, or a new `PendingCheck`.
///
/// Stealth rolls DEX (stealth) and social rolls CHA (persuasion, deception or
/// intimidation); both are opposed at Medium when there is a target and fixed
/// at Easy otherwise. Physical checks are a STR (athletics) force check, a
/// CON save for endurance, or else a DEX (acrobatics) stunt, at Medium plus
/// one step in cluttered, armored or indoor scenes. Explicit stat, skill and
/// DC on the decision override the derived ones.
#[must_use]
pub fn build_check(
    decision: &IntentDecision,
    context: &CheckContext<'_>,
    id: Uuid,
    clock: &dyn Clock,
) -> CheckRoute {
    if !decision.should_roll {
        return CheckRoute::NoRoll;
    }

    let target = context.classification.target.clone();
    let (check_type, stat, skill, difficulty, reason) = match decision.domain {
        Domain::None => return CheckRoute::NoRoll,
        Domain::Combat => return CheckRoute::Combat,
        Domain::Stealth => {
            let (difficulty, reason) = opposed_or_fixed(target.as_deref());
            (CheckType::Skill, Ability::Dex, Some("stealth"), difficulty, reason)
        }
        Domain::Social => {
            let skill = match context.classification.action {
                ActionKind::Threaten => "intimidation",
                ActionKind::Deceive => "deception",
                _ => "persuasion",
            };
            let (difficulty, reason) = opposed_or_fixed(target.as_deref());
            (CheckType::Skill, Ability::Cha, Some(skill), difficulty, reason)
        }
        Domain::Physical => {
            let hampered = context.environment.iter().any(|tag| {
                matches!(
                    tag,
                    EnvironmentTag::Cluttered | EnvironmentTag::Armored | EnvironmentTag::Indoor
                )
            });
            let difficulty = if hampered {
                Difficulty::Medium.step_up()
            } else {
                Difficulty::Medium
            };
            let (check_type, stat, skill, kind) = if ENDURANCE.is_match(context.text) {
                (CheckType::Save, Ability::Con, None, "endurance")
            } else if FORCE.is_match(context.text) {
                (CheckType::Skill, Ability::Str, Some("athletics"), "force")
            } else {
                (CheckType::Skill, Ability::Dex, Some("acrobatics"), "stunt")
            };
            let reason = if hampered {
                format!("{kind}, harder in a hampering environment")
            } else {
                kind.to_owned()
            };
            (check_type, stat, skill, difficulty, reason)
        }
    };

    CheckRoute::Check(Box::new(PendingCheck {
        id,
        check_type,
        actor: context.actor.to_owned(),
        target,
        stat: decision.stat.unwrap_or(stat),
        difficulty: decision.dc.unwrap_or_else(|| difficulty.dc()),
        context: context.text.to_owned(),
        reason,
        domain: decision.domain,
        skill: decision.skill.clone().or_else(|| skill.map(str::to_owned)),
        intent_type: decision.intent_type,
        intent: decision.clone(),
        created_at: clock.now(),
    }))
}

/// Builds an attack-type check for a player who rolls their own attacks.
#[must_use]
pub fn attack_check(
    decision: &IntentDecision,
    context: &CheckContext<'_>,
    id: Uuid,
    clock: &dyn Clock,
) -> PendingCheck {
    PendingCheck {
        id,
        check_type: CheckType::Attack,
        actor: context.actor.to_owned(),
        target: context.classification.target.clone(),
        stat: decision.stat.unwrap_or(Ability::Str),
        difficulty: ARMOR_CLASS,
        context: context.text.to_owned(),
        reason: "attack against armor class".to_owned(),
        domain: Domain::Combat,
        skill: None,
        intent_type: decision.intent_type,
        intent: decision.clone(),
        created_at: clock.now(),
    }
}

fn opposed_or_fixed(target: Option<&str>) -> (Difficulty, String) {
    match target {
        Some(target) => (Difficulty::Medium, format!("opposed by {target}")),
        None => (Difficulty::Easy, "fixed difficulty".to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talewright_intent::domain::annotator::annotate_segments;
    use talewright_intent::domain::classifier::{ClassifierInput, GameContext, classify_intent};
    use talewright_intent::domain::segmenter::segment_message;
    use talewright_test_support::fixed_clock;

    fn route(text: &str, environment: &[EnvironmentTag]) -> CheckRoute {
        let context = GameContext {
            in_combat: false,
            environment: environment.to_vec(),
        };
        let participants = ["Captain Rhys".to_owned()];
        let classification = classify_intent(&ClassifierInput::new(text, &participants, &context));
        let segments = annotate_segments(segment_message(text), None);
        let decision = IntentDecision::from_classification(&segments, &classification);
        build_check(
            &decision,
            &CheckContext {
                actor: "player",
                text,
                classification: &classification,
                environment,
            },
            Uuid::nil(),
            &fixed_clock(),
        )
    }

    fn pending(route: CheckRoute) -> PendingCheck {
        match route {
            CheckRoute::Check(check) => *check,
            other => panic!("expected a pending check, got {other:?}"),
        }
    }

    // --- routing ---

    #[test]
    fn test_talk_needs_no_roll() {
        assert_eq!(route("Good evening to you all", &[]), CheckRoute::NoRoll);
    }

    #[test]
    fn test_attack_routes_to_combat() {
        assert_eq!(route("I attack the guard", &[]), CheckRoute::Combat);
    }

    // --- stealth and social ---

    #[test]
    fn test_unopposed_sneak_is_easy_dex_stealth() {
        let check = pending(route("I sneak through the empty cellar", &[]));
        assert_eq!(check.stat, Ability::Dex);
        assert_eq!(check.skill.as_deref(), Some("stealth"));
        assert_eq!(check.difficulty, 10);
        assert_eq!(check.check_type, CheckType::Skill);
    }

    #[test]
    fn test_opposed_sneak_is_medium() {
        let check = pending(route("I sneak past the guard", &[]));
        assert_eq!(check.difficulty, 15);
        assert_eq!(check.target.as_deref(), Some("guard"));
    }

    #[test]
    fn test_threat_rolls_cha_intimidation() {
        let check = pending(route("I threaten Captain Rhys", &[]));
        assert_eq!(check.stat, Ability::Cha);
        assert_eq!(check.skill.as_deref(), Some("intimidation"));
        assert_eq!(check.target.as_deref(), Some("Captain Rhys"));
    }

    #[test]
    fn test_bluff_rolls_deception() {
        let check = pending(route("I bluff about being a royal courier", &[]));
        assert_eq!(check.skill.as_deref(), Some("deception"));
        assert_eq!(check.difficulty, 10);
    }

    // --- physical ---

    #[test]
    fn test_kick_down_door_is_str_athletics() {
        let check = pending(route("I kick down the door", &[]));
        assert_eq!(check.stat, Ability::Str);
        assert_eq!(check.skill.as_deref(), Some("athletics"));
        assert_eq!(check.difficulty, 15);
    }

    #[test]
    fn test_climb_is_dex_acrobatics_and_harder_indoors() {
        let check = pending(route("I climb the bookshelf", &[EnvironmentTag::Indoor]));
        assert_eq!(check.stat, Ability::Dex);
        assert_eq!(check.skill.as_deref(), Some("acrobatics"));
        assert_eq!(check.difficulty, 20);
    }

    #[test]
    fn test_endurance_is_con_save() {
        let check = pending(route("I try to resist the freezing wind", &[]));
        assert_eq!(check.check_type, CheckType::Save);
        assert_eq!(check.stat, Ability::Con);
        assert_eq!(check.skill, None);
    }

    #[test]
    fn test_outdoor_scene_does_not_raise_difficulty() {
        let check = pending(route("I jump the creek", &[EnvironmentTag::Outdoor]));
        assert_eq!(check.difficulty, 15);
    }

    // --- overrides ---

    #[test]
    fn test_explicit_stat_and_dc_override_derived_values() {
        let text = "I sneak past the guard";
        let context = GameContext::default();
        let classification = classify_intent(&ClassifierInput::new(text, &[], &context));
        let segments = annotate_segments(segment_message(text), None);
        let mut decision = IntentDecision::from_classification(&segments, &classification);
        decision.stat = Some(Ability::Wis);
        decision.dc = Some(22);
        decision.skill = Some("sleight of hand".to_owned());

        let check = pending(build_check(
            &decision,
            &CheckContext {
                actor: "player",
                text,
                classification: &classification,
                environment: &[],
            },
            Uuid::nil(),
            &fixed_clock(),
        ));

        assert_eq!(check.stat, Ability::Wis);
        assert_eq!(check.difficulty, 22);
        assert_eq!(check.skill.as_deref(), Some("sleight of hand"));
    }

    #[test]
    fn test_difficulty_ladder_tops_out() {
        assert_eq!(Difficulty::Medium.step_up().dc(), 20);
        assert_eq!(Difficulty::NearlyImpossible.step_up(), Difficulty::NearlyImpossible);
    }
}
