//! The fixed catalog of canonical statuses.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::effect::{DurationKind, Modifier, ModifierEffect, StatusDuration, StatusKind};

/// Every status a character can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusId {
    Poisoned,
    Blinded,
    Charmed,
    Frightened,
    Paralyzed,
    Restrained,
    Stunned,
    Unconscious,
    Invisible,
    Inspired,
    Blessed,
    Cursed,
    Bleeding,
    Madness,
    Fear,
    Corruption,
    Exhaustion,
}

impl StatusId {
    /// The whole catalog, in display order.
    pub const ALL: [Self; 17] = [
        Self::Poisoned,
        Self::Blinded,
        Self::Charmed,
        Self::Frightened,
        Self::Paralyzed,
        Self::Restrained,
        Self::Stunned,
        Self::Unconscious,
        Self::Invisible,
        Self::Inspired,
        Self::Blessed,
        Self::Cursed,
        Self::Bleeding,
        Self::Madness,
        Self::Fear,
        Self::Corruption,
        Self::Exhaustion,
    ];

    /// The wire id.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poisoned => "poisoned",
            Self::Blinded => "blinded",
            Self::Charmed => "charmed",
            Self::Frightened => "frightened",
            Self::Paralyzed => "paralyzed",
            Self::Restrained => "restrained",
            Self::Stunned => "stunned",
            Self::Unconscious => "unconscious",
            Self::Invisible => "invisible",
            Self::Inspired => "inspired",
            Self::Blessed => "blessed",
            Self::Cursed => "cursed",
            Self::Bleeding => "bleeding",
            Self::Madness => "madness",
            Self::Fear => "fear",
            Self::Corruption => "corruption",
            Self::Exhaustion => "exhaustion",
        }
    }

    /// Resolves a proposed id or a common alias ("poison", "exhausted",
    /// "knocked out", ...). Case, surrounding space, and `-`/space versus
    /// `_` are ignored.
    #[must_use]
    pub fn from_alias(raw: &str) -> Option<Self> {
        let key = normalize_key(raw);
        if let Some(id) = Self::ALL.iter().copied().find(|id| id.as_str() == key) {
            return Some(id);
        }
        let id = match key.as_str() {
            "poison" | "envenomed" => Self::Poisoned,
            "blind" | "blindness" => Self::Blinded,
            "charm" | "enthralled" => Self::Charmed,
            "frighten" | "scared" | "terrified" => Self::Frightened,
            "paralysis" | "paralysed" | "paralyze" => Self::Paralyzed,
            "restrain" | "grappled" | "bound" | "entangled" => Self::Restrained,
            "stun" | "dazed" => Self::Stunned,
            "knocked_out" | "unconsciousness" | "ko" => Self::Unconscious,
            "invisibility" | "unseen" => Self::Invisible,
            "inspiration" | "inspire" => Self::Inspired,
            "bless" | "blessing" => Self::Blessed,
            "curse" | "hexed" => Self::Cursed,
            "bleed" | "wounded" => Self::Bleeding,
            "insanity" | "insane" | "mad" => Self::Madness,
            "afraid" | "dread" => Self::Fear,
            "corrupted" | "taint" | "tainted" => Self::Corruption,
            "exhausted" | "fatigue" | "fatigued" => Self::Exhaustion,
            _ => return None,
        };
        Some(id)
    }

    /// Valid severity values, for statuses that carry one.
    #[must_use]
    pub fn severity_range(self) -> Option<RangeInclusive<u8>> {
        match self {
            Self::Exhaustion => Some(1..=6),
            Self::Corruption => Some(1..=3),
            _ => None,
        }
    }
}

impl fmt::Display for StatusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
        .collect()
}

/// The mechanics a canonical status always carries, whatever the proposal
/// said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalStatus {
    pub name: String,
    pub kind: StatusKind,
    pub mechanics: String,
    pub modifiers: Vec<Modifier>,
    pub restrictions: Vec<String>,
    pub narration_cues: Vec<String>,
    pub default_duration: StatusDuration,
    pub default_cure: String,
}

/// Looks up the canonical definition. `severity` must already be within
/// `severity_range` for exhaustion and corruption; other ids ignore it.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn canonical(id: StatusId, severity: Option<u8>) -> CanonicalStatus {
    use ModifierEffect as E;
    use StatusKind as K;

    let m = Modifier::new;
    let rounds = |n| StatusDuration {
        kind: DurationKind::Rounds,
        value: Some(n),
    };
    let until_cured = StatusDuration {
        kind: DurationKind::UntilCured,
        value: None,
    };
    let until_rest = StatusDuration {
        kind: DurationKind::UntilLongRest,
        value: None,
    };

    let (kind, mechanics, modifiers, restrictions, cues, duration, cure): (
        StatusKind,
        &str,
        Vec<Modifier>,
        Vec<&str>,
        Vec<&str>,
        StatusDuration,
        &str,
    ) = match id {
        StatusId::Poisoned => (
            K::Condition,
            "Disadvantage on attack rolls and ability checks.",
            vec![
                m("attack_rolls", E::Disadvantage),
                m("ability_checks", E::Disadvantage),
            ],
            vec![],
            vec!["nausea", "sweating", "greenish pallor"],
            StatusDuration {
                kind: DurationKind::Hours,
                value: Some(1),
            },
            "antitoxin, lesser restoration, or a successful CON save at the end of each hour",
        ),
        StatusId::Blinded => (
            K::Condition,
            "Automatically fails checks that require sight; attack rolls have disadvantage and attacks against have advantage.",
            vec![
                m("sight_checks", E::AutoFail),
                m("attack_rolls", E::Disadvantage),
                m("attacks_against", E::Advantage),
            ],
            vec!["cannot see"],
            vec!["groping", "unfocused eyes"],
            rounds(10),
            "lesser restoration or the source ending",
        ),
        StatusId::Charmed => (
            K::Condition,
            "Cannot attack the charmer; the charmer has advantage on social checks against the character.",
            vec![m("charmer_social_checks", E::Advantage)],
            vec!["cannot attack or target the charmer with harmful effects"],
            vec!["dreamy smile", "eager agreement"],
            StatusDuration {
                kind: DurationKind::Hours,
                value: Some(1),
            },
            "damage from the charmer or its allies, or a successful WIS save",
        ),
        StatusId::Frightened => (
            K::Condition,
            "Disadvantage on ability checks and attack rolls while the source is in sight.",
            vec![
                m("ability_checks", E::Disadvantage),
                m("attack_rolls", E::Disadvantage),
            ],
            vec!["cannot willingly move closer to the source"],
            vec!["trembling", "backing away"],
            rounds(10),
            "a successful WIS save at the end of each turn",
        ),
        StatusId::Paralyzed => (
            K::Condition,
            "Incapacitated; automatically fails STR and DEX saving throws; attacks against have advantage and hits within 5 feet are critical.",
            vec![
                m("saving_throws:STR", E::AutoFail),
                m("saving_throws:DEX", E::AutoFail),
                m("attacks_against", E::Advantage),
                m("speed", E::Zero),
            ],
            vec!["cannot move", "cannot speak", "cannot take actions"],
            vec!["rigid limbs", "frozen stare"],
            rounds(10),
            "a successful CON save at the end of each turn",
        ),
        StatusId::Restrained => (
            K::Condition,
            "Speed 0; attack rolls and DEX saving throws have disadvantage; attacks against have advantage.",
            vec![
                m("speed", E::Zero),
                m("attack_rolls", E::Disadvantage),
                m("saving_throws:DEX", E::Disadvantage),
                m("attacks_against", E::Advantage),
            ],
            vec!["cannot move"],
            vec!["straining against bonds"],
            until_cured,
            "escape with a STR (athletics) or DEX (acrobatics) check",
        ),
        StatusId::Stunned => (
            K::Condition,
            "Incapacitated; automatically fails STR and DEX saving throws; attacks against have advantage.",
            vec![
                m("saving_throws:STR", E::AutoFail),
                m("saving_throws:DEX", E::AutoFail),
                m("attacks_against", E::Advantage),
            ],
            vec!["cannot take actions or reactions", "can speak only falteringly"],
            vec!["reeling", "glassy eyes"],
            rounds(1),
            "ends at the end of the next turn",
        ),
        StatusId::Unconscious => (
            K::Condition,
            "Incapacitated and prone; automatically fails STR and DEX saving throws; hits within 5 feet are critical.",
            vec![
                m("saving_throws:STR", E::AutoFail),
                m("saving_throws:DEX", E::AutoFail),
                m("attacks_against", E::Advantage),
                m("speed", E::Zero),
            ],
            vec!["cannot move", "cannot speak", "unaware of surroundings"],
            vec!["limp", "shallow breathing"],
            until_cured,
            "regaining hit points or being shaken awake",
        ),
        StatusId::Invisible => (
            K::Buff,
            "Attack rolls have advantage; attacks against have disadvantage.",
            vec![
                m("attack_rolls", E::Advantage),
                m("attacks_against", E::Disadvantage),
            ],
            vec![],
            vec!["faint shimmer", "footsteps from nowhere"],
            StatusDuration {
                kind: DurationKind::Hours,
                value: Some(1),
            },
            "attacking or casting a spell ends it",
        ),
        StatusId::Inspired => (
            K::Buff,
            "Add 1d6 to one ability check, attack roll or saving throw.",
            vec![m("one_roll", E::Die("1d6".to_owned()))],
            vec!["consumed on use"],
            vec!["renewed resolve", "steady hands"],
            StatusDuration {
                kind: DurationKind::Minutes,
                value: Some(10),
            },
            "spent when used",
        ),
        StatusId::Blessed => (
            K::Buff,
            "Add 1d4 to attack rolls and saving throws.",
            vec![
                m("attack_rolls", E::Die("1d4".to_owned())),
                m("saving_throws", E::Die("1d4".to_owned())),
            ],
            vec![],
            vec!["warm glow", "quiet confidence"],
            StatusDuration {
                kind: DurationKind::Minutes,
                value: Some(1),
            },
            "ends when the blessing lapses",
        ),
        StatusId::Cursed => (
            K::Debuff,
            "Disadvantage on saving throws against the curse's source; -1 to attack rolls.",
            vec![
                m("saving_throws", E::Disadvantage),
                m("attack_rolls", E::Flat(-1)),
            ],
            vec![],
            vec!["creeping misfortune", "cold prickle"],
            until_cured,
            "remove curse or a greater restoration",
        ),
        StatusId::Bleeding => (
            K::Debuff,
            "Takes 1d4 damage at the start of each turn.",
            vec![m("hp_per_round", E::Die("-1d4".to_owned()))],
            vec![],
            vec!["blood-soaked clothing", "pale face"],
            rounds(3),
            "a DC 10 WIS (medicine) check, any magical healing, or a bandage",
        ),
        StatusId::Madness => (
            K::Debuff,
            "Disadvantage on WIS and INT checks and saving throws.",
            vec![
                m("ability_checks:WIS", E::Disadvantage),
                m("ability_checks:INT", E::Disadvantage),
                m("saving_throws:WIS", E::Disadvantage),
                m("saving_throws:INT", E::Disadvantage),
            ],
            vec!["may act erratically"],
            vec!["muttering", "darting eyes"],
            StatusDuration {
                kind: DurationKind::Hours,
                value: Some(1),
            },
            "calm emotions, lesser restoration, or a long rest",
        ),
        StatusId::Fear => (
            K::Debuff,
            "Disadvantage on WIS saving throws; speed halved when moving toward the source.",
            vec![
                m("saving_throws:WIS", E::Disadvantage),
                m("speed_toward_source", E::Halved),
            ],
            vec![],
            vec!["racing heart", "cold sweat"],
            rounds(5),
            "a successful WIS save or leaving the source's presence",
        ),
        StatusId::Corruption => {
            let tier = severity.unwrap_or(1);
            let mut modifiers = vec![m("saving_throws:WIS", E::Disadvantage)];
            let mut restrictions = vec![];
            if tier >= 2 {
                modifiers.push(m("hp_max", E::Flat(-5)));
            }
            if tier >= 3 {
                modifiers.push(m("healing_received", E::Halved));
                restrictions.push("cannot benefit from divine magic");
            }
            return CanonicalStatus {
                name: format!("Corruption (tier {tier})"),
                kind: K::Debuff,
                mechanics: corruption_mechanics(tier),
                modifiers,
                restrictions: restrictions.into_iter().map(str::to_owned).collect(),
                narration_cues: vec!["blackened veins".to_owned(), "whispers at the edge of hearing".to_owned()],
                default_duration: until_cured,
                default_cure: "greater restoration or a cleansing ritual".to_owned(),
            };
        }
        StatusId::Exhaustion => {
            let level = severity.unwrap_or(1);
            let mut modifiers = vec![m("ability_checks", E::Disadvantage)];
            let mut restrictions = vec![];
            if level >= 2 {
                modifiers.push(m("speed", E::Halved));
            }
            if level >= 3 {
                modifiers.push(m("attack_rolls", E::Disadvantage));
                modifiers.push(m("saving_throws", E::Disadvantage));
            }
            if level >= 4 {
                modifiers.push(m("hp_max", E::Halved));
            }
            if level >= 5 {
                modifiers.push(m("speed", E::Zero));
            }
            if level >= 6 {
                restrictions.push("dies");
            }
            return CanonicalStatus {
                name: format!("Exhaustion (level {level})"),
                kind: K::Condition,
                mechanics: exhaustion_mechanics(level),
                modifiers,
                restrictions: restrictions.into_iter().map(str::to_owned).collect(),
                narration_cues: vec!["heavy eyelids".to_owned(), "stumbling steps".to_owned()],
                default_duration: until_rest,
                default_cure: "a long rest removes one level".to_owned(),
            };
        }
    };

    CanonicalStatus {
        name: title_case(id.as_str()),
        kind,
        mechanics: mechanics.to_owned(),
        modifiers,
        restrictions: restrictions.into_iter().map(str::to_owned).collect(),
        narration_cues: cues.into_iter().map(str::to_owned).collect(),
        default_duration: duration,
        default_cure: cure.to_owned(),
    }
}

fn exhaustion_mechanics(level: u8) -> String {
    let effects = [
        "disadvantage on ability checks",
        "speed halved",
        "disadvantage on attack rolls and saving throws",
        "hit point maximum halved",
        "speed reduced to 0",
        "death",
    ];
    let active: Vec<&str> = effects.iter().take(usize::from(level)).copied().collect();
    let mut text = active.join("; ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    format!("{text}.")
}

fn corruption_mechanics(tier: u8) -> String {
    match tier {
        1 => "Disadvantage on WIS saving throws.".to_owned(),
        2 => "Disadvantage on WIS saving throws; hit point maximum reduced by 5.".to_owned(),
        _ => "Disadvantage on WIS saving throws; hit point maximum reduced by 5; healing received is halved.".to_owned(),
    }
}

fn title_case(id: &str) -> String {
    let mut chars = id.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_seventeen_entries() {
        assert_eq!(StatusId::ALL.len(), 17);
    }

    #[test]
    fn test_canonical_ids_resolve_to_themselves() {
        for id in StatusId::ALL {
            assert_eq!(StatusId::from_alias(id.as_str()), Some(id));
        }
    }

    #[test]
    fn test_aliases_resolve() {
        assert_eq!(StatusId::from_alias(" Poison "), Some(StatusId::Poisoned));
        assert_eq!(StatusId::from_alias("EXHAUSTED"), Some(StatusId::Exhaustion));
        assert_eq!(StatusId::from_alias("knocked-out"), Some(StatusId::Unconscious));
        assert_eq!(StatusId::from_alias("tavern_regular"), None);
    }

    #[test]
    fn test_only_exhaustion_and_corruption_have_severity() {
        assert_eq!(StatusId::Exhaustion.severity_range(), Some(1..=6));
        assert_eq!(StatusId::Corruption.severity_range(), Some(1..=3));
        assert_eq!(StatusId::Poisoned.severity_range(), None);
    }

    #[test]
    fn test_exhaustion_level_is_reflected_in_name_and_modifiers() {
        let level_three = canonical(StatusId::Exhaustion, Some(3));
        assert_eq!(level_three.name, "Exhaustion (level 3)");
        assert!(level_three.mechanics.starts_with("Disadvantage on ability checks; speed halved"));
        assert!(
            level_three
                .modifiers
                .iter()
                .any(|m| m.applies_to == "attack_rolls")
        );
        assert!(level_three.restrictions.is_empty());
        assert_eq!(canonical(StatusId::Exhaustion, Some(6)).restrictions, vec!["dies"]);
    }

    #[test]
    fn test_corruption_tier_is_reflected_in_name() {
        assert_eq!(canonical(StatusId::Corruption, Some(2)).name, "Corruption (tier 2)");
    }

    #[test]
    fn test_plain_status_name_is_title_case() {
        let poisoned = canonical(StatusId::Poisoned, None);
        assert_eq!(poisoned.name, "Poisoned");
        assert_eq!(poisoned.kind, StatusKind::Condition);
    }
}
