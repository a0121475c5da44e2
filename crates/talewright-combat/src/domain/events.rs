//! Domain events for the Combat context.

use serde::{Deserialize, Serialize};
use talewright_core::event::DomainEvent;

use super::state::CombatResult;

/// An append-only fact produced while resolving combat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombatEvent {
    /// An entity begins its turn.
    TurnStart { actor: String, round: u32 },
    /// An attack roll was compared against armor class.
    AttackResolved {
        attacker: String,
        target: String,
        d20: u32,
        bonus: i32,
        total: i32,
        armor_class: u8,
        hit: bool,
        critical: bool,
        fumble: bool,
    },
    /// Hit points were lost.
    DamageApplied {
        target: String,
        amount: i32,
        hp: i32,
        hp_max: i32,
    },
    /// An enemy dropped to 0 HP.
    EnemyDefeated { target: String },
    StatusApplied {
        target: String,
        status: String,
        duration: i32,
    },
    StatusRemoved { target: String, status: String },
    Move {
        actor: String,
        target: Option<String>,
        description: String,
    },
    ItemUsed {
        actor: String,
        target: Option<String>,
        description: String,
    },
    SpellCast {
        actor: String,
        target: Option<String>,
        description: String,
    },
    /// Free-form action with no mechanical resolution.
    AttemptAction { actor: String, description: String },
    CombatEnded { result: CombatResult, round: u32 },
}

impl DomainEvent for CombatEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::TurnStart { .. } => "combat.turn_start",
            Self::AttackResolved { .. } => "combat.attack_resolved",
            Self::DamageApplied { .. } => "combat.damage_applied",
            Self::EnemyDefeated { .. } => "combat.enemy_defeated",
            Self::StatusApplied { .. } => "combat.status_applied",
            Self::StatusRemoved { .. } => "combat.status_removed",
            Self::Move { .. } => "combat.move",
            Self::ItemUsed { .. } => "combat.item_used",
            Self::SpellCast { .. } => "combat.spell_cast",
            Self::AttemptAction { .. } => "combat.attempt_action",
            Self::CombatEnded { .. } => "combat.combat_ended",
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
