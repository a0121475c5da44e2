//! Battle state: the roster, turn structure and event log.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::CombatEvent;

/// Most events kept in `CombatState::log`.
pub const LOG_CAPACITY: usize = 20;

/// Status id added by the defend action.
pub const DEFENDING: &str = "defending";

/// Where the battle is in its round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatPhase {
    Starting,
    PlayerTurn,
    EnemyTurn,
    Resolving,
    Ended,
}

/// How a finished battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatResult {
    Victory,
    Defeat,
}

/// Which side an entity fights on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Player,
    Enemy,
}

/// A timed status on a combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStatus {
    pub id: String,
    /// Remaining rounds.
    pub duration: i32,
}

/// A combatant. `0 <= hp <= hp_max` holds after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatEntity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub name: String,
    pub hp: i32,
    pub hp_max: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mp_max: Option<i32>,
    #[serde(default)]
    pub statuses: Vec<CombatStatus>,
}

impl CombatEntity {
    /// A player at full health.
    #[must_use]
    pub fn player(id: impl Into<String>, name: impl Into<String>, hp_max: i32) -> Self {
        Self::new(id.into(), EntityKind::Player, name.into(), hp_max)
    }

    /// An enemy at full health.
    #[must_use]
    pub fn enemy(id: impl Into<String>, name: impl Into<String>, hp_max: i32) -> Self {
        Self::new(id.into(), EntityKind::Enemy, name.into(), hp_max)
    }

    fn new(id: String, kind: EntityKind, name: String, hp_max: i32) -> Self {
        let hp_max = hp_max.max(0);
        Self {
            id,
            kind,
            name,
            hp: hp_max,
            hp_max,
            mp: None,
            mp_max: None,
            statuses: Vec::new(),
        }
    }

    /// Returns `true` while the entity has hit points left.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Returns `true` if the entity carries status `id`.
    #[must_use]
    pub fn has_status(&self, id: &str) -> bool {
        self.statuses.iter().any(|s| s.id == id)
    }

    /// Sets hit points, clamped to `[0, hp_max]`.
    pub fn set_hp(&mut self, hp: i32) {
        self.hp = hp.clamp(0, self.hp_max.max(0));
    }

    /// Sets mana, clamped to `[0, mp_max]` when a maximum is known.
    pub fn set_mp(&mut self, mp: i32) {
        self.mp = Some(match self.mp_max {
            Some(max) => mp.clamp(0, max.max(0)),
            None => mp.max(0),
        });
    }

    /// Re-establishes the HP and MP bounds.
    pub fn clamp(&mut self) {
        self.hp_max = self.hp_max.max(0);
        self.set_hp(self.hp);
        if let Some(mp) = self.mp {
            self.set_mp(mp);
        }
    }
}

/// Player values reported by the client; applied before the action resolves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    #[serde(default)]
    pub hp: Option<i32>,
    #[serde(default)]
    pub hp_max: Option<i32>,
    #[serde(default)]
    pub mp: Option<i32>,
    #[serde(default)]
    pub mp_max: Option<i32>,
}

/// One battle for one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatState {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub phase: CombatPhase,
    pub round: u32,
    /// Index into `initiative_order` of the entity acting now.
    pub turn_index: usize,
    /// Entity ids in the order they act, player first.
    pub initiative_order: Vec<String>,
    pub entities: Vec<CombatEntity>,
    /// The most recent events, oldest first.
    pub log: VecDeque<CombatEvent>,
    pub result: Option<CombatResult>,
    pub started_at: DateTime<Utc>,
}

impl CombatState {
    /// Returns `true` once the battle has ended.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase == CombatPhase::Ended
    }

    /// The player entity.
    #[must_use]
    pub fn player(&self) -> Option<&CombatEntity> {
        self.entities.iter().find(|e| e.kind == EntityKind::Player)
    }

    pub(crate) fn player_index(&self) -> Option<usize> {
        self.entities.iter().position(|e| e.kind == EntityKind::Player)
    }

    /// Looks an entity up by id.
    #[must_use]
    pub fn entity(&self, id: &str) -> Option<&CombatEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Enemies that can still act.
    pub fn living_enemies(&self) -> impl Iterator<Item = &CombatEntity> {
        self.entities
            .iter()
            .filter(|e| e.kind == EntityKind::Enemy && e.is_alive())
    }

    /// Appends to the log, dropping the oldest entries beyond capacity.
    pub fn record(&mut self, event: CombatEvent) {
        self.log.push_back(event);
        while self.log.len() > LOG_CAPACITY {
            self.log.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_hp_clamps_to_bounds() {
        let mut goblin = CombatEntity::enemy("goblin", "Goblin", 7);
        goblin.set_hp(-4);
        assert_eq!(goblin.hp, 0);
        goblin.set_hp(99);
        assert_eq!(goblin.hp, 7);
    }

    #[test]
    fn test_set_mp_clamps_when_max_known() {
        let mut hero = CombatEntity::player("hero", "Hero", 20);
        hero.set_mp(5);
        assert_eq!(hero.mp, Some(5));
        hero.mp_max = Some(3);
        hero.set_mp(5);
        assert_eq!(hero.mp, Some(3));
    }

    #[test]
    fn test_clamp_repairs_out_of_range_hp() {
        let mut hero = CombatEntity::player("hero", "Hero", 20);
        hero.hp = 35;
        hero.clamp();
        assert_eq!(hero.hp, 20);
    }

    #[test]
    fn test_entity_serializes_with_type_and_snake_case_max() {
        let json = serde_json::to_value(CombatEntity::enemy("orc", "Orc", 10)).unwrap();
        assert_eq!(json["type"], "enemy");
        assert_eq!(json["hp_max"], 10);
        assert!(json.get("mp").is_none());
    }
}
