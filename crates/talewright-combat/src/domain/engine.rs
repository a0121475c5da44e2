//! The combat engine.
//!
//! A full `resolve_action` cycle is: player acts, end check, every living
//! enemy attacks the player in roster order, round advances, statuses tick
//! down, end check. All mutation happens on a copy of the stored state.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use talewright_core::clock::Clock;
use talewright_core::error::DomainError;
use talewright_core::rng::DeterministicRng;
use talewright_intent::domain::classifier::ActionKind;
use talewright_rules::domain::check::ARMOR_CLASS;
use talewright_rules::domain::dice::{DiceFormula, RollResult};
use uuid::Uuid;

use super::events::CombatEvent;
use super::state::{
    CombatEntity, CombatPhase, CombatResult, CombatState, CombatStatus, DEFENDING, EntityKind,
    PlayerSnapshot,
};

/// Player weapon damage.
pub const PLAYER_DAMAGE: DiceFormula = DiceFormula {
    dice_count: 1,
    die_size: 8,
    modifier: 2,
};

/// Enemy weapon damage.
pub const ENEMY_DAMAGE: DiceFormula = DiceFormula {
    dice_count: 1,
    die_size: 6,
    modifier: 1,
};

/// What the player does this turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatIntent {
    pub action: ActionKind,
    /// Entity id or name; attacks fall back to the first living enemy.
    pub target: Option<String>,
    /// The player's own words.
    pub description: String,
}

/// Builds a new battle. The initiative order is the player followed by the
/// enemies in the order given.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the roster has no enemies, the
/// player is not a player entity, an enemy is not an enemy entity, or entity
/// ids are blank or repeated.
pub fn start_battle(
    id: Uuid,
    campaign_id: Uuid,
    mut player: CombatEntity,
    enemies: Vec<CombatEntity>,
    clock: &dyn Clock,
) -> Result<(CombatState, Vec<CombatEvent>), DomainError> {
    if player.kind != EntityKind::Player {
        return Err(DomainError::Validation(format!(
            "entity {} is not a player",
            player.id
        )));
    }
    if enemies.is_empty() {
        return Err(DomainError::Validation(
            "a battle needs at least one enemy".to_owned(),
        ));
    }
    if let Some(enemy) = enemies.iter().find(|e| e.kind != EntityKind::Enemy) {
        return Err(DomainError::Validation(format!(
            "entity {} is not an enemy",
            enemy.id
        )));
    }

    player.clamp();
    let mut entities = Vec::with_capacity(enemies.len() + 1);
    entities.push(player);
    for mut enemy in enemies {
        enemy.clamp();
        entities.push(enemy);
    }

    let mut ids = HashSet::new();
    for entity in &entities {
        if entity.id.trim().is_empty() {
            return Err(DomainError::Validation("entity id must not be empty".to_owned()));
        }
        if !ids.insert(entity.id.as_str()) {
            return Err(DomainError::Validation(format!(
                "duplicate entity id {}",
                entity.id
            )));
        }
    }

    let initiative_order = entities.iter().map(|e| e.id.clone()).collect();
    let first = turn_start(&entities[0], 1);
    let mut state = CombatState {
        id,
        campaign_id,
        phase: CombatPhase::PlayerTurn,
        round: 1,
        turn_index: 0,
        initiative_order,
        entities,
        log: VecDeque::new(),
        result: None,
        started_at: clock.now(),
    };
    state.record(first.clone());
    Ok((state, vec![first]))
}

/// Resolves one player action and the enemy turn that follows it.
///
/// Returns the updated state and the events produced; `state` itself is
/// never modified.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the battle has ended, has no player,
/// or an attack has no living enemy to target.
pub fn resolve_action(
    state: &CombatState,
    intent: &CombatIntent,
    snapshot: Option<&PlayerSnapshot>,
    roll_override: Option<RollResult>,
    rng: &mut dyn DeterministicRng,
) -> Result<(CombatState, Vec<CombatEvent>), DomainError> {
    if state.is_over() {
        return Err(DomainError::Validation("battle has already ended".to_owned()));
    }

    let mut next = state.clone();
    let player = next
        .player_index()
        .ok_or_else(|| DomainError::Validation("battle has no player".to_owned()))?;
    if let Some(snapshot) = snapshot {
        apply_snapshot(&mut next.entities[player], snapshot);
    }

    let mut events = Vec::new();
    next.phase = CombatPhase::Resolving;
    next.turn_index = turn_index_of(&next, player);
    events.push(turn_start(&next.entities[player], next.round));

    let actor = next.entities[player].id.clone();
    let target_name = intent.target.clone();
    match intent.action {
        ActionKind::Attack => {
            let target = resolve_target(&next, intent.target.as_deref()).ok_or_else(|| {
                DomainError::Validation("no living enemy to attack".to_owned())
            })?;
            events.extend(resolve_attack(&mut next, player, target, roll_override, rng));
        }
        ActionKind::Defend => {
            let entity = &mut next.entities[player];
            if !entity.has_status(DEFENDING) {
                entity.statuses.push(CombatStatus {
                    id: DEFENDING.to_owned(),
                    duration: 1,
                });
                events.push(CombatEvent::StatusApplied {
                    target: actor.clone(),
                    status: DEFENDING.to_owned(),
                    duration: 1,
                });
            }
        }
        ActionKind::Move => events.push(CombatEvent::Move {
            actor,
            target: target_name,
            description: intent.description.clone(),
        }),
        ActionKind::Item => events.push(CombatEvent::ItemUsed {
            actor,
            target: target_name,
            description: intent.description.clone(),
        }),
        ActionKind::Spell => events.push(CombatEvent::SpellCast {
            actor,
            target: target_name,
            description: intent.description.clone(),
        }),
        _ => events.push(CombatEvent::AttemptAction {
            actor,
            description: intent.description.clone(),
        }),
    }

    if let Some(ended) = check_combat_end(&mut next) {
        events.push(ended);
    } else {
        next.phase = CombatPhase::EnemyTurn;
        let enemies: Vec<usize> = next
            .initiative_order
            .iter()
            .filter_map(|id| next.entities.iter().position(|e| &e.id == id))
            .filter(|&i| next.entities[i].kind == EntityKind::Enemy)
            .collect();
        for enemy in enemies {
            if !next.entities[player].is_alive() {
                break;
            }
            if !next.entities[enemy].is_alive() {
                continue;
            }
            next.turn_index = turn_index_of(&next, enemy);
            events.push(turn_start(&next.entities[enemy], next.round));
            events.extend(resolve_attack(&mut next, enemy, player, None, rng));
        }

        next.phase = CombatPhase::PlayerTurn;
        next.turn_index = turn_index_of(&next, player);
        next.round += 1;
        events.extend(decay_statuses(&mut next));
        if let Some(ended) = check_combat_end(&mut next) {
            events.push(ended);
        }
    }

    for event in &events {
        next.record(event.clone());
    }
    Ok((next, events))
}

/// Resolves one attack. A natural 20 always hits and doubles damage, a
/// natural 1 always misses, otherwise the total must reach `ARMOR_CLASS`.
/// Damage to a defending player is halved, minimum 1.
pub fn resolve_attack(
    state: &mut CombatState,
    attacker: usize,
    target: usize,
    roll_override: Option<RollResult>,
    rng: &mut dyn DeterministicRng,
) -> Vec<CombatEvent> {
    let roll = roll_override.unwrap_or_else(|| RollResult::roll(rng, 0));
    let critical = roll.is_natural_twenty();
    let fumble = roll.is_natural_one();
    let hit = critical || (!fumble && roll.total >= i32::from(ARMOR_CLASS));

    let attacker_entity = &state.entities[attacker];
    let mut events = vec![CombatEvent::AttackResolved {
        attacker: attacker_entity.id.clone(),
        target: state.entities[target].id.clone(),
        d20: roll.d20,
        bonus: roll.bonus,
        total: roll.total,
        armor_class: ARMOR_CLASS,
        hit,
        critical,
        fumble,
    }];
    if !hit {
        return events;
    }

    let formula = match attacker_entity.kind {
        EntityKind::Player => PLAYER_DAMAGE,
        EntityKind::Enemy => ENEMY_DAMAGE,
    };
    let mut amount = formula.roll(rng).total.max(0);
    if critical {
        amount *= 2;
    }

    let victim = &mut state.entities[target];
    if victim.kind == EntityKind::Player && victim.has_status(DEFENDING) {
        amount = (amount / 2).max(1);
    }
    let was_alive = victim.is_alive();
    victim.set_hp(victim.hp - amount);
    events.push(CombatEvent::DamageApplied {
        target: victim.id.clone(),
        amount,
        hp: victim.hp,
        hp_max: victim.hp_max,
    });
    if victim.kind == EntityKind::Enemy && was_alive && !victim.is_alive() {
        events.push(CombatEvent::EnemyDefeated {
            target: victim.id.clone(),
        });
    }
    events
}

/// Ends the battle if the player is down (defeat) or no enemy stands
/// (victory). Returns the `COMBAT_ENDED` event when it does.
pub fn check_combat_end(state: &mut CombatState) -> Option<CombatEvent> {
    if state.is_over() {
        return None;
    }
    let result = if state.player().is_none_or(|p| p.hp <= 0) {
        CombatResult::Defeat
    } else if state.living_enemies().next().is_none() {
        CombatResult::Victory
    } else {
        return None;
    };

    state.phase = CombatPhase::Ended;
    state.result = Some(result);
    Some(CombatEvent::CombatEnded {
        result,
        round: state.round,
    })
}

/// Decrements every status by one round and removes the expired ones.
pub fn decay_statuses(state: &mut CombatState) -> Vec<CombatEvent> {
    let mut events = Vec::new();
    for entity in &mut state.entities {
        for status in &mut entity.statuses {
            status.duration -= 1;
        }
        let target = entity.id.clone();
        entity.statuses.retain(|status| {
            let keep = status.duration > 0;
            if !keep {
                events.push(CombatEvent::StatusRemoved {
                    target: target.clone(),
                    status: status.id.clone(),
                });
            }
            keep
        });
    }
    events
}

/// Finds the attack target: a living enemy by id, then by name, then the
/// first living enemy in initiative order.
#[must_use]
pub fn resolve_target(state: &CombatState, requested: Option<&str>) -> Option<usize> {
    let living = |e: &CombatEntity| e.kind == EntityKind::Enemy && e.is_alive();
    if let Some(requested) = requested.map(str::trim).filter(|r| !r.is_empty()) {
        let by_id = state
            .entities
            .iter()
            .position(|e| living(e) && e.id == requested);
        let by_name = || {
            state
                .entities
                .iter()
                .position(|e| living(e) && e.name.eq_ignore_ascii_case(requested))
        };
        if let Some(index) = by_id.or_else(by_name) {
            return Some(index);
        }
    }
    state
        .initiative_order
        .iter()
        .filter_map(|id| state.entities.iter().position(|e| &e.id == id))
        .find(|&i| living(&state.entities[i]))
}

fn apply_snapshot(player: &mut CombatEntity, snapshot: &PlayerSnapshot) {
    if let Some(hp_max) = snapshot.hp_max {
        player.hp_max = hp_max.max(0);
    }
    if let Some(mp_max) = snapshot.mp_max {
        player.mp_max = Some(mp_max.max(0));
    }
    if let Some(hp) = snapshot.hp {
        player.hp = hp;
    }
    if let Some(mp) = snapshot.mp {
        player.mp = Some(mp);
    }
    player.clamp();
}

fn turn_index_of(state: &CombatState, entity: usize) -> usize {
    let id = &state.entities[entity].id;
    state
        .initiative_order
        .iter()
        .position(|i| i == id)
        .unwrap_or_default()
}

fn turn_start(entity: &CombatEntity, round: u32) -> CombatEvent {
    CombatEvent::TurnStart {
        actor: entity.id.clone(),
        round,
    }
}
