//! Command handlers for the Combat context.
//!
//! Each handler loads the campaign's battle, runs the engine on a copy and
//! saves the copy only when the engine succeeds.

use std::sync::Mutex;

use serde::Serialize;
use talewright_core::clock::Clock;
use talewright_core::command::Command;
use talewright_core::error::DomainError;
use talewright_core::event::DomainEvent;
use talewright_core::repository::StateRepository;
use talewright_core::rng::DeterministicRng;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::commands::{ResolveAction, StartBattle};
use crate::domain::engine::{resolve_action, start_battle};
use crate::domain::events::CombatEvent;
use crate::domain::state::CombatState;

/// A battle after a command, with the events the command produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleUpdate {
    pub state: CombatState,
    pub events: Vec<CombatEvent>,
}

/// Handles the `StartBattle` command. A finished battle for the campaign is
/// replaced.
///
/// # Errors
///
/// Returns `DomainError::Validation` if a battle is still running or the
/// roster is invalid, or `DomainError::Infrastructure` if persistence fails.
#[instrument(skip_all, fields(
    command = command.command_type(),
    campaign_id = %command.campaign_id(),
    enemies = command.enemies.len()
))]
pub async fn handle_start_battle(
    command: &StartBattle,
    clock: &dyn Clock,
    repo: &dyn StateRepository<CombatState>,
) -> Result<BattleUpdate, DomainError> {
    if let Some(existing) = repo.load(command.campaign_id).await? {
        if !existing.is_over() {
            return Err(DomainError::Validation(format!(
                "a battle is already in progress for campaign {}",
                command.campaign_id
            )));
        }
    }

    let (state, events) = start_battle(
        Uuid::new_v4(),
        command.campaign_id,
        command.player.clone(),
        command.enemies.clone(),
        clock,
    )?;
    repo.save(command.campaign_id, state.clone()).await?;

    info!(battle_id = %state.id, "battle started");
    log_events(&events);
    Ok(BattleUpdate { state, events })
}

/// Handles the `ResolveAction` command.
///
/// The RNG `Mutex` is locked only around the synchronous engine call.
///
/// # Errors
///
/// Returns `DomainError::BattleNotFound` if the campaign has no battle,
/// `DomainError::Validation` if the engine rejects the action, or
/// `DomainError::Infrastructure` if persistence fails.
#[instrument(skip_all, fields(
    command = command.command_type(),
    campaign_id = %command.campaign_id(),
    action = %command.intent.action
))]
pub async fn handle_resolve_action(
    command: &ResolveAction,
    rng: &Mutex<dyn DeterministicRng + Send>,
    repo: &dyn StateRepository<CombatState>,
) -> Result<BattleUpdate, DomainError> {
    let state = repo
        .load(command.campaign_id)
        .await?
        .ok_or(DomainError::BattleNotFound(command.campaign_id))?;

    let (next, events) = {
        let mut rng_guard = rng
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("RNG mutex poisoned: {e}")))?;
        resolve_action(
            &state,
            &command.intent,
            command.snapshot.as_ref(),
            command.roll_override,
            &mut *rng_guard,
        )?
    };

    repo.save(command.campaign_id, next.clone()).await?;
    info!(
        round = next.round,
        phase = ?next.phase,
        events = events.len(),
        "combat action resolved"
    );
    log_events(&events);
    Ok(BattleUpdate {
        state: next,
        events,
    })
}

fn log_events(events: &[CombatEvent]) {
    for event in events {
        debug!(event = event.event_type(), payload = %event.to_payload(), "combat event");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use talewright_core::error::DomainError;
    use talewright_intent::domain::classifier::ActionKind;
    use talewright_rules::domain::dice::RollResult;
    use talewright_test_support::{FailingRepository, RecordingRepository, SequenceRng, fixed_clock};
    use uuid::Uuid;

    use super::*;
    use crate::domain::engine::CombatIntent;
    use crate::domain::state::{CombatEntity, CombatPhase};

    fn start_command(campaign_id: Uuid) -> StartBattle {
        StartBattle {
            campaign_id,
            player: CombatEntity::player("hero", "Hero", 20),
            enemies: vec![CombatEntity::enemy("goblin", "Goblin", 10)],
        }
    }

    fn attack(campaign_id: Uuid, d20: u32) -> ResolveAction {
        ResolveAction {
            campaign_id,
            intent: CombatIntent {
                action: ActionKind::Attack,
                target: None,
                description: "I attack the goblin".to_owned(),
            },
            snapshot: None,
            roll_override: Some(RollResult::manual(d20, 0).unwrap()),
        }
    }

    // --- handle_start_battle ---

    #[tokio::test]
    async fn test_start_battle_persists_state() {
        let campaign_id = Uuid::new_v4();
        let repo = RecordingRepository::new();

        let update = handle_start_battle(&start_command(campaign_id), &fixed_clock(), &repo)
            .await
            .unwrap();

        assert_eq!(update.state.campaign_id, campaign_id);
        assert_eq!(update.state.started_at, fixed_clock().0);
        assert_eq!(repo.current(campaign_id), Some(update.state));
    }

    #[tokio::test]
    async fn test_start_battle_rejects_second_running_battle() {
        let campaign_id = Uuid::new_v4();
        let repo = RecordingRepository::new();
        handle_start_battle(&start_command(campaign_id), &fixed_clock(), &repo)
            .await
            .unwrap();

        let result = handle_start_battle(&start_command(campaign_id), &fixed_clock(), &repo).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_start_battle_replaces_finished_battle() {
        let campaign_id = Uuid::new_v4();
        let repo = RecordingRepository::new();
        let first = handle_start_battle(&start_command(campaign_id), &fixed_clock(), &repo)
            .await
            .unwrap();
        let mut ended = first.state.clone();
        ended.phase = CombatPhase::Ended;
        repo.save(campaign_id, ended).await.unwrap();

        let second = handle_start_battle(&start_command(campaign_id), &fixed_clock(), &repo)
            .await
            .unwrap();

        assert_ne!(second.state.id, first.state.id);
    }

    // --- handle_resolve_action ---

    #[tokio::test]
    async fn test_resolve_action_without_battle_is_battle_not_found() {
        let campaign_id = Uuid::new_v4();
        let repo = RecordingRepository::new();
        let rng = Mutex::new(SequenceRng::new(vec![]));

        let result = handle_resolve_action(&attack(campaign_id, 15), &rng, &repo).await;

        match result {
            Err(DomainError::BattleNotFound(id)) => assert_eq!(id, campaign_id),
            other => panic!("expected BattleNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_action_saves_updated_battle() {
        let campaign_id = Uuid::new_v4();
        let repo = RecordingRepository::new();
        handle_start_battle(&start_command(campaign_id), &fixed_clock(), &repo)
            .await
            .unwrap();
        // d8 shows 2 (4 damage); goblin fumbles.
        let rng = Mutex::new(SequenceRng::new(vec![2, 1]));

        let update = handle_resolve_action(&attack(campaign_id, 15), &rng, &repo)
            .await
            .unwrap();

        assert_eq!(update.state.entity("goblin").unwrap().hp, 6);
        assert_eq!(repo.current(campaign_id), Some(update.state));
    }

    #[tokio::test]
    async fn test_rejected_action_leaves_stored_battle_untouched() {
        let campaign_id = Uuid::new_v4();
        let repo = RecordingRepository::new();
        let started = handle_start_battle(&start_command(campaign_id), &fixed_clock(), &repo)
            .await
            .unwrap();
        let mut ended = started.state.clone();
        ended.phase = CombatPhase::Ended;
        repo.save(campaign_id, ended.clone()).await.unwrap();
        let rng = Mutex::new(SequenceRng::new(vec![]));

        let result = handle_resolve_action(&attack(campaign_id, 15), &rng, &repo).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(repo.current(campaign_id), Some(ended));
    }

    #[tokio::test]
    async fn test_resolve_action_surfaces_infrastructure_error() {
        let repo = FailingRepository::new();
        let rng = Mutex::new(SequenceRng::new(vec![]));
        let result = handle_resolve_action(&attack(Uuid::new_v4(), 15), &rng, &repo).await;
        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
