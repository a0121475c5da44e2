//! Command handlers for the Rules & Resolution context.
//!
//! These orchestrate the pending-check state machine: load the campaign's
//! pending check, apply the command, persist the result.

use serde::Serialize;
use talewright_core::clock::Clock;
use talewright_core::command::Command;
use talewright_core::error::DomainError;
use talewright_core::repository::StateRepository;
use talewright_intent::domain::last_action::LastResolvedAction;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::check::{CheckType, PendingCheck};
use crate::domain::commands::{OpenCheck, ResolveRoll};
use crate::domain::dice::RollResult;
use crate::domain::outcome::{CheckOutcome, determine_outcome};

/// What happens after a check resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Continuation {
    /// Narrate the outcome.
    Narrate,
    /// Feed the roll to the combat engine.
    Combat,
}

/// A pending check answered by a roll.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCheck {
    pub check: PendingCheck,
    pub roll: RollResult,
    pub outcome: CheckOutcome,
    pub continuation: Continuation,
}

/// Result of `handle_resolve_roll`.
#[derive(Debug, Clone, PartialEq)]
pub enum RollResolution {
    /// No matching pending check; nothing changed.
    Ignored,
    /// The check was consumed.
    Resolved(Box<ResolvedCheck>),
}

/// Handles the `OpenCheck` command: stores the check as the campaign's only
/// pending check. An outstanding check is superseded.
///
/// # Errors
///
/// Returns `DomainError` if loading or saving fails.
#[instrument(skip_all, fields(
    command = command.command_type(),
    campaign_id = %command.campaign_id(),
    check_id = %command.check.id
))]
pub async fn handle_open_check(
    command: &OpenCheck,
    repo: &dyn StateRepository<PendingCheck>,
) -> Result<PendingCheck, DomainError> {
    if let Some(previous) = repo.load(command.campaign_id).await? {
        warn!(
            superseded_check_id = %previous.id,
            "new check supersedes an outstanding pending check"
        );
    }

    repo.save(command.campaign_id, command.check.clone()).await?;
    info!(
        check_type = ?command.check.check_type,
        stat = %command.check.stat,
        difficulty = command.check.difficulty,
        "pending check opened"
    );
    Ok(command.check.clone())
}

/// Handles the `ResolveRoll` command: consumes the pending check, computes
/// the outcome and records the campaign's last resolved action.
///
/// A roll with no open check, or for a different check id, is ignored.
/// Callers that must do more work before the check is consumed use
/// `find_answered_check` and `commit_roll` instead.
///
/// # Errors
///
/// Returns `DomainError` if loading, saving or deleting fails.
#[instrument(skip_all, fields(
    command = command.command_type(),
    campaign_id = %command.campaign_id(),
    check_id = %command.pending_check_id
))]
pub async fn handle_resolve_roll(
    command: &ResolveRoll,
    clock: &dyn Clock,
    pending_repo: &dyn StateRepository<PendingCheck>,
    last_action_repo: &dyn StateRepository<LastResolvedAction>,
) -> Result<RollResolution, DomainError> {
    let Some(check) = find_answered_check(command, pending_repo).await? else {
        return Ok(RollResolution::Ignored);
    };
    let resolved = commit_roll(command, check, clock, pending_repo, last_action_repo).await?;
    Ok(RollResolution::Resolved(Box::new(resolved)))
}

/// Returns the pending check a roll answers without changing any state.
///
/// # Errors
///
/// Returns `DomainError` if loading fails.
pub async fn find_answered_check(
    command: &ResolveRoll,
    pending_repo: &dyn StateRepository<PendingCheck>,
) -> Result<Option<PendingCheck>, DomainError> {
    let Some(check) = pending_repo.load(command.campaign_id).await? else {
        info!("stray roll result ignored: no pending check");
        return Ok(None);
    };
    if check.id != command.pending_check_id {
        warn!(open_check_id = %check.id, "stray roll result ignored: check id mismatch");
        return Ok(None);
    }
    Ok(Some(check))
}

/// Consumes `check` with the command's roll: deletes it, computes the
/// outcome and records the last resolved action.
///
/// # Errors
///
/// Returns `DomainError` if saving or deleting fails.
pub async fn commit_roll(
    command: &ResolveRoll,
    check: PendingCheck,
    clock: &dyn Clock,
    pending_repo: &dyn StateRepository<PendingCheck>,
    last_action_repo: &dyn StateRepository<LastResolvedAction>,
) -> Result<ResolvedCheck, DomainError> {
    pending_repo.delete(command.campaign_id).await?;

    let outcome = determine_outcome(
        command.roll.d20,
        command.roll.total,
        i32::from(check.difficulty),
    );

    if check.intent.updates_last_action() {
        let last = LastResolvedAction::new(
            check.intent.action_label.clone(),
            check.domain,
            Some(check.stat),
            check.skill.clone(),
            clock,
        );
        last_action_repo.save(command.campaign_id, last).await?;
    }

    let continuation = if check.check_type == CheckType::Attack {
        Continuation::Combat
    } else {
        Continuation::Narrate
    };
    info!(d20 = command.roll.d20, total = command.roll.total, %outcome, "pending check resolved");

    Ok(ResolvedCheck {
        check,
        roll: command.roll,
        outcome,
        continuation,
    })
}

/// Deletes the campaign's pending check if it is an attack roll. Returns the
/// discarded check.
///
/// # Errors
///
/// Returns `DomainError` if loading or deleting fails.
pub async fn discard_attack_check(
    campaign_id: Uuid,
    repo: &dyn StateRepository<PendingCheck>,
) -> Result<Option<PendingCheck>, DomainError> {
    match repo.load(campaign_id).await? {
        Some(check) if check.check_type == CheckType::Attack => {
            repo.delete(campaign_id).await?;
            info!(%campaign_id, check_id = %check.id, "open attack check discarded");
            Ok(Some(check))
        }
        _ => Ok(None),
    }
}
