//! Command handlers for the Status context.

use serde::Serialize;
use talewright_core::clock::Clock;
use talewright_core::command::Command;
use talewright_core::error::DomainError;
use talewright_core::repository::StateRepository;
use tracing::{debug, info, instrument};

use crate::domain::commands::ProposeStatusChange;
use crate::domain::delta::safe_parse_status_delta;
use crate::domain::effect::StatusEffect;
use crate::domain::normalizer::{NormalizedStatusUpdate, apply_status_update, normalize_status_update};

/// The accepted part of a proposal and the statuses after merging it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub accepted: NormalizedStatusUpdate,
    pub statuses: Vec<StatusEffect>,
}

/// Handles the `ProposeStatusChange` command: parses and normalizes the
/// proposal, merges what survives, and saves the result. A proposal that
/// normalizes to nothing leaves storage untouched.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or saving fails. An
/// invalid proposal is never an error.
#[instrument(skip_all, fields(command = command.command_type(), campaign_id = %command.campaign_id()))]
pub async fn handle_propose_status_change(
    command: &ProposeStatusChange,
    clock: &dyn Clock,
    repo: &dyn StateRepository<Vec<StatusEffect>>,
) -> Result<StatusChange, DomainError> {
    let active = repo.load(command.campaign_id).await?.unwrap_or_default();
    let delta = safe_parse_status_delta(&command.proposal);
    let accepted = normalize_status_update(&delta, &active, clock);

    if accepted.is_empty() {
        debug!(proposed = !delta.is_empty(), "no status change accepted");
        return Ok(StatusChange {
            accepted,
            statuses: active,
        });
    }

    let statuses = apply_status_update(&active, &accepted);
    repo.save(command.campaign_id, statuses.clone()).await?;
    info!(
        applied = accepted.apply.len(),
        updated = accepted.update.len(),
        removed = accepted.remove.len(),
        "status change merged"
    );
    Ok(StatusChange { accepted, statuses })
}

#[cfg(test)]
mod tests {
    use talewright_test_support::{FailingRepository, RecordingRepository, fixed_clock};
    use uuid::Uuid;

    use super::*;
    use crate::domain::catalog::StatusId;

    const POISON_PROPOSAL: &str = r#"The spider's fangs sink in.
{"apply":[{"id":"poisoned","name":"Poisoned","type":"condition","mechanics":"disadvantage on attack rolls","trigger":"giant spider bite","duration":{"type":"hours","value":1},"cure":"antitoxin"}]}"#;

    #[tokio::test]
    async fn test_valid_proposal_is_merged_and_saved() {
        let campaign_id = Uuid::new_v4();
        let repo = RecordingRepository::new();
        let command = ProposeStatusChange {
            campaign_id,
            proposal: POISON_PROPOSAL.to_owned(),
        };

        let change = handle_propose_status_change(&command, &fixed_clock(), &repo)
            .await
            .unwrap();

        assert_eq!(change.statuses.len(), 1);
        assert_eq!(change.statuses[0].id, StatusId::Poisoned);
        assert_eq!(repo.current(campaign_id), Some(change.statuses));
    }

    #[tokio::test]
    async fn test_rejected_proposal_saves_nothing() {
        let campaign_id = Uuid::new_v4();
        let repo = RecordingRepository::new();
        let command = ProposeStatusChange {
            campaign_id,
            proposal: r#"{"apply":[{"id":"famous","name":"Famous in the tavern"}]}"#.to_owned(),
        };

        let change = handle_propose_status_change(&command, &fixed_clock(), &repo)
            .await
            .unwrap();

        assert!(change.accepted.is_empty());
        assert!(repo.saved().is_empty());
    }

    #[tokio::test]
    async fn test_infrastructure_error_is_surfaced() {
        let repo = FailingRepository::new();
        let command = ProposeStatusChange {
            campaign_id: Uuid::new_v4(),
            proposal: POISON_PROPOSAL.to_owned(),
        };
        let result = handle_propose_status_change(&command, &fixed_clock(), &repo).await;
        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
