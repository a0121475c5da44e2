//! Per-campaign state shared by every turn.

use std::fmt;
use std::sync::Arc;

use talewright_combat::domain::state::CombatState;
use talewright_core::repository::StateRepository;
use talewright_intent::domain::last_action::LastResolvedAction;
use talewright_rules::domain::check::PendingCheck;
use talewright_status::domain::effect::StatusEffect;
use talewright_store::{CampaignLocks, InMemoryRepository};

/// Repositories for each slice of campaign state, plus the locks that
/// serialize turns per campaign.
#[derive(Clone)]
pub struct SessionStore {
    pub battles: Arc<dyn StateRepository<CombatState>>,
    pub pending_checks: Arc<dyn StateRepository<PendingCheck>>,
    pub last_actions: Arc<dyn StateRepository<LastResolvedAction>>,
    pub statuses: Arc<dyn StateRepository<Vec<StatusEffect>>>,
    pub locks: Arc<CampaignLocks>,
}

impl SessionStore {
    /// Creates a store over the given repositories.
    #[must_use]
    pub fn new(
        battles: Arc<dyn StateRepository<CombatState>>,
        pending_checks: Arc<dyn StateRepository<PendingCheck>>,
        last_actions: Arc<dyn StateRepository<LastResolvedAction>>,
        statuses: Arc<dyn StateRepository<Vec<StatusEffect>>>,
    ) -> Self {
        Self {
            battles,
            pending_checks,
            last_actions,
            statuses,
            locks: Arc::new(CampaignLocks::new()),
        }
    }

    /// A store that keeps everything in process memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(InMemoryRepository::new()),
            Arc::new(InMemoryRepository::new()),
            Arc::new(InMemoryRepository::new()),
        )
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}
