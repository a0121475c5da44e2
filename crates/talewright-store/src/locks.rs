//! Per-campaign serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;
use uuid::Uuid;

/// One async lock per campaign. Holding a campaign's guard gives exclusive
/// access to that campaign's state; other campaigns are unaffected.
///
/// A campaign's entry lives only while someone holds or waits for its lock.
#[derive(Debug, Default)]
pub struct CampaignLocks {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

/// Exclusive access to one campaign. Dropping it releases the lock and
/// removes the campaign's entry when nobody else is waiting.
#[derive(Debug)]
pub struct CampaignGuard<'a> {
    table: &'a CampaignLocks,
    campaign_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for CampaignGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.table.evict_if_idle(self.campaign_id);
    }
}

impl CampaignLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `campaign_id`.
    pub async fn lock(&self, campaign_id: Uuid) -> CampaignGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(campaign_id).or_default())
        };
        trace!(%campaign_id, "waiting for campaign lock");
        let guard = lock.lock_owned().await;
        CampaignGuard {
            table: self,
            campaign_id,
            guard: Some(guard),
        }
    }

    // Waiters clone the Arc under the table mutex, so a strong count of one
    // seen under that mutex means the table holds the only reference.
    fn evict_if_idle(&self, campaign_id: Uuid) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = locks
            .get(&campaign_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if idle {
            locks.remove(&campaign_id);
            trace!(%campaign_id, "campaign lock evicted");
        }
    }

    /// Number of campaigns currently locked or waited on.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no campaign is locked or waited on.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
