//! Campaign state repository abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;

/// Repository for one slice of per-campaign state (combat, pending check,
/// last resolved action, ...). The storage medium is up to the implementor.
#[async_trait]
pub trait StateRepository<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Load the state stored for a campaign, if any.
    async fn load(&self, campaign_id: Uuid) -> Result<Option<T>, DomainError>;

    /// Store (overwrite) the state for a campaign.
    async fn save(&self, campaign_id: Uuid, state: T) -> Result<(), DomainError>;

    /// Delete the state for a campaign. Deleting absent state is not an error.
    async fn delete(&self, campaign_id: Uuid) -> Result<(), DomainError>;
}
