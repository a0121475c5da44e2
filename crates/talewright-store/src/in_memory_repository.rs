//! In-memory implementation of the `StateRepository` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use talewright_core::error::DomainError;
use talewright_core::repository::StateRepository;

/// Campaign state held in process memory.
#[derive(Debug)]
pub struct InMemoryRepository<T> {
    entries: RwLock<HashMap<Uuid, T>>,
}

impl<T> InMemoryRepository<T> {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of campaigns with stored state.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if no campaign has stored state.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> StateRepository<T> for InMemoryRepository<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn load(&self, campaign_id: Uuid) -> Result<Option<T>, DomainError> {
        Ok(self.entries.read().await.get(&campaign_id).cloned())
    }

    async fn save(&self, campaign_id: Uuid, state: T) -> Result<(), DomainError> {
        self.entries.write().await.insert(campaign_id, state);
        Ok(())
    }

    async fn delete(&self, campaign_id: Uuid) -> Result<(), DomainError> {
        self.entries.write().await.remove(&campaign_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_missing_campaign_is_none() {
        let repo: InMemoryRepository<String> = InMemoryRepository::new();
        assert_eq!(repo.load(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_overwrites_and_delete_removes() {
        let repo = InMemoryRepository::new();
        let campaign_id = Uuid::new_v4();

        repo.save(campaign_id, "first".to_owned()).await.unwrap();
        repo.save(campaign_id, "second".to_owned()).await.unwrap();
        assert_eq!(repo.load(campaign_id).await.unwrap().as_deref(), Some("second"));
        assert_eq!(repo.len().await, 1);

        repo.delete(campaign_id).await.unwrap();
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_deleting_absent_state_is_not_an_error() {
        let repo: InMemoryRepository<u32> = InMemoryRepository::new();
        assert!(repo.delete(Uuid::new_v4()).await.is_ok());
    }

    #[tokio::test]
    async fn test_campaigns_are_isolated() {
        let repo = InMemoryRepository::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        repo.save(a, 1_u32).await.unwrap();
        repo.save(b, 2_u32).await.unwrap();
        assert_eq!(repo.load(a).await.unwrap(), Some(1));
        assert_eq!(repo.load(b).await.unwrap(), Some(2));
    }
}
