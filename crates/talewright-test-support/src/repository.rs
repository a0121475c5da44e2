//! Test repositories — mock `StateRepository` implementations for tests.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Mutex;

use async_trait::async_trait;
use talewright_core::error::DomainError;
use talewright_core::repository::StateRepository;
use uuid::Uuid;

/// A repository that keeps state in a map and records every `save` call.
#[derive(Debug)]
pub struct RecordingRepository<T> {
    state: Mutex<HashMap<Uuid, T>>,
    saved: Mutex<Vec<(Uuid, T)>>,
}

impl<T: Clone> RecordingRepository<T> {
    /// Create an empty recording repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HashMap::new()),
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Create a repository pre-loaded with state for one campaign.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_state(campaign_id: Uuid, state: T) -> Self {
        let repo = Self::new();
        repo.state.lock().unwrap().insert(campaign_id, state);
        repo
    }

    /// Returns a snapshot of all saves, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn saved(&self) -> Vec<(Uuid, T)> {
        self.saved.lock().unwrap().clone()
    }

    /// Returns the current state for a campaign.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn current(&self, campaign_id: Uuid) -> Option<T> {
        self.state.lock().unwrap().get(&campaign_id).cloned()
    }
}

impl<T: Clone> Default for RecordingRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> StateRepository<T> for RecordingRepository<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn load(&self, campaign_id: Uuid) -> Result<Option<T>, DomainError> {
        Ok(self.state.lock().unwrap().get(&campaign_id).cloned())
    }

    async fn save(&self, campaign_id: Uuid, state: T) -> Result<(), DomainError> {
        self.saved.lock().unwrap().push((campaign_id, state.clone()));
        self.state.lock().unwrap().insert(campaign_id, state);
        Ok(())
    }

    async fn delete(&self, campaign_id: Uuid) -> Result<(), DomainError> {
        self.state.lock().unwrap().remove(&campaign_id);
        Ok(())
    }
}

/// A repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingRepository<T>(PhantomData<fn() -> T>);

impl<T> FailingRepository<T> {
    /// Create a failing repository.
    #[must_use]
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for FailingRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> StateRepository<T> for FailingRepository<T>
where
    T: Send + Sync + 'static,
{
    async fn load(&self, _campaign_id: Uuid) -> Result<Option<T>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn save(&self, _campaign_id: Uuid, _state: T) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn delete(&self, _campaign_id: Uuid) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
