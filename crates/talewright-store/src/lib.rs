//! Talewright — campaign state storage.
//!
//! An in-memory `StateRepository` and the per-campaign locks that serialize
//! turns for the same campaign.

mod in_memory_repository;
mod locks;

pub use in_memory_repository::InMemoryRepository;
pub use locks::{CampaignGuard, CampaignLocks};
