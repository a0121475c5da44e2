//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No battle exists for the campaign.
    #[error("battle not found for campaign {0}")]
    BattleNotFound(Uuid),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// Free-form dice notation could not be parsed.
    #[error("invalid dice notation: {0}")]
    InvalidDiceNotation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
