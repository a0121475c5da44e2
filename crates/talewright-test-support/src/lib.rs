//! Shared test mocks and utilities for the Talewright rules engine.

mod clock;
mod repository;
mod rng;

pub use clock::{FixedClock, fixed_clock};
pub use repository::{FailingRepository, RecordingRepository};
pub use rng::{MockRng, SequenceRng};
