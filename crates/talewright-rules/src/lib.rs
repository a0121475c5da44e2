//! Talewright — Rules & Resolution context.
//!
//! Responsible for dice, the mapping from an `IntentDecision` to a
//! `PendingCheck`, and the `Idle → PendingCheck → Resolved` state machine
//! that consumes externally supplied roll results.

pub mod application;
pub mod domain;
