//! Talewright — Status context.
//!
//! Responsible for the fixed catalog of character-bound status effects and
//! for sanitizing status changes proposed by the generative layer before
//! they reach persistent character state.

pub mod application;
pub mod domain;
