//! Talewright — Combat context.
//!
//! Responsible for battles: the roster and initiative order, the
//! player-then-enemies round structure, attack and damage resolution, and
//! status expiry. Every resolution emits append-only `CombatEvent`s.

pub mod application;
pub mod domain;
