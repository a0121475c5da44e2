//! Domain layer for the Combat context.

pub mod commands;
pub mod engine;
pub mod events;
pub mod state;
