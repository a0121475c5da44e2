//! Domain layer for the Status context.

pub mod catalog;
pub mod commands;
pub mod delta;
pub mod effect;
pub mod normalizer;
