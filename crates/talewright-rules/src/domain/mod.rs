//! Domain layer for the Rules & Resolution context.

pub mod check;
pub mod commands;
pub mod dice;
pub mod outcome;
