//! Talewright — session orchestration.
//!
//! Wires the intent, rules, combat and status contexts into a single turn:
//! a player message (or a roll answering an open check) goes in, and either
//! a roll request or a resolved outcome with narration comes out.

pub mod config;
pub mod error;
pub mod narrator;
pub mod store;
pub mod turn;
