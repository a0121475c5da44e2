//! Application layer for the Status context.

pub mod command_handlers;
