//! Application layer for the Intent context.

pub mod router;
