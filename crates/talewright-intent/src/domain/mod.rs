//! Domain layer for the Intent context.

pub mod annotator;
pub mod classifier;
pub mod decision;
pub mod last_action;
pub mod patterns;
pub mod segmenter;
