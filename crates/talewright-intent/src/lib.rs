//! Talewright — Intent context.
//!
//! Responsible for turning free-form player text into a typed
//! `IntentDecision`: splitting the message into segments, tagging each
//! segment with a heuristic hint, classifying the action with an ordered
//! rule library, and optionally refining the result with an untrusted
//! generative router.

pub mod application;
pub mod domain;
