//! Shared helpers for turn integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use talewright_core::error::DomainError;
use talewright_core::rng::DeterministicRng;
use talewright_intent::application::router::{IntentRouter, RouterRequest};
use talewright_rules::domain::dice::RollResult;
use talewright_session::config::SessionConfig;
use talewright_session::narrator::{Narration, NarrationRequest, Narrator, TemplateNarrator};
use talewright_session::store::SessionStore;
use talewright_session::turn::{ResolvedTurn, TurnResponse, TurnService};
use talewright_test_support::{SequenceRng, fixed_clock};

pub const POISON_PROPOSAL: &str = r#"{"apply":[{"id":"poisoned","name":"Poisoned","type":"condition","mechanics":"disadvantage on attack rolls","trigger":"giant spider bite","duration":{"type":"hours","value":1},"cure":"antitoxin"}]}"#;

/// Config where the engine rolls the player's attacks.
pub fn auto_attack_config() -> SessionConfig {
    SessionConfig {
        player_rolls_attacks: false,
        ..SessionConfig::default()
    }
}

/// Service over an in-memory store with a fixed clock, scripted dice and
/// the template narrator.
pub fn build_service(config: SessionConfig, rng: impl DeterministicRng + Send + 'static) -> TurnService {
    build_service_with_narrator(config, rng, Arc::new(TemplateNarrator))
}

pub fn build_service_with_narrator(
    config: SessionConfig,
    rng: impl DeterministicRng + Send + 'static,
    narrator: Arc<dyn Narrator>,
) -> TurnService {
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(rng));
    TurnService::new(
        config,
        SessionStore::in_memory(),
        Arc::new(fixed_clock()),
        rng,
        narrator,
    )
}

/// Service whose dice must never be rolled.
pub fn no_dice_service() -> TurnService {
    build_service(SessionConfig::default(), SequenceRng::new(vec![]))
}

pub fn roll(d20: u32, bonus: i32) -> RollResult {
    RollResult::manual(d20, bonus).unwrap()
}

pub fn expect_resolved(response: TurnResponse) -> ResolvedTurn {
    match response {
        TurnResponse::Resolved(turn) => *turn,
        other => panic!("expected a resolved turn, got {other:?}"),
    }
}

/// Narrator returning fixed text and an optional status proposal.
pub struct ScriptedNarrator {
    pub text: &'static str,
    pub status_proposal: Option<&'static str>,
}

#[async_trait]
impl Narrator for ScriptedNarrator {
    async fn narrate(&self, _request: &NarrationRequest) -> Result<Narration, DomainError> {
        Ok(Narration {
            text: self.text.to_owned(),
            status_proposal: self.status_proposal.map(str::to_owned),
        })
    }
}

/// Narrator that always fails.
pub struct FailingNarrator;

#[async_trait]
impl Narrator for FailingNarrator {
    async fn narrate(&self, _request: &NarrationRequest) -> Result<Narration, DomainError> {
        Err(DomainError::Infrastructure("model offline".to_owned()))
    }
}

/// Narrator that answers only after `0`.
pub struct SlowNarrator(pub Duration);

#[async_trait]
impl Narrator for SlowNarrator {
    async fn narrate(&self, _request: &NarrationRequest) -> Result<Narration, DomainError> {
        tokio::time::sleep(self.0).await;
        Ok(Narration {
            text: "Too late.".to_owned(),
            status_proposal: None,
        })
    }
}

/// Router returning canned output, optionally after a delay.
pub struct CannedRouter {
    pub output: Result<&'static str, &'static str>,
    pub delay: Duration,
}

#[async_trait]
impl IntentRouter for CannedRouter {
    async fn route(&self, _request: &RouterRequest) -> Result<String, DomainError> {
        tokio::time::sleep(self.delay).await;
        self.output
            .map(str::to_owned)
            .map_err(|e| DomainError::Infrastructure(e.to_owned()))
    }
}
