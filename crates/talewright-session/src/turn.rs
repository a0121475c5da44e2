//! Turn orchestration: one player message or roll in, one response out.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use talewright_combat::application::command_handlers::{
    BattleUpdate, handle_resolve_action, handle_start_battle,
};
use talewright_combat::domain::commands::{ResolveAction, StartBattle};
use talewright_combat::domain::engine::CombatIntent;
use talewright_combat::domain::events::CombatEvent;
use talewright_combat::domain::state::{CombatEntity, CombatState, PlayerSnapshot};
use talewright_core::clock::Clock;
use talewright_core::error::DomainError;
use talewright_core::rng::DeterministicRng;
use talewright_intent::application::router::{
    IntentAnalysis, IntentRouter, analyze_text, refine_with_router,
};
use talewright_intent::domain::classifier::{
    ActionKind, ClassifierInput, EnvironmentTag, GameContext,
};
use talewright_rules::application::command_handlers::{
    commit_roll, discard_attack_check, find_answered_check, handle_open_check,
};
use talewright_rules::domain::check::{
    CheckContext, CheckRoute, CheckType, PendingCheck, attack_check, build_check,
};
use talewright_rules::domain::commands::{OpenCheck, ResolveRoll};
use talewright_rules::domain::dice::RollResult;
use talewright_rules::domain::outcome::CheckOutcome;
use talewright_status::application::command_handlers::{
    StatusChange, handle_propose_status_change,
};
use talewright_status::domain::commands::ProposeStatusChange;
use tokio::time::timeout;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::narrator::{NEUTRAL_NARRATION, Narration, NarrationRequest, Narrator};
use crate::store::SessionStore;

/// Entity id of the player in checks and battles.
pub const PLAYER_ID: &str = "player";

/// One request from the caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub campaign_id: Uuid,
    #[serde(default)]
    pub player_action_text: String,
    #[serde(default)]
    pub scene_participants: Vec<String>,
    #[serde(default)]
    pub selected_target: Option<String>,
    /// A roll answering the open check.
    #[serde(default)]
    pub roll_result: Option<RollResult>,
    #[serde(default)]
    pub pending_check_id: Option<Uuid>,
    #[serde(default)]
    pub player_snapshot: Option<PlayerSnapshot>,
    #[serde(default)]
    pub environment: Vec<EnvironmentTag>,
}

impl TurnRequest {
    /// A request carrying player text only.
    #[must_use]
    pub fn action(campaign_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            campaign_id,
            player_action_text: text.into(),
            ..Self::default()
        }
    }

    /// A request answering check `pending_check_id` with `roll`.
    #[must_use]
    pub fn roll(campaign_id: Uuid, pending_check_id: Option<Uuid>, roll: RollResult) -> Self {
        Self {
            campaign_id,
            roll_result: Some(roll),
            pending_check_id,
            ..Self::default()
        }
    }
}

/// A turn whose outcome is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTurn {
    /// The campaign's battle, if one is running or just ended.
    pub combat_state: Option<CombatState>,
    pub events: Vec<CombatEvent>,
    pub narration: String,
    pub check_outcome: Option<CheckOutcome>,
    /// Status changes the narrator proposed, after normalization.
    pub status_change: Option<StatusChange>,
}

/// Response to a `TurnRequest`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnResponse {
    /// The action needs a roll; narration is withheld until it arrives.
    RollRequired {
        #[serde(rename = "pendingCheck")]
        pending_check: PendingCheck,
    },
    Resolved(Box<ResolvedTurn>),
    /// A roll matched no open check and no text came with it.
    Ignored { reason: String },
}

impl TurnResponse {
    /// Id of the check the caller must answer next, if any.
    #[must_use]
    pub fn pending_check_id(&self) -> Option<Uuid> {
        match self {
            Self::RollRequired { pending_check } => Some(pending_check.id),
            Self::Resolved(_) | Self::Ignored { .. } => None,
        }
    }
}

/// Runs turns against a `SessionStore`. Turns for the same campaign are
/// serialized; different campaigns proceed independently.
#[derive(Clone)]
pub struct TurnService {
    config: SessionConfig,
    store: SessionStore,
    clock: Arc<dyn Clock>,
    rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    narrator: Arc<dyn Narrator>,
    router: Option<Arc<dyn IntentRouter>>,
}

impl TurnService {
    /// Creates a service without a generative intent router.
    #[must_use]
    pub fn new(
        config: SessionConfig,
        store: SessionStore,
        clock: Arc<dyn Clock>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
        narrator: Arc<dyn Narrator>,
    ) -> Self {
        Self {
            config,
            store,
            clock,
            rng,
            narrator,
            router: None,
        }
    }

    /// Adds a generative intent router.
    #[must_use]
    pub fn with_router(mut self, router: Arc<dyn IntentRouter>) -> Self {
        self.router = Some(router);
        self
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Handles one turn.
    ///
    /// A roll answering the open check resolves it. Otherwise the text is
    /// classified and either opens a check, goes to the combat engine, or is
    /// narrated directly. A roll that matches no open check is ignored and
    /// any accompanying text is handled as a fresh action.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if storage fails or the combat engine rejects
    /// the action. Router, narrator and status-proposal failures fall back
    /// and are never errors.
    #[instrument(skip_all, fields(campaign_id = %request.campaign_id))]
    pub async fn handle_turn(&self, request: &TurnRequest) -> Result<TurnResponse, DomainError> {
        let _guard = self.store.locks.lock(request.campaign_id).await;

        if let Some(roll) = request.roll_result {
            if let Some(response) = self.resolve_roll(request, roll).await? {
                return Ok(response);
            }
            if request.player_action_text.trim().is_empty() {
                return Ok(TurnResponse::Ignored {
                    reason: "no pending check matches this roll".to_owned(),
                });
            }
        }

        self.take_action(request).await
    }

    async fn resolve_roll(
        &self,
        request: &TurnRequest,
        roll: RollResult,
    ) -> Result<Option<TurnResponse>, DomainError> {
        let Some(pending_check_id) = request.pending_check_id else {
            info!("roll result without a pending check id ignored");
            return Ok(None);
        };
        let command = ResolveRoll {
            campaign_id: request.campaign_id,
            pending_check_id,
            roll,
        };
        let Some(check) = find_answered_check(&command, &*self.store.pending_checks).await? else {
            return Ok(None);
        };

        // The engine runs before the check is consumed so a rejected attack
        // leaves the campaign unchanged.
        let (combat_state, events) = if check.check_type == CheckType::Attack {
            if self.active_battle(request.campaign_id).await?.is_none() {
                warn!(check_id = %check.id, "attack check outlived its battle, discarding");
                discard_attack_check(request.campaign_id, &*self.store.pending_checks).await?;
                return Ok(None);
            }
            let intent = CombatIntent {
                action: ActionKind::Attack,
                target: check.target.clone(),
                description: check.context.clone(),
            };
            let update = self.resolve_combat(request, intent, Some(roll)).await?;
            (Some(update.state), update.events)
        } else {
            (self.active_battle(request.campaign_id).await?, Vec::new())
        };

        let resolved = commit_roll(
            &command,
            check,
            &*self.clock,
            &*self.store.pending_checks,
            &*self.store.last_actions,
        )
        .await?;

        let response = self
            .finish(
                request,
                resolved.check.intent.action_label.clone(),
                Some(resolved.outcome),
                combat_state,
                events,
            )
            .await?;
        Ok(Some(response))
    }

    async fn take_action(&self, request: &TurnRequest) -> Result<TurnResponse, DomainError> {
        let campaign_id = request.campaign_id;
        let battle = self.active_battle(campaign_id).await?;
        let last_action = self.store.last_actions.load(campaign_id).await?;
        let game_context = GameContext {
            in_combat: battle.is_some(),
            environment: request.environment.clone(),
        };
        let input = ClassifierInput::new(
            &request.player_action_text,
            &request.scene_participants,
            &game_context,
        )
        .with_last_action(last_action.as_ref())
        .with_selected_target(request.selected_target.as_deref());
        let analysis = self.analyze(&input).await;
        let label = analysis.decision.action_label.clone();

        let check_context = CheckContext {
            actor: PLAYER_ID,
            text: &request.player_action_text,
            classification: &analysis.classification,
            environment: &request.environment,
        };
        match build_check(&analysis.decision, &check_context, Uuid::new_v4(), &*self.clock) {
            CheckRoute::NoRoll => self.finish(request, label, None, battle, Vec::new()).await,
            CheckRoute::Check(check) => self.open_check(campaign_id, *check).await,
            CheckRoute::Combat => {
                let mut events = Vec::new();
                if battle.is_none() {
                    events.extend(self.start_battle(request, &analysis).await?.events);
                }

                if analysis.classification.action == ActionKind::Attack
                    && self.config.player_rolls_attacks
                {
                    let check =
                        attack_check(&analysis.decision, &check_context, Uuid::new_v4(), &*self.clock);
                    return self.open_check(campaign_id, check).await;
                }

                // Any other combat action replaces an unanswered attack roll.
                discard_attack_check(campaign_id, &*self.store.pending_checks).await?;
                let intent = CombatIntent {
                    action: analysis.classification.action,
                    target: analysis.classification.target.clone(),
                    description: request.player_action_text.clone(),
                };
                let update = self.resolve_combat(request, intent, None).await?;
                events.extend(update.events);
                self.finish(request, label, None, Some(update.state), events)
                    .await
            }
        }
    }

    async fn analyze(&self, input: &ClassifierInput<'_>) -> IntentAnalysis {
        let analysis = analyze_text(input);
        let Some(router) = &self.router else {
            return analysis;
        };
        let refined = timeout(
            self.config.router_timeout,
            refine_with_router(analysis.clone(), input, router.as_ref()),
        )
        .await;
        refined.unwrap_or_else(|_| {
            warn!(
                timeout = ?self.config.router_timeout,
                "intent router timed out, using deterministic decision"
            );
            analysis
        })
    }

    async fn active_battle(&self, campaign_id: Uuid) -> Result<Option<CombatState>, DomainError> {
        Ok(self
            .store
            .battles
            .load(campaign_id)
            .await?
            .filter(|state| !state.is_over()))
    }

    async fn start_battle(
        &self,
        request: &TurnRequest,
        analysis: &IntentAnalysis,
    ) -> Result<BattleUpdate, DomainError> {
        let hp_max = request
            .player_snapshot
            .and_then(|snapshot| snapshot.hp_max)
            .unwrap_or(self.config.default_player_hp);
        let mut names: Vec<&str> = request
            .scene_participants
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            names.push(analysis.classification.target.as_deref().unwrap_or("Enemy"));
        }

        let command = StartBattle {
            campaign_id: request.campaign_id,
            player: CombatEntity::player(PLAYER_ID, "Player", hp_max),
            enemies: enemy_roster(&names, self.config.default_enemy_hp),
        };
        handle_start_battle(&command, &*self.clock, &*self.store.battles).await
    }

    async fn resolve_combat(
        &self,
        request: &TurnRequest,
        intent: CombatIntent,
        roll_override: Option<RollResult>,
    ) -> Result<BattleUpdate, DomainError> {
        let command = ResolveAction {
            campaign_id: request.campaign_id,
            intent,
            snapshot: request.player_snapshot,
            roll_override,
        };
        handle_resolve_action(&command, &*self.rng, &*self.store.battles).await
    }

    async fn open_check(
        &self,
        campaign_id: Uuid,
        check: PendingCheck,
    ) -> Result<TurnResponse, DomainError> {
        let command = OpenCheck { campaign_id, check };
        let pending_check = handle_open_check(&command, &*self.store.pending_checks).await?;
        Ok(TurnResponse::RollRequired { pending_check })
    }

    async fn finish(
        &self,
        request: &TurnRequest,
        action_label: String,
        check_outcome: Option<CheckOutcome>,
        combat_state: Option<CombatState>,
        events: Vec<CombatEvent>,
    ) -> Result<TurnResponse, DomainError> {
        let narration = self
            .narrate(&NarrationRequest {
                campaign_id: request.campaign_id,
                player_action_text: request.player_action_text.clone(),
                action_label,
                check_outcome,
                events: events.clone(),
            })
            .await;

        let status_change = match narration.status_proposal {
            Some(proposal) => {
                let command = ProposeStatusChange {
                    campaign_id: request.campaign_id,
                    proposal,
                };
                Some(
                    handle_propose_status_change(&command, &*self.clock, &*self.store.statuses)
                        .await?,
                )
            }
            None => None,
        };

        Ok(TurnResponse::Resolved(Box::new(ResolvedTurn {
            combat_state,
            events,
            narration: narration.text,
            check_outcome,
            status_change,
        })))
    }

    async fn narrate(&self, request: &NarrationRequest) -> Narration {
        match timeout(self.config.narrator_timeout, self.narrator.narrate(request)).await {
            Ok(Ok(narration)) if narration.text.trim().is_empty() => Narration {
                text: NEUTRAL_NARRATION.to_owned(),
                ..narration
            },
            Ok(Ok(narration)) => narration,
            Ok(Err(err)) => {
                warn!(error = %err, "narrator failed, using neutral narration");
                Narration::neutral()
            }
            Err(_) => {
                warn!(
                    timeout = ?self.config.narrator_timeout,
                    "narrator timed out, using neutral narration"
                );
                Narration::neutral()
            }
        }
    }
}

impl fmt::Debug for TurnService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnService")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("router", &self.router.is_some())
            .finish_non_exhaustive()
    }
}

/// Builds enemies from scene participant names with unique, slug-style ids.
fn enemy_roster(names: &[&str], hp_max: i32) -> Vec<CombatEntity> {
    let mut used: HashSet<String> = HashSet::from([PLAYER_ID.to_owned()]);
    names
        .iter()
        .map(|name| {
            let base = slug(name);
            let mut id = base.clone();
            let mut n = 2;
            while !used.insert(id.clone()) {
                id = format!("{base}-{n}");
                n += 1;
            }
            CombatEntity::enemy(id, *name, hp_max)
        })
        .collect()
}

fn slug(name: &str) -> String {
    let slug = name
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "enemy".to_owned()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- enemy_roster ---

    #[test]
    fn test_roster_slugs_names() {
        let roster = enemy_roster(&["Old Gruk", "Cave Rat!"], 10);
        let ids: Vec<&str> = roster.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["old-gruk", "cave-rat"]);
        assert_eq!(roster[0].name, "Old Gruk");
        assert!(roster.iter().all(|e| e.hp == 10 && e.hp_max == 10));
    }

    #[test]
    fn test_roster_ids_are_unique() {
        let roster = enemy_roster(&["Goblin", "goblin", "Player", "???"], 5);
        let ids: Vec<&str> = roster.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["goblin", "goblin-2", "player-2", "enemy"]);
    }

    // --- TurnResponse ---

    #[test]
    fn test_ignored_response_serializes_with_status_tag() {
        let response = TurnResponse::Ignored {
            reason: "stray".to_owned(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "ignored", "reason": "stray" }));
        assert_eq!(response.pending_check_id(), None);
    }

    #[test]
    fn test_request_deserializes_from_camel_case() {
        let campaign_id = Uuid::new_v4();
        let request: TurnRequest = serde_json::from_value(serde_json::json!({
            "campaignId": campaign_id,
            "playerActionText": "I attack the goblin",
            "sceneParticipants": ["Goblin"],
            "rollResult": { "d20": 12, "bonus": 3, "total": 15 },
            "environment": ["indoor"]
        }))
        .unwrap();

        assert_eq!(request.campaign_id, campaign_id);
        assert_eq!(request.scene_participants, ["Goblin"]);
        assert_eq!(request.roll_result.map(|r| r.total), Some(15));
        assert_eq!(request.environment, [EnvironmentTag::Indoor]);
        assert_eq!(request.pending_check_id, None);
    }
}
