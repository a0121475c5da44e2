//! Narration collaborator port and the built-in template narrator.

use async_trait::async_trait;
use serde::Serialize;
use talewright_combat::domain::events::CombatEvent;
use talewright_combat::domain::state::CombatResult;
use talewright_core::error::DomainError;
use talewright_rules::domain::outcome::CheckOutcome;
use uuid::Uuid;

/// Line used whenever the narrator fails, times out or has nothing to say.
pub const NEUTRAL_NARRATION: &str = "The moment settles. What do you do next?";

/// What the narrator is told about a resolved turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationRequest {
    pub campaign_id: Uuid,
    pub player_action_text: String,
    /// Short label of the action ("sneak guard").
    pub action_label: String,
    pub check_outcome: Option<CheckOutcome>,
    pub events: Vec<CombatEvent>,
}

/// Narrator output. The status proposal is untrusted free text and goes
/// through the status normalizer before anything is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Narration {
    pub text: String,
    pub status_proposal: Option<String>,
}

impl Narration {
    /// The neutral fallback narration.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            text: NEUTRAL_NARRATION.to_owned(),
            status_proposal: None,
        }
    }
}

/// A source of narration for resolved turns, usually generative.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Narrates `request`.
    async fn narrate(&self, request: &NarrationRequest) -> Result<Narration, DomainError>;
}

/// Deterministic narrator that describes the outcome and events plainly.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

#[async_trait]
impl Narrator for TemplateNarrator {
    async fn narrate(&self, request: &NarrationRequest) -> Result<Narration, DomainError> {
        let mut lines = Vec::new();
        if let Some(outcome) = request.check_outcome {
            lines.push(format!("{}: {}.", request.action_label, outcome_phrase(outcome)));
        }
        lines.extend(request.events.iter().filter_map(describe_event));

        let text = if lines.is_empty() {
            NEUTRAL_NARRATION.to_owned()
        } else {
            lines.join(" ")
        };
        Ok(Narration {
            text,
            status_proposal: None,
        })
    }
}

fn outcome_phrase(outcome: CheckOutcome) -> &'static str {
    match outcome {
        CheckOutcome::CriticalSuccess => "a spectacular success",
        CheckOutcome::Success => "success",
        CheckOutcome::PartialSuccess => "success, at a cost",
        CheckOutcome::Failure => "it does not work",
        CheckOutcome::CriticalFailure => "it goes badly wrong",
    }
}

fn describe_event(event: &CombatEvent) -> Option<String> {
    let line = match event {
        CombatEvent::TurnStart { .. } => return None,
        CombatEvent::AttackResolved {
            attacker,
            target,
            hit,
            critical,
            fumble,
            ..
        } => match (*critical, *fumble, *hit) {
            (true, _, _) => format!("{attacker} lands a critical blow on {target}."),
            (_, true, _) => format!("{attacker} fumbles the attack on {target}."),
            (_, _, true) => format!("{attacker} hits {target}."),
            _ => format!("{attacker} misses {target}."),
        },
        CombatEvent::DamageApplied {
            target,
            amount,
            hp,
            hp_max,
        } => format!("{target} takes {amount} damage ({hp}/{hp_max})."),
        CombatEvent::EnemyDefeated { target } => format!("{target} falls."),
        CombatEvent::StatusApplied { target, status, .. } => format!("{target} is {status}."),
        CombatEvent::StatusRemoved { target, status } => {
            format!("{target} is no longer {status}.")
        }
        CombatEvent::Move { description, .. }
        | CombatEvent::ItemUsed { description, .. }
        | CombatEvent::SpellCast { description, .. }
        | CombatEvent::AttemptAction { description, .. } => description.clone(),
        CombatEvent::CombatEnded { result, .. } => match result {
            CombatResult::Victory => "The battle is won.".to_owned(),
            CombatResult::Defeat => "You fall, and the battle is lost.".to_owned(),
        },
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(check_outcome: Option<CheckOutcome>, events: Vec<CombatEvent>) -> NarrationRequest {
        NarrationRequest {
            campaign_id: Uuid::new_v4(),
            player_action_text: "I sneak past the guard".to_owned(),
            action_label: "sneak guard".to_owned(),
            check_outcome,
            events,
        }
    }

    #[tokio::test]
    async fn test_template_narrates_check_outcome() {
        let narration = TemplateNarrator
            .narrate(&request(Some(CheckOutcome::PartialSuccess), vec![]))
            .await
            .unwrap();
        assert_eq!(narration.text, "sneak guard: success, at a cost.");
        assert_eq!(narration.status_proposal, None);
    }

    #[tokio::test]
    async fn test_template_skips_turn_starts_and_describes_damage() {
        let events = vec![
            CombatEvent::TurnStart {
                actor: "hero".to_owned(),
                round: 1,
            },
            CombatEvent::DamageApplied {
                target: "goblin".to_owned(),
                amount: 6,
                hp: 4,
                hp_max: 10,
            },
            CombatEvent::EnemyDefeated {
                target: "goblin".to_owned(),
            },
        ];
        let narration = TemplateNarrator.narrate(&request(None, events)).await.unwrap();
        assert_eq!(narration.text, "goblin takes 6 damage (4/10). goblin falls.");
    }

    #[tokio::test]
    async fn test_template_falls_back_to_neutral_line() {
        let narration = TemplateNarrator.narrate(&request(None, vec![])).await.unwrap();
        assert_eq!(narration, Narration::neutral());
    }
}
