//! Commands for the Combat context.

use talewright_core::command::Command;
use talewright_rules::domain::dice::RollResult;
use uuid::Uuid;

use super::engine::CombatIntent;
use super::state::{CombatEntity, PlayerSnapshot};

/// Command to start a battle for a campaign.
#[derive(Debug, Clone)]
pub struct StartBattle {
    pub campaign_id: Uuid,
    pub player: CombatEntity,
    /// Enemies in initiative order.
    pub enemies: Vec<CombatEntity>,
}

impl Command for StartBattle {
    fn command_type(&self) -> &'static str {
        "combat.start_battle"
    }

    fn campaign_id(&self) -> Uuid {
        self.campaign_id
    }
}

/// Command to resolve the player's action in the campaign's battle.
#[derive(Debug, Clone)]
pub struct ResolveAction {
    pub campaign_id: Uuid,
    pub intent: CombatIntent,
    /// Client-reported player HP/MP, applied first.
    pub snapshot: Option<PlayerSnapshot>,
    /// A player-supplied attack roll, used verbatim.
    pub roll_override: Option<RollResult>,
}

impl Command for ResolveAction {
    fn command_type(&self) -> &'static str {
        "combat.resolve_action"
    }

    fn campaign_id(&self) -> Uuid {
        self.campaign_id
    }
}
