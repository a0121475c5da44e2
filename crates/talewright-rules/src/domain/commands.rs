//! Commands for the Rules & Resolution context.

use talewright_core::command::Command;
use uuid::Uuid;

use super::check::PendingCheck;
use super::dice::RollResult;

/// Command to open a pending check, superseding any outstanding one.
#[derive(Debug, Clone)]
pub struct OpenCheck {
    /// The campaign the check belongs to.
    pub campaign_id: Uuid,
    /// The check to open.
    pub check: PendingCheck,
}

impl Command for OpenCheck {
    fn command_type(&self) -> &'static str {
        "rules.open_check"
    }

    fn campaign_id(&self) -> Uuid {
        self.campaign_id
    }
}

/// Command to answer the campaign's pending check with a roll.
#[derive(Debug, Clone)]
pub struct ResolveRoll {
    /// The campaign the roll is for.
    pub campaign_id: Uuid,
    /// Id of the check the caller believes is open.
    pub pending_check_id: Uuid,
    /// The roll, used verbatim.
    pub roll: RollResult,
}

impl Command for ResolveRoll {
    fn command_type(&self) -> &'static str {
        "rules.resolve_roll"
    }

    fn campaign_id(&self) -> Uuid {
        self.campaign_id
    }
}
