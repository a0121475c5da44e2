//! Commands for the Status context.

use talewright_core::command::Command;
use uuid::Uuid;

/// Command to merge a generative status proposal into the campaign
/// character's statuses.
#[derive(Debug, Clone)]
pub struct ProposeStatusChange {
    pub campaign_id: Uuid,
    /// Raw, untrusted model output containing a status delta.
    pub proposal: String,
}

impl Command for ProposeStatusChange {
    fn command_type(&self) -> &'static str {
        "status.propose_change"
    }

    fn campaign_id(&self) -> Uuid {
        self.campaign_id
    }
}
