use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rule::ActionKind;

/// Timestamps of the most recent successful post and panel update.
///
/// Serialized with the camelCase keys the state store has always used. The
/// legacy `lastSidebarTime` key is accepted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub last_post_time: DateTime<Utc>,
    #[serde(alias = "lastSidebarTime")]
    pub last_panel_time: DateTime<Utc>,
}

impl RunState {
    /// State with both actions last taken at `epoch`.
    pub fn at(epoch: DateTime<Utc>) -> Self {
        Self {
            last_post_time: epoch,
            last_panel_time: epoch,
        }
    }

    pub fn last(&self, kind: ActionKind) -> DateTime<Utc> {
        match kind {
            ActionKind::Post => self.last_post_time,
            ActionKind::Panel => self.last_panel_time,
        }
    }

    /// Record that `kind` completed at `when`.
    pub fn mark(&mut self, kind: ActionKind, when: DateTime<Utc>) {
        match kind {
            ActionKind::Post => self.last_post_time = when,
            ActionKind::Panel => self.last_panel_time = when,
        }
    }
}
