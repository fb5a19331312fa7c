pub mod client;
pub mod error;

use std::future::Future;

use serde::{Deserialize, Serialize};

pub use client::LiveThreadClient;
pub use error::ChannelError;

/// The editable settings of a live thread. `resources` holds the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelDocument {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resources: String,
}

/// Appends new entries to a channel's history.
pub trait PublishTarget {
    fn publish(&self, body: &str) -> impl Future<Output = Result<(), ChannelError>> + Send;
}

/// Reads and replaces the channel's panel document.
pub trait PanelTarget {
    fn read_panel(&self) -> impl Future<Output = Result<PanelDocument, ChannelError>> + Send;

    fn write_panel(
        &self,
        document: &PanelDocument,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send;
}
