// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mirrors operational notes to the log and, when configured, an ops chat.

use std::sync::Arc;

use tally_core::ChannelAdapter;
use tally_core::types::{OpsLevel, OpsNote, OutboundMessage, SessionId};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct OpsForwarder {
    channel: Arc<dyn ChannelAdapter>,
    chat: Option<SessionId>,
}

impl OpsForwarder {
    pub fn new(channel: Arc<dyn ChannelAdapter>, chat: Option<SessionId>) -> Self {
        Self { channel, chat }
    }

    /// Log the note and send `[LEVEL] text` to the ops chat.
    ///
    /// Delivery failures are logged and otherwise ignored.
    pub async fn forward(&self, note: OpsNote) {
        match note.level {
            OpsLevel::Info => info!(target: "tally::ops", "{}", note.text),
            OpsLevel::Warning => warn!(target: "tally::ops", "{}", note.text),
            OpsLevel::Error => error!(target: "tally::ops", "{}", note.text),
        }

        let Some(chat) = &self.chat else {
            return;
        };
        let msg = OutboundMessage::text(chat.clone(), note.formatted());
        if let Err(e) = self.channel.send(msg).await {
            error!(error = %e, "failed to deliver ops note");
        }
    }
}
