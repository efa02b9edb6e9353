// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the chat transport (Telegram).

use async_trait::async_trait;

use crate::error::TallyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundEvent, OutboundMessage, SessionId};

/// Bidirectional chat transport.
///
/// The conversation engine never talks to the transport directly; the agent
/// loop receives [`InboundEvent`]s here and executes the engine's actions
/// through [`send`](ChannelAdapter::send) and
/// [`register_next_input`](ChannelAdapter::register_next_input).
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), TallyError>;

    /// Sends a message, with its choices rendered as buttons.
    async fn send(&self, msg: OutboundMessage) -> Result<(), TallyError>;

    /// Receives the next inbound event.
    async fn receive(&self) -> Result<InboundEvent, TallyError>;

    /// Tells the transport that the next free-text message from this session
    /// answers the currently pending step.
    async fn register_next_input(&self, _session_id: &SessionId) -> Result<(), TallyError> {
        Ok(())
    }
}
