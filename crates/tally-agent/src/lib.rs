// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation engine and agent loop for the Tally sales bot.
//!
//! The [`AgentLoop`] is the central coordinator that:
//! - Receives events from a channel adapter
//! - Hands each one to the [`ConversationEngine`]
//! - Executes the returned actions (messages, input registration, ops notes)
//! - Keeps running through transport errors until shutdown

pub mod flow;
pub mod machine;
pub mod messages;
pub mod ops;
pub mod registry;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use tally_core::ChannelAdapter;
use tally_core::types::{OpsLevel, OpsNote, OutboundAction};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use machine::ConversationEngine;
pub use ops::OpsForwarder;
pub use registry::{AuthenticatedSeller, SessionRegistry, SessionState, Step};

/// Pulls events from the channel and runs them through the conversation engine.
pub struct AgentLoop {
    channel: Arc<dyn ChannelAdapter>,
    engine: Arc<ConversationEngine>,
    ops: OpsForwarder,
    /// Pause after a failed receive before polling again.
    backoff: Duration,
}

impl AgentLoop {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        engine: Arc<ConversationEngine>,
        ops: OpsForwarder,
        backoff: Duration,
    ) -> Self {
        Self {
            channel,
            engine,
            ops,
            backoff,
        }
    }

    /// Runs until the cancellation token is triggered.
    ///
    /// Receive errors never end the loop: they are logged, mirrored to the
    /// ops chat, and followed by a pause of `backoff`.
    pub async fn run(&self, cancel: CancellationToken) {
        info!("agent loop running");

        loop {
            tokio::select! {
                event = self.channel.receive() => {
                    match event {
                        Ok(event) => {
                            let actions = self.engine.handle(event).await;
                            self.execute(actions).await;
                        }
                        Err(e) => {
                            error!(error = %e, "channel receive error");
                            self.ops
                                .forward(OpsNote::new(
                                    OpsLevel::Warning,
                                    format!("Error de conexión con el canal: {e}. Reintentando en {}s.", self.backoff.as_secs()),
                                ))
                                .await;
                            tokio::select! {
                                _ = tokio::time::sleep(self.backoff) => {}
                                _ = cancel.cancelled() => break,
                            }
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping agent loop");
                    break;
                }
            }
        }

        info!("agent loop stopped");
    }

    /// Execute the engine's actions in order.
    pub async fn execute(&self, actions: Vec<OutboundAction>) {
        for action in actions {
            match action {
                OutboundAction::Send(msg) => {
                    let session = msg.session_id.clone();
                    if let Err(e) = self.channel.send(msg).await {
                        warn!(session_id = %session, error = %e, "failed to send message");
                        self.ops
                            .forward(OpsNote::new(
                                OpsLevel::Warning,
                                format!("No se pudo enviar un mensaje a {session}: {e}"),
                            ))
                            .await;
                    }
                }
                OutboundAction::RegisterNextInput(session) => {
                    if let Err(e) = self.channel.register_next_input(&session).await {
                        debug!(session_id = %session, error = %e, "failed to register next input");
                    }
                }
                OutboundAction::Ops(note) => self.ops.forward(note).await,
            }
        }
    }
}
