// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for the Tally sales bot.
//!
//! Implements [`ChannelAdapter`] for the Telegram Bot API via teloxide:
//! long polling for messages and inline-button callbacks, and plain-text
//! replies with one inline button per choice.

pub mod handler;

use async_trait::async_trait;
use tally_config::model::TelegramConfig;
use tally_core::types::{AdapterType, HealthStatus, InboundEvent, OutboundMessage, SessionId};
use tally_core::{ChannelAdapter, PluginAdapter, TallyError};
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Telegram channel adapter implementing [`ChannelAdapter`].
pub struct TelegramChannel {
    bot: Bot,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, TallyError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            TallyError::Config("telegram.bot_token is required for Telegram adapter".into())
        })?;

        if token.is_empty() {
            return Err(TallyError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, TallyError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), TallyError> {
        debug!("Telegram channel shutting down");
        if let Some(handle) = &self.polling_handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn connect(&mut self) -> Result<(), TallyError> {
        if self.polling_handle.is_some() {
            return Ok(()); // Already connected
        }

        let bot = self.bot.clone();
        let message_tx = self.inbound_tx.clone();
        let callback_tx = self.inbound_tx.clone();

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = dptree::entry()
                .branch(Update::filter_message().endpoint(move |msg: Message| {
                    let tx = message_tx.clone();
                    async move {
                        if !handler::is_dm(&msg) {
                            debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                            return respond(());
                        }
                        match handler::message_to_event(&msg) {
                            Some(event) => {
                                if tx.send(event).await.is_err() {
                                    warn!("inbound channel closed, dropping message");
                                }
                            }
                            None => debug!(msg_id = msg.id.0, "ignoring non-text message"),
                        }
                        respond(())
                    }
                }))
                .branch(Update::filter_callback_query().endpoint(
                    move |bot: Bot, query: CallbackQuery| {
                        let tx = callback_tx.clone();
                        async move {
                            // Stop the client-side spinner; failures are cosmetic.
                            if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
                                debug!(error = %e, "failed to answer callback query");
                            }
                            if let Some(event) = handler::callback_to_event(&query)
                                && tx.send(event).await.is_err()
                            {
                                warn!("inbound channel closed, dropping selection");
                            }
                            respond(())
                        }
                    },
                ));

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<(), TallyError> {
        let chat_id = chat_id(&msg.session_id)?;
        let request = self.bot.send_message(chat_id, msg.text);
        let result = if msg.choices.is_empty() {
            request.await
        } else {
            request
                .reply_markup(handler::build_keyboard(&msg.choices))
                .await
        };
        result.map(|_| ()).map_err(|e| TallyError::Channel {
            message: format!("failed to send message: {e}"),
            source: Some(Box::new(e)),
        })
    }

    async fn receive(&self) -> Result<InboundEvent, TallyError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| TallyError::Channel {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }

    async fn register_next_input(&self, session_id: &SessionId) -> Result<(), TallyError> {
        // Every private text message is already routed to the engine.
        debug!(session_id = %session_id, "awaiting text reply");
        Ok(())
    }
}

/// Parses a session id back into the Telegram chat id it was built from.
fn chat_id(session: &SessionId) -> Result<ChatId, TallyError> {
    session
        .as_str()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|e| TallyError::Channel {
            message: format!("invalid chat_id '{session}': {e}"),
            source: None,
        })
}
