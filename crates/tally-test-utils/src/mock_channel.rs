// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound events
//! (or receive errors) and captures outbound messages and input registrations
//! for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use tally_core::types::{AdapterType, HealthStatus, InboundEvent, OutboundMessage, SessionId};
use tally_core::{ChannelAdapter, PluginAdapter, TallyError};

/// A mock messaging channel for testing.
///
/// Provides three queues:
/// - **inbound**: Events injected via `inject()` or `inject_error()` are returned by `receive()`
/// - **sent**: Messages passed to `send()` are captured and retrievable via `sent_messages()`
/// - **registered**: Sessions passed to `register_next_input()`
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<Result<InboundEvent, TallyError>>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    registered: Arc<Mutex<Vec<SessionId>>>,
    fail_sends: AtomicBool,
    notify: Arc<Notify>,
}

impl MockChannel {
    /// Create a new mock channel with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            registered: Arc::new(Mutex::new(Vec::new())),
            fail_sends: AtomicBool::new(false),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Queue an inbound event; the next `receive()` returns it.
    pub async fn inject(&self, event: InboundEvent) {
        self.inbound.lock().await.push_back(Ok(event));
        self.notify.notify_one();
    }

    /// Queue a receive failure.
    pub async fn inject_error(&self, error: TallyError) {
        self.inbound.lock().await.push_back(Err(error));
        self.notify.notify_one();
    }

    /// Make every subsequent `send()` fail.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Get all messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Messages sent to one chat.
    pub async fn sent_to(&self, session: &SessionId) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| &m.session_id == session)
            .cloned()
            .collect()
    }

    /// Get the count of sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Clear all sent messages.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    /// Sessions registered for a follow-up text reply, in call order.
    pub async fn registered(&self) -> Vec<SessionId> {
        self.registered.lock().await.clone()
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, TallyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TallyError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), TallyError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<(), TallyError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TallyError::Channel {
                message: "mock send failure".into(),
                source: None,
            });
        }
        self.sent.lock().await.push(msg);
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, TallyError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(item) = queue.pop_front() {
                    return item;
                }
            }
            self.notify.notified().await;
        }
    }

    async fn register_next_input(&self, session_id: &SessionId) -> Result<(), TallyError> {
        self.registered.lock().await.push(session_id.clone());
        Ok(())
    }
}
