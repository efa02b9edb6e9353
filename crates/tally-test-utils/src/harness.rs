// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end conversation testing.
//!
//! `TestHarness` assembles the ledger, session registry, reporting engine and
//! conversation engine on a temp SQLite database, seeded with the sellers and
//! products the builder was given.

use std::sync::Arc;
use std::time::Duration;

use tally_agent::{AgentLoop, ConversationEngine, OpsForwarder, SessionRegistry, Step};
use tally_config::model::StorageConfig;
use tally_core::types::{EventKind, InboundEvent, OutboundAction, OutboundMessage, SessionId};
use tally_core::{ChannelAdapter, LedgerStore, TallyError};
use tally_report::ReportingEngine;
use tally_storage::SqliteLedger;

use crate::mock_channel::MockChannel;

/// Admin password used when the builder is not given one.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin-secret";

/// Build an inbound event from chat `session`.
pub fn event(session: i64, kind: EventKind) -> InboundEvent {
    InboundEvent::new(SessionId::from(session), session.to_string(), kind)
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    sellers: Vec<(String, String, String)>,
    products: Vec<(String, f64, f64, i64)>,
    admin_password: String,
    commission_rate: f64,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            sellers: Vec::new(),
            products: Vec::new(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            commission_rate: 0.20,
        }
    }

    /// Seed a seller.
    pub fn with_seller(mut self, username: &str, password: &str, display_name: &str) -> Self {
        self.sellers
            .push((username.into(), password.into(), display_name.into()));
        self
    }

    /// Seed a product.
    pub fn with_product(mut self, name: &str, purchase: f64, sale: f64, inventory: i64) -> Self {
        self.products.push((name.into(), purchase, sale, inventory));
        self
    }

    pub fn with_admin_password(mut self, password: &str) -> Self {
        self.admin_password = password.into();
        self
    }

    pub fn with_commission_rate(mut self, rate: f64) -> Self {
        self.commission_rate = rate;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, TallyError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| TallyError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let store = Arc::new(SqliteLedger::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        }));
        store.initialize().await?;

        for (username, password, display_name) in &self.sellers {
            store.create_seller(username, password, display_name).await?;
        }
        for (name, purchase, sale, inventory) in &self.products {
            store.create_product(name, *purchase, *sale, *inventory).await?;
        }

        let ledger: Arc<dyn LedgerStore> = store.clone();
        let registry = Arc::new(SessionRegistry::new());
        let reports = ReportingEngine::new(ledger.clone(), self.commission_rate);
        let engine = Arc::new(ConversationEngine::new(
            registry.clone(),
            ledger,
            reports.clone(),
            self.admin_password,
        ));

        Ok(TestHarness {
            mock_channel: Arc::new(MockChannel::new()),
            store,
            registry,
            reports,
            engine,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock channel and temp storage.
pub struct TestHarness {
    /// The mock channel adapter.
    pub mock_channel: Arc<MockChannel>,
    /// SQLite ledger (temp DB, cleaned up on drop).
    pub store: Arc<SqliteLedger>,
    pub registry: Arc<SessionRegistry>,
    pub reports: ReportingEngine,
    pub engine: Arc<ConversationEngine>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Run one event from chat `session` through the conversation engine.
    pub async fn send(&self, session: i64, kind: EventKind) -> Vec<OutboundAction> {
        self.engine.handle(event(session, kind)).await
    }

    pub async fn command(&self, session: i64, name: &str) -> Vec<OutboundAction> {
        self.send(session, EventKind::Command(name.into())).await
    }

    pub async fn text(&self, session: i64, text: &str) -> Vec<OutboundAction> {
        self.send(session, EventKind::TextReply(text.into())).await
    }

    pub async fn select(&self, session: i64, token: &str) -> Vec<OutboundAction> {
        self.send(session, EventKind::Selection(token.into())).await
    }

    /// `/start`, username and password in one go.
    pub async fn login(&self, session: i64, username: &str, password: &str) -> Vec<OutboundAction> {
        self.command(session, "start").await;
        self.text(session, username).await;
        self.text(session, password).await
    }

    /// `/admin` followed by the admin password.
    pub async fn unlock_admin(&self, session: i64, password: &str) -> Vec<OutboundAction> {
        self.command(session, "admin").await;
        self.text(session, password).await
    }

    /// Current step of chat `session`, if it has a live session.
    pub fn step(&self, session: i64) -> Option<Step> {
        self.registry.get(&SessionId::from(session)).map(|s| s.step)
    }

    /// An agent loop reading from the mock channel.
    pub fn agent_loop(&self, ops_chat: Option<i64>, backoff: Duration) -> AgentLoop {
        let channel: Arc<dyn ChannelAdapter> = self.mock_channel.clone();
        let ops = OpsForwarder::new(channel.clone(), ops_chat.map(SessionId::from));
        AgentLoop::new(channel, self.engine.clone(), ops, backoff)
    }
}

/// The outbound messages among `actions`.
pub fn messages(actions: &[OutboundAction]) -> Vec<&OutboundMessage> {
    actions
        .iter()
        .filter_map(|a| match a {
            OutboundAction::Send(m) => Some(m),
            _ => None,
        })
        .collect()
}
