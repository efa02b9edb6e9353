// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory session registry.
//!
//! One [`SessionState`] per chat, held in a sharded [`DashMap`] so different
//! sessions never contend. Sessions are not persisted; idle ones are evicted
//! by [`SessionRegistry::evict_idle`].

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tally_core::types::{SellerId, SessionId};
use tracing::debug;

use crate::flow::{FieldValue, FlowKind, Pending};

/// Where a session is in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    Unauthenticated,
    AwaitingUsername,
    AwaitingPassword,
    AuthenticatedMenu,
    SelectingProduct,
    AwaitingQuantity,
    ViewingHistory,
    AdminAwaitingPassword,
    AdminMenu,
    /// Collecting field `field` of an admin flow.
    AdminForm { flow: FlowKind, field: usize },
    AdminViewingData,
}

impl Step {
    /// True when the next free-text reply answers this step.
    pub fn awaits_text(self) -> bool {
        matches!(
            self,
            Step::AwaitingUsername
                | Step::AwaitingPassword
                | Step::AwaitingQuantity
                | Step::AdminAwaitingPassword
                | Step::AdminForm { .. }
        )
    }
}

/// The seller a session is logged in as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSeller {
    pub id: SellerId,
    pub username: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub step: Step,
    pub seller: Option<AuthenticatedSeller>,
    pub admin: bool,
    /// Values collected by the current multi-step input.
    pub pending: Pending,
    pub last_seen: Instant,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            step: Step::default(),
            seller: None,
            admin: false,
            pending: Pending::new(),
            last_seen: Instant::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionState>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a session's state.
    pub fn get(&self, id: &SessionId) -> Option<SessionState> {
        self.sessions.get(id).map(|s| s.clone())
    }

    pub fn set(&self, id: SessionId, mut state: SessionState) {
        state.last_seen = Instant::now();
        self.sessions.insert(id, state);
    }

    /// Store one pending value, creating the session if needed.
    pub fn update_field(&self, id: &SessionId, key: &'static str, value: FieldValue) {
        let mut entry = self.sessions.entry(id.clone()).or_default();
        entry.pending.insert(key, value);
        entry.last_seen = Instant::now();
    }

    pub fn clear(&self, id: &SessionId) {
        self.sessions.remove(id);
    }

    /// Sessions currently logged in as a seller.
    pub fn authenticated_sellers(&self) -> Vec<(SessionId, AuthenticatedSeller)> {
        let mut out: Vec<_> = self
            .sessions
            .iter()
            .filter_map(|e| e.seller.clone().map(|s| (e.key().clone(), s)))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Drop sessions idle for longer than `max_idle`. Returns how many went.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.last_seen.elapsed() <= max_idle);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            debug!(evicted, "idle sessions evicted");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
