// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain and transport types shared across the Tally workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a chat session (the transport's chat id, as a string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for SessionId {
    fn from(chat_id: i64) -> Self {
        SessionId(chat_id.to_string())
    }
}

/// Row id of a seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SellerId(pub i64);

/// Row id of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub i64);

/// Row id of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaleId(pub i64);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
    Monitor,
}

/// Role stored on a seller row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Seller,
    Admin,
}

// --- Ledger entities ---

/// A registered seller.
#[derive(Clone, PartialEq)]
pub struct Seller {
    pub id: SellerId,
    pub username: String,
    /// Stored as entered by the administrator and compared exactly.
    pub password: String,
    pub display_name: String,
    pub role: Role,
}

impl std::fmt::Debug for Seller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Seller")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .finish()
    }
}

/// A catalog product with its current stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub purchase_price: f64,
    pub sale_price: f64,
    pub inventory_count: i64,
}

/// The subset of a product shown in selection menus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductListing {
    pub id: ProductId,
    pub name: String,
    pub sale_price: f64,
}

/// One sale joined with its product prices and seller name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    pub seller_id: SellerId,
    pub seller_name: String,
    pub product_name: String,
    pub quantity: i64,
    pub sale_price: f64,
    pub purchase_price: f64,
}

impl SaleLine {
    /// Revenue of this line: `quantity * sale_price`.
    pub fn gross(&self) -> f64 {
        self.quantity as f64 * self.sale_price
    }

    /// Margin of this line: `quantity * (sale_price - purchase_price)`.
    pub fn margin(&self) -> f64 {
        self.quantity as f64 * (self.sale_price - self.purchase_price)
    }
}

/// Stock level of a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub product_name: String,
    pub inventory_count: i64,
}

// --- Transport types ---

/// What the user did in the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A slash command without the leading `/`, e.g. `start`.
    Command(String),
    /// Free text typed while a step awaits input.
    TextReply(String),
    /// A button press carrying an opaque token, e.g. `product_42`.
    Selection(String),
}

/// An inbound event received from a channel adapter.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub session_id: SessionId,
    /// Transport-level identity of the sender (for logs only).
    pub sender_id: String,
    pub kind: EventKind,
    /// RFC 3339 receive time.
    pub timestamp: String,
}

impl InboundEvent {
    pub fn new(session_id: SessionId, sender_id: impl Into<String>, kind: EventKind) -> Self {
        Self {
            session_id,
            sender_id: sender_id.into(),
            kind,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A labelled button attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub token: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// A message to be delivered by a channel adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Chat the message goes to (a session or a broadcast group).
    pub session_id: SessionId,
    pub text: String,
    /// Buttons, one per row, in display order.
    pub choices: Vec<Choice>,
}

impl OutboundMessage {
    pub fn text(session_id: SessionId, text: impl Into<String>) -> Self {
        Self {
            session_id,
            text: text.into(),
            choices: Vec::new(),
        }
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }
}

/// Severity of a note mirrored to the operations chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum OpsLevel {
    Info,
    Warning,
    Error,
}

/// An operational note destined for the operations chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpsNote {
    pub level: OpsLevel,
    pub text: String,
}

impl OpsNote {
    pub fn new(level: OpsLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    /// `[LEVEL] text`, the format used in the operations chat.
    pub fn formatted(&self) -> String {
        format!("[{}] {}", self.level, self.text)
    }
}

/// An effect produced by the conversation engine, executed by the agent loop.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundAction {
    Send(OutboundMessage),
    /// The next free-text reply from this session answers the pending step.
    RegisterNextInput(SessionId),
    Ops(OpsNote),
}
