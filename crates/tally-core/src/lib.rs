// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tally sales bot.
//!
//! Provides the error type, the ledger and transport traits, and the domain
//! and event types used throughout the workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TallyError;
pub use types::{AdapterType, HealthStatus, ProductId, SaleId, SellerId, SessionId};

pub use traits::{ChannelAdapter, LedgerStore, PluginAdapter};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::types::{OpsLevel, OpsNote, Role, SaleLine, Seller};

    #[test]
    fn user_recoverable_errors() {
        assert!(TallyError::Validation("bad".into()).is_user_recoverable());
        assert!(
            TallyError::NotFound {
                entity: "product",
                key: "Tea".into()
            }
            .is_user_recoverable()
        );
        assert!(
            TallyError::Conflict {
                entity: "seller",
                key: "ana".into()
            }
            .is_user_recoverable()
        );
        assert!(
            !TallyError::Integrity {
                message: "rolled back".into()
            }
            .is_user_recoverable()
        );
        assert!(
            !TallyError::Storage {
                source: Box::new(std::io::Error::other("disk")),
            }
            .is_user_recoverable()
        );
    }

    #[test]
    fn conflict_error_message_names_entity_and_key() {
        let err = TallyError::Conflict {
            entity: "product",
            key: "Tea".into(),
        };
        assert_eq!(err.to_string(), "product already exists: Tea");
    }

    #[test]
    fn role_round_trips_lowercase() {
        assert_eq!(Role::Seller.to_string(), "seller");
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::default(), Role::Seller);
    }

    #[test]
    fn adapter_type_display_and_parse() {
        for variant in [AdapterType::Channel, AdapterType::Storage, AdapterType::Monitor] {
            let parsed = AdapterType::from_str(&variant.to_string()).unwrap();
            assert_eq!(parsed, variant);
        }
    }

    #[test]
    fn sale_line_gross_and_margin() {
        let line = SaleLine {
            seller_id: SellerId(1),
            seller_name: "Ana".into(),
            product_name: "Coffee".into(),
            quantity: 3,
            sale_price: 5.0,
            purchase_price: 2.0,
        };
        assert!((line.gross() - 15.0).abs() < 1e-9);
        assert!((line.margin() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn seller_debug_redacts_password() {
        let seller = Seller {
            id: SellerId(7),
            username: "ana".into(),
            password: "1234".into(),
            display_name: "Ana".into(),
            role: Role::Seller,
        };
        let debug = format!("{seller:?}");
        assert!(debug.contains("[redacted]"));
        assert!(!debug.contains("1234"));
    }

    #[test]
    fn ops_note_formatting() {
        let note = OpsNote::new(OpsLevel::Warning, "failed login");
        assert_eq!(note.formatted(), "[WARNING] failed login");
    }

    #[test]
    fn session_id_from_chat_id() {
        assert_eq!(SessionId::from(-100123).as_str(), "-100123");
    }
}
