// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Today's figures for the administrator panel.

use tally_core::types::{SaleLine, Seller};

use crate::totals::{SellerTotals, per_seller};

/// Per-seller daily units and gross with grand totals. Always computed fresh.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminSnapshot {
    pub per_seller: Vec<SellerTotals>,
    pub total_quantity: i64,
    pub total_gross: f64,
}

impl AdminSnapshot {
    pub fn build(roster: &[Seller], lines: &[SaleLine]) -> Self {
        let per_seller = per_seller(roster, lines);
        Self {
            total_quantity: per_seller.iter().map(|s| s.quantity).sum(),
            total_gross: per_seller.iter().map(|s| s.gross).sum(),
            per_seller,
        }
    }
}
