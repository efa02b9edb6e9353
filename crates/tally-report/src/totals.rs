// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-seller aggregation shared by the weekly digest and the admin snapshot.

use tally_core::types::{SaleLine, Seller};

/// Units and revenue of one seller over a report window.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerTotals {
    pub name: String,
    pub quantity: i64,
    pub gross: f64,
}

/// Totals for every seller in `roster`, in roster order.
///
/// Sellers without sales appear with zero totals. Lines whose seller is
/// missing from the roster are appended in first-seen order.
pub fn per_seller(roster: &[Seller], lines: &[SaleLine]) -> Vec<SellerTotals> {
    let mut ids: Vec<i64> = roster.iter().map(|s| s.id.0).collect();
    let mut totals: Vec<SellerTotals> = roster
        .iter()
        .map(|s| SellerTotals {
            name: s.display_name.clone(),
            quantity: 0,
            gross: 0.0,
        })
        .collect();

    for line in lines {
        let idx = match ids.iter().position(|id| *id == line.seller_id.0) {
            Some(idx) => idx,
            None => {
                ids.push(line.seller_id.0);
                totals.push(SellerTotals {
                    name: line.seller_name.clone(),
                    quantity: 0,
                    gross: 0.0,
                });
                totals.len() - 1
            }
        };
        totals[idx].quantity += line.quantity;
        totals[idx].gross += line.gross();
    }
    totals
}
