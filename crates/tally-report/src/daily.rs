// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A seller's sales for one day.

use tally_core::types::SaleLine;

/// Daily figures for one seller.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyReport {
    /// Number of sale rows.
    pub sales_count: usize,
    /// Units sold.
    pub units: i64,
    /// `sum(quantity * sale_price)`.
    pub gross: f64,
    /// `gross * commission_rate`.
    pub personal_share: f64,
    /// The seller's gross as a share of everyone's gross today, in `[0, 100]`.
    pub percentage_of_total: f64,
}

impl DailyReport {
    /// Build the report from the seller's own lines and the day's total gross.
    pub fn build(own: &[SaleLine], total_gross: f64, commission_rate: f64) -> Self {
        let gross: f64 = own.iter().map(SaleLine::gross).sum();
        let units = own.iter().map(|l| l.quantity).sum();
        let percentage_of_total = if total_gross > 0.0 {
            (gross / total_gross * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            sales_count: own.len(),
            units,
            gross,
            personal_share: gross * commission_rate,
            percentage_of_total,
        }
    }
}
