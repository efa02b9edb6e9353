// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The weekly digest broadcast to the sales group.

use chrono::{Datelike, Days, NaiveDate};
use tally_core::types::{SaleLine, Seller};

use crate::totals::{SellerTotals, per_seller};

/// Placeholder for a best product or seller when nothing was sold.
pub const NONE_LABEL: &str = "N/A";

/// Monday and Sunday of the ISO week containing `today`.
pub fn week_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = u64::from(today.weekday().num_days_from_monday());
    let start = today - Days::new(offset);
    (start, start + Days::new(6))
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_quantity: i64,
    pub total_gross: f64,
    /// `sum(quantity * (sale_price - purchase_price))`.
    pub total_margin: f64,
    pub per_seller: Vec<SellerTotals>,
    /// Product with the most units sold, or [`NONE_LABEL`].
    pub best_product: String,
    /// Seller with the highest gross, or [`NONE_LABEL`].
    pub best_seller: String,
}

impl WeeklyReport {
    pub fn build(start: NaiveDate, end: NaiveDate, roster: &[Seller], lines: &[SaleLine]) -> Self {
        let per_seller = per_seller(roster, lines);

        let best_seller = per_seller
            .iter()
            .fold(None::<&SellerTotals>, |best, s| match best {
                Some(b) if s.gross > b.gross => Some(s),
                None if s.gross > 0.0 => Some(s),
                other => other,
            })
            .map_or_else(|| NONE_LABEL.to_string(), |s| s.name.clone());

        Self {
            start,
            end,
            total_quantity: lines.iter().map(|l| l.quantity).sum(),
            total_gross: lines.iter().map(SaleLine::gross).sum(),
            total_margin: lines.iter().map(SaleLine::margin).sum(),
            best_product: best_product(lines),
            best_seller,
            per_seller,
        }
    }
}

/// Ties go to the product seen first.
fn best_product(lines: &[SaleLine]) -> String {
    let mut units: Vec<(&str, i64)> = Vec::new();
    for line in lines {
        match units.iter_mut().find(|(name, _)| *name == line.product_name) {
            Some((_, qty)) => *qty += line.quantity,
            None => units.push((line.product_name.as_str(), line.quantity)),
        }
    }

    let mut best: Option<(&str, i64)> = None;
    for (name, qty) in units {
        if best.is_none_or(|(_, top)| qty > top) {
            best = Some((name, qty));
        }
    }
    best.map_or_else(|| NONE_LABEL.to_string(), |(name, _)| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::types::{Role, SellerId};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn seller(id: i64, name: &str) -> Seller {
        Seller {
            id: SellerId(id),
            username: name.to_lowercase(),
            password: "x".into(),
            display_name: name.into(),
            role: Role::Seller,
        }
    }

    fn line(seller: i64, name: &str, product: &str, qty: i64, price: f64, cost: f64) -> SaleLine {
        SaleLine {
            seller_id: SellerId(seller),
            seller_name: name.into(),
            product_name: product.into(),
            quantity: qty,
            sale_price: price,
            purchase_price: cost,
        }
    }

    #[test]
    fn window_is_monday_to_sunday() {
        // 2026-03-04 is a Wednesday.
        assert_eq!(
            week_window(date("2026-03-04")),
            (date("2026-03-02"), date("2026-03-08"))
        );
        assert_eq!(
            week_window(date("2026-03-02")),
            (date("2026-03-02"), date("2026-03-08"))
        );
        assert_eq!(
            week_window(date("2026-03-08")),
            (date("2026-03-02"), date("2026-03-08"))
        );
    }

    #[test]
    fn empty_week_reports_na() {
        let (start, end) = week_window(date("2026-03-04"));
        let report = WeeklyReport::build(start, end, &[seller(1, "Ana")], &[]);
        assert_eq!(report.total_quantity, 0);
        assert_eq!(report.total_gross, 0.0);
        assert_eq!(report.total_margin, 0.0);
        assert_eq!(report.best_product, NONE_LABEL);
        assert_eq!(report.best_seller, NONE_LABEL);
        assert_eq!(report.per_seller.len(), 1);
    }

    #[test]
    fn totals_and_winners() {
        let roster = vec![seller(1, "Ana"), seller(2, "Luis")];
        let lines = vec![
            line(1, "Ana", "Coffee", 3, 5.0, 2.0),
            line(2, "Luis", "Tea", 5, 2.0, 1.0),
            line(2, "Luis", "Coffee", 1, 5.0, 2.0),
        ];
        let report = WeeklyReport::build(date("2026-03-02"), date("2026-03-08"), &roster, &lines);
        assert_eq!(report.total_quantity, 9);
        assert!((report.total_gross - 30.0).abs() < 1e-10);
        assert!((report.total_margin - 17.0).abs() < 1e-10);
        assert_eq!(report.best_product, "Tea");
        assert_eq!(report.best_seller, "Luis");
    }

    #[test]
    fn ties_go_to_first_encountered() {
        let roster = vec![seller(1, "Ana"), seller(2, "Luis")];
        let lines = vec![
            line(1, "Ana", "Coffee", 2, 5.0, 1.0),
            line(2, "Luis", "Tea", 2, 5.0, 1.0),
        ];
        let report = WeeklyReport::build(date("2026-03-02"), date("2026-03-08"), &roster, &lines);
        assert_eq!(report.best_product, "Coffee");
        assert_eq!(report.best_seller, "Ana");
    }
}
