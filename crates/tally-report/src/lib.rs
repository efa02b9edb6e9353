// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sales reporting for the Tally sales bot.
//!
//! This crate provides:
//! - **Daily report**: a seller's sales, commission and share of the day's revenue
//! - **Weekly digest**: ISO-week totals, margin, best product and best seller
//! - **Admin snapshot**: today's per-seller figures with grand totals
//! - **Rendering**: plain-text Spanish messages for all of the above

pub mod daily;
pub mod engine;
pub mod render;
pub mod snapshot;
pub mod totals;
pub mod weekly;

pub use daily::DailyReport;
pub use engine::ReportingEngine;
pub use snapshot::AdminSnapshot;
pub use totals::SellerTotals;
pub use weekly::{NONE_LABEL, WeeklyReport, week_window};
