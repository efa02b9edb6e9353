// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store-backed report assembly.

use std::sync::Arc;

use chrono::NaiveDate;
use tally_core::types::{InventoryLevel, SellerId};
use tally_core::{LedgerStore, TallyError};
use tracing::debug;

use crate::daily::DailyReport;
use crate::snapshot::AdminSnapshot;
use crate::weekly::{WeeklyReport, week_window};

/// Reads the ledger and builds reports. Nothing is cached.
#[derive(Clone)]
pub struct ReportingEngine {
    store: Arc<dyn LedgerStore>,
    commission_rate: f64,
}

impl ReportingEngine {
    pub fn new(store: Arc<dyn LedgerStore>, commission_rate: f64) -> Self {
        Self {
            store,
            commission_rate,
        }
    }

    pub fn commission_rate(&self) -> f64 {
        self.commission_rate
    }

    /// Daily report for `seller` on `date`, relative to all sellers' gross that day.
    pub async fn daily(&self, seller: SellerId, date: NaiveDate) -> Result<DailyReport, TallyError> {
        let all = self.store.daily_sales_for_seller(None, date).await?;
        let total_gross: f64 = all.iter().map(|l| l.gross()).sum();
        let own: Vec<_> = all.into_iter().filter(|l| l.seller_id == seller).collect();
        debug!(seller_id = seller.0, %date, lines = own.len(), "daily report built");
        Ok(DailyReport::build(&own, total_gross, self.commission_rate))
    }

    /// Weekly digest for the ISO week containing `today`.
    pub async fn weekly(&self, today: NaiveDate) -> Result<WeeklyReport, TallyError> {
        let (start, end) = week_window(today);
        let roster = self.store.list_sellers().await?;
        let lines = self.store.weekly_sales_for_seller(None, start, end).await?;
        debug!(%start, %end, lines = lines.len(), "weekly report built");
        Ok(WeeklyReport::build(start, end, &roster, &lines))
    }

    /// Administrator snapshot for `date`.
    pub async fn admin_snapshot(&self, date: NaiveDate) -> Result<AdminSnapshot, TallyError> {
        let roster = self.store.list_sellers().await?;
        let lines = self.store.daily_sales_for_seller(None, date).await?;
        Ok(AdminSnapshot::build(&roster, &lines))
    }

    pub async fn inventory(&self) -> Result<Vec<InventoryLevel>, TallyError> {
        self.store.inventory_snapshot().await
    }
}
