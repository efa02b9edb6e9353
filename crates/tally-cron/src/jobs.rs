// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reminder, weekly digest and session sweep jobs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tally_agent::{OpsForwarder, SessionRegistry};
use tally_core::types::{OpsLevel, OpsNote, OutboundMessage, SessionId};
use tally_core::{ChannelAdapter, TallyError};
use tally_report::ReportingEngine;
use tally_report::render::{render_reminder, render_weekly};
use tracing::{info, warn};

use crate::scheduler::Job;

/// Sends each logged-in seller a summary of their day so far.
pub struct ReminderJob {
    registry: Arc<SessionRegistry>,
    reports: ReportingEngine,
    channel: Arc<dyn ChannelAdapter>,
}

impl ReminderJob {
    pub fn new(
        registry: Arc<SessionRegistry>,
        reports: ReportingEngine,
        channel: Arc<dyn ChannelAdapter>,
    ) -> Self {
        Self {
            registry,
            reports,
            channel,
        }
    }

    /// Send reminders with totals for `today`. Returns how many were delivered.
    pub async fn run_on(&self, today: NaiveDate) -> Result<usize, TallyError> {
        let mut delivered = 0;
        for (session, seller) in self.registry.authenticated_sellers() {
            let report = match self.reports.daily(seller.id, today).await {
                Ok(report) => report,
                Err(e) => {
                    warn!(
                        session_id = %session,
                        seller_id = seller.id.0,
                        error = %e,
                        "failed to build reminder"
                    );
                    continue;
                }
            };
            let msg = OutboundMessage::text(
                session.clone(),
                render_reminder(&seller.display_name, &report),
            );
            match self.channel.send(msg).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(session_id = %session, error = %e, "failed to send reminder"),
            }
        }
        info!(delivered, "sales reminders sent");
        Ok(delivered)
    }
}

#[async_trait]
impl Job for ReminderJob {
    fn name(&self) -> &str {
        "sales-reminder"
    }

    async fn run(&self) -> Result<(), TallyError> {
        self.run_on(Local::now().date_naive()).await.map(|_| ())
    }
}

/// Broadcasts the weekly digest to the sales group.
pub struct WeeklyDigestJob {
    reports: ReportingEngine,
    channel: Arc<dyn ChannelAdapter>,
    group: SessionId,
    ops: OpsForwarder,
}

impl WeeklyDigestJob {
    pub fn new(
        reports: ReportingEngine,
        channel: Arc<dyn ChannelAdapter>,
        group: SessionId,
        ops: OpsForwarder,
    ) -> Self {
        Self {
            reports,
            channel,
            group,
            ops,
        }
    }

    /// Build and send the digest for the week containing `today`.
    pub async fn run_on(&self, today: NaiveDate) -> Result<(), TallyError> {
        let report = match self.reports.weekly(today).await {
            Ok(report) => report,
            Err(e) => {
                self.ops
                    .forward(OpsNote::new(
                        OpsLevel::Error,
                        format!("Error al generar el resumen semanal: {e}"),
                    ))
                    .await;
                return Err(e);
            }
        };

        let msg = OutboundMessage::text(self.group.clone(), render_weekly(&report));
        match self.channel.send(msg).await {
            Ok(()) => {
                self.ops
                    .forward(OpsNote::new(
                        OpsLevel::Info,
                        "Resumen semanal enviado al grupo.",
                    ))
                    .await;
                Ok(())
            }
            Err(e) => {
                self.ops
                    .forward(OpsNote::new(
                        OpsLevel::Error,
                        format!("Error al enviar resumen semanal al grupo: {e}"),
                    ))
                    .await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl Job for WeeklyDigestJob {
    fn name(&self) -> &str {
        "weekly-digest"
    }

    async fn run(&self) -> Result<(), TallyError> {
        self.run_on(Local::now().date_naive()).await
    }
}

/// Evicts sessions idle for longer than `max_idle`.
pub struct SessionSweepJob {
    registry: Arc<SessionRegistry>,
    max_idle: Duration,
}

impl SessionSweepJob {
    pub fn new(registry: Arc<SessionRegistry>, max_idle: Duration) -> Self {
        Self { registry, max_idle }
    }
}

#[async_trait]
impl Job for SessionSweepJob {
    fn name(&self) -> &str {
        "session-sweep"
    }

    async fn run(&self) -> Result<(), TallyError> {
        let evicted = self.registry.evict_idle(self.max_idle);
        if evicted > 0 {
            info!(evicted, remaining = self.registry.len(), "idle sessions evicted");
        }
        Ok(())
    }
}
