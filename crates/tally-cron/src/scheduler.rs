// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use tally_core::TallyError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::schedule::Schedule;

/// A unit of scheduled work.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn run(&self) -> Result<(), TallyError>;
}

/// Registered jobs, each spawned on its own task.
#[derive(Default)]
pub struct Scheduler {
    entries: Vec<(Schedule, Arc<dyn Job>)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, schedule: Schedule, job: Arc<dyn Job>) -> &mut Self {
        self.entries.push((schedule, job));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawn every job. Tasks end when `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        self.entries
            .into_iter()
            .map(|(schedule, job)| tokio::spawn(run_job(schedule, job, cancel.clone())))
            .collect()
    }
}

async fn run_job(schedule: Schedule, job: Arc<dyn Job>, cancel: CancellationToken) {
    info!(job = job.name(), schedule = ?schedule, "scheduled job started");

    match schedule {
        Schedule::Every(period) => {
            let mut interval = tokio::time::interval(period.max(std::time::Duration::from_millis(1)));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Skip the first immediate tick.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => execute(job.as_ref()).await,
                    _ = cancel.cancelled() => break,
                }
            }
        }
        Schedule::WeeklyAt { .. } => loop {
            let delay = schedule.delay_from(Local::now().naive_local());
            debug!(job = job.name(), delay_secs = delay.as_secs(), "next weekly run scheduled");
            tokio::select! {
                _ = tokio::time::sleep(delay) => execute(job.as_ref()).await,
                _ = cancel.cancelled() => break,
            }
        },
    }

    info!(job = job.name(), "scheduled job shutting down");
}

async fn execute(job: &dyn Job) {
    match job.run().await {
        Ok(()) => debug!(job = job.name(), "scheduled job completed"),
        Err(e) => warn!(job = job.name(), error = %e, "scheduled job failed (non-fatal)"),
    }
}
