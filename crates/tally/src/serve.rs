// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tally serve` command implementation.
//!
//! Opens the SQLite ledger, connects the Telegram channel, spawns the
//! scheduled jobs and runs the agent loop until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tally_agent::{AgentLoop, ConversationEngine, OpsForwarder, SessionRegistry, shutdown};
use tally_config::TallyConfig;
use tally_core::types::{OpsLevel, OpsNote, SessionId};
use tally_core::{ChannelAdapter, HealthStatus, LedgerStore, PluginAdapter, TallyError};
use tally_cron::{
    MonitorJob, ReminderJob, Schedule, Scheduler, SessionSweepJob, UptimeMonitor, WeeklyDigestJob,
};
use tally_report::ReportingEngine;
use tally_storage::SqliteLedger;
use tally_telegram::TelegramChannel;
use tracing::{info, warn};

/// Runs the `tally serve` command.
pub async fn run_serve(config: TallyConfig) -> Result<(), TallyError> {
    init_tracing(&config.bot.log_level);

    info!(name = %config.bot.name, "starting tally serve");

    let ledger = Arc::new(SqliteLedger::new(config.storage.clone()));
    ledger.initialize().await?;
    match ledger.health_check().await? {
        HealthStatus::Healthy => info!(path = %config.storage.database_path, "ledger ready"),
        other => warn!(status = ?other, "ledger reported degraded health"),
    }
    let store: Arc<dyn LedgerStore> = ledger.clone();

    let mut telegram = TelegramChannel::new(&config.telegram)?;
    telegram.connect().await?;
    let channel: Arc<dyn ChannelAdapter> = Arc::new(telegram);

    let admin_password = config
        .admin
        .password
        .clone()
        .ok_or_else(|| TallyError::Config("admin.password is required".into()))?;
    let group = config
        .telegram
        .group_chat_id
        .map(SessionId::from)
        .ok_or_else(|| TallyError::Config("telegram.group_chat_id is required".into()))?;

    let registry = Arc::new(SessionRegistry::new());
    let reports = ReportingEngine::new(store.clone(), config.bot.commission_rate);
    let engine = Arc::new(ConversationEngine::new(
        registry.clone(),
        store,
        reports.clone(),
        admin_password,
    ));
    let ops = OpsForwarder::new(
        channel.clone(),
        config.telegram.ops_chat_id.map(SessionId::from),
    );

    let cancel = shutdown::install_signal_handler();

    let mut scheduler = Scheduler::new();
    scheduler
        .add(
            Schedule::every_minutes(config.schedule.reminder_interval_mins),
            Arc::new(ReminderJob::new(
                registry.clone(),
                reports.clone(),
                channel.clone(),
            )),
        )
        .add(
            Schedule::weekly_digest(&config.schedule)?,
            Arc::new(WeeklyDigestJob::new(
                reports,
                channel.clone(),
                group,
                ops.clone(),
            )),
        )
        .add(
            // Sweep at a tenth of the idle timeout, at least once a minute.
            Schedule::Every(Duration::from_secs(
                (config.bot.session_idle_timeout_secs / 10).clamp(1, 60),
            )),
            Arc::new(SessionSweepJob::new(
                registry,
                Duration::from_secs(config.bot.session_idle_timeout_secs),
            )),
        );
    if config.monitor.enabled {
        scheduler.add(
            Schedule::every_minutes(config.schedule.health_interval_mins),
            Arc::new(MonitorJob::new(
                UptimeMonitor::new(&config.monitor)?,
                ops.clone(),
            )),
        );
    }
    info!(jobs = scheduler.len(), "scheduled jobs configured");
    let job_handles = scheduler.spawn(cancel.clone());

    ops.forward(OpsNote::new(OpsLevel::Info, "Bot iniciado.")).await;

    let agent_loop = AgentLoop::new(
        channel.clone(),
        engine,
        ops,
        Duration::from_secs(config.bot.backoff_secs),
    );
    agent_loop.run(cancel).await;

    for handle in job_handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "scheduled job task ended abnormally");
        }
    }
    if let Err(e) = channel.shutdown().await {
        warn!(error = %e, "channel shutdown failed");
    }
    ledger.close().await?;

    info!("tally serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tally={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
