// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled jobs for the Tally sales bot.
//!
//! A [`Scheduler`] runs each registered [`Job`] on its own tokio task, either
//! at a fixed interval or weekly at a local wall-clock time. Job failures are
//! logged and never end the task; only the shutdown token does.
//!
//! Jobs: sales reminders to logged-in sellers, the weekly digest for the sales
//! group, the uptime monitor check, and idle-session eviction.

pub mod jobs;
pub mod monitor;
pub mod schedule;
pub mod scheduler;

pub use jobs::{ReminderJob, SessionSweepJob, WeeklyDigestJob};
pub use monitor::{MonitorJob, MonitorStatus, UptimeMonitor};
pub use schedule::Schedule;
pub use scheduler::{Job, Scheduler};
