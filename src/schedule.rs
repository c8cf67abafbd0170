//! Recurring scheduled messages.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::Settings;
use crate::error::Result;
use crate::gateway::{self, endpoints, Gateway};
use crate::store::{ScheduledMessage, Store};

/// How often a scheduled message repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::None => "none",
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
        }
    }

    /// The `n`th run after `anchor`. Monthly runs keep the anchor's day,
    /// clamped to the last day of shorter months.
    fn nth_after(&self, anchor: DateTime<Utc>, n: u32) -> Option<DateTime<Utc>> {
        match self {
            Recurrence::None => None,
            Recurrence::Daily => anchor.checked_add_signed(Duration::days(n.into())),
            Recurrence::Weekly => anchor.checked_add_signed(Duration::weeks(n.into())),
            Recurrence::Monthly => anchor.checked_add_months(Months::new(n)),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "once" => Ok(Recurrence::None),
            "daily" | "diario" | "diária" | "diaria" => Ok(Recurrence::Daily),
            "weekly" | "semanal" => Ok(Recurrence::Weekly),
            "monthly" | "mensal" => Ok(Recurrence::Monthly),
            other => Err(format!("Unknown recurrence: {}", other)),
        }
    }
}

/// First run of the series anchored at `first_run` that is strictly later
/// than `after`.
///
/// Missed periods are skipped rather than replayed. Every run is counted from
/// the anchor, so a series on the 31st lands on the last day of shorter
/// months and returns to the 31st afterwards.
pub fn next_occurrence(
    first_run: DateTime<Utc>,
    recurrence: Recurrence,
    after: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let mut n = 1u32;
    loop {
        let next = recurrence.nth_after(first_run, n)?;
        if next > after {
            return Some(next);
        }
        n = n.checked_add(1)?;
    }
}

/// Counts from one processing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    pub sent: usize,
    pub failed: usize,
    pub finished: usize,
}

/// Send every due message and reschedule it.
pub async fn process_due(store: &Store, settings: &Settings, now: DateTime<Utc>) -> Result<ProcessReport> {
    let due = store.due_schedules(now)?;
    if due.is_empty() {
        return Ok(ProcessReport::default());
    }
    tracing::info!("Processing {} scheduled message(s)", due.len());

    let mut report = ProcessReport::default();
    for scheduled in due {
        let gateway = match store.get_instance(&scheduled.instance_id)? {
            Some(instance) => gateway::for_instance(&instance, &settings.gateway)?,
            None => {
                let error = format!("instance '{}' not found", scheduled.instance_id);
                tracing::warn!("Scheduled message {}: {}", scheduled.id, error);
                store.record_schedule_failure(&scheduled.id, &error)?;
                report.failed += 1;
                continue;
            }
        };

        if deliver(store, gateway, &scheduled, now, &mut report).await? {
            report.sent += 1;
        }
    }

    tracing::info!(
        "Scheduled messages: {} sent, {} failed, {} finished",
        report.sent,
        report.failed,
        report.finished
    );
    Ok(report)
}

/// Send one scheduled message; `Ok(true)` when the gateway accepted it.
pub async fn deliver(
    store: &Store,
    gateway: Arc<dyn Gateway>,
    scheduled: &ScheduledMessage,
    now: DateTime<Utc>,
    report: &mut ProcessReport,
) -> Result<bool> {
    match endpoints::send_text(&scheduled.target, &scheduled.message)
        .run(gateway.as_ref())
        .await
    {
        Ok(_) => {
            let after = scheduled.next_run.max(now);
            let next = next_occurrence(scheduled.first_run, scheduled.recurrence, after);
            if next.is_none() {
                report.finished += 1;
            }
            store.reschedule(&scheduled.id, next)?;
            tracing::debug!("Scheduled message {} sent, next run {:?}", scheduled.id, next);
            Ok(true)
        }
        Err(failure) => {
            tracing::warn!("Scheduled message {} failed: {}", scheduled.id, failure);
            store.record_schedule_failure(&scheduled.id, &failure.last_error)?;
            report.failed += 1;
            Ok(false)
        }
    }
}

/// Run [`process_due`] forever on the configured interval.
pub async fn run_scheduler(store: Store, settings: Settings) {
    let period = std::time::Duration::from_secs(settings.scheduler.interval_secs.max(1));
    let mut interval = tokio::time::interval(period);
    tracing::info!("Scheduler started (every {}s)", period.as_secs());

    loop {
        interval.tick().await;
        if let Err(e) = process_due(&store, &settings, Utc::now()).await {
            tracing::error!("Scheduler pass failed: {}", e);
        }
    }
}
