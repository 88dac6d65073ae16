//! Scheduler for cron-based job execution
//!
//! Manages the recurring jobs with support for:
//! - Cron expression parsing
//! - Timezone-aware scheduling
//! - Sleep/wake detection via time-jump polling
//! - Missed job handling (runs if within grace period)
//!
//! The loop also drains due one-shot reminders every tick, so hour-before
//! task reminders fire on the minute they were addressed to.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use tokio::sync::mpsc;

use crate::db::JarvisDb;
use crate::error::ExecutionError;
use crate::notify::Notifier;
use crate::reminders;
use crate::state::AppState;
use crate::types::{ExecutionTrigger, JobId, ScheduleEntry};

/// Grace period for missed jobs (2 hours)
const MISSED_JOB_GRACE_PERIOD_SECS: i64 = 7200;

/// Extended grace period for the income check (24 hours) — the payday match
/// and the atomic insert make a late run either a correct post or a no-op
const MISSED_INCOME_JOB_GRACE_PERIOD_SECS: i64 = 86400;

/// Time jump threshold to detect sleep/wake (5 minutes)
const TIME_JUMP_THRESHOLD_SECS: i64 = 300;

/// Poll interval for scheduler loop (1 minute)
const POLL_INTERVAL_SECS: u64 = 60;

/// Message sent to trigger job execution
#[derive(Debug, Clone)]
pub struct SchedulerMessage {
    pub job: JobId,
    pub trigger: ExecutionTrigger,
}

/// Scheduler for managing job execution times
pub struct Scheduler {
    state: Arc<AppState>,
    sender: mpsc::Sender<SchedulerMessage>,
}

impl Scheduler {
    pub fn new(state: Arc<AppState>, sender: mpsc::Sender<SchedulerMessage>) -> Self {
        Self { state, sender }
    }

    /// Start the scheduler loop
    ///
    /// This runs indefinitely, checking for due jobs every minute.
    /// It also handles sleep/wake detection.
    pub async fn run(&self) {
        let mut last_check = Utc::now();

        loop {
            tokio::time::sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;

            let now = Utc::now();

            // Detect sleep: time jumped more than 5 minutes
            let time_jump = (now - last_check).num_seconds();
            if time_jump > TIME_JUMP_THRESHOLD_SECS {
                log::info!(
                    "Detected system wake (time jumped {} seconds), checking for missed jobs",
                    time_jump
                );
                self.check_missed_jobs(now).await;
            }

            // Check and run due jobs
            self.check_and_run_due_jobs(now).await;

            // Drain one-shot reminders whose fire minute has passed
            self.dispatch_due_reminders(now).await;

            last_check = now;
        }
    }

    /// Send every due hour-before reminder and mark it sent.
    async fn dispatch_due_reminders(&self, now: DateTime<Utc>) {
        let tz = self.state.service_tz();
        let now_local = now.with_timezone(&tz).naive_local();

        let db = match JarvisDb::open() {
            Ok(db) => db,
            Err(e) => {
                log::warn!("Failed to open DB for reminder dispatch: {}", e);
                return;
            }
        };

        let notifier = Notifier::new(&self.state.config().push.base_url);
        reminders::dispatch_due_reminders(&db, &notifier, now_local).await;
    }

    /// Check for jobs that should run now
    async fn check_and_run_due_jobs(&self, now: DateTime<Utc>) {
        let config = self.state.config();

        for (entry, job) in [
            (&config.schedules.morning, JobId::Morning),
            (&config.schedules.evening, JobId::Evening),
            (&config.schedules.income, JobId::IncomeCheck),
        ] {
            if !entry.enabled {
                continue;
            }
            if let Ok(true) = self.should_run_now(entry, job, now) {
                self.trigger_job(job, ExecutionTrigger::Scheduled).await;
            }
        }
    }

    /// Check if a job should run at the given time
    fn should_run_now(
        &self,
        entry: &ScheduleEntry,
        job: JobId,
        now: DateTime<Utc>,
    ) -> Result<bool, ExecutionError> {
        let schedule = parse_cron(&entry.cron)?;
        let tz: Tz = entry.timezone.parse().map_err(|_| {
            ExecutionError::ConfigurationError(format!("Invalid timezone: {}", entry.timezone))
        })?;

        // Convert now to the configured timezone
        let now_local = now.with_timezone(&tz);

        // Get the last scheduled run time
        let last_run = self.state.get_last_scheduled_run(job);

        // Find the most recent scheduled time that's <= now
        let mut scheduled_times = schedule.after(&(now_local - chrono::Duration::minutes(2)));

        if let Some(next_time) = scheduled_times.next() {
            // Check if this minute matches
            let next_utc = next_time.with_timezone(&Utc);
            let diff = (now - next_utc).num_seconds().abs();

            // Within 2 minutes of scheduled time (wider window for sleep/wake)
            if diff < 120 {
                // Check if we already ran this scheduled time
                if let Some(last) = last_run {
                    if (last - next_utc).num_seconds().abs() < 60 {
                        return Ok(false); // Already ran
                    }
                }
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Check for jobs that were missed during sleep
    async fn check_missed_jobs(&self, now: DateTime<Utc>) {
        let config = self.state.config();

        for (entry, job) in [
            (&config.schedules.morning, JobId::Morning),
            (&config.schedules.evening, JobId::Evening),
            (&config.schedules.income, JobId::IncomeCheck),
        ] {
            if !entry.enabled {
                continue;
            }
            if let Ok(Some(_)) = self.find_missed_job(entry, job, now) {
                log::info!("Found missed '{}' job, running now", job);
                self.trigger_job(job, ExecutionTrigger::Missed).await;
            }
        }
    }

    /// Find a missed job within the grace period.
    /// The income check uses an extended 24-hour grace period; its own
    /// payday/idempotency checks keep a same-day catch-up safe.
    fn find_missed_job(
        &self,
        entry: &ScheduleEntry,
        job: JobId,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, ExecutionError> {
        let schedule = parse_cron(&entry.cron)?;
        let tz: Tz = entry.timezone.parse().map_err(|_| {
            ExecutionError::ConfigurationError(format!("Invalid timezone: {}", entry.timezone))
        })?;

        let now_local = now.with_timezone(&tz);
        let grace_secs = match job {
            JobId::IncomeCheck => MISSED_INCOME_JOB_GRACE_PERIOD_SECS,
            _ => MISSED_JOB_GRACE_PERIOD_SECS,
        };
        let grace_period = chrono::Duration::seconds(grace_secs);
        let grace_start = now_local - grace_period;

        // Get last run time
        let last_run = self.state.get_last_scheduled_run(job);

        // Look for scheduled times in the grace period
        let iter = schedule.after(&grace_start);

        for scheduled in iter {
            let scheduled_utc = scheduled.with_timezone(&Utc);

            // Stop if we've passed now
            if scheduled_utc > now {
                break;
            }

            // Check if this was missed
            if let Some(last) = last_run {
                if last >= scheduled_utc {
                    continue; // Already ran
                }
            }

            // Found a missed job
            return Ok(Some(scheduled_utc));
        }

        Ok(None)
    }

    /// Trigger a job execution
    async fn trigger_job(&self, job: JobId, trigger: ExecutionTrigger) {
        if self
            .sender
            .send(SchedulerMessage { job, trigger })
            .await
            .is_err()
        {
            log::error!("Failed to send scheduler message for {:?}", job);
        }
    }
}

/// Parse a cron expression
pub fn parse_cron(expr: &str) -> Result<Schedule, ExecutionError> {
    // The cron crate expects 6 fields (with seconds), but we use 5-field format
    // Add "0" for seconds at the start
    let full_expr = format!("0 {}", expr);

    full_expr.parse::<Schedule>().map_err(|e| {
        ExecutionError::ConfigurationError(format!("Invalid cron expression '{}': {}", expr, e))
    })
}

/// Get the next scheduled time for a job
pub fn get_next_run_time(entry: &ScheduleEntry) -> Result<DateTime<Utc>, ExecutionError> {
    let schedule = parse_cron(&entry.cron)?;
    let tz: Tz = entry.timezone.parse().map_err(|_| {
        ExecutionError::ConfigurationError(format!("Invalid timezone: {}", entry.timezone))
    })?;

    let next = schedule.upcoming(tz).next().ok_or_else(|| {
        ExecutionError::ConfigurationError("No upcoming scheduled time".to_string())
    })?;

    Ok(next.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cron_daily_10pm() {
        let result = parse_cron("0 22 * * *");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_cron_after_midnight() {
        let result = parse_cron("5 0 * * *");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_cron_invalid() {
        let result = parse_cron("not a cron");
        assert!(result.is_err());
    }

    #[test]
    fn test_get_next_run_time() {
        let entry = ScheduleEntry {
            enabled: true,
            cron: "0 8 * * *".to_string(),
            timezone: "Asia/Almaty".to_string(),
        };

        let result = get_next_run_time(&entry);
        assert!(result.is_ok());
    }

    #[test]
    fn test_get_next_run_time_bad_timezone() {
        let entry = ScheduleEntry {
            enabled: true,
            cron: "0 8 * * *".to_string(),
            timezone: "Not/AZone".to_string(),
        };

        assert!(get_next_run_time(&entry).is_err());
    }
}
