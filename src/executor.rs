//! Job execution engine
//!
//! Each job evaluates every known owner against a point-in-time snapshot:
//! - Morning: today's tasks plus the weather line, one notification per owner
//! - Evening: today's tasks with fallback to tomorrow's, one notification
//! - IncomeCheck: the recurring-income state machine with its atomic post
//!
//! Per-owner failures are logged and skipped; a job only fails as a whole
//! when its storage snapshot cannot be opened.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::mpsc;

use crate::db::JarvisDb;
use crate::error::{ExecutionError, JobError};
use crate::finance::{self, IncomeCheckOutcome};
use crate::helpers::day_key;
use crate::notify::Notifier;
use crate::reminders;
use crate::scheduler::SchedulerMessage;
use crate::state::{create_execution_record, AppState};
use crate::types::{ExecutionTrigger, JobId, JobStatus};
use crate::weather::WeatherClient;

/// Executor manages job execution
pub struct Executor {
    state: Arc<AppState>,
}

impl Executor {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Start the executor loop
    ///
    /// Listens for job execution requests from the scheduler or manual triggers.
    pub async fn run(&self, mut receiver: mpsc::Receiver<SchedulerMessage>) {
        while let Some(msg) = receiver.recv().await {
            log::info!("Executing job '{}' (trigger: {:?})", msg.job, msg.trigger);
            self.execute(msg.job, msg.trigger).await;
        }
    }

    async fn execute(&self, job: JobId, trigger: ExecutionTrigger) {
        let record = create_execution_record(job, trigger);
        let execution_id = record.id.clone();
        let started_at = record.started_at;
        self.state.add_execution_record(record);
        self.state.set_job_status(
            job,
            JobStatus::Running {
                started_at,
                execution_id: execution_id.clone(),
            },
        );

        // Scheduled and missed runs both consume the schedule slot
        if matches!(trigger, ExecutionTrigger::Scheduled | ExecutionTrigger::Missed) {
            self.state.set_last_scheduled_run(job, started_at);
        }

        let result = match job {
            JobId::Morning => self.run_morning().await,
            JobId::Evening => self.run_evening().await,
            JobId::IncomeCheck => self.run_income_check().await,
        };

        let finished_at = Utc::now();
        let duration_secs = (finished_at - started_at).num_seconds().max(0) as u64;

        match result {
            Ok(()) => {
                self.state.set_job_status(
                    job,
                    JobStatus::Completed {
                        finished_at,
                        duration_secs,
                        execution_id: execution_id.clone(),
                    },
                );
                self.state.update_execution_record(&execution_id, |r| {
                    r.finished_at = Some(finished_at);
                    r.duration_secs = Some(duration_secs);
                    r.success = true;
                });
                log::info!("Job '{}' completed in {}s", job, duration_secs);
            }
            Err(e) => {
                log::error!("Job '{}' failed: {}", job, e);
                self.state.set_job_status(
                    job,
                    JobStatus::Failed {
                        error: JobError::from(&e),
                        execution_id: execution_id.clone(),
                    },
                );
                self.state.update_execution_record(&execution_id, |r| {
                    r.finished_at = Some(finished_at);
                    r.duration_secs = Some(duration_secs);
                    r.success = false;
                    r.error_message = Some(e.to_string());
                });
            }
        }
    }

    /// Morning summary: today's tasks plus current weather, per owner.
    async fn run_morning(&self) -> Result<(), ExecutionError> {
        let config = self.state.config();
        let tz = self.state.service_tz();
        let today = Utc::now().with_timezone(&tz).date_naive();

        let db = JarvisDb::open()?;
        let notifier = Notifier::new(&config.push.base_url);
        let weather = WeatherClient::new(&config.weather.base_url, &config.weather.api_key);

        for owner in db.owners()? {
            let profile = db.get_profile(&owner).ok().flatten();

            let report = match profile.as_ref() {
                Some(p) => weather.report_for_city(&p.city).await,
                None => None,
            };
            let summary = report.as_ref().map(|r| r.summary());

            let message =
                reminders::select_morning_summary(&db, &owner, &day_key(today), summary.as_deref());
            notifier.deliver(&owner, profile.as_ref(), &message).await;
        }

        Ok(())
    }

    /// Evening summary: today's tasks, falling back to tomorrow's, per owner.
    async fn run_evening(&self) -> Result<(), ExecutionError> {
        let config = self.state.config();
        let tz = self.state.service_tz();
        let today = Utc::now().with_timezone(&tz).date_naive();
        let tomorrow = today + Duration::days(1);

        let db = JarvisDb::open()?;
        let notifier = Notifier::new(&config.push.base_url);

        for owner in db.owners()? {
            let profile = db.get_profile(&owner).ok().flatten();
            let message = reminders::select_evening_summary(
                &db,
                &owner,
                &day_key(today),
                &day_key(tomorrow),
            );
            notifier.deliver(&owner, profile.as_ref(), &message).await;
        }

        Ok(())
    }

    /// Recurring-income check, per owner.
    async fn run_income_check(&self) -> Result<(), ExecutionError> {
        let tz = self.state.service_tz();
        let today = Utc::now().with_timezone(&tz).date_naive();

        let db = JarvisDb::open()?;

        for owner in db.owners()? {
            match finance::run_income_check(&db, &owner, today) {
                Ok(IncomeCheckOutcome::Posted) => {
                    // run_income_check already logged the post
                }
                Ok(outcome) => {
                    log::debug!("Income check for {}: {:?}", owner, outcome);
                }
                Err(e) => {
                    // Best-effort: a failed owner is retried on the next tick
                    log::warn!("Income check for {} failed: {}", owner, e);
                }
            }
        }

        Ok(())
    }
}

/// Request a job execution from outside the scheduler (manual trigger).
pub fn request_job_execution(
    sender: &mpsc::Sender<SchedulerMessage>,
    job: JobId,
) -> Result<(), String> {
    sender
        .try_send(SchedulerMessage {
            job,
            trigger: ExecutionTrigger::Manual,
        })
        .map_err(|e| format!("Failed to queue job '{}': {}", job, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_job_execution_queues_message() {
        let (tx, mut rx) = mpsc::channel(4);
        request_job_execution(&tx, JobId::Morning).expect("queue should accept");

        let msg = rx.recv().await.expect("message should arrive");
        assert_eq!(msg.job, JobId::Morning);
        assert!(matches!(msg.trigger, ExecutionTrigger::Manual));
    }

    #[tokio::test]
    async fn test_request_job_execution_reports_full_queue() {
        let (tx, _rx) = mpsc::channel(1);
        request_job_execution(&tx, JobId::Morning).unwrap();
        assert!(request_job_execution(&tx, JobId::Evening).is_err());
    }
}
