use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::jobs::model::JobStatus;
use crate::jobs::repo::JobsRepo;
use crate::notify::{CompletionNotice, WebhookNotifier};

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Simulated processing time between `running` and `completed`.
    pub completion_delay: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            completion_delay: Duration::from_millis(3000),
        }
    }
}

/// Drives the pending -> running -> completed lifecycle.
///
/// `run` persists the `running` transition before returning; the final
/// transition happens on a background timer. Each scheduled completion is
/// tracked by job id so it can be cancelled instead of firing blind.
#[derive(Clone)]
pub struct JobRunner {
    jobs: JobsRepo,
    notifier: WebhookNotifier,
    cfg: RunnerConfig,
    // Scheduled completions by job id. The epoch marks which spawned task
    // owns the entry; cleanup by any other task is a no-op.
    in_flight: Arc<Mutex<HashMap<i64, (u64, CancellationToken)>>>,
    next_epoch: Arc<AtomicU64>,
}

impl JobRunner {
    pub fn new(jobs: JobsRepo, notifier: WebhookNotifier, cfg: RunnerConfig) -> Self {
        Self {
            jobs,
            notifier,
            cfg,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start a pending job.
    ///
    /// Fails with `NotFound` for unknown ids and `Conflict` for jobs that
    /// are already running or completed. On success the job is `running`
    /// when this returns, and completion is scheduled in the background.
    pub async fn run(&self, id: i64) -> Result<(), AppError> {
        // 1) The job must exist and still be pending.
        let job = self
            .jobs
            .get(id)
            .await?
            .ok_or(AppError::NotFound { entity: "job", id })?;

        if job.status != JobStatus::Pending.as_str() {
            return Err(AppError::Conflict(format!(
                "job {id} is {}, only pending jobs can be run",
                job.status
            )));
        }

        // 2) Persist the running transition before acknowledging.
        self.jobs.set_status(id, JobStatus::Running, Utc::now()).await?;
        tracing::info!(job_id = id, "Job started");

        // 3) Schedule the delayed completion. At most one live timer per
        //    job id: a replaced entry is cancelled, never left to fire.
        let token = CancellationToken::new();
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        let stale = self
            .in_flight
            .lock()
            .expect("in-flight lock poisoned")
            .insert(id, (epoch, token.clone()));
        if let Some((_, stale)) = stale {
            stale.cancel();
        }

        let runner = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(job_id = id, "Scheduled completion cancelled");
                }
                _ = tokio::time::sleep(runner.cfg.completion_delay) => {
                    runner.complete(id).await;
                }
            }
            // A superseded task must leave its replacement's entry alone,
            // so only the entry's owner removes it.
            let mut in_flight = runner.in_flight.lock().expect("in-flight lock poisoned");
            if in_flight.get(&id).is_some_and(|(e, _)| *e == epoch) {
                in_flight.remove(&id);
            }
        });

        Ok(())
    }

    /// The deferred half of `run`. Runs on the timer task, so errors have no
    /// caller to land on; they are logged and dropped.
    async fn complete(&self, id: i64) {
        // Captured once, used for both the row update and the notice.
        let completed_at = Utc::now();

        let job = match self.jobs.get(id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                tracing::warn!(job_id = id, "Job vanished before completion, dropping");
                return;
            }
            Err(e) => {
                tracing::error!(job_id = id, error = %e, "Failed to load job for completion");
                return;
            }
        };

        if let Err(e) = self
            .jobs
            .set_status(id, JobStatus::Completed, completed_at)
            .await
        {
            tracing::error!(job_id = id, error = %e, "Failed to mark job completed");
            return;
        }
        tracing::info!(job_id = id, "Job completed");

        let payload = match serde_json::from_str(&job.payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(
                    job_id = id,
                    error = %e,
                    "Stored payload is not valid JSON, skipping completion notice"
                );
                return;
            }
        };

        let notice = CompletionNotice {
            job_id: job.id,
            task_name: job.task_name,
            priority: job.priority,
            payload,
            completed_at,
        };

        // Notification failures never roll back the completion.
        if let Err(e) = self.notifier.notify(&notice).await {
            tracing::warn!(job_id = id, error = %e, "Webhook notification failed");
        }
    }

    /// Cancel every outstanding scheduled completion and return how many
    /// there were. Used on shutdown so timers stop deliberately instead of
    /// dying mid-write.
    pub fn abort_pending(&self) -> usize {
        let mut in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
        for (_, token) in in_flight.values() {
            token.cancel();
        }
        let aborted = in_flight.len();
        in_flight.clear();
        aborted
    }
}
