//! Background jobs
//!
//! The expired refresh token sweep runs on a cron schedule outside the
//! request path.

use std::sync::Arc;
use thiserror::Error;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::auth::{AuthError, AuthService};

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Invalid job schedule '{schedule}': {reason}")]
    InvalidSchedule { schedule: String, reason: String },

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

/// Run one sweep pass and log the outcome
pub async fn run_refresh_sweep(auth_service: &AuthService) -> Result<u64, AuthError> {
    match auth_service.cleanup_expired_refresh_tokens().await {
        Ok(removed) => {
            if removed > 0 {
                tracing::info!(removed, "Swept expired refresh tokens");
            } else {
                tracing::debug!("No expired refresh tokens to sweep");
            }
            Ok(removed)
        }
        Err(e) => {
            tracing::error!(error = %e, "Expired refresh token sweep failed");
            Err(e)
        }
    }
}

/// Start a scheduler running the sweep on `schedule` (six-field cron, seconds first)
pub async fn start_refresh_sweep(
    auth_service: Arc<AuthService>,
    schedule: &str,
) -> Result<JobScheduler, JobError> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| JobError::Scheduler(format!("{:?}", e)))?;

    let job = Job::new_async(schedule, move |_id, _scheduler| {
        let auth_service = auth_service.clone();
        Box::pin(async move {
            // Failures are logged; the next tick retries
            let _ = run_refresh_sweep(&auth_service).await;
        })
    })
    .map_err(|e| JobError::InvalidSchedule {
        schedule: schedule.to_string(),
        reason: format!("{:?}", e),
    })?;

    scheduler
        .add(job)
        .await
        .map_err(|e| JobError::Scheduler(format!("{:?}", e)))?;
    scheduler
        .start()
        .await
        .map_err(|e| JobError::Scheduler(format!("{:?}", e)))?;

    tracing::info!(schedule, "Refresh token sweep scheduled");

    Ok(scheduler)
}
