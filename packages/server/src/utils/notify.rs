use common::EmailJob;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Publish an email job, fire-and-forget.
///
/// Request latency must stay independent of mail delivery: publish failures
/// (and a disabled MQ) are logged and swallowed, never surfaced to the
/// caller.
pub async fn enqueue_email(state: &AppState, job: EmailJob) {
    let Some(ref notifier) = state.notifier else {
        debug!(job_id = %job.job_id, "MQ unavailable, dropping email job");
        return;
    };

    match notifier.publish(&job).await {
        Ok(()) => {
            info!(job_id = %job.job_id, to = %job.to, "Email job enqueued");
        }
        Err(e) => {
            warn!(job_id = %job.job_id, error = %e, "Failed to enqueue email job");
        }
    }
}
