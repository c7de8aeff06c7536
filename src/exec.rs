//! Common execution utilities for async and blocking clients.

use tracing::{debug, warn};

use crate::envelope::{TaskHandle, TaskStatus, decode_status};
use crate::error::{AidgeError, MAX_ERROR_BODY_CHARS, Result, truncate_str};
use crate::poll::{CompletedTask, PollOptions};

/// Logs the HTTP outcome and hands the body back untouched.
///
/// Status codes are not classified: a 4xx/5xx body is returned like any other
/// and its envelope is left to the caller.
pub(crate) fn finish_response(operation: &str, status: reqwest::StatusCode, text: String) -> String {
    if status.is_success() {
        debug!(operation, status = status.as_u16(), bytes = text.len(), "response received");
    } else {
        warn!(
            operation,
            status = status.as_u16(),
            body = truncate_str(&text, MAX_ERROR_BODY_CHARS),
            "non-success HTTP status"
        );
    }
    text
}

/// What a poller does after one status check.
pub(crate) enum PollStep {
    Done(CompletedTask),
    Wait,
}

/// Evaluates one status check: the transport result for attempt `attempt`.
///
/// Transport and decode failures become [`AidgeError::PollFailed`]; a
/// non-finished status past the attempt limit becomes
/// [`AidgeError::PollExhausted`].
pub(crate) fn poll_attempt(
    task: &TaskHandle,
    attempt: u32,
    outcome: Result<String>,
    options: &PollOptions,
) -> Result<PollStep> {
    let report = outcome
        .and_then(|body| decode_status(&body))
        .map_err(|e| poll_failed(task, attempt, e))?;

    match report.status {
        TaskStatus::Finished => {
            debug!(task_id = %task, attempt, "task finished");
            Ok(PollStep::Done(CompletedTask {
                task_id: task.clone(),
                attempts: attempt,
                envelope: report.envelope,
            }))
        }
        TaskStatus::Pending(status) => {
            if let Some(max) = options.max_attempts
                && attempt >= max
            {
                warn!(task_id = %task, attempt, %status, "poll attempt limit reached");
                return Err(AidgeError::PollExhausted {
                    task_id: task.to_string(),
                    attempts: attempt,
                });
            }
            debug!(
                task_id = %task,
                attempt,
                %status,
                interval_ms = options.interval.as_millis() as u64,
                "task not finished, waiting"
            );
            Ok(PollStep::Wait)
        }
    }
}

pub(crate) fn poll_failed(task: &TaskHandle, attempt: u32, source: AidgeError) -> AidgeError {
    warn!(task_id = %task, attempt, error = %source, "status check failed");
    AidgeError::PollFailed {
        task_id: task.to_string(),
        attempt,
        source: Box::new(source),
    }
}

pub(crate) fn cancelled(task: &TaskHandle, attempts: u32) -> AidgeError {
    debug!(task_id = %task, attempts, "polling cancelled");
    AidgeError::Cancelled {
        task_id: task.to_string(),
        attempts,
    }
}
