//! Fixed-interval polling of asynchronous Aidge tasks.
//!
//! A submit call returns a [`TaskHandle`]; [`TaskPoller`] then calls the
//! operation's status endpoint until `data.taskStatus` reads `"finished"`,
//! sleeping a fixed interval between checks. There is no backoff. The loop
//! stops early on the first failed check, when the attempt limit is reached,
//! or when a [`CancellationToken`] fires.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::envelope::TaskHandle;
use crate::error::Result;
use crate::exec::{PollStep, cancelled, poll_attempt};
use crate::request::ApiRequest;

/// Interval used by the try-on samples.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on status checks unless overridden.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 600;

/// How a status endpoint expects the task id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskIdParam {
    /// POST body `{"taskId": "..."}`.
    JsonCamel,
    /// POST body `{"task_id": "..."}`.
    JsonSnake,
    /// GET query `?taskId=...`.
    Query,
}

/// The status-check operation of an asynchronous capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEndpoint {
    operation_path: String,
    task_id_param: TaskIdParam,
}

impl StatusEndpoint {
    /// Status operation at `operation_path` taking the id as `task_id_param`.
    pub fn new(operation_path: impl Into<String>, task_id_param: TaskIdParam) -> Self {
        Self {
            operation_path: operation_path.into(),
            task_id_param,
        }
    }

    /// POSTs `{"taskId": ...}`.
    pub fn post(operation_path: impl Into<String>) -> Self {
        Self::new(operation_path, TaskIdParam::JsonCamel)
    }

    /// POSTs `{"task_id": ...}`.
    pub fn post_snake(operation_path: impl Into<String>) -> Self {
        Self::new(operation_path, TaskIdParam::JsonSnake)
    }

    /// GETs with `?taskId=...`.
    pub fn get(operation_path: impl Into<String>) -> Self {
        Self::new(operation_path, TaskIdParam::Query)
    }

    pub fn operation_path(&self) -> &str {
        &self.operation_path
    }

    /// How the task id is passed.
    pub fn task_id_param(&self) -> TaskIdParam {
        self.task_id_param
    }

    /// Builds the status-check request for `task`.
    pub fn request_for(&self, task: &TaskHandle) -> Result<ApiRequest> {
        match self.task_id_param {
            TaskIdParam::JsonCamel => ApiRequest::post(
                self.operation_path.as_str(),
                &serde_json::json!({ "taskId": task.as_str() }),
            ),
            TaskIdParam::JsonSnake => ApiRequest::post(
                self.operation_path.as_str(),
                &serde_json::json!({ "task_id": task.as_str() }),
            ),
            TaskIdParam::Query => {
                Ok(ApiRequest::get(self.operation_path.as_str()).with_query("taskId", task.as_str()))
            }
        }
    }
}

/// Polling cadence and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Fixed wait between two status checks.
    pub interval: Duration,
    /// Maximum number of status checks. `None` polls until finished.
    pub max_attempts: Option<u32>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
        }
    }
}

impl PollOptions {
    /// Sets the wait between checks.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Caps the number of status checks.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Removes the attempt limit.
    pub fn unbounded(mut self) -> Self {
        self.max_attempts = None;
        self
    }
}

/// A task that reached `"finished"`.
#[derive(Debug, Clone)]
pub struct CompletedTask {
    pub task_id: TaskHandle,
    /// Number of status checks performed, including the final one.
    pub attempts: u32,
    /// The final status response, decoded.
    pub envelope: Value,
}

/// Executes one signed API call and returns the raw body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn invoke(&self, request: &ApiRequest) -> Result<String>;
}

/// Suspends the poll loop between status checks.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Drives one task to completion through a [`Transport`].
pub struct TaskPoller<'a, T: ?Sized, S = TokioSleeper> {
    transport: &'a T,
    sleeper: S,
    options: PollOptions,
}

impl<'a, T: Transport + ?Sized> TaskPoller<'a, T> {
    /// A poller with default options that sleeps on the tokio timer.
    pub fn new(transport: &'a T) -> Self {
        Self {
            transport,
            sleeper: TokioSleeper,
            options: PollOptions::default(),
        }
    }
}

impl<'a, T: Transport + ?Sized, S: Sleeper> TaskPoller<'a, T, S> {
    /// Replaces the sleeper, e.g. with a test double.
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> TaskPoller<'a, T, S2> {
        TaskPoller {
            transport: self.transport,
            sleeper,
            options: self.options,
        }
    }

    /// Replaces cadence and limits.
    pub fn with_options(mut self, options: PollOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.options.interval = interval;
        self
    }

    pub fn options(&self) -> &PollOptions {
        &self.options
    }

    /// Polls `endpoint` until `task` reports `"finished"`.
    pub async fn await_completion(
        &self,
        task: &TaskHandle,
        endpoint: &StatusEndpoint,
    ) -> Result<CompletedTask> {
        self.await_completion_with_cancel(task, endpoint, &CancellationToken::new())
            .await
    }

    /// Like [`TaskPoller::await_completion`], but stops with
    /// [`AidgeError::Cancelled`](crate::AidgeError::Cancelled) once `cancel`
    /// fires. A pending sleep is interrupted.
    #[instrument(skip_all, fields(task_id = %task, endpoint = %endpoint.operation_path()))]
    pub async fn await_completion_with_cancel(
        &self,
        task: &TaskHandle,
        endpoint: &StatusEndpoint,
        cancel: &CancellationToken,
    ) -> Result<CompletedTask> {
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(cancelled(task, attempt));
            }
            attempt += 1;

            let outcome = match endpoint.request_for(task) {
                Ok(request) => self.transport.invoke(&request).await,
                Err(e) => Err(e),
            };
            if let PollStep::Done(completed) = poll_attempt(task, attempt, outcome, &self.options)? {
                return Ok(completed);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(task, attempt)),
                _ = self.sleeper.sleep(self.options.interval) => {}
            }
        }
    }
}
