//! Synchronous (blocking) client and poller for the Aidge API.
//!
//! This module is only available when the `blocking` feature is enabled.
//! It mirrors the async [`crate::client::Client`] and
//! [`crate::poll::TaskPoller`] using `reqwest::blocking` and thread sleeps.
//!
//! # Differences from the async API
//!
//! | Feature | Async | Blocking |
//! |---------|-------|----------|
//! | Runtime requirement | Tokio | None |
//! | Cancellation | interrupts the sleep | checked before each check and after each sleep |
//! | Best for | Services, many tasks at once | Scripts, CLI tools |
//!
//! # Example
//!
//! ```no_run
//! use rs_aidge::blocking::Client;
//! use rs_aidge::{Credential, StatusEndpoint};
//!
//! fn main() -> rs_aidge::Result<()> {
//!     let client = Client::new(Credential::new("512345", "secret"))?;
//!
//!     let payload = serde_json::json!({ "paramJson": [{ "area": "hand", "imageUrl": "https://..." }] });
//!     let task = client.submit("/ai/hand-foot/repair", &payload)?;
//!     let done = client
//!         .poller()
//!         .await_completion(&task, &StatusEndpoint::post("/ai/hand-foot/repair-results"))?;
//!     println!("{}", done.envelope);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::capability::Capability;
use crate::config::ClientConfig;
use crate::credential::{ChainProvider, Credential, CredentialProvider};
use crate::envelope::{TaskHandle, decode_json, decode_submit};
use crate::error::{AidgeError, Result};
use crate::exec::{PollStep, cancelled, finish_response, poll_attempt};
use crate::poll::{CompletedTask, PollOptions, StatusEndpoint};
use crate::request::{ApiRequest, build_signed_request, current_timestamp_millis};

/// Executes one signed API call and returns the raw body, blocking.
pub trait Transport: Send + Sync {
    fn invoke(&self, request: &ApiRequest) -> Result<String>;
}

/// Suspends the blocking poll loop between status checks.
pub trait Sleep: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Synchronous client for the Aidge API.
pub struct Client {
    http: reqwest::blocking::Client,
    config: ClientConfig,
    credential: Credential,
}

impl Client {
    /// Creates a new blocking client with an explicit credential.
    pub fn new(credential: Credential) -> Result<Self> {
        Self::with_config(credential, ClientConfig::default())
    }

    /// Creates a new blocking client with custom configuration.
    pub fn with_config(credential: Credential, config: ClientConfig) -> Result<Self> {
        credential.validate()?;
        config.validate()?;

        // reqwest::blocking defaults to a 30s timeout; keep it unless overridden.
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AidgeError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            credential,
        })
    }

    /// Creates a new blocking client using the default credential chain.
    pub fn from_env() -> Result<Self> {
        let credential = ChainProvider::default_chain().resolve()?;
        Self::with_config(credential, ClientConfig::from_env()?)
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Signs and sends one request, returning the body verbatim.
    #[instrument(
        skip_all,
        fields(operation = %request.operation_path(), method = %request.method())
    )]
    pub fn invoke(&self, request: &ApiRequest) -> Result<String> {
        let signed = build_signed_request(
            request,
            &self.credential,
            &self.config,
            current_timestamp_millis(),
        )?;
        debug!(timestamp = %signed.timestamp, "sending signed request");

        let mut builder = self.http.request(signed.method.to_http(), &signed.url);
        for (name, value) in &signed.headers {
            builder = builder.header(*name, *value);
        }
        if let Some(body) = signed.body {
            builder = builder.body(body);
        }

        let response = builder.send()?;
        let status = response.status();
        let text = response.text()?;

        Ok(finish_response(&signed.operation_path, status, text))
    }

    /// POSTs `payload` as JSON to `operation_path`.
    pub fn post<P: Serialize + ?Sized>(&self, operation_path: &str, payload: &P) -> Result<String> {
        self.invoke(&ApiRequest::post(operation_path, payload)?)
    }

    /// POSTs an already encoded JSON document.
    pub fn post_raw(&self, operation_path: &str, json: impl Into<String>) -> Result<String> {
        self.invoke(&ApiRequest::post_raw(operation_path, json))
    }

    /// GETs `operation_path` with extra query parameters.
    pub fn get(&self, operation_path: &str, query: &[(&str, &str)]) -> Result<String> {
        let request = query
            .iter()
            .fold(ApiRequest::get(operation_path), |req, (k, v)| req.with_query(*k, *v));
        self.invoke(&request)
    }

    /// POSTs `payload` and decodes the task id from the submit envelope.
    pub fn submit<P: Serialize + ?Sized>(
        &self,
        operation_path: &str,
        payload: &P,
    ) -> Result<TaskHandle> {
        let body = self.post(operation_path, payload)?;
        decode_submit(&body)
    }

    /// A poller that checks task status through this client.
    pub fn poller(&self) -> TaskPoller<'_, Self> {
        TaskPoller::new(self)
    }

    /// Runs a capability end to end and returns the decoded final response.
    pub fn execute<P: Serialize + ?Sized>(
        &self,
        capability: Capability,
        payload: &P,
    ) -> Result<Value> {
        let Some(endpoint) = capability.status_endpoint() else {
            let body = self.post(capability.submit_path(), payload)?;
            return decode_json(&body);
        };

        let task = self.submit(capability.submit_path(), payload)?;
        let completed = self
            .poller()
            .with_interval(capability.poll_interval())
            .await_completion(&task, &endpoint)?;
        Ok(completed.envelope)
    }
}

impl Transport for Client {
    fn invoke(&self, request: &ApiRequest) -> Result<String> {
        Client::invoke(self, request)
    }
}

/// Blocking counterpart of [`crate::poll::TaskPoller`].
pub struct TaskPoller<'a, T: ?Sized, S = ThreadSleep> {
    transport: &'a T,
    sleeper: S,
    options: PollOptions,
}

impl<'a, T: Transport + ?Sized> TaskPoller<'a, T> {
    /// A poller with default options that sleeps the current thread.
    pub fn new(transport: &'a T) -> Self {
        Self {
            transport,
            sleeper: ThreadSleep,
            options: PollOptions::default(),
        }
    }
}

impl<'a, T: Transport + ?Sized, S: Sleep> TaskPoller<'a, T, S> {
    /// Replaces the sleeper, e.g. with a test double.
    pub fn with_sleeper<S2: Sleep>(self, sleeper: S2) -> TaskPoller<'a, T, S2> {
        TaskPoller {
            transport: self.transport,
            sleeper,
            options: self.options,
        }
    }

    pub fn with_options(mut self, options: PollOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.options.interval = interval;
        self
    }

    /// Polls `endpoint` until `task` reports `"finished"`.
    pub fn await_completion(
        &self,
        task: &TaskHandle,
        endpoint: &StatusEndpoint,
    ) -> Result<CompletedTask> {
        self.await_completion_with_cancel(task, endpoint, &CancellationToken::new())
    }

    /// Polls until finished or until `cancel` is observed between checks.
    #[instrument(skip_all, fields(task_id = %task, endpoint = %endpoint.operation_path()))]
    pub fn await_completion_with_cancel(
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

            let outcome = endpoint
                .request_for(task)
                .and_then(|request| self.transport.invoke(&request));
            if let PollStep::Done(completed) = poll_attempt(task, attempt, outcome, &self.options)? {
                return Ok(completed);
            }

            self.sleeper.sleep(self.options.interval);
        }
    }
}

// Compile-time assertion: the blocking client can be shared across threads.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<Client>;
};
