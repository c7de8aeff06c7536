use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::capability::Capability;
use crate::config::ClientConfig;
use crate::credential::{ChainProvider, Credential, CredentialProvider};
use crate::envelope::{TaskHandle, decode_json, decode_submit};
use crate::error::{AidgeError, Result};
use crate::exec::finish_response;
use crate::poll::{TaskPoller, Transport};
use crate::request::{ApiRequest, build_signed_request, current_timestamp_millis};

/// Async client for the Aidge API.
pub struct Client {
    http: reqwest::Client,
    config: ClientConfig,
    credential: Credential,
}

impl Client {
    /// Creates a new client with an explicit credential.
    pub fn new(credential: Credential) -> Result<Self> {
        Self::with_config(credential, ClientConfig::default())
    }

    /// Creates a new client with an explicit credential and custom configuration.
    ///
    /// Fails fast on a blank credential or a malformed endpoint.
    pub fn with_config(credential: Credential, config: ClientConfig) -> Result<Self> {
        credential.validate()?;
        config.validate()?;

        let mut builder = reqwest::Client::builder();
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

    /// Creates a new client from the default credential chain and
    /// [`ClientConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        let credential = ChainProvider::default_chain().resolve()?;
        Self::with_config(credential, ClientConfig::from_env()?)
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Signs and sends one request, returning the body verbatim.
    ///
    /// Every HTTP status is returned as `Ok`; only transport failures,
    /// payload encoding and request validation produce errors.
    #[instrument(
        skip_all,
        fields(operation = %request.operation_path(), method = %request.method())
    )]
    pub async fn invoke(&self, request: &ApiRequest) -> Result<String> {
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

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        Ok(finish_response(&signed.operation_path, status, text))
    }

    /// POSTs `payload` as JSON to `operation_path`.
    pub async fn post<P: Serialize + ?Sized>(
        &self,
        operation_path: &str,
        payload: &P,
    ) -> Result<String> {
        self.invoke(&ApiRequest::post(operation_path, payload)?).await
    }

    /// POSTs an already encoded JSON document.
    pub async fn post_raw(&self, operation_path: &str, json: impl Into<String>) -> Result<String> {
        self.invoke(&ApiRequest::post_raw(operation_path, json)).await
    }

    /// GETs `operation_path` with extra query parameters.
    pub async fn get(&self, operation_path: &str, query: &[(&str, &str)]) -> Result<String> {
        let request = query
            .iter()
            .fold(ApiRequest::get(operation_path), |req, (k, v)| req.with_query(*k, *v));
        self.invoke(&request).await
    }

    /// POSTs `payload` and decodes the task id from the submit envelope.
    pub async fn submit<P: Serialize + ?Sized>(
        &self,
        operation_path: &str,
        payload: &P,
    ) -> Result<TaskHandle> {
        let body = self.post(operation_path, payload).await?;
        let task = decode_submit(&body)?;
        debug!(operation = operation_path, task_id = %task, "task submitted");
        Ok(task)
    }

    /// A poller that checks task status through this client.
    pub fn poller(&self) -> TaskPoller<'_, Self> {
        TaskPoller::new(self)
    }

    /// Runs a capability end to end and returns the decoded final response.
    ///
    /// Synchronous capabilities return the submit response; asynchronous ones
    /// are submitted and then polled until finished.
    pub async fn execute<P: Serialize + ?Sized>(
        &self,
        capability: Capability,
        payload: &P,
    ) -> Result<Value> {
        self.execute_with_cancel(capability, payload, &CancellationToken::new())
            .await
    }

    /// Like [`Client::execute`], with a cancellation signal for the poll phase.
    pub async fn execute_with_cancel<P: Serialize + ?Sized>(
        &self,
        capability: Capability,
        payload: &P,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let Some(endpoint) = capability.status_endpoint() else {
            let body = self.post(capability.submit_path(), payload).await?;
            return decode_json(&body);
        };

        let task = self.submit(capability.submit_path(), payload).await?;
        let completed = self
            .poller()
            .with_interval(capability.poll_interval())
            .await_completion_with_cancel(&task, &endpoint, cancel)
            .await?;
        Ok(completed.envelope)
    }
}

#[async_trait]
impl Transport for Client {
    async fn invoke(&self, request: &ApiRequest) -> Result<String> {
        Client::invoke(self, request).await
    }
}
