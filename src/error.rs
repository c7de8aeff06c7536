use thiserror::Error;

/// Maximum characters of a response body quoted in error messages.
pub(crate) const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors that can occur when using the Aidge SDK.
#[derive(Debug, Error)]
pub enum AidgeError {
    /// Connection, timeout or body read failure from reqwest.
    #[error("HTTP transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Payload could not be encoded, or a response body is not JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The response decoded as JSON but `data`, `result`, `taskId` or
    /// `taskStatus` is missing or has the wrong type.
    #[error("unexpected response envelope: {0}")]
    UnexpectedEnvelope(String),

    /// A status check failed while polling a task.
    #[error("polling task {task_id} failed on attempt {attempt}: {source}")]
    PollFailed {
        task_id: String,
        attempt: u32,
        #[source]
        source: Box<AidgeError>,
    },

    /// Polling was interrupted by a cancellation signal.
    #[error("polling task {task_id} cancelled after {attempts} attempt(s)")]
    Cancelled { task_id: String, attempts: u32 },

    /// The task did not finish within the configured attempt limit.
    #[error("task {task_id} not finished after {attempts} attempt(s)")]
    PollExhausted { task_id: String, attempts: u32 },

    /// Signature computation error.
    #[error("signature error: {0}")]
    Signature(String),

    /// Credential not found or invalid.
    #[error("credential error: {0}")]
    Credential(String),

    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Validation error for request parameters.
    #[error("validation error: {0}")]
    Validation(String),
}

impl AidgeError {
    /// Returns `true` if the error is potentially recoverable by retrying.
    ///
    /// Only transport timeouts and connection failures qualify, including
    /// when they are wrapped in [`AidgeError::PollFailed`].
    pub fn is_retryable(&self) -> bool {
        match self {
            AidgeError::Transport(e) => e.is_timeout() || e.is_connect(),
            AidgeError::PollFailed { source, .. } => source.is_retryable(),

            AidgeError::Serialization(_)
            | AidgeError::UnexpectedEnvelope(_)
            | AidgeError::Cancelled { .. }
            | AidgeError::PollExhausted { .. }
            | AidgeError::Signature(_)
            | AidgeError::Credential(_)
            | AidgeError::Config(_)
            | AidgeError::Validation(_) => false,
        }
    }

    /// Returns the task identifier if this error came out of polling.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            AidgeError::PollFailed { task_id, .. }
            | AidgeError::Cancelled { task_id, .. }
            | AidgeError::PollExhausted { task_id, .. } => Some(task_id),
            _ => None,
        }
    }
}

/// A specialized Result type for Aidge operations.
pub type Result<T> = std::result::Result<T, AidgeError>;

/// Truncates a string to at most `max_chars` characters on a valid UTF-8 boundary.
pub(crate) fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
