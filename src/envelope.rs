//! Decoding of the `{"data": {...}}` envelope wrapping every response.
//!
//! Only the fields needed to drive a task are typed; everything else stays
//! as an opaque [`serde_json::Value`].

use std::fmt;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AidgeError, MAX_ERROR_BODY_CHARS, Result, truncate_str};

/// Status value marking a task as complete.
pub const FINISHED_STATUS: &str = "finished";

/// Identifier of a remote task, returned by a submit call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskHandle(String);

impl TaskHandle {
    /// Wraps a task id obtained elsewhere, e.g. from a previous run.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw task id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reported progress of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// `"finished"`.
    Finished,
    /// Any other value, including failure states the service may report.
    Pending(String),
}

impl TaskStatus {
    /// True for `"finished"` only.
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Finished)
    }
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        if value == FINISHED_STATUS {
            TaskStatus::Finished
        } else {
            TaskStatus::Pending(value)
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Finished => f.write_str(FINISHED_STATUS),
            TaskStatus::Pending(status) => f.write_str(status),
        }
    }
}

/// A decoded status-check response.
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// Value of `data.taskStatus`.
    pub status: TaskStatus,
    /// The whole response document.
    pub envelope: Value,
}

#[derive(Deserialize)]
struct SubmitEnvelope {
    data: SubmitData,
}

#[derive(Deserialize)]
struct SubmitData {
    result: SubmitResult,
}

#[derive(Deserialize)]
struct SubmitResult {
    #[serde(rename = "taskId", alias = "task_id")]
    task_id: String,
}

#[derive(Deserialize)]
struct StatusEnvelope {
    data: StatusData,
}

#[derive(Deserialize)]
struct StatusData {
    #[serde(rename = "taskStatus")]
    task_status: String,
}

/// Parses a body as JSON. Malformed JSON is a [`AidgeError::Serialization`].
pub fn decode_json(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(AidgeError::from)
}

/// Extracts `data.result.taskId` from a submit response.
pub fn decode_submit(body: &str) -> Result<TaskHandle> {
    let value = decode_json(body)?;
    let envelope: SubmitEnvelope = shape(value, body)?;
    let task_id = envelope.data.result.task_id;
    if task_id.is_empty() {
        return Err(AidgeError::UnexpectedEnvelope(format!(
            "empty taskId in body: {}",
            truncate_str(body, MAX_ERROR_BODY_CHARS)
        )));
    }
    Ok(TaskHandle(task_id))
}

/// Extracts `data.taskStatus` from a status-check response.
pub fn decode_status(body: &str) -> Result<StatusReport> {
    let value = decode_json(body)?;
    let envelope: StatusEnvelope = shape(value.clone(), body)?;
    Ok(StatusReport {
        status: envelope.data.task_status.into(),
        envelope: value,
    })
}

fn shape<T: DeserializeOwned>(value: Value, body: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        AidgeError::UnexpectedEnvelope(format!(
            "{} in body: {}",
            e,
            truncate_str(body, MAX_ERROR_BODY_CHARS)
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_camel_case() {
        let handle = decode_submit(r#"{"data":{"result":{"taskId":"T1"}}}"#).unwrap();
        assert_eq!(handle.as_str(), "T1");
    }

    #[test]
    fn submit_snake_case_alias() {
        let handle =
            decode_submit(r#"{"data":{"result":{"task_id":"T2","extra":1}},"code":"0"}"#)
                .unwrap();
        assert_eq!(handle, TaskHandle::new("T2"));
    }

    #[test]
    fn submit_missing_result_is_unexpected_envelope() {
        let err = decode_submit(r#"{"data":{}}"#).unwrap_err();
        assert!(matches!(err, AidgeError::UnexpectedEnvelope(_)));
    }

    #[test]
    fn submit_numeric_task_id_is_unexpected_envelope() {
        let err = decode_submit(r#"{"data":{"result":{"taskId":123}}}"#).unwrap_err();
        assert!(matches!(err, AidgeError::UnexpectedEnvelope(_)));
    }

    #[test]
    fn submit_empty_task_id_is_rejected() {
        let err = decode_submit(r#"{"data":{"result":{"taskId":""}}}"#).unwrap_err();
        assert!(matches!(err, AidgeError::UnexpectedEnvelope(_)));
    }

    #[test]
    fn error_body_without_data_is_unexpected_envelope() {
        let body = r#"{"code":"ResourceExhausted","message":"Sorry, your calling resources have been exhausted"}"#;
        let err = decode_submit(body).unwrap_err();
        match err {
            AidgeError::UnexpectedEnvelope(msg) => assert!(msg.contains("ResourceExhausted")),
            other => panic!("expected UnexpectedEnvelope, got {:?}", other),
        }
    }

    #[test]
    fn non_json_is_serialization_error() {
        let err = decode_status("<html>502</html>").unwrap_err();
        assert!(matches!(err, AidgeError::Serialization(_)));
    }

    #[test]
    fn status_finished_keeps_envelope() {
        let report = decode_status(
            r#"{"data":{"taskStatus":"finished","resultUrl":"https://out.png"}}"#,
        )
        .unwrap();
        assert!(report.status.is_finished());
        assert_eq!(report.envelope["data"]["resultUrl"], "https://out.png");
    }

    #[test]
    fn status_other_values_are_pending() {
        let report = decode_status(r#"{"data":{"taskStatus":"failed"}}"#).unwrap();
        assert_eq!(report.status, TaskStatus::Pending("failed".to_string()));
        assert_eq!(report.status.to_string(), "failed");
    }

    #[test]
    fn status_missing_field_is_unexpected_envelope() {
        let err = decode_status(r#"{"data":{"state":"finished"}}"#).unwrap_err();
        assert!(matches!(err, AidgeError::UnexpectedEnvelope(_)));
    }

    #[test]
    fn long_bodies_are_truncated_in_errors() {
        let body = format!(r#"{{"data":{{}},"pad":"{}"}}"#, "x".repeat(1000));
        let msg = decode_status(&body).unwrap_err().to_string();
        assert!(msg.len() < 600);
    }
}
