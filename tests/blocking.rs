#![cfg(feature = "blocking")]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use mockito::Matcher;
use rs_aidge::blocking::{Client, Sleep, TaskPoller, Transport};
use rs_aidge::{
    AidgeError, ApiRequest, Capability, ClientConfig, Credential, Result, StatusEndpoint,
    TaskHandle,
};
use tokio_util::sync::CancellationToken;

fn test_credential() -> Credential {
    Credential::new("512345", "test-access-key-secret")
}

fn test_client(endpoint: String) -> Client {
    let config = ClientConfig::default().with_endpoint(endpoint);
    Client::with_config(test_credential(), config).expect("failed to build client")
}

fn path(operation: &str) -> Matcher {
    Matcher::Regex(format!(r"^/rest{}(\?|$)", operation))
}

struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<String>>>,
    calls: AtomicU32,
}

impl ScriptedTransport {
    fn statuses(statuses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(
                statuses
                    .iter()
                    .map(|s| Ok(format!(r#"{{"data":{{"taskStatus":"{}"}}}}"#, s)))
                    .collect(),
            ),
            calls: AtomicU32::new(0),
        }
    }
}

impl Transport for ScriptedTransport {
    fn invoke(&self, _request: &ApiRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("script exhausted")
    }
}

#[derive(Default)]
struct CountingSleep {
    sleeps: AtomicU32,
}

impl Sleep for &CountingSleep {
    fn sleep(&self, _duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn blocking_post_returns_body() {
    let mut server = mockito::Server::new();

    let mock = server
        .mock("POST", path("/ai/image/cut/out"))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("partner_id".into(), "aidge".into()),
            Matcher::UrlEncoded("app_key".into(), "512345".into()),
            Matcher::Regex(r"sign=[0-9A-F]{64}".into()),
        ]))
        .match_header("Content-Type", "application/json")
        .with_status(200)
        .with_body(r#"{"data":{"imageUrl":"https://out/cut.png"}}"#)
        .create();

    let client = test_client(server.url());
    let resp = client
        .post("/ai/image/cut/out", &serde_json::json!({"imageUrl": "x"}))
        .expect("post should succeed");

    assert!(resp.contains("https://out/cut.png"));
    mock.assert();
}

#[test]
fn blocking_submit_and_poll() {
    let mut server = mockito::Server::new();

    server
        .mock("POST", path("/ai/hand-foot/repair"))
        .with_status(200)
        .with_body(r#"{"data":{"result":{"taskId":"HF-2"}}}"#)
        .create();
    let results = server
        .mock("POST", path("/ai/hand-foot/repair-results"))
        .match_body(Matcher::Json(serde_json::json!({"taskId": "HF-2"})))
        .with_status(200)
        .with_body(r#"{"data":{"taskStatus":"finished","images":["https://out/1.png"]}}"#)
        .create();

    let client = test_client(server.url());
    let value = client
        .execute(Capability::HandFootRepair, &serde_json::json!({"paramJson": []}))
        .expect("execute should succeed");

    assert_eq!(value["data"]["images"][0], "https://out/1.png");
    results.assert();
}

#[test]
fn blocking_get_status_query() {
    let mut server = mockito::Server::new();

    let mock = server
        .mock("GET", path("/ai/image/translation_mllm/results"))
        .match_query(Matcher::UrlEncoded("taskId".into(), "IT-1".into()))
        .with_status(200)
        .with_body(r#"{"data":{"taskStatus":"finished"}}"#)
        .create();

    let client = test_client(server.url());
    let done = client
        .poller()
        .await_completion(
            &TaskHandle::new("IT-1"),
            &StatusEndpoint::get("/ai/image/translation_mllm/results"),
        )
        .expect("poll should succeed");

    assert_eq!(done.attempts, 1);
    mock.assert();
}

#[test]
fn blocking_poller_counts_sleeps() {
    let transport = ScriptedTransport::statuses(&["pending", "pending", "finished"]);
    let sleep = CountingSleep::default();

    let done = TaskPoller::new(&transport)
        .with_sleeper(&sleep)
        .await_completion(
            &TaskHandle::new("T1"),
            &StatusEndpoint::post("/ai/image/cut/out-results"),
        )
        .expect("should finish");

    assert_eq!(done.attempts, 3);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    assert_eq!(sleep.sleeps.load(Ordering::SeqCst), 2);
}

#[test]
fn blocking_poller_honours_cancellation() {
    let transport = ScriptedTransport::statuses(&["finished"]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = TaskPoller::new(&transport)
        .await_completion_with_cancel(
            &TaskHandle::new("T1"),
            &StatusEndpoint::post("/ai/image/cut/out-results"),
            &cancel,
        )
        .expect_err("already cancelled");

    assert!(matches!(err, AidgeError::Cancelled { attempts: 0, .. }));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn blocking_rejects_empty_secret() {
    let result = Client::new(Credential::new("512345", ""));
    assert!(matches!(result, Err(AidgeError::Credential(_))));
}
