use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rs_aidge::envelope::decode_submit;
use rs_aidge::{
    AidgeError, ApiRequest, PollOptions, Result, Sleeper, StatusEndpoint, TaskHandle, TaskPoller,
    Transport,
};
use tokio_util::sync::CancellationToken;

/// Replays canned bodies (or errors) in order and records every request.
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn statuses(statuses: &[&str]) -> Self {
        Self::new(
            statuses
                .iter()
                .map(|s| Ok(format!(r#"{{"data":{{"taskStatus":"{}"}}}}"#, s)))
                .collect(),
        )
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn invoke(&self, request: &ApiRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("script exhausted")
    }
}

#[derive(Clone, Default)]
struct CountingSleeper {
    sleeps: Arc<AtomicU32>,
    durations: Arc<Mutex<Vec<Duration>>>,
}

impl CountingSleeper {
    fn count(&self) -> u32 {
        self.sleeps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sleeper for CountingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.durations.lock().unwrap().push(duration);
    }
}

fn transport_error() -> AidgeError {
    let err = reqwest::Client::new()
        .get("not a url")
        .build()
        .expect_err("relative URL must not build");
    AidgeError::Transport(err)
}

fn endpoint() -> StatusEndpoint {
    StatusEndpoint::post("/ai/image/cut/out-results")
}

#[tokio::test]
async fn finished_on_first_check_returns_without_sleeping() {
    let transport = ScriptedTransport::statuses(&["finished"]);
    let sleeper = CountingSleeper::default();

    let done = TaskPoller::new(&transport)
        .with_sleeper(sleeper.clone())
        .await_completion(&TaskHandle::new("T1"), &endpoint())
        .await
        .expect("should finish");

    assert_eq!(done.attempts, 1);
    assert_eq!(transport.calls(), 1);
    assert_eq!(sleeper.count(), 0);
}

#[tokio::test]
async fn pending_pending_finished_makes_three_calls_and_two_sleeps() {
    let transport = ScriptedTransport::statuses(&["pending", "pending", "finished"]);
    let sleeper = CountingSleeper::default();

    let done = TaskPoller::new(&transport)
        .with_sleeper(sleeper.clone())
        .with_interval(Duration::from_secs(5))
        .await_completion(&TaskHandle::new("T1"), &endpoint())
        .await
        .expect("should finish");

    assert_eq!(done.attempts, 3);
    assert_eq!(transport.calls(), 3);
    assert_eq!(sleeper.count(), 2);
    assert_eq!(
        *sleeper.durations.lock().unwrap(),
        vec![Duration::from_secs(5), Duration::from_secs(5)]
    );
}

#[tokio::test]
async fn unknown_statuses_are_treated_as_pending() {
    let transport = ScriptedTransport::statuses(&["failed", "", "finished"]);
    let sleeper = CountingSleeper::default();

    let done = TaskPoller::new(&transport)
        .with_sleeper(sleeper.clone())
        .await_completion(&TaskHandle::new("T1"), &endpoint())
        .await
        .expect("should finish");

    assert_eq!(done.attempts, 3);
    assert_eq!(sleeper.count(), 2);
}

#[tokio::test]
async fn transport_failure_aborts_without_further_calls() {
    let transport = ScriptedTransport::new(vec![
        Ok(r#"{"data":{"taskStatus":"pending"}}"#.to_string()),
        Err(transport_error()),
        Ok(r#"{"data":{"taskStatus":"finished"}}"#.to_string()),
    ]);
    let sleeper = CountingSleeper::default();

    let err = TaskPoller::new(&transport)
        .with_sleeper(sleeper.clone())
        .await_completion(&TaskHandle::new("T1"), &endpoint())
        .await
        .expect_err("second check fails");

    match err {
        AidgeError::PollFailed {
            task_id,
            attempt,
            source,
        } => {
            assert_eq!(task_id, "T1");
            assert_eq!(attempt, 2);
            assert!(matches!(*source, AidgeError::Transport(_)));
        }
        other => panic!("expected PollFailed, got {:?}", other),
    }
    assert_eq!(transport.calls(), 2);
    assert_eq!(transport.remaining(), 1);
    assert_eq!(sleeper.count(), 1);
}

#[tokio::test]
async fn malformed_status_envelope_is_poll_failed() {
    let transport = ScriptedTransport::new(vec![Ok(r#"{"data":{"status":"done"}}"#.to_string())]);

    let err = TaskPoller::new(&transport)
        .with_sleeper(CountingSleeper::default())
        .await_completion(&TaskHandle::new("T1"), &endpoint())
        .await
        .expect_err("taskStatus is missing");

    match err {
        AidgeError::PollFailed { source, .. } => {
            assert!(matches!(*source, AidgeError::UnexpectedEnvelope(_)));
        }
        other => panic!("expected PollFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn attempt_limit_stops_polling() {
    let transport = ScriptedTransport::statuses(&["pending", "pending", "finished"]);
    let sleeper = CountingSleeper::default();

    let err = TaskPoller::new(&transport)
        .with_sleeper(sleeper.clone())
        .with_options(PollOptions::default().with_max_attempts(2))
        .await_completion(&TaskHandle::new("T1"), &endpoint())
        .await
        .expect_err("limit reached before finished");

    assert!(matches!(
        err,
        AidgeError::PollExhausted { attempts: 2, .. }
    ));
    assert_eq!(transport.calls(), 2);
    assert_eq!(sleeper.count(), 1);
}

#[tokio::test]
async fn cancelled_before_first_check() {
    let transport = ScriptedTransport::statuses(&["finished"]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = TaskPoller::new(&transport)
        .await_completion_with_cancel(&TaskHandle::new("T1"), &endpoint(), &cancel)
        .await
        .expect_err("already cancelled");

    assert!(matches!(err, AidgeError::Cancelled { attempts: 0, .. }));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn cancellation_interrupts_sleep() {
    let transport = ScriptedTransport::statuses(&["pending", "finished"]);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = TaskPoller::new(&transport)
        .with_interval(Duration::from_secs(3600))
        .await_completion_with_cancel(&TaskHandle::new("T1"), &endpoint(), &cancel)
        .await
        .expect_err("cancelled while sleeping");

    match err {
        AidgeError::Cancelled { task_id, attempts } => {
            assert_eq!(task_id, "T1");
            assert_eq!(attempts, 1);
        }
        other => panic!("expected Cancelled, got {:?}", other),
    }
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn submit_then_poll_scenario() {
    let transport = ScriptedTransport::new(vec![
        Ok(r#"{"data":{"result":{"taskId":"T1"}}}"#.to_string()),
        Ok(r#"{"data":{"taskStatus":"pending"}}"#.to_string()),
        Ok(r#"{"data":{"taskStatus":"finished","resultUrl":"https://out.png"}}"#.to_string()),
    ]);
    let sleeper = CountingSleeper::default();

    let submit = ApiRequest::post(
        "/ai/image/cut/out",
        &serde_json::json!({"imageUrl": "https://example/img.png"}),
    )
    .unwrap();
    let body = transport.invoke(&submit).await.unwrap();
    let task = decode_submit(&body).unwrap();

    let done = TaskPoller::new(&transport)
        .with_sleeper(sleeper.clone())
        .await_completion(&task, &StatusEndpoint::post("/ai/image/cut/out-results"))
        .await
        .expect("should finish");

    assert_eq!(
        done.envelope,
        serde_json::json!({"data":{"taskStatus":"finished","resultUrl":"https://out.png"}})
    );
    assert_eq!(sleeper.count(), 1);

    let requests = transport.requests.lock().unwrap();
    assert_eq!(requests.len(), 3);
    for poll in &requests[1..] {
        assert_eq!(poll.operation_path(), "/ai/image/cut/out-results");
        assert_eq!(poll.body(), Some(br#"{"taskId":"T1"}"#.as_slice()));
    }
}

#[tokio::test]
async fn independent_tasks_poll_concurrently() {
    let first = ScriptedTransport::statuses(&["pending", "finished"]);
    let second = ScriptedTransport::statuses(&["pending", "pending", "finished"]);
    let endpoint = endpoint();
    let task_a = TaskHandle::new("A");
    let task_b = TaskHandle::new("B");

    let poller_a = TaskPoller::new(&first).with_sleeper(CountingSleeper::default());
    let poller_b = TaskPoller::new(&second).with_sleeper(CountingSleeper::default());
    let (a, b) = tokio::join!(
        poller_a.await_completion(&task_a, &endpoint),
        poller_b.await_completion(&task_b, &endpoint),
    );

    assert_eq!(a.unwrap().attempts, 2);
    assert_eq!(b.unwrap().attempts, 3);
}
