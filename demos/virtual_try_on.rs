//! Submits a virtual try-on task and polls it to completion.
//!
//! Press Ctrl-C while polling to cancel.
//!
//! ```bash
//! AIDGE_ACCESS_KEY=... AIDGE_ACCESS_SECRET=... cargo run --example virtual_try_on
//! ```

use rs_aidge::{AidgeError, Capability, Client, PollOptions};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> rs_aidge::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let client = Client::from_env()?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    // The service expects requestParams as a JSON-encoded string.
    let request_params = serde_json::json!([{
        "clothesList": [{
            "imageUrl": "https://ae-pic-a1.aliexpress-media.com/kf/H7588ee37b7674fea814b55f2f516fda1z.jpg",
            "type": "tops"
        }],
        "model": { "base": "General", "gender": "female", "style": "universal_1", "body": "slim" },
        "viewType": "mixed",
        "inputQualityDetect": 0,
        "generateCount": 4
    }]);
    let payload = serde_json::json!({ "requestParams": request_params.to_string() });

    let capability = Capability::VirtualTryOn;
    let task = client.submit(capability.submit_path(), &payload).await?;
    info!(task_id = %task, "try-on submitted");

    let endpoint = capability.status_endpoint().ok_or_else(|| {
        AidgeError::Config(format!("{} has no status endpoint", capability))
    })?;
    let done = client
        .poller()
        .with_options(
            PollOptions::default()
                .with_interval(capability.poll_interval())
                .with_max_attempts(300),
        )
        .await_completion_with_cancel(&task, &endpoint, &cancel)
        .await?;

    info!(attempts = done.attempts, "try-on finished");
    println!("{}", serde_json::to_string_pretty(&done.envelope)?);
    Ok(())
}
