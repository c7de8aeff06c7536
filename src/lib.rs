//! Aidge image/text AI API client for Rust.
//!
//! Every Aidge operation is an HTTPS call authenticated by an HMAC-SHA256
//! signature in the query string. Long-running operations (virtual try-on,
//! image translation, hand/foot repair) return a task id that is polled until
//! the task reports `"finished"`. This crate provides:
//!
//! - [`Client::invoke`]: sign and send one request, returning the raw body
//! - [`Client::submit`]: send a payload and decode the task id
//! - [`TaskPoller::await_completion`]: fixed-interval status polling with an
//!   attempt limit and cancellation
//! - [`Client::execute`]: both of the above for a known [`Capability`]
//!
//! Request and response payloads stay opaque [`serde_json::Value`]s.
//!
//! # Quick Start (async)
//!
//! ```no_run
//! use rs_aidge::{Client, ClientConfig, Credential, StatusEndpoint};
//!
//! # async fn example() -> rs_aidge::Result<()> {
//! let config = ClientConfig::default()
//!     .with_domain("api.aidc-ai.com")
//!     .with_trial_resource(true);
//! let client = Client::with_config(Credential::new("512345", "your-secret"), config)?;
//!
//! let task = client
//!     .submit("/ai/virtual/tryon", &serde_json::json!({ "requestParams": "[...]" }))
//!     .await?;
//!
//! let done = client
//!     .poller()
//!     .await_completion(&task, &StatusEndpoint::post_snake("/ai/virtual/tryon-results"))
//!     .await?;
//!
//! println!("{}", done.envelope);
//! # Ok(())
//! # }
//! ```

pub mod capability;
pub mod client;
pub mod config;
pub mod credential;
pub mod envelope;
pub mod error;
pub mod poll;
pub mod request;

#[cfg(feature = "blocking")]
pub mod blocking;

mod exec;
mod sign;

pub use capability::Capability;
pub use client::Client;
pub use config::{ClientConfig, Region};
pub use credential::Credential;
pub use envelope::{StatusReport, TaskHandle, TaskStatus};
pub use error::{AidgeError, Result};
pub use poll::{
    CompletedTask, PollOptions, Sleeper, StatusEndpoint, TaskIdParam, TaskPoller, TokioSleeper,
    Transport,
};
pub use request::{ApiRequest, Method};

// Compile-time assertions: key types must be Send + Sync for use across threads.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<Client>;
    let _ = assert_send_sync::<AidgeError>;
    let _ = assert_send_sync::<Credential>;
    let _ = assert_send_sync::<ApiRequest>;
};
