//! Removes the background of a sample image in a single call.
//!
//! ```bash
//! AIDGE_ACCESS_KEY=... AIDGE_ACCESS_SECRET=... AIDGE_USE_TRIAL=true \
//!     cargo run --example background_removal
//! ```

use rs_aidge::{Capability, Client};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> rs_aidge::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let client = Client::from_env()?;

    let payload = serde_json::json!({
        "imageUrl": "https://ae01.alicdn.com/kf/Sa78257f1d9a34dad8ee494178db12ec8l.jpg",
        "backGroundType": "WHITE_BACKGROUND"
    });
    let result = client.execute(Capability::BackgroundRemoval, &payload).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
