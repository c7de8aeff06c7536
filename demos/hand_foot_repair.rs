//! Repairs hands in a generated image using the blocking client.
//!
//! ```bash
//! AIDGE_ACCESS_KEY=... AIDGE_ACCESS_SECRET=... \
//!     cargo run --example hand_foot_repair --features blocking
//! ```

use rs_aidge::Capability;
use rs_aidge::blocking::Client;
use tracing_subscriber::EnvFilter;

fn main() -> rs_aidge::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let client = Client::from_env()?;

    let payload = serde_json::json!({
        "paramJson": [{
            "area": "hand",
            "imageUrl": "https://ae01.alicdn.com/kf/Sa78257f1d9a34dad8ee494178db12ec8l.jpg",
            "imgNum": "1",
            "requestBizId": ""
        }]
    });
    let result = client.execute(Capability::HandFootRepair, &payload)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
