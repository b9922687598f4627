//! Keep-alive self-ping task.
//!
//! Free hosting tiers spin services down after ~15 minutes of idle
//! traffic, so the relay pings its own `/keep-alive` endpoint every 14
//! minutes. With no service URL configured the task just logs each tick.

use std::time::Duration;

use tracing::{info, warn};

/// Ping cadence: one minute under the typical 15-minute idle cutoff.
const PING_INTERVAL: Duration = Duration::from_secs(840);

/// Per-request timeout for the self-ping.
const PING_TIMEOUT: Duration = Duration::from_secs(30);

/// Spawn the periodic self-ping loop.
pub fn spawn_keep_alive(service_url: Option<String>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let client = reqwest::Client::builder()
            .timeout(PING_TIMEOUT)
            .build()
            .unwrap_or_default();

        let mut interval = tokio::time::interval(PING_INTERVAL);
        // First tick fires immediately; skip it so the server has bound.
        interval.tick().await;

        loop {
            interval.tick().await;

            let Some(base) = service_url.as_deref() else {
                info!("Keep-alive: no service URL configured, cannot self-ping");
                continue;
            };

            let ping_url = format!("{}/keep-alive", base.trim_end_matches('/'));
            match client.get(&ping_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    info!(status = %resp.status(), "Keep-alive ping successful");
                }
                Ok(resp) => {
                    warn!(status = %resp.status(), "Keep-alive ping returned non-success");
                }
                Err(e) => {
                    warn!("Keep-alive ping failed: {e}");
                }
            }
        }
    })
}
