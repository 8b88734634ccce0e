//! Best-effort usage events.
//!
//! Events are posted to an optional endpoint; without one they only appear in
//! debug logs. A failing endpoint never affects the release.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};

use crate::error::GitReleaseError;

pub struct Metrics {
    is_enabled: bool,
    endpoint: Option<String>,
}

impl Metrics {
    pub fn new(is_enabled: bool, endpoint: Option<String>) -> Self {
        Metrics {
            is_enabled,
            endpoint: endpoint.filter(|e| !e.is_empty()),
        }
    }

    pub fn disabled() -> Self {
        Metrics::new(false, None)
    }

    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    pub fn track_event(&self, action: &str, properties: Value) {
        if !self.is_enabled {
            return;
        }

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let event = json!({
            "event": action,
            "version": env!("CARGO_PKG_VERSION"),
            "os": std::env::consts::OS,
            "timestamp": timestamp,
            "properties": properties,
        });
        tracing::debug!(%event, "metrics event");

        if let Some(endpoint) = &self.endpoint {
            if let Err(e) = send(endpoint, &event) {
                tracing::debug!(error = %e, "metrics endpoint failed");
            }
        }
    }

    pub fn track_exception(&self, err: &GitReleaseError) {
        self.track_event("exception", json!({ "description": err.to_string() }));
    }
}

fn send(endpoint: &str, event: &Value) -> Result<(), reqwest::Error> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(2))
        .build()?;
    client.post(endpoint).json(event).send()?.error_for_status()?;
    Ok(())
}
