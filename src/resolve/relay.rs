//! Public CORS-relay passthroughs, used as a last-resort transport workaround
//! when the primary geocoder blocks direct requests from the hosting network.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use super::vworld::parse_coord_envelope;
use crate::error::{ProviderError, ProviderResult};
use crate::models::GeoPoint;

const RELAY_PREFIXES: &[&str] = &[
    "https://api.allorigins.win/raw?url=",
    "https://corsproxy.io/?",
];
const PROVIDER: &str = "cors-relay";

/// Tries a fixed list of public relays in order, each wrapping the same
/// upstream query as an opaque GET.
pub struct RelayChain {
    http: Client,
}

impl RelayChain {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: Client::builder()
                .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// First relay that yields a parseable coordinate wins.
    pub async fn fetch_point(&self, target: &Url) -> ProviderResult<GeoPoint> {
        let encoded: String =
            url::form_urlencoded::byte_serialize(target.as_str().as_bytes()).collect();

        let mut last = None;
        for prefix in RELAY_PREFIXES {
            let relay_url = format!("{}{}", prefix, encoded);
            info!("Trying CORS relay: {}", prefix);

            match self.try_relay(&relay_url).await {
                Ok(point) => {
                    info!("Relay {} succeeded: ({}, {})", prefix, point.lon, point.lat);
                    return Ok(point);
                }
                Err(e) => {
                    warn!("Relay {} failed: {}", prefix, e);
                    last = Some(e);
                }
            }
        }

        Err(last.unwrap_or(ProviderError::Payload {
            provider: PROVIDER,
            detail: "no relays configured".to_string(),
        }))
    }

    async fn try_relay(&self, relay_url: &str) -> ProviderResult<GeoPoint> {
        let response = self
            .http
            .get(relay_url)
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                provider: PROVIDER,
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status,
            });
        }

        let mut data: Value = response.json().await.map_err(|e| ProviderError::Payload {
            provider: PROVIDER,
            detail: e.to_string(),
        })?;

        // Some relays wrap the upstream body in a "contents" JSON string
        if let Some(contents) = data.get("contents").and_then(Value::as_str) {
            data = serde_json::from_str(contents).map_err(|e| ProviderError::Payload {
                provider: PROVIDER,
                detail: format!("relay envelope: {}", e),
            })?;
        }

        parse_coord_envelope(&data)
    }
}
