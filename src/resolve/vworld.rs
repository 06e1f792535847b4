//! Primary geocoding provider client (V-World).

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::warn;
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::models::GeoPoint;

const COORD_URL: &str = "https://api.vworld.kr/req/address";
const SEARCH_URL: &str = "https://api.vworld.kr/req/search";
const PROVIDER: &str = "vworld";

/// Browser-like headers used to get past upstream bot-blocking.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    ),
    ("Accept", "application/json, text/plain, */*"),
    ("Accept-Language", "ko-KR,ko;q=0.9,en;q=0.8"),
    ("Referer", "https://www.vworld.kr/"),
    ("Origin", "https://www.vworld.kr"),
    ("Cache-Control", "no-cache"),
];

/// Client for the V-World address endpoints (coordinate lookup and search).
pub struct VworldClient {
    key: Option<String>,
    http: Client,
    retry_count: u32,
}

impl VworldClient {
    pub fn new(key: Option<String>, timeout: Duration, retry_count: u32) -> Self {
        Self {
            key,
            http: Client::builder()
                .timeout(timeout)
                .connect_timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            retry_count: retry_count.max(1),
        }
    }

    fn key(&self) -> ProviderResult<&str> {
        self.key
            .as_deref()
            .ok_or(ProviderError::MissingKey { provider: PROVIDER })
    }

    fn coord_params<'a>(&self, address: &'a str, key: &'a str) -> Vec<(&'static str, &'a str)> {
        vec![
            ("service", "address"),
            ("request", "getcoord"),
            ("version", "2.0"),
            ("crs", "epsg:4326"),
            ("address", address),
            ("format", "json"),
            ("type", "road"),
            ("key", key),
        ]
    }

    /// Full coordinate-endpoint URL including the key; relays wrap this as an
    /// opaque GET target.
    pub fn coord_request_url(&self, address: &str) -> ProviderResult<Url> {
        let key = self.key()?;
        Url::parse_with_params(COORD_URL, self.coord_params(address, key)).map_err(|e| {
            ProviderError::Payload {
                provider: PROVIDER,
                detail: e.to_string(),
            }
        })
    }

    /// Coordinate-lookup endpoint. `browser_headers` swaps in the header set
    /// that gets past bot-blocking; transport errors retry up to the fixed
    /// retry count, HTTP status errors do not (a 502 is a signal the caller
    /// inspects, not a transient).
    pub async fn coord_lookup(&self, address: &str, browser_headers: bool) -> ProviderResult<GeoPoint> {
        let key = self.key()?;
        let params = self.coord_params(address, key);

        let mut attempt = 0;
        loop {
            attempt += 1;

            let mut request = self.http.get(COORD_URL).query(&params);
            if browser_headers {
                for (name, value) in BROWSER_HEADERS {
                    request = request.header(*name, *value);
                }
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        return Err(ProviderError::Status {
                            provider: PROVIDER,
                            status,
                        });
                    }
                    let data: Value =
                        response.json().await.map_err(|e| ProviderError::Payload {
                            provider: PROVIDER,
                            detail: e.to_string(),
                        })?;
                    return parse_coord_envelope(&data);
                }
                Err(e) => {
                    warn!(
                        "V-World coordinate request failed (attempt {}/{}): {}",
                        attempt, self.retry_count, e
                    );
                    if attempt >= self.retry_count {
                        return Err(ProviderError::Transport {
                            provider: PROVIDER,
                            source: e,
                        });
                    }
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        }
    }

    /// Alternate search endpoint: same provider, different query semantics,
    /// identical success parsing (first item's x/y).
    pub async fn search_lookup(&self, address: &str) -> ProviderResult<GeoPoint> {
        let key = self.key()?;
        let params = [
            ("service", "search"),
            ("request", "search"),
            ("version", "2.0"),
            ("crs", "epsg:4326"),
            ("size", "10"),
            ("page", "1"),
            ("query", address),
            ("type", "address"),
            ("format", "json"),
            ("key", key),
        ];

        let response = self
            .http
            .get(SEARCH_URL)
            .query(&params)
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

        let data: Value = response.json().await.map_err(|e| ProviderError::Payload {
            provider: PROVIDER,
            detail: e.to_string(),
        })?;
        parse_search_envelope(&data)
    }
}

/// Coerce a JSON number-or-string to f64 (V-World serializes coordinates as
/// strings).
pub(crate) fn json_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse `response.result.point` from the coordinate endpoint.
pub(crate) fn parse_coord_envelope(data: &Value) -> ProviderResult<GeoPoint> {
    let response = &data["response"];
    if response["status"].as_str() != Some("OK") {
        return Err(ProviderError::Payload {
            provider: PROVIDER,
            detail: format!("status {}", response["status"]),
        });
    }
    let point = &response["result"]["point"];
    match (json_f64(&point["x"]), json_f64(&point["y"])) {
        (Some(lon), Some(lat)) => Ok(GeoPoint { lon, lat }),
        _ => Err(ProviderError::Payload {
            provider: PROVIDER,
            detail: "missing result point".to_string(),
        }),
    }
}

/// Parse the first item of `response.result.items` from the search endpoint.
fn parse_search_envelope(data: &Value) -> ProviderResult<GeoPoint> {
    let response = &data["response"];
    if response["status"].as_str() != Some("OK") {
        return Err(ProviderError::Payload {
            provider: PROVIDER,
            detail: format!("status {}", response["status"]),
        });
    }
    let item = response["result"]["items"]
        .as_array()
        .and_then(|items| items.first())
        .ok_or_else(|| ProviderError::Payload {
            provider: PROVIDER,
            detail: "empty search result".to_string(),
        })?;
    match (json_f64(&item["x"]), json_f64(&item["y"])) {
        (Some(lon), Some(lat)) => Ok(GeoPoint { lon, lat }),
        _ => Err(ProviderError::Payload {
            provider: PROVIDER,
            detail: "search item has no coordinates".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_coord_envelope_string_coords() {
        let data = json!({
            "response": {
                "status": "OK",
                "result": { "point": { "x": "127.0276", "y": "37.4979" } }
            }
        });
        let point = parse_coord_envelope(&data).unwrap();
        assert_eq!(point.lon, 127.0276);
        assert_eq!(point.lat, 37.4979);
    }

    #[test]
    fn test_parse_coord_envelope_rejects_error_status() {
        let data = json!({ "response": { "status": "ERROR" } });
        assert!(parse_coord_envelope(&data).is_err());
    }

    #[test]
    fn test_parse_search_envelope_first_item() {
        let data = json!({
            "response": {
                "status": "OK",
                "result": { "items": [
                    { "x": 127.03, "y": 37.50 },
                    { "x": 129.0, "y": 35.1 }
                ] }
            }
        });
        let point = parse_search_envelope(&data).unwrap();
        assert_eq!(point.lon, 127.03);
    }

    #[test]
    fn test_json_f64_accepts_number_and_string() {
        assert_eq!(json_f64(&json!(1.5)), Some(1.5));
        assert_eq!(json_f64(&json!("2.5")), Some(2.5));
        assert_eq!(json_f64(&json!(null)), None);
    }

    #[test]
    fn test_missing_key_short_circuits() {
        let client = VworldClient::new(None, Duration::from_secs(1), 1);
        assert!(client.coord_request_url("서울").is_err());
    }
}
