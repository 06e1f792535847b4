//! Secondary free geocoder (OpenStreetMap Nominatim).
//!
//! Rate-limited and global, so results are filtered against a coarse national
//! bounding box before being accepted.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::models::GeoPoint;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
const PROVIDER: &str = "nominatim";

/// Coarse national bounding box: min lon, min lat, max lon, max lat
const KOREA_BBOX: [f64; 4] = [124.0, 33.0, 132.0, 43.0];

#[derive(Debug, Deserialize)]
struct NominatimHit {
    lat: String,
    lon: String,
}

pub struct NominatimClient {
    http: Client,
    endpoint: String,
}

impl NominatimClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: Client::builder()
                .user_agent("zelkova/0.1 (property analysis; contact@example.com)")
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            endpoint: NOMINATIM_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_endpoint(endpoint: &str, timeout: Duration) -> Self {
        let mut client = Self::new(timeout);
        client.endpoint = endpoint.to_string();
        client
    }

    /// Query several variants of the address in turn, accepting the first
    /// candidate inside the national bounding box.
    pub async fn geocode(&self, address: &str) -> ProviderResult<GeoPoint> {
        for variant in address_variants(address) {
            debug!("Nominatim variant: {}", variant);

            let response = match self
                .http
                .get(&self.endpoint)
                .query(&[
                    ("q", variant.as_str()),
                    ("format", "json"),
                    ("limit", "3"),
                    ("addressdetails", "1"),
                    ("accept-language", "ko,en"),
                ])
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    warn!("Nominatim request failed for '{}': {}", variant, e);
                    continue;
                }
            };

            if !response.status().is_success() {
                warn!("Nominatim returned HTTP {}", response.status());
                continue;
            }

            let hits: Vec<NominatimHit> = match response.json().await {
                Ok(h) => h,
                Err(e) => {
                    warn!("Failed to parse Nominatim response: {}", e);
                    continue;
                }
            };

            for hit in hits {
                let (Ok(lat), Ok(lon)) = (hit.lat.parse::<f64>(), hit.lon.parse::<f64>()) else {
                    continue;
                };
                if in_bbox(lon, lat) {
                    info!("Nominatim match: ({}, {}) via '{}'", lon, lat, variant);
                    return Ok(GeoPoint { lon, lat });
                }
                debug!("Discarding out-of-bounds candidate: ({}, {})", lon, lat);
            }
        }

        Err(ProviderError::NotFound {
            provider: PROVIDER,
            query: address.to_string(),
        })
    }
}

/// Address variants tried in order: country-suffixed forms, the raw string,
/// and a simplified form with city-type suffixes stripped.
fn address_variants(address: &str) -> Vec<String> {
    let mut variants = vec![
        format!("{}, South Korea", address),
        format!("{}, 대한민국", address),
        address.to_string(),
    ];
    let simplified = address.replace("특별시", "").replace("광역시", "");
    if simplified != address {
        variants.push(simplified);
    }
    variants
}

fn in_bbox(lon: f64, lat: f64) -> bool {
    (KOREA_BBOX[0]..=KOREA_BBOX[2]).contains(&lon) && (KOREA_BBOX[1]..=KOREA_BBOX[3]).contains(&lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_accepts_domestic_coordinates() {
        assert!(in_bbox(126.9780, 37.5665)); // Seoul
        assert!(in_bbox(129.0756, 35.1796)); // Busan
    }

    #[test]
    fn test_bbox_rejects_foreign_coordinates() {
        assert!(!in_bbox(139.6917, 35.6895)); // Tokyo
        assert!(!in_bbox(116.4074, 39.9042)); // Beijing
    }

    #[test]
    fn test_address_variants_include_simplified_form() {
        let variants = address_variants("서울특별시 강남구");
        assert_eq!(variants.len(), 4);
        assert_eq!(variants[0], "서울특별시 강남구, South Korea");
        assert_eq!(variants[3], "서울 강남구");
    }

    #[test]
    fn test_address_variants_skip_redundant_simplification() {
        let variants = address_variants("수원시 팔달구");
        assert_eq!(variants.len(), 3);
    }
}
