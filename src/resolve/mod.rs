//! Free-text address resolution through an ordered chain of providers.
//!
//! Each strategy is tried only after the previous one definitively fails;
//! the chain never errors out — the last stages substitute a static centroid
//! flagged as a fallback.

pub mod fallback;
pub mod nominatim;
pub mod relay;
pub mod vworld;

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::ProvidersConfig;
use crate::models::{ResolveMethod, ResolvedCoordinate};
use nominatim::NominatimClient;
use relay::RelayChain;
use vworld::VworldClient;

/// Resolves a free-text address to a coordinate. Must not fail: every failure
/// path degrades to a lower-confidence fallback instead of propagating.
pub struct AddressResolver {
    vworld: VworldClient,
    relays: RelayChain,
    nominatim: NominatimClient,
}

impl AddressResolver {
    pub fn new(providers: &ProvidersConfig) -> Self {
        let timeout = Duration::from_secs(providers.timeout_secs);
        Self {
            vworld: VworldClient::new(providers.vworld_key.clone(), timeout, providers.retry_count),
            relays: RelayChain::new(timeout),
            nominatim: NominatimClient::new(Duration::from_secs(10)),
        }
    }

    /// Ordered fallback chain, first success wins:
    /// coordinate endpoint with browser headers → search endpoint (on gateway
    /// block) → coordinate endpoint with default headers → CORS relays →
    /// Nominatim → static keyword centroid → default centroid.
    pub async fn resolve(&self, address: &str) -> ResolvedCoordinate {
        info!("Resolving address: {}", address);

        // 1. Coordinate endpoint, browser-like headers
        let mut gateway_blocked = false;
        match self.vworld.coord_lookup(address, true).await {
            Ok(point) => {
                info!("Coordinate endpoint succeeded: ({}, {})", point.lon, point.lat);
                return ResolvedCoordinate::geocoded(
                    address,
                    point.lon,
                    point.lat,
                    ResolveMethod::VworldDirect,
                );
            }
            Err(e) => {
                gateway_blocked = e.is_gateway_error();
                warn!("Coordinate endpoint failed: {}", e);
            }
        }

        // 2. Alternate search endpoint, only when the gateway blocked us
        if gateway_blocked {
            match self.vworld.search_lookup(address).await {
                Ok(point) => {
                    info!("Search endpoint succeeded: ({}, {})", point.lon, point.lat);
                    return ResolvedCoordinate::geocoded(
                        address,
                        point.lon,
                        point.lat,
                        ResolveMethod::VworldSearch,
                    );
                }
                Err(e) => warn!("Search endpoint failed: {}", e),
            }
        }

        // 3. Coordinate endpoint again, default header set
        match self.vworld.coord_lookup(address, false).await {
            Ok(point) => {
                info!("Plain coordinate lookup succeeded: ({}, {})", point.lon, point.lat);
                return ResolvedCoordinate::geocoded(
                    address,
                    point.lon,
                    point.lat,
                    ResolveMethod::VworldPlain,
                );
            }
            Err(e) => warn!("Plain coordinate lookup failed: {}", e),
        }

        // 4. Public CORS relays wrapping the same query
        match self.vworld.coord_request_url(address) {
            Ok(target) => match self.relays.fetch_point(&target).await {
                Ok(point) => {
                    info!("CORS relay succeeded: ({}, {})", point.lon, point.lat);
                    return ResolvedCoordinate::geocoded(
                        address,
                        point.lon,
                        point.lat,
                        ResolveMethod::CorsRelay,
                    );
                }
                Err(e) => warn!("All CORS relays failed: {}", e),
            },
            Err(e) => debug!("Skipping relay step: {}", e),
        }

        // 5. Secondary free geocoder; real geocodes, not fallbacks
        match self.nominatim.geocode(address).await {
            Ok(point) => {
                let mut resolved = ResolvedCoordinate::geocoded(
                    address,
                    point.lon,
                    point.lat,
                    ResolveMethod::Nominatim,
                );
                resolved.note = Some("resolved via secondary geocoder".to_string());
                return resolved;
            }
            Err(e) => warn!("Nominatim lookup failed: {}", e),
        }

        // 6. Static centroid by longest matching keyword
        if let Some((keyword, point)) = fallback::keyword_centroid(address) {
            info!("Using static centroid for keyword '{}'", keyword);
            return ResolvedCoordinate::fallback(
                address,
                point.lon,
                point.lat,
                ResolveMethod::StaticKeyword,
                format!("providers unreachable; approximate centroid for '{}'", keyword),
            );
        }

        // 7. Default centroid
        info!("No keyword matched; using default centroid");
        ResolvedCoordinate::fallback(
            address,
            fallback::DEFAULT_CENTROID.lon,
            fallback::DEFAULT_CENTROID.lat,
            ResolveMethod::DefaultCentroid,
            "providers unreachable; default centroid (Seoul City Hall)".to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Resolver with no provider key and an unroutable secondary endpoint, so
    /// every live stage fails fast.
    fn offline_resolver() -> AddressResolver {
        AddressResolver {
            vworld: VworldClient::new(None, Duration::from_secs(1), 1),
            relays: RelayChain::new(Duration::from_secs(1)),
            nominatim: NominatimClient::with_endpoint(
                "http://127.0.0.1:9",
                Duration::from_millis(200),
            ),
        }
    }

    #[tokio::test]
    async fn test_offline_resolution_degrades_to_keyword_centroid() {
        let resolver = offline_resolver();
        let resolved = resolver.resolve("서울특별시 강남구 역삼동 123-45").await;

        assert!(resolved.success);
        assert!(resolved.is_fallback);
        assert_eq!(resolved.method, ResolveMethod::StaticKeyword);
        assert_eq!(resolved.point.lon, 127.0276);
        assert_eq!(resolved.point.lat, 37.4979);
    }

    #[tokio::test]
    async fn test_offline_resolution_without_keyword_uses_default_centroid() {
        let resolver = offline_resolver();
        let resolved = resolver.resolve("Nowhere Street 42").await;

        assert!(resolved.success);
        assert!(resolved.is_fallback);
        assert_eq!(resolved.method, ResolveMethod::DefaultCentroid);
        assert_eq!(resolved.point.lon, 126.9780);
        assert_eq!(resolved.point.lat, 37.5665);
    }
}
