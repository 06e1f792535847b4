//! Coordinate types produced by the address resolution chain.

use serde::{Deserialize, Serialize};

/// Geographic point (EPSG:4326)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

/// Which step of the resolution chain produced a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMethod {
    /// Primary geocoder, coordinate endpoint, browser-like headers
    VworldDirect,
    /// Primary geocoder, search endpoint
    VworldSearch,
    /// Primary geocoder, coordinate endpoint, default headers
    VworldPlain,
    /// CORS relay wrapping the primary geocoder
    CorsRelay,
    /// Secondary free geocoder (OpenStreetMap)
    Nominatim,
    /// Static centroid matched by address keyword
    StaticKeyword,
    /// Hardcoded default centroid
    DefaultCentroid,
}

impl ResolveMethod {
    /// True when the coordinate is a static approximation rather than a real geocode.
    pub fn is_fallback(self) -> bool {
        matches!(self, ResolveMethod::StaticKeyword | ResolveMethod::DefaultCentroid)
    }
}

impl std::fmt::Display for ResolveMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResolveMethod::VworldDirect => "vworld_direct",
            ResolveMethod::VworldSearch => "vworld_search",
            ResolveMethod::VworldPlain => "vworld_plain",
            ResolveMethod::CorsRelay => "cors_relay",
            ResolveMethod::Nominatim => "nominatim",
            ResolveMethod::StaticKeyword => "static_keyword",
            ResolveMethod::DefaultCentroid => "default_centroid",
        };
        write!(f, "{}", s)
    }
}

/// Result of resolving a free-text address to a coordinate.
///
/// The resolver never fails outright: `success` is always true and the last
/// chain stages substitute a static centroid with `is_fallback` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedCoordinate {
    pub success: bool,
    pub address: String,
    pub point: GeoPoint,
    pub method: ResolveMethod,
    pub is_fallback: bool,
    /// Human-readable note on how the coordinate was obtained
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ResolvedCoordinate {
    /// A real geocode from a live provider.
    pub fn geocoded(address: &str, lon: f64, lat: f64, method: ResolveMethod) -> Self {
        Self {
            success: true,
            address: address.to_string(),
            point: GeoPoint { lon, lat },
            method,
            is_fallback: false,
            note: None,
        }
    }

    /// A static approximation substituted after all live attempts failed.
    pub fn fallback(address: &str, lon: f64, lat: f64, method: ResolveMethod, note: String) -> Self {
        Self {
            success: true,
            address: address.to_string(),
            point: GeoPoint { lon, lat },
            method,
            is_fallback: true,
            note: Some(note),
        }
    }
}
