//! Aggregated analysis result returned by the top-level pipeline.

use serde::{Deserialize, Serialize};

use super::coordinate::ResolvedCoordinate;
use super::registry::{BuildingRecord, LandAnalysis};

/// Merged output of the address, building and land lookups for one request.
///
/// `success` flips to false only when all three info blocks are absent;
/// partial failures surface through `errors` and the completeness score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_info: Option<ResolvedCoordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_info: Option<BuildingRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub land_info: Option<LandAnalysis>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<String>,
    pub message: String,
    /// Present when the coordinate is a static fallback: the analysis is
    /// reported successful but at low confidence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Weighted completeness percentage, 0.0..=100.0
    pub completeness: f64,
}

impl AnalysisResult {
    pub fn new(address: &str) -> Self {
        Self {
            success: true,
            address: address.to_string(),
            address_info: None,
            building_info: None,
            land_info: None,
            errors: Vec::new(),
            message: String::new(),
            warning: None,
            completeness: 0.0,
        }
    }

    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            address_found: self.address_info.is_some(),
            building_info_found: self.building_info.is_some(),
            land_info_found: self.land_info.as_ref().map(|l| l.success).unwrap_or(false),
            error_count: self.errors.len(),
            completeness: self.completeness,
        }
    }
}

/// Compact per-request quality report included in API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub address_found: bool,
    pub building_info_found: bool,
    pub land_info_found: bool,
    pub error_count: usize,
    pub completeness: f64,
}
