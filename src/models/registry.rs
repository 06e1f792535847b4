//! Registry record structures for building-ledger and land-registry lookups.
//!
//! Provider responses are tabular; records here hold the flattened first row
//! (or per-row arrays for unit/owner lists). Missing sections are `None` or
//! empty vectors, never errors.

use serde::{Deserialize, Serialize};

use super::codes::AdminCodes;
use super::coordinate::GeoPoint;

/// Basic overview ledger section (건축물대장 기본개요)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingOverview {
    pub building_name: String,
    pub building_use: String,
    pub structure: String,
    pub ground_floors: i64,
    pub basement_floors: i64,
    pub elevator_count: i64,
    pub new_address: String,
    pub old_address: String,
}

/// Aggregate summary section (총괄표제부): site and floor areas, ratios
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingAreas {
    pub site_area: f64,
    pub building_area: f64,
    pub total_floor_area: f64,
    pub building_coverage_ratio: f64,
    pub floor_area_ratio: f64,
}

/// Title section (표제부): structure and approval dates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingTitle {
    pub main_structure: String,
    pub roof_structure: String,
    pub approval_date: String,
    pub permit_date: String,
}

/// One row of the unit-exclusive section (전유부), present only for
/// subdivided buildings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingUnit {
    pub unit_number: String,
    pub floor_number: i64,
    pub unit_area: f64,
    pub unit_use: String,
    pub unit_structure: String,
}

/// All building-ledger sections fetched for one code tuple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub address: String,
    pub codes: AdminCodes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<BuildingOverview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub areas: Option<BuildingAreas>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<BuildingTitle>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub units: Vec<BuildingUnit>,
}

impl BuildingRecord {
    pub fn new(address: &str, codes: AdminCodes) -> Self {
        Self {
            address: address.to_string(),
            codes,
            overview: None,
            areas: None,
            title: None,
            units: Vec::new(),
        }
    }

    /// True when no ledger section came back at all.
    pub fn is_empty(&self) -> bool {
        self.overview.is_none() && self.areas.is_none() && self.title.is_none() && self.units.is_empty()
    }
}

/// Basic land attributes (토지기본정보), first row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandBasic {
    pub land_category: String,
    pub land_area: f64,
    pub official_price: f64,
    pub land_use_situation: String,
    pub ownership_classification: String,
}

/// One row of the land ownership list (토지소유정보)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandOwner {
    pub owner_division: String,
    pub ownership_ratio: String,
    pub acquisition_date: String,
    pub acquisition_reason: String,
}

/// Land-ledger lookup keyed by PNU: basic attributes plus the owner list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandLedgerRecord {
    pub pnu: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic: Option<LandBasic>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub owners: Vec<LandOwner>,
}

/// Shaped row from the PNU-keyed land-forest endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandForestRecord {
    pub pnu: String,
    pub land_category_code: String,
    pub land_category_name: String,
    pub area_sqm: f64,
    pub administrative_code: String,
    pub lot_number: String,
}

/// Shaped characteristics from the address-keyed land-forest search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandCharacteristics {
    pub land_type: String,
    pub area: f64,
    pub sido_name: String,
    pub sigungu_name: String,
    pub emd_name: String,
    pub main_lot: String,
    pub sub_lot: String,
    pub is_mountain: bool,
}

/// Which search path produced the land address match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandSearchMethod {
    GeneralAddress,
    LandForest,
}

/// Address match found by the land pipeline's own search (general geocode
/// first, land-forest attribute search as fallback).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandAddressMatch {
    pub method: LandSearchMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
}

/// Combined result of the land analysis sub-pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandAnalysis {
    pub success: bool,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_search: Option<LandAddressMatch>,
    /// First-feature properties of the land-use regulation layer, kept opaque
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regulation: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger: Option<LandLedgerRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forest: Option<LandForestRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characteristics: Option<LandCharacteristics>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<String>,
    pub message: String,
}

impl LandAnalysis {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            ..Default::default()
        }
    }
}
