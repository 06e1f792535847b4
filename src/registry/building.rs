//! Building-ledger provider client.
//!
//! Four independent ledger sections are queried for one code tuple; a failure
//! in one does not abort the others. Tabular responses flatten to a first-row
//! record, or a per-row array for the unit-exclusive section.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use super::codes;
use crate::error::{ProviderError, ProviderResult};
use crate::models::{
    AdminCodes, BuildingAreas, BuildingOverview, BuildingRecord, BuildingTitle, BuildingUnit,
};

const LEDGER_URL: &str = "https://apis.data.go.kr/1613000/BldRgstHubService";
const PROVIDER: &str = "building-ledger";

pub struct BuildingLedgerClient {
    key: Option<String>,
    http: Client,
}

impl BuildingLedgerClient {
    pub fn new(key: Option<String>, timeout: Duration) -> Self {
        Self {
            // Portal keys are often stored URL-encoded
            key: key.map(|k| k.replace("%2B", "+").replace("%3D", "=")),
            http: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Derive codes from the address, then fetch all ledger sections.
    pub async fn lookup(&self, address: &str) -> ProviderResult<BuildingRecord> {
        let derived = codes::derive(address);
        self.lookup_codes(address, derived).await
    }

    /// Fetch all four ledger sections for an explicit code tuple. Errors only
    /// when the key is missing or no section returned any rows.
    pub async fn lookup_codes(
        &self,
        address: &str,
        codes: AdminCodes,
    ) -> ProviderResult<BuildingRecord> {
        let key = self
            .key
            .as_deref()
            .ok_or(ProviderError::MissingKey { provider: PROVIDER })?;

        info!("Building ledger lookup: {} ({})", address, codes);
        let mut record = BuildingRecord::new(address, codes.clone());

        match self.fetch_rows(key, "getBrBasisOulnInfo", &codes).await {
            Ok(rows) => record.overview = rows.first().map(shape_overview),
            Err(e) => warn!("Basic overview query failed: {}", e),
        }

        match self.fetch_rows(key, "getBrRecapTitleInfo", &codes).await {
            Ok(rows) => record.areas = rows.first().map(shape_areas),
            Err(e) => warn!("Aggregate summary query failed: {}", e),
        }

        match self.fetch_rows(key, "getBrTitleInfo", &codes).await {
            Ok(rows) => record.title = rows.first().map(shape_title),
            Err(e) => warn!("Title section query failed: {}", e),
        }

        // Commonly absent for non-subdivided buildings
        match self.fetch_rows(key, "getBrExposInfo", &codes).await {
            Ok(rows) => record.units = rows.iter().map(shape_unit).collect(),
            Err(e) => warn!("Unit-exclusive section query failed: {}", e),
        }

        if record.is_empty() {
            return Err(ProviderError::NotFound {
                provider: PROVIDER,
                query: codes.to_string(),
            });
        }

        info!(
            "Building ledger lookup complete: {} ({} units)",
            address,
            record.units.len()
        );
        Ok(record)
    }

    async fn fetch_rows(
        &self,
        key: &str,
        operation: &str,
        codes: &AdminCodes,
    ) -> ProviderResult<Vec<Value>> {
        let url = format!("{}/{}", LEDGER_URL, operation);
        let params = [
            ("serviceKey", key),
            ("sigunguCd", codes.sigungu.as_str()),
            ("bjdongCd", codes.bdong.as_str()),
            ("bun", codes.bun.as_str()),
            ("ji", codes.ji.as_str()),
            ("numOfRows", "20"),
            ("pageNo", "1"),
            ("_type", "json"),
        ];

        let response = self
            .http
            .get(&url)
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

        Ok(item_rows(&data))
    }
}

/// `response.body.items.item` is an array for multiple rows, a bare object
/// for a single row, and absent for none.
fn item_rows(data: &Value) -> Vec<Value> {
    match &data["response"]["body"]["items"]["item"] {
        Value::Array(rows) => rows.clone(),
        row @ Value::Object(_) => vec![row.clone()],
        _ => Vec::new(),
    }
}

pub(crate) fn field_str(row: &Value, key: &str) -> String {
    match &row[key] {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn field_i64(row: &Value, key: &str) -> i64 {
    match &row[key] {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

pub(crate) fn field_f64(row: &Value, key: &str) -> f64 {
    match &row[key] {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn shape_overview(row: &Value) -> BuildingOverview {
    BuildingOverview {
        building_name: field_str(row, "bldNm"),
        building_use: field_str(row, "mainPurpsCdNm"),
        structure: field_str(row, "strctCdNm"),
        ground_floors: field_i64(row, "grndFlrCnt"),
        basement_floors: field_i64(row, "ugrndFlrCnt"),
        elevator_count: field_i64(row, "rideUseElvtCnt"),
        new_address: field_str(row, "newPlatPlc"),
        old_address: field_str(row, "platPlc"),
    }
}

fn shape_areas(row: &Value) -> BuildingAreas {
    BuildingAreas {
        site_area: field_f64(row, "platArea"),
        building_area: field_f64(row, "archArea"),
        total_floor_area: field_f64(row, "totArea"),
        building_coverage_ratio: field_f64(row, "bcRat"),
        floor_area_ratio: field_f64(row, "vlRat"),
    }
}

fn shape_title(row: &Value) -> BuildingTitle {
    BuildingTitle {
        main_structure: field_str(row, "strctCdNm"),
        roof_structure: field_str(row, "roofCdNm"),
        approval_date: field_str(row, "useAprDay"),
        permit_date: field_str(row, "pmsDay"),
    }
}

fn shape_unit(row: &Value) -> BuildingUnit {
    BuildingUnit {
        unit_number: field_str(row, "hoNm"),
        floor_number: field_i64(row, "flrNo"),
        unit_area: field_f64(row, "area"),
        unit_use: field_str(row, "mainPurpsCdNm"),
        unit_structure: field_str(row, "strctCdNm"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_rows_handles_array_and_object() {
        let many = json!({ "response": { "body": { "items": { "item": [{"a": 1}, {"a": 2}] } } } });
        assert_eq!(item_rows(&many).len(), 2);

        let one = json!({ "response": { "body": { "items": { "item": {"a": 1} } } } });
        assert_eq!(item_rows(&one).len(), 1);

        let none = json!({ "response": { "body": { "items": "" } } });
        assert!(item_rows(&none).is_empty());
    }

    #[test]
    fn test_shape_overview_permissive_defaults() {
        let row = json!({
            "bldNm": "역삼타워",
            "mainPurpsCdNm": "업무시설",
            "grndFlrCnt": "15",
            "ugrndFlrCnt": 3
        });
        let overview = shape_overview(&row);
        assert_eq!(overview.building_name, "역삼타워");
        assert_eq!(overview.ground_floors, 15);
        assert_eq!(overview.basement_floors, 3);
        // Missing fields default rather than error
        assert_eq!(overview.elevator_count, 0);
        assert_eq!(overview.structure, "");
    }

    #[test]
    fn test_shape_areas_parses_string_numbers() {
        let row = json!({ "platArea": "662.2", "totArea": 15051.07, "bcRat": "49.98" });
        let areas = shape_areas(&row);
        assert_eq!(areas.site_area, 662.2);
        assert_eq!(areas.total_floor_area, 15051.07);
        assert_eq!(areas.building_coverage_ratio, 49.98);
        assert_eq!(areas.building_area, 0.0);
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits() {
        let client = BuildingLedgerClient::new(None, Duration::from_secs(1));
        let codes = codes::derive("서울 강남구 역삼동 123");
        let result = client.lookup_codes("서울 강남구 역삼동 123", codes).await;
        assert!(matches!(result, Err(ProviderError::MissingKey { .. })));
    }
}
