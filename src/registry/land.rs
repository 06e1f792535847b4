//! Land-registry provider clients and the integrated land analysis pipeline.
//!
//! Covers the land ledger (basic attributes + ownership list, keyed by PNU),
//! the coordinate-keyed land-use regulation layer, and the land-forest
//! endpoints (attribute search by address, direct lookup by PNU).

use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use super::building::{field_f64, field_str};
use super::codes;
use crate::config::ProvidersConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::models::{
    GeoPoint, LandAddressMatch, LandAnalysis, LandBasic, LandCharacteristics, LandForestRecord,
    LandLedgerRecord, LandOwner, LandSearchMethod,
};
use crate::resolve::vworld::VworldClient;

const LAND_BASIC_URL: &str = "https://apis.data.go.kr/1611000/nsdi/LadfrlService/attr/getLadfrlList";
const LAND_OWNERS_URL: &str =
    "https://apis.data.go.kr/1611000/nsdi/PossessionAttrService/attr/getPossessionAttrList";
const VWORLD_DATA_URL: &str = "https://api.vworld.kr/req/data";
const LADFRL_LIST_URL: &str = "https://api.vworld.kr/ned/data/ladfrlList";

/// Land-ledger client: basic land attributes and the ownership list.
pub struct LandLedgerClient {
    key: Option<String>,
    http: Client,
}

impl LandLedgerClient {
    const PROVIDER: &'static str = "land-ledger";

    pub fn new(key: Option<String>, timeout: Duration) -> Self {
        Self {
            key: key.map(|k| k.replace("%2B", "+").replace("%3D", "=")),
            http: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Fetch basic attributes and the owner list for one parcel. The two
    /// sub-queries are independent; errors only when both come back empty.
    pub async fn lookup(&self, pnu: &str) -> ProviderResult<LandLedgerRecord> {
        let key = self.key.as_deref().ok_or(ProviderError::MissingKey {
            provider: Self::PROVIDER,
        })?;

        info!("Land ledger lookup: PNU {}", pnu);
        let mut record = LandLedgerRecord {
            pnu: pnu.to_string(),
            ..Default::default()
        };

        match self.fetch_rows(key, LAND_BASIC_URL, pnu).await {
            Ok(rows) => record.basic = rows.first().map(shape_land_basic),
            Err(e) => warn!("Land basic query failed: {}", e),
        }

        match self.fetch_rows(key, LAND_OWNERS_URL, pnu).await {
            Ok(rows) => record.owners = rows.iter().map(shape_land_owner).collect(),
            Err(e) => warn!("Land ownership query failed: {}", e),
        }

        if record.basic.is_none() && record.owners.is_empty() {
            return Err(ProviderError::NotFound {
                provider: Self::PROVIDER,
                query: pnu.to_string(),
            });
        }
        Ok(record)
    }

    async fn fetch_rows(&self, key: &str, url: &str, pnu: &str) -> ProviderResult<Vec<Value>> {
        let params = [
            ("serviceKey", key),
            ("pnu", pnu),
            ("format", "json"),
            ("numOfRows", "10"),
            ("pageNo", "1"),
        ];

        let response = self
            .http
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                provider: Self::PROVIDER,
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: Self::PROVIDER,
                status,
            });
        }

        let data: Value = response.json().await.map_err(|e| ProviderError::Payload {
            provider: Self::PROVIDER,
            detail: e.to_string(),
        })?;
        Ok(nsdi_rows(&data))
    }
}

/// Coordinate-keyed land-use regulation lookup (V-World data layer).
pub struct LandRegulationClient {
    key: Option<String>,
    http: Client,
}

impl LandRegulationClient {
    const PROVIDER: &'static str = "land-regulation";
    /// Land-use planning layer
    const DATA_LAYER: &'static str = "LT_C_UQ111";

    pub fn new(key: Option<String>, timeout: Duration) -> Self {
        Self {
            key: key.map(|k| k.replace("%2B", "+").replace("%3D", "=")),
            http: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Returns the first regulation feature's properties at a point.
    pub async fn regulation_at(&self, point: GeoPoint) -> ProviderResult<Value> {
        let key = self.key.as_deref().ok_or(ProviderError::MissingKey {
            provider: Self::PROVIDER,
        })?;

        let geomfilter = format!("POINT({} {})", point.lon, point.lat);
        let params = [
            ("service", "data"),
            ("request", "getfeature"),
            ("data", Self::DATA_LAYER),
            ("key", key),
            ("geomfilter", geomfilter.as_str()),
            ("format", "json"),
            ("size", "10"),
            ("page", "1"),
            ("geometry", "false"),
            ("attribute", "true"),
        ];

        let response = self
            .http
            .get(VWORLD_DATA_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                provider: Self::PROVIDER,
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: Self::PROVIDER,
                status,
            });
        }

        let data: Value = response.json().await.map_err(|e| ProviderError::Payload {
            provider: Self::PROVIDER,
            detail: e.to_string(),
        })?;
        first_feature_properties(&data, Self::PROVIDER)
    }
}

/// Land-forest endpoints: attribute search by address text and direct lookup
/// by PNU.
pub struct LandForestClient {
    key: Option<String>,
    http: Client,
}

impl LandForestClient {
    const PROVIDER: &'static str = "land-forest";
    /// Administrative parcel layer searched by attribute filter
    const SEARCH_LAYER: &'static str = "LT_C_ADEMD_INFO";

    pub fn new(key: Option<String>, timeout: Duration) -> Self {
        Self {
            key,
            http: Client::builder()
                .timeout(timeout)
                .connect_timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Attribute search by address text; best match is the first feature.
    pub async fn search_by_address(&self, address: &str) -> ProviderResult<Value> {
        let key = self.key.as_deref().ok_or(ProviderError::MissingKey {
            provider: Self::PROVIDER,
        })?;

        let attrfilter = address_attrfilter(address);
        info!("Land-forest search: {} (filter: {})", address, attrfilter);

        let params = [
            ("service", "data"),
            ("request", "getfeature"),
            ("data", Self::SEARCH_LAYER),
            ("key", key),
            ("attrfilter", attrfilter.as_str()),
            ("format", "json"),
            ("size", "10"),
            ("page", "1"),
            ("geometry", "false"),
            ("attribute", "true"),
        ];

        let response = self
            .http
            .get(VWORLD_DATA_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                provider: Self::PROVIDER,
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: Self::PROVIDER,
                status,
            });
        }

        let data: Value = response.json().await.map_err(|e| ProviderError::Payload {
            provider: Self::PROVIDER,
            detail: e.to_string(),
        })?;
        first_feature_properties(&data, Self::PROVIDER)
    }

    /// Direct parcel lookup by 19-character PNU. Connection profiles are
    /// tried in order because the HTTPS endpoint intermittently resets
    /// connections from hosted networks.
    pub async fn lookup_by_pnu(&self, pnu: &str) -> ProviderResult<LandForestRecord> {
        let key = self.key.as_deref().ok_or(ProviderError::MissingKey {
            provider: Self::PROVIDER,
        })?;

        if pnu.len() != 19 {
            return Err(ProviderError::Payload {
                provider: Self::PROVIDER,
                detail: format!("invalid PNU '{}'", pnu),
            });
        }

        let http_url = LADFRL_LIST_URL.replace("https://", "http://");
        let profiles = [("https_primary", LADFRL_LIST_URL), ("http_fallback", http_url.as_str())];

        let params = [
            ("pnu", pnu),
            ("key", key),
            ("format", "json"),
            ("numOfRows", "10"),
            ("pageNo", "1"),
        ];

        let mut last = None;
        for (profile, url) in profiles {
            info!("Land-forest PNU lookup via {}: {}", profile, pnu);

            let response = match self
                .http
                .get(url)
                .header("Accept", "application/json")
                .query(&params)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    warn!("{} connection failed: {}", profile, e);
                    last = Some(ProviderError::Transport {
                        provider: Self::PROVIDER,
                        source: e,
                    });
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                warn!("{} returned HTTP {}", profile, status);
                last = Some(ProviderError::Status {
                    provider: Self::PROVIDER,
                    status,
                });
                continue;
            }

            let data: Value = match response.json().await {
                Ok(d) => d,
                Err(e) => {
                    warn!("{} payload unreadable: {}", profile, e);
                    last = Some(ProviderError::Payload {
                        provider: Self::PROVIDER,
                        detail: e.to_string(),
                    });
                    continue;
                }
            };

            match ladfrl_first_row(&data) {
                Some(row) => {
                    info!("Land-forest PNU lookup succeeded via {}", profile);
                    return Ok(shape_forest(&row, pnu));
                }
                None => {
                    last = Some(ProviderError::NotFound {
                        provider: Self::PROVIDER,
                        query: pnu.to_string(),
                    });
                }
            }
        }

        Err(last.unwrap_or(ProviderError::NotFound {
            provider: Self::PROVIDER,
            query: pnu.to_string(),
        }))
    }
}

/// Integrated land analysis: address match, regulation, ledger, parcel record
/// and shaped characteristics, with per-step error accumulation.
pub struct LandService {
    vworld: VworldClient,
    ledger: LandLedgerClient,
    regulation: LandRegulationClient,
    forest: LandForestClient,
}

impl LandService {
    pub fn new(providers: &ProvidersConfig) -> Self {
        let timeout = Duration::from_secs(providers.timeout_secs);
        Self {
            vworld: VworldClient::new(providers.vworld_key.clone(), timeout, providers.retry_count),
            ledger: LandLedgerClient::new(providers.land_key.clone(), timeout),
            regulation: LandRegulationClient::new(
                providers.land_regulation_key.clone(),
                timeout,
            ),
            forest: LandForestClient::new(providers.vworld_key.clone(), timeout),
        }
    }

    pub async fn analyze(&self, address: &str) -> LandAnalysis {
        let mut result = LandAnalysis::new(address);

        // 1. Address match: general geocode first, land-forest search second
        let mut forest_props = None;
        match self.vworld.coord_lookup(address, false).await {
            Ok(point) => {
                result.address_search = Some(LandAddressMatch {
                    method: LandSearchMethod::GeneralAddress,
                    coordinates: Some(point),
                });
            }
            Err(e) => {
                result.errors.push(format!("general address search failed: {}", e));
                match self.forest.search_by_address(address).await {
                    Ok(props) => {
                        result.address_search = Some(LandAddressMatch {
                            method: LandSearchMethod::LandForest,
                            coordinates: None,
                        });
                        forest_props = Some(props);
                    }
                    Err(e) => {
                        result.errors.push(format!("land-forest search failed: {}", e));
                    }
                }
            }
        }

        let Some(matched) = result.address_search.clone() else {
            result.success = false;
            result.message = "land address search failed".to_string();
            warn!("Land analysis failed for {}: no address match", address);
            return result;
        };

        // 2. Regulation layer, only with a real coordinate
        if let Some(point) = matched.coordinates {
            match self.regulation.regulation_at(point).await {
                Ok(properties) => result.regulation = Some(properties),
                Err(e) => result.errors.push(format!("land regulation lookup failed: {}", e)),
            }
        }

        // 3. Ledger and direct parcel record, both keyed by the derived PNU
        let pnu = codes::derive(address).pnu();
        match self.ledger.lookup(&pnu).await {
            Ok(record) => result.ledger = Some(record),
            Err(e) => result.errors.push(format!("land ledger lookup failed: {}", e)),
        }

        match self.forest.lookup_by_pnu(&pnu).await {
            Ok(record) => result.forest = Some(record),
            Err(e) => result.errors.push(format!("land-forest lookup failed: {}", e)),
        }

        // 4. Characteristics shaped from the land-forest search feature
        if let Some(props) = forest_props {
            result.characteristics = Some(shape_characteristics(&props));
        }

        result.success = true;
        result.message = format!(
            "land analysis completed ({} error(s))",
            result.errors.len()
        );
        info!("Land analysis complete: {} ({} errors)", address, result.errors.len());
        result
    }
}

/// NSDI list envelopes carry rows under `field`, as an array or a bare object.
fn nsdi_rows(data: &Value) -> Vec<Value> {
    match &data["ladfrls"]["field"] {
        Value::Array(rows) => rows.clone(),
        row @ Value::Object(_) => vec![row.clone()],
        _ => match &data["field"] {
            Value::Array(rows) => rows.clone(),
            row @ Value::Object(_) => vec![row.clone()],
            _ => Vec::new(),
        },
    }
}

/// `ladfrlVOList.ladfrlVO` is an array or a single object.
fn ladfrl_first_row(data: &Value) -> Option<Value> {
    match &data["ladfrlVOList"]["ladfrlVO"] {
        Value::Array(rows) => rows.first().cloned(),
        row @ Value::Object(_) => Some(row.clone()),
        _ => None,
    }
}

fn first_feature_properties(data: &Value, provider: &'static str) -> ProviderResult<Value> {
    let response = &data["response"];
    if response["status"].as_str() != Some("OK") {
        return Err(ProviderError::Payload {
            provider,
            detail: format!("status {}", response["status"]),
        });
    }
    response["result"]["featureCollection"]["features"]
        .as_array()
        .and_then(|features| features.first())
        .map(|feature| feature["properties"].clone())
        .ok_or(ProviderError::NotFound {
            provider,
            query: "feature query".to_string(),
        })
}

/// Build the attribute filter for a land-forest address search:
/// "갈운리 산 108" → name LIKE + main lot + mountain flag.
fn address_attrfilter(address: &str) -> String {
    let is_mountain = address.contains('산');
    let stripped = address.replace("번지", "").replace('산', "");

    let name_part: String = stripped
        .chars()
        .filter(|c| !c.is_ascii_digit() && *c != '-' && !c.is_whitespace())
        .collect();
    let number_pattern = Regex::new(r"\d+").unwrap();
    let main_number = number_pattern.find(&stripped).map(|m| m.as_str());

    let mut filters = Vec::new();
    if !name_part.is_empty() {
        filters.push(format!("ri_dong_nm like '%{}%'", name_part));
    }
    if let Some(number) = main_number {
        filters.push(format!("mnnm={}", number));
    }
    if is_mountain {
        filters.push("mnt_yn='1'".to_string());
    }

    if filters.is_empty() {
        format!("ri_dong_nm like '%{}%'", name_part)
    } else {
        filters.join(" AND ")
    }
}

fn shape_land_basic(row: &Value) -> LandBasic {
    LandBasic {
        land_category: field_str(row, "lndcgrCodeNm"),
        land_area: field_f64(row, "lndpclAr"),
        official_price: field_f64(row, "pblntfPclnd"),
        land_use_situation: field_str(row, "ladUseSittnNm"),
        ownership_classification: field_str(row, "posesnSeCodeNm"),
    }
}

fn shape_land_owner(row: &Value) -> LandOwner {
    LandOwner {
        owner_division: field_str(row, "posesnSeCodeNm"),
        ownership_ratio: field_str(row, "cnrsPsnQota"),
        acquisition_date: field_str(row, "ladOwnChgDe"),
        acquisition_reason: field_str(row, "ladOwnChgCaseCodeNm"),
    }
}

fn shape_forest(row: &Value, pnu: &str) -> LandForestRecord {
    let code = field_str(row, "lndcgrCode");
    LandForestRecord {
        pnu: pnu.to_string(),
        land_category_name: category_name(&code),
        land_category_code: code,
        area_sqm: field_f64(row, "lndpclAr"),
        administrative_code: field_str(row, "ldCode"),
        lot_number: field_str(row, "mnnmSlno"),
    }
}

fn shape_characteristics(props: &Value) -> LandCharacteristics {
    let land_type = field_str(props, "jimok_nm");
    LandCharacteristics {
        land_type: if land_type.is_empty() { "일반".to_string() } else { land_type },
        area: field_f64(props, "ar"),
        sido_name: field_str(props, "sido_nm"),
        sigungu_name: field_str(props, "sgg_nm"),
        emd_name: field_str(props, "emd_nm"),
        main_lot: field_str(props, "mnnm"),
        sub_lot: field_str(props, "snnm"),
        is_mountain: field_str(props, "mnt_yn") == "1",
    }
}

/// Land category code → name (지목 codes 01..28).
fn category_name(code: &str) -> String {
    let name = match code {
        "01" => "전",
        "02" => "답",
        "03" => "과수원",
        "04" => "목장용지",
        "05" => "임야",
        "06" => "광천지",
        "07" => "염전",
        "08" => "대",
        "09" => "공장용지",
        "10" => "학교용지",
        "11" => "주차장",
        "12" => "주유소용지",
        "13" => "창고용지",
        "14" => "도로",
        "15" => "철도용지",
        "16" => "제방",
        "17" => "하천",
        "18" => "구거",
        "19" => "유지",
        "20" => "양어장",
        "21" => "수도용지",
        "22" => "공원",
        "23" => "체육용지",
        "24" => "유원지",
        "25" => "종교용지",
        "26" => "사적지",
        "27" => "묘지",
        "28" => "잡종지",
        _ => return format!("unknown({})", code),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_name_table() {
        assert_eq!(category_name("05"), "임야");
        assert_eq!(category_name("08"), "대");
        assert_eq!(category_name("99"), "unknown(99)");
    }

    #[test]
    fn test_attrfilter_for_mountain_parcel() {
        let filter = address_attrfilter("갈운리 산 108");
        assert!(filter.contains("ri_dong_nm like '%갈운리%'"));
        assert!(filter.contains("mnnm=108"));
        assert!(filter.contains("mnt_yn='1'"));
        assert_eq!(filter.matches(" AND ").count(), 2);
    }

    #[test]
    fn test_attrfilter_plain_parcel() {
        let filter = address_attrfilter("백현동 542번지");
        assert!(filter.contains("ri_dong_nm like '%백현동%'"));
        assert!(filter.contains("mnnm=542"));
        assert!(!filter.contains("mnt_yn"));
    }

    #[test]
    fn test_shape_characteristics_defaults() {
        let props = json!({ "ar": "662.5", "sido_nm": "경기도", "mnt_yn": "1" });
        let shaped = shape_characteristics(&props);
        assert_eq!(shaped.land_type, "일반");
        assert_eq!(shaped.area, 662.5);
        assert!(shaped.is_mountain);
        assert_eq!(shaped.emd_name, "");
    }

    #[test]
    fn test_ladfrl_rows_object_or_array() {
        let array = json!({ "ladfrlVOList": { "ladfrlVO": [{ "lndcgrCode": "08" }] } });
        assert!(ladfrl_first_row(&array).is_some());

        let object = json!({ "ladfrlVOList": { "ladfrlVO": { "lndcgrCode": "08" } } });
        assert!(ladfrl_first_row(&object).is_some());

        let empty = json!({ "ladfrlVOList": {} });
        assert!(ladfrl_first_row(&empty).is_none());
    }

    #[tokio::test]
    async fn test_invalid_pnu_is_rejected_before_any_request() {
        let client = LandForestClient::new(Some("key".to_string()), Duration::from_secs(1));
        let result = client.lookup_by_pnu("123").await;
        assert!(matches!(result, Err(ProviderError::Payload { .. })));
    }

    #[tokio::test]
    async fn test_analyze_without_keys_reports_failure() {
        let service = LandService::new(&ProvidersConfig::default());
        let result = service.analyze("서울특별시 강남구 역삼동 123-45").await;
        assert!(!result.success);
        assert!(result.address_search.is_none());
        assert_eq!(result.errors.len(), 2);
    }
}
