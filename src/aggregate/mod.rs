//! Top-level analysis service: runs the address, building and land lookups
//! concurrently and merges them into one scored result.

use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::models::{AnalysisResult, ResolvedCoordinate};
use crate::registry::{BuildingLedgerClient, LandService};
use crate::resolve::AddressResolver;

pub struct AnalysisService {
    resolver: AddressResolver,
    building: BuildingLedgerClient,
    land: LandService,
}

impl AnalysisService {
    pub fn new(config: &Config) -> Self {
        let providers = &config.providers;
        Self {
            resolver: AddressResolver::new(providers),
            building: BuildingLedgerClient::new(
                providers.building_key.clone(),
                Duration::from_secs(providers.timeout_secs),
            ),
            land: LandService::new(providers),
        }
    }

    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    pub fn building(&self) -> &BuildingLedgerClient {
        &self.building
    }

    /// Full analysis for one address. The three lookups run as independent
    /// concurrent calls with no shared state; partial failures land in
    /// `errors` rather than failing the request.
    pub async fn analyze(&self, address: &str) -> AnalysisResult {
        info!("Starting property analysis: {}", address);

        let (resolved, building, land) = tokio::join!(
            self.resolver.resolve(address),
            self.building.lookup(address),
            self.land.analyze(address),
        );

        let mut result = AnalysisResult::new(address);
        result.address_info = Some(resolved);

        match building {
            Ok(record) => result.building_info = Some(record),
            Err(e) => {
                warn!("Building lookup failed for {}: {}", address, e);
                result.errors.push(format!("building ledger lookup failed: {}", e));
            }
        }

        if land.success {
            result.land_info = Some(land);
        } else {
            warn!("Land analysis failed for {}: {}", address, land.message);
            result.errors.push(format!("land analysis failed: {}", land.message));
        }

        let result = finalize(result);
        info!(
            "Property analysis complete: {} (success: {}, completeness: {:.1})",
            address, result.success, result.completeness
        );
        result
    }
}

/// Apply the success rule, warning flag, message and completeness score.
///
/// `success` is false only when address, building and land info are all
/// absent. A fallback coordinate keeps `success = true` but sets `warning`.
pub fn finalize(mut result: AnalysisResult) -> AnalysisResult {
    let is_fallback = result
        .address_info
        .as_ref()
        .map(|a| a.is_fallback)
        .unwrap_or(false);

    let all_absent = result.address_info.is_none()
        && result.building_info.is_none()
        && result.land_info.is_none();

    if all_absent {
        result.success = false;
        result.message = "all public-data lookups failed".to_string();
    } else {
        result.success = true;
        if is_fallback {
            result.warning = Some(
                "primary geocoder unreachable; static fallback coordinates used (low accuracy)"
                    .to_string(),
            );
        }
        result.message = if is_fallback && !result.errors.is_empty() {
            format!(
                "analysis completed with approximate coordinates; {} lookup error(s)",
                result.errors.len()
            )
        } else if !result.errors.is_empty() {
            format!("some lookups failed: {} error(s)", result.errors.len())
        } else {
            "public-data analysis completed".to_string()
        };
    }

    result.completeness = completeness(&result);
    result
}

/// Weighted completeness: address 30, building 15+15+10, land 10+10+10,
/// error-penalty block 20/10/0, as a percentage of the 120-point maximum.
pub fn completeness(result: &AnalysisResult) -> f64 {
    let mut total = 0u32;
    let mut max = 0u32;

    max += 30;
    if matches!(&result.address_info, Some(ResolvedCoordinate { success: true, .. })) {
        total += 30;
    }

    max += 40;
    if let Some(building) = &result.building_info {
        if building.overview.is_some() {
            total += 15;
        }
        if building.areas.is_some() {
            total += 15;
        }
        if building.title.is_some() {
            total += 10;
        }
    }

    max += 30;
    if let Some(land) = &result.land_info {
        if land.success {
            if land.address_search.is_some() {
                total += 10;
            }
            if land.regulation.is_some() {
                total += 10;
            }
            if land.characteristics.is_some() {
                total += 10;
            }
        }
    }

    max += 20;
    match result.errors.len() {
        0 => total += 20,
        1 => total += 10,
        _ => {}
    }

    f64::from(total) / f64::from(max) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AdminCodes, BuildingOverview, BuildingRecord, BuildingTitle, LandAnalysis, ResolveMethod,
    };

    fn sample_codes() -> AdminCodes {
        AdminCodes {
            sigungu: "11680".to_string(),
            bdong: "10300".to_string(),
            bun: "0123".to_string(),
            ji: "0045".to_string(),
        }
    }

    fn geocoded_result() -> AnalysisResult {
        let mut result = AnalysisResult::new("서울 강남구 역삼동 123-45");
        result.address_info = Some(ResolvedCoordinate::geocoded(
            "서울 강남구 역삼동 123-45",
            127.0276,
            37.4979,
            ResolveMethod::VworldDirect,
        ));
        result
    }

    #[test]
    fn test_success_false_only_when_everything_absent() {
        let empty = finalize(AnalysisResult::new("어딘가"));
        assert!(!empty.success);

        let with_address = finalize(geocoded_result());
        assert!(with_address.success);

        let mut with_land_only = AnalysisResult::new("어딘가");
        let mut land = LandAnalysis::new("어딘가");
        land.success = true;
        with_land_only.land_info = Some(land);
        assert!(finalize(with_land_only).success);
    }

    #[test]
    fn test_completeness_address_only() {
        let result = finalize(geocoded_result());
        // 30 (address) + 20 (no errors) of 120
        assert_eq!(result.completeness, 50.0 / 120.0 * 100.0);
    }

    #[test]
    fn test_completeness_empty_result() {
        let result = finalize(AnalysisResult::new("어딘가"));
        // Only the zero-error block scores
        assert_eq!(result.completeness, 20.0 / 120.0 * 100.0);
    }

    #[test]
    fn test_completeness_error_penalty_steps() {
        let mut one_error = geocoded_result();
        one_error.errors.push("lookup failed".to_string());
        let one = finalize(one_error);
        assert_eq!(one.completeness, 40.0 / 120.0 * 100.0);

        let mut two_errors = geocoded_result();
        two_errors.errors.push("lookup failed".to_string());
        two_errors.errors.push("another failed".to_string());
        let two = finalize(two_errors);
        assert_eq!(two.completeness, 30.0 / 120.0 * 100.0);
    }

    #[test]
    fn test_completeness_monotonic_in_building_sections() {
        let mut base = geocoded_result();
        let mut record = BuildingRecord::new("서울 강남구 역삼동 123-45", sample_codes());
        record.overview = Some(BuildingOverview::default());
        base.building_info = Some(record.clone());
        let without_title = finalize(base.clone());

        record.title = Some(BuildingTitle::default());
        base.building_info = Some(record);
        let with_title = finalize(base);

        assert!(with_title.completeness > without_title.completeness);
        let delta = with_title.completeness - without_title.completeness;
        assert!((delta - 10.0 / 120.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_sets_warning_but_keeps_success() {
        let mut result = AnalysisResult::new("서울 강남구 역삼동 123-45");
        result.address_info = Some(ResolvedCoordinate::fallback(
            "서울 강남구 역삼동 123-45",
            127.0276,
            37.4979,
            ResolveMethod::StaticKeyword,
            "approximate".to_string(),
        ));
        result.errors.push("building ledger lookup failed".to_string());

        let result = finalize(result);
        assert!(result.success);
        assert!(result.warning.is_some());
        assert!(result.message.contains("approximate"));
    }

    #[test]
    fn test_summary_reflects_result() {
        let result = finalize(geocoded_result());
        let summary = result.summary();
        assert!(summary.address_found);
        assert!(!summary.building_info_found);
        assert_eq!(summary.error_count, 0);
        assert_eq!(summary.completeness, result.completeness);
    }
}
