//! Heuristic derivation of administrative codes from address text.
//!
//! Substring-matches a small fixed set of region names against hardcoded
//! (sigungu, bdong) code pairs. Deterministic but frequently wrong for
//! addresses outside the known set — a documented accuracy limitation of the
//! pipeline, not a bug to silently fix.

use regex::Regex;

use crate::models::AdminCodes;

/// Derive the (sigungu, bdong, bun, ji) tuple for an address. The same input
/// always yields the same tuple.
pub fn derive(address: &str) -> AdminCodes {
    let (sigungu, bdong) = region_codes(address);
    let (bun, ji) = lot_numbers(address);
    AdminCodes {
        sigungu: sigungu.to_string(),
        bdong: bdong.to_string(),
        bun,
        ji,
    }
}

fn region_codes(address: &str) -> (&'static str, &'static str) {
    if address.contains("서울") {
        if address.contains("강남구") {
            if address.contains("삼성동") {
                ("11680", "10400")
            } else {
                // 역삼동 and the district default share a code
                ("11680", "10300")
            }
        } else if address.contains("서초구") {
            ("11650", "10600")
        } else {
            // Jongno-gu default
            ("11110", "10100")
        }
    } else if address.contains("경기") {
        if address.contains("성남시") && address.contains("분당구") {
            ("41135", "11000")
        } else {
            // Suwon default
            ("41111", "10100")
        }
    } else {
        // Unlisted regions fall back to Gangnam-gu / Yeoksam-dong
        ("11680", "10300")
    }
}

/// First numeric run becomes the lot number: "123-45" → ("0123", "0045").
fn lot_numbers(address: &str) -> (String, String) {
    let pattern = Regex::new(r"(\d+)(?:-(\d+))?").unwrap();
    match pattern.captures(address) {
        Some(caps) => {
            let bun = format!("{:0>4}", &caps[1]);
            let ji = format!("{:0>4}", caps.get(2).map(|m| m.as_str()).unwrap_or("0"));
            (bun, ji)
        }
        None => ("0001".to_string(), "0000".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_district_with_lot_number() {
        let codes = derive("서울특별시 강남구 역삼동 123-45");
        assert_eq!(codes.sigungu, "11680");
        assert_eq!(codes.bdong, "10300");
        assert_eq!(codes.bun, "0123");
        assert_eq!(codes.ji, "0045");
    }

    #[test]
    fn test_samseong_dong_code() {
        let codes = derive("서울 강남구 삼성동 1");
        assert_eq!(codes.bdong, "10400");
        assert_eq!(codes.bun, "0001");
        assert_eq!(codes.ji, "0000");
    }

    #[test]
    fn test_bundang_district() {
        let codes = derive("경기도 성남시 분당구 백현동 542");
        assert_eq!(codes.sigungu, "41135");
        assert_eq!(codes.bdong, "11000");
        assert_eq!(codes.bun, "0542");
    }

    #[test]
    fn test_no_lot_number_defaults() {
        let codes = derive("서울특별시 서초구 서초동");
        assert_eq!(codes.sigungu, "11650");
        assert_eq!(codes.bun, "0001");
        assert_eq!(codes.ji, "0000");
    }

    #[test]
    fn test_unlisted_region_uses_default_pair() {
        let codes = derive("부산광역시 해운대구 우동 100");
        assert_eq!(codes.sigungu, "11680");
        assert_eq!(codes.bdong, "10300");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let address = "서울특별시 강남구 역삼동 123-45";
        assert_eq!(derive(address), derive(address));
        assert_eq!(derive(address).pnu(), derive(address).pnu());
    }
}
