//! Administrative code tuple derived from address text.

use serde::{Deserialize, Serialize};

/// (sigungu, bdong, main lot, sub lot) quadruple.
///
/// Derived heuristically by substring matching (see `registry::codes`); a
/// best-effort regional guess, not guaranteed correct for addresses outside
/// the known region table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCodes {
    /// 5-digit city/district code
    pub sigungu: String,
    /// 5-digit legal-dong code
    pub bdong: String,
    /// 4-digit main lot number
    pub bun: String,
    /// 4-digit sub lot number
    pub ji: String,
}

impl AdminCodes {
    /// Synthesize the 19-character parcel identifier used by land-registry
    /// lookups: legal-dong code (10) + land-type digit (1 = registered land)
    /// + main lot (4) + sub lot (4).
    pub fn pnu(&self) -> String {
        format!("{}{}1{}{}", self.sigungu, self.bdong, self.bun, self.ji)
    }
}

impl std::fmt::Display for AdminCodes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}-{}", self.sigungu, self.bdong, self.bun, self.ji)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pnu_is_19_chars() {
        let codes = AdminCodes {
            sigungu: "11680".to_string(),
            bdong: "10300".to_string(),
            bun: "0123".to_string(),
            ji: "0045".to_string(),
        };
        let pnu = codes.pnu();
        assert_eq!(pnu.len(), 19);
        assert_eq!(pnu, "1168010300101230045");
    }
}
