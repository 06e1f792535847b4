//! Static centroid fallback used when every live geocoding attempt fails.

use crate::models::GeoPoint;

/// Known region centroids, matched as address substrings. District-level
/// entries are longer than their city-level counterparts so that
/// longest-match-wins picks the most specific region.
pub const REGION_CENTROIDS: &[(&str, f64, f64)] = &[
    ("테헤란로", 127.0276, 37.4979),
    ("강남구", 127.0276, 37.4979),
    ("강남", 127.0276, 37.4979),
    ("서초구", 127.0276, 37.4833),
    ("서초", 127.0276, 37.4833),
    ("서울", 126.9780, 37.5665),
    ("종로구", 126.9784, 37.5703),
    ("종로", 126.9784, 37.5703),
    ("중구", 126.9996, 37.5640),
    ("마포구", 126.9015, 37.5637),
    ("영등포구", 126.8963, 37.5264),
    ("부산", 129.0756, 35.1796),
    ("대구", 128.6014, 35.8714),
    ("인천", 126.7052, 37.4563),
    ("경기도", 127.2018, 37.4138),
    ("수원", 127.0286, 37.2636),
    ("성남", 127.1378, 37.4449),
    ("고양", 126.8577, 37.6564),
];

/// Default centroid (Seoul City Hall) when no keyword matches.
pub const DEFAULT_CENTROID: GeoPoint = GeoPoint {
    lon: 126.9780,
    lat: 37.5665,
};

/// Longest keyword contained in the address wins.
pub fn keyword_centroid(address: &str) -> Option<(&'static str, GeoPoint)> {
    REGION_CENTROIDS
        .iter()
        .filter(|(keyword, _, _)| address.contains(keyword))
        .max_by_key(|(keyword, _, _)| keyword.chars().count())
        .map(|&(keyword, lon, lat)| (keyword, GeoPoint { lon, lat }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_match_wins() {
        // Contains both 서울 and 강남구; the longer district entry must win.
        let (keyword, point) = keyword_centroid("서울특별시 강남구 역삼동 123-45").unwrap();
        assert_eq!(keyword, "강남구");
        assert_eq!(point.lon, 127.0276);
        assert_eq!(point.lat, 37.4979);
    }

    #[test]
    fn test_city_level_match() {
        let (keyword, point) = keyword_centroid("서울특별시 어딘가 1-2").unwrap();
        assert_eq!(keyword, "서울");
        assert_eq!(point.lon, 126.9780);
        assert_eq!(point.lat, 37.5665);
    }

    #[test]
    fn test_street_beats_district() {
        let (keyword, _) = keyword_centroid("서울 강남구 테헤란로 152").unwrap();
        assert_eq!(keyword, "테헤란로");
    }

    #[test]
    fn test_no_match_for_unknown_region() {
        assert!(keyword_centroid("제주도 서귀포시 1번지").is_none());
    }
}
