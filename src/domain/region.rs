use crate::utils::error::{AccessError, Result};
use regex::Regex;

/// Decides which records belong to the study region and which district they sit in.
#[derive(Debug, Clone)]
pub struct RegionFilter {
    name: String,
    short_name: String,
    districts: Vec<String>,
    district_pattern: Regex,
}

impl RegionFilter {
    pub fn new(name: &str, short_name: &str, districts: &[String]) -> Result<Self> {
        let pattern = format!(r"{}\s*([가-힣]+(?:구|군))", regex::escape(name));
        let district_pattern = Regex::new(&pattern).map_err(|e| AccessError::ConfigValidationError {
            field: "region.name".to_string(),
            message: format!("cannot build district pattern: {}", e),
        })?;

        Ok(Self {
            name: name.to_string(),
            short_name: short_name.to_string(),
            districts: districts.to_vec(),
            district_pattern,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn districts(&self) -> &[String] {
        &self.districts
    }

    pub fn matches(&self, province: Option<&str>, address: &str) -> bool {
        if province.map(|p| p.trim() == self.name).unwrap_or(false) {
            return true;
        }
        !self.short_name.is_empty() && address.contains(&self.short_name)
    }

    /// Uses the record's own district when present, otherwise reads it from the address.
    pub fn district_for(&self, explicit: Option<String>, address: &str) -> Option<String> {
        explicit
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .or_else(|| self.extract_district(address))
    }

    pub fn extract_district(&self, address: &str) -> Option<String> {
        self.district_pattern
            .captures(address)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Position of `district` in the configured order, unknown districts last.
    pub fn order_of(&self, district: &str) -> usize {
        self.districts
            .iter()
            .position(|d| d == district)
            .unwrap_or(self.districts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daegu() -> RegionFilter {
        let districts: Vec<String> = ["중구", "동구", "서구", "남구", "북구", "수성구", "달서구", "달성군", "군위군"]
            .iter()
            .map(|d| d.to_string())
            .collect();
        RegionFilter::new("대구광역시", "대구", &districts).unwrap()
    }

    #[test]
    fn test_matches_by_province_or_address() {
        let region = daegu();
        assert!(region.matches(Some("대구광역시"), ""));
        assert!(region.matches(None, "대구광역시 수성구 무학로 227"));
        assert!(!region.matches(Some("부산광역시"), "부산광역시 해운대구 센텀로 1"));
    }

    #[test]
    fn test_extract_district_from_address() {
        let region = daegu();
        assert_eq!(
            region.extract_district("대구광역시 달서구 월배로 100").as_deref(),
            Some("달서구")
        );
        assert_eq!(
            region.extract_district("대구광역시 달성군 화원읍 비슬로 2600").as_deref(),
            Some("달성군")
        );
        assert_eq!(region.extract_district("대구 어딘가"), None);
    }

    #[test]
    fn test_explicit_district_wins() {
        let region = daegu();
        assert_eq!(
            region
                .district_for(Some("중구".to_string()), "대구광역시 동구 아양로 1")
                .as_deref(),
            Some("중구")
        );
        assert_eq!(
            region
                .district_for(Some(" ".to_string()), "대구광역시 동구 아양로 1")
                .as_deref(),
            Some("동구")
        );
    }

    #[test]
    fn test_order_of_unknown_is_last() {
        let region = daegu();
        assert_eq!(region.order_of("중구"), 0);
        assert_eq!(region.order_of("해운대구"), 9);
    }
}
