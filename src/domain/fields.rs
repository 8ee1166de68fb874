//! Resolves canonical fields from raw records.
//!
//! The same dataset arrives under several naming schemes: the OpenAPI item
//! names (`sttnNm`), the standard-data names (`fcltyNm`) and the Korean
//! headers of the downloadable CSV (`시설명`). Every canonical field carries an
//! ordered alias list and the first present, non-empty alias wins.

use crate::domain::model::{ChargingStation, Dataset, DisabilityFacility, Record, Walkway};
use serde_json::Value;
use std::collections::HashMap;

const CHARGING_ALIASES: &[(&str, &[&str])] = &[
    ("station_id", &["sttnId", "station_id"]),
    ("station_name", &["sttnNm", "fcltyNm", "station_name", "시설명"]),
    (
        "address",
        &["adres", "rdnmadr", "lnmadr", "address", "소재지도로명주소", "소재지지번주소"],
    ),
    ("province", &["ctprvnNm", "시도명"]),
    ("district", &["signguNm", "district", "시군구명"]),
    ("latitude", &["latitude", "lat", "위도"]),
    ("longitude", &["longitude", "lng", "lon", "경도"]),
    ("charging_type", &["chgerType", "charging_type"]),
    (
        "simultaneous_capacity",
        &["smtmUseCo", "simultaneous_capacity", "동시사용가능대수"],
    ),
    (
        "weekday_open",
        &["weekdayOperOpenHhmm", "weekday_open", "평일운영시작시각"],
    ),
    (
        "weekday_close",
        &["weekdayOperColseHhmm", "weekdayOperCloseHhmm", "weekday_close", "평일운영종료시각"],
    ),
    ("air_pump", &["airInjectorYn", "air_pump", "공기주입가능여부"]),
    (
        "phone_charging",
        &["moblphonChrstnYn", "phone_charging", "휴대전화충전가능여부"],
    ),
];

const WALKWAY_ALIASES: &[(&str, &[&str])] = &[
    ("walkway_id", &["walkwayId", "walkway_id"]),
    ("walkway_name", &["walkwayName", "walkway_name"]),
    ("address", &["address", "adres", "rdnmadr", "lnmadr", "소재지도로명주소"]),
    ("province", &["ctprvnNm", "시도명"]),
    ("district", &["signguNm", "district", "시군구명"]),
    ("latitude", &["latitude", "lat", "위도"]),
    ("longitude", &["longitude", "lng", "lon", "경도"]),
    ("walkway_type", &["walkwayType", "walkway_type"]),
    ("width_m", &["widthMeters", "width_meters", "width_m"]),
    ("length_m", &["lengthMeters", "length_meters", "length_m"]),
    (
        "wheelchair_accessible",
        &["wheelchairAccessible", "wheelchair_accessible"],
    ),
];

const FACILITY_ALIASES: &[(&str, &[&str])] = &[
    ("facility_id", &["facilityId", "facility_id"]),
    (
        "facility_name",
        &["facilityName", "facility_name", "fcltyNm", "센터명", "시설명"],
    ),
    ("facility_type", &["facilityType", "facility_type", "시설유형"]),
    ("address", &["address", "rdnmadr", "lnmadr", "소재지도로명주소"]),
    ("province", &["ctprvnNm", "시도명"]),
    ("district", &["signguNm", "district", "시군구명"]),
    ("latitude", &["latitude", "lat", "위도"]),
    ("longitude", &["longitude", "lng", "lon", "경도"]),
];

#[derive(Debug, Clone)]
pub struct FieldResolver {
    aliases: HashMap<String, Vec<String>>,
}

impl FieldResolver {
    /// Built-in aliases for `dataset`; configured aliases are tried first.
    pub fn new(dataset: Dataset, overrides: Option<&HashMap<String, Vec<String>>>) -> Self {
        let defaults = match dataset {
            Dataset::ChargingStation => CHARGING_ALIASES,
            Dataset::Walkway => WALKWAY_ALIASES,
            Dataset::DisabilityFacilities => FACILITY_ALIASES,
        };

        let mut aliases: HashMap<String, Vec<String>> = defaults
            .iter()
            .map(|(field, names)| {
                (
                    field.to_string(),
                    names.iter().map(|n| n.to_string()).collect(),
                )
            })
            .collect();

        if let Some(overrides) = overrides {
            for (field, names) in overrides {
                let entry = aliases.entry(field.clone()).or_default();
                let mut merged = names.clone();
                merged.extend(entry.iter().filter(|n| !names.contains(n)).cloned());
                *entry = merged;
            }
        }

        Self { aliases }
    }

    fn raw<'a>(&self, record: &'a Record, field: &str) -> Option<&'a Value> {
        self.aliases.get(field)?.iter().find_map(|alias| {
            record.data.get(alias).filter(|value| match value {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            })
        })
    }

    pub fn text(&self, record: &Record, field: &str) -> Option<String> {
        match self.raw(record, field)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Numeric value, coercing unparseable input to `None`.
    pub fn number(&self, record: &Record, field: &str) -> Option<f64> {
        let value = match self.raw(record, field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|v| v.is_finite())
    }

    pub fn flag(&self, record: &Record, field: &str) -> Option<bool> {
        match self.raw(record, field)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|v| v != 0.0),
            Value::String(s) => parse_flag(s),
            _ => None,
        }
    }

    pub fn charging_station(
        &self,
        record: &Record,
        index: usize,
        district: Option<String>,
        collected_on: &str,
    ) -> ChargingStation {
        ChargingStation {
            station_id: self
                .text(record, "station_id")
                .unwrap_or_else(|| format!("CS-{:04}", index + 1)),
            station_name: self
                .text(record, "station_name")
                .unwrap_or_else(|| format!("급속충전기_{:03}", index + 1)),
            address: self.text(record, "address").unwrap_or_default(),
            district,
            latitude: self.number(record, "latitude"),
            longitude: self.number(record, "longitude"),
            charging_type: self
                .text(record, "charging_type")
                .unwrap_or_else(|| "급속충전".to_string()),
            simultaneous_capacity: self
                .number(record, "simultaneous_capacity")
                .filter(|v| *v >= 0.0)
                .map(|v| v.round() as u32),
            weekday_open: self
                .text(record, "weekday_open")
                .and_then(|t| normalize_hhmm(&t)),
            weekday_close: self
                .text(record, "weekday_close")
                .and_then(|t| normalize_hhmm(&t)),
            air_pump: self.flag(record, "air_pump").unwrap_or(false),
            phone_charging: self.flag(record, "phone_charging").unwrap_or(false),
            distance_to_walkway_m: None,
            near_walkway: false,
            accessibility_score: 0.0,
            last_updated: collected_on.to_string(),
        }
    }

    /// Walkways without an explicit accessibility flag are judged by width,
    /// and pedestrian overpasses never count as accessible.
    pub fn walkway(
        &self,
        record: &Record,
        index: usize,
        district: Option<String>,
        collected_on: &str,
        min_accessible_width_m: f64,
    ) -> Walkway {
        let walkway_type = self
            .text(record, "walkway_type")
            .unwrap_or_else(|| "보도블록".to_string());
        let width_m = self.number(record, "width_m");
        let wheelchair_accessible = self
            .flag(record, "wheelchair_accessible")
            .unwrap_or_else(|| {
                walkway_type != "육교"
                    && width_m.map(|w| w >= min_accessible_width_m).unwrap_or(false)
            });

        Walkway {
            walkway_id: self
                .text(record, "walkway_id")
                .unwrap_or_else(|| format!("WW-{:04}", index + 1)),
            walkway_name: self
                .text(record, "walkway_name")
                .unwrap_or_else(|| format!("보행로_{:03}", index + 1)),
            address: self.text(record, "address").unwrap_or_default(),
            district,
            walkway_type,
            width_m,
            length_m: self.number(record, "length_m"),
            latitude: self.number(record, "latitude"),
            longitude: self.number(record, "longitude"),
            wheelchair_accessible,
            distance_to_charging_m: None,
            near_charging_station: false,
            last_updated: collected_on.to_string(),
        }
    }

    pub fn facility(
        &self,
        record: &Record,
        index: usize,
        district: Option<String>,
    ) -> DisabilityFacility {
        DisabilityFacility {
            facility_id: self
                .text(record, "facility_id")
                .unwrap_or_else(|| format!("DF-{:04}", index + 1)),
            facility_name: self
                .text(record, "facility_name")
                .unwrap_or_else(|| format!("편의시설_{:03}", index + 1)),
            facility_type: self.text(record, "facility_type").unwrap_or_default(),
            address: self.text(record, "address").unwrap_or_default(),
            district,
            latitude: self.number(record, "latitude"),
            longitude: self.number(record, "longitude"),
        }
    }
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "y" | "yes" | "true" | "1" | "o" | "가능" | "예" | "있음" => Some(true),
        "n" | "no" | "false" | "0" | "x" | "불가능" | "아니오" | "없음" => Some(false),
        _ => None,
    }
}

/// Normalizes "0900", "9:00" or "09:00:00" to "HH:MM".
pub fn normalize_hhmm(value: &str) -> Option<String> {
    let value = value.trim();
    let (hours, minutes) = if let Some((h, rest)) = value.split_once(':') {
        let m = rest.split(':').next().unwrap_or("0");
        (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?)
    } else if value.len() == 4 && value.chars().all(|c| c.is_ascii_digit()) {
        (value[..2].parse().ok()?, value[2..].parse().ok()?)
    } else if value.len() == 3 && value.chars().all(|c| c.is_ascii_digit()) {
        (value[..1].parse().ok()?, value[1..].parse().ok()?)
    } else {
        return None;
    };

    if hours > 24 || minutes > 59 {
        return None;
    }
    Some(format!("{:02}:{:02}", hours, minutes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        match value {
            Value::Object(obj) => Record::from_object(obj),
            _ => panic!("test records must be objects"),
        }
    }

    #[test]
    fn test_first_present_alias_wins() {
        let resolver = FieldResolver::new(Dataset::ChargingStation, None);
        let rec = record(json!({
            "adres": "",
            "rdnmadr": "대구광역시 중구 공평로 88",
            "lnmadr": "대구광역시 중구 동인동1가 2-1"
        }));
        assert_eq!(
            resolver.text(&rec, "address").as_deref(),
            Some("대구광역시 중구 공평로 88")
        );
    }

    #[test]
    fn test_configured_aliases_take_priority() {
        let mut overrides = HashMap::new();
        overrides.insert("station_name".to_string(), vec!["customName".to_string()]);
        let resolver = FieldResolver::new(Dataset::ChargingStation, Some(&overrides));
        let rec = record(json!({"customName": "A", "sttnNm": "B"}));
        assert_eq!(resolver.text(&rec, "station_name").as_deref(), Some("A"));

        let fallback = record(json!({"sttnNm": "B"}));
        assert_eq!(resolver.text(&fallback, "station_name").as_deref(), Some("B"));
    }

    #[test]
    fn test_numbers_are_coerced() {
        let resolver = FieldResolver::new(Dataset::Walkway, None);
        let rec = record(json!({"latitude": "35.87", "longitude": 128.6, "widthMeters": "넓음"}));
        assert_eq!(resolver.number(&rec, "latitude"), Some(35.87));
        assert_eq!(resolver.number(&rec, "longitude"), Some(128.6));
        assert_eq!(resolver.number(&rec, "width_m"), None);
    }

    #[test]
    fn test_flags() {
        assert_eq!(parse_flag("Y"), Some(true));
        assert_eq!(parse_flag("n"), Some(false));
        assert_eq!(parse_flag("가능"), Some(true));
        assert_eq!(parse_flag("unknown"), None);
    }

    #[test]
    fn test_normalize_hhmm() {
        assert_eq!(normalize_hhmm("00:00").as_deref(), Some("00:00"));
        assert_eq!(normalize_hhmm("0900").as_deref(), Some("09:00"));
        assert_eq!(normalize_hhmm("9:30").as_deref(), Some("09:30"));
        assert_eq!(normalize_hhmm("18:00:00").as_deref(), Some("18:00"));
        assert_eq!(normalize_hhmm("야간"), None);
        assert_eq!(normalize_hhmm("25:00"), None);
    }

    #[test]
    fn test_charging_station_from_standard_data_item() {
        let resolver = FieldResolver::new(Dataset::ChargingStation, None);
        let rec = record(json!({
            "fcltyNm": "대구역 급속충전기",
            "ctprvnNm": "대구광역시",
            "signguNm": "북구",
            "rdnmadr": "대구광역시 북구 태평로 161",
            "latitude": "35.8796",
            "longitude": "128.5962",
            "smtmUseCo": "2",
            "weekdayOperOpenHhmm": "00:00",
            "airInjectorYn": "Y",
            "moblphonChrstnYn": "N"
        }));
        let station = resolver.charging_station(&rec, 0, Some("북구".to_string()), "2025-03-01");

        assert_eq!(station.station_id, "CS-0001");
        assert_eq!(station.station_name, "대구역 급속충전기");
        assert_eq!(station.simultaneous_capacity, Some(2));
        assert!(station.is_open_all_day());
        assert!(station.air_pump);
        assert!(!station.phone_charging);
        assert_eq!(station.last_updated, "2025-03-01");
    }

    #[test]
    fn test_walkway_accessibility_fallback_uses_width_and_type() {
        let resolver = FieldResolver::new(Dataset::Walkway, None);
        let wide = record(json!({"walkwayType": "경사로", "widthMeters": "2.0"}));
        let narrow = record(json!({"walkwayType": "경사로", "widthMeters": "1.2"}));
        let overpass = record(json!({"walkwayType": "육교", "widthMeters": "3.0"}));
        let explicit = record(json!({"walkwayType": "육교", "wheelchairAccessible": "Y"}));

        assert!(resolver.walkway(&wide, 0, None, "d", 1.5).wheelchair_accessible);
        assert!(!resolver.walkway(&narrow, 0, None, "d", 1.5).wheelchair_accessible);
        assert!(!resolver.walkway(&overpass, 0, None, "d", 1.5).wheelchair_accessible);
        assert!(resolver.walkway(&explicit, 0, None, "d", 1.5).wheelchair_accessible);
    }
}
