use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One raw item from an API page or a local CSV export, before field resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    pub fn from_object(object: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            data: object.into_iter().collect(),
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            data: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), serde_json::Value::String(v.into())))
                .collect(),
        }
    }
}

/// The three public datasets the collector knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    ChargingStation,
    Walkway,
    DisabilityFacilities,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [
        Dataset::ChargingStation,
        Dataset::Walkway,
        Dataset::DisabilityFacilities,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Dataset::ChargingStation => "charging_station",
            Dataset::Walkway => "walkway",
            Dataset::DisabilityFacilities => "disability_facilities",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Dataset::ChargingStation => "daegu_charging_stations.csv",
            Dataset::Walkway => "daegu_walkways.csv",
            Dataset::DisabilityFacilities => "daegu_disability_facilities.csv",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dataset::ChargingStation => "급속충전기",
            Dataset::Walkway => "보행로",
            Dataset::DisabilityFacilities => "장애인 편의시설",
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingStation {
    pub station_id: String,
    pub station_name: String,
    pub address: String,
    pub district: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub charging_type: String,
    pub simultaneous_capacity: Option<u32>,
    pub weekday_open: Option<String>,
    pub weekday_close: Option<String>,
    pub air_pump: bool,
    pub phone_charging: bool,
    pub distance_to_walkway_m: Option<f64>,
    pub near_walkway: bool,
    pub accessibility_score: f64,
    pub last_updated: String,
}

impl ChargingStation {
    pub fn is_open_all_day(&self) -> bool {
        self.weekday_open.as_deref() == Some("00:00")
    }

    pub fn has_all_amenities(&self) -> bool {
        self.is_open_all_day() && self.air_pump && self.phone_charging
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Walkway {
    pub walkway_id: String,
    pub walkway_name: String,
    pub address: String,
    pub district: Option<String>,
    pub walkway_type: String,
    pub width_m: Option<f64>,
    pub length_m: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub wheelchair_accessible: bool,
    pub distance_to_charging_m: Option<f64>,
    pub near_charging_station: bool,
    pub last_updated: String,
}

impl Walkway {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisabilityFacility {
    pub facility_id: String,
    pub facility_name: String,
    pub facility_type: String,
    pub address: String,
    pub district: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// The three region tables handed from collection to analysis and visualization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedData {
    pub charging_stations: Vec<ChargingStation>,
    pub walkways: Vec<Walkway>,
    pub facilities: Vec<DisabilityFacility>,
}

impl CollectedData {
    pub fn total_records(&self) -> usize {
        self.charging_stations.len() + self.walkways.len() + self.facilities.len()
    }
}

/// Raw API records per dataset plus where they came from.
#[derive(Debug, Clone, Default)]
pub struct RawCollection {
    pub records: HashMap<Dataset, Vec<Record>>,
    pub sample_fallback: Vec<Dataset>,
}

impl RawCollection {
    pub fn records(&self, dataset: Dataset) -> &[Record] {
        self.records
            .get(&dataset)
            .map(|r| r.as_slice())
            .unwrap_or(&[])
    }

    pub fn used_sample(&self, dataset: Dataset) -> bool {
        self.sample_fallback.contains(&dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(open: Option<&str>, air: bool, phone: bool) -> ChargingStation {
        ChargingStation {
            station_id: "1".to_string(),
            station_name: "수성구청 급속충전기".to_string(),
            address: "대구광역시 수성구 달구벌대로 2423".to_string(),
            district: Some("수성구".to_string()),
            latitude: Some(35.858),
            longitude: Some(128.630),
            charging_type: "급속충전".to_string(),
            simultaneous_capacity: Some(2),
            weekday_open: open.map(str::to_string),
            weekday_close: None,
            air_pump: air,
            phone_charging: phone,
            distance_to_walkway_m: None,
            near_walkway: false,
            accessibility_score: 0.0,
            last_updated: "2025-01-01".to_string(),
        }
    }

    #[test]
    fn test_all_day_requires_midnight_opening() {
        assert!(station(Some("00:00"), false, false).is_open_all_day());
        assert!(!station(Some("09:00"), false, false).is_open_all_day());
        assert!(!station(None, false, false).is_open_all_day());
    }

    #[test]
    fn test_all_amenities() {
        assert!(station(Some("00:00"), true, true).has_all_amenities());
        assert!(!station(Some("00:00"), true, false).has_all_amenities());
    }

    #[test]
    fn test_raw_collection_missing_dataset_is_empty() {
        let raw = RawCollection::default();
        assert!(raw.records(Dataset::Walkway).is_empty());
        assert!(!raw.used_sample(Dataset::Walkway));
    }
}
