//! Deterministic stand-in tables used when the portal cannot be reached.

use crate::domain::model::{ChargingStation, Walkway};

pub const SAMPLE_STATION_COUNT: usize = 80;
pub const SAMPLE_WALKWAY_COUNT: usize = 120;
pub const WALKWAY_TYPES: [&str; 5] = ["보도블록", "경사로", "엘리베이터", "육교", "지하도"];

const SPREAD_DEGREES: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct SampleSpec {
    pub region_name: String,
    pub districts: Vec<String>,
    pub center: (f64, f64),
    pub collected_on: String,
}

impl SampleSpec {
    fn district(&self, i: usize) -> Option<String> {
        if self.districts.is_empty() {
            None
        } else {
            Some(self.districts[i % self.districts.len()].clone())
        }
    }

    /// Point within +-SPREAD/2 of the center; stable across runs.
    fn point(&self, i: usize, salt: f64) -> (f64, f64) {
        (
            self.center.0 + (unit_noise(i as f64, salt) - 0.5) * SPREAD_DEGREES,
            self.center.1 + (unit_noise(i as f64, salt + 1.0) - 0.5) * SPREAD_DEGREES,
        )
    }
}

fn unit_noise(x: f64, salt: f64) -> f64 {
    let v = (x * 12.9898 + salt * 78.233).sin() * 43758.5453;
    v - v.floor()
}

pub fn charging_stations(spec: &SampleSpec) -> Vec<ChargingStation> {
    (0..SAMPLE_STATION_COUNT)
        .map(|i| {
            let district = spec.district(i);
            let (lat, lon) = spec.point(i, 1.0);
            ChargingStation {
                station_id: (i + 1).to_string(),
                station_name: format!("대구장애인휠체어급속충전기_{:03}", i + 1),
                address: format!(
                    "{} {} 충전기{:03}길",
                    spec.region_name,
                    district.as_deref().unwrap_or_default(),
                    i + 1
                ),
                district,
                latitude: Some(lat),
                longitude: Some(lon),
                charging_type: if i % 2 == 0 { "급속충전" } else { "완속충전" }.to_string(),
                simultaneous_capacity: Some(1 + (i % 3) as u32),
                weekday_open: Some(if i % 3 == 0 { "00:00" } else { "09:00" }.to_string()),
                weekday_close: Some(if i % 3 == 0 { "23:59" } else { "18:00" }.to_string()),
                air_pump: i % 2 == 0,
                phone_charging: i % 4 != 3,
                distance_to_walkway_m: None,
                near_walkway: false,
                accessibility_score: 0.0,
                last_updated: spec.collected_on.clone(),
            }
        })
        .collect()
}

pub fn walkways(spec: &SampleSpec) -> Vec<Walkway> {
    (0..SAMPLE_WALKWAY_COUNT)
        .map(|i| {
            let district = spec.district(i);
            let walkway_type = WALKWAY_TYPES[i % WALKWAY_TYPES.len()];
            let (lat, lon) = spec.point(i, 7.0);
            Walkway {
                walkway_id: (i + 1).to_string(),
                walkway_name: format!("대구보행로_{:03}", i + 1),
                address: format!(
                    "{} {} 보행로{:03}",
                    spec.region_name,
                    district.as_deref().unwrap_or_default(),
                    i + 1
                ),
                district,
                walkway_type: walkway_type.to_string(),
                width_m: Some(1.0 + (i % 12) as f64 * 0.2),
                length_m: Some(50.0 + i as f64 * 10.0),
                latitude: Some(lat),
                longitude: Some(lon),
                wheelchair_accessible: i % 2 == 0 && walkway_type != "육교",
                distance_to_charging_m: None,
                near_charging_station: false,
                last_updated: spec.collected_on.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> SampleSpec {
        SampleSpec {
            region_name: "대구광역시".to_string(),
            districts: vec!["중구".to_string(), "동구".to_string(), "달성군".to_string()],
            center: (35.8714, 128.6014),
            collected_on: "2025-03-01".to_string(),
        }
    }

    #[test]
    fn test_sample_sizes_and_district_cycle() {
        let stations = charging_stations(&spec());
        let walkways = walkways(&spec());
        assert_eq!(stations.len(), SAMPLE_STATION_COUNT);
        assert_eq!(walkways.len(), SAMPLE_WALKWAY_COUNT);
        assert_eq!(stations[0].district.as_deref(), Some("중구"));
        assert_eq!(stations[2].district.as_deref(), Some("달성군"));
        assert_eq!(stations[3].district.as_deref(), Some("중구"));
        assert!(stations[0].address.starts_with("대구광역시 중구"));
    }

    #[test]
    fn test_sample_points_stay_near_center() {
        let spec = spec();
        for station in charging_stations(&spec) {
            let (lat, lon) = station.coordinates().unwrap();
            assert!((lat - spec.center.0).abs() <= SPREAD_DEGREES / 2.0);
            assert!((lon - spec.center.1).abs() <= SPREAD_DEGREES / 2.0);
        }
    }

    #[test]
    fn test_sample_is_deterministic() {
        assert_eq!(charging_stations(&spec()), charging_stations(&spec()));
        assert_eq!(walkways(&spec()), walkways(&spec()));
    }

    #[test]
    fn test_overpasses_are_never_accessible() {
        assert!(walkways(&spec())
            .iter()
            .filter(|w| w.walkway_type == "육교")
            .all(|w| !w.wheelchair_accessible));
    }
}
