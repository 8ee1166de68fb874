use crate::analysis::stats::{mean, ratio};
use crate::domain::model::CollectedData;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_stations: usize,
    pub total_walkways: usize,
    pub total_facilities: usize,
    pub stations_without_district: usize,
    pub stations_near_walkway: usize,
    pub near_walkway_ratio: f64,
    pub walkways_near_charger: usize,
    pub near_charger_ratio: f64,
    pub accessible_walkways: usize,
    pub accessible_walkway_ratio: f64,
    pub mean_accessibility_score: f64,
}

pub fn overview(data: &CollectedData) -> Overview {
    let stations = &data.charging_stations;
    let walkways = &data.walkways;

    let stations_near_walkway = stations.iter().filter(|s| s.near_walkway).count();
    let walkways_near_charger = walkways.iter().filter(|w| w.near_charging_station).count();
    let accessible_walkways = walkways.iter().filter(|w| w.wheelchair_accessible).count();
    let scores: Vec<f64> = stations.iter().map(|s| s.accessibility_score).collect();

    Overview {
        total_stations: stations.len(),
        total_walkways: walkways.len(),
        total_facilities: data.facilities.len(),
        stations_without_district: stations.iter().filter(|s| s.district.is_none()).count(),
        stations_near_walkway,
        near_walkway_ratio: ratio(stations_near_walkway, stations.len()),
        walkways_near_charger,
        near_charger_ratio: ratio(walkways_near_charger, walkways.len()),
        accessible_walkways,
        accessible_walkway_ratio: ratio(accessible_walkways, walkways.len()),
        mean_accessibility_score: mean(&scores),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkwayTypeStats {
    pub walkway_type: String,
    pub count: usize,
    pub accessible_count: usize,
    pub accessible_ratio: f64,
    pub near_charger_count: usize,
    pub near_charger_ratio: f64,
    /// `None` when no walkway of this type has a measured distance.
    pub mean_distance_to_charger_m: Option<f64>,
}

/// Per walkway type, most common type first.
pub fn walkway_types(data: &CollectedData) -> Vec<WalkwayTypeStats> {
    let mut types: Vec<&str> = Vec::new();
    for walkway in &data.walkways {
        if !types.contains(&walkway.walkway_type.as_str()) {
            types.push(&walkway.walkway_type);
        }
    }

    let mut stats: Vec<WalkwayTypeStats> = types
        .into_iter()
        .map(|walkway_type| {
            let of_type: Vec<_> = data
                .walkways
                .iter()
                .filter(|w| w.walkway_type == walkway_type)
                .collect();
            let accessible_count = of_type.iter().filter(|w| w.wheelchair_accessible).count();
            let near_charger_count = of_type.iter().filter(|w| w.near_charging_station).count();
            let distances: Vec<f64> = of_type
                .iter()
                .filter_map(|w| w.distance_to_charging_m)
                .collect();

            WalkwayTypeStats {
                walkway_type: walkway_type.to_string(),
                count: of_type.len(),
                accessible_count,
                accessible_ratio: ratio(accessible_count, of_type.len()),
                near_charger_count,
                near_charger_ratio: ratio(near_charger_count, of_type.len()),
                mean_distance_to_charger_m: (!distances.is_empty()).then(|| mean(&distances)),
            }
        })
        .collect();

    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityStats {
    pub stations_with_capacity: usize,
    pub mean_capacity: Option<f64>,
    pub min_capacity: Option<u32>,
    pub max_capacity: Option<u32>,
    pub all_day_count: usize,
    pub air_pump_count: usize,
    pub phone_charging_count: usize,
    pub all_amenities_count: usize,
}

pub fn capacity(data: &CollectedData) -> CapacityStats {
    let stations = &data.charging_stations;
    let capacities: Vec<u32> = stations
        .iter()
        .filter_map(|s| s.simultaneous_capacity)
        .collect();
    let as_f64: Vec<f64> = capacities.iter().map(|c| f64::from(*c)).collect();

    CapacityStats {
        stations_with_capacity: capacities.len(),
        mean_capacity: (!as_f64.is_empty()).then(|| mean(&as_f64)),
        min_capacity: capacities.iter().min().copied(),
        max_capacity: capacities.iter().max().copied(),
        all_day_count: stations.iter().filter(|s| s.is_open_all_day()).count(),
        air_pump_count: stations.iter().filter(|s| s.air_pump).count(),
        phone_charging_count: stations.iter().filter(|s| s.phone_charging).count(),
        all_amenities_count: stations.iter().filter(|s| s.has_all_amenities()).count(),
    }
}
