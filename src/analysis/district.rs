use crate::analysis::stats::{mean, ratio};
use crate::domain::model::CollectedData;
use crate::domain::region::RegionFilter;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessLevel {
    #[serde(rename = "낮음")]
    Low,
    #[serde(rename = "보통")]
    Medium,
    #[serde(rename = "높음")]
    High,
    #[serde(rename = "매우높음")]
    VeryHigh,
}

impl AccessLevel {
    pub const ALL: [AccessLevel; 4] = [
        AccessLevel::Low,
        AccessLevel::Medium,
        AccessLevel::High,
        AccessLevel::VeryHigh,
    ];

    /// Bins are closed on the right; zero falls into the lowest bin.
    pub fn from_score(score: f64) -> Self {
        if score <= 200.0 {
            AccessLevel::Low
        } else if score <= 400.0 {
            AccessLevel::Medium
        } else if score <= 600.0 {
            AccessLevel::High
        } else {
            AccessLevel::VeryHigh
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccessLevel::Low => "낮음",
            AccessLevel::Medium => "보통",
            AccessLevel::High => "높음",
            AccessLevel::VeryHigh => "매우높음",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            AccessLevel::Low => "red",
            AccessLevel::Medium => "orange",
            AccessLevel::High => "yellow",
            AccessLevel::VeryHigh => "green",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictStats {
    pub district: String,
    pub station_count: usize,
    pub mean_accessibility_score: f64,
    pub near_walkway_ratio: f64,
    pub walkway_count: usize,
    pub accessible_walkway_ratio: f64,
    pub facility_count: usize,
    pub all_day_ratio: f64,
    pub air_pump_ratio: f64,
    pub phone_charging_ratio: f64,
    pub mean_capacity: f64,
    pub accessibility_index: f64,
    pub composite_score: f64,
    pub level: AccessLevel,
}

impl DistrictStats {
    /// At least one station with each of 24h operation, air pump and phone charging.
    pub fn offers_all_amenities(&self) -> bool {
        self.all_day_ratio > 0.0 && self.air_pump_ratio > 0.0 && self.phone_charging_ratio > 0.0
    }
}

pub fn composite_score(
    station_count: usize,
    facility_count: usize,
    all_day_ratio: f64,
    air_pump_ratio: f64,
    phone_charging_ratio: f64,
    mean_capacity: f64,
) -> f64 {
    let n = station_count as f64;
    let charging = 10.0 * n;
    let facilities = 50.0 * facility_count as f64;
    let function = (20.0 * all_day_ratio + 15.0 * air_pump_ratio + 10.0 * phone_charging_ratio) * n;
    let capacity = 5.0 * mean_capacity * n;
    charging + facilities + function + capacity
}

/// One row per configured district, in configured order. Records without a
/// district are left out here and only show up in the overall totals.
pub fn district_stats(data: &CollectedData, districts: &[String]) -> Vec<DistrictStats> {
    districts
        .iter()
        .map(|district| {
            let in_district = |d: &Option<String>| d.as_deref() == Some(district.as_str());
            let stations: Vec<_> = data
                .charging_stations
                .iter()
                .filter(|s| in_district(&s.district))
                .collect();
            let walkways: Vec<_> = data
                .walkways
                .iter()
                .filter(|w| in_district(&w.district))
                .collect();
            let facility_count = data
                .facilities
                .iter()
                .filter(|f| in_district(&f.district))
                .count();

            let n = stations.len();
            let scores: Vec<f64> = stations.iter().map(|s| s.accessibility_score).collect();
            let capacities: Vec<f64> = stations
                .iter()
                .filter_map(|s| s.simultaneous_capacity.map(f64::from))
                .collect();

            let mean_accessibility_score = mean(&scores);
            let near_walkway_ratio = ratio(stations.iter().filter(|s| s.near_walkway).count(), n);
            let all_day_ratio = ratio(stations.iter().filter(|s| s.is_open_all_day()).count(), n);
            let air_pump_ratio = ratio(stations.iter().filter(|s| s.air_pump).count(), n);
            let phone_charging_ratio = ratio(stations.iter().filter(|s| s.phone_charging).count(), n);
            let mean_capacity = mean(&capacities);

            let composite = composite_score(
                n,
                facility_count,
                all_day_ratio,
                air_pump_ratio,
                phone_charging_ratio,
                mean_capacity,
            );

            DistrictStats {
                district: district.clone(),
                station_count: n,
                mean_accessibility_score,
                near_walkway_ratio,
                walkway_count: walkways.len(),
                accessible_walkway_ratio: ratio(
                    walkways.iter().filter(|w| w.wheelchair_accessible).count(),
                    walkways.len(),
                ),
                facility_count,
                all_day_ratio,
                air_pump_ratio,
                phone_charging_ratio,
                mean_capacity,
                accessibility_index: 0.4 * mean_accessibility_score + 0.6 * near_walkway_ratio,
                composite_score: composite,
                level: AccessLevel::from_score(composite),
            }
        })
        .collect()
}

/// Station counts per district, largest first; ties keep the configured order.
pub fn district_counts(data: &CollectedData, region: &RegionFilter) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for district in data
        .charging_stations
        .iter()
        .filter_map(|s| s.district.as_deref())
    {
        *counts.entry(district).or_insert(0) += 1;
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(d, c)| (d.to_string(), c))
        .collect();
    counts.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| region.order_of(&a.0).cmp(&region.order_of(&b.0)))
            .then_with(|| a.0.cmp(&b.0))
    });
    counts
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictGap {
    pub best_district: String,
    pub best_count: usize,
    pub worst_district: String,
    pub worst_count: usize,
    pub difference: usize,
}

/// Spread between the best and least served district by station count.
pub fn district_gap(stats: &[DistrictStats]) -> Option<DistrictGap> {
    let best = stats.iter().rev().max_by_key(|s| s.station_count)?;
    let worst = stats.iter().min_by_key(|s| s.station_count)?;
    Some(DistrictGap {
        best_district: best.district.clone(),
        best_count: best.station_count,
        worst_district: worst.district.clone(),
        worst_count: worst.station_count,
        difference: best.station_count - worst.station_count,
    })
}
