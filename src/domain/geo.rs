use crate::domain::model::{ChargingStation, Walkway};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Scoring and proximity parameters for [`enrich`].
#[derive(Debug, Clone, Copy)]
pub struct ProximityRules {
    pub proximity_threshold_m: f64,
    pub score_distance_cutoff_m: f64,
}

impl Default for ProximityRules {
    fn default() -> Self {
        Self {
            proximity_threshold_m: 300.0,
            score_distance_cutoff_m: 1000.0,
        }
    }
}

/// Great-circle distance in meters between two (lat, lon) points.
pub fn haversine_m(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

pub fn nearest_distance_m(from: (f64, f64), targets: &[(f64, f64)]) -> Option<f64> {
    targets
        .iter()
        .map(|t| haversine_m(from, *t))
        .min_by(|a, b| a.total_cmp(b))
}

/// Mean of the given coordinates, `None` when there are none.
pub fn centroid(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lon) = points
        .iter()
        .fold((0.0, 0.0), |(la, lo), (a, b)| (la + a, lo + b));
    Some((lat / n, lon / n))
}

pub fn station_score(station: &ChargingStation, rules: &ProximityRules) -> f64 {
    let proximity = match station.distance_to_walkway_m {
        Some(d) if rules.score_distance_cutoff_m > 0.0 => {
            (1.0 - d / rules.score_distance_cutoff_m).clamp(0.0, 1.0)
        }
        _ => 0.0,
    };
    let amenities = [
        station.is_open_all_day(),
        station.air_pump,
        station.phone_charging,
    ];
    let amenity = amenities.iter().filter(|a| **a).count() as f64 / amenities.len() as f64;

    0.4 * proximity + 0.6 * amenity
}

/// Fills distances, proximity flags and station scores in place.
pub fn enrich(stations: &mut [ChargingStation], walkways: &mut [Walkway], rules: &ProximityRules) {
    let walkway_points: Vec<(f64, f64)> = walkways.iter().filter_map(|w| w.coordinates()).collect();
    let station_points: Vec<(f64, f64)> = stations.iter().filter_map(|s| s.coordinates()).collect();

    for station in stations.iter_mut() {
        station.distance_to_walkway_m = station
            .coordinates()
            .and_then(|p| nearest_distance_m(p, &walkway_points))
            .map(round_1);
        station.near_walkway = station
            .distance_to_walkway_m
            .map(|d| d <= rules.proximity_threshold_m)
            .unwrap_or(false);
        station.accessibility_score = round_3(station_score(station, rules));
    }

    for walkway in walkways.iter_mut() {
        walkway.distance_to_charging_m = walkway
            .coordinates()
            .and_then(|p| nearest_distance_m(p, &station_points))
            .map(round_1);
        walkway.near_charging_station = walkway
            .distance_to_charging_m
            .map(|d| d <= rules.proximity_threshold_m)
            .unwrap_or(false);
    }
}

fn round_1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round_3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
