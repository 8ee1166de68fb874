use crate::analysis::district::{AccessLevel, DistrictStats};
use crate::domain::geo;
use crate::domain::model::{ChargingStation, Walkway};
use crate::visualization::map::{popup, LeafletMap, Marker};
use std::collections::HashMap;

pub const WALKWAY_MAP_FILE: &str = "daegu_walkway_map.html";
pub const DISTRIBUTION_MAP_FILE: &str = "daegu_charging_distribution_map.html";
pub const COMBINED_MAP_FILE: &str = "daegu_combined_map.html";
pub const ACCESSIBILITY_MAP_FILE: &str = "daegu_accessibility_map.html";

const WALKWAY_TYPE_COLORS: [(&str, &str); 5] = [
    ("보도블록", "blue"),
    ("경사로", "green"),
    ("엘리베이터", "red"),
    ("육교", "orange"),
    ("지하도", "purple"),
];

/// Map defaults shared by every document.
#[derive(Debug, Clone, Copy)]
pub struct MapView {
    pub fallback_center: (f64, f64),
    pub zoom: u8,
}

impl MapView {
    /// Mean of the valid coordinates, the configured center when there are none.
    fn center(&self, points: &[(f64, f64)]) -> (f64, f64) {
        geo::centroid(points).unwrap_or(self.fallback_center)
    }
}

fn walkway_color(walkway_type: &str) -> &'static str {
    WALKWAY_TYPE_COLORS
        .iter()
        .find(|(t, _)| *t == walkway_type)
        .map(|(_, c)| *c)
        .unwrap_or("gray")
}

fn yes_no(value: bool, yes: &str, no: &str) -> String {
    let text = if value { yes } else { no };
    text.to_string()
}

fn meters(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}m", v))
        .unwrap_or_else(|| "-".to_string())
}

fn district_name(district: &Option<String>) -> String {
    district.clone().unwrap_or_else(|| "미확인".to_string())
}

/// Density color for a district holding `count` of the busiest district's `max`.
pub fn density_color(count: usize, max: usize) -> &'static str {
    let ratio = if max == 0 {
        0.0
    } else {
        count as f64 / max as f64
    };
    if ratio > 0.8 {
        "red"
    } else if ratio > 0.6 {
        "orange"
    } else if ratio > 0.4 {
        "yellow"
    } else {
        "green"
    }
}

pub fn walkway_map(walkways: &[Walkway], view: &MapView) -> LeafletMap {
    let points: Vec<(f64, f64)> = walkways.iter().filter_map(|w| w.coordinates()).collect();
    let mut map = LeafletMap::new("대구 보행로 지도", view.center(&points), view.zoom)
        .legend_title("대구 보행로 타입")
        .legend_at_left();

    for walkway in walkways {
        let Some(position) = walkway.coordinates() else {
            continue;
        };
        let text = popup(
            &walkway.walkway_name,
            &[
                ("구", district_name(&walkway.district)),
                ("타입", walkway.walkway_type.clone()),
                ("폭", meters(walkway.width_m)),
                ("길이", meters(walkway.length_m)),
                ("휠체어 접근", yes_no(walkway.wheelchair_accessible, "가능", "불가능")),
                ("급속충전기 거리", meters(walkway.distance_to_charging_m)),
            ],
        );
        let ring = if walkway.wheelchair_accessible {
            "darkgreen"
        } else {
            "black"
        };
        map.add_marker(
            Marker::circle(position, walkway_color(&walkway.walkway_type), 8.0, text).with_stroke(ring),
        );
    }

    for (walkway_type, color) in WALKWAY_TYPE_COLORS {
        map.add_legend(color, walkway_type);
    }
    map.add_legend("gray", "기타");
    map.add_legend_outline("darkgreen", "휠체어 접근 가능");
    map.add_legend_outline("black", "휠체어 접근 불가");
    map
}

pub fn charging_distribution_map(stations: &[ChargingStation], view: &MapView) -> LeafletMap {
    let points: Vec<(f64, f64)> = stations.iter().filter_map(|s| s.coordinates()).collect();
    let mut map = LeafletMap::new("대구 급속충전기 분포 지도", view.center(&points), view.zoom)
        .legend_title("대구 구별 급속충전기 밀도");

    let mut counts: Vec<(String, usize)> = Vec::new();
    for district in stations.iter().filter_map(|s| s.district.as_deref()) {
        match counts.iter_mut().find(|(d, _)| d.as_str() == district) {
            Some((_, count)) => *count += 1,
            None => counts.push((district.to_string(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    let max = counts.first().map(|(_, c)| *c).unwrap_or(0);
    let colors: HashMap<&str, &str> = counts
        .iter()
        .map(|(d, c)| (d.as_str(), density_color(*c, max)))
        .collect();

    for station in stations {
        let Some(position) = station.coordinates() else {
            continue;
        };
        let color = station
            .district
            .as_deref()
            .and_then(|d| colors.get(d).copied())
            .unwrap_or("gray");
        let radius = if station.accessibility_score > 0.8 { 15.0 } else { 10.0 };
        let text = popup(
            &station.station_name,
            &[
                ("구", district_name(&station.district)),
                ("타입", station.charging_type.clone()),
                ("주소", station.address.clone()),
                ("접근성 점수", format!("{:.2}", station.accessibility_score)),
                ("보행로 근처", yes_no(station.near_walkway, "예", "아니오")),
            ],
        );
        map.add_marker(Marker::circle(position, color, radius, text));
    }

    for (district, count) in &counts {
        map.add_legend(density_color(*count, max), format!("{}: {}개", district, count));
    }
    map.add_legend("red", "높음 (80% 초과)");
    map.add_legend("orange", "중상 (60-80%)");
    map.add_legend("yellow", "중하 (40-60%)");
    map.add_legend("green", "낮음 (40% 이하)");
    map
}

pub fn combined_map(stations: &[ChargingStation], walkways: &[Walkway], view: &MapView) -> LeafletMap {
    let points: Vec<(f64, f64)> = walkways
        .iter()
        .filter_map(|w| w.coordinates())
        .chain(stations.iter().filter_map(|s| s.coordinates()))
        .collect();
    let mut map = LeafletMap::new("대구 보행로 & 급속충전기 통합 지도", view.center(&points), view.zoom)
        .legend_title("대구 보행로 & 급속충전기")
        .legend_at_left();

    for walkway in walkways {
        let Some(position) = walkway.coordinates() else {
            continue;
        };
        let color = if walkway.wheelchair_accessible {
            "blue"
        } else {
            "lightblue"
        };
        let text = popup(
            &walkway.walkway_name,
            &[
                ("구", district_name(&walkway.district)),
                ("타입", walkway.walkway_type.clone()),
                ("휠체어 접근", yes_no(walkway.wheelchair_accessible, "가능", "불가능")),
            ],
        );
        map.add_marker(Marker::circle(position, color, 8.0, text).with_opacity(0.6));
    }

    for station in stations {
        let Some(position) = station.coordinates() else {
            continue;
        };
        let color = if station.near_walkway { "red" } else { "orange" };
        let text = popup(
            &station.station_name,
            &[
                ("구", district_name(&station.district)),
                ("타입", station.charging_type.clone()),
                ("접근성 점수", format!("{:.2}", station.accessibility_score)),
            ],
        );
        map.add_marker(Marker::circle(position, color, 12.0, text).with_opacity(0.8));
    }

    map.add_legend("blue", "보행로 (휠체어 접근 가능)");
    map.add_legend("lightblue", "보행로 (휠체어 접근 불가)");
    map.add_legend("red", "급속충전기 (보행로 근처)");
    map.add_legend("orange", "급속충전기 (보행로 멀리)");
    map
}

/// Stations colored by the composite accessibility level of their district.
pub fn accessibility_map(
    stations: &[ChargingStation],
    districts: &[DistrictStats],
    view: &MapView,
) -> LeafletMap {
    let points: Vec<(f64, f64)> = stations.iter().filter_map(|s| s.coordinates()).collect();
    let mut map = LeafletMap::new("대구 종합 접근성 지도", view.center(&points), view.zoom)
        .legend_title("접근성 수준");

    let by_district: HashMap<&str, &DistrictStats> =
        districts.iter().map(|d| (d.district.as_str(), d)).collect();

    for station in stations {
        let Some(position) = station.coordinates() else {
            continue;
        };
        let Some(stats) = station
            .district
            .as_deref()
            .and_then(|d| by_district.get(d))
        else {
            continue;
        };
        let text = popup(
            &station.station_name,
            &[
                ("구", stats.district.clone()),
                ("종합접근성점수", format!("{:.1}점", stats.composite_score)),
                ("접근성수준", stats.level.label().to_string()),
                (
                    "동시사용가능",
                    station
                        .simultaneous_capacity
                        .map(|c| format!("{}대", c))
                        .unwrap_or_else(|| "-".to_string()),
                ),
                ("공기주입", yes_no(station.air_pump, "Y", "N")),
                ("휴대폰충전", yes_no(station.phone_charging, "Y", "N")),
            ],
        );
        map.add_marker(Marker::circle(position, stats.level.color(), 10.0, text));
    }

    for level in AccessLevel::ALL {
        map.add_legend(level.color(), level.label());
    }
    map
}
