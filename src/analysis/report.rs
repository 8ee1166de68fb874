use crate::analysis::district::{self, DistrictGap, DistrictStats};
use crate::analysis::hypotheses::{self, CorrelationFinding, HypothesisResult};
use crate::analysis::overview::{self, CapacityStats, Overview, WalkwayTypeStats};
use crate::domain::model::CollectedData;
use crate::domain::region::RegionFilter;
use crate::utils::error::{AccessError, Result};
use serde::Serialize;
use std::fmt::Write;

pub const REPORT_FILE: &str = "accessibility_report.md";
pub const SUMMARY_FILE: &str = "analysis_summary.json";

/// Everything the analyze stage computes; serialized as the JSON summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub generated_on: String,
    pub region: String,
    pub overview: Overview,
    pub district_counts: Vec<(String, usize)>,
    pub districts: Vec<DistrictStats>,
    pub walkway_types: Vec<WalkwayTypeStats>,
    pub capacity: CapacityStats,
    pub gap: Option<DistrictGap>,
    pub hypotheses: Vec<HypothesisResult>,
    pub correlations: Vec<CorrelationFinding>,
}

impl AnalysisReport {
    pub fn build(
        data: &CollectedData,
        region: &RegionFilter,
        rural_districts: &[String],
        generated_on: &str,
    ) -> Self {
        let districts = district::district_stats(data, region.districts());
        Self {
            generated_on: generated_on.to_string(),
            region: region.name().to_string(),
            overview: overview::overview(data),
            district_counts: district::district_counts(data, region),
            gap: district::district_gap(&districts),
            walkway_types: overview::walkway_types(data),
            capacity: overview::capacity(data),
            hypotheses: hypotheses::evaluate(data, &districts, rural_districts),
            correlations: hypotheses::correlations(data, &districts),
            districts,
        }
    }

    /// Districts ordered by composite score, highest first.
    pub fn ranked(&self) -> Vec<&DistrictStats> {
        let mut ranked: Vec<&DistrictStats> = self.districts.iter().collect();
        ranked.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
        ranked
    }

    pub fn to_markdown(&self) -> Result<String> {
        let mut md = String::new();
        self.write_markdown(&mut md)
            .map_err(|e| AccessError::processing(format!("report formatting failed: {}", e)))?;
        Ok(md)
    }

    fn write_markdown(&self, md: &mut String) -> std::fmt::Result {
        let o = &self.overview;

        writeln!(md, "# {} 장애인휠체어 급속충전기 접근성 분석 보고서", self.region)?;
        writeln!(md)?;
        writeln!(md, "## 분석 개요")?;
        writeln!(md, "- 분석 일자: {}", self.generated_on)?;
        writeln!(md, "- 급속충전기: {}개", o.total_stations)?;
        writeln!(md, "- 보행로: {}개", o.total_walkways)?;
        writeln!(md, "- 장애인 편의시설: {}개", o.total_facilities)?;
        writeln!(
            md,
            "- 보행로 인접 충전기: {}개 ({})",
            o.stations_near_walkway,
            percent(o.near_walkway_ratio)
        )?;
        writeln!(
            md,
            "- 충전기 인접 보행로: {}개 ({})",
            o.walkways_near_charger,
            percent(o.near_charger_ratio)
        )?;
        writeln!(
            md,
            "- 휠체어 접근 가능 보행로: {}개 ({})",
            o.accessible_walkways,
            percent(o.accessible_walkway_ratio)
        )?;
        writeln!(md, "- 평균 접근성 점수: {:.3}", o.mean_accessibility_score)?;
        if o.stations_without_district > 0 {
            writeln!(md, "- 구/군 미확인 충전기: {}개", o.stations_without_district)?;
        }
        writeln!(md)?;

        writeln!(md, "## 구별 급속충전기 분포")?;
        for (district, count) in &self.district_counts {
            writeln!(md, "- {}: {}개", district, count)?;
        }
        if let Some(gap) = &self.gap {
            writeln!(md)?;
            writeln!(
                md,
                "가장 많은 지역은 {}({}개), 가장 적은 지역은 {}({}개)로 {}개 차이가 있습니다.",
                gap.best_district, gap.best_count, gap.worst_district, gap.worst_count, gap.difference
            )?;
        }
        writeln!(md)?;
        writeln!(md, "| 구 | 충전기 | 평균 점수 | 보행로 인접 비율 | 접근성 지수 | 보행로 | 접근 가능 보행로 비율 |")?;
        writeln!(md, "|---|---:|---:|---:|---:|---:|---:|")?;
        for d in &self.districts {
            writeln!(
                md,
                "| {} | {} | {:.3} | {} | {:.3} | {} | {} |",
                d.district,
                d.station_count,
                d.mean_accessibility_score,
                percent(d.near_walkway_ratio),
                d.accessibility_index,
                d.walkway_count,
                percent(d.accessible_walkway_ratio)
            )?;
        }
        writeln!(md)?;

        writeln!(md, "## 시설 현황")?;
        writeln!(md, "### 급속충전기 기능")?;
        let c = &self.capacity;
        match (c.mean_capacity, c.min_capacity, c.max_capacity) {
            (Some(mean), Some(min), Some(max)) => writeln!(
                md,
                "- 동시사용가능대수: 평균 {:.1}대 (최소 {}대, 최대 {}대)",
                mean, min, max
            )?,
            _ => writeln!(md, "- 동시사용가능대수: 정보 없음")?,
        }
        writeln!(md, "- 24시간 운영: {}개", c.all_day_count)?;
        writeln!(md, "- 공기주입 가능: {}개", c.air_pump_count)?;
        writeln!(md, "- 휴대전화 충전 가능: {}개", c.phone_charging_count)?;
        writeln!(md, "- 세 기능 모두 제공: {}개", c.all_amenities_count)?;
        writeln!(md)?;
        writeln!(md, "### 구별 기능 비율")?;
        for d in &self.districts {
            writeln!(
                md,
                "- {}: 24시간운영 {}, 공기주입 {}, 휴대폰충전 {}, 평균 동시사용가능대수 {:.1}대, 편의시설 {}개",
                d.district,
                percent(d.all_day_ratio),
                percent(d.air_pump_ratio),
                percent(d.phone_charging_ratio),
                d.mean_capacity,
                d.facility_count
            )?;
        }
        writeln!(md)?;

        writeln!(md, "## 보행로 접근성")?;
        writeln!(md, "| 유형 | 개수 | 접근 가능 | 접근 가능 비율 | 충전기 인접 | 인접 비율 | 평균 충전기 거리(m) |")?;
        writeln!(md, "|---|---:|---:|---:|---:|---:|---:|")?;
        for t in &self.walkway_types {
            writeln!(
                md,
                "| {} | {} | {} | {} | {} | {} | {} |",
                t.walkway_type,
                t.count,
                t.accessible_count,
                percent(t.accessible_ratio),
                t.near_charger_count,
                percent(t.near_charger_ratio),
                t.mean_distance_to_charger_m
                    .map(|d| format!("{:.1}", d))
                    .unwrap_or_else(|| "-".to_string())
            )?;
        }
        writeln!(md)?;

        writeln!(md, "## 구별 종합 접근성 점수")?;
        for d in self.ranked() {
            writeln!(
                md,
                "- {}: {:.1}점 ({})",
                d.district,
                d.composite_score,
                d.level.label()
            )?;
        }
        writeln!(md)?;

        writeln!(md, "## 가설 검증")?;
        for h in &self.hypotheses {
            writeln!(md)?;
            writeln!(md, "### 가설 {}: {}", h.id, h.title)?;
            writeln!(md, "**내용**: {}", h.statement)?;
            writeln!(md)?;
            writeln!(md, "**비교 지표**: {}", h.metric)?;
            writeln!(md)?;
            for group in [&h.group_a, &h.group_b] {
                writeln!(
                    md,
                    "- {} (n = {}): 평균 {}{}",
                    group.label,
                    group.n,
                    group
                        .mean
                        .map(|m| format!("{:.2}", m))
                        .unwrap_or_else(|| "-".to_string()),
                    if group.members.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", group.members.join(", "))
                    }
                )?;
            }
            writeln!(md)?;
            writeln!(md, "**결과**: {}", h.conclusion)?;
        }
        writeln!(md)?;
        writeln!(md, "### 상관관계 분석")?;
        for c in &self.correlations {
            writeln!(md, "- {} ({} vs {}): {}", c.title, c.x, c.y, c.interpretation)?;
        }
        writeln!(md)?;

        writeln!(md, "## 정책 제언")?;
        writeln!(md, "### 1. 접근성 격차 해소")?;
        let low: Vec<&str> = self
            .ranked()
            .into_iter()
            .rev()
            .take(3)
            .map(|d| d.district.as_str())
            .collect();
        if !low.is_empty() {
            writeln!(md, "- 종합 점수가 낮은 {} 지역의 급속충전기 확충", low.join(", "))?;
        }
        writeln!(md, "- 편의시설이 없는 구/군에 시설 설치 검토")?;
        writeln!(md)?;
        writeln!(md, "### 2. 기능 개선")?;
        writeln!(md, "- 24시간 운영 시설 비율 향상")?;
        writeln!(md, "- 공기주입 및 휴대전화충전 기능 확대")?;
        writeln!(md, "- 동시사용가능대수 증가")?;
        writeln!(md)?;
        writeln!(md, "### 3. 보행 환경 연계")?;
        writeln!(md, "- 보행로 정비 계획과 급속충전기 설치 계획 연계")?;
        writeln!(md, "- 충전기에서 먼 접근 가능 보행로 주변의 설치 우선 검토")?;

        Ok(())
    }
}

fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::{self, ProximityRules};
    use crate::domain::sample::{self, SampleSpec};

    fn districts() -> Vec<String> {
        ["중구", "동구", "서구", "남구", "북구", "수성구", "달서구", "달성군", "군위군"]
            .iter()
            .map(|d| d.to_string())
            .collect()
    }

    fn report() -> AnalysisReport {
        let spec = SampleSpec {
            region_name: "대구광역시".to_string(),
            districts: districts(),
            center: (35.87, 128.60),
            collected_on: "2025-03-01".to_string(),
        };
        let mut data = CollectedData {
            charging_stations: sample::charging_stations(&spec),
            walkways: sample::walkways(&spec),
            facilities: Vec::new(),
        };
        geo::enrich(
            &mut data.charging_stations,
            &mut data.walkways,
            &ProximityRules::default(),
        );
        let region = RegionFilter::new("대구광역시", "대구", &districts()).unwrap();
        AnalysisReport::build(
            &data,
            &region,
            &["달성군".to_string(), "군위군".to_string()],
            "2025-03-02",
        )
    }

    #[test]
    fn test_markdown_has_every_section() {
        let md = report().to_markdown().unwrap();
        for heading in [
            "## 분석 개요",
            "## 구별 급속충전기 분포",
            "## 시설 현황",
            "## 보행로 접근성",
            "## 구별 종합 접근성 점수",
            "## 가설 검증",
            "### 가설 4:",
            "## 정책 제언",
        ] {
            assert!(md.contains(heading), "missing {}", heading);
        }
        assert!(md.contains("- 급속충전기: 80개"));
    }

    #[test]
    fn test_ranking_is_descending() {
        let report = report();
        let ranked = report.ranked();
        assert!(ranked
            .windows(2)
            .all(|w| w[0].composite_score >= w[1].composite_score));
    }

    #[test]
    fn test_summary_serializes_level_labels() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["region"], "대구광역시");
        assert_eq!(json["districts"].as_array().unwrap().len(), 9);
        let level = json["districts"][0]["level"].as_str().unwrap();
        assert!(["낮음", "보통", "높음", "매우높음"].contains(&level));
        assert_eq!(json["hypotheses"].as_array().unwrap().len(), 4);
    }
}
