use crate::analysis::district::DistrictStats;
use crate::analysis::stats::{self, CorrelationResult, TTestResult};
use crate::domain::model::CollectedData;
use serde::Serialize;

pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub label: String,
    pub members: Vec<String>,
    pub n: usize,
    pub mean: Option<f64>,
}

impl GroupSummary {
    fn new(label: impl Into<String>, members: Vec<String>, values: &[f64]) -> Self {
        Self {
            label: label.into(),
            members,
            n: values.len(),
            mean: (!values.is_empty()).then(|| stats::mean(values)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HypothesisResult {
    pub id: usize,
    pub title: String,
    pub statement: String,
    pub metric: String,
    pub group_a: GroupSummary,
    pub group_b: GroupSummary,
    pub test: Option<TTestResult>,
    pub conclusion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationFinding {
    pub title: String,
    pub x: String,
    pub y: String,
    pub result: Option<CorrelationResult>,
    pub interpretation: String,
}

fn conclude(test: &Option<TTestResult>) -> String {
    match test {
        None => "표본이 부족하거나 분산이 0이어서 검정할 수 없음".to_string(),
        Some(t) if t.is_significant(SIGNIFICANCE_LEVEL) => format!(
            "유의수준 5%에서 두 집단의 차이가 유의함 (t = {:.3}, p = {:.4})",
            t.t_statistic, t.p_value
        ),
        Some(t) => format!(
            "유의수준 5%에서 유의한 차이가 없음 (t = {:.3}, p = {:.4})",
            t.t_statistic, t.p_value
        ),
    }
}

fn interpret(result: &Option<CorrelationResult>) -> String {
    match result {
        None => "표본이 부족하거나 값이 일정하여 계산할 수 없음".to_string(),
        Some(c) => {
            let strength = match c.r.abs() {
                r if r >= 0.7 => "강한",
                r if r >= 0.4 => "중간 정도의",
                r if r >= 0.2 => "약한",
                _ => "거의 없는",
            };
            let direction = if c.r >= 0.0 { "양의" } else { "음의" };
            let significance = if c.p_value < SIGNIFICANCE_LEVEL {
                "유의함"
            } else {
                "유의하지 않음"
            };
            format!(
                "{} {} 상관관계 (r = {:.3}, p = {:.4}, n = {}), {}",
                strength, direction, c.r, c.p_value, c.n, significance
            )
        }
    }
}

/// Splits district composite scores by `predicate` and compares the two groups.
fn compare_districts(
    districts: &[DistrictStats],
    predicate: impl Fn(&DistrictStats) -> bool,
    label_a: &str,
    label_b: &str,
) -> (GroupSummary, GroupSummary, Option<TTestResult>) {
    let (a, b): (Vec<&DistrictStats>, Vec<&DistrictStats>) =
        districts.iter().partition(|d| predicate(*d));
    let values = |group: &[&DistrictStats]| -> Vec<f64> {
        group.iter().map(|d| d.composite_score).collect()
    };
    let names = |group: &[&DistrictStats]| -> Vec<String> {
        group.iter().map(|d| d.district.clone()).collect()
    };
    let (va, vb) = (values(&a), values(&b));
    let test = stats::welch_t_test(&va, &vb);
    (
        GroupSummary::new(label_a, names(&a), &va),
        GroupSummary::new(label_b, names(&b), &vb),
        test,
    )
}

pub fn evaluate(
    data: &CollectedData,
    districts: &[DistrictStats],
    rural_districts: &[String],
) -> Vec<HypothesisResult> {
    let mut results = Vec::new();

    let (urban, rural, test) = compare_districts(
        districts,
        |d| !rural_districts.contains(&d.district),
        "도시 지역",
        "농촌 지역",
    );
    results.push(HypothesisResult {
        id: 1,
        title: "도시-농촌 접근성 격차 가설".to_string(),
        statement: "도시 지역의 장애인휠체어 접근성이 농촌 지역보다 높을 것이다.".to_string(),
        metric: "구별 종합 접근성 점수".to_string(),
        group_a: urban,
        group_b: rural,
        conclusion: conclude(&test),
        test,
    });

    let (with, without, test) = compare_districts(
        districts,
        |d| d.facility_count > 0,
        "편의시설 보유 지역",
        "편의시설 미보유 지역",
    );
    results.push(HypothesisResult {
        id: 2,
        title: "편의시설-급속충전기 연관성 가설".to_string(),
        statement: "장애인 편의시설이 있는 지역의 급속충전기 접근성이 더 높을 것이다.".to_string(),
        metric: "구별 종합 접근성 점수".to_string(),
        group_a: with,
        group_b: without,
        conclusion: conclude(&test),
        test,
    });

    let (integrated, other, test) = compare_districts(
        districts,
        DistrictStats::offers_all_amenities,
        "기능 통합 지역",
        "미통합 지역",
    );
    results.push(HypothesisResult {
        id: 3,
        title: "기능 통합 우수성 가설".to_string(),
        statement: "24시간 운영, 공기주입, 휴대전화충전 기능을 모두 갖춘 지역의 접근성이 더 높을 것이다."
            .to_string(),
        metric: "구별 종합 접근성 점수".to_string(),
        group_a: integrated,
        group_b: other,
        conclusion: conclude(&test),
        test,
    });

    results.push(top_vs_bottom(data, districts));
    results
}

/// Station-level accessibility scores of the highest and lowest composite districts.
fn top_vs_bottom(data: &CollectedData, districts: &[DistrictStats]) -> HypothesisResult {
    let top = districts
        .iter()
        .rev()
        .max_by(|a, b| a.composite_score.total_cmp(&b.composite_score));
    let bottom = districts
        .iter()
        .min_by(|a, b| a.composite_score.total_cmp(&b.composite_score));

    let scores = |district: Option<&DistrictStats>| -> (Vec<String>, Vec<f64>) {
        match district {
            Some(d) => (
                vec![d.district.clone()],
                data.charging_stations
                    .iter()
                    .filter(|s| s.district.as_deref() == Some(d.district.as_str()))
                    .map(|s| s.accessibility_score)
                    .collect(),
            ),
            None => (Vec::new(), Vec::new()),
        }
    };
    let (top_names, top_scores) = scores(top);
    let (bottom_names, bottom_scores) = scores(bottom);
    let test = stats::welch_t_test(&top_scores, &bottom_scores);

    HypothesisResult {
        id: 4,
        title: "지역 특성별 접근성 차이 가설".to_string(),
        statement: "종합 접근성 점수가 가장 높은 지역과 가장 낮은 지역의 충전기 접근성 점수에 차이가 있을 것이다."
            .to_string(),
        metric: "충전기별 접근성 점수".to_string(),
        group_a: GroupSummary::new("최고 접근성 지역", top_names, &top_scores),
        group_b: GroupSummary::new("최저 접근성 지역", bottom_names, &bottom_scores),
        conclusion: conclude(&test),
        test,
    }
}

pub fn correlations(data: &CollectedData, districts: &[DistrictStats]) -> Vec<CorrelationFinding> {
    let walkway_counts: Vec<f64> = districts.iter().map(|d| d.walkway_count as f64).collect();
    let station_counts: Vec<f64> = districts.iter().map(|d| d.station_count as f64).collect();
    let by_district = stats::pearson(&walkway_counts, &station_counts);

    let (widths, distances): (Vec<f64>, Vec<f64>) = data
        .walkways
        .iter()
        .filter_map(|w| Some((w.width_m?, w.distance_to_charging_m?)))
        .unzip();
    let by_walkway = stats::pearson(&widths, &distances);

    vec![
        CorrelationFinding {
            title: "보행로 정비와 급속충전기 설치의 상관관계".to_string(),
            x: "구별 보행로 수".to_string(),
            y: "구별 급속충전기 수".to_string(),
            interpretation: interpret(&by_district),
            result: by_district,
        },
        CorrelationFinding {
            title: "보행로 폭과 충전기 거리의 상관관계".to_string(),
            x: "보행로 폭(m)".to_string(),
            y: "가장 가까운 충전기까지 거리(m)".to_string(),
            interpretation: interpret(&by_walkway),
            result: by_walkway,
        },
    ]
}
