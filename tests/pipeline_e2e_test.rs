use anyhow::Result;
use daegu_access::core::stage::ARCHIVE_FILE;
use daegu_access::utils::monitor::SystemMonitor;
use daegu_access::{run_stages, AccessConfig, Stage};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const RESULT_FILES: [&str; 8] = [
    "accessibility_report.md",
    "analysis_summary.json",
    "daegu_accessibility_map.html",
    "daegu_charging_distribution_map.html",
    "daegu_combined_map.html",
    "daegu_district_analysis.png",
    "daegu_district_analysis.svg",
    "daegu_walkway_map.html",
];

fn offline_config(root: &Path) -> AccessConfig {
    let mut config = AccessConfig::default();
    config.output.data_dir = root.join("data").to_string_lossy().to_string();
    config.output.results_dir = root.join("results").to_string_lossy().to_string();
    config.visualization.chart_width = 1000;
    config.visualization.chart_height = 800;
    config
}

fn monitor() -> Arc<SystemMonitor> {
    Arc::new(SystemMonitor::new(false))
}

#[tokio::test]
async fn test_offline_run_produces_every_artifact_and_archive() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = offline_config(temp_dir.path());
    config.output.archive = true;

    let summary = run_stages(&config, Stage::All, true, monitor()).await?;

    let data_dir = temp_dir.path().join("data");
    let stations = std::fs::read(data_dir.join("daegu_charging_stations.csv"))?;
    assert!(stations.starts_with(&[0xEF, 0xBB, 0xBF]), "CSV must carry a UTF-8 BOM");
    assert!(data_dir.join("daegu_walkways.csv").is_file());
    assert!(!data_dir.join("daegu_disability_facilities.csv").exists());

    let listed: Vec<&str> = summary.results.iter().map(|(name, _)| name.as_str()).collect();
    let mut expected: Vec<&str> = RESULT_FILES.to_vec();
    expected.push(ARCHIVE_FILE);
    expected.sort();
    assert_eq!(listed, expected);
    assert!(summary.results.iter().all(|(_, size)| *size > 0));

    let archive_path = temp_dir.path().join("results").join(ARCHIVE_FILE);
    let mut archive = zip::ZipArchive::new(std::fs::File::open(&archive_path)?)?;
    assert_eq!(archive.len(), RESULT_FILES.len());

    let mut report = String::new();
    archive
        .by_name("accessibility_report.md")?
        .read_to_string(&mut report)?;
    assert!(report.contains("## 가설 검증"));
    assert!(report.contains("- 급속충전기: 80개"));

    let summary_json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(
        temp_dir.path().join("results").join("analysis_summary.json"),
    )?)?;
    assert_eq!(summary_json["districts"].as_array().map(Vec::len), Some(9));
    assert_eq!(summary_json["overview"]["total_stations"], 80);
    Ok(())
}

#[tokio::test]
async fn test_stages_can_run_separately() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = offline_config(temp_dir.path());

    let collected = run_stages(&config, Stage::Collect, true, monitor()).await?;
    assert_eq!(collected.artifacts.len(), 2);
    assert!(collected.results.is_empty());

    let analyzed = run_stages(&config, Stage::Analyze, false, monitor()).await?;
    assert_eq!(analyzed.results.len(), 2);

    let visualized = run_stages(&config, Stage::Visualize, false, monitor()).await?;
    assert_eq!(visualized.artifacts.len(), 6);
    assert_eq!(visualized.results.len(), RESULT_FILES.len());

    let map = std::fs::read_to_string(
        temp_dir
            .path()
            .join("results")
            .join("daegu_accessibility_map.html"),
    )?;
    assert!(map.contains("leaflet"));
    assert!(map.contains("매우높음"));
    Ok(())
}

#[tokio::test]
async fn test_analyze_without_collected_data_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = offline_config(temp_dir.path());

    let err = run_stages(&config, Stage::Analyze, true, monitor())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("daegu_charging_stations.csv"));
    assert_eq!(err.exit_code(), 1);
    Ok(())
}
