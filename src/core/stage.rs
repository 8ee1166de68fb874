use crate::app::pipelines::{AnalyzePipeline, CollectPipeline, VisualizePipeline};
use crate::config::cli::LocalStorage;
use crate::config::AccessConfig;
use crate::core::etl::EtlEngine;
use crate::core::Storage;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::io::Write;
use std::sync::Arc;
use zip::write::{FileOptions, ZipWriter};

pub const ARCHIVE_FILE: &str = "results.zip";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Stage {
    Collect,
    Analyze,
    Visualize,
    All,
}

impl Stage {
    /// Whether running `self` runs `step`.
    pub fn includes(&self, step: Stage) -> bool {
        *self == Stage::All || *self == step
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub artifacts: Vec<String>,
    /// Results directory contents after the run, with sizes in bytes.
    pub results: Vec<(String, u64)>,
    pub archive: Option<String>,
}

/// Runs the requested stages in order: collect, analyze, visualize.
pub async fn run_stages(
    config: &AccessConfig,
    stage: Stage,
    offline: bool,
    monitor: Arc<SystemMonitor>,
) -> Result<RunSummary> {
    let data_storage = LocalStorage::new(config.output.data_dir.clone());
    let results_storage = LocalStorage::new(config.output.results_dir.clone());
    let mut summary = RunSummary::default();

    if stage.includes(Stage::Collect) {
        let pipeline = CollectPipeline::new(data_storage.clone(), config.clone()).with_offline(offline);
        let engine = EtlEngine::new(pipeline).with_monitor(monitor.clone());
        summary.artifacts.extend(engine.run().await?);
    }

    if stage.includes(Stage::Analyze) {
        let pipeline =
            AnalyzePipeline::new(data_storage.clone(), results_storage.clone(), config.clone());
        let engine = EtlEngine::new(pipeline).with_monitor(monitor.clone());
        summary.artifacts.extend(engine.run().await?);
    }

    if stage.includes(Stage::Visualize) {
        let pipeline =
            VisualizePipeline::new(data_storage.clone(), results_storage.clone(), config.clone());
        let engine = EtlEngine::new(pipeline).with_monitor(monitor.clone());
        summary.artifacts.extend(engine.run().await?);
    }

    if config.output.archive {
        archive_results(&results_storage).await?;
        summary.archive = Some(format!("{}/{}", config.output.results_dir, ARCHIVE_FILE));
        tracing::info!("📦 Results archived to {}", ARCHIVE_FILE);
    }

    summary.results = results_storage.list_files()?;
    monitor.log_final_stats();
    Ok(summary)
}

/// Bundles every file in the results directory, except a previous archive, into `results.zip`.
pub async fn archive_results(storage: &LocalStorage) -> Result<usize> {
    let files: Vec<String> = storage
        .list_files()?
        .into_iter()
        .map(|(name, _)| name)
        .filter(|name| name != ARCHIVE_FILE)
        .collect();

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for name in &files {
        let bytes = storage.read_file(name).await?;
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(&bytes)?;
    }
    let zip_data = zip.finish()?.into_inner();

    storage.write_file(ARCHIVE_FILE, &zip_data).await?;
    tracing::debug!("Archived {} files ({} bytes)", files.len(), zip_data.len());
    Ok(files.len())
}

/// Human-readable size for the results listing.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_includes() {
        assert!(Stage::All.includes(Stage::Collect));
        assert!(Stage::All.includes(Stage::Visualize));
        assert!(Stage::Analyze.includes(Stage::Analyze));
        assert!(!Stage::Analyze.includes(Stage::Collect));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[tokio::test]
    async fn test_archive_skips_previous_archive() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_string_lossy().to_string());
        storage.write_file("a.md", b"# report").await.unwrap();
        storage.write_file("b.json", b"{}").await.unwrap();

        assert_eq!(archive_results(&storage).await.unwrap(), 2);
        // A second run must not nest the first archive.
        assert_eq!(archive_results(&storage).await.unwrap(), 2);

        let bytes = std::fs::read(dir.path().join(ARCHIVE_FILE)).unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, vec!["a.md", "b.json"]);
    }

    #[tokio::test]
    async fn test_offline_run_of_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AccessConfig::default();
        config.output.data_dir = dir.path().join("data").to_string_lossy().to_string();
        config.output.results_dir = dir.path().join("results").to_string_lossy().to_string();
        config.visualization.chart_width = 800;
        config.visualization.chart_height = 600;

        let summary = run_stages(&config, Stage::All, true, Arc::new(SystemMonitor::new(false)))
            .await
            .unwrap();
        assert!(summary.archive.is_none());
        // 2 tables, 2 analysis outputs, 4 maps, 2 charts
        assert_eq!(summary.artifacts.len(), 10);
        assert_eq!(summary.results.len(), 8);
    }
}
