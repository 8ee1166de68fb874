use crate::adapters::csv_store;
use crate::analysis::report::{AnalysisReport, REPORT_FILE, SUMMARY_FILE};
use crate::config::AccessConfig;
use crate::core::{Pipeline, Storage};
use crate::domain::model::CollectedData;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Reads the collected tables and writes the Markdown report and JSON summary.
pub struct AnalyzePipeline<D: Storage, R: Storage> {
    data_storage: D,
    results_storage: R,
    config: AccessConfig,
    generated_on: String,
}

impl<D: Storage, R: Storage> AnalyzePipeline<D, R> {
    pub fn new(data_storage: D, results_storage: R, config: AccessConfig) -> Self {
        Self {
            data_storage,
            results_storage,
            config,
            generated_on: chrono::Local::now().format("%Y-%m-%d").to_string(),
        }
    }

    pub fn with_report_date(mut self, date: impl Into<String>) -> Self {
        self.generated_on = date.into();
        self
    }
}

#[async_trait]
impl<D: Storage, R: Storage> Pipeline for AnalyzePipeline<D, R> {
    type Extracted = CollectedData;
    type Transformed = AnalysisReport;

    fn name(&self) -> &str {
        "analyze"
    }

    async fn extract(&self) -> Result<CollectedData> {
        let data = csv_store::load_collected(&self.data_storage).await?;
        tracing::info!(
            "📊 Loaded {} stations, {} walkways, {} facilities",
            data.charging_stations.len(),
            data.walkways.len(),
            data.facilities.len()
        );
        Ok(data)
    }

    async fn transform(&self, data: CollectedData) -> Result<AnalysisReport> {
        let region = self.config.region_filter()?;
        let report = AnalysisReport::build(
            &data,
            &region,
            &self.config.region.rural_districts,
            &self.generated_on,
        );

        for h in &report.hypotheses {
            tracing::info!("🧪 가설 {}: {}", h.id, h.conclusion);
        }
        if let Some(gap) = &report.gap {
            tracing::info!(
                "📈 {} ({}) vs {} ({})",
                gap.best_district,
                gap.best_count,
                gap.worst_district,
                gap.worst_count
            );
        }
        Ok(report)
    }

    async fn load(&self, report: AnalysisReport) -> Result<Vec<String>> {
        let markdown = report.to_markdown()?;
        self.results_storage
            .write_file(REPORT_FILE, markdown.as_bytes())
            .await?;

        let json = serde_json::to_string_pretty(&report)?;
        self.results_storage
            .write_file(SUMMARY_FILE, json.as_bytes())
            .await?;

        Ok([REPORT_FILE, SUMMARY_FILE]
            .iter()
            .map(|file| format!("{}/{}", self.config.output.results_dir, file))
            .collect())
    }
}
