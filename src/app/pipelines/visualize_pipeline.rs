use crate::adapters::csv_store;
use crate::analysis::district;
use crate::config::AccessConfig;
use crate::core::{Pipeline, Storage};
use crate::domain::model::CollectedData;
use crate::utils::error::Result;
use crate::visualization::chart::{self, Panel, CHART_PNG_FILE, CHART_SVG_FILE};
use crate::visualization::maps::{self, MapView};
use async_trait::async_trait;
use std::path::Path;

/// Rendered documents waiting to be written.
pub struct Rendered {
    pub maps: Vec<(&'static str, String)>,
    pub chart_svg: String,
    pub chart_labels: Vec<String>,
    pub chart_panels: Vec<Panel>,
}

/// Reads the collected tables and writes the HTML maps and the district chart.
///
/// The PNG is rasterized straight into `output.results_dir`; everything else
/// goes through the results storage.
pub struct VisualizePipeline<D: Storage, R: Storage> {
    data_storage: D,
    results_storage: R,
    config: AccessConfig,
}

impl<D: Storage, R: Storage> VisualizePipeline<D, R> {
    pub fn new(data_storage: D, results_storage: R, config: AccessConfig) -> Self {
        Self {
            data_storage,
            results_storage,
            config,
        }
    }

    fn view(&self) -> MapView {
        MapView {
            fallback_center: self.config.map_center(),
            zoom: self.config.visualization.map_zoom,
        }
    }

    fn chart_size(&self) -> (u32, u32) {
        (
            self.config.visualization.chart_width,
            self.config.visualization.chart_height,
        )
    }
}

#[async_trait]
impl<D: Storage, R: Storage> Pipeline for VisualizePipeline<D, R> {
    type Extracted = CollectedData;
    type Transformed = Rendered;

    fn name(&self) -> &str {
        "visualize"
    }

    async fn extract(&self) -> Result<CollectedData> {
        csv_store::load_collected(&self.data_storage).await
    }

    async fn transform(&self, data: CollectedData) -> Result<Rendered> {
        let view = self.view();
        let stats = district::district_stats(&data, &self.config.region.districts);

        let maps = vec![
            (
                maps::WALKWAY_MAP_FILE,
                maps::walkway_map(&data.walkways, &view).to_html()?,
            ),
            (
                maps::DISTRIBUTION_MAP_FILE,
                maps::charging_distribution_map(&data.charging_stations, &view).to_html()?,
            ),
            (
                maps::COMBINED_MAP_FILE,
                maps::combined_map(&data.charging_stations, &data.walkways, &view).to_html()?,
            ),
            (
                maps::ACCESSIBILITY_MAP_FILE,
                maps::accessibility_map(&data.charging_stations, &stats, &view).to_html()?,
            ),
        ];
        tracing::info!("🗺️ Built {} maps", maps.len());

        let (chart_labels, chart_panels) = chart::district_panels(&stats);
        let chart_svg = chart::render_svg(&chart_labels, &chart_panels, self.chart_size())?;

        Ok(Rendered {
            maps,
            chart_svg,
            chart_labels,
            chart_panels,
        })
    }

    async fn load(&self, rendered: Rendered) -> Result<Vec<String>> {
        let results_dir = &self.config.output.results_dir;
        let mut written = Vec::new();

        for (file, html) in &rendered.maps {
            self.results_storage.write_file(file, html.as_bytes()).await?;
            written.push(format!("{}/{}", results_dir, file));
        }

        self.results_storage
            .write_file(CHART_SVG_FILE, rendered.chart_svg.as_bytes())
            .await?;
        written.push(format!("{}/{}", results_dir, CHART_SVG_FILE));

        tokio::fs::create_dir_all(results_dir).await?;
        let png = Path::new(results_dir).join(CHART_PNG_FILE);
        chart::render_png(
            &png,
            &rendered.chart_labels,
            &rendered.chart_panels,
            self.chart_size(),
        )?;
        written.push(png.to_string_lossy().to_string());

        tracing::info!("🎨 Wrote {} visualization files", written.len());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipelines::collect_pipeline::CollectPipeline;
    use crate::config::cli::LocalStorage;

    #[tokio::test]
    async fn test_visualize_writes_maps_and_chart() {
        let data_dir = tempfile::tempdir().unwrap();
        let results_dir = tempfile::tempdir().unwrap();
        let mut config = AccessConfig::default();
        config.output.data_dir = data_dir.path().to_string_lossy().to_string();
        config.output.results_dir = results_dir.path().to_string_lossy().to_string();
        config.visualization.chart_width = 1000;
        config.visualization.chart_height = 800;

        let data_storage = LocalStorage::new(config.output.data_dir.clone());
        let results_storage = LocalStorage::new(config.output.results_dir.clone());

        let collect = CollectPipeline::new(data_storage.clone(), config.clone()).with_offline(true);
        let raw = collect.extract().await.unwrap();
        let data = collect.transform(raw).await.unwrap();
        collect.load(data).await.unwrap();

        let visualize = VisualizePipeline::new(data_storage, results_storage, config);
        let data = visualize.extract().await.unwrap();
        let rendered = visualize.transform(data).await.unwrap();
        let written = visualize.load(rendered).await.unwrap();

        assert_eq!(written.len(), 6);
        for file in [
            maps::WALKWAY_MAP_FILE,
            maps::DISTRIBUTION_MAP_FILE,
            maps::COMBINED_MAP_FILE,
            maps::ACCESSIBILITY_MAP_FILE,
            CHART_SVG_FILE,
            CHART_PNG_FILE,
        ] {
            assert!(results_dir.path().join(file).is_file(), "missing {}", file);
        }
        let html = std::fs::read_to_string(results_dir.path().join(maps::COMBINED_MAP_FILE)).unwrap();
        assert!(html.contains("대구 보행로 &amp; 급속충전기 통합 지도"));
    }
}
