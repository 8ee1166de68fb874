use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::sync::Arc;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: Option<Arc<SystemMonitor>>,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: None,
        }
    }

    pub fn with_monitor(mut self, monitor: Arc<SystemMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    fn checkpoint(&self, phase: &str) {
        if let Some(monitor) = &self.monitor {
            monitor.log_stats(&format!("{} {}", self.pipeline.name(), phase));
        }
    }

    /// Runs extract, transform and load, returning the artifacts written.
    pub async fn run(&self) -> Result<Vec<String>> {
        let name = self.pipeline.name();
        tracing::info!("🚀 Starting {} stage", name);

        tracing::debug!("Extracting data...");
        let raw_data = self.pipeline.extract().await?;
        self.checkpoint("extract");

        tracing::debug!("Transforming data...");
        let transformed = self.pipeline.transform(raw_data).await?;
        self.checkpoint("transform");

        tracing::debug!("Loading data...");
        let artifacts = self.pipeline.load(transformed).await?;
        self.checkpoint("load");

        tracing::info!("✅ {} stage finished, {} artifacts", name, artifacts.len());
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AccessError;
    use async_trait::async_trait;

    struct Doubling {
        fail_on_transform: bool,
    }

    #[async_trait]
    impl Pipeline for Doubling {
        type Extracted = Vec<u32>;
        type Transformed = Vec<u32>;

        fn name(&self) -> &str {
            "doubling"
        }

        async fn extract(&self) -> Result<Vec<u32>> {
            Ok(vec![1, 2, 3])
        }

        async fn transform(&self, data: Vec<u32>) -> Result<Vec<u32>> {
            if self.fail_on_transform {
                return Err(AccessError::processing("boom"));
            }
            Ok(data.into_iter().map(|v| v * 2).collect())
        }

        async fn load(&self, result: Vec<u32>) -> Result<Vec<String>> {
            Ok(result.iter().map(|v| format!("{}.txt", v)).collect())
        }
    }

    #[tokio::test]
    async fn test_engine_runs_all_phases() {
        let engine = EtlEngine::new(Doubling {
            fail_on_transform: false,
        })
        .with_monitor(Arc::new(SystemMonitor::new(false)));
        let artifacts = engine.run().await.unwrap();
        assert_eq!(artifacts, vec!["2.txt", "4.txt", "6.txt"]);
    }

    #[tokio::test]
    async fn test_engine_stops_on_transform_error() {
        let engine = EtlEngine::new(Doubling {
            fail_on_transform: true,
        });
        assert!(engine.run().await.is_err());
    }
}
