pub mod analyze_pipeline;
pub mod collect_pipeline;
pub mod visualize_pipeline;

pub use analyze_pipeline::AnalyzePipeline;
pub use collect_pipeline::CollectPipeline;
pub use visualize_pipeline::VisualizePipeline;
