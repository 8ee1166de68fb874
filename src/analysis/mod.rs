pub mod district;
pub mod hypotheses;
pub mod overview;
pub mod report;
pub mod stats;

pub use report::AnalysisReport;
