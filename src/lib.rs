pub mod adapters;
pub mod analysis;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;
pub mod visualization;

pub use config::cli::LocalStorage;
#[cfg(feature = "cli")]
pub use config::{CliConfig, CommonArgs};
pub use config::AccessConfig;

pub use core::etl::EtlEngine;
pub use core::stage::{run_stages, RunSummary, Stage};
pub use utils::error::{AccessError, Result};
