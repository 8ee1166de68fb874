pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::stage::Stage;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::{Args, Parser};

pub use toml_config::{AccessConfig, ApiFailurePolicy};

/// Flags shared by every binary.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    #[arg(short, long, default_value = toml_config::DEFAULT_CONFIG_FILE)]
    pub config: String,

    #[arg(long, help = "Override output.data_dir")]
    pub data_dir: Option<String>,

    #[arg(long, help = "Override output.results_dir")]
    pub results_dir: Option<String>,

    #[arg(long, help = "Skip the network and use sample data")]
    pub offline: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit JSON log lines on stderr")]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CommonArgs {
    /// Reads the TOML file (defaults when absent) and applies the command line overrides.
    pub fn load_config(&self) -> Result<AccessConfig> {
        let mut config = AccessConfig::load_or_default(&self.config)?;
        if let Some(dir) = &self.data_dir {
            config.output.data_dir = dir.clone();
        }
        if let Some(dir) = &self.results_dir {
            config.output.results_dir = dir.clone();
        }
        Ok(config)
    }

    pub fn init_logging(&self) {
        if self.json_logs {
            crate::utils::logger::init_json_logger(self.verbose);
        } else {
            crate::utils::logger::init_cli_logger(self.verbose);
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "daegu-access")]
#[command(about = "Wheelchair fast-charger accessibility analysis for Daegu")]
pub struct CliConfig {
    #[arg(long, value_enum, default_value_t = Stage::All)]
    pub stage: Stage,

    #[arg(long, help = "Bundle the results directory into results.zip")]
    pub archive: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn load_config(&self) -> Result<AccessConfig> {
        let mut config = self.common.load_config()?;
        if self.archive {
            config.output.archive = true;
        }
        Ok(config)
    }
}
