use clap::Parser;
use daegu_access::core::stage::format_size;
use daegu_access::utils::monitor::SystemMonitor;
use daegu_access::utils::validation::Validate;
use daegu_access::{run_stages, CliConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = CliConfig::parse();
    cli.common.init_logging();

    tracing::info!("Starting daegu-access ({:?})", cli.stage);
    if cli.common.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => e.exit(),
    };
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        e.exit();
    }

    if cli.common.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }
    let monitor = Arc::new(SystemMonitor::new(cli.common.monitor));

    match run_stages(&config, cli.stage, cli.common.offline, monitor).await {
        Ok(summary) => {
            tracing::info!("✅ Pipeline completed successfully!");
            println!("✅ Pipeline completed successfully!");
            println!("📁 Results in {}:", config.output.results_dir);
            for (name, size) in &summary.results {
                println!("   {} ({})", name, format_size(*size));
            }
            if let Some(archive) = &summary.archive {
                println!("📦 Archive: {}", archive);
            }
        }
        Err(e) => e.exit(),
    }
}
