use clap::Parser;
use daegu_access::core::stage::format_size;
use daegu_access::utils::monitor::SystemMonitor;
use daegu_access::utils::validation::Validate;
use daegu_access::{run_stages, CommonArgs, Stage};
use std::sync::Arc;

/// Render the HTML maps and the district chart from previously collected CSV tables.
#[derive(Debug, Parser)]
#[command(name = "visualize")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    cli.common.init_logging();

    let config = match cli.common.load_config() {
        Ok(config) => config,
        Err(e) => e.exit(),
    };
    if let Err(e) = config.validate() {
        e.exit();
    }

    let monitor = Arc::new(SystemMonitor::new(cli.common.monitor));
    match run_stages(&config, Stage::Visualize, false, monitor).await {
        Ok(summary) => {
            println!("✅ Visualization finished");
            for (name, size) in &summary.results {
                println!("   {} ({})", name, format_size(*size));
            }
        }
        Err(e) => e.exit(),
    }
}
