use clap::Parser;
use daegu_access::utils::monitor::SystemMonitor;
use daegu_access::utils::validation::Validate;
use daegu_access::{run_stages, CommonArgs, Stage};
use std::sync::Arc;

/// Fetch the charging-station, walkway and facility tables and write them as CSV.
#[derive(Debug, Parser)]
#[command(name = "collect")]
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
    match run_stages(&config, Stage::Collect, cli.common.offline, monitor).await {
        Ok(summary) => {
            println!("✅ Collection finished");
            for path in &summary.artifacts {
                println!("   {}", path);
            }
        }
        Err(e) => e.exit(),
    }
}
