use clap::Parser;
use daegu_access::adapters::http::{parse_response, PublicDataClient};
use daegu_access::domain::model::Dataset;
use daegu_access::CommonArgs;
use serde_json::Value;

/// Call one portal endpoint with a tiny page and print what comes back.
#[derive(Debug, Parser)]
#[command(name = "probe-api")]
struct Cli {
    /// charging_station, walkway or disability_facilities
    #[arg(long, default_value = "charging_station")]
    dataset: String,

    #[arg(long, default_value_t = 3)]
    rows: usize,

    #[command(flatten)]
    common: CommonArgs,
}

fn describe(value: &Value, indent: usize, depth: usize) {
    let pad = "  ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match child {
                    Value::Object(_) | Value::Array(_) if depth > 0 => {
                        println!("{}{}:", pad, key);
                        describe(child, indent + 1, depth - 1);
                    }
                    _ => println!("{}{}: {}", pad, key, summary(child)),
                }
            }
        }
        Value::Array(items) => {
            println!("{}[{} items]", pad, items.len());
            if let Some(first) = items.first() {
                describe(first, indent + 1, depth.saturating_sub(1));
            }
        }
        other => println!("{}{}", pad, summary(other)),
    }
}

fn summary(value: &Value) -> String {
    match value {
        Value::Object(map) => format!("{{{} keys}}", map.len()),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::String(s) if s.chars().count() > 60 => {
            format!("{:?}...", s.chars().take(60).collect::<String>())
        }
        other => other.to_string(),
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    cli.common.init_logging();

    let Some(dataset) = Dataset::ALL.into_iter().find(|d| d.key() == cli.dataset) else {
        eprintln!("❌ Unknown dataset '{}'", cli.dataset);
        std::process::exit(1);
    };

    let config = match cli.common.load_config() {
        Ok(config) => config,
        Err(e) => e.exit(),
    };
    let client = match config
        .service_key()
        .and_then(|key| PublicDataClient::new(key, &config.api))
    {
        Ok(client) => client,
        Err(e) => e.exit(),
    };

    let endpoint = config.endpoint(dataset);
    println!("🔍 {} ({})", dataset.label(), endpoint);

    let (status, body) = match client
        .fetch_raw(&endpoint, &config.parameters(dataset), cli.rows)
        .await
    {
        Ok(response) => response,
        Err(e) => e.exit(),
    };
    println!("📡 HTTP {}", status);

    match serde_json::from_str::<Value>(body.trim_start_matches('\u{feff}')) {
        Ok(json) => {
            println!("📋 Response structure:");
            describe(&json, 1, 4);
        }
        Err(_) => {
            let preview: String = body.chars().take(500).collect();
            println!("📋 Response is not JSON:\n{}", preview);
        }
    }

    match parse_response(&body) {
        Ok(page) => {
            println!(
                "✅ {} records on this page (totalCount {:?})",
                page.records.len(),
                page.total_count
            );
            if let Some(record) = page.records.first() {
                let mut fields: Vec<&String> = record.data.keys().collect();
                fields.sort();
                println!("🏷️ Fields: {:?}", fields);
            }
        }
        Err(e) => {
            println!("⚠️ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    }
}
