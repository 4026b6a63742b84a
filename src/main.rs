//! Food Lookup CLI - query the Open Food Facts database from the terminal
//!
//! Runs one search, nutrient lookup or random pick through the resilient
//! fetch pipeline and prints the result as JSON.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use food_lookup::foods::PER_100G;
use food_lookup::{Config, FoodService};

/// Search foods and look up their nutrients
#[derive(Parser, Debug)]
#[command(name = "food_lookup")]
#[command(about = "Resilient Open Food Facts lookup")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Search products by free text
    Search {
        /// Search terms, joined with spaces
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Nutrient breakdown of one product
    Nutrients {
        /// Product barcode
        food_id: String,
        /// Display label used in logs
        #[arg(long, default_value = "")]
        label: String,
        /// per_100g or per_serving
        #[arg(long, default_value = PER_100G)]
        measure: String,
        /// Number of measures
        #[arg(long, default_value_t = 1.0)]
        quantity: f64,
    },
    /// Pick a random product
    Random,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "food_lookup=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env();
    info!(
        base_url = %config.base_url,
        max_retries = config.max_retries,
        timeout_ms = config.fetch_timeout_ms,
        "Configuration loaded"
    );

    let service = FoodService::from_config(&config).context("Failed to build food service")?;
    run(&service, cli.command).await
}

async fn run(service: &FoodService, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Search { query } => {
            let query = query.join(" ");
            let foods = service
                .search_foods(&query)
                .await
                .with_context(|| format!("Search for '{}' failed", query))?;
            print_json(&foods)
        }
        Command::Nutrients {
            food_id,
            label,
            measure,
            quantity,
        } => {
            let detail = service
                .get_food_nutrients(&food_id, &label, Some(&measure), quantity)
                .await
                .with_context(|| format!("Nutrient lookup for {} failed", food_id))?;
            print_json(&detail)
        }
        Command::Random => match service.get_random_food().await {
            Some(food) => print_json(&food),
            None => anyhow::bail!("No random food found"),
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
