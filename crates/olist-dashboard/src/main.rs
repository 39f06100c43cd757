// crates/olist-dashboard/src/main.rs

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use olist_core::config::{PipelineConfig, VisualizationMode};
use olist_core::pipeline::DatasetService;
use olist_core::regions::StaticRegionRegistry;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod views;

#[derive(Parser, Debug)]
#[command(author, version, about = "Olist e-commerce dashboard", long_about = None)]
struct Cli {
    /// TOML file overriding the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the Olist CSV exports
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Skip the region registry request; region columns stay empty
    #[arg(long, global = true)]
    offline: bool,
    /// Fail instead of continuing when the region registry is unreachable
    #[arg(long, global = true)]
    strict_regions: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Row counts of every cached frame
    Summary,
    /// Share of each payment type
    Payments,
    /// Orders per weekday and hour
    PeakTimes,
    /// Daily average delivery time within a date range
    DeliveryTime(DeliveryTimeArgs),
    /// Sampled customer locations and region distribution
    Geo(GeoArgs),
}

#[derive(Args, Debug, Default)]
struct DeliveryTimeArgs {
    /// First purchase date to include (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,
    /// Last purchase date to include (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
struct GeoArgs {
    /// Purchase year to sample
    #[arg(long)]
    year: Option<i32>,
    /// Maximum number of sampled points
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    info!(data_dir = %config.data_dir.display(), offline = cli.offline, "starting dashboard");

    let service = if cli.offline {
        DatasetService::new(config, Box::new(StaticRegionRegistry::default()))
    } else {
        DatasetService::with_http_registry(config)
            .context("failed to configure region registry client")?
    };

    match cli.command {
        Command::Summary => handle_summary(&service),
        Command::Payments => handle_payments(&service),
        Command::PeakTimes => handle_peak_times(&service),
        Command::DeliveryTime(_) => handle_delivery_time(&service),
        Command::Geo(_) => handle_geo(&service),
    }
}

/// Defaults, then the config file, then `OLIST_*` variables, then flags.
fn resolve_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::load(cli.config.as_deref())
        .context("failed to load configuration file")?;
    config
        .apply_env(|key| env::var(key).ok())
        .context("invalid OLIST_* environment override")?;

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if cli.strict_regions {
        config.strict_region_lookup = true;
    }
    match &cli.command {
        Command::DeliveryTime(args) => {
            if let Some(start) = args.start_date {
                config.start_date = start;
            }
            if let Some(end) = args.end_date {
                config.end_date = end;
            }
        }
        Command::Geo(args) => {
            if let Some(year) = args.year {
                config.sample_year = year;
            }
            if let Some(limit) = args.limit {
                config.sample_limit = limit;
            }
        }
        _ => {}
    }

    config.validate().context("invalid command-line arguments")?;
    Ok(config)
}

fn handle_summary(service: &DatasetService) -> Result<()> {
    let dataset = service.dataset().context("failed to build dataset")?;
    println!("{}", views::render_summary(&dataset));
    Ok(())
}

fn handle_payments(service: &DatasetService) -> Result<()> {
    let dataset = service.dataset().context("failed to build dataset")?;
    println!("{}", VisualizationMode::PaymentMethodDistribution);
    println!("{}", views::render_payments(&dataset.payments)?);
    Ok(())
}

fn handle_peak_times(service: &DatasetService) -> Result<()> {
    let dataset = service.dataset().context("failed to build dataset")?;
    println!("{}", VisualizationMode::PeakShoppingTime);
    println!("{}", views::render_peak_times(&dataset.records)?);
    Ok(())
}

fn handle_delivery_time(service: &DatasetService) -> Result<()> {
    let dataset = service.dataset().context("failed to build dataset")?;
    let config = service.config();
    println!(
        "{} ({} to {})",
        VisualizationMode::AverageDeliveryTime,
        config.start_date,
        config.end_date
    );
    println!(
        "{}",
        views::render_delivery_time(&dataset.records, config.start_date, config.end_date)?
    );
    Ok(())
}

fn handle_geo(service: &DatasetService) -> Result<()> {
    let dataset = service.dataset().context("failed to build dataset")?;
    let config = service.config();
    println!("{}", VisualizationMode::GeospatialAnalysis);
    if !dataset.has_regions() {
        println!("Region registry unavailable; region columns are empty.");
    }
    for table in views::render_geo(&dataset, config.sample_year, config.sample_limit)? {
        println!("{table}");
    }
    Ok(())
}
