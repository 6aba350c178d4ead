//! Marketing Intel: channel performance and business outcome reporting.
//!
//! Loads the channel and business CSV exports, applies the requested filters
//! and prints the result as JSON.

mod loader;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use marketing_intel_core::{AppConfig, Channel, DateRange, Filters};
use marketing_intel_reporting::{Dimension, MarketingDashboard, SortKey};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "marketing-intel")]
#[command(about = "Marketing performance and business outcome reporting")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "MARKETING_INTEL_CONFIG")]
    config: Option<String>,

    /// Directory holding the input CSV files (overrides config)
    #[arg(long, global = true, env = "MARKETING_INTEL__DATA__DIR")]
    data_dir: Option<String>,

    /// First day of the range, inclusive (defaults to the earliest date in the data)
    #[arg(long, global = true)]
    start: Option<NaiveDate>,

    /// Last day of the range, inclusive (defaults to the latest date in the data)
    #[arg(long, global = true)]
    end: Option<NaiveDate>,

    /// Restrict to these channels
    #[arg(long, global = true, value_delimiter = ',')]
    channels: Option<Vec<String>>,

    /// Restrict to these states
    #[arg(long, global = true, value_delimiter = ',')]
    states: Option<Vec<String>>,

    /// Restrict to these tactics
    #[arg(long, global = true, value_delimiter = ',')]
    tactics: Option<Vec<String>>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full dashboard snapshot: KPIs, trend, breakdowns and insights
    Report,
    /// Metrics grouped by one dimension
    Breakdown {
        /// date, channel, tactic, state or campaign
        #[arg(long)]
        group_by: String,
        /// Sort descending by this metric
        #[arg(long)]
        sort_by: Option<String>,
        /// Keep only the first N groups
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Top performer, opportunity and review per channel and tactic
    Insights,
    /// Available filter values and the data's date span
    Options,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketing_intel=info,marketing_intel_reporting=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(dir) = cli.data_dir.clone() {
        config.data.dir = dir;
    }

    info!(
        data_dir = %config.data.dir,
        join_policy = ?config.join.policy,
        "Marketing Intel starting up"
    );

    let dataset = loader::load_dataset(&config.data)?;
    let dashboard = MarketingDashboard::with_config(Arc::new(dataset), &config);

    match &cli.command {
        Command::Options => print_json(&dashboard.filter_options()),
        Command::Report => {
            let filters = build_filters(&cli, &dashboard)?;
            print_json(&dashboard.snapshot(&filters))
        }
        Command::Breakdown {
            group_by,
            sort_by,
            limit,
        } => {
            let filters = build_filters(&cli, &dashboard)?;
            let dimension: Dimension = group_by.parse()?;
            let mut result = dashboard.compute(&filters, dimension);
            if let Some(sort) = sort_by {
                result = result.sorted_by(sort.parse::<SortKey>()?);
            }
            if let Some(limit) = limit {
                result = result.truncate(*limit);
            }
            print_json(&result)
        }
        Command::Insights => {
            let filters = build_filters(&cli, &dashboard)?;
            print_json(&dashboard.insights(&filters))
        }
    }
}

/// Full-span filters narrowed by whatever the command line restricts.
fn build_filters(cli: &Cli, dashboard: &MarketingDashboard) -> anyhow::Result<Filters> {
    let span = dashboard.default_filters().map(|f| f.date_range);
    let start = cli
        .start
        .or(span.map(|r| r.start))
        .context("No start date given and the dataset is empty")?;
    let end = cli
        .end
        .or(span.map(|r| r.end))
        .context("No end date given and the dataset is empty")?;

    let mut filters = Filters::new(DateRange::new(start, end));
    if let Some(channels) = &cli.channels {
        let channels = channels
            .iter()
            .map(|c| c.parse::<Channel>())
            .collect::<Result<Vec<_>, _>>()?;
        filters = filters.with_channels(channels);
    }
    if let Some(states) = &cli.states {
        filters = filters.with_states(states.iter().cloned());
    }
    if let Some(tactics) = &cli.tactics {
        filters = filters.with_tactics(tactics.iter().cloned());
    }
    Ok(filters)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
