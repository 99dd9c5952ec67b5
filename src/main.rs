use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod charts;
mod config;
mod dataset;
mod error;
mod generator;
mod kpi;
mod models;
mod report;

use config::GeneratorConfig;
use generator::DateRange;
use models::GroupBy;
use report::SummaryDocument;

#[derive(Parser)]
#[command(name = "campaign-kpi")]
#[command(about = "Synthetic marketing campaign data and KPI rollups", long_about = None)]
struct Cli {
    /// Log filter directive, e.g. "info" or "campaign_kpi=debug"
    #[arg(long, global = true, env = "CAMPAIGN_KPI_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic campaign dataset as CSV
    Generate {
        #[arg(long, default_value_t = 1000)]
        rows: usize,
        #[arg(long, default_value = "2024-01-01")]
        start: NaiveDate,
        #[arg(long, default_value = "2024-06-30")]
        end: NaiveDate,
        #[arg(long, env = "CAMPAIGN_KPI_SEED", default_value_t = 42)]
        seed: u64,
        /// Draw from OS entropy instead of the seed
        #[arg(long)]
        random: bool,
        /// JSON file overriding campaigns and sampling bounds
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "marketing_campaign_data.csv")]
        out: PathBuf,
    },
    /// Print overall KPIs and ranked group summaries
    Summary {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, value_enum)]
        by: Option<GroupBy>,
        #[arg(long)]
        limit: Option<usize>,
        /// Emit the full summary document as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a markdown report and chart series
    Report {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long)]
        charts_dir: Option<PathBuf>,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Generate {
            rows,
            start,
            end,
            seed,
            random,
            config,
            out,
        } => {
            let seed = (!random).then_some(seed);
            let range = DateRange::new(start, end);
            let events = match config {
                Some(path) => {
                    let generator_config = GeneratorConfig::load(&path).with_context(|| {
                        format!("failed to load generator config {}", path.display())
                    })?;
                    generator::generate_with(&generator_config, rows, range, seed)
                }
                None => generator::generate(rows, range, seed),
            }
            .context("failed to generate campaign data")?;
            let written = dataset::write_events(&out, &events)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Wrote {written} synthetic campaign events to {}.", out.display());
        }
        Commands::Summary {
            csv,
            by,
            limit,
            json,
        } => {
            let outcome = dataset::load_events(&csv)
                .with_context(|| format!("failed to load {}", csv.display()))?;
            let document = SummaryDocument::from_events(&outcome.events);

            if json {
                println!("{}", document.to_json()?);
            } else {
                print!("{}", report::render_summary(&document, by, limit));
            }
        }
        Commands::Report {
            csv,
            out,
            charts_dir,
        } => {
            let outcome = dataset::load_events(&csv)
                .with_context(|| format!("failed to load {}", csv.display()))?;
            let document = SummaryDocument::from_events(&outcome.events);

            let markdown = report::build_report(
                &csv.display().to_string(),
                &document,
                &outcome.malformed,
            );
            std::fs::write(&out, markdown)?;
            println!("Report written to {}.", out.display());

            if let Some(dir) = charts_dir {
                let paths = charts::write_chart_data(
                    &dir,
                    &document.monthly,
                    &document.channel,
                    &document.platform,
                )
                .with_context(|| format!("failed to write chart data to {}", dir.display()))?;
                info!(files = paths.len(), "chart series ready");
                println!("Chart series written to {}.", dir.display());
            }
        }
    }

    Ok(())
}
