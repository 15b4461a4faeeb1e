use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use nuforc_scraper::{
    configuration::{get_configuration, get_configuration_from, Settings, Strategy},
    dal::ExportFormat,
    domain::MissingValue,
    startup::run,
};

/// Scrape the paginated NUFORC sighting table into a CSV file.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Directory holding base.yaml / local.yaml
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// enumerated (plain HTTP) or interactive (WebDriver)
    #[arg(long)]
    strategy: Option<Strategy>,

    #[arg(long)]
    base_url: Option<String>,

    #[arg(short, long)]
    out: Option<PathBuf>,

    /// csv or tsv
    #[arg(long)]
    format: Option<ExportFormat>,

    #[arg(long)]
    max_pages: Option<u32>,

    /// Placeholder for absent cells: empty or na
    #[arg(long)]
    missing: Option<MissingValue>,
}

impl Cli {
    fn apply(self, settings: &mut Settings) {
        if let Some(strategy) = self.strategy {
            settings.scraper.strategy = strategy;
        }
        if let Some(base_url) = self.base_url {
            settings.scraper.base_url = base_url;
        }
        if let Some(out) = self.out {
            settings.export.path = out;
        }
        if let Some(format) = self.format {
            settings.export.format = format;
        }
        if let Some(max_pages) = self.max_pages {
            settings.scraper.max_pages = max_pages;
        }
        if let Some(missing) = self.missing {
            settings.scraper.missing_value = missing;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut configuration = match &cli.config_dir {
        Some(dir) => get_configuration_from(dir),
        None => get_configuration(),
    }
    .context("Failed to read configuration.")?;
    cli.apply(&mut configuration);

    let summary = run(&configuration).await?;

    log::info!(
        "Data saved to {} ({} records from {} pages, {})",
        summary.output.display(),
        summary.records,
        summary.pages,
        summary.termination
    );

    Ok(())
}
