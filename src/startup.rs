use std::path::PathBuf;

use anyhow::Context;
use url::Url;

use crate::{
    configuration::{Settings, Strategy},
    dal::export_dataset,
    domain::Termination,
    services::{
        Crawl, DatasetAssembler, Droid, EnumeratedPages, ExtractionEngine, HttpFetcher,
        InteractivePages, NullPolicy, RenderingSession, RowParser,
    },
};

#[derive(Debug)]
pub struct RunSummary {
    pub pages: u32,
    pub records: usize,
    pub termination: Termination,
    pub output: PathBuf,
}

/// Crawl with the configured strategy and export whatever was collected.
pub async fn run(settings: &Settings) -> anyhow::Result<RunSummary> {
    let crawl = crawl(settings).await?;

    let pages = crawl.pages;
    let termination = crawl.termination;
    let records = crawl.records.len();

    let assembler = DatasetAssembler::new(NullPolicy::new(settings.export.null_values.clone()));
    let dataset = assembler.assemble(crawl.records);

    export_dataset(&settings.export.path, &dataset, settings.export.format).with_context(|| {
        format!("Failed to write {}", settings.export.path.display())
    })?;

    Ok(RunSummary {
        pages,
        records,
        termination,
        output: settings.export.path.clone(),
    })
}

/// Only setup failures are errors. Anything that goes wrong mid-crawl ends
/// it early and is reported in [`Crawl::termination`].
pub async fn crawl(settings: &Settings) -> anyhow::Result<Crawl> {
    let scraper = &settings.scraper;
    let base_url = Url::parse(&scraper.base_url)
        .with_context(|| format!("Invalid base url: {}", scraper.base_url))?;

    let parser = RowParser::new(scraper.site_url.as_str(), scraper.missing_value);
    let engine = ExtractionEngine::new(parser, &scraper.selectors, scraper.max_pages)?;

    log::info!("Scraping {} ({} strategy)", base_url, scraper.strategy);

    let crawl = match scraper.strategy {
        Strategy::Enumerated => {
            let fetcher = HttpFetcher::new(&settings.http)?;
            let driver = EnumeratedPages::new(fetcher, base_url, &scraper.selectors.pagination)?;
            engine.extract(driver).collect().await
        }
        Strategy::Interactive => {
            let droid = Droid::new(&settings.webdriver)
                .await
                .context("Failed to start browser session")?;

            let driver = InteractivePages::new(&droid, base_url, scraper);
            let crawl = engine.extract(driver).collect().await;

            if let Err(e) = droid.close().await {
                log::error!("Failed to close browser session: {:?}", e);
            }
            crawl
        }
    };

    Ok(crawl)
}
