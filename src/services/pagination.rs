use std::{ops::RangeInclusive, time::Duration};

use scraper::{Html, Selector};
use url::Url;

use crate::{
    configuration::ScraperSettings,
    domain::{AbortReason, Page, PageReference, PageStep, Termination},
    error::{Result, ScrapeError},
};

use super::{PageFetcher, RenderingSession};

/// Yields the pages of a listing in order, one at a time.
#[allow(async_fn_in_trait)]
pub trait PaginationDriver {
    /// Called only after the previous page has been fully processed.
    async fn advance(&mut self) -> PageStep;
}

pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|_| ScrapeError::InvalidSelector(selector.to_string()))
}

/// Highest numeric label among the pagination controls. Labels such as
/// "Previous" or "Next" are skipped; no numeric label at all means one page.
pub fn page_count<'a>(labels: impl IntoIterator<Item = &'a str>) -> u32 {
    labels
        .into_iter()
        .filter_map(|label| label.trim().parse::<u32>().ok())
        .max()
        .unwrap_or(1)
        .max(1)
}

pub fn page_url(base_url: &Url, page: u32) -> Url {
    let mut url = base_url.clone();
    url.query_pairs_mut().append_pair("page", &page.to_string());
    url
}

/// Reads the page count off page 1, then requests `page=2..N` by URL.
/// Page URLs are built one at a time, so a bogus label costs nothing until
/// those pages are actually asked for.
pub struct EnumeratedPages<F> {
    fetcher: F,
    base_url: Url,
    pagination: Selector,
    remaining: Option<RangeInclusive<u32>>,
}

impl<F: PageFetcher> EnumeratedPages<F> {
    pub fn new(fetcher: F, base_url: Url, pagination_selector: &str) -> Result<Self> {
        Ok(EnumeratedPages {
            fetcher,
            base_url,
            pagination: parse_selector(pagination_selector)?,
            remaining: None,
        })
    }

    async fn discover(&mut self) -> PageStep {
        let reference = PageReference::Url(self.base_url.clone());

        let (step, total) = match self.fetcher.fetch(&self.base_url).await {
            Ok(html) => {
                let total = self.count_pages(&html);
                log::info!("Found {} pages", total);
                (PageStep::Page(Page { reference, html }), total)
            }
            Err(e) => {
                log::error!("Failed to fetch first page {}: {:?}", self.base_url, e);
                let step = PageStep::Done(Termination::Aborted(AbortReason::FetchFailed {
                    reference,
                    message: e.to_string(),
                }));
                (step, 1)
            }
        };

        self.remaining = Some(2..=total);
        step
    }

    fn count_pages(&self, html: &str) -> u32 {
        let document = Html::parse_document(html);
        let labels: Vec<String> = document
            .select(&self.pagination)
            .map(|control| control.text().collect())
            .collect();

        if labels.is_empty() {
            log::warn!("No pagination controls on {}, assuming a single page", self.base_url);
        }
        page_count(labels.iter().map(String::as_str))
    }
}

impl<F: PageFetcher> PaginationDriver for EnumeratedPages<F> {
    async fn advance(&mut self) -> PageStep {
        if self.remaining.is_none() {
            return self.discover().await;
        }

        let Some(n) = self.remaining.as_mut().and_then(Iterator::next) else {
            return PageStep::Done(Termination::Exhausted);
        };
        let url = page_url(&self.base_url, n);

        match self.fetcher.fetch(&url).await {
            Ok(html) => PageStep::Page(Page {
                reference: PageReference::Url(url),
                html,
            }),
            Err(e) => {
                log::error!("Failed to fetch {}: {:?}", url, e);
                PageStep::Done(Termination::Aborted(AbortReason::FetchFailed {
                    reference: PageReference::Url(url),
                    message: e.to_string(),
                }))
            }
        }
    }
}

/// Clicks through a live session until the next control is missing or
/// disabled. The session is borrowed; whoever opened it closes it.
pub struct InteractivePages<'s, S> {
    session: &'s S,
    base_url: Url,
    table_selector: String,
    next_selector: String,
    timeout: Duration,
    settle: Duration,
    page: u32,
}

impl<'s, S: RenderingSession> InteractivePages<'s, S> {
    pub fn new(session: &'s S, base_url: Url, settings: &ScraperSettings) -> Self {
        InteractivePages {
            session,
            base_url,
            table_selector: settings.selectors.table.clone(),
            next_selector: settings.selectors.next.clone(),
            timeout: settings.page_timeout(),
            settle: settings.settle(),
            page: 0,
        }
    }

    /// `None` means the page was reached; `Some` ends the crawl.
    async fn move_forward(&mut self) -> Option<Termination> {
        if self.page == 0 {
            if let Err(e) = self.session.navigate(&self.base_url).await {
                log::error!("Failed to open {}: {:?}", self.base_url, e);
                return Some(Termination::Aborted(AbortReason::FetchFailed {
                    reference: PageReference::Url(self.base_url.clone()),
                    message: e.to_string(),
                }));
            }
            return None;
        }

        let Some(next) = self
            .session
            .find_next_control(&self.next_selector, self.timeout)
            .await
        else {
            log::warn!(
                "Reached the last page or couldn't find the next control after page {}",
                self.page
            );
            return Some(Termination::Exhausted);
        };

        if self.session.is_disabled(&next).await {
            log::info!("Next control is disabled. Stopping after page {}", self.page);
            return Some(Termination::Exhausted);
        }

        if let Err(e) = self.session.activate(&next).await {
            log::error!("Failed to click next after page {}: {:?}", self.page, e);
            return Some(Termination::Aborted(AbortReason::ControlFailed(e.to_string())));
        }

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        None
    }
}

impl<'s, S: RenderingSession> PaginationDriver for InteractivePages<'s, S> {
    async fn advance(&mut self) -> PageStep {
        if let Some(termination) = self.move_forward().await {
            return PageStep::Done(termination);
        }

        let reference = PageReference::Index(self.page + 1);

        if !self
            .session
            .wait_for_element(&self.table_selector, self.timeout)
            .await
        {
            log::warn!("Table did not load on {}", reference);
            return PageStep::Done(Termination::Aborted(AbortReason::WaitTimedOut(reference)));
        }

        match self.session.page_source().await {
            Ok(html) => {
                self.page += 1;
                PageStep::Page(Page { reference, html })
            }
            Err(e) => {
                log::error!("Failed to read {}: {:?}", reference, e);
                PageStep::Done(Termination::Aborted(AbortReason::FetchFailed {
                    reference,
                    message: e.to_string(),
                }))
            }
        }
    }
}
