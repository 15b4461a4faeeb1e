use std::collections::VecDeque;

use scraper::{Html, Selector};

use crate::{
    configuration::Selectors,
    domain::{AbortReason, Page, PageStep, Record, Termination},
    error::Result,
};

use super::{parse_selector, PaginationDriver, RawCell, RowParser};

/// Everything one crawl produced, in encounter order.
#[derive(Debug)]
pub struct Crawl {
    pub records: Vec<Record>,
    pub pages: u32,
    pub termination: Termination,
}

/// Turns pages into records: finds the table, skips its header row and runs
/// every other row through the [`RowParser`].
pub struct ExtractionEngine {
    parser: RowParser,
    table: Selector,
    row: Selector,
    cell: Selector,
    anchor: Selector,
    max_pages: u32,
}

impl ExtractionEngine {
    pub fn new(parser: RowParser, selectors: &Selectors, max_pages: u32) -> Result<Self> {
        Ok(ExtractionEngine {
            parser,
            table: parse_selector(&selectors.table)?,
            row: parse_selector(&selectors.row)?,
            cell: parse_selector(&selectors.cell)?,
            anchor: parse_selector("a[href]")?,
            max_pages,
        })
    }

    /// Records of one page, or `None` when the page has no table.
    pub fn parse_page(&self, html: &str) -> Option<Vec<Record>> {
        let document = Html::parse_document(html);
        let table = document.select(&self.table).next()?;

        let records = table
            .select(&self.row)
            .skip(1)
            .map(|row| {
                let cells: Vec<RawCell> = row
                    .select(&self.cell)
                    .map(|cell| RawCell::from_element(cell, &self.anchor))
                    .collect();
                self.parser.parse(&cells)
            })
            .collect();

        Some(records)
    }

    /// Start a lazy crawl. Nothing is fetched until records are pulled.
    pub fn extract<D: PaginationDriver>(&self, driver: D) -> Extraction<'_, D> {
        Extraction {
            engine: self,
            driver,
            buffer: VecDeque::new(),
            pages: 0,
            termination: None,
        }
    }
}

/// Forward-only record cursor over a crawl. Pages are requested one at a
/// time, only once the records of the previous page are used up.
pub struct Extraction<'e, D> {
    engine: &'e ExtractionEngine,
    driver: D,
    buffer: VecDeque<Record>,
    pages: u32,
    termination: Option<Termination>,
}

impl<'e, D: PaginationDriver> Extraction<'e, D> {
    pub async fn next_record(&mut self) -> Option<Record> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(record);
            }
            if self.termination.is_some() {
                return None;
            }
            self.next_page().await;
        }
    }

    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Set once the crawl has stopped, `None` while pages may remain.
    pub fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    pub async fn collect(mut self) -> Crawl {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await {
            records.push(record);
        }

        Crawl {
            records,
            pages: self.pages,
            termination: self.termination.unwrap_or(Termination::Exhausted),
        }
    }

    /// At the ceiling the driver is still asked once more, so a crawl whose
    /// last page is exactly the ceiling ends as `Exhausted`. Only a further
    /// page, which is dropped unparsed, makes it `CeilingReached`.
    async fn next_page(&mut self) {
        let at_ceiling = self.pages >= self.engine.max_pages;

        match self.driver.advance().await {
            PageStep::Page(page) if at_ceiling => {
                log::warn!(
                    "Stopping at the page ceiling of {}, {} and possibly more not scraped",
                    self.engine.max_pages,
                    page.reference
                );
                self.termination = Some(Termination::CeilingReached(self.engine.max_pages));
            }
            PageStep::Page(page) => self.take_page(page),
            PageStep::Done(termination) => {
                match &termination {
                    Termination::Exhausted => {
                        log::info!("No more pages after page {}", self.pages)
                    }
                    other => log::warn!("Pagination ended early after page {}: {}", self.pages, other),
                }
                self.termination = Some(termination);
            }
        }
    }

    fn take_page(&mut self, page: Page) {
        log::info!("Scraping page {} ({})", self.pages + 1, page.reference);

        match self.engine.parse_page(&page.html) {
            Some(records) => {
                self.pages += 1;
                log::info!("Page {} gave {} records", self.pages, records.len());
                self.buffer.extend(records);
            }
            None => {
                log::warn!("No table on {}, stopping", page.reference);
                self.termination = Some(Termination::Aborted(AbortReason::TableMissing(
                    page.reference,
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        collections::HashMap,
        time::Duration,
    };

    use url::Url;

    use super::*;
    use crate::{
        configuration::{ScraperSettings, Strategy},
        domain::{MissingValue, PageReference},
        error::ScrapeError,
        services::{EnumeratedPages, InteractivePages, PageFetcher, RenderingSession},
    };

    const SITE: &str = "https://nuforc.org/";

    fn engine(max_pages: u32) -> ExtractionEngine {
        ExtractionEngine::new(
            RowParser::new(SITE, MissingValue::Empty),
            &Selectors::default(),
            max_pages,
        )
        .unwrap()
    }

    fn settings() -> ScraperSettings {
        ScraperSettings {
            base_url: "https://nuforc.org/subndx/?id=highlights".to_string(),
            site_url: SITE.to_string(),
            strategy: Strategy::Interactive,
            missing_value: MissingValue::Empty,
            max_pages: 100,
            page_timeout_secs: 1,
            settle_ms: 0,
            selectors: Selectors::default(),
        }
    }

    /// A listing page: header row, then one row per id with `Reported` text.
    fn listing(rows: &[(&str, &str)], labels: &[&str]) -> String {
        let mut html = String::from(
            "<html><body><table><tr><th>Link</th><th>Date</th><th>City</th></tr>",
        );
        for (id, reported) in rows {
            html.push_str(&format!(
                r#"<tr><td><a href="sighting/?id={id}">Open</a></td><td>2024-01-0{id}</td><td>City {id}</td><td>TX</td><td>USA</td><td>Disk</td><td>Summary {id}</td><td>{reported}</td><td></td><td></td></tr>"#
            ));
        }
        html.push_str("</table><div>");
        for label in labels {
            html.push_str(&format!(r#"<a class="paginate_button">{label}</a>"#));
        }
        html.push_str("</div></body></html>");
        html
    }

    struct Scripted(VecDeque<PageStep>);

    impl PaginationDriver for Scripted {
        async fn advance(&mut self) -> PageStep {
            self.0
                .pop_front()
                .unwrap_or(PageStep::Done(Termination::Exhausted))
        }
    }

    fn page(n: u32, html: String) -> PageStep {
        PageStep::Page(Page {
            reference: PageReference::Index(n),
            html,
        })
    }

    struct FakeSite {
        pages: HashMap<String, String>,
        requested: RefCell<Vec<String>>,
    }

    impl PageFetcher for FakeSite {
        async fn fetch(&self, url: &Url) -> crate::error::Result<String> {
            self.requested.borrow_mut().push(url.to_string());
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| {
                    ScrapeError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, url.to_string()))
                })
        }
    }

    /// How the next control behaves once `last_page` is showing.
    #[derive(Clone, Copy)]
    enum LastPage {
        Disabled,
        NoControl,
        ClickFails,
    }

    /// Browser tab with `last_page` pages that ends the way `end` says.
    struct FakeSession {
        last_page: u32,
        end: LastPage,
        current: Cell<u32>,
    }

    impl FakeSession {
        fn new(last_page: u32, end: LastPage) -> Self {
            FakeSession {
                last_page,
                end,
                current: Cell::new(0),
            }
        }

        fn on_last_page(&self) -> bool {
            self.current.get() >= self.last_page
        }
    }

    impl RenderingSession for FakeSession {
        type Control = u32;

        async fn navigate(&self, _url: &Url) -> crate::error::Result<()> {
            self.current.set(1);
            Ok(())
        }

        async fn wait_for_element(&self, _selector: &str, _timeout: Duration) -> bool {
            self.current.get() > 0
        }

        async fn find_next_control(&self, _selector: &str, _timeout: Duration) -> Option<u32> {
            match self.end {
                LastPage::NoControl if self.on_last_page() => None,
                _ => Some(self.current.get()),
            }
        }

        async fn is_disabled(&self, _control: &u32) -> bool {
            matches!(self.end, LastPage::Disabled) && self.on_last_page()
        }

        async fn activate(&self, _control: &u32) -> crate::error::Result<()> {
            if matches!(self.end, LastPage::ClickFails) && self.on_last_page() {
                return Err(ScrapeError::Io(std::io::Error::other(
                    "element click intercepted",
                )));
            }
            self.current.set(self.current.get() + 1);
            Ok(())
        }

        async fn page_source(&self) -> crate::error::Result<String> {
            let n = self.current.get().to_string();
            Ok(listing(&[(n.as_str(), "1")], &[]))
        }

        async fn close(self) -> crate::error::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn header_row_is_skipped() {
        let records = engine(10)
            .parse_page(&listing(&[("1", "2"), ("2", "3")], &[]))
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].link, "https://nuforc.org/sighting/?id=1");
        assert_eq!(records[1].city, "City 2");
    }

    #[test]
    fn page_without_table_is_none() {
        assert!(engine(10).parse_page("<html><body>gone</body></html>").is_none());
    }

    #[tokio::test]
    async fn header_only_page_does_not_stop_pagination() {
        let driver = Scripted(VecDeque::from([
            page(1, listing(&[("1", "1")], &[])),
            page(2, listing(&[], &[])),
            page(3, listing(&[("3", "1")], &[])),
        ]));

        let crawl = engine(10).extract(driver).collect().await;

        assert_eq!(crawl.pages, 3);
        assert_eq!(crawl.records.len(), 2);
        assert_eq!(crawl.termination, Termination::Exhausted);
    }

    #[tokio::test]
    async fn missing_table_aborts_but_keeps_earlier_records() {
        let driver = Scripted(VecDeque::from([
            page(1, listing(&[("1", "1"), ("2", "1")], &[])),
            page(2, "<html><p>maintenance</p></html>".to_string()),
            page(3, listing(&[("3", "1")], &[])),
        ]));

        let crawl = engine(10).extract(driver).collect().await;

        assert_eq!(crawl.records.len(), 2);
        assert_eq!(crawl.pages, 1);
        assert_eq!(
            crawl.termination,
            Termination::Aborted(AbortReason::TableMissing(PageReference::Index(2)))
        );
        assert!(!crawl.termination.is_exhausted());
    }

    #[tokio::test]
    async fn ceiling_stops_endless_pagination() {
        let driver = Scripted((1..=50).map(|n| page(n, listing(&[("1", "1")], &[]))).collect());

        let crawl = engine(5).extract(driver).collect().await;

        assert_eq!(crawl.pages, 5);
        assert_eq!(crawl.records.len(), 5);
        assert_eq!(crawl.termination, Termination::CeilingReached(5));
    }

    #[tokio::test]
    async fn crawl_ending_at_the_ceiling_is_exhausted() {
        let driver = Scripted((1..=5).map(|n| page(n, listing(&[("1", "1")], &[]))).collect());

        let crawl = engine(5).extract(driver).collect().await;

        assert_eq!(crawl.pages, 5);
        assert_eq!(crawl.records.len(), 5);
        assert_eq!(crawl.termination, Termination::Exhausted);
    }

    #[tokio::test]
    async fn page_past_the_ceiling_is_not_parsed() {
        let driver = Scripted(VecDeque::from([
            page(1, listing(&[("1", "1")], &[])),
            page(2, listing(&[("2", "1"), ("3", "1")], &[])),
        ]));

        let crawl = engine(1).extract(driver).collect().await;

        assert_eq!(crawl.pages, 1);
        assert_eq!(crawl.records.len(), 1);
        assert_eq!(crawl.termination, Termination::CeilingReached(1));
    }

    #[tokio::test]
    async fn records_are_pulled_lazily() {
        let driver = Scripted(VecDeque::from([
            page(1, listing(&[("1", "1"), ("2", "1")], &[])),
            page(2, listing(&[("3", "1")], &[])),
        ]));
        let engine = engine(10);
        let mut extraction = engine.extract(driver);

        assert_eq!(extraction.pages(), 0);
        let first = extraction.next_record().await.unwrap();
        assert_eq!(first.city, "City 1");
        assert_eq!(extraction.pages(), 1);
        assert!(extraction.termination().is_none());

        extraction.next_record().await.unwrap();
        let third = extraction.next_record().await.unwrap();
        assert_eq!(third.city, "City 3");
        assert_eq!(extraction.pages(), 2);

        assert!(extraction.next_record().await.is_none());
        assert_eq!(extraction.termination(), Some(&Termination::Exhausted));
        assert!(extraction.next_record().await.is_none());
    }

    #[tokio::test]
    async fn enumerated_two_pages_in_order() {
        let base = "https://nuforc.org/subndx/?id=highlights";
        let page_two = "https://nuforc.org/subndx/?id=highlights&page=2";
        let site = FakeSite {
            pages: HashMap::from([
                (
                    base.to_string(),
                    listing(&[("1", "5"), ("2", "1"), ("3", "2")], &["Previous", "1", "2", "Next"]),
                ),
                (page_two.to_string(), listing(&[("4", "unknown")], &["1", "2"])),
            ]),
            requested: RefCell::new(Vec::new()),
        };
        let driver =
            EnumeratedPages::new(&site, Url::parse(base).unwrap(), "a.paginate_button").unwrap();

        let crawl = engine(10).extract(driver).collect().await;

        let cities: Vec<&str> = crawl.records.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, ["City 1", "City 2", "City 3", "City 4"]);
        assert_eq!(crawl.records[3].reported, "unknown");
        assert_eq!(crawl.pages, 2);
        assert_eq!(crawl.termination, Termination::Exhausted);
        assert_eq!(*site.requested.borrow(), [base, page_two]);
    }

    #[tokio::test]
    async fn enumerated_site_ending_at_the_ceiling_is_exhausted() {
        let base = "https://nuforc.org/subndx/?id=highlights";
        let site = FakeSite {
            pages: HashMap::from([
                (base.to_string(), listing(&[("1", "1")], &["1", "2"])),
                (
                    "https://nuforc.org/subndx/?id=highlights&page=2".to_string(),
                    listing(&[("2", "1")], &["1", "2"]),
                ),
            ]),
            requested: RefCell::new(Vec::new()),
        };
        let driver =
            EnumeratedPages::new(&site, Url::parse(base).unwrap(), "a.paginate_button").unwrap();

        let crawl = engine(2).extract(driver).collect().await;

        assert_eq!(crawl.pages, 2);
        assert_eq!(crawl.termination, Termination::Exhausted);
        assert_eq!(site.requested.borrow().len(), 2);
    }

    #[tokio::test]
    async fn huge_page_label_only_costs_what_the_ceiling_allows() {
        let base = "https://nuforc.org/subndx/?id=highlights";
        let site = FakeSite {
            pages: HashMap::from([
                (
                    base.to_string(),
                    listing(&[("1", "1")], &["1", "4294967295", "Next"]),
                ),
                (
                    "https://nuforc.org/subndx/?id=highlights&page=2".to_string(),
                    listing(&[("2", "1")], &[]),
                ),
                (
                    "https://nuforc.org/subndx/?id=highlights&page=3".to_string(),
                    listing(&[("3", "1")], &[]),
                ),
            ]),
            requested: RefCell::new(Vec::new()),
        };
        let driver =
            EnumeratedPages::new(&site, Url::parse(base).unwrap(), "a.paginate_button").unwrap();

        let crawl = engine(2).extract(driver).collect().await;

        assert_eq!(crawl.pages, 2);
        assert_eq!(crawl.records.len(), 2);
        assert_eq!(crawl.termination, Termination::CeilingReached(2));
        assert_eq!(
            *site.requested.borrow(),
            [
                base,
                "https://nuforc.org/subndx/?id=highlights&page=2",
                "https://nuforc.org/subndx/?id=highlights&page=3",
            ]
        );
    }

    #[tokio::test]
    async fn enumerated_failed_page_aborts() {
        let base = "https://nuforc.org/subndx/?id=highlights";
        let site = FakeSite {
            pages: HashMap::from([(
                base.to_string(),
                listing(&[("1", "5")], &["1", "2", "3"]),
            )]),
            requested: RefCell::new(Vec::new()),
        };
        let driver =
            EnumeratedPages::new(&site, Url::parse(base).unwrap(), "a.paginate_button").unwrap();

        let crawl = engine(10).extract(driver).collect().await;

        assert_eq!(crawl.records.len(), 1);
        assert!(matches!(
            crawl.termination,
            Termination::Aborted(AbortReason::FetchFailed { .. })
        ));
        assert_eq!(site.requested.borrow().len(), 2);
    }

    #[tokio::test]
    async fn interactive_stops_at_disabled_next() {
        let session = FakeSession::new(4, LastPage::Disabled);
        let settings = settings();
        let driver =
            InteractivePages::new(&session, Url::parse(&settings.base_url).unwrap(), &settings);

        let crawl = engine(100).extract(driver).collect().await;

        assert_eq!(crawl.pages, 4);
        assert_eq!(crawl.records.len(), 4);
        assert_eq!(crawl.records[3].city, "City 4");
        assert_eq!(crawl.termination, Termination::Exhausted);

        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn interactive_stops_when_next_control_is_gone() {
        let session = FakeSession::new(3, LastPage::NoControl);
        let settings = settings();
        let driver =
            InteractivePages::new(&session, Url::parse(&settings.base_url).unwrap(), &settings);

        let crawl = engine(100).extract(driver).collect().await;

        assert_eq!(crawl.pages, 3);
        assert_eq!(crawl.records.len(), 3);
        assert_eq!(crawl.termination, Termination::Exhausted);
    }

    #[tokio::test]
    async fn interactive_failed_click_aborts() {
        let session = FakeSession::new(2, LastPage::ClickFails);
        let settings = settings();
        let driver =
            InteractivePages::new(&session, Url::parse(&settings.base_url).unwrap(), &settings);

        let crawl = engine(100).extract(driver).collect().await;

        assert_eq!(crawl.pages, 2);
        assert_eq!(crawl.records.len(), 2);
        assert!(matches!(
            crawl.termination,
            Termination::Aborted(AbortReason::ControlFailed(_))
        ));
        assert!(!crawl.termination.is_exhausted());
    }

    #[tokio::test]
    async fn interactive_wait_timeout_aborts() {
        struct NeverLoads;

        impl RenderingSession for NeverLoads {
            type Control = ();

            async fn navigate(&self, _url: &Url) -> crate::error::Result<()> {
                Ok(())
            }
            async fn wait_for_element(&self, _selector: &str, _timeout: Duration) -> bool {
                false
            }
            async fn find_next_control(&self, _: &str, _: Duration) -> Option<()> {
                None
            }
            async fn is_disabled(&self, _control: &()) -> bool {
                true
            }
            async fn activate(&self, _control: &()) -> crate::error::Result<()> {
                Ok(())
            }
            async fn page_source(&self) -> crate::error::Result<String> {
                Ok(String::new())
            }
            async fn close(self) -> crate::error::Result<()> {
                Ok(())
            }
        }

        let settings = settings();
        let driver =
            InteractivePages::new(&NeverLoads, Url::parse(&settings.base_url).unwrap(), &settings);

        let crawl = engine(100).extract(driver).collect().await;

        assert!(crawl.records.is_empty());
        assert_eq!(
            crawl.termination,
            Termination::Aborted(AbortReason::WaitTimedOut(PageReference::Index(1)))
        );
    }
}
