use std::fmt;

use url::Url;

/// Handle for one page to visit. Created by a pagination driver and handed to
/// the engine once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageReference {
    Url(Url),
    /// 1-based page number within a live browser session
    Index(u32),
}

impl fmt::Display for PageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageReference::Url(url) => write!(f, "{}", url),
            PageReference::Index(n) => write!(f, "session page {}", n),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page {
    pub reference: PageReference,
    pub html: String,
}

/// What a pagination driver produced when asked to advance.
#[derive(Debug)]
pub enum PageStep {
    Page(Page),
    Done(Termination),
}

/// Why a crawl stopped. Every variant still exports what was collected.
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// The source reported no further pages.
    Exhausted,
    /// A page could not be obtained; treated as the end of pagination.
    Aborted(AbortReason),
    /// The configured page ceiling was hit before the source ran out.
    CeilingReached(u32),
}

impl Termination {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Termination::Exhausted)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exhausted => write!(f, "reached the last page"),
            Termination::Aborted(reason) => write!(f, "aborted: {}", reason),
            Termination::CeilingReached(n) => write!(f, "stopped at page ceiling ({})", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AbortReason {
    #[error("could not fetch {reference}: {message}")]
    FetchFailed {
        reference: PageReference,
        message: String,
    },

    #[error("no table found on {0}")]
    TableMissing(PageReference),

    #[error("table did not appear on {0} within the wait")]
    WaitTimedOut(PageReference),

    #[error("could not activate the next control: {0}")]
    ControlFailed(String),
}
