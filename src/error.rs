use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebDriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    /// The browser session could not be started. Fatal for interactive crawls.
    #[error("Browser session unavailable: {0}")]
    SessionUnavailable(String),

    #[error("Invalid CSS selector '{0}'")]
    InvalidSelector(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed export: {0}")]
    MalformedExport(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
