use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::{dal::ExportFormat, domain::MissingValue};

pub const CONFIGURATION_DIR: &str = "configuration";

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub scraper: ScraperSettings,
    pub webdriver: WebDriverSettings,
    pub export: ExportSettings,
    pub http: HttpSettings,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Read the page count from page 1 and request `page=2..N` over plain HTTP.
    #[default]
    Enumerated,
    /// Click through a live browser session until "next" is gone or disabled.
    Interactive,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "enumerated" | "http" => Ok(Strategy::Enumerated),
            "interactive" | "browser" => Ok(Strategy::Interactive),
            other => Err(format!("Unknown strategy: {}", other)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Enumerated => write!(f, "enumerated"),
            Strategy::Interactive => write!(f, "interactive"),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ScraperSettings {
    /// First page of the listing
    pub base_url: String,
    /// Prefix joined onto relative row links
    pub site_url: String,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub missing_value: MissingValue,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_pages: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub page_timeout_secs: u64,
    /// Pause after clicking "next" before the table is read again
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub settle_ms: u64,
    #[serde(default)]
    pub selectors: Selectors,
}

impl ScraperSettings {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Selectors {
    pub table: String,
    pub row: String,
    pub cell: String,
    pub pagination: String,
    pub next: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Selectors {
            table: "table".to_string(),
            row: "tr".to_string(),
            cell: "td".to_string(),
            pagination: "a.paginate_button".to_string(),
            next: "a.paginate_button.next".to_string(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct WebDriverSettings {
    pub server_url: String,
    #[serde(default)]
    pub headless: bool,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub poll_interval_ms: u64,
}

impl WebDriverSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ExportSettings {
    pub path: PathBuf,
    #[serde(default)]
    pub format: ExportFormat,
    /// Values turned into nulls on top of the empty string
    #[serde(default)]
    pub null_values: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct HttpSettings {
    pub user_agent: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_secs: u64,
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    get_configuration_from(Path::new(CONFIGURATION_DIR))
}

/// `base.yaml` is required, `local.yaml` optional, then `APP_*` environment
/// variables (e.g. `APP_SCRAPER__MAX_PAGES=10`) win.
pub fn get_configuration_from(dir: &Path) -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(dir.join("base.yaml")))
        .add_source(config::File::from(dir.join("local.yaml")).required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
