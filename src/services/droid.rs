use std::time::Duration;

use thirtyfour::prelude::*;
use url::Url;

use crate::{
    configuration::WebDriverSettings,
    error::{Result, ScrapeError},
};

/// A live, stateful browser tab. Pages are reached by clicking, so the
/// session can only move forward one page at a time.
#[allow(async_fn_in_trait)]
pub trait RenderingSession {
    type Control;

    async fn navigate(&self, url: &Url) -> Result<()>;

    /// `true` once `selector` matches, `false` if `timeout` elapses first.
    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> bool;

    async fn find_next_control(&self, selector: &str, timeout: Duration) -> Option<Self::Control>;

    async fn is_disabled(&self, control: &Self::Control) -> bool;

    async fn activate(&self, control: &Self::Control) -> Result<()>;

    async fn page_source(&self) -> Result<String>;

    async fn close(self) -> Result<()>;
}

/// `disabled` in the class list or `aria-disabled="true"`.
pub fn marks_disabled(class: Option<&str>, aria_disabled: Option<&str>) -> bool {
    let by_class = class
        .map(|c| c.split_whitespace().any(|name| name == "disabled"))
        .unwrap_or(false);
    let by_aria = aria_disabled
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    by_class || by_aria
}

/// Chrome session driven over WebDriver.
pub struct Droid {
    pub driver: WebDriver,
    poll_interval: Duration,
}

impl Droid {
    pub async fn new(settings: &WebDriverSettings) -> Result<Self> {
        let mut caps = DesiredCapabilities::chrome();
        if settings.headless {
            caps.set_headless()
                .map_err(|e| ScrapeError::SessionUnavailable(e.to_string()))?;
        }

        let driver = WebDriver::new(settings.server_url.as_str(), caps)
            .await
            .map_err(|e| {
                ScrapeError::SessionUnavailable(format!("{}: {}", settings.server_url, e))
            })?;

        if !settings.headless {
            if let Err(e) = driver.maximize_window().await {
                log::error!("Could not set up browser window, closing session: {:?}", e);
                if let Err(e) = driver.quit().await {
                    log::error!("Failed to quit half-started session: {:?}", e);
                }
                return Err(ScrapeError::SessionUnavailable(e.to_string()));
            }
        }

        log::info!("Started browser session at {}", settings.server_url);

        Ok(Droid {
            driver,
            poll_interval: settings.poll_interval(),
        })
    }

    async fn first_within(&self, selector: &str, timeout: Duration) -> WebDriverResult<WebElement> {
        self.driver
            .query(By::Css(selector))
            .wait(timeout, self.poll_interval)
            .first()
            .await
    }
}

impl RenderingSession for Droid {
    type Control = WebElement;

    async fn navigate(&self, url: &Url) -> Result<()> {
        self.driver.goto(url.as_str()).await?;
        Ok(())
    }

    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> bool {
        match self.first_within(selector, timeout).await {
            Ok(_) => true,
            Err(e) => {
                log::debug!("'{}' not present after {:?}: {:?}", selector, timeout, e);
                false
            }
        }
    }

    async fn find_next_control(&self, selector: &str, timeout: Duration) -> Option<WebElement> {
        self.first_within(selector, timeout).await.ok()
    }

    async fn is_disabled(&self, control: &WebElement) -> bool {
        let class = control.class_name().await;
        let aria = control.attr("aria-disabled").await;

        match (class, aria) {
            (Ok(class), Ok(aria)) => marks_disabled(class.as_deref(), aria.as_deref()),
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("Could not read next control state, assuming disabled: {:?}", e);
                true
            }
        }
    }

    async fn activate(&self, control: &WebElement) -> Result<()> {
        control.click().await?;
        Ok(())
    }

    async fn page_source(&self) -> Result<String> {
        Ok(self.driver.source().await?)
    }

    async fn close(self) -> Result<()> {
        self.driver.quit().await?;
        log::info!("Closed browser session");
        Ok(())
    }
}
