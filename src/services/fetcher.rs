use url::Url;

use crate::{configuration::HttpSettings, error::Result};

/// Stateless page download: every page is addressable by URL alone.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    async fn fetch(&self, url: &Url) -> Result<String>;
}

impl<F: PageFetcher> PageFetcher for &F {
    async fn fetch(&self, url: &Url) -> Result<String> {
        (**self).fetch(url).await
    }
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout())
            .cookie_store(true)
            .build()?;

        Ok(HttpFetcher { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        log::debug!("GET {}", url);

        let res = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;

        Ok(res.text().await?)
    }
}
