// src/services/fetch.rs

//! Activity-page fetch collaborator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, COOKIE, REFERER};

use crate::error::Result;
use crate::models::CrawlerConfig;

/// Black-box page fetch: raw markup or a transport error.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// HTTP implementation backed by a configured reqwest client.
pub struct HttpFetcher {
    client: Client,
    charset: String,
    cookie: Option<String>,
    referer: String,
}

impl HttpFetcher {
    /// Build a fetcher from crawler settings.
    ///
    /// A missing cookie is allowed; the request is sent unauthenticated and
    /// fails at the transport layer if the site requires a session.
    pub fn new(config: &CrawlerConfig, referer: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            charset: config.charset.clone(),
            cookie: config.cookie.clone(),
            referer: referer.into(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let mut request = self
            .client
            .get(url)
            .header(REFERER, &self.referer)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            );

        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie);
        } else {
            log::debug!("No session cookie configured, fetching unauthenticated");
        }

        let response = request.send().await?.error_for_status()?;
        // The target forum serves legacy-encoded pages without a charset
        // header, so decode with the configured default.
        let text = response.text_with_charset(&self.charset).await?;
        Ok(text)
    }
}
