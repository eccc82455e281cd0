//! HTTP resource fetcher: declared-size probe plus capped streaming
//! download. The controller decides what the two results mean.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use url::Url;

use crate::{FetchOutcome, FetchedResource, ResourceFetcher};

pub struct HttpResourceFetcher {
    http: reqwest::Client,
}

impl HttpResourceFetcher {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for HttpResourceFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceFetcher for HttpResourceFetcher {
    async fn declared_size(&self, url: &Url) -> Result<Option<u64>> {
        let response = self
            .http
            .head(url.clone())
            .send()
            .await
            .context("HEAD probe failed")?;

        // Servers refusing HEAD (405 and friends) must not block validation;
        // they simply report no size.
        if !response.status().is_success() {
            return Ok(None);
        }

        let declared = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        Ok(declared)
    }

    async fn fetch_limited(&self, url: &Url, limit: u64) -> Result<FetchOutcome> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .context("GET request failed")?
            .error_for_status()
            .context("resource returned an error status")?;

        // A declared length over the cap saves reading the body at all.
        if let Some(declared) = response.content_length() {
            if declared > limit {
                return Ok(FetchOutcome::TooLarge { limit });
            }
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut bytes: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("failed reading resource body")?;
            if bytes.len() as u64 + chunk.len() as u64 > limit {
                return Ok(FetchOutcome::TooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(FetchOutcome::Complete(FetchedResource {
            bytes,
            content_type,
        }))
    }
}
