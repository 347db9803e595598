use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;

use crate::core::constants::USER_AGENT;
use crate::{MapError, Result};

/// Shared HTTP client with a fixed User-Agent so that public tile servers
/// (e.g. OpenStreetMap) don't reject the request. Building the client once
/// avoids the cost of TLS and connection pool setup for every tile.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            log::error!("failed to build tile http client, using defaults: {}", e);
            Client::new()
        })
});

/// Retrieves raw tile bytes from a tile origin
#[async_trait]
pub trait TileFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches tiles over HTTP. Transport timeouts are left to reqwest; there is no retry.
#[derive(Debug, Clone, Default)]
pub struct HttpTileFetcher;

impl HttpTileFetcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TileFetch for HttpTileFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        log::debug!("fetch tile {}", url);
        let resp = HTTP_CLIENT.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(MapError::HttpStatus {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = resp.bytes().await?;
        log::debug!("downloaded {} ({} bytes)", url, bytes.len());
        Ok(bytes.to_vec())
    }
}
