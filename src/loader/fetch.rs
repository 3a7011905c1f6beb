//! Byte sources for the buffer loader.

use std::future::Future;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::descriptor::LoaderConfig;
use crate::error::LoadError;

/// Retrieves the raw bytes behind a URL.
pub trait Fetch: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, LoadError>> + Send;
}

/// HTTP(S) GET via `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &LoaderConfig) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LoadError::Network {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(HttpFetcher { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let network = |e: reqwest::Error| LoadError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(network)?;
        Ok(bytes.to_vec())
    }
}

/// Local files, as plain paths or `file://` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl Fetch for FileFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        tokio::fs::read(path).await.map_err(|source| LoadError::Io {
            path: path.to_string(),
            source,
        })
    }
}

/// Inline `data:` URLs with base64 payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUrlFetcher;

impl DataUrlFetcher {
    /// Decode the payload of a `data:[<mediatype>];base64,<data>` URL.
    pub fn decode(url: &str) -> Result<Vec<u8>, LoadError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| LoadError::DataUrl("missing data: scheme".to_string()))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| LoadError::DataUrl("missing ',' separator".to_string()))?;
        if !meta.ends_with(";base64") {
            return Err(LoadError::DataUrl(
                "only base64 payloads are supported".to_string(),
            ));
        }
        STANDARD
            .decode(payload.trim())
            .map_err(|e| LoadError::DataUrl(e.to_string()))
    }
}

impl Fetch for DataUrlFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        DataUrlFetcher::decode(url)
    }
}

/// Routes by scheme: `data:`, `http(s)://`, everything else from disk.
#[derive(Debug, Clone)]
pub struct DefaultFetcher {
    http: HttpFetcher,
}

impl DefaultFetcher {
    pub fn new(config: &LoaderConfig) -> Result<Self, LoadError> {
        Ok(DefaultFetcher {
            http: HttpFetcher::new(config)?,
        })
    }
}

impl Fetch for DefaultFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        if url.starts_with("data:") {
            DataUrlFetcher.fetch(url).await
        } else if url.starts_with("http://") || url.starts_with("https://") {
            self.http.fetch(url).await
        } else {
            FileFetcher.fetch(url).await
        }
    }
}
