use std::time::Duration;

use url::Url;

use crate::error::FetchError;

/// Source of page bodies and file contents, addressed by absolute URL.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// `reqwest` client with a per-request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("worksheet_scraper/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl Fetch for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        Ok(bytes.to_vec())
    }
}

/// Resolve a site path (root-relative, relative or absolute) against `base`.
pub fn resolve(base: &str, path: &str) -> Result<String, FetchError> {
    let invalid = |source| FetchError::InvalidUrl {
        url: path.to_string(),
        source,
    };
    let base = Url::parse(base).map_err(invalid)?;
    Ok(base.join(path).map_err(invalid)?.to_string())
}
