use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::config::Config;
use crate::error::{LogSearchError, Result};
use crate::model::{Page, SearchRequest};

const LOGS_PATH: &str = "/v1/logs";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote log search. `None` means the service answered with no result object.
#[async_trait]
pub trait LogService: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Option<Page>>;

    /// Fetch the page addressed by `cursor`, a previous page's `nextPage`.
    async fn next_page(&self, request: &SearchRequest, cursor: &str) -> Result<Option<Page>>;
}

/// HTTP client for the `/v1/logs` endpoint, authenticated with a bearer token.
#[derive(Clone)]
pub struct HttpLogService {
    client: Client,
    endpoint: String,
    token: String,
}

impl HttpLogService {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("swo-logs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", config.api_url.trim_end_matches('/'), LOGS_PATH),
            token: config.token.clone(),
        })
    }

    async fn fetch(&self, request: &SearchRequest, skip_token: Option<&str>) -> Result<Option<Page>> {
        let mut builder = self
            .client
            .get(&self.endpoint)
            .bearer_auth(&self.token)
            .query(request);
        if let Some(token) = skip_token {
            builder = builder.query(&[("skipToken", token)]);
        }
        debug!(endpoint = %self.endpoint, ?skip_token, "fetching logs page");

        let resp = builder.send().await?;
        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            let body = match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(status = status.as_u16(), error = %e, "error body unreadable");
                    format!("<unreadable body: {e}>")
                }
            };
            return Err(LogSearchError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        // a literal `null` body deserializes to None
        let page: Option<Page> = serde_json::from_str(&body)?;
        Ok(page)
    }
}

#[async_trait]
impl LogService for HttpLogService {
    async fn search(&self, request: &SearchRequest) -> Result<Option<Page>> {
        self.fetch(request, None).await
    }

    async fn next_page(&self, request: &SearchRequest, cursor: &str) -> Result<Option<Page>> {
        let token = skip_token(cursor)?;
        self.fetch(request, Some(&token)).await
    }
}

/// `nextPage` is either a bare token or a URL/path carrying `skipToken`.
pub fn skip_token(cursor: &str) -> Result<String> {
    if !cursor.contains('?') {
        return Ok(cursor.to_string());
    }
    let base = Url::parse("http://localhost/").map_err(|e| LogSearchError::InvalidRequest(e.to_string()))?;
    let url = base
        .join(cursor)
        .map_err(|e| LogSearchError::InvalidRequest(format!("bad nextPage {cursor:?}: {e}")))?;
    url.query_pairs()
        .find(|(key, _)| key == "skipToken")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| LogSearchError::InvalidRequest(format!("nextPage without skipToken: {cursor}")))
}
