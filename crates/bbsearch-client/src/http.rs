//! reqwest-backed Bitbucket client with basic auth and retries.

use async_trait::async_trait;
use bbsearch_core::{Error, Page, PageSource, QueryParams, RemoteResponse, Result};
use reqwest::{header, Client, Method, RequestBuilder, Response, Url};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::api::BitbucketApi;
use crate::retry::RetryPolicy;

const USER_AGENT: &str = concat!("bbsearch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API root, e.g. `https://api.bitbucket.org/2.0/`
    pub base_url: String,
    pub username: Option<String>,
    pub app_password: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            app_password: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, app_password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.app_password = Some(app_password.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpBitbucketClient {
    http: Client,
    base: Url,
    credentials: Option<(String, String)>,
    retry: RetryPolicy,
}

impl HttpBitbucketClient {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let mut base_url = options.base_url;
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base = Url::parse(&base_url)
            .map_err(|e| Error::InvalidArgument(format!("Invalid base URL {}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidArgument(format!("Invalid base URL: {}", base_url)));
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(options.timeout)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let credentials = match (options.username, options.app_password) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        };

        Ok(Self {
            http,
            base,
            credentials,
            retry: options.retry,
        })
    }

    /// Resolve `resource` below the base URL, percent-encoding each segment.
    fn url(&self, resource: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidArgument(format!("Cannot extend base URL {}", self.base)))?
            .pop_if_empty()
            .extend(resource.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.credentials {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        }
    }

    /// Send with retries. Non-idempotent requests are only resent when the
    /// connection could not be established.
    async fn send(&self, idempotent: bool, build: impl Fn() -> RequestBuilder) -> Result<Response> {
        let mut attempt = 1;
        loop {
            let retries_left = attempt < self.retry.max_attempts;
            match build().send().await {
                Ok(response)
                    if retries_left
                        && idempotent
                        && self.retry.should_retry_status(response.status()) =>
                {
                    let delay = retry_after(&response)
                        .map(|d| d.min(self.retry.max_delay))
                        .unwrap_or_else(|| self.retry.delay_for_attempt(attempt));
                    warn!(status = %response.status(), attempt, ?delay, "Retrying request");
                    tokio::time::sleep(delay).await;
                }
                Ok(response) => {
                    debug!(status = %response.status(), "Response received");
                    return Ok(response);
                }
                Err(e) if retries_left && self.retry.should_retry_error(&e, idempotent) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(error = %e, attempt, ?delay, "Retrying request");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(Error::Transport(e.to_string())),
            }
            attempt += 1;
        }
    }

    async fn into_remote(response: Response) -> Result<RemoteResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read response: {}", e)))?;
        Ok(RemoteResponse::new(status, body))
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl PageSource for HttpBitbucketClient {
    #[instrument(skip(self, query))]
    async fn fetch_page(
        &self,
        resource: &str,
        query: &QueryParams,
        page: Option<u32>,
    ) -> Result<Page> {
        let url = self.url(resource)?;
        let mut pairs = query.pairs().to_vec();
        if let Some(page) = page {
            pairs.push(("page".to_string(), page.to_string()));
        }

        let response = self
            .send(true, || self.request(Method::GET, url.clone()).query(&pairs))
            .await?;
        let remote = Self::into_remote(response).await?;
        if !remote.is_success() {
            return Err(Error::Remote {
                status: remote.status,
                body: remote.body,
            });
        }

        let body: serde_json::Value = serde_json::from_str(&remote.body)
            .map_err(|e| Error::InvalidResponse(format!("Paged response is not JSON: {}", e)))?;
        Page::from_envelope(body)
            .map_err(|e| Error::InvalidResponse(format!("Unexpected paged response: {}", e)))
    }
}

#[async_trait]
impl BitbucketApi for HttpBitbucketClient {
    #[instrument(skip(self))]
    async fn get_text(&self, resource: &str) -> Result<RemoteResponse> {
        let url = self.url(resource)?;
        let response = self.send(true, || self.request(Method::GET, url.clone())).await?;
        Self::into_remote(response).await
    }

    #[instrument(skip(self, body))]
    async fn post_json(&self, resource: &str, body: &serde_json::Value) -> Result<RemoteResponse> {
        let url = self.url(resource)?;
        let response = self
            .send(false, || self.request(Method::POST, url.clone()).json(body))
            .await?;
        Self::into_remote(response).await
    }
}
