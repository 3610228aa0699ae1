//! Remote documentation fetch.
//!
//! Exactly one host is reachable: `docs.x.ai`, over HTTPS. The path is
//! validated by [`crate::doc_path::validate`] before any URL exists, and the
//! built URL is checked again for host and scheme. Redirects are never
//! followed. The response body is bounded both by the declared
//! `Content-Length` and by counting bytes as they stream in.

use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, CONTENT_LENGTH};
use reqwest::redirect::Policy;
use reqwest::{StatusCode, Url};
use std::future::Future;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::doc_path;
use crate::error::FetchError;
use crate::logging::sanitize_for_log;
use crate::markdown::Pipeline;

pub const DOCS_BASE_URL: &str = "https://docs.x.ai/docs";
pub const ALLOWED_HOST: &str = "docs.x.ai";
const USER_AGENT: &str = "MCP-Grok-Docs/1.0";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Validate `path` and build its documentation URL.
pub fn build_url(path: &str) -> Result<Url, FetchError> {
    let safe_path = doc_path::validate(path)?;
    url_for(&safe_path)
}

fn url_for(safe_path: &str) -> Result<Url, FetchError> {
    let url = Url::parse(&format!("{}/{}", DOCS_BASE_URL, safe_path))
        .map_err(|_| FetchError::DisallowedUrl)?;
    check_url(&url)?;
    Ok(url)
}

/// Reject any URL that is not `https://docs.x.ai/...`.
pub fn check_url(url: &Url) -> Result<(), FetchError> {
    if url.host_str() != Some(ALLOWED_HOST) {
        return Err(FetchError::DisallowedUrl);
    }
    if url.scheme() != "https" {
        return Err(FetchError::InsecureScheme);
    }
    Ok(())
}

/// Fail early when the server declares a body larger than `max_bytes`.
pub fn check_declared_length(declared: Option<u64>, max_bytes: usize) -> Result<(), FetchError> {
    match declared {
        Some(len) if len > max_bytes as u64 => Err(FetchError::TooLarge),
        _ => Ok(()),
    }
}

/// Whether a response with `status` may be read.
///
/// Redirects are refused with the generic failure so the target is never
/// revealed; other non-2xx codes surface as `HTTP <code>`.
pub fn check_status(status: StatusCode) -> Result<(), FetchError> {
    if status.is_redirection() {
        Err(FetchError::Failed)
    } else if !status.is_success() {
        Err(FetchError::Status(status.as_u16()))
    } else {
        Ok(())
    }
}

/// Run `request` to completion or fail with [`FetchError::Timeout`].
pub async fn with_deadline<T, F>(limit: Duration, request: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    tokio::time::timeout(limit, request)
        .await
        .map_err(|_| FetchError::Timeout)?
}

/// Collect a byte stream, failing as soon as it exceeds `max_bytes`.
///
/// Returning early drops the stream, which cancels the underlying read.
pub async fn read_limited<S, B, E>(stream: S, max_bytes: usize) -> Result<Vec<u8>, FetchError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<FetchError>,
{
    let mut stream = std::pin::pin!(stream);
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::<FetchError>::into)?;
        let chunk = chunk.as_ref();
        if body.len() + chunk.len() > max_bytes {
            return Err(FetchError::TooLarge);
        }
        body.extend_from_slice(chunk);
    }
    Ok(body)
}

/// A converted documentation page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The validated, normalized path.
    pub path: String,
    pub url: Url,
    pub markdown: String,
}

/// HTTP client plus conversion pipeline for `get_doc_page`.
pub struct DocFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
    pipeline: Pipeline,
}

impl DocFetcher {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .redirect(Policy::none())
            .https_only(true)
            .build()?;

        Ok(Self {
            client,
            timeout,
            max_bytes: config.max_response_bytes,
            pipeline: Pipeline::standard(),
        })
    }

    /// Fetch `path` from the documentation site and convert it to Markdown.
    pub async fn fetch_page(&self, path: &str) -> Result<FetchedPage, FetchError> {
        let path = doc_path::validate(path)?;
        let url = url_for(&path)?;

        let html = with_deadline(self.timeout, self.fetch_html(url.clone())).await?;

        Ok(FetchedPage {
            path,
            url,
            markdown: self.pipeline.run(&html),
        })
    }

    async fn fetch_html(&self, url: Url) -> Result<String, FetchError> {
        tracing::debug!(url = %url, "fetching documentation page");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, ACCEPT_HTML)
            .send()
            .await?;

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            tracing::warn!(
                status = status.as_u16(),
                location = %sanitize_for_log(location),
                "refusing to follow redirect"
            );
        }
        check_status(status)?;

        let declared = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        check_declared_length(declared, self.max_bytes)?;

        let body = read_limited(response.bytes_stream(), self.max_bytes).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
