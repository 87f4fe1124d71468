//! HTTP fetcher and fetch-parse worker
//!
//! This module handles everything a worker does for one URL:
//! - Building the HTTP client with a proper user agent string
//! - GET requests through the [`PageSource`] seam
//! - Status and Content-Type validation
//! - Streaming the body into the text extractor and word counter
//! - Releasing the body exactly once, reporting only the first error

use crate::config::{ScraperConfig, UserAgentConfig};
use crate::crawler::parser::extract_from_chunks;
use crate::crawler::words::{count_words, WordCounts};
use crate::ScrapeError;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use std::time::Duration;
use tokio::sync::mpsc;

/// Chunks buffered between the body reader and the extractor thread
const EXTRACTOR_QUEUE: usize = 8;

/// An opened response: status line, declared content type and the body
pub struct PageResponse {
    /// HTTP status code
    pub status: u16,

    /// Content-Type header value (empty when absent)
    pub content_type: String,

    /// Streaming body, released through [`PageBody::close`]
    pub body: Box<dyn PageBody>,
}

impl std::fmt::Debug for PageResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// A response body read chunk by chunk
#[async_trait]
pub trait PageBody: Send {
    /// Next chunk of the body, `None` at end of stream
    async fn chunk(&mut self) -> Result<Option<Vec<u8>>, String>;

    /// Releases the body. Called exactly once per opened response.
    fn close(self: Box<Self>) -> Result<(), String>;
}

/// Where pages come from
///
/// The coordinator only ever talks to this trait, so tests can swap the
/// network for an in-memory source.
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    /// Sends a GET request for `url`; errors are transport failures
    async fn open(&self, url: &str) -> Result<PageResponse, String>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use word_harvest::config::{ScraperConfig, UserAgentConfig};
/// use word_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &ScraperConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    scraper: &ScraperConfig,
) -> Result<Client, reqwest::Error> {
    // Format: Name/Version
    let user_agent = format!("{}/{}", user_agent.name, user_agent.version);

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(scraper.request_timeout_secs))
        .connect_timeout(Duration::from_secs(scraper.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageSource`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn open(&self, url: &str) -> Result<PageResponse, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| describe_request_error(&e))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        Ok(PageResponse {
            status: response.status().as_u16(),
            content_type,
            body: Box::new(HttpBody { response }),
        })
    }
}

fn describe_request_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}

struct HttpBody {
    response: Response,
}

#[async_trait]
impl PageBody for HttpBody {
    async fn chunk(&mut self) -> Result<Option<Vec<u8>>, String> {
        self.response
            .chunk()
            .await
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .map_err(|e| e.to_string())
    }

    fn close(self: Box<Self>) -> Result<(), String> {
        // Dropping the response returns the connection to the pool.
        drop(self.response);
        Ok(())
    }
}

/// Fetches `url` and counts the words of its visible text
///
/// # Request Flow
///
/// | Step | Failure |
/// |------|---------|
/// | GET | `ScrapeError::Fetch` |
/// | status != 200 | `ScrapeError::HttpStatus` |
/// | Content-Type not `text*` | `ScrapeError::ContentType` |
/// | body read | `ScrapeError::Tokenize` |
/// | body release | `ScrapeError::BodyClose` |
///
/// The body is released exactly once on every path after the request
/// succeeded. Only the first failure is reported; a release failure after
/// an earlier error is logged and dropped.
pub async fn scrape_url(source: &dyn PageSource, url: &str) -> Result<WordCounts, ScrapeError> {
    let response = source.open(url).await.map_err(|message| ScrapeError::Fetch {
        url: url.to_string(),
        message,
    })?;

    let PageResponse {
        status,
        content_type,
        mut body,
    } = response;

    let scraped = read_page(url, status, &content_type, body.as_mut()).await;

    match (scraped, body.close()) {
        (Ok(words), Ok(())) => Ok(words),
        (Ok(_), Err(message)) => Err(ScrapeError::BodyClose {
            url: url.to_string(),
            message,
        }),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_error)) => {
            tracing::debug!(
                "Ignoring body release failure for {} after earlier error: {}",
                url,
                close_error
            );
            Err(e)
        }
    }
}

/// Validates the response head, then streams and parses the body
async fn read_page(
    url: &str,
    status: u16,
    content_type: &str,
    body: &mut dyn PageBody,
) -> Result<WordCounts, ScrapeError> {
    if status != StatusCode::OK.as_u16() {
        return Err(ScrapeError::HttpStatus {
            url: url.to_string(),
            status,
        });
    }

    if !content_type.starts_with("text") {
        return Err(ScrapeError::ContentType {
            url: url.to_string(),
            content_type: content_type.to_string(),
        });
    }

    // The tokenizer is not Send, so it runs on a blocking thread and is fed
    // through a bounded queue; at most EXTRACTOR_QUEUE chunks are in memory.
    let (chunks, queued) = mpsc::channel(EXTRACTOR_QUEUE);
    let extraction = tokio::task::spawn_blocking(move || extract_from_chunks(queued));

    loop {
        match body.chunk().await {
            Ok(Some(chunk)) => {
                if chunks.send(chunk).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(message) => {
                return Err(ScrapeError::Tokenize {
                    url: url.to_string(),
                    message,
                })
            }
        }
    }
    drop(chunks);

    let fragments = extraction.await.map_err(|e| ScrapeError::Tokenize {
        url: url.to_string(),
        message: format!("Text extractor stopped: {}", e),
    })?;
    Ok(count_words(&fragments))
}
