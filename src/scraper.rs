use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder, Response};
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::error::{AppError, Result};

/// Character budget for any text handed to the language model.
pub const MAX_INPUT_CHARS: usize = 6000;

/// Bytes of page body read before the rest is discarded.
pub const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

// Compile the paragraph selector once
static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("Failed to parse paragraph selector"));

/// Readable text pulled from a fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub url: String,
    pub text: String,
}

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Document>;
}

/// Fetches pages over HTTP with a single GET and no retries.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5).min(timeout))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Document> {
        let url = validate_url(url)?;

        debug!("Fetching {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            info!("Fetch of {} returned status {}", url, status.as_u16());
            return Err(AppError::HttpStatus(status.as_u16()));
        }

        let html = read_capped(response, MAX_PAGE_BYTES).await?;
        let text = normalize_text(&extract_paragraphs(&html), MAX_INPUT_CHARS);
        debug!("Extracted {} chars from {}", text.chars().count(), url);

        Ok(Document {
            url: url.to_string(),
            text,
        })
    }
}

/// Reads at most `limit` bytes of the body; markup cut mid-tag is still parsed.
async fn read_capped(mut response: Response, limit: usize) -> Result<String> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            debug!("Page body capped at {} bytes", limit);
            break;
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Accepts only absolute http(s) URLs with a host.
pub fn validate_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| AppError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            trimmed,
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(AppError::InvalidUrl(format!("{}: missing host", trimmed))),
    }
}

/// Text of every `<p>` element in document order, one paragraph per line.
pub fn extract_paragraphs(html: &str) -> String {
    let document = Html::parse_document(html);

    document
        .select(&PARAGRAPH_SELECTOR)
        .map(|p| p.text().collect::<String>())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncates to `max_chars`, trims, then turns every line break (LF, CRLF
/// or lone CR) into a single space.
pub fn normalize_text(text: &str, max_chars: usize) -> String {
    let truncated: String = text.chars().take(max_chars).collect();

    truncated
        .trim()
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
}
