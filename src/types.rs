use crate::error::{AcquireError, ErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Cache freshness hint sent with every scrape (two days, in ms).
pub const DEFAULT_MAX_AGE_MS: u64 = 172_800_000;

/// Section keywords used when a map call has no explicit search hint.
pub const DEFAULT_MAP_SEARCH: &str = "about story mission team blog press careers values history";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Format {
    Markdown,
    Html,
    RawHtml,
    Screenshot,
}

impl Format {
    pub fn is_text(self) -> bool {
        !matches!(self, Format::Screenshot)
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub formats: Vec<Format>,
    pub only_main_content: bool,
    pub remove_base64_images: bool,
    pub block_ads: bool,
    pub skip_tls_verification: bool,
    pub max_age_ms: u64,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            formats: vec![Format::Markdown],
            only_main_content: true,
            remove_base64_images: true,
            block_ads: true,
            skip_tls_verification: true,
            max_age_ms: DEFAULT_MAX_AGE_MS,
            timeout: Duration::from_secs(30),
            max_retries: 1,
        }
    }
}

impl ScrapeOptions {
    /// First requested text format; markdown when only a screenshot was asked for.
    pub fn primary_format(&self) -> Format {
        self.formats
            .iter()
            .copied()
            .find(|f| f.is_text())
            .unwrap_or(Format::Markdown)
    }

    pub fn wants(&self, format: Format) -> bool {
        self.formats.contains(&format)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub url: String,
    pub success: bool,
    /// Payload of the primary requested format
    pub content: String,
    pub html: Option<String>,
    pub screenshot: Option<String>,
    pub metadata: Map<String, Value>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub timestamp: String,
}

impl ScrapeResult {
    pub fn failed(url: &str, err: &AcquireError) -> Self {
        Self {
            url: url.to_string(),
            success: false,
            content: String::new(),
            html: None,
            screenshot: None,
            metadata: Map::new(),
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.get("title").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.metadata.get("description").and_then(Value::as_str)
    }

    pub fn og_image(&self) -> Option<&str> {
        self.metadata.get("ogImage").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct MapOptions {
    pub search: String,
    pub limit: usize,
    pub include_subdomains: bool,
    pub timeout: Duration,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            search: DEFAULT_MAP_SEARCH.to_string(),
            limit: 50,
            include_subdomains: false,
            timeout: Duration::from_secs(15),
        }
    }
}

/// Best-effort discovery result: `links` is empty whenever `success` is false.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapResult {
    pub success: bool,
    pub links: Vec<String>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

impl MapResult {
    pub fn ok(links: Vec<String>) -> Self {
        Self { success: true, links, error: None, error_kind: None }
    }

    pub fn failed(err: &AcquireError) -> Self {
        Self {
            success: false,
            links: Vec::new(),
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub urls: Vec<String>,
    pub prompt: String,
    pub schema: Value,
    pub enable_web_search: bool,
    pub timeout: Duration,
    /// Wall-clock budget for polling a deferred job, independent of `timeout`
    pub poll_budget: Duration,
}

impl ExtractRequest {
    pub fn new(urls: Vec<String>, prompt: impl Into<String>, schema: Value) -> Self {
        Self {
            urls,
            prompt: prompt.into(),
            schema,
            enable_web_search: true,
            timeout: Duration::from_secs(60),
            poll_budget: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[serde(alias = "processing", alias = "scraping")]
    Pending,
    Completed,
    #[serde(alias = "cancelled")]
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// A server-side extraction job as last observed by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractJob {
    pub id: String,
    pub status: JobStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    /// Set when the result came from a polled job
    pub job_id: Option<String>,
}

impl<T> ExtractResult<T> {
    pub fn ok(data: T, job_id: Option<String>) -> Self {
        Self { success: true, data: Some(data), error: None, error_kind: None, job_id }
    }

    pub fn failed(err: &AcquireError, job_id: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
            job_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    pub formats: Vec<Format>,
    pub timeout: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            formats: vec![Format::Markdown],
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Best-effort search result: `data` is empty whenever `success` is false.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub success: bool,
    pub data: Vec<SearchRecord>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

impl SearchResult {
    pub fn ok(data: Vec<SearchRecord>) -> Self {
        Self { success: true, data, error: None, error_kind: None }
    }

    pub fn failed(err: &AcquireError) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub url: String,
    pub result: ScrapeResult,
}

/// One entry per input URL, in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    pub entries: Vec<BatchEntry>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<&ScrapeResult> {
        self.entries.iter().find(|e| e.url == url).map(|e| &e.result)
    }

    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.result.success).count()
    }
}

// Service wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequestBody<'a> {
    pub url: &'a str,
    pub formats: &'a [Format],
    pub only_main_content: bool,
    pub remove_base64_images: bool,
    pub max_age: u64,
    pub block_ads: bool,
    pub skip_tls_verification: bool,
}

impl<'a> ScrapeRequestBody<'a> {
    pub fn new(url: &'a str, options: &'a ScrapeOptions) -> Self {
        Self {
            url,
            formats: &options.formats,
            only_main_content: options.only_main_content,
            remove_base64_images: options.remove_base64_images,
            max_age: options.max_age_ms,
            block_ads: options.block_ads,
            skip_tls_verification: options.skip_tls_verification,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScrapeResponseBody {
    pub success: bool,
    #[serde(default)]
    pub data: Option<ScrapeData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeData {
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub raw_html: Option<String>,
    #[serde(default)]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRequestBody<'a> {
    pub url: &'a str,
    pub search: &'a str,
    pub sitemap: &'static str,
    pub include_subdomains: bool,
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct MapResponseBody {
    pub success: bool,
    #[serde(default)]
    pub links: Vec<MapLink>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The service has returned links both as bare strings and as objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MapLink {
    Url(String),
    Entry { url: String },
}

impl MapLink {
    pub fn into_url(self) -> String {
        match self {
            MapLink::Url(url) | MapLink::Entry { url } => url,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequestBody<'a> {
    pub urls: &'a [String],
    pub prompt: &'a str,
    pub schema: &'a Value,
    pub enable_web_search: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExtractSubmitResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(rename = "jobId", default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequestBody<'a> {
    pub query: &'a str,
    pub limit: usize,
    pub scrape_options: SearchScrapeOptions<'a>,
}

#[derive(Debug, Serialize)]
pub struct SearchScrapeOptions<'a> {
    pub formats: &'a [Format],
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scrape_body_wire_names() {
        let options = ScrapeOptions {
            formats: vec![Format::Markdown, Format::RawHtml],
            ..ScrapeOptions::default()
        };
        let body = serde_json::to_value(ScrapeRequestBody::new("https://example.com", &options)).unwrap();
        assert_eq!(
            body,
            json!({
                "url": "https://example.com",
                "formats": ["markdown", "rawHtml"],
                "onlyMainContent": true,
                "removeBase64Images": true,
                "maxAge": DEFAULT_MAX_AGE_MS,
                "blockAds": true,
                "skipTlsVerification": true
            })
        );
    }

    #[test]
    fn test_primary_format_skips_screenshot() {
        let options = ScrapeOptions {
            formats: vec![Format::Screenshot, Format::Html],
            ..ScrapeOptions::default()
        };
        assert_eq!(options.primary_format(), Format::Html);

        let options = ScrapeOptions {
            formats: vec![Format::Screenshot],
            ..ScrapeOptions::default()
        };
        assert_eq!(options.primary_format(), Format::Markdown);
    }

    #[test]
    fn test_job_status_aliases() {
        let parse = |s: &str| serde_json::from_value::<JobStatus>(json!(s)).unwrap();
        assert_eq!(parse("pending"), JobStatus::Pending);
        assert_eq!(parse("processing"), JobStatus::Pending);
        assert_eq!(parse("completed"), JobStatus::Completed);
        assert_eq!(parse("failed"), JobStatus::Failed);
        assert_eq!(parse("cancelled"), JobStatus::Failed);
        assert!(parse("completed").is_terminal());
        assert!(!parse("pending").is_terminal());
    }

    #[test]
    fn test_map_links_accept_both_shapes() {
        let body: MapResponseBody = serde_json::from_value(json!({
            "success": true,
            "links": ["https://a.com/about", {"url": "https://a.com/team", "title": "Team"}]
        }))
        .unwrap();
        let urls: Vec<_> = body.links.into_iter().map(MapLink::into_url).collect();
        assert_eq!(urls, vec!["https://a.com/about", "https://a.com/team"]);
    }

    #[test]
    fn test_failed_scrape_has_no_content() {
        let result = ScrapeResult::failed("https://x.com", &AcquireError::MissingCredential);
        assert!(!result.success);
        assert!(result.content.is_empty());
        assert!(result.html.is_none() && result.screenshot.is_none());
        assert!(result.metadata.is_empty());
        assert_eq!(result.error_kind, Some(ErrorKind::Configuration));
    }
}
