//! HTTP front for the five acquisition operations.
//!
//! Every handler answers 200 with the operation's tagged result; callers
//! branch on `success`. Only unparseable request JSON is rejected.

use crate::batch::DEFAULT_CONCURRENCY;
use crate::types::*;
use crate::AcquisitionClient;
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub type SharedClient = Arc<AcquisitionClient>;

pub fn router(client: SharedClient) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/scrape", post(scrape_handler))
        .route("/map", post(map_handler))
        .route("/extract", post(extract_handler))
        .route("/search", post(search_handler))
        .route("/batch/scrape", post(batch_scrape_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(client)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOptionsInput {
    pub formats: Option<Vec<Format>>,
    pub only_main_content: Option<bool>,
    pub remove_base64_images: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
}

impl ScrapeOptionsInput {
    fn into_options(self) -> ScrapeOptions {
        let defaults = ScrapeOptions::default();
        ScrapeOptions {
            formats: self.formats.filter(|f| !f.is_empty()).unwrap_or(defaults.formats),
            only_main_content: self.only_main_content.unwrap_or(defaults.only_main_content),
            remove_base64_images: self.remove_base64_images.unwrap_or(defaults.remove_base64_images),
            timeout: self.timeout_ms.map(Duration::from_millis).unwrap_or(defaults.timeout),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            ..defaults
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
    #[serde(flatten)]
    pub options: ScrapeOptionsInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRequest {
    pub url: String,
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub include_subdomains: Option<bool>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractHttpRequest {
    pub urls: Vec<String>,
    pub prompt: String,
    #[serde(default)]
    pub schema: Value,
    pub enable_web_search: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub poll_budget_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    pub limit: Option<usize>,
    pub formats: Option<Vec<Format>>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct BatchScrapeRequest {
    pub urls: Vec<String>,
    pub concurrency: Option<usize>,
    #[serde(flatten)]
    pub options: ScrapeOptionsInput,
}

async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "acquire",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn scrape_handler(
    State(client): State<SharedClient>,
    Json(request): Json<ScrapeRequest>,
) -> Json<ScrapeResult> {
    let options = request.options.into_options();
    Json(client.scrape(&request.url, &options).await)
}

async fn map_handler(State(client): State<SharedClient>, Json(request): Json<MapRequest>) -> Json<MapResult> {
    let defaults = MapOptions::default();
    let options = MapOptions {
        search: request.search.filter(|s| !s.trim().is_empty()).unwrap_or(defaults.search),
        limit: request.limit.unwrap_or(defaults.limit),
        include_subdomains: request.include_subdomains.unwrap_or(defaults.include_subdomains),
        timeout: request.timeout_ms.map(Duration::from_millis).unwrap_or(defaults.timeout),
    };
    Json(client.map(&request.url, &options).await)
}

async fn extract_handler(
    State(client): State<SharedClient>,
    Json(request): Json<ExtractHttpRequest>,
) -> Json<ExtractResult<Value>> {
    let mut extract = ExtractRequest::new(request.urls, request.prompt, request.schema);
    if let Some(enabled) = request.enable_web_search {
        extract.enable_web_search = enabled;
    }
    if let Some(ms) = request.timeout_ms {
        extract.timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = request.poll_budget_ms {
        extract.poll_budget = Duration::from_millis(ms);
    }
    Json(client.extract::<Value>(&extract).await)
}

async fn search_handler(
    State(client): State<SharedClient>,
    Json(request): Json<SearchRequest>,
) -> Json<SearchResult> {
    let defaults = SearchOptions::default();
    let options = SearchOptions {
        limit: request.limit.unwrap_or(defaults.limit),
        formats: request.formats.filter(|f| !f.is_empty()).unwrap_or(defaults.formats),
        timeout: request.timeout_ms.map(Duration::from_millis).unwrap_or(defaults.timeout),
    };
    Json(client.search(&request.query, &options).await)
}

async fn batch_scrape_handler(
    State(client): State<SharedClient>,
    Json(request): Json<BatchScrapeRequest>,
) -> Json<BatchResult> {
    info!("Batch scrape request for {} URLs", request.urls.len());
    let concurrency = request.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
    let options = request.options.into_options();
    Json(client.batch_scrape(&request.urls, &options, concurrency).await)
}
