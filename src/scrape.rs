use crate::error::AcquireError;
use crate::types::*;
use crate::AcquisitionClient;
use serde_json::Value;
use tracing::{info, instrument, warn};
use url::Url;

/// Scrape one page through the service, retrying transient failures.
#[instrument(skip(client, options), fields(formats = ?options.formats))]
pub async fn scrape_url(client: &AcquisitionClient, url: &str, options: &ScrapeOptions) -> ScrapeResult {
    if let Err(e) = validate_url(url) {
        warn!("Rejecting scrape of {}: {}", url, e);
        return ScrapeResult::failed(url, &e);
    }

    let body = ScrapeRequestBody::new(url, options);
    let body = &body;
    let transport = client.transport();
    let timeout = options.timeout;

    let outcome = client
        .retry_policy(options.max_retries)
        .run("scrape", move || async move {
            let response = transport
                .post_json("scrape", body, timeout)
                .await?
                .error_for_status()?;
            response.json::<ScrapeResponseBody>()
        })
        .await
        .and_then(|response| normalize(url, response, options));

    match outcome {
        Ok(result) => {
            info!("Scraped {} ({} chars)", url, result.content.len());
            result
        }
        Err(e) => {
            warn!("Scrape of {} failed: {}", url, e);
            ScrapeResult::failed(url, &e)
        }
    }
}

fn validate_url(url: &str) -> Result<(), AcquireError> {
    let parsed = Url::parse(url)
        .map_err(|e| AcquireError::InvalidInput(format!("Invalid URL '{}': {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AcquireError::InvalidInput(format!(
            "URL must use http or https, got '{}'",
            other
        ))),
    }
}

fn normalize(
    url: &str,
    response: ScrapeResponseBody,
    options: &ScrapeOptions,
) -> Result<ScrapeResult, AcquireError> {
    if !response.success {
        return Err(AcquireError::Remote(
            response.error.unwrap_or_else(|| "Unknown scrape error".to_string()),
        ));
    }
    let data = response
        .data
        .ok_or_else(|| AcquireError::InvalidResponse("No data in scrape response".to_string()))?;

    let content = match options.primary_format() {
        Format::Html => data.html.clone(),
        Format::RawHtml => data.raw_html.clone(),
        _ => data.markdown.clone(),
    }
    .unwrap_or_default();

    let html = if options.wants(Format::Html) {
        data.html
    } else if options.wants(Format::RawHtml) {
        data.raw_html
    } else {
        None
    };

    let screenshot = data.screenshot.filter(|_| options.wants(Format::Screenshot));
    let mut metadata = data.metadata;
    if let Some(shot) = &screenshot {
        metadata.insert("screenshot".to_string(), Value::String(shot.clone()));
    }

    Ok(ScrapeResult {
        url: url.to_string(),
        success: true,
        content,
        html,
        screenshot,
        metadata,
        error: None,
        error_kind: None,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
