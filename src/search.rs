use crate::error::AcquireError;
use crate::types::*;
use crate::AcquisitionClient;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Web search through the service with scraped result content.
///
/// Best-effort like map: one attempt, failures become an empty result.
#[instrument(skip(client, options), fields(limit = options.limit))]
pub async fn search_web(client: &AcquisitionClient, query: &str, options: &SearchOptions) -> SearchResult {
    info!("Searching for: {}", query);
    match run_search(client, query, options).await {
        Ok(data) => {
            debug!("Search returned {} results", data.len());
            SearchResult::ok(data)
        }
        Err(e) => {
            warn!("Search for '{}' failed: {}", query, e);
            SearchResult::failed(&e)
        }
    }
}

async fn run_search(
    client: &AcquisitionClient,
    query: &str,
    options: &SearchOptions,
) -> Result<Vec<SearchRecord>, AcquireError> {
    let body = SearchRequestBody {
        query,
        limit: options.limit,
        scrape_options: SearchScrapeOptions { formats: &options.formats },
    };
    let response: Value = client
        .transport()
        .post_json("search", &body, options.timeout)
        .await?
        .error_for_status()?
        .json()?;

    if response.get("success").and_then(Value::as_bool) == Some(false) {
        let message = response
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Search request unsuccessful");
        return Err(AcquireError::Remote(message.to_string()));
    }

    let items = match response.get("data") {
        Some(Value::Array(items)) => items,
        _ => {
            return Err(AcquireError::InvalidResponse(
                "Search response data is not a list".to_string(),
            ))
        }
    };

    // A malformed record is skipped; the rest are still usable.
    let mut data: Vec<SearchRecord> = items
        .iter()
        .filter_map(|item| match SearchRecord::deserialize(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping malformed search result: {}", e);
                None
            }
        })
        .collect();
    data.truncate(options.limit);
    Ok(data)
}
