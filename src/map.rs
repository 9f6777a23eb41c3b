//! Site-structure discovery. Best-effort: one attempt, and any failure
//! collapses into an empty, unsuccessful result.

use crate::error::AcquireError;
use crate::types::*;
use crate::AcquisitionClient;
use tracing::{debug, instrument, warn};

#[instrument(skip(client, options), fields(limit = options.limit))]
pub async fn map_site(client: &AcquisitionClient, url: &str, options: &MapOptions) -> MapResult {
    match discover(client, url, options).await {
        Ok(links) => {
            debug!("Map of {} found {} links", url, links.len());
            MapResult::ok(links)
        }
        Err(e) => {
            warn!("Map of {} failed, continuing without links: {}", url, e);
            MapResult::failed(&e)
        }
    }
}

async fn discover(
    client: &AcquisitionClient,
    url: &str,
    options: &MapOptions,
) -> Result<Vec<String>, AcquireError> {
    let body = MapRequestBody {
        url,
        search: &options.search,
        sitemap: "include",
        include_subdomains: options.include_subdomains,
        limit: options.limit,
    };
    let response: MapResponseBody = client
        .transport()
        .post_json("map", &body, options.timeout)
        .await?
        .error_for_status()?
        .json()?;

    if !response.success {
        return Err(AcquireError::Remote(
            response.error.unwrap_or_else(|| "Map request unsuccessful".to_string()),
        ));
    }

    Ok(response
        .links
        .into_iter()
        .map(MapLink::into_url)
        .take(options.limit)
        .collect())
}
