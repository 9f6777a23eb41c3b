//! Bounded fan-out of scrapes.
//!
//! URLs are processed in consecutive waves of at most `concurrency` members.
//! A wave's scrapes are awaited together on the caller's task; the next wave
//! starts only once every member of the previous one has resolved.

use crate::scrape::scrape_url;
use crate::types::*;
use crate::AcquisitionClient;
use futures::future::join_all;
use std::future::Future;
use tracing::{info, instrument};
use uuid::Uuid;

pub const DEFAULT_CONCURRENCY: usize = 5;

#[instrument(skip_all, fields(batch_id = %Uuid::new_v4(), urls = urls.len(), concurrency = concurrency))]
pub async fn batch_scrape(
    client: &AcquisitionClient,
    urls: &[String],
    options: &ScrapeOptions,
    concurrency: usize,
) -> BatchResult {
    let results = run_in_waves(urls, concurrency, |url| scrape_url(client, url, options)).await;

    let entries: Vec<BatchEntry> = urls
        .iter()
        .cloned()
        .zip(results)
        .map(|(url, result)| BatchEntry { url, result })
        .collect();
    let batch = BatchResult { entries };

    info!("Batch scrape finished: {}/{} succeeded", batch.succeeded(), batch.len());
    batch
}

/// Apply `task` to every item, `concurrency` at a time, returning outputs
/// in input order. A ceiling of zero is treated as one.
pub async fn run_in_waves<'a, T, F, Fut>(items: &'a [String], concurrency: usize, mut task: F) -> Vec<T>
where
    F: FnMut(&'a str) -> Fut,
    Fut: Future<Output = T>,
{
    let ceiling = concurrency.max(1);
    let mut outputs = Vec::with_capacity(items.len());
    for (wave, chunk) in items.chunks(ceiling).enumerate() {
        info!(wave = wave + 1, size = chunk.len(), "Starting scrape wave");
        let wave_outputs = join_all(chunk.iter().map(|item| task(item.as_str()))).await;
        outputs.extend(wave_outputs);
    }
    outputs
}
