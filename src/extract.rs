use crate::error::AcquireError;
use crate::poller::JobPoller;
use crate::types::*;
use crate::AcquisitionClient;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, instrument, warn};

/// What the submission call told us to do next.
enum Submission {
    Ready(Value),
    Deferred(String),
}

/// Run a structured extraction, polling the job if the service defers it.
#[instrument(skip(client, request), fields(urls = request.urls.len()))]
pub async fn extract<T: DeserializeOwned>(
    client: &AcquisitionClient,
    request: &ExtractRequest,
) -> ExtractResult<T> {
    let submission = match submit(client, request).await {
        Ok(submission) => submission,
        Err(e) => {
            warn!("Extract submission failed: {}", e);
            return ExtractResult::failed(&e, None);
        }
    };

    let (payload, job_id) = match submission {
        Submission::Ready(data) => (Ok(data), None),
        Submission::Deferred(job_id) => {
            info!(job_id = %job_id, "Extraction deferred, polling for up to {:?}", request.poll_budget);
            let poller = JobPoller::new(client.transport(), client.config().poll_interval, request.timeout);
            (poller.wait(&job_id, request.poll_budget).await, Some(job_id))
        }
    };

    match payload.and_then(decode::<T>) {
        Ok(data) => ExtractResult::ok(data, job_id),
        Err(e) => {
            warn!("Extraction produced no data: {}", e);
            ExtractResult::failed(&e, job_id)
        }
    }
}

async fn submit(client: &AcquisitionClient, request: &ExtractRequest) -> Result<Submission, AcquireError> {
    if request.urls.is_empty() {
        return Err(AcquireError::InvalidInput("extract needs at least one URL".to_string()));
    }
    let body = ExtractRequestBody {
        urls: &request.urls,
        prompt: &request.prompt,
        schema: &request.schema,
        enable_web_search: request.enable_web_search,
    };
    let response: ExtractSubmitResponse = client
        .transport()
        .post_json("extract", &body, request.timeout)
        .await?
        .error_for_status()?
        .json()?;

    if response.success == Some(false) {
        return Err(AcquireError::Remote(
            response.error.unwrap_or_else(|| "Extract request unsuccessful".to_string()),
        ));
    }
    match (response.data, response.job_id.or(response.id)) {
        (Some(data), _) if !data.is_null() => Ok(Submission::Ready(data)),
        (_, Some(job_id)) => Ok(Submission::Deferred(job_id)),
        _ => Err(AcquireError::InvalidResponse(
            "Extract response had neither data nor a job id".to_string(),
        )),
    }
}

fn decode<T: DeserializeOwned>(data: Value) -> Result<T, AcquireError> {
    serde_json::from_value(data).map_err(|e| {
        AcquireError::InvalidResponse(format!("Extracted data did not match the requested type: {}", e))
    })
}
