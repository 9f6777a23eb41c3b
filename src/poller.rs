//! Polls a deferred extraction job until it completes, fails, or the
//! caller's wall-clock budget runs out.
//!
//! A status check that errors (network, non-2xx, unreadable body) does not
//! end polling: the job may still be running server-side, so the error is
//! logged and the next tick tries again. The budget is a single deadline
//! across all checks; each check's own timeout is capped to what remains.

use crate::error::AcquireError;
use crate::transport::Transport;
use crate::types::{ExtractJob, JobStatus, JobStatusResponse};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub struct JobPoller<'a> {
    transport: &'a Transport,
    interval: Duration,
    request_timeout: Duration,
}

impl<'a> JobPoller<'a> {
    pub fn new(transport: &'a Transport, interval: Duration, request_timeout: Duration) -> Self {
        Self { transport, interval, request_timeout }
    }

    pub async fn wait(&self, job_id: &str, budget: Duration) -> Result<Value, AcquireError> {
        let started = Instant::now();
        let deadline = started + budget;
        let mut job = ExtractJob { id: job_id.to_string(), status: JobStatus::Pending };
        let mut checks = 0u32;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(job_id = %job.id, checks, "Extraction job still pending at deadline");
                return Err(AcquireError::PollingTimeout {
                    job_id: job.id,
                    waited: started.elapsed(),
                });
            }

            checks += 1;
            match self.check(&job.id, remaining.min(self.request_timeout)).await {
                Ok(status) => {
                    job.status = status.status;
                    match job.status {
                        JobStatus::Completed => {
                            info!(job_id = %job.id, checks, "Extraction job completed");
                            return Ok(status.data.unwrap_or(Value::Null));
                        }
                        JobStatus::Failed => {
                            return Err(AcquireError::JobFailed {
                                job_id: job.id,
                                message: status
                                    .error
                                    .unwrap_or_else(|| "job reported failure".to_string()),
                            });
                        }
                        JobStatus::Pending => debug!(job_id = %job.id, checks, "Extraction job pending"),
                    }
                }
                Err(e) => warn!(job_id = %job.id, checks, "Status check failed, will poll again: {}", e),
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(self.interval.min(remaining)).await;
        }
    }

    async fn check(&self, job_id: &str, timeout: Duration) -> Result<JobStatusResponse, AcquireError> {
        self.transport
            .get(&format!("extract/{}", job_id), timeout)
            .await?
            .error_for_status()?
            .json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport_for(server: &MockServer) -> Transport {
        let config = ClientConfig::new("fc-test").with_base_url(server.uri());
        Transport::new(reqwest::Client::new(), &config)
    }

    #[tokio::test]
    async fn test_completes_after_pending() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/extract/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
            .up_to_n_times(3)
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/extract/job-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "completed", "data": {"foo": "bar"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let poller = JobPoller::new(&transport, Duration::from_millis(50), Duration::from_secs(5));
        let started = std::time::Instant::now();
        let data = tokio_test::assert_ok!(poller.wait("job-1", Duration::from_millis(750)).await);
        assert_eq!(data, json!({"foo": "bar"}));
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_failed_job_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": "failed", "error": "boom"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let poller = JobPoller::new(&transport, Duration::from_millis(20), Duration::from_secs(5));
        let err = poller.wait("job-2", Duration::from_secs(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::JobFailed);
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_budget_bounds_polling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
            .mount(&server)
            .await;

        let interval = Duration::from_millis(50);
        let budget = Duration::from_millis(300);
        let transport = transport_for(&server);
        let poller = JobPoller::new(&transport, interval, Duration::from_secs(5));
        let started = std::time::Instant::now();
        let err = poller.wait("job-3", budget).await.unwrap_err();
        let elapsed = started.elapsed();

        assert_eq!(err.kind(), ErrorKind::PollingTimeout);
        assert!(elapsed >= budget);
        assert!(elapsed < budget + interval + Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_hanging_status_check_cut_at_deadline() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "pending"}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let interval = Duration::from_millis(50);
        let budget = Duration::from_millis(300);
        let transport = transport_for(&server);
        // Per-check timeout far beyond the budget; the deadline must win.
        let poller = JobPoller::new(&transport, interval, Duration::from_secs(60));
        let started = std::time::Instant::now();
        let err = poller.wait("job-5", budget).await.unwrap_err();
        let elapsed = started.elapsed();

        assert_eq!(err.kind(), ErrorKind::PollingTimeout);
        assert!(elapsed >= budget);
        assert!(elapsed < budget + interval + Duration::from_millis(250), "{:?}", elapsed);
    }

    #[tokio::test]
    async fn test_status_errors_do_not_stop_polling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": "completed", "data": [1, 2]})),
            )
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let poller = JobPoller::new(&transport, Duration::from_millis(20), Duration::from_secs(5));
        let data = tokio_test::assert_ok!(poller.wait("job-4", Duration::from_secs(2)).await);
        assert_eq!(data, json!([1, 2]));
        assert_eq!(server.received_requests().await.unwrap().len(), 4);
    }
}
