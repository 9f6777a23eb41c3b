//! Single-request HTTP primitive for the extraction service.
//!
//! One call, one hard timeout, no retries. Anything that produced a
//! response comes back as `Ok(RawResponse)` whatever the status; only
//! failures without a response are errors.

use crate::config::ClientConfig;
use crate::error::AcquireError;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into the matching error class.
    pub fn error_for_status(self) -> Result<Self, AcquireError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AcquireError::from_status(self.status, &self.body))
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AcquireError> {
        serde_json::from_str(&self.body).map_err(|e| {
            AcquireError::InvalidResponse(format!("Failed to parse service response: {}", e))
        })
    }
}

#[derive(Debug, Clone)]
pub struct Transport {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl Transport {
    pub fn new(http: Client, config: &ClientConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn credential(&self) -> Result<&str, AcquireError> {
        self.api_key.as_deref().ok_or(AcquireError::MissingCredential)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn post_json<B>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<RawResponse, AcquireError>
    where
        B: Serialize + ?Sized,
    {
        let api_key = self.credential()?;
        let request = self.http.post(self.endpoint(path)).bearer_auth(api_key).json(body);
        self.execute(request, timeout).await
    }

    pub async fn get(&self, path: &str, timeout: Duration) -> Result<RawResponse, AcquireError> {
        let api_key = self.credential()?;
        let request = self.http.get(self.endpoint(path)).bearer_auth(api_key);
        self.execute(request, timeout).await
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<RawResponse, AcquireError> {
        let exchange = async {
            let response = request
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(RawResponse { status, body })
        };

        // Dropping the exchange future on expiry aborts the in-flight request.
        match tokio::time::timeout(timeout, exchange).await {
            Err(_) => Err(AcquireError::Timeout(timeout)),
            Ok(Err(e)) => Err(AcquireError::from_transport(e, timeout)),
            Ok(Ok(response)) => {
                debug!("service answered {} ({} bytes)", response.status, response.body.len());
                Ok(response)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport_for(server: &MockServer, key: Option<&str>) -> Transport {
        let mut config = ClientConfig::default().with_base_url(server.uri());
        config.api_key = key.map(String::from);
        Transport::new(Client::new(), &config)
    }

    #[tokio::test]
    async fn test_sends_bearer_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scrape"))
            .and(header("authorization", "Bearer fc-test"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server, Some("fc-test"));
        let response = transport
            .post_json("/scrape", &json!({"url": "https://example.com"}), Duration::from_secs(5))
            .await;
        let response = tokio_test::assert_ok!(response);
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_any_status_is_a_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let transport = transport_for(&server, Some("k"));
        let response = tokio_test::assert_ok!(transport.get("extract/abc", Duration::from_secs(5)).await);
        assert_eq!(response.status, 404);
        assert_eq!(response.body, "missing");
        let err = response.error_for_status().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Client);
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let transport = transport_for(&server, None);
        let err = transport
            .post_json("scrape", &json!({}), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AcquireError::MissingCredential));
    }

    #[tokio::test]
    async fn test_timeout_cancels_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let transport = transport_for(&server, Some("k"));
        let started = std::time::Instant::now();
        let err = transport.get("slow", Duration::from_millis(100)).await.unwrap_err();
        assert!(matches!(err, AcquireError::Timeout(_)));
        assert!(err.is_retryable());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_connection_failure_is_transient() {
        // Nothing listens on port 9 on loopback.
        let config = ClientConfig::new("k").with_base_url("http://127.0.0.1:9");
        let transport = Transport::new(Client::new(), &config);
        let err = transport.get("scrape", Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransientNetwork);
    }
}
