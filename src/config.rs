use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev/v1";
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_USER_AGENT: &str = "acquire/0.1";

/// Connection settings for the extraction service.
///
/// Read once and injected into [`crate::AcquisitionClient`]; a missing
/// `api_key` is a valid state that makes every operation fail fast.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub retry_base_delay: Duration,
    pub poll_interval: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: normalize_key(Some(api_key.into())),
            ..Self::default()
        }
    }

    /// Load from `FIRECRAWL_API_KEY` / `FIRECRAWL_API_URL` plus the optional
    /// `ACQUIRE_RETRY_BASE_DELAY_MS` and `ACQUIRE_POLL_INTERVAL_MS` overrides.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: normalize_key(env::var("FIRECRAWL_API_KEY").ok()),
            base_url: env::var("FIRECRAWL_API_URL").unwrap_or(defaults.base_url),
            retry_base_delay: env_millis("ACQUIRE_RETRY_BASE_DELAY_MS")
                .unwrap_or(defaults.retry_base_delay),
            poll_interval: env_millis("ACQUIRE_POLL_INTERVAL_MS").unwrap_or(defaults.poll_interval),
            user_agent: defaults.user_agent,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

fn normalize_key(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

fn env_millis(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}
