use std::{path::PathBuf, time::Duration};

use tracing::warn;

use crate::error::{PersonaError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_IMAGES: usize = 1000;
pub const RESULT_FILE_NAME: &str = "categorized_images.zip";

pub const API_URL_ENV: &str = "PERSONA_API_URL";
pub const POLL_INTERVAL_ENV: &str = "PERSONA_POLL_INTERVAL_MS";
pub const TOKEN_PATH_ENV: &str = "PERSONA_TOKEN_PATH";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub max_images: usize,
    pub token_path: PathBuf,
}

impl ClientConfig {
    pub fn new(api_url: &str) -> Result<Self> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_images: MAX_IMAGES,
            token_path: default_token_path(),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_url = value(API_URL_ENV).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut config = Self::new(&api_url)?;

        if let Some(raw) = value(POLL_INTERVAL_ENV) {
            match raw.parse::<u64>() {
                Ok(millis) if millis > 0 => config.poll_interval = Duration::from_millis(millis),
                _ => warn!(value = %raw, "ignoring invalid {POLL_INTERVAL_ENV}"),
            }
        }

        if let Some(path) = value(TOKEN_PATH_ENV) {
            config.token_path = PathBuf::from(path);
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, api_url: &str) -> Result<Self> {
        self.api_url = parse_api_url(api_url)?;
        Ok(self)
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_token_path(mut self, token_path: impl Into<PathBuf>) -> Self {
        self.token_path = token_path.into();
        self
    }
}

pub fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim().trim_end_matches('/').to_string()
}

fn parse_api_url(api_url: &str) -> Result<String> {
    let normalized = normalize_endpoint(api_url);
    let parsed = url::Url::parse(&normalized)
        .map_err(|err| PersonaError::InvalidConfig(format!("invalid api url {api_url:?}: {err}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PersonaError::InvalidConfig(format!(
            "api url must use http or https: {api_url}"
        )));
    }

    Ok(normalized)
}

fn default_token_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("persona")
        .join("token.json")
}
