use std::env;
use std::time::Duration;

use url::Url;

use crate::repository::BackendError;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where the REST backend lives and how long to wait for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: Url,
    timeout: Duration,
}

impl ApiConfig {
    /// # Errors
    ///
    /// Returns `BackendError::InvalidConfig` if `base_url` is not an http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        Ok(Self {
            base_url: normalize_base(base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Read `WELLNESS_API_URL` and `WELLNESS_API_TIMEOUT_SECS`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidConfig` for a malformed URL or timeout.
    pub fn from_env() -> Result<Self, BackendError> {
        let base = env::var("WELLNESS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let mut config = Self::new(&base)?;
        if let Ok(raw) = env::var("WELLNESS_API_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                BackendError::InvalidConfig(format!("WELLNESS_API_TIMEOUT_SECS={raw}"))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve an API path against the base URL, keeping any base path prefix.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidConfig` if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| BackendError::InvalidConfig(format!("{path}: {e}")))
    }
}

fn normalize_base(raw: &str) -> Result<Url, BackendError> {
    let trimmed = raw.trim();
    // `Url::join` drops the last path segment unless it ends with a slash.
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|e| BackendError::InvalidConfig(format!("{trimmed}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(BackendError::InvalidConfig(format!(
            "unsupported scheme {other}"
        ))),
    }
}
