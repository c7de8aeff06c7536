use std::env;
use std::time::Duration;

use crate::error::{AidgeError, Result};

/// Environment variable naming the API domain.
pub const DOMAIN_ENV: &str = "AIDGE_API_DOMAIN";

/// Environment variable toggling the trial quota header.
pub const TRIAL_ENV: &str = "AIDGE_USE_TRIAL";

/// Site on which the API was purchased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// `api.aidc-ai.com`
    Global,
    /// `cn-api.aidc-ai.com`
    China,
}

impl Region {
    /// Returns the API domain for this region.
    pub fn domain(self) -> &'static str {
        match self {
            Region::Global => "api.aidc-ai.com",
            Region::China => "cn-api.aidc-ai.com",
        }
    }
}

/// Configuration for the Aidge client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme and host the `/rest/...` paths are appended to.
    pub endpoint: String,

    /// Sends `x-iop-trial: true` so calls draw on the free trial quota.
    pub use_trial_resource: bool,

    /// Whole-request timeout. `None` keeps the transport default.
    pub timeout: Option<Duration>,

    /// TCP connect timeout. `None` keeps the transport default.
    pub connect_timeout: Option<Duration>,

    /// Fixed URL parameters of the signing scheme.
    pub(crate) partner_id: &'static str,
    pub(crate) sign_method: &'static str,
    pub(crate) sign_ver: &'static str,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: format!("https://{}", Region::Global.domain()),
            use_trial_resource: false,
            timeout: None,
            connect_timeout: None,
            partner_id: "aidge",
            sign_method: "sha256",
            sign_ver: "v2",
        }
    }
}

impl ClientConfig {
    /// Builds a configuration from `AIDGE_API_DOMAIN` and `AIDGE_USE_TRIAL`.
    ///
    /// Unset variables keep their defaults. A domain carrying a scheme or path
    /// and an unparseable trial flag are errors.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(domain) = env::var(DOMAIN_ENV)
            && !domain.trim().is_empty()
        {
            let domain = domain.trim();
            if domain.contains('/') {
                return Err(AidgeError::Config(format!(
                    "{} must be a bare host name such as api.aidc-ai.com, got '{}'",
                    DOMAIN_ENV, domain
                )));
            }
            config = config.with_domain(domain);
        }
        if let Ok(flag) = env::var(TRIAL_ENV) {
            config.use_trial_resource = parse_flag(&flag).ok_or_else(|| {
                AidgeError::Config(format!("{} must be true/false/1/0, got '{}'", TRIAL_ENV, flag))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Targets `https://{domain}`. `domain` is a bare host, without scheme or path.
    pub fn with_domain(mut self, domain: impl AsRef<str>) -> Self {
        self.endpoint = format!("https://{}", domain.as_ref());
        self
    }

    /// Targets the domain of the given region.
    pub fn with_region(self, region: Region) -> Self {
        self.with_domain(region.domain())
    }

    /// Sets a full endpoint URL, e.g. a plain-HTTP mock server.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    /// Enables or disables the trial quota header.
    pub fn with_trial_resource(mut self, enabled: bool) -> Self {
        self.use_trial_resource = enabled;
        self
    }

    /// Sets the HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the TCP connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let host = self
            .endpoint
            .strip_prefix("https://")
            .or_else(|| self.endpoint.strip_prefix("http://"))
            .ok_or_else(|| {
                AidgeError::Config(format!(
                    "endpoint '{}' must start with https:// or http://",
                    self.endpoint
                ))
            })?;
        // A path or a second scheme would move every request to another host.
        if host.is_empty() || host.contains('/') || host.contains(char::is_whitespace) {
            return Err(AidgeError::Config(format!(
                "endpoint '{}' has no valid host",
                self.endpoint
            )));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
