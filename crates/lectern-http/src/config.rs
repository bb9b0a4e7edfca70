//! Session layer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use lectern_core::ApiBaseUrl;
use lectern_core::error::ApiError;

const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Configuration for a [`SessionManager`](crate::SessionManager).
///
/// Deserializable so shells can load it from a config file; timeouts are
/// given in whole seconds there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// API base URL.
    pub base_url: ApiBaseUrl,

    /// Upper bound on a credential refresh. Every caller waiting on a
    /// refresh that exceeds it fails and the session is torn down.
    #[serde(default = "default_refresh_timeout", with = "duration_secs")]
    pub refresh_timeout: Duration,

    /// Per-request timeout for ordinary API calls.
    #[serde(default = "default_request_timeout", with = "duration_secs")]
    pub request_timeout: Duration,

    /// HTTP status the API uses to signal an expired credential.
    #[serde(default = "default_auth_expired_status")]
    pub auth_expired_status: u16,

    /// Route of the login entry point, used by [`RouteRedirect`](crate::RouteRedirect).
    #[serde(default = "default_login_route")]
    pub login_route: String,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl SessionConfig {
    /// Configuration with defaults for everything but the base URL.
    pub fn new(base_url: ApiBaseUrl) -> Self {
        Self {
            base_url,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            auth_expired_status: ApiError::DEFAULT_AUTH_EXPIRED_STATUS,
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            user_agent: default_user_agent(),
        }
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_auth_expired_status(mut self, status: u16) -> Self {
        self.auth_expired_status = status;
        self
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

fn default_refresh_timeout() -> Duration {
    DEFAULT_REFRESH_TIMEOUT
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_auth_expired_status() -> u16 {
    ApiError::DEFAULT_AUTH_EXPIRED_STATUS
}

fn default_login_route() -> String {
    DEFAULT_LOGIN_ROUTE.to_string()
}

fn default_user_agent() -> String {
    concat!("lectern/", env!("CARGO_PKG_VERSION")).to_string()
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
