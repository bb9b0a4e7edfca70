//! The ambient session credential.
//!
//! The server keeps the long-lived session in an HTTP-only cookie set by the
//! login and refresh endpoints. The client never reads it; it only carries
//! it back on `/auth/refresh` and `/auth/logout`. This type owns that cookie
//! jar so a shell can persist and restore it across restarts.

use std::fmt;
use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};

use lectern_core::ApiBaseUrl;

/// Cookie jar holding the server's long-lived session cookie.
#[derive(Clone, Default)]
pub struct AmbientSession {
    jar: Arc<Jar>,
}

impl AmbientSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the jar from a `Cookie` header value previously returned by
    /// [`cookie_header`](Self::cookie_header).
    pub fn restore(&self, base: &ApiBaseUrl, header: &str) {
        for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.jar.add_cookie_str(pair, base.as_url());
        }
    }

    /// The `Cookie` header the jar would send to the API, if any.
    pub fn cookie_header(&self, base: &ApiBaseUrl) -> Option<String> {
        self.jar
            .cookies(base.as_url())
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    pub(crate) fn jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }
}

impl fmt::Debug for AmbientSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmbientSession")
            .field("jar", &"[REDACTED]")
            .finish()
    }
}
