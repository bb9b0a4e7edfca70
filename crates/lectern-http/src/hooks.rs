//! Extension points the UI shell plugs into the session lifecycle.

use std::sync::Mutex;

use tracing::debug;

use crate::config::SessionConfig;

/// Application state that must not outlive the session, such as cached
/// course lists or draft answers. Cleared on logout and on teardown.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self);
}

/// Navigation to the login entry point after the session is torn down.
pub trait LoginRedirect: Send + Sync {
    /// True if the shell is already showing the login entry point.
    fn is_at_login(&self) -> bool;

    /// Navigate to the login entry point.
    fn redirect_to_login(&self);
}

/// A [`LoginRedirect`] for shells that track the current route as a string.
#[derive(Debug)]
pub struct RouteRedirect {
    login_route: String,
    current: Mutex<String>,
}

impl RouteRedirect {
    pub fn new(login_route: impl Into<String>, current: impl Into<String>) -> Self {
        Self {
            login_route: login_route.into(),
            current: Mutex::new(current.into()),
        }
    }

    /// A redirect to the configured login route.
    pub fn from_config(config: &SessionConfig, current: impl Into<String>) -> Self {
        Self::new(config.login_route.clone(), current)
    }

    /// Record a navigation performed by the shell.
    pub fn navigate(&self, route: impl Into<String>) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = route.into();
    }

    /// The current route.
    pub fn current(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl LoginRedirect for RouteRedirect {
    fn is_at_login(&self) -> bool {
        self.current() == self.login_route
    }

    fn redirect_to_login(&self) {
        debug!(route = %self.login_route, "Redirecting to login");
        self.navigate(self.login_route.clone());
    }
}
