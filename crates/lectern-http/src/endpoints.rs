//! Authentication endpoint paths and request bodies.

use serde::Serialize;

/// Exchanges login credentials for an access credential.
pub const LOGIN: &str = "/auth/login";

/// Issues a new access credential using the ambient session cookie.
pub const REFRESH: &str = "/auth/refresh";

/// Invalidates the ambient session server-side.
pub const LOGOUT: &str = "/auth/logout";

/// Profile of the current user.
pub const CURRENT_USER: &str = "/users/me";

/// True for the endpoints that must never trigger refresh-and-retry.
///
/// A 401 from any of these is final; retrying through a refresh would
/// recurse into the refresh endpoint itself.
pub fn is_auth_endpoint(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let path = path.trim_end_matches('/');
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    matches!(path.as_str(), LOGIN | REFRESH | LOGOUT)
}

/// Request body for the login endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub identifier: &'a str,
    pub password: &'a str,
}
