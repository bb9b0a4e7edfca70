//! lectern-http - Session lifecycle and authenticated HTTP access.
//!
//! [`SessionManager`] is the entry point: it logs in and out, resumes a
//! session on startup, and hands out an [`ApiClient`] that every other
//! subsystem uses for its network calls. The client attaches the current
//! credential to each request and, when the server reports the credential
//! expired, refreshes it once through the [`RefreshCoordinator`] and
//! re-issues the request. Concurrent expiries share a single refresh.

mod ambient;
mod client;
mod config;
mod coordinator;
pub mod endpoints;
mod hooks;
mod interceptor;
mod lifecycle;
mod request;
mod session;
mod state;

pub use ambient::AmbientSession;
pub use client::HttpClient;
pub use config::SessionConfig;
pub use coordinator::RefreshCoordinator;
pub use hooks::{CacheInvalidator, LoginRedirect, RouteRedirect};
pub use interceptor::ApiClient;
pub use request::ApiRequest;
pub use session::{SessionManager, SessionManagerBuilder};
pub use state::{SessionStateCell, SessionSubscription};
