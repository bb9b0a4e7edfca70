//! lectern-core - Session types and traits for the lectern client.
//!
//! This crate holds the data model shared by the credential stores, the
//! HTTP session layer, and the CLI. It performs no I/O of its own.

pub mod credential;
pub mod envelope;
pub mod error;
pub mod profile;
pub mod state;
pub mod store;
pub mod types;

pub use credential::{AccessToken, LoginCredentials};
pub use envelope::{Envelope, TokenData};
pub use error::{AuthError, Error, RefreshFailure};
pub use profile::UserProfile;
pub use state::{SessionEvent, SessionState};
pub use store::CredentialStore;
pub use types::ApiBaseUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
