//! Credential store trait.

use async_trait::async_trait;

use crate::{AccessToken, Result};

/// Key under which the access credential is persisted.
pub const CREDENTIAL_KEY: &str = "access_token";

/// Durable storage for the single live access credential.
///
/// Implementations are plain key/value cells: `set` fully replaces any
/// previous credential and `clear` removes it. Callers serialize access
/// through the session layer, so no coordination is expected here.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the current credential, if any.
    async fn get(&self) -> Result<Option<AccessToken>>;

    /// Replace the current credential.
    async fn set(&self, token: &AccessToken) -> Result<()>;

    /// Remove the current credential. Clearing an empty store is not an error.
    async fn clear(&self) -> Result<()>;
}
