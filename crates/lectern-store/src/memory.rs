//! In-memory credential store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use lectern_core::{AccessToken, CredentialStore, Result};

/// Credential store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<AccessToken>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a credential.
    pub fn with_token(token: AccessToken) -> Self {
        Self {
            token: RwLock::new(Some(token)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self) -> Result<Option<AccessToken>> {
        Ok(self.token.read().await.clone())
    }

    async fn set(&self, token: &AccessToken) -> Result<()> {
        *self.token.write().await = Some(token.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.token.write().await.take();
        Ok(())
    }
}
