//! Shared helpers for the session layer integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::{Value, json};
use wiremock::MockServer;

use lectern_core::{AccessToken, ApiBaseUrl, CredentialStore};
use lectern_http::{CacheInvalidator, SessionConfig, SessionManager, SessionManagerBuilder};
use lectern_store::MemoryCredentialStore;

/// Base URL pointing at a mock server.
pub fn mock_base_url(server: &MockServer) -> ApiBaseUrl {
    ApiBaseUrl::new(format!("http://127.0.0.1:{}", server.address().port())).unwrap()
}

/// Configuration against a mock server with short timeouts.
pub fn config(server: &MockServer) -> SessionConfig {
    SessionConfig::new(mock_base_url(server))
        .with_refresh_timeout(Duration::from_secs(5))
        .with_request_timeout(Duration::from_secs(5))
}

/// Configuration pointing at a local port nothing listens on.
pub fn unreachable_config() -> SessionConfig {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let base = ApiBaseUrl::new(format!("http://127.0.0.1:{}", port)).unwrap();
    SessionConfig::new(base)
        .with_refresh_timeout(Duration::from_secs(5))
        .with_request_timeout(Duration::from_secs(5))
}

/// A memory store, optionally pre-seeded with a credential.
pub fn store(token: Option<&str>) -> Arc<MemoryCredentialStore> {
    Arc::new(match token {
        Some(token) => MemoryCredentialStore::with_token(AccessToken::new(token)),
        None => MemoryCredentialStore::new(),
    })
}

pub fn builder(server: &MockServer, store: &Arc<MemoryCredentialStore>) -> SessionManagerBuilder {
    let store: Arc<dyn CredentialStore> = store.clone();
    SessionManager::builder(config(server), store)
}

pub fn manager(server: &MockServer, store: &Arc<MemoryCredentialStore>) -> SessionManager {
    builder(server, store).build().unwrap()
}

/// Successful envelope around `data`.
pub fn envelope(data: Value) -> Value {
    json!({ "status": "success", "message": "ok", "data": data })
}

/// Failure envelope with a message and no data.
pub fn failure(message: &str) -> Value {
    json!({ "status": "error", "message": message })
}

pub fn token_envelope(token: &str) -> Value {
    envelope(json!({ "token": token }))
}

pub fn profile_envelope(username: &str) -> Value {
    envelope(json!({ "id": 7, "username": username, "roles": ["student"] }))
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub async fn stored(store: &MemoryCredentialStore) -> Option<String> {
    store
        .get()
        .await
        .unwrap()
        .map(|token| token.as_str().to_string())
}

/// Cache hook that counts invalidations.
#[derive(Default)]
pub struct CountingCache(AtomicUsize);

impl CountingCache {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl CacheInvalidator for CountingCache {
    fn invalidate(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}
