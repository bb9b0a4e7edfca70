//! lectern-store - Credential stores for the lectern client.
//!
//! [`FileCredentialStore`] persists the access credential to a single JSON
//! file so a session survives process restarts. [`MemoryCredentialStore`]
//! keeps it in memory only.

mod file;
mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;
