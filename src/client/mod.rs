//! Typed client for the blogging API.
//!
//! [`BlogClient`] wraps a [`Gateway`], so every resource call carries the
//! current access token and recovers from an expired one transparently.
//! Non-success statuses come back as [`Error::Api`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use blogfront::{BlogClient, ClientConfig, MemoryStorage};
//!
//! let client = BlogClient::connect(&ClientConfig::from_env()?, MemoryStorage::new())?;
//! let me = client.login("alice", "secret1").await?;
//! let mine = client.my_blogs().await?;
//! ```

mod auth;
mod blogs;
mod categories;
mod comments;
mod stats;

use std::sync::Arc;

use serde::de::DeserializeOwned;

pub use blogs::BlogFilter;

use crate::error::Error;
use crate::gateway::Gateway;
use crate::request::{ApiRequest, ApiResponse};
use crate::session::{SessionState, SessionStore};
use crate::storage::CredentialStorage;
use crate::transport::Transport;

pub struct BlogClient<T, S> {
    gateway: Gateway<T, S>,
}

impl<T: Transport, S: CredentialStorage> BlogClient<T, S> {
    #[must_use]
    pub fn new(gateway: Gateway<T, S>) -> Self {
        Self { gateway }
    }

    #[must_use]
    pub fn gateway(&self) -> &Gateway<T, S> {
        &self.gateway
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore<S>> {
        self.gateway.store()
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn session(&self) -> SessionState {
        self.gateway.store().current()
    }

    async fn fetch<R: DeserializeOwned>(
        &self,
        request: ApiRequest,
        operation: &'static str,
    ) -> Result<R, Error> {
        self.call(request, operation).await?.json()
    }

    async fn call(&self, request: ApiRequest, operation: &'static str) -> Result<ApiResponse, Error> {
        self.gateway.send(request).await?.ensure_success(operation)
    }
}

#[cfg(feature = "http")]
mod connect {
    use std::sync::Arc;

    use super::BlogClient;
    use crate::config::ClientConfig;
    use crate::error::Error;
    use crate::gateway::Gateway;
    use crate::session::SessionStore;
    use crate::storage::{CredentialStorage, FileStorage};
    use crate::transport::HttpTransport;

    impl<S: CredentialStorage> BlogClient<HttpTransport, S> {
        /// Build an HTTP client over `storage` and restore any persisted session.
        ///
        /// # Errors
        ///
        /// Returns [`Error::Transport`] if the HTTP client cannot be built, or
        /// [`Error::Storage`] if the persisted session cannot be read.
        pub fn connect(config: &ClientConfig, storage: S) -> Result<Self, Error> {
            let transport = HttpTransport::from_config(config)?;
            let store = SessionStore::new(storage).with_key(config.storage_key());
            let state = store.load()?;
            tracing::debug!(
                base_url = %config.base_url(),
                authenticated = state.is_authenticated(),
                "Blog client ready"
            );
            let gateway = Gateway::new(transport, Arc::new(store))
                .with_refresh_path(config.refresh_path());
            Ok(Self::new(gateway))
        }
    }

    impl BlogClient<HttpTransport, FileStorage> {
        /// [`connect`](Self::connect) with file storage in the configured session directory.
        ///
        /// # Errors
        ///
        /// Returns [`Error::Config`] if no session directory is configured,
        /// otherwise as [`connect`](Self::connect).
        pub fn open(config: &ClientConfig) -> Result<Self, Error> {
            let dir = config
                .session_dir()
                .ok_or_else(|| Error::Config("BLOG_SESSION_DIR is required".into()))?;
            Self::connect(config, FileStorage::open(dir)?)
        }
    }

}
