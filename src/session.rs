//! Client-side session lifecycle.
//!
//! [`SessionStore`] is the single owner of the current [`SessionState`] and
//! of its persisted form. Every transition writes storage and memory under
//! one lock, so other tasks never observe the two out of step.

use parking_lot::Mutex;

use crate::credential::CredentialPair;
use crate::error::Error;
use crate::storage::CredentialStorage;
use crate::token::{SessionIdentity, decode_identity};

/// Storage key the credential record lives under unless overridden.
pub const DEFAULT_STORAGE_KEY: &str = "tokens";

/// An authenticated session: the raw token pair and who it identifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    credentials: CredentialPair,
    identity: SessionIdentity,
}

impl Session {
    #[must_use]
    pub fn credentials(&self) -> &CredentialPair {
        &self.credentials
    }

    #[must_use]
    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(Session),
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.identity().is_some_and(|identity| identity.is_admin)
    }

    #[must_use]
    pub fn identity(&self) -> Option<&SessionIdentity> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(session) => Some(&session.identity),
        }
    }

    #[must_use]
    pub fn credentials(&self) -> Option<&CredentialPair> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(session) => Some(&session.credentials),
        }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.credentials().map(CredentialPair::access_token)
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.credentials().map(CredentialPair::refresh_token)
    }
}

/// Source of truth for "am I logged in, and as whom".
pub struct SessionStore<S> {
    storage: S,
    key: String,
    state: Mutex<SessionState>,
}

impl<S: CredentialStorage> SessionStore<S> {
    /// Create an anonymous store. Call [`load`](Self::load) to pick up a
    /// persisted session.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            key: DEFAULT_STORAGE_KEY.to_owned(),
            state: Mutex::new(SessionState::Anonymous),
        }
    }

    /// Override the storage key (default: [`DEFAULT_STORAGE_KEY`]).
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Restore the persisted session, if any.
    ///
    /// A record that does not parse, or whose access token does not decode,
    /// is removed and the store becomes anonymous. No network call is made.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the storage cannot be read or a bad
    /// record cannot be removed.
    pub fn load(&self) -> Result<SessionState, Error> {
        let mut state = self.state.lock();

        let Some(raw) = self.storage.read(&self.key)? else {
            *state = SessionState::Anonymous;
            return Ok(SessionState::Anonymous);
        };

        let restored = serde_json::from_str::<CredentialPair>(&raw)
            .map_err(Error::from)
            .and_then(|pair| {
                let identity = decode_identity(pair.access_token())?;
                Ok(Session {
                    credentials: pair,
                    identity,
                })
            });

        match restored {
            Ok(session) => {
                tracing::info!(user_id = %session.identity.user_id, "Restored persisted session");
                *state = SessionState::Authenticated(session);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unusable persisted session");
                *state = SessionState::Anonymous;
                self.storage.remove(&self.key)?;
            }
        }
        Ok(state.clone())
    }

    /// Adopt a fresh credential pair from login.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedCredential`] if the access token cannot be
    /// decoded; the store is then anonymous and storage is empty. Returns
    /// [`Error::Storage`] if persisting fails, leaving the state unchanged.
    pub fn establish(&self, pair: CredentialPair) -> Result<SessionIdentity, Error> {
        let identity = self.replace(pair)?;
        tracing::info!(user_id = %identity.user_id, username = %identity.username, "Session established");
        Ok(identity)
    }

    /// Adopt a credential pair returned by the token-refresh endpoint.
    ///
    /// Same decode and persistence path as [`establish`](Self::establish).
    ///
    /// # Errors
    ///
    /// See [`establish`](Self::establish).
    pub fn refresh(&self, pair: CredentialPair) -> Result<SessionIdentity, Error> {
        let identity = self.replace(pair)?;
        tracing::debug!(user_id = %identity.user_id, "Session refreshed");
        Ok(identity)
    }

    /// Forget the session and its persisted record. Idempotent.
    ///
    /// Memory is anonymous afterwards even if the storage removal fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the record cannot be removed.
    pub fn clear(&self) -> Result<(), Error> {
        let mut state = self.state.lock();
        let was_authenticated = state.is_authenticated();
        *state = SessionState::Anonymous;
        self.storage.remove(&self.key)?;
        if was_authenticated {
            tracing::info!("Session cleared");
        }
        Ok(())
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.state.lock().clone()
    }

    fn replace(&self, pair: CredentialPair) -> Result<SessionIdentity, Error> {
        let mut state = self.state.lock();

        let identity = match decode_identity(pair.access_token()) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "Rejecting credential pair");
                *state = SessionState::Anonymous;
                if let Err(remove_err) = self.storage.remove(&self.key) {
                    tracing::warn!(error = %remove_err, "Failed to remove rejected session record");
                }
                return Err(e);
            }
        };

        let record = serde_json::to_string(&pair)?;
        self.storage.write(&self.key, &record)?;
        *state = SessionState::Authenticated(Session {
            credentials: pair,
            identity: identity.clone(),
        });
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::testing::FlakyStorage;
    use crate::token::mint;
    use crate::types::UserId;
    use serde_json::json;

    fn alice_access() -> String {
        mint(&json!({"id": 1, "username": "alice", "is_admin": false}))
    }

    fn admin_access() -> String {
        mint(&json!({"id": 2, "username": "root", "is_admin": true}))
    }

    #[test]
    fn establish_persists_and_authenticates() {
        let store = SessionStore::new(MemoryStorage::new());
        let pair = CredentialPair::new(alice_access(), "r1");

        let identity = store.establish(pair.clone()).unwrap();
        assert_eq!(identity.user_id, UserId(1));

        let state = store.current();
        assert_eq!(state.credentials(), Some(&pair));
        assert_eq!(state.identity(), Some(&identity));
        assert!(!state.is_admin());

        let persisted = store.storage().read(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        let persisted: CredentialPair = serde_json::from_str(&persisted).unwrap();
        assert_eq!(persisted, pair);
    }

    #[test]
    fn establish_malformed_leaves_store_empty() {
        let store = SessionStore::new(MemoryStorage::new());
        store
            .establish(CredentialPair::new(alice_access(), "r1"))
            .unwrap();

        let err = store
            .establish(CredentialPair::new("garbage", "r2"))
            .unwrap_err();

        assert!(matches!(err, Error::MalformedCredential(_)));
        assert_eq!(store.current(), SessionState::Anonymous);
        assert!(store.storage().is_empty());
    }

    #[test]
    fn refresh_overwrites_whole_pair() {
        let store = SessionStore::new(MemoryStorage::new());
        store
            .establish(CredentialPair::new(alice_access(), "r1"))
            .unwrap();

        let rotated = CredentialPair::new(admin_access(), "r2");
        store.refresh(rotated.clone()).unwrap();

        assert_eq!(store.current().credentials(), Some(&rotated));
        assert!(store.current().is_admin());
    }

    #[test]
    fn clear_is_idempotent() {
        let store = SessionStore::new(MemoryStorage::new());
        store.clear().unwrap();
        assert_eq!(store.current(), SessionState::Anonymous);

        store
            .establish(CredentialPair::new(alice_access(), "r1"))
            .unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.current(), SessionState::Anonymous);
        assert!(store.storage().is_empty());
    }

    #[test]
    fn load_restores_persisted_pair() {
        let storage = MemoryStorage::new();
        let pair = CredentialPair::new(alice_access(), "r1");
        storage
            .write(DEFAULT_STORAGE_KEY, &serde_json::to_string(&pair).unwrap())
            .unwrap();

        let store = SessionStore::new(storage);
        assert_eq!(store.current(), SessionState::Anonymous);

        let state = store.load().unwrap();
        assert_eq!(state.credentials(), Some(&pair));
        assert_eq!(store.current(), state);
    }

    #[test]
    fn load_discards_undecodable_token() {
        let storage = MemoryStorage::new();
        storage
            .write(DEFAULT_STORAGE_KEY, r#"{"access":"nope","refresh":"r1"}"#)
            .unwrap();

        let store = SessionStore::new(storage);
        assert_eq!(store.load().unwrap(), SessionState::Anonymous);
        assert!(store.storage().is_empty());
    }

    #[test]
    fn load_discards_corrupt_record() {
        let storage = MemoryStorage::new();
        storage.write(DEFAULT_STORAGE_KEY, "{not json").unwrap();

        let store = SessionStore::new(storage);
        assert_eq!(store.load().unwrap(), SessionState::Anonymous);
        assert!(store.storage().is_empty());
    }

    #[test]
    fn load_without_record_is_anonymous() {
        let store = SessionStore::new(MemoryStorage::new());
        assert_eq!(store.load().unwrap(), SessionState::Anonymous);
    }

    #[test]
    fn failed_write_keeps_previous_session() {
        let store = SessionStore::new(FlakyStorage::default());
        let original = CredentialPair::new(alice_access(), "r1");
        store.establish(original.clone()).unwrap();

        store.storage().set_failing(true);
        let err = store
            .refresh(CredentialPair::new(admin_access(), "r2"))
            .unwrap_err();

        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(store.current().credentials(), Some(&original));

        store.storage().set_failing(false);
        let persisted = store.storage().read(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        assert_eq!(serde_json::from_str::<CredentialPair>(&persisted).unwrap(), original);
    }

    #[test]
    fn failed_clear_still_forgets_session() {
        let store = SessionStore::new(FlakyStorage::default());
        store
            .establish(CredentialPair::new(alice_access(), "r1"))
            .unwrap();

        store.storage().set_failing(true);
        let err = store.clear().unwrap_err();

        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(store.current(), SessionState::Anonymous);
    }

    #[test]
    fn load_propagates_read_failure() {
        let store = SessionStore::new(FlakyStorage::default());
        store.storage().set_failing(true);

        assert!(matches!(store.load(), Err(Error::Storage(_))));
        assert_eq!(store.current(), SessionState::Anonymous);
    }

    #[test]
    fn malformed_pair_wins_over_removal_failure() {
        let store = SessionStore::new(FlakyStorage::default());
        store.storage().set_failing(true);

        let err = store
            .establish(CredentialPair::new("garbage", "r1"))
            .unwrap_err();

        assert!(matches!(err, Error::MalformedCredential(_)));
        assert_eq!(store.current(), SessionState::Anonymous);
    }

    #[test]
    fn custom_key_is_used() {
        let store = SessionStore::new(MemoryStorage::new()).with_key("blog-session");
        store
            .establish(CredentialPair::new(alice_access(), "r1"))
            .unwrap();

        assert!(store.storage().read("blog-session").unwrap().is_some());
        assert!(store.storage().read(DEFAULT_STORAGE_KEY).unwrap().is_none());
    }
}
