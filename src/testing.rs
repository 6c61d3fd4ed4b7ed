//! In-crate test doubles.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use http::StatusCode;
use parking_lot::Mutex;
use serde_json::json;

use crate::client::BlogClient;
use crate::credential::CredentialPair;
use crate::error::Error;
use crate::gateway::Gateway;
use crate::request::{ApiRequest, ApiResponse};
use crate::session::SessionStore;
use crate::storage::{CredentialStorage, MemoryStorage};
use crate::token::mint;
use crate::transport::Transport;

enum Scripted {
    Respond(ApiResponse),
    Fail,
}

/// Replays queued responses in order and records every request it sees.
/// An exhausted script behaves like an unreachable server.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    seen: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn respond(self, status: StatusCode, body: serde_json::Value) -> Self {
        self.script
            .lock()
            .push_back(Scripted::Respond(ApiResponse::json_body(status, &body)));
        self
    }

    pub(crate) fn fail(self) -> Self {
        self.script.lock().push_back(Scripted::Fail);
        self
    }

    pub(crate) fn seen(&self) -> Vec<ApiRequest> {
        self.seen.lock().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
        self.seen.lock().push(request);
        match self.script.lock().pop_front() {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail) | None => Err(Error::Transport("connection refused".into())),
        }
    }
}

/// In-memory storage whose operations can be made to fail on demand.
#[derive(Default)]
pub(crate) struct FlakyStorage {
    inner: MemoryStorage,
    failing: AtomicBool,
}

impl FlakyStorage {
    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), Error> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(io::Error::other("disk unavailable").into());
        }
        Ok(())
    }
}

impl CredentialStorage for FlakyStorage {
    fn read(&self, key: &str) -> Result<Option<String>, Error> {
        self.check()?;
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Error> {
        self.check()?;
        self.inner.write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        self.check()?;
        self.inner.remove(key)
    }
}

/// Client over a fresh in-memory session.
pub(crate) fn client(transport: ScriptedTransport) -> BlogClient<ScriptedTransport, MemoryStorage> {
    BlogClient::new(Gateway::new(
        transport,
        Arc::new(SessionStore::new(MemoryStorage::new())),
    ))
}

/// Client logged in as `alice` (user 1), optionally with admin rights.
pub(crate) fn logged_in(
    transport: ScriptedTransport,
    is_admin: bool,
) -> BlogClient<ScriptedTransport, MemoryStorage> {
    let client = client(transport);
    let access = mint(&json!({"id": 1, "username": "alice", "is_admin": is_admin}));
    client
        .store()
        .establish(CredentialPair::new(access, "r1"))
        .expect("test session");
    client
}

impl<S: CredentialStorage> BlogClient<ScriptedTransport, S> {
    pub(crate) fn transport_seen(&self) -> Vec<ApiRequest> {
        self.gateway().transport().seen()
    }
}
