//! Authorizing request gateway.
//!
//! Every outbound API call goes through [`Gateway::send`], which attaches the
//! current access token and, on a 401, runs at most one refresh-and-resend
//! cycle:
//!
//! 1. send with the current access token (or none)
//! 2. on 401 with [`Attempt::First`]: exchange the refresh token, store the
//!    new pair, resend once with the new access token and return that response
//! 3. if the refresh exchange fails: clear the session, return
//!    [`Error::SessionExpired`]
//! 4. on 401 with [`Attempt::Retried`]: return the response as-is
//!
//! Recovery is per request. Concurrent requests that all hit an expired token
//! each refresh on their own; the last pair written wins.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::credential::CredentialPair;
use crate::error::Error;
use crate::request::{ApiRequest, ApiResponse};
use crate::session::SessionStore;
use crate::storage::CredentialStorage;
use crate::transport::Transport;

/// Whether a request has already been through a recovery cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    First,
    Retried,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

pub struct Gateway<T, S> {
    transport: T,
    store: Arc<SessionStore<S>>,
    refresh_path: String,
}

impl<T: Transport, S: CredentialStorage> Gateway<T, S> {
    #[must_use]
    pub fn new(transport: T, store: Arc<SessionStore<S>>) -> Self {
        Self {
            transport,
            store,
            refresh_path: crate::config::ClientConfig::DEFAULT_REFRESH_PATH.to_owned(),
        }
    }

    /// Override the token refresh endpoint (default `token/refresh/`).
    #[must_use]
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore<S>> {
        &self.store
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send an authorized request, recovering once from an expired access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionExpired`] if the token refresh fails (the
    /// session has been cleared), or [`Error::Transport`] if the request
    /// itself could not be delivered. Every HTTP status, including a 401
    /// that survived the retry, is returned as `Ok`.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
        self.send_with(request, Attempt::First).await
    }

    /// Like [`send`](Self::send), with an explicit attempt marker.
    /// `Attempt::Retried` never triggers a refresh.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn send_with(
        &self,
        request: ApiRequest,
        mut attempt: Attempt,
    ) -> Result<ApiResponse, Error> {
        loop {
            let response = self.transport.execute(self.authorize(&request)).await?;

            if !response.is_authorization_failure() {
                return Ok(response);
            }
            if attempt == Attempt::Retried {
                tracing::debug!(path = %request.path(), "Rejected after recovery, passing 401 through");
                return Ok(response);
            }
            let Some(refresh_token) = self.store.current().refresh_token().map(str::to_owned)
            else {
                // Nothing to refresh; an anonymous 401 is the caller's business.
                return Ok(response);
            };

            attempt = Attempt::Retried;
            tracing::debug!(path = %request.path(), "Access token rejected, refreshing");
            self.recover(&refresh_token).await?;
        }
    }

    /// Send without a bearer token and without recovery.
    ///
    /// For public endpoints (login, registration, password reset) where a
    /// 401 means bad credentials rather than an expired token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the request could not be delivered.
    pub async fn send_public(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
        self.transport.execute(request.without_bearer()).await
    }

    fn authorize(&self, request: &ApiRequest) -> ApiRequest {
        match self.store.current().access_token() {
            Some(token) => request.clone().with_bearer(token),
            None => request.clone().without_bearer(),
        }
    }

    async fn recover(&self, refresh_token: &str) -> Result<(), Error> {
        let refreshed = match self.exchange_refresh_token(refresh_token).await {
            Ok(pair) => self.store.refresh(pair),
            Err(e) => Err(e),
        };

        if let Err(e) = refreshed {
            tracing::warn!(error = %e, "Token refresh failed, ending session");
            if let Err(e) = self.store.clear() {
                tracing::warn!(error = %e, "Failed to clear persisted session");
            }
            return Err(Error::SessionExpired);
        }
        Ok(())
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<CredentialPair, Error> {
        let request = ApiRequest::post(self.refresh_path.as_str()).with_json(&RefreshRequest {
            refresh: refresh_token,
        })?;
        let response = self
            .transport
            .execute(request)
            .await?
            .ensure_success("token refresh")?;
        let body: RefreshResponse = response.json()?;

        // The server may rotate the refresh token; keep the old one otherwise.
        let refresh = body.refresh.unwrap_or_else(|| refresh_token.to_owned());
        Ok(CredentialPair::new(body.access, refresh))
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::request::Body;
    use crate::session::SessionState;
    use crate::storage::MemoryStorage;
    use crate::testing::ScriptedTransport;
    use crate::token::mint;

    fn access(id: u64) -> String {
        mint(&json!({"id": id, "username": "alice", "is_admin": false, "jti": format!("a{id}")}))
    }

    fn gateway(transport: ScriptedTransport) -> Gateway<ScriptedTransport, MemoryStorage> {
        let store = Arc::new(SessionStore::new(MemoryStorage::new()));
        store
            .establish(CredentialPair::new(access(1), "r1"))
            .unwrap();
        Gateway::new(transport, store)
    }

    #[tokio::test]
    async fn attaches_current_access_token() {
        let gw = gateway(ScriptedTransport::default().respond(StatusCode::OK, json!([])));

        let resp = gw.send(ApiRequest::get("blogs/my-blogs/")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let seen = gw.transport().seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].bearer(), Some(access(1).as_str()));
    }

    #[tokio::test]
    async fn anonymous_request_has_no_bearer() {
        let store = Arc::new(SessionStore::new(MemoryStorage::new()));
        let gw = Gateway::new(
            ScriptedTransport::default().respond(StatusCode::OK, json!([])),
            store,
        );

        gw.send(ApiRequest::get("blogs/").with_bearer("stale"))
            .await
            .unwrap();

        assert_eq!(gw.transport().seen()[0].bearer(), None);
    }

    #[tokio::test]
    async fn refreshes_and_resends_once() {
        let gw = gateway(
            ScriptedTransport::default()
                .respond(StatusCode::UNAUTHORIZED, json!({"detail": "expired"}))
                .respond(StatusCode::OK, json!({"access": access(2)}))
                .respond(StatusCode::OK, json!({"id": 5})),
        );

        let resp = gw.send(ApiRequest::get("blogs/5/")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.json::<serde_json::Value>().unwrap(), json!({"id": 5}));

        let seen = gw.transport().seen();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1].path(), "token/refresh/");
        assert_eq!(seen[1].bearer(), None);
        assert_eq!(seen[1].body(), &Body::Json(json!({"refresh": "r1"})));
        assert_eq!(seen[2].path(), "blogs/5/");
        assert_eq!(seen[2].bearer(), Some(access(2).as_str()));

        let state = gw.store().current();
        assert_eq!(state.access_token(), Some(access(2).as_str()));
        assert_eq!(state.refresh_token(), Some("r1"));
    }

    #[tokio::test]
    async fn rotated_refresh_token_is_kept() {
        let gw = gateway(
            ScriptedTransport::default()
                .respond(StatusCode::UNAUTHORIZED, json!({}))
                .respond(StatusCode::OK, json!({"access": access(2), "refresh": "r2"}))
                .respond(StatusCode::NO_CONTENT, json!(null)),
        );

        gw.send(ApiRequest::delete("blogs/5/")).await.unwrap();

        assert_eq!(gw.store().current().refresh_token(), Some("r2"));
    }

    #[tokio::test]
    async fn resent_failure_is_final() {
        let gw = gateway(
            ScriptedTransport::default()
                .respond(StatusCode::UNAUTHORIZED, json!({}))
                .respond(StatusCode::OK, json!({"access": access(2)}))
                .respond(StatusCode::UNAUTHORIZED, json!({"detail": "still no"})),
        );

        let resp = gw.send(ApiRequest::get("stats/")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(gw.transport().seen().len(), 3);
        assert!(gw.store().current().is_authenticated());
    }

    #[tokio::test]
    async fn rejected_refresh_expires_session() {
        let gw = gateway(
            ScriptedTransport::default()
                .respond(StatusCode::UNAUTHORIZED, json!({}))
                .respond(StatusCode::UNAUTHORIZED, json!({"detail": "Token is invalid or expired"})),
        );

        let err = gw.send(ApiRequest::get("auth/me/")).await.unwrap_err();

        assert!(err.is_session_expired());
        assert_eq!(gw.transport().seen().len(), 2);
        assert_eq!(gw.store().current(), SessionState::Anonymous);
        assert!(gw.store().storage().is_empty());
    }

    #[tokio::test]
    async fn unreachable_refresh_expires_session() {
        let gw = gateway(
            ScriptedTransport::default()
                .respond(StatusCode::UNAUTHORIZED, json!({}))
                .fail(),
        );

        let err = gw.send(ApiRequest::get("auth/me/")).await.unwrap_err();

        assert!(err.is_session_expired());
        assert_eq!(gw.store().current(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn malformed_refreshed_token_expires_session() {
        let gw = gateway(
            ScriptedTransport::default()
                .respond(StatusCode::UNAUTHORIZED, json!({}))
                .respond(StatusCode::OK, json!({"access": "not-a-jwt"})),
        );

        let err = gw.send(ApiRequest::get("auth/me/")).await.unwrap_err();

        assert!(err.is_session_expired());
        assert_eq!(gw.transport().seen().len(), 2);
        assert!(gw.store().storage().is_empty());
    }

    #[tokio::test]
    async fn retried_marker_skips_refresh() {
        let gw = gateway(
            ScriptedTransport::default().respond(StatusCode::UNAUTHORIZED, json!({})),
        );

        let resp = gw
            .send_with(ApiRequest::get("stats/"), Attempt::Retried)
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(gw.transport().seen().len(), 1);
        assert!(gw.store().current().is_authenticated());
    }

    #[tokio::test]
    async fn anonymous_401_passes_through() {
        let store = Arc::new(SessionStore::new(MemoryStorage::new()));
        let gw = Gateway::new(
            ScriptedTransport::default().respond(StatusCode::UNAUTHORIZED, json!({})),
            store,
        );

        let resp = gw.send(ApiRequest::post("blogs/")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(gw.transport().seen().len(), 1);
    }

    #[tokio::test]
    async fn other_statuses_pass_through() {
        let gw = gateway(
            ScriptedTransport::default()
                .respond(StatusCode::FORBIDDEN, json!({"detail": "Not authorized"}))
                .respond(StatusCode::NOT_FOUND, json!({"detail": "Blog not found"})),
        );

        let forbidden = gw.send(ApiRequest::delete("blogs/1/")).await.unwrap();
        let missing = gw.send(ApiRequest::get("blogs/99/")).await.unwrap();

        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(gw.transport().seen().len(), 2);
    }

    #[tokio::test]
    async fn transport_failure_is_not_an_auth_failure() {
        let gw = gateway(ScriptedTransport::default().fail());

        let err = gw.send(ApiRequest::get("blogs/")).await.unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        assert!(gw.store().current().is_authenticated());
    }

    #[tokio::test]
    async fn custom_refresh_path() {
        let gw = gateway(
            ScriptedTransport::default()
                .respond(StatusCode::UNAUTHORIZED, json!({}))
                .respond(StatusCode::OK, json!({"access": access(2)}))
                .respond(StatusCode::OK, json!({})),
        )
        .with_refresh_path("auth/token/refresh/");

        gw.send(ApiRequest::get("auth/me/")).await.unwrap();

        assert_eq!(gw.transport().seen()[1].path(), "auth/token/refresh/");
    }

    #[tokio::test]
    async fn public_send_skips_bearer_and_recovery() {
        let gw = gateway(
            ScriptedTransport::default().respond(StatusCode::UNAUTHORIZED, json!({})),
        );

        let resp = gw.send_public(ApiRequest::post("auth/login/")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let seen = gw.transport().seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].bearer(), None);
        assert!(gw.store().current().is_authenticated());
    }
}
