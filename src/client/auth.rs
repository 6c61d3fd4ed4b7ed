use serde::{Deserialize, Serialize};

use super::BlogClient;
use crate::credential::CredentialPair;
use crate::error::Error;
use crate::gateway::Attempt;
use crate::models::{ImageUpload, Registration, User};
use crate::request::{ApiRequest, Form};
use crate::storage::CredentialStorage;
use crate::token::SessionIdentity;
use crate::transport::Transport;
use crate::validation::{require_text, validate_image, validate_new_password, validate_registration};

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct LogoutRequest<'a> {
    refresh: &'a str,
}

#[derive(Serialize)]
struct ResetRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ResetConfirm<'a> {
    new_password: &'a str,
}

/// Human-readable acknowledgement (`detail` or `message`).
#[derive(Deserialize)]
struct Notice {
    #[serde(alias = "message")]
    detail: String,
}

#[derive(Deserialize)]
struct ProfilePicture {
    profile_picture: String,
}

impl<T: Transport, S: CredentialStorage> BlogClient<T, S> {
    /// Exchange username and password for a credential pair and start a session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for rejected credentials, or
    /// [`Error::MalformedCredential`] if the issued access token cannot be
    /// decoded (the session stays anonymous).
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionIdentity, Error> {
        require_text("Username", username)?;
        require_text("Password", password)?;

        let request = ApiRequest::post("auth/login/").with_json(&LoginRequest { username, password })?;
        let pair: CredentialPair = self
            .gateway
            .send_public(request)
            .await?
            .ensure_success("login")?
            .json()?;

        let identity = self.store().establish(pair)?;
        tracing::info!(user_id = %identity.user_id, username = %identity.username, "Logged in");
        Ok(identity)
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] before sending if the form is incomplete,
    /// or [`Error::Api`] if the server rejects it.
    pub async fn register(&self, registration: &Registration) -> Result<String, Error> {
        validate_registration(registration)?;

        let request = ApiRequest::post("auth/register/").with_form(registration.to_form());
        let notice: Notice = self
            .gateway
            .send_public(request)
            .await?
            .ensure_success("registration")?
            .json()?;
        Ok(notice.detail)
    }

    /// End the session.
    ///
    /// The server is asked to revoke the refresh token, but the local session
    /// is cleared whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] only if the persisted session cannot be removed.
    pub async fn logout(&self) -> Result<(), Error> {
        if let Err(e) = self.revoke_refresh_token().await {
            tracing::debug!(error = %e, "Server-side logout failed, clearing locally");
        }
        self.store().clear()?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Ask the server to blacklist the current refresh token.
    ///
    /// The request body names the token, so if the gateway refreshed and the
    /// server rotated the token mid-call, the request is sent again naming the
    /// new one.
    async fn revoke_refresh_token(&self) -> Result<(), Error> {
        let mut attempt = Attempt::First;
        loop {
            let Some(refresh) = self.session().refresh_token().map(str::to_owned) else {
                return Ok(());
            };
            let request =
                ApiRequest::post("auth/logout/").with_json(&LogoutRequest { refresh: &refresh })?;
            let response = self.gateway.send_with(request, attempt).await?;

            let rotated = self.session().refresh_token() != Some(refresh.as_str());
            if rotated && attempt == Attempt::First {
                attempt = Attempt::Retried;
                continue;
            }
            response.ensure_success("logout")?;
            return Ok(());
        }
    }

    /// Profile of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionExpired`] or [`Error::Api`].
    pub async fn me(&self) -> Result<User, Error> {
        self.fetch(ApiRequest::get("auth/me/"), "profile").await
    }

    /// Replace the profile picture; returns the new picture URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for unsupported or oversized images.
    pub async fn update_profile_picture(&self, picture: &ImageUpload) -> Result<String, Error> {
        validate_image(picture)?;

        let form = picture.attach(Form::new(), "profile_picture");
        let request = ApiRequest::put("auth/me/update-profile-picture/").with_form(form);
        let updated: ProfilePicture = self.fetch(request, "profile picture update").await?;
        Ok(updated.profile_picture)
    }

    /// Ask for a reset link by email. The server answers the same way
    /// whether or not the address is registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank address, or [`Error::Api`].
    pub async fn request_password_reset(&self, email: &str) -> Result<String, Error> {
        require_text("Email", email)?;

        let request = ApiRequest::post("auth/reset-password/").with_json(&ResetRequest { email })?;
        let notice: Notice = self
            .gateway
            .send_public(request)
            .await?
            .ensure_success("password reset request")?
            .json()?;
        Ok(notice.detail)
    }

    /// Set a new password using the `uid`/`token` pair from a reset link.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the passwords are blank or differ, or
    /// [`Error::Api`] for an invalid or expired link.
    pub async fn confirm_password_reset(
        &self,
        uid: &str,
        token: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<String, Error> {
        validate_new_password(new_password, confirmation)?;

        let path = format!(
            "auth/reset-password-confirm/{}/{}/",
            urlencoding::encode(uid),
            urlencoding::encode(token)
        );
        let request = ApiRequest::post(path).with_json(&ResetConfirm { new_password })?;
        let notice: Notice = self
            .gateway
            .send_public(request)
            .await?
            .ensure_success("password reset")?
            .json()?;
        Ok(notice.detail)
    }
}
