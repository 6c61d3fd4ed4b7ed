use super::BlogClient;
use crate::error::Error;
use crate::models::Stats;
use crate::request::ApiRequest;
use crate::storage::CredentialStorage;
use crate::transport::Transport;

impl<T: Transport, S: CredentialStorage> BlogClient<T, S> {
    /// Site-wide dashboard figures. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with 403 for non-admins.
    pub async fn stats(&self) -> Result<Stats, Error> {
        self.fetch(ApiRequest::get("stats/"), "stats").await
    }
}
