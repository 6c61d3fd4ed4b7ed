use super::BlogClient;
use crate::error::Error;
use crate::models::{Category, CategoryInput};
use crate::request::ApiRequest;
use crate::storage::CredentialStorage;
use crate::transport::Transport;
use crate::types::CategoryId;
use crate::validation::require_text;

impl<T: Transport, S: CredentialStorage> BlogClient<T, S> {
    /// All categories. Public.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] or [`Error::Transport`].
    pub async fn categories(&self) -> Result<Vec<Category>, Error> {
        self.fetch(ApiRequest::get("categories/"), "category list")
            .await
    }

    /// Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank name, or [`Error::Api`] with 403
    /// for non-admins.
    pub async fn create_category(&self, input: &CategoryInput) -> Result<Category, Error> {
        require_text("Category name", &input.name)?;
        let request = ApiRequest::post("categories/").with_json(input)?;
        self.fetch(request, "category creation").await
    }

    /// Admin only.
    ///
    /// # Errors
    ///
    /// As [`create_category`](Self::create_category), plus 404 for an unknown id.
    pub async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, Error> {
        require_text("Category name", &input.name)?;
        let request = ApiRequest::put(format!("categories/{id}/")).with_json(input)?;
        self.fetch(request, "category update").await
    }

    /// Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with 403 for non-admins or 404 for an unknown id.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), Error> {
        self.call(ApiRequest::delete(format!("categories/{id}/")), "category deletion")
            .await
            .map(drop)
    }
}
