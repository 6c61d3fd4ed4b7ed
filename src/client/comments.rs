use serde::Serialize;

use super::BlogClient;
use crate::error::Error;
use crate::models::Comment;
use crate::request::ApiRequest;
use crate::storage::CredentialStorage;
use crate::transport::Transport;
use crate::types::{BlogId, CommentId};
use crate::validation::require_text;

#[derive(Serialize)]
struct NewComment<'a> {
    comment: &'a str,
}

impl<T: Transport, S: CredentialStorage> BlogClient<T, S> {
    /// Live comments on a blog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with 404 for an unknown blog.
    pub async fn comments(&self, blog: BlogId) -> Result<Vec<Comment>, Error> {
        self.fetch(ApiRequest::get(format!("blogs/{blog}/comments/")), "comments")
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::Validation`] for blank text, or [`Error::Api`].
    pub async fn add_comment(&self, blog: BlogId, text: &str) -> Result<Comment, Error> {
        require_text("Comment", text)?;
        let request = ApiRequest::post(format!("blogs/{blog}/comments/"))
            .with_json(&NewComment { comment: text })?;
        self.fetch(request, "comment").await
    }

    /// Soft-delete a comment. Allowed for its author and admins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with 403 otherwise.
    pub async fn delete_comment(&self, id: CommentId) -> Result<(), Error> {
        self.call(ApiRequest::delete(format!("comments/{id}/")), "comment deletion")
            .await
            .map(drop)
    }
}
