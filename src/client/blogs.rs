use super::BlogClient;
use crate::error::Error;
use crate::models::{Blog, BlogDraft, LikeToggle};
use crate::request::ApiRequest;
use crate::storage::CredentialStorage;
use crate::transport::Transport;
use crate::types::{BlogId, CategoryId};
use crate::validation::{require_text, validate_image};

/// Server-side filter for the published blog list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogFilter {
    pub category: Option<CategoryId>,
    /// Matched against title and content.
    pub search: Option<String>,
}

impl BlogFilter {
    fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some(category) = self.category {
            request = request.with_query("category", category.to_string());
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            request = request.with_query("search", search);
        }
        request
    }
}

fn validate_draft(draft: &BlogDraft) -> Result<(), Error> {
    require_text("Title", &draft.title)?;
    require_text("Content", &draft.content)?;
    require_text("Category", &draft.category_name)?;
    draft.image.as_ref().map_or(Ok(()), validate_image)
}

impl<T: Transport, S: CredentialStorage> BlogClient<T, S> {
    /// Published blogs, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] or [`Error::Transport`].
    pub async fn list_blogs(&self, filter: &BlogFilter) -> Result<Vec<Blog>, Error> {
        self.fetch(filter.apply(ApiRequest::get("blogs/")), "blog list")
            .await
    }

    /// Every blog authored by the logged-in user, drafts included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionExpired`] or [`Error::Api`].
    pub async fn my_blogs(&self) -> Result<Vec<Blog>, Error> {
        self.fetch(ApiRequest::get("blogs/my-blogs/"), "my blogs")
            .await
    }

    /// A single blog. Unpublished blogs are visible to their author and admins only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with 404 or 403 when not visible.
    pub async fn blog(&self, id: BlogId) -> Result<Blog, Error> {
        self.fetch(ApiRequest::get(format!("blogs/{id}/")), "blog")
            .await
    }

    /// A published blog looked up by exact title.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with 404 when no published blog has that title.
    pub async fn blog_by_title(&self, title: &str) -> Result<Blog, Error> {
        let path = format!("blogs/title/{}/", urlencoding::encode(title));
        self.fetch(ApiRequest::get(path), "blog by title").await
    }

    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an incomplete draft, or [`Error::Api`].
    pub async fn create_blog(&self, draft: &BlogDraft) -> Result<Blog, Error> {
        validate_draft(draft)?;
        let request = ApiRequest::post("blogs/").with_form(draft.to_form());
        let blog: Blog = self.fetch(request, "blog creation").await?;
        tracing::info!(blog_id = %blog.id, "Blog created");
        Ok(blog)
    }

    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an incomplete draft, or [`Error::Api`]
    /// with 403 unless the caller is the author or an admin.
    pub async fn update_blog(&self, id: BlogId, draft: &BlogDraft) -> Result<Blog, Error> {
        validate_draft(draft)?;
        let request = ApiRequest::put(format!("blogs/{id}/")).with_form(draft.to_form());
        self.fetch(request, "blog update").await
    }

    /// # Errors
    ///
    /// Returns [`Error::Api`] with 403 unless the caller is the author or an admin.
    pub async fn delete_blog(&self, id: BlogId) -> Result<(), Error> {
        self.call(ApiRequest::delete(format!("blogs/{id}/")), "blog deletion")
            .await?;
        tracing::info!(blog_id = %id, "Blog deleted");
        Ok(())
    }

    /// Like or unlike a published blog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with 400 when liking one's own blog.
    pub async fn toggle_like(&self, id: BlogId) -> Result<LikeToggle, Error> {
        self.fetch(ApiRequest::post(format!("blogs/{id}/like-toggle/")), "like")
            .await
    }
}
