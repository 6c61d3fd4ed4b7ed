//! Resource shapes exchanged with the blogging API.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::request::Form;
use crate::types::{BlogId, CategoryId, CommentId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Comment {
    pub id: CommentId,
    pub blog: BlogId,
    pub author: User,
    #[serde(rename = "comment")]
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Blog {
    pub id: BlogId,
    pub title: String,
    pub content: String,
    pub author: User,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub publish_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Blog {
    /// Whether `user` may edit or delete this blog (its author or an admin).
    #[must_use]
    pub fn is_editable_by(&self, user_id: UserId, is_admin: bool) -> bool {
        is_admin || self.author.id == user_id
    }

    /// Comments that have not been soft-deleted.
    pub fn visible_comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter().filter(|c| c.deleted_at.is_none())
    }
}

/// Result of toggling a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct LikeToggle {
    pub liked: bool,
    pub total_likes: u64,
}

// ── Admin statistics ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct Stats {
    pub total_blogs: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    #[serde(default)]
    pub total_categories: u64,
    #[serde(default)]
    pub categories: Vec<CategorySummary>,
    #[serde(default)]
    pub blogs: Vec<BlogSummary>,
    #[serde(default)]
    pub users: Vec<UserSummary>,
    #[serde(default)]
    pub daily_blogs: Vec<DailyCount>,
    #[serde(default)]
    pub monthly_blogs: Vec<MonthlyCount>,
    #[serde(default)]
    pub daily_users: Vec<DailyCount>,
    #[serde(default)]
    pub monthly_users: Vec<MonthlyCount>,
}

impl Stats {
    /// Registered users without admin rights, as listed on the dashboard.
    pub fn members(&self) -> impl Iterator<Item = &UserSummary> {
        self.users.iter().filter(|u| !u.is_admin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct BlogSummary {
    pub id: BlogId,
    pub title: String,
    pub author_id: UserId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct DailyCount {
    pub date: Date,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct MonthlyCount {
    #[serde(with = "time::serde::rfc3339")]
    pub month: OffsetDateTime,
    pub count: u64,
}

// ── Write-side inputs ─────────────────────────────────────────────

/// An image file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// MIME type implied by the file extension.
    #[must_use]
    pub fn mime(&self) -> &'static str {
        let lower = self.file_name.to_ascii_lowercase();
        if lower.ends_with(".png") {
            "image/png"
        } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
            "image/jpeg"
        } else {
            "application/octet-stream"
        }
    }

    pub(crate) fn attach(&self, form: Form, field: &str) -> Form {
        form.file(field, self.file_name.clone(), self.mime(), self.bytes.clone())
    }
}

/// Sign-up form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    pub profile_picture: Option<ImageUpload>,
}

impl Registration {
    /// Multipart body; empty fields are left out.
    #[must_use]
    pub fn to_form(&self) -> Form {
        let form = Form::new()
            .text_if_present("username", &self.username)
            .text_if_present("email", &self.email)
            .text_if_present("password", &self.password)
            .text_if_present("password2", &self.password2);
        match &self.profile_picture {
            Some(picture) => picture.attach(form, "profile_picture"),
            None => form,
        }
    }
}

/// Create/edit form for a blog post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogDraft {
    pub title: String,
    pub content: String,
    /// Name of an existing category. Only admins create categories.
    pub category_name: String,
    pub is_published: bool,
    pub image: Option<ImageUpload>,
}

impl BlogDraft {
    #[must_use]
    pub fn to_form(&self) -> Form {
        let form = Form::new()
            .text("title", self.title.clone())
            .text("content", self.content.clone())
            .text("category_name", self.category_name.clone())
            .text("is_published", if self.is_published { "true" } else { "false" });
        match &self.image {
            Some(image) => image.attach(form, "image"),
            None => form,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CategoryInput {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}
