#![doc = include_str!("../README.md")]

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod listing;
pub mod models;
pub mod request;
pub mod session;
pub mod storage;
pub mod token;
pub mod transport;
pub mod types;
pub mod validation;

#[cfg(test)]
mod testing;

// Re-exports for convenient access
pub use client::{BlogClient, BlogFilter};
pub use config::ClientConfig;
pub use credential::CredentialPair;
pub use error::Error;
pub use gateway::{Attempt, Gateway};
pub use guard::{Access, Denial, Route, after_login, authorize};
pub use listing::{ListingQuery, PAGE_SIZE, Page, SortOrder, paginate};
pub use models::{
    Blog, BlogDraft, Category, CategoryInput, Comment, ImageUpload, LikeToggle, Registration,
    Stats, User,
};
pub use request::{ApiRequest, ApiResponse, Body, Form, Part};
pub use session::{Session, SessionState, SessionStore};
pub use storage::{CredentialStorage, FileStorage, MemoryStorage};
pub use token::{SessionIdentity, UnverifiedClaims, decode_claims, decode_identity};
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use transport::Transport;
pub use types::{BlogId, CategoryId, CommentId, UserId};
