//! Filtering, ordering, and pagination of a fetched blog list.

use std::cmp::Ordering;

use crate::models::Blog;
use crate::types::CategoryId;

/// Blogs shown per page.
pub const PAGE_SIZE: usize = 9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    TitleAsc,
    TitleDesc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub category: Option<CategoryId>,
    /// Case-insensitive substring matched against titles.
    pub search: String,
    pub sort: SortOrder,
    /// 1-based; 0 is read as 1.
    pub page: usize,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            category: None,
            search: String::new(),
            sort: SortOrder::default(),
            page: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a> {
    pub items: Vec<&'a Blog>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Apply `query` to `blogs`.
#[must_use]
pub fn paginate<'a>(blogs: &'a [Blog], query: &ListingQuery) -> Page<'a> {
    let needle = query.search.to_lowercase();

    let mut matching: Vec<&Blog> = blogs
        .iter()
        .filter(|blog| {
            query
                .category
                .is_none_or(|id| blog.category.as_ref().is_some_and(|c| c.id == id))
        })
        .filter(|blog| blog.title.to_lowercase().contains(&needle))
        .collect();

    matching.sort_by(|a, b| match query.sort {
        SortOrder::Newest => b.created_at.cmp(&a.created_at),
        SortOrder::Oldest => a.created_at.cmp(&b.created_at),
        SortOrder::TitleAsc => compare_titles(&a.title, &b.title),
        SortOrder::TitleDesc => compare_titles(&b.title, &a.title),
    });

    let total_items = matching.len();
    let total_pages = total_items.div_ceil(PAGE_SIZE);
    let page = query.page.max(1);
    let items = matching
        .into_iter()
        .skip((page - 1).saturating_mul(PAGE_SIZE))
        .take(PAGE_SIZE)
        .collect();

    Page {
        items,
        page,
        total_pages,
        total_items,
    }
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
