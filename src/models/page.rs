//! List response wrapper.

use serde::{Deserialize, Serialize};

use super::Entity;

/// Raw collection response: `{"Items": [...], "Next": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    /// Records on this page.
    #[serde(rename = "Items", default)]
    pub items: Vec<Entity>,

    /// Link to the following page, present when the result was cut at `take`.
    #[serde(rename = "Next", default)]
    pub next: Option<String>,
}

/// A single page of entities.
///
/// Only the first page is ever fetched; `has_more` reports whether the
/// server had more records than `take` allowed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntityPage {
    /// Records, with dates normalized.
    pub items: Vec<Entity>,
    /// Number of records in `items`.
    pub count: usize,
    /// True when results were truncated.
    pub has_more: bool,
}

impl EntityPage {
    /// Builds a page from records.
    pub fn new(items: Vec<Entity>, has_more: bool) -> Self {
        Self {
            count: items.len(),
            items,
            has_more,
        }
    }
}

impl From<ListResponse> for EntityPage {
    fn from(response: ListResponse) -> Self {
        let items = response.items.into_iter().map(Entity::normalized).collect();
        Self::new(items, response.next.is_some())
    }
}
