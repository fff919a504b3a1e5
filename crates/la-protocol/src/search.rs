use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::StoredLog;

/// Page metadata returned with every search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u64,
    pub has_more: bool,
    /// Identifier of the last record on this page, for cursor-style callers.
    pub last_id: Option<Uuid>,
}

impl Pagination {
    pub fn new(
        current_page: u64,
        items_per_page: u64,
        total_items: u64,
        last_id: Option<Uuid>,
    ) -> Self {
        let total_pages = total_items.div_ceil(items_per_page.max(1));
        Self {
            current_page,
            total_pages,
            total_items,
            items_per_page,
            has_more: current_page < total_pages,
            last_id,
        }
    }
}

/// The sort actually applied, after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortEcho {
    pub field: String,
    pub order: String,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub logs: Vec<StoredLog>,
    pub pagination: Pagination,
    pub sort: SortEcho,
}
