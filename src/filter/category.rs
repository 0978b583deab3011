//! Category listing filter.

use crate::filter::Pagination;
use serde::Deserialize;
use uuid::Uuid;

/// Filter for listing and counting categories.
///
/// `parent_id = Some(Uuid::nil())` selects roots (`parent_id IS NULL`);
/// any other `Some` value is ordinary equality.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryFilter {
    /// Substring match over `name` and `description`.
    pub search: Option<String>,

    pub parent_id: Option<Uuid>,
    pub level: Option<i32>,
    pub is_active: Option<bool>,

    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    #[serde(flatten)]
    pub paging: Pagination,
}
