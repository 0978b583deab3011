//! Customer and company listing filters.

use crate::filter::Pagination;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Filter for listing and counting customers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomerFilter {
    /// Substring match over `first_name`, `last_name`, `email` and `phone`.
    pub search: Option<String>,

    pub company_id: Option<Uuid>,
    pub ids: Vec<Uuid>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,

    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    #[serde(flatten)]
    pub paging: Pagination,
}

/// Filter for listing and counting companies.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompanyFilter {
    /// Substring match over `name` and `email`.
    pub search: Option<String>,

    pub ids: Vec<Uuid>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,

    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    #[serde(flatten)]
    pub paging: Pagination,
}
