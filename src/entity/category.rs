//! Category records.

use crate::entity::FromRow;
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use may_postgres::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A node of the category tree.
///
/// `path` is the materialized root-to-self path of slugified names, always
/// starting with `/`; `level` is 0 for roots and `parent.level + 1`
/// otherwise. Both are derived state, rebuilt by the repository's path
/// operations.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub level: i32,
    pub path: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Category {
    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Category {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            parent_id: row.try_get("parent_id")?,
            level: row.try_get("level")?,
            path: row.try_get("path")?,
            sort_order: row.try_get("sort_order")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// SEO metadata stored in the 1:1 `category_metadata` side table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategorySeo {
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
}

/// Input record for creating a category.
///
/// `path` and `level` are not inputs; the repository derives them from the
/// parent at insert time.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub seo: Option<CategorySeo>,
}

fn default_active() -> bool {
    true
}
