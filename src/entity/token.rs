//! Email-verification token records.

use crate::entity::FromRow;
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use may_postgres::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A one-shot verification token.
///
/// Active iff `!is_used && expires_at > now`. Consuming a token flips
/// `is_used` and stamps `used_at` in a single statement.
#[derive(Debug, Clone, Serialize)]
pub struct EmailVerification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmailVerification {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && self.expires_at > now
    }
}

impl FromRow for EmailVerification {
    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(EmailVerification {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            email: row.try_get("email")?,
            token: row.try_get("token")?,
            token_type: row.try_get("token_type")?,
            expires_at: row.try_get("expires_at")?,
            is_used: row.try_get("is_used")?,
            used_at: row.try_get("used_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Input record for issuing a token.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEmailVerification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}
