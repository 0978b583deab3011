//! Email-verification token repository.

use std::collections::HashMap;

use crate::entity::stats::TokenTypeStats;
use crate::entity::{EmailVerification, FromRow, NewEmailVerification};
use crate::error::StoreError;
use crate::executor::DbExecutor;
use chrono::{Duration as ChronoDuration, Utc};
use uuid::Uuid;

const COLUMNS: &str = "id, user_id, email, token, token_type, expires_at, is_used, used_at, \
                       created_at, updated_at";

pub struct TokenRepo;

impl TokenRepo {
    pub fn create(
        db: &impl DbExecutor,
        input: &NewEmailVerification,
    ) -> Result<EmailVerification, StoreError> {
        let row = db.query_one(
            &format!(
                "INSERT INTO email_verifications \
                 (id, user_id, email, token, token_type, expires_at, is_used, \
                  created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, false, NOW(), NOW()) \
                 RETURNING {COLUMNS}"
            ),
            &[
                &input.id,
                &input.user_id,
                &input.email,
                &input.token,
                &input.token_type,
                &input.expires_at,
            ],
        )?;
        EmailVerification::from_row(&row)
    }

    pub fn get_by_token(db: &impl DbExecutor, token: &str) -> Result<EmailVerification, StoreError> {
        let row = db
            .query_opt(
                &format!("SELECT {COLUMNS} FROM email_verifications WHERE token = $1"),
                &[&token],
            )?
            .ok_or_else(|| StoreError::not_found("email verification"))?;
        EmailVerification::from_row(&row)
    }

    /// The newest still-active token of a type for a user, if any. Expired
    /// and consumed tokens never match.
    pub fn get_active_verification(
        db: &impl DbExecutor,
        user_id: Uuid,
        token_type: &str,
    ) -> Result<Option<EmailVerification>, StoreError> {
        let row = db.query_opt(
            &format!(
                "SELECT {COLUMNS} FROM email_verifications \
                 WHERE user_id = $1 AND token_type = $2 \
                   AND is_used = false AND expires_at > NOW() \
                 ORDER BY created_at DESC LIMIT 1"
            ),
            &[&user_id, &token_type],
        )?;
        row.as_ref().map(EmailVerification::from_row).transpose()
    }

    /// Consume a token. The precondition rides in the WHERE clause so two
    /// racing consumers resolve to a single winner. Expiry is not checked
    /// here; whether a token is worth consuming is the lookup's concern.
    pub fn mark_used(db: &impl DbExecutor, id: Uuid) -> Result<(), StoreError> {
        let affected = db.execute(
            "UPDATE email_verifications \
             SET is_used = true, used_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND is_used = false",
            &[&id],
        )?;
        if affected == 0 {
            return Err(StoreError::not_found("email verification"));
        }
        Ok(())
    }

    /// Purge tokens whose expiry is at least `older_than` in the past.
    /// Returns how many rows went away.
    pub fn cleanup_expired(
        db: &impl DbExecutor,
        older_than: ChronoDuration,
    ) -> Result<u64, StoreError> {
        let cutoff = Utc::now() - older_than;
        let affected = db.execute(
            "DELETE FROM email_verifications WHERE expires_at < $1",
            &[&cutoff],
        )?;
        if affected > 0 {
            log::info!("purged {affected} expired verification tokens");
        }
        Ok(affected)
    }

    /// Per-type totals, keyed by `token_type` so distinct types never
    /// collapse into one bucket.
    pub fn verification_stats(
        db: &impl DbExecutor,
    ) -> Result<HashMap<String, TokenTypeStats>, StoreError> {
        let rows = db.query_all(
            "SELECT token_type, COUNT(*) AS total, \
             COUNT(*) FILTER (WHERE is_used) AS used, \
             COUNT(*) FILTER (WHERE NOT is_used AND expires_at > NOW()) AS active, \
             COUNT(*) FILTER (WHERE NOT is_used AND expires_at <= NOW()) AS expired \
             FROM email_verifications GROUP BY token_type",
            &[],
        )?;
        let mut out = HashMap::with_capacity(rows.len());
        for row in &rows {
            let token_type: String = row.try_get("token_type")?;
            out.insert(
                token_type,
                TokenTypeStats {
                    total: row.try_get("total")?,
                    used: row.try_get("used")?,
                    active: row.try_get("active")?,
                    expired: row.try_get("expired")?,
                },
            );
        }
        Ok(out)
    }
}
