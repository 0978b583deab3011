//! User-role lookup.

use crate::error::StoreError;
use crate::executor::DbExecutor;
use uuid::Uuid;

pub struct UserRepo;

impl UserRepo {
    /// Role names for a user, alphabetically. A user with no roles yields an
    /// empty vector, not an error.
    pub fn get_user_roles(db: &impl DbExecutor, user_id: Uuid) -> Result<Vec<String>, StoreError> {
        let rows = db.query_all(
            "SELECT r.name FROM roles r \
             INNER JOIN user_roles ur ON ur.role_id = r.id \
             WHERE ur.user_id = $1 ORDER BY r.name",
            &[&user_id],
        )?;
        rows.iter().map(|row| Ok(row.try_get("name")?)).collect()
    }
}
