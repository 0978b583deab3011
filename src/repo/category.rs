//! Category tree repository.
//!
//! Categories carry both a parent pointer and a materialized `path` of
//! slugified names. Traversals run as recursive CTEs; structural edits that
//! invalidate paths are followed by an explicit rebuild, which re-derives
//! `(path, level)` from `(parent_id, name)` inside one transaction. The
//! general `update` never recomputes paths on its own.

use crate::entity::{rows_to_vec, Category, CategorySeo, FromRow, NewCategory};
use crate::error::StoreError;
use crate::executor::{ClientExecutor, DbExecutor};
use crate::filter::CategoryFilter;
use crate::sql::{SortEntity, SqlBuilder, SqlValue};
use std::collections::HashMap;
use uuid::Uuid;

const COLUMNS: &str = "id, name, description, parent_id, level, path, sort_order, is_active, \
                       created_at, updated_at";

const UPSERT_SEO: &str = "INSERT INTO category_metadata \
     (category_id, meta_title, meta_description, meta_keywords) \
     VALUES ($1, $2, $3, $4) \
     ON CONFLICT (category_id) DO UPDATE SET \
     meta_title = EXCLUDED.meta_title, \
     meta_description = EXCLUDED.meta_description, \
     meta_keywords = EXCLUDED.meta_keywords";

/// Partial update for a category. `None` leaves a column untouched;
/// `parent_id` uses a nested option so "set to NULL" (make root) is
/// expressible.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Option<Uuid>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Node shape the path rebuild works over.
struct PathNode {
    id: Uuid,
    parent_id: Option<Uuid>,
    name: String,
}

pub struct CategoryRepo;

impl CategoryRepo {
    /// Insert a category and its optional SEO side row in one transaction.
    ///
    /// `path` and `level` are derived from the parent here (root:
    /// `/slug(name)` at level 0); the SEO row is upserted on `category_id`
    /// conflict.
    pub fn create(db: &ClientExecutor, input: &NewCategory) -> Result<Category, StoreError> {
        let tx = db.begin()?;

        let (level, path) = match input.parent_id {
            Some(parent_id) => {
                let row = tx
                    .query_opt(
                        "SELECT level, path FROM product_categories WHERE id = $1",
                        &[&parent_id],
                    )?
                    .ok_or_else(|| StoreError::not_found("parent category"))?;
                let parent_level: i32 = row.try_get("level")?;
                let parent_path: String = row.try_get("path")?;
                (parent_level + 1, format!("{parent_path}/{}", slugify(&input.name)))
            }
            None => (0, format!("/{}", slugify(&input.name))),
        };

        let row = tx.query_one(
            &format!(
                "INSERT INTO product_categories \
                 (id, name, description, parent_id, level, path, sort_order, is_active, \
                  created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW()) \
                 RETURNING {COLUMNS}"
            ),
            &[
                &input.id,
                &input.name,
                &input.description,
                &input.parent_id,
                &level,
                &path,
                &input.sort_order,
                &input.is_active,
            ],
        )?;
        let category = Category::from_row(&row)?;

        if let Some(seo) = &input.seo {
            tx.execute(
                UPSERT_SEO,
                &[
                    &input.id,
                    &seo.meta_title,
                    &seo.meta_description,
                    &seo.meta_keywords,
                ],
            )?;
        }

        tx.commit()?;
        Ok(category)
    }

    pub fn get_by_id(db: &impl DbExecutor, id: Uuid) -> Result<Category, StoreError> {
        let row = db
            .query_opt(
                &format!("SELECT {COLUMNS} FROM product_categories WHERE id = $1"),
                &[&id],
            )?
            .ok_or_else(|| StoreError::not_found("category"))?;
        Category::from_row(&row)
    }

    /// Point lookup by materialized path.
    pub fn get_by_path(db: &impl DbExecutor, path: &str) -> Result<Category, StoreError> {
        let row = db
            .query_opt(
                &format!("SELECT {COLUMNS} FROM product_categories WHERE path = $1"),
                &[&path.to_string()],
            )?
            .ok_or_else(|| StoreError::not_found("category"))?;
        Category::from_row(&row)
    }

    pub fn get_seo(db: &impl DbExecutor, category_id: Uuid) -> Result<CategorySeo, StoreError> {
        let row = db
            .query_opt(
                "SELECT meta_title, meta_description, meta_keywords \
                 FROM category_metadata WHERE category_id = $1",
                &[&category_id],
            )?
            .ok_or_else(|| StoreError::not_found("category metadata"))?;
        Ok(CategorySeo {
            meta_title: row.try_get("meta_title")?,
            meta_description: row.try_get("meta_description")?,
            meta_keywords: row.try_get("meta_keywords")?,
        })
    }

    fn apply_filter(b: &mut SqlBuilder, filter: &CategoryFilter) {
        if let Some(search) = filter.search.as_deref() {
            b.and_search(&["name", "description"], search);
        }
        if let Some(level) = filter.level {
            b.and_eq("level", SqlValue::from(level));
        }
        match filter.parent_id {
            Some(parent_id) if parent_id.is_nil() => b.and_raw("parent_id IS NULL"),
            Some(parent_id) => b.and_eq("parent_id", SqlValue::from(parent_id)),
            None => {}
        }
        if let Some(active) = filter.is_active {
            b.and_eq("is_active", SqlValue::from(active));
        }
    }

    pub fn list(db: &impl DbExecutor, filter: &CategoryFilter) -> Result<Vec<Category>, StoreError> {
        let mut b = SqlBuilder::select(COLUMNS, "product_categories");
        Self::apply_filter(&mut b, filter);
        b.order_by(
            SortEntity::Categories,
            filter.sort_by.as_deref(),
            filter.sort_order.as_deref(),
        )?;
        b.paginate(&filter.paging);
        let (sql, params) = b.build();
        let rows = db.query_all(&sql, &SqlValue::borrow_all(&params))?;
        rows_to_vec(&rows)
    }

    pub fn count(db: &impl DbExecutor, filter: &CategoryFilter) -> Result<i64, StoreError> {
        let mut b = SqlBuilder::count("product_categories");
        Self::apply_filter(&mut b, filter);
        let (sql, params) = b.build();
        let row = db.query_one(&sql, &SqlValue::borrow_all(&params))?;
        Ok(row.try_get(0)?)
    }

    /// Partial update. Does not recompute paths: a rename or reparent is
    /// expected to be followed by [`CategoryRepo::rebuild_category_paths`]
    /// on the affected subtree. A reparent into the node's own subtree (or
    /// onto itself) is rejected before any write.
    pub fn update(
        db: &ClientExecutor,
        id: Uuid,
        changes: &CategoryUpdate,
    ) -> Result<(), StoreError> {
        if let Some(Some(new_parent)) = changes.parent_id {
            if new_parent == id {
                return Err(StoreError::InvalidArgument(
                    "category cannot be its own parent".to_string(),
                ));
            }
            let descendants = Self::get_descendants(db, id)?;
            if descendants.iter().any(|c| c.id == new_parent) {
                return Err(StoreError::InvalidArgument(
                    "new parent is inside the moved subtree".to_string(),
                ));
            }
        }

        let mut sets: Vec<String> = Vec::new();
        let mut params: Vec<SqlValue> = Vec::new();
        let mut bind = |params: &mut Vec<SqlValue>, v: SqlValue| {
            params.push(v);
            params.len()
        };

        if let Some(name) = &changes.name {
            let k = bind(&mut params, SqlValue::from(name.clone()));
            sets.push(format!("name = ${k}"));
        }
        if let Some(description) = &changes.description {
            let k = bind(&mut params, SqlValue::from(description.clone()));
            sets.push(format!("description = ${k}"));
        }
        match changes.parent_id {
            Some(Some(parent_id)) => {
                let k = bind(&mut params, SqlValue::from(parent_id));
                sets.push(format!("parent_id = ${k}"));
            }
            Some(None) => sets.push("parent_id = NULL".to_string()),
            None => {}
        }
        if let Some(sort_order) = changes.sort_order {
            let k = bind(&mut params, SqlValue::from(sort_order));
            sets.push(format!("sort_order = ${k}"));
        }
        if let Some(active) = changes.is_active {
            let k = bind(&mut params, SqlValue::from(active));
            sets.push(format!("is_active = ${k}"));
        }
        if sets.is_empty() {
            return Ok(());
        }
        sets.push("updated_at = NOW()".to_string());

        let k = bind(&mut params, SqlValue::from(id));
        let sql = format!(
            "UPDATE product_categories SET {} WHERE id = ${k}",
            sets.join(", ")
        );
        let affected = db.execute(&sql, &SqlValue::borrow_all(&params))?;
        if affected == 0 {
            return Err(StoreError::not_found("category"));
        }
        Ok(())
    }

    /// Delete a category and its SEO side row, all-or-nothing.
    pub fn delete(db: &ClientExecutor, id: Uuid) -> Result<(), StoreError> {
        let tx = db.begin()?;
        tx.execute(
            "DELETE FROM category_metadata WHERE category_id = $1",
            &[&id],
        )?;
        let affected = tx.execute("DELETE FROM product_categories WHERE id = $1", &[&id])?;
        if affected == 0 {
            tx.rollback()?;
            return Err(StoreError::not_found("category"));
        }
        tx.commit()
    }

    /// Direct children, `(sort_order ASC, name ASC)`.
    pub fn get_children(db: &impl DbExecutor, parent_id: Uuid) -> Result<Vec<Category>, StoreError> {
        let rows = db.query_all(
            &format!(
                "SELECT {COLUMNS} FROM product_categories WHERE parent_id = $1 \
                 ORDER BY sort_order ASC, name ASC"
            ),
            &[&parent_id],
        )?;
        rows_to_vec(&rows)
    }

    /// All proper descendants, `(level ASC, sort_order ASC, name ASC)`.
    pub fn get_descendants(
        db: &impl DbExecutor,
        category_id: Uuid,
    ) -> Result<Vec<Category>, StoreError> {
        let rows = db.query_all(
            &format!(
                "WITH RECURSIVE subtree AS ( \
                   SELECT {COLUMNS} FROM product_categories WHERE parent_id = $1 \
                   UNION ALL \
                   SELECT c.id, c.name, c.description, c.parent_id, c.level, c.path, \
                          c.sort_order, c.is_active, c.created_at, c.updated_at \
                   FROM product_categories c \
                   JOIN subtree s ON c.parent_id = s.id \
                 ) \
                 SELECT {COLUMNS} FROM subtree \
                 ORDER BY level ASC, sort_order ASC, name ASC"
            ),
            &[&category_id],
        )?;
        rows_to_vec(&rows)
    }

    /// Strict ancestors, immediate parent first (`level DESC`).
    pub fn get_ancestors(
        db: &impl DbExecutor,
        category_id: Uuid,
    ) -> Result<Vec<Category>, StoreError> {
        let rows = db.query_all(
            &format!(
                "WITH RECURSIVE lineage AS ( \
                   SELECT {COLUMNS} FROM product_categories \
                   WHERE id = (SELECT parent_id FROM product_categories WHERE id = $1) \
                   UNION ALL \
                   SELECT c.id, c.name, c.description, c.parent_id, c.level, c.path, \
                          c.sort_order, c.is_active, c.created_at, c.updated_at \
                   FROM product_categories c \
                   JOIN lineage l ON c.id = l.parent_id \
                 ) \
                 SELECT {COLUMNS} FROM lineage ORDER BY level DESC"
            ),
            &[&category_id],
        )?;
        rows_to_vec(&rows)
    }

    /// Ancestors plus self, root first (`level ASC`).
    pub fn get_path(db: &impl DbExecutor, category_id: Uuid) -> Result<Vec<Category>, StoreError> {
        let rows = db.query_all(
            &format!(
                "WITH RECURSIVE lineage AS ( \
                   SELECT {COLUMNS} FROM product_categories WHERE id = $1 \
                   UNION ALL \
                   SELECT c.id, c.name, c.description, c.parent_id, c.level, c.path, \
                          c.sort_order, c.is_active, c.created_at, c.updated_at \
                   FROM product_categories c \
                   JOIN lineage l ON c.id = l.parent_id \
                 ) \
                 SELECT {COLUMNS} FROM lineage ORDER BY level ASC"
            ),
            &[&category_id],
        )?;
        rows_to_vec(&rows)
    }

    /// Re-derive `(path, level)` for every category from `(parent_id, name)`
    /// in one transaction. A parent cycle or orphaned parent aborts with no
    /// row modified.
    pub fn rebuild_paths(db: &ClientExecutor) -> Result<u64, StoreError> {
        let tx = db.begin()?;
        let rows = tx.query_all("SELECT id, parent_id, name FROM product_categories", &[])?;
        let nodes = rows
            .iter()
            .map(|row| {
                Ok(PathNode {
                    id: row.try_get("id")?,
                    parent_id: row.try_get("parent_id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let seeds = nodes
            .iter()
            .filter(|n| n.parent_id.is_none())
            .map(|n| (n.id, format!("/{}", slugify(&n.name)), 0))
            .collect();
        let computed = compute_paths(seeds, &nodes)?;

        let mut updated = 0u64;
        for (id, path, level) in &computed {
            updated += tx.execute(
                "UPDATE product_categories SET path = $1, level = $2, updated_at = NOW() \
                 WHERE id = $3",
                &[path, level, id],
            )?;
        }
        tx.commit()?;
        log::info!("rebuilt paths for {updated} categories");
        Ok(updated)
    }

    /// [`CategoryRepo::rebuild_paths`] restricted to the subtree rooted at
    /// `category_id`.
    pub fn rebuild_category_paths(db: &ClientExecutor, category_id: Uuid) -> Result<u64, StoreError> {
        let tx = db.begin()?;

        let row = tx
            .query_opt(
                "SELECT id, parent_id, name FROM product_categories WHERE id = $1",
                &[&category_id],
            )?
            .ok_or_else(|| StoreError::not_found("category"))?;
        let root = PathNode {
            id: row.try_get("id")?,
            parent_id: row.try_get("parent_id")?,
            name: row.try_get("name")?,
        };

        let (base_path, base_level) = match root.parent_id {
            Some(parent_id) => {
                let parent = tx
                    .query_opt(
                        "SELECT path, level FROM product_categories WHERE id = $1",
                        &[&parent_id],
                    )?
                    .ok_or_else(|| StoreError::not_found("parent category"))?;
                let parent_path: String = parent.try_get("path")?;
                let parent_level: i32 = parent.try_get("level")?;
                (
                    format!("{parent_path}/{}", slugify(&root.name)),
                    parent_level + 1,
                )
            }
            None => (format!("/{}", slugify(&root.name)), 0),
        };

        let descendant_rows = tx.query_all(
            "WITH RECURSIVE subtree AS ( \
               SELECT id, parent_id, name FROM product_categories WHERE parent_id = $1 \
               UNION ALL \
               SELECT c.id, c.parent_id, c.name FROM product_categories c \
               JOIN subtree s ON c.parent_id = s.id \
             ) \
             SELECT id, parent_id, name FROM subtree",
            &[&category_id],
        )?;
        let mut nodes = vec![root];
        for row in &descendant_rows {
            nodes.push(PathNode {
                id: row.try_get("id")?,
                parent_id: row.try_get("parent_id")?,
                name: row.try_get("name")?,
            });
        }

        let computed = compute_paths(vec![(category_id, base_path, base_level)], &nodes)?;
        let mut updated = 0u64;
        for (id, path, level) in &computed {
            updated += tx.execute(
                "UPDATE product_categories SET path = $1, level = $2, updated_at = NOW() \
                 WHERE id = $3",
                &[path, level, id],
            )?;
        }
        tx.commit()?;
        log::debug!("rebuilt paths for subtree of {category_id}: {updated} rows");
        Ok(updated)
    }

    /// Apply a batch of `(category_id, sort_order)` pairs, all-or-nothing.
    pub fn bulk_update_sort_order(
        db: &ClientExecutor,
        updates: &[(Uuid, i32)],
    ) -> Result<(), StoreError> {
        let tx = db.begin()?;
        for (id, sort_order) in updates {
            let affected = tx.execute(
                "UPDATE product_categories SET sort_order = $1, updated_at = NOW() WHERE id = $2",
                &[sort_order, id],
            )?;
            if affected == 0 {
                tx.rollback()?;
                return Err(StoreError::not_found("category"));
            }
        }
        tx.commit()
    }

    pub fn set_active(db: &impl DbExecutor, id: Uuid, active: bool) -> Result<(), StoreError> {
        let affected = db.execute(
            "UPDATE product_categories SET is_active = $1, updated_at = NOW() WHERE id = $2",
            &[&active, &id],
        )?;
        if affected == 0 {
            return Err(StoreError::not_found("category"));
        }
        Ok(())
    }
}

/// Path segment slug: lowercase, keep only ASCII alphanumerics and spaces.
pub(crate) fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Walk down from the seeds, deriving each node's `(path, level)` from its
/// parent's. Fails if any node is unreachable from a seed, which means an
/// orphaned parent pointer or a cycle.
fn compute_paths(
    seeds: Vec<(Uuid, String, i32)>,
    nodes: &[PathNode],
) -> Result<Vec<(Uuid, String, i32)>, StoreError> {
    let mut children: HashMap<Uuid, Vec<&PathNode>> = HashMap::new();
    for node in nodes {
        if let Some(parent_id) = node.parent_id {
            children.entry(parent_id).or_default().push(node);
        }
    }

    let mut out: Vec<(Uuid, String, i32)> = Vec::with_capacity(nodes.len());
    let mut frontier = seeds;
    while let Some((id, path, level)) = frontier.pop() {
        if let Some(kids) = children.get(&id) {
            for kid in kids {
                frontier.push((
                    kid.id,
                    format!("{path}/{}", slugify(&kid.name)),
                    level + 1,
                ));
            }
        }
        out.push((id, path, level));
    }

    if out.len() != nodes.len() {
        return Err(StoreError::InvalidArgument(
            "category tree contains a cycle or an orphaned parent".to_string(),
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Power Tools"), "power tools");
        assert_eq!(slugify("Nuts & Bolts (M8)"), "nuts  bolts m8");
        assert_eq!(slugify("Caf\u{e9}"), "caf");
    }

    fn node(id: Uuid, parent: Option<Uuid>, name: &str) -> PathNode {
        PathNode {
            id,
            parent_id: parent,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_compute_paths_levels_match_separators() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let d = Uuid::new_v4();
        let nodes = vec![
            node(a, None, "Tools"),
            node(b, Some(a), "Hand Tools"),
            node(d, Some(b), "Hammers"),
        ];
        let seeds = vec![(a, "/tools".to_string(), 0)];
        let mut out = compute_paths(seeds, &nodes).unwrap();
        out.sort_by_key(|(_, _, level)| *level);

        assert_eq!(out[0], (a, "/tools".to_string(), 0));
        assert_eq!(out[1], (b, "/tools/hand tools".to_string(), 1));
        assert_eq!(out[2], (d, "/tools/hand tools/hammers".to_string(), 2));
        // level always equals the number of '/' separators minus one
        for (_, path, level) in &out {
            assert_eq!(*level, path.matches('/').count() as i32 - 1);
        }
    }

    #[test]
    fn test_compute_paths_multiple_roots() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let nodes = vec![node(a, None, "Tools"), node(b, None, "Parts")];
        let seeds = vec![
            (a, "/tools".to_string(), 0),
            (b, "/parts".to_string(), 0),
        ];
        let out = compute_paths(seeds, &nodes).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_compute_paths_detects_cycle() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        // a and b point at each other; no root, nothing reachable.
        let nodes = vec![node(a, Some(b), "A"), node(b, Some(a), "B")];
        let err = compute_paths(vec![], &nodes).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_compute_paths_detects_orphan() {
        let a = Uuid::new_v4();
        let ghost = Uuid::new_v4();
        let nodes = vec![node(a, Some(ghost), "A")];
        assert!(compute_paths(vec![], &nodes).is_err());
    }
}
