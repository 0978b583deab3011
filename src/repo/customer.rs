//! Customer and company repositories.

use crate::entity::stats::CustomerStats;
use crate::entity::{rows_to_vec, Company, Customer, FromRow};
use crate::error::StoreError;
use crate::executor::DbExecutor;
use crate::filter::{CompanyFilter, CustomerFilter};
use crate::sql::{SortEntity, SqlBuilder, SqlValue};
use uuid::Uuid;

const CUSTOMER_COLUMNS: &str =
    "id, first_name, last_name, email, phone, company_id, is_active, created_at, updated_at";

const CUSTOMER_SEARCHABLE: &[&str] = &["first_name", "last_name", "email", "phone"];

const COMPANY_COLUMNS: &str =
    "id, name, email, phone, tax_id, is_active, created_at, updated_at";

const COMPANY_SEARCHABLE: &[&str] = &["name", "email"];

const STATS_PROJECTION: &str = "COUNT(*) AS total_customers, \
     COUNT(*) FILTER (WHERE is_active) AS active_customers, \
     COUNT(*) FILTER (WHERE company_id IS NOT NULL) AS with_company";

pub struct CustomerRepo;

impl CustomerRepo {
    fn apply_filter(b: &mut SqlBuilder, filter: &CustomerFilter) {
        if let Some(search) = filter.search.as_deref() {
            b.and_search(CUSTOMER_SEARCHABLE, search);
        }
        if let Some(company_id) = filter.company_id {
            b.and_eq("company_id", SqlValue::from(company_id));
        }
        b.and_in(
            "id",
            filter.ids.iter().map(|id| SqlValue::from(*id)).collect(),
        );
        if let Some(created_after) = filter.created_after {
            b.and_gte("created_at", SqlValue::from(created_after));
        }
        if let Some(created_before) = filter.created_before {
            b.and_lte("created_at", SqlValue::from(created_before));
        }
        if let Some(active) = filter.is_active {
            b.and_eq("is_active", SqlValue::from(active));
        }
    }

    pub fn list(
        db: &impl DbExecutor,
        filter: &CustomerFilter,
    ) -> Result<Vec<Customer>, StoreError> {
        let mut b = SqlBuilder::select(CUSTOMER_COLUMNS, "customers");
        Self::apply_filter(&mut b, filter);
        b.order_by(
            SortEntity::Customers,
            filter.sort_by.as_deref(),
            filter.sort_order.as_deref(),
        )?;
        b.paginate(&filter.paging);
        let (sql, params) = b.build();
        let rows = db.query_all(&sql, &SqlValue::borrow_all(&params))?;
        rows_to_vec(&rows)
    }

    pub fn count(db: &impl DbExecutor, filter: &CustomerFilter) -> Result<i64, StoreError> {
        let mut b = SqlBuilder::count("customers");
        Self::apply_filter(&mut b, filter);
        let (sql, params) = b.build();
        let row = db.query_one(&sql, &SqlValue::borrow_all(&params))?;
        Ok(row.try_get(0)?)
    }

    pub fn stats(db: &impl DbExecutor, filter: &CustomerFilter) -> Result<CustomerStats, StoreError> {
        let mut b = SqlBuilder::select(STATS_PROJECTION, "customers");
        Self::apply_filter(&mut b, filter);
        let (sql, params) = b.build();
        let row = db.query_one(&sql, &SqlValue::borrow_all(&params))?;
        CustomerStats::from_row(&row)
    }

    pub fn get_by_id(db: &impl DbExecutor, id: Uuid) -> Result<Customer, StoreError> {
        let row = db
            .query_opt(
                &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"),
                &[&id],
            )?
            .ok_or_else(|| StoreError::not_found("customer"))?;
        Customer::from_row(&row)
    }

    pub fn get_by_email(db: &impl DbExecutor, email: &str) -> Result<Customer, StoreError> {
        let row = db
            .query_opt(
                &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = $1"),
                &[&email],
            )?
            .ok_or_else(|| StoreError::not_found("customer"))?;
        Customer::from_row(&row)
    }

    pub fn set_active(db: &impl DbExecutor, id: Uuid, active: bool) -> Result<(), StoreError> {
        let affected = db.execute(
            "UPDATE customers SET is_active = $1, updated_at = NOW() WHERE id = $2",
            &[&active, &id],
        )?;
        if affected == 0 {
            return Err(StoreError::not_found("customer"));
        }
        Ok(())
    }
}

pub struct CompanyRepo;

impl CompanyRepo {
    fn apply_filter(b: &mut SqlBuilder, filter: &CompanyFilter) {
        if let Some(search) = filter.search.as_deref() {
            b.and_search(COMPANY_SEARCHABLE, search);
        }
        b.and_in(
            "id",
            filter.ids.iter().map(|id| SqlValue::from(*id)).collect(),
        );
        if let Some(created_after) = filter.created_after {
            b.and_gte("created_at", SqlValue::from(created_after));
        }
        if let Some(created_before) = filter.created_before {
            b.and_lte("created_at", SqlValue::from(created_before));
        }
        if let Some(active) = filter.is_active {
            b.and_eq("is_active", SqlValue::from(active));
        }
    }

    pub fn list(db: &impl DbExecutor, filter: &CompanyFilter) -> Result<Vec<Company>, StoreError> {
        let mut b = SqlBuilder::select(COMPANY_COLUMNS, "companies");
        Self::apply_filter(&mut b, filter);
        b.order_by(
            SortEntity::Companies,
            filter.sort_by.as_deref(),
            filter.sort_order.as_deref(),
        )?;
        b.paginate(&filter.paging);
        let (sql, params) = b.build();
        let rows = db.query_all(&sql, &SqlValue::borrow_all(&params))?;
        rows_to_vec(&rows)
    }

    pub fn count(db: &impl DbExecutor, filter: &CompanyFilter) -> Result<i64, StoreError> {
        let mut b = SqlBuilder::count("companies");
        Self::apply_filter(&mut b, filter);
        let (sql, params) = b.build();
        let row = db.query_one(&sql, &SqlValue::borrow_all(&params))?;
        Ok(row.try_get(0)?)
    }

    pub fn get_by_id(db: &impl DbExecutor, id: Uuid) -> Result<Company, StoreError> {
        let row = db
            .query_opt(
                &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"),
                &[&id],
            )?
            .ok_or_else(|| StoreError::not_found("company"))?;
        Company::from_row(&row)
    }
}
