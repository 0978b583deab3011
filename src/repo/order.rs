//! Order repository: filtered listing, status transitions, the order-number
//! minter and revenue statistics.

use crate::entity::stats::{OrderStats, RevenuePeriod, TopCustomer};
use crate::entity::{rows_to_vec, FromRow, Order, OrderStatus, PaymentStatus};
use crate::error::StoreError;
use crate::executor::DbExecutor;
use crate::filter::OrderFilter;
use crate::sql::{SortEntity, SqlBuilder, SqlValue};
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

const COLUMNS: &str = "id, order_number, customer_id, company_id, status, previous_status, \
                       payment_status, subtotal, tax_amount, shipping_amount, discount_amount, \
                       total_amount, paid_amount, refunded_amount, currency, order_date, \
                       shipping_address_id, billing_address_id, notes, created_by, updated_by, \
                       created_at, updated_at";

const SEARCHABLE: &[&str] = &["order_number"];

// Revenue-like aggregates exclude cancelled and refunded orders.
const REVENUE_SCOPE: &str = "('CANCELLED', 'REFUNDED')";

const STATS_PROJECTION: &str = "COUNT(*) AS total_orders, \
     COUNT(*) FILTER (WHERE status = 'PENDING') AS pending_orders, \
     COUNT(*) FILTER (WHERE status = 'PROCESSING') AS processing_orders, \
     COUNT(*) FILTER (WHERE status = 'SHIPPED') AS shipped_orders, \
     COUNT(*) FILTER (WHERE status = 'DELIVERED') AS delivered_orders, \
     COUNT(*) FILTER (WHERE status = 'CANCELLED') AS cancelled_orders, \
     COALESCE(SUM(total_amount) FILTER (WHERE status NOT IN ('CANCELLED', 'REFUNDED')), 0) \
       AS total_revenue, \
     AVG(total_amount) FILTER (WHERE status NOT IN ('CANCELLED', 'REFUNDED')) \
       AS average_order_value, \
     MIN(order_date) AS first_order_date, \
     MAX(order_date) AS last_order_date";

const ORDER_NUMBER_ATTEMPTS: u32 = 10;
const ORDER_NUMBER_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Rollup grain for [`OrderRepo::revenue_by_period`].
///
/// The unit is interpolated into `DATE_TRUNC`/`INTERVAL`, so it is a closed
/// enum; a user token goes through [`RevenuePeriodUnit::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevenuePeriodUnit {
    Day,
    Week,
    Month,
    Year,
}

impl RevenuePeriodUnit {
    pub fn parse(token: &str) -> Result<Self, StoreError> {
        match token.to_ascii_lowercase().as_str() {
            "day" => Ok(RevenuePeriodUnit::Day),
            "week" => Ok(RevenuePeriodUnit::Week),
            "month" => Ok(RevenuePeriodUnit::Month),
            "year" => Ok(RevenuePeriodUnit::Year),
            other => Err(StoreError::InvalidArgument(format!(
                "unknown revenue period: {other}"
            ))),
        }
    }

    fn trunc(self) -> &'static str {
        match self {
            RevenuePeriodUnit::Day => "day",
            RevenuePeriodUnit::Week => "week",
            RevenuePeriodUnit::Month => "month",
            RevenuePeriodUnit::Year => "year",
        }
    }

    fn label_format(self) -> &'static str {
        match self {
            RevenuePeriodUnit::Day => "YYYY-MM-DD",
            RevenuePeriodUnit::Week => "IYYY-IW",
            RevenuePeriodUnit::Month => "YYYY-MM",
            RevenuePeriodUnit::Year => "YYYY",
        }
    }

    fn interval_unit(self) -> &'static str {
        match self {
            RevenuePeriodUnit::Day => "day",
            RevenuePeriodUnit::Week => "week",
            RevenuePeriodUnit::Month => "month",
            RevenuePeriodUnit::Year => "year",
        }
    }
}

pub struct OrderRepo;

impl OrderRepo {
    fn apply_filter(b: &mut SqlBuilder, filter: &OrderFilter) {
        if let Some(search) = filter.search.as_deref() {
            b.and_search(SEARCHABLE, search);
        }
        if let Some(customer_id) = filter.customer_id {
            b.and_eq("customer_id", SqlValue::from(customer_id));
        }
        if let Some(company_id) = filter.company_id {
            b.and_eq("company_id", SqlValue::from(company_id));
        }
        if let Some(currency) = &filter.currency {
            b.and_eq("currency", SqlValue::from(currency.clone()));
        }
        b.and_in(
            "id",
            filter.ids.iter().map(|id| SqlValue::from(*id)).collect(),
        );
        b.and_in(
            "status",
            filter.status.iter().map(|s| SqlValue::from(s.clone())).collect(),
        );
        b.and_in(
            "payment_status",
            filter
                .payment_status
                .iter()
                .map(|s| SqlValue::from(s.clone()))
                .collect(),
        );
        b.and_in(
            "priority",
            filter
                .priority
                .iter()
                .map(|s| SqlValue::from(s.clone()))
                .collect(),
        );
        b.and_in(
            "shipping_method",
            filter
                .shipping_method
                .iter()
                .map(|s| SqlValue::from(s.clone()))
                .collect(),
        );
        if let Some(min_total) = filter.min_total {
            b.and_gte("total_amount", SqlValue::from(min_total));
        }
        if let Some(max_total) = filter.max_total {
            b.and_lte("total_amount", SqlValue::from(max_total));
        }
        if let Some(start_date) = filter.start_date {
            b.and_gte("order_date", SqlValue::from(start_date));
        }
        if let Some(end_date) = filter.end_date {
            b.and_lte("order_date", SqlValue::from(end_date));
        }
        if let Some(created_after) = filter.created_after {
            b.and_gte("created_at", SqlValue::from(created_after));
        }
        if let Some(created_before) = filter.created_before {
            b.and_lte("created_at", SqlValue::from(created_before));
        }
    }

    pub fn list(db: &impl DbExecutor, filter: &OrderFilter) -> Result<Vec<Order>, StoreError> {
        let mut b = SqlBuilder::select(COLUMNS, "orders");
        Self::apply_filter(&mut b, filter);
        b.order_by(
            SortEntity::Orders,
            filter.sort_by.as_deref(),
            filter.sort_order.as_deref(),
        )?;
        b.paginate(&filter.paging);
        let (sql, params) = b.build();
        let rows = db.query_all(&sql, &SqlValue::borrow_all(&params))?;
        rows_to_vec(&rows)
    }

    pub fn count(db: &impl DbExecutor, filter: &OrderFilter) -> Result<i64, StoreError> {
        let mut b = SqlBuilder::count("orders");
        Self::apply_filter(&mut b, filter);
        let (sql, params) = b.build();
        let row = db.query_one(&sql, &SqlValue::borrow_all(&params))?;
        Ok(row.try_get(0)?)
    }

    pub fn get_by_id(db: &impl DbExecutor, id: Uuid) -> Result<Order, StoreError> {
        let row = db
            .query_opt(&format!("SELECT {COLUMNS} FROM orders WHERE id = $1"), &[&id])?
            .ok_or_else(|| StoreError::not_found("order"))?;
        Order::from_row(&row)
    }

    pub fn get_by_order_number(
        db: &impl DbExecutor,
        order_number: &str,
    ) -> Result<Order, StoreError> {
        let row = db
            .query_opt(
                &format!("SELECT {COLUMNS} FROM orders WHERE order_number = $1"),
                &[&order_number],
            )?
            .ok_or_else(|| StoreError::not_found("order"))?;
        Order::from_row(&row)
    }

    pub fn exists_by_order_number(
        db: &impl DbExecutor,
        order_number: &str,
    ) -> Result<bool, StoreError> {
        let row = db.query_one(
            "SELECT EXISTS(SELECT 1 FROM orders WHERE order_number = $1)",
            &[&order_number],
        )?;
        Ok(row.try_get(0)?)
    }

    /// Transition an order's status, capturing the prior status into
    /// `previous_status` in the same statement.
    pub fn update_status(
        db: &impl DbExecutor,
        id: Uuid,
        status: OrderStatus,
        user_id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        let affected = db.execute(
            "UPDATE orders SET previous_status = status, status = $1, updated_at = NOW(), \
             updated_by = $2 WHERE id = $3",
            &[&status.as_str(), &user_id, &id],
        )?;
        if affected == 0 {
            return Err(StoreError::not_found("order"));
        }
        Ok(())
    }

    pub fn set_payment_status(
        db: &impl DbExecutor,
        id: Uuid,
        payment_status: PaymentStatus,
        user_id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        let affected = db.execute(
            "UPDATE orders SET payment_status = $1, updated_at = NOW(), updated_by = $2 \
             WHERE id = $3",
            &[&payment_status.as_str(), &user_id, &id],
        )?;
        if affected == 0 {
            return Err(StoreError::not_found("order"));
        }
        Ok(())
    }

    /// Mint a human-readable order number that is unique at the moment of
    /// return.
    ///
    /// Up to ten attempts, ten milliseconds apart; the bounds trade latency
    /// under collision storms against a guarantee the namespace cannot give.
    pub fn generate_unique_order_number(db: &impl DbExecutor) -> Result<String, StoreError> {
        for attempt in 0..ORDER_NUMBER_ATTEMPTS {
            let candidate = mint_order_number(Utc::now());
            if !Self::exists_by_order_number(db, &candidate)? {
                return Ok(candidate);
            }
            log::debug!("order number collision on attempt {attempt}: {candidate}");
            may::coroutine::sleep(ORDER_NUMBER_RETRY_DELAY);
        }
        Err(StoreError::OrderNumberExhausted)
    }

    /// Summary stats sharing the listing filter's predicate body.
    pub fn stats(db: &impl DbExecutor, filter: &OrderFilter) -> Result<OrderStats, StoreError> {
        let mut b = SqlBuilder::select(STATS_PROJECTION, "orders");
        Self::apply_filter(&mut b, filter);
        let (sql, params) = b.build();
        let row = db.query_one(&sql, &SqlValue::borrow_all(&params))?;
        OrderStats::from_row(&row)
    }

    /// Revenue bucketed by calendar period over a trailing window of
    /// `periods_back` units.
    pub fn revenue_by_period(
        db: &impl DbExecutor,
        unit: RevenuePeriodUnit,
        periods_back: i32,
    ) -> Result<Vec<RevenuePeriod>, StoreError> {
        let sql = format!(
            "SELECT TO_CHAR(DATE_TRUNC('{trunc}', order_date), '{fmt}') AS period, \
                    COUNT(*) AS order_count, \
                    COALESCE(SUM(total_amount), 0) AS revenue \
             FROM orders \
             WHERE status NOT IN {REVENUE_SCOPE} \
               AND order_date >= NOW() - ($1::int4 * INTERVAL '1 {unit}') \
             GROUP BY 1 ORDER BY 1",
            trunc = unit.trunc(),
            fmt = unit.label_format(),
            unit = unit.interval_unit(),
        );
        let rows = db.query_all(&sql, &[&periods_back])?;
        rows_to_vec(&rows)
    }

    /// Top `limit` customers by revenue. Name and email are distinct
    /// outputs.
    pub fn top_customers_by_revenue(
        db: &impl DbExecutor,
        limit: i64,
    ) -> Result<Vec<TopCustomer>, StoreError> {
        let rows = db.query_all(
            &format!(
                "SELECT c.id AS customer_id, \
                        TRIM(c.first_name || ' ' || c.last_name) AS customer_name, \
                        c.email AS customer_email, \
                        COUNT(o.id) AS order_count, \
                        COALESCE(SUM(o.total_amount), 0) AS total_revenue \
                 FROM customers c \
                 JOIN orders o ON o.customer_id = c.id \
                 WHERE o.status NOT IN {REVENUE_SCOPE} \
                 GROUP BY c.id, c.first_name, c.last_name, c.email \
                 ORDER BY total_revenue DESC \
                 LIMIT $1"
            ),
            &[&limit],
        )?;
        rows_to_vec(&rows)
    }
}

/// Format one order-number candidate: `ORD-YYYYMMDD-NNNNN` where the suffix
/// is the instant's epoch nanoseconds mod 100000, zero-padded. Pure in
/// `now`, so each retry samples the clock once.
fn mint_order_number(now: DateTime<Utc>) -> String {
    let nanos = now.timestamp_nanos_opt().unwrap_or_default().rem_euclid(100_000);
    format!("ORD-{}-{:05}", now.format("%Y%m%d"), nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use regex::Regex;

    #[test]
    fn test_mint_order_number_shape() {
        let re = Regex::new(r"^ORD-\d{8}-\d{5}$").unwrap();
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        for i in 0..100 {
            let now = base + chrono::Duration::nanoseconds(i * 977);
            let n = mint_order_number(now);
            assert!(re.is_match(&n), "bad order number: {n}");
            assert!(n.starts_with("ORD-20240601-"));
        }
    }

    #[test]
    fn test_mint_order_number_is_pure_in_its_instant() {
        // The whole candidate, suffix included, derives from the single
        // passed instant.
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
            + chrono::Duration::nanoseconds(1_234_567_891);
        assert_eq!(mint_order_number(now), mint_order_number(now));

        let later = now + chrono::Duration::nanoseconds(7);
        assert_ne!(mint_order_number(now), mint_order_number(later));
    }

    #[test]
    fn test_mint_order_number_padding() {
        // The suffix is always exactly five digits, left-padded.
        let n = mint_order_number(Utc::now());
        let suffix = n.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 5);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_revenue_period_unit_parse() {
        assert_eq!(
            RevenuePeriodUnit::parse("Month").unwrap(),
            RevenuePeriodUnit::Month
        );
        assert!(matches!(
            RevenuePeriodUnit::parse("fortnight"),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_order_filter_statement_shape() {
        let filter = OrderFilter {
            search: Some("ORD-2024".to_string()),
            currency: Some("USD".to_string()),
            status: vec!["PENDING".to_string(), "CONFIRMED".to_string()],
            ..Default::default()
        };
        let mut b = SqlBuilder::select(COLUMNS, "orders");
        OrderRepo::apply_filter(&mut b, &filter);
        b.order_by(SortEntity::Orders, None, None).unwrap();
        let (sql, params) = b.build();
        assert!(sql.contains("order_number ILIKE $1"));
        assert!(sql.contains("currency = $2"));
        assert!(sql.contains("status IN ($3, $4)"));
        assert!(sql.ends_with("ORDER BY order_date DESC"));
        assert_eq!(params.len(), 4);
    }
}
