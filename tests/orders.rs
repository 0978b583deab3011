//! Integration tests for orders: status transitions, the order-number
//! minter and the revenue rollups.

mod common;

use common::{exec, test_db};
use regex::Regex;
use rust_decimal::Decimal;
use stockyard::entity::OrderStatus;
use stockyard::repo::{OrderRepo, RevenuePeriodUnit};
use stockyard::DbExecutor;
use uuid::Uuid;

fn setup_schema(db: &stockyard::ClientExecutor) {
    exec(
        db,
        "CREATE TABLE IF NOT EXISTS customers ( \
           id UUID PRIMARY KEY, \
           first_name TEXT NOT NULL, \
           last_name TEXT NOT NULL, \
           email TEXT NOT NULL, \
           phone TEXT, \
           company_id UUID, \
           is_active BOOLEAN NOT NULL DEFAULT true, \
           created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(), \
           updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW() \
         )",
    );
    exec(
        db,
        "CREATE TABLE IF NOT EXISTS orders ( \
           id UUID PRIMARY KEY, \
           order_number TEXT NOT NULL UNIQUE, \
           customer_id UUID NOT NULL, \
           company_id UUID, \
           status TEXT NOT NULL DEFAULT 'PENDING', \
           previous_status TEXT, \
           payment_status TEXT NOT NULL DEFAULT 'PENDING', \
           subtotal NUMERIC NOT NULL DEFAULT 0, \
           tax_amount NUMERIC NOT NULL DEFAULT 0, \
           shipping_amount NUMERIC NOT NULL DEFAULT 0, \
           discount_amount NUMERIC NOT NULL DEFAULT 0, \
           total_amount NUMERIC NOT NULL DEFAULT 0, \
           paid_amount NUMERIC NOT NULL DEFAULT 0, \
           refunded_amount NUMERIC NOT NULL DEFAULT 0, \
           currency TEXT NOT NULL DEFAULT 'USD', \
           order_date TIMESTAMPTZ NOT NULL DEFAULT NOW(), \
           shipping_address_id UUID, \
           billing_address_id UUID, \
           notes TEXT, \
           created_by UUID, \
           updated_by UUID, \
           created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(), \
           updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW() \
         )",
    );
    exec(db, "DELETE FROM orders");
    exec(db, "DELETE FROM customers");
}

fn seed_customer(db: &impl DbExecutor, first: &str, last: &str, email: &str) -> Uuid {
    let id = Uuid::new_v4();
    db.execute(
        "INSERT INTO customers (id, first_name, last_name, email) VALUES ($1, $2, $3, $4)",
        &[&id, &first, &last, &email],
    )
    .unwrap();
    id
}

fn seed_order(db: &impl DbExecutor, customer_id: Uuid, total: Decimal, status: &str) -> Uuid {
    let id = Uuid::new_v4();
    let number = format!("ORD-TEST-{}", &id.simple().to_string()[..12]);
    db.execute(
        "INSERT INTO orders (id, order_number, customer_id, total_amount, status) \
         VALUES ($1, $2, $3, $4, $5)",
        &[&id, &number, &customer_id, &total, &status],
    )
    .unwrap();
    id
}

#[test]
fn test_update_status_captures_previous() {
    let Some(db) = test_db() else { return };
    setup_schema(&db);
    let customer = seed_customer(&db, "Ada", "Lovelace", "ada@example.com");
    let order_id = seed_order(&db, customer, Decimal::new(10000, 2), "PENDING");

    OrderRepo::update_status(&db, order_id, OrderStatus::Confirmed, None).unwrap();
    let order = OrderRepo::get_by_id(&db, order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.previous_status, Some(OrderStatus::Pending));

    OrderRepo::update_status(&db, order_id, OrderStatus::Processing, None).unwrap();
    let order = OrderRepo::get_by_id(&db, order_id).unwrap();
    assert_eq!(order.previous_status, Some(OrderStatus::Confirmed));
}

#[test]
fn test_generate_unique_order_number() {
    let Some(db) = test_db() else { return };
    setup_schema(&db);

    let re = Regex::new(r"^ORD-\d{8}-\d{5}$").unwrap();
    let n = OrderRepo::generate_unique_order_number(&db).unwrap();
    assert!(re.is_match(&n), "bad order number: {n}");
    assert!(!OrderRepo::exists_by_order_number(&db, &n).unwrap());
}

#[test]
fn test_stats_exclude_cancelled_and_refunded_revenue() {
    let Some(db) = test_db() else { return };
    setup_schema(&db);
    let customer = seed_customer(&db, "Ada", "Lovelace", "ada@example.com");

    seed_order(&db, customer, Decimal::new(10000, 2), "DELIVERED");
    seed_order(&db, customer, Decimal::new(5000, 2), "PENDING");
    seed_order(&db, customer, Decimal::new(99900, 2), "CANCELLED");
    seed_order(&db, customer, Decimal::new(7700, 2), "REFUNDED");

    let stats = OrderRepo::stats(&db, &Default::default()).unwrap();
    assert_eq!(stats.total_orders, 4);
    assert_eq!(stats.cancelled_orders, 1);
    // 100.00 + 50.00; the cancelled and refunded rows are invisible to
    // revenue.
    assert_eq!(stats.total_revenue, Decimal::new(15000, 2));
}

#[test]
fn test_top_customers_by_revenue() {
    let Some(db) = test_db() else { return };
    setup_schema(&db);

    let big = seed_customer(&db, "Grace", "Hopper", "grace@example.com");
    let small = seed_customer(&db, "Ada", "Lovelace", "ada@example.com");
    seed_order(&db, big, Decimal::new(90000, 2), "DELIVERED");
    seed_order(&db, big, Decimal::new(90000, 2), "DELIVERED");
    seed_order(&db, small, Decimal::new(100, 2), "DELIVERED");

    let top = OrderRepo::top_customers_by_revenue(&db, 10).unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].customer_id, big);
    assert_eq!(top[0].customer_name, "Grace Hopper");
    assert_eq!(top[0].customer_email, "grace@example.com");
    assert_eq!(top[0].order_count, 2);

    let limited = OrderRepo::top_customers_by_revenue(&db, 1).unwrap();
    assert_eq!(limited.len(), 1);
}

#[test]
fn test_revenue_by_period_buckets() {
    let Some(db) = test_db() else { return };
    setup_schema(&db);
    let customer = seed_customer(&db, "Ada", "Lovelace", "ada@example.com");
    seed_order(&db, customer, Decimal::new(10000, 2), "DELIVERED");
    seed_order(&db, customer, Decimal::new(5000, 2), "DELIVERED");

    let buckets = OrderRepo::revenue_by_period(&db, RevenuePeriodUnit::Month, 12).unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].order_count, 2);
    assert_eq!(buckets[0].revenue, Decimal::new(15000, 2));
    // Monthly labels look like 2024-06.
    assert!(Regex::new(r"^\d{4}-\d{2}$").unwrap().is_match(&buckets[0].period));
}
