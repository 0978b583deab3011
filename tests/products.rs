//! Integration tests for products: stock-band listing and the disjoint
//! stats buckets.

mod common;

use common::{exec, test_db};
use rust_decimal::Decimal;
use stockyard::repo::ProductRepo;
use stockyard::DbExecutor;
use uuid::Uuid;

fn setup_schema(db: &stockyard::ClientExecutor) {
    exec(
        db,
        "CREATE TABLE IF NOT EXISTS products ( \
           id UUID PRIMARY KEY, \
           sku TEXT NOT NULL UNIQUE, \
           name TEXT NOT NULL, \
           description TEXT, \
           category_id UUID, \
           price NUMERIC NOT NULL DEFAULT 0, \
           cost NUMERIC, \
           weight NUMERIC, \
           length NUMERIC, \
           width NUMERIC, \
           height NUMERIC, \
           track_inventory BOOLEAN NOT NULL DEFAULT true, \
           stock_quantity INTEGER NOT NULL DEFAULT 0, \
           min_stock_level INTEGER NOT NULL DEFAULT 0, \
           max_stock_level INTEGER, \
           allow_backorder BOOLEAN NOT NULL DEFAULT false, \
           is_active BOOLEAN NOT NULL DEFAULT true, \
           is_featured BOOLEAN NOT NULL DEFAULT false, \
           is_digital BOOLEAN NOT NULL DEFAULT false, \
           created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(), \
           updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW() \
         )",
    );
    exec(db, "DELETE FROM products");
}

fn seed_product(db: &impl DbExecutor, sku: &str, stock: i32, min: i32, track: bool) -> Uuid {
    let id = Uuid::new_v4();
    db.execute(
        "INSERT INTO products (id, sku, name, price, track_inventory, stock_quantity, \
         min_stock_level) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        &[
            &id,
            &sku,
            &format!("Product {sku}"),
            &Decimal::new(999, 2),
            &track,
            &stock,
            &min,
        ],
    )
    .unwrap();
    id
}

#[test]
fn test_low_stock_band_excludes_out_of_stock() {
    let Some(db) = test_db() else { return };
    setup_schema(&db);

    // (stock, min): healthy, low, low, out-of-stock.
    let _p1 = seed_product(&db, "P1", 50, 10, true);
    let p2 = seed_product(&db, "P2", 5, 10, true);
    let p3 = seed_product(&db, "P3", 15, 20, true);
    let _p4 = seed_product(&db, "P4", 0, 10, true);

    let low = ProductRepo::get_low_stock(&db, 100).unwrap();
    let mut ids: Vec<Uuid> = low.iter().map(|p| p.id).collect();
    ids.sort();
    let mut expected = vec![p2, p3];
    expected.sort();
    assert_eq!(ids, expected);

    // Ascending by quantity: P2 (5) before P3 (15).
    assert_eq!(low[0].id, p2);

    // An untracked zero-stock product is neither low nor out of stock.
    seed_product(&db, "P5", 0, 10, false);
    let low = ProductRepo::get_low_stock(&db, 100).unwrap();
    assert_eq!(low.len(), 2);
}

#[test]
fn test_stats_buckets_are_disjoint() {
    let Some(db) = test_db() else { return };
    setup_schema(&db);

    seed_product(&db, "P1", 50, 10, true);
    seed_product(&db, "P2", 5, 10, true);
    seed_product(&db, "P3", 15, 20, true);
    seed_product(&db, "P4", 0, 10, true);

    let stats = ProductRepo::stats(&db, &Default::default()).unwrap();
    assert_eq!(stats.total_products, 4);
    assert_eq!(stats.low_stock, 2);
    assert_eq!(stats.out_of_stock, 1);
    // P4 sits in exactly one bucket.
    assert_eq!(stats.low_stock + stats.out_of_stock, 3);
}
