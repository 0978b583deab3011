//! Shared helpers for integration tests.
//!
//! Tests require a running PostgreSQL database. Set TEST_DATABASE_URL to
//! enable them; without it every test returns early as a no-op so the
//! suite stays green on machines without a database.

#![allow(dead_code)]

use stockyard::{connect, ClientExecutor, DbExecutor};

pub fn test_db() -> Option<ClientExecutor> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    Some(connect(&url).expect("connect to TEST_DATABASE_URL"))
}

pub fn test_db_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

pub fn exec(db: &impl DbExecutor, sql: &str) {
    db.execute(sql, &[]).expect(sql);
}
