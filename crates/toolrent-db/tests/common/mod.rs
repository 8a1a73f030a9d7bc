//! Shared fixtures for the database integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use std::sync::Arc;

use toolrent_core::{Customer, FixedClock, NewCustomer, NewTool, Tool, ToolCategory};
use toolrent_db::{Database, DbConfig};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A fresh in-memory shop whose clock is frozen on `today`.
pub async fn shop_on(today: NaiveDate) -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
        .with_clock(Arc::new(FixedClock::on(today)))
}

/// Another handle on the same database, with the clock moved to `today`.
pub fn at(db: &Database, today: NaiveDate) -> Database {
    db.clone().with_clock(Arc::new(FixedClock::on(today)))
}

pub async fn category(db: &Database) -> ToolCategory {
    db.categories().create("Power tools").await.expect("category")
}

pub async fn tool(db: &Database, name: &str, total: i64, price_cents: i64) -> Tool {
    let category = match db.categories().list().await.unwrap().into_iter().next() {
        Some(c) => c,
        None => category(db).await,
    };

    db.tools()
        .create(&NewTool {
            name: name.to_string(),
            category_id: category.id,
            daily_price_cents: price_cents,
            quantity_total: total,
        })
        .await
        .expect("tool")
}

pub async fn customer(db: &Database, name: &str) -> Customer {
    db.customers()
        .create(&NewCustomer {
            name: name.to_string(),
            phone: "+998 90 123-45-67".to_string(),
            address: "Yunusobod 4".to_string(),
        })
        .await
        .expect("customer")
}

pub async fn reload(db: &Database, tool: &Tool) -> Tool {
    db.tools().get_by_id(&tool.id).await.unwrap().expect("tool exists")
}
