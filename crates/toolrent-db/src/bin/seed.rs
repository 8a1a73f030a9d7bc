//! # Seed Data Generator
//!
//! Populates the database with a small rental shop for development.
//!
//! ## Usage
//! ```bash
//! # 20 customers (default)
//! cargo run -p toolrent-db --bin seed
//!
//! # Custom amount and database path
//! cargo run -p toolrent-db --bin seed -- --customers 50 --db ./data/toolrent.db
//! ```
//!
//! ## Generated Data
//! - Categories with a handful of tools each, stock 1-12, prices 30.00-480.00
//! - Customers with Tashkent-style phone numbers
//! - One active rental for every third customer, started 0-9 days ago,
//!   plus a completed rental for every fifth

use chrono::Duration;
use serde_json::json;
use std::env;
use toolrent_core::{Clock, NewCustomer, NewTool, SystemClock};
use toolrent_db::{Database, DbConfig};

/// Catalog for realistic test data
const CATALOG: &[(&str, &[&str])] = &[
    (
        "Power tools",
        &[
            "Hammer drill",
            "Angle grinder",
            "Circular saw",
            "Jigsaw",
            "Impact driver",
            "Rotary hammer",
        ],
    ),
    (
        "Ladders & scaffolding",
        &["Step ladder 2m", "Extension ladder 6m", "Scaffold tower"],
    ),
    (
        "Concrete & masonry",
        &["Concrete mixer", "Plate compactor", "Tile cutter", "Core drill"],
    ),
    (
        "Garden",
        &["Lawn mower", "Hedge trimmer", "Chainsaw", "Leaf blower"],
    ),
    (
        "Cleaning",
        &["Pressure washer", "Wet & dry vacuum", "Floor scrubber"],
    ),
];

const FIRST_NAMES: &[&str] = &[
    "Aziz", "Dilnoza", "Bekzod", "Madina", "Jasur", "Nodira", "Sardor", "Malika", "Otabek", "Zarina",
];

const LAST_NAMES: &[&str] = &[
    "Karimov", "Rashidova", "Tursunov", "Yusupova", "Aliyev", "Nazarova", "Ergashev",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut customer_count: usize = 20;
    let mut db_path = String::from("./toolrent_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--customers" | "-c" => {
                if i + 1 < args.len() {
                    customer_count = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("ToolRent Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --customers <N>  Number of customers to generate (default: 20)");
                println!("  -d, --db <PATH>      Database file path (default: ./toolrent_dev.db)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("ToolRent Seed Data Generator");
    println!("============================");
    println!("Database:  {}", db_path);
    println!("Customers: {}", customer_count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.tools().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} tools", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    // Catalog
    let mut tool_ids = Vec::new();
    for (category_idx, (category_name, tools)) in CATALOG.iter().enumerate() {
        let category = db.categories().create(category_name).await?;

        for (tool_idx, tool_name) in tools.iter().enumerate() {
            let seed = category_idx * 10 + tool_idx;
            let tool = db
                .tools()
                .create(&NewTool {
                    name: tool_name.to_string(),
                    category_id: category.id.clone(),
                    daily_price_cents: 3_000 + ((seed * 3_700) % 45_000) as i64,
                    quantity_total: 1 + (seed % 12) as i64,
                })
                .await?;
            tool_ids.push(tool.id);
        }
    }
    println!("✓ Created {} tools in {} categories", tool_ids.len(), CATALOG.len());

    // Customers
    let mut customer_ids = Vec::with_capacity(customer_count);
    for n in 0..customer_count {
        let customer = db
            .customers()
            .create(&NewCustomer {
                name: format!(
                    "{} {}",
                    FIRST_NAMES[n % FIRST_NAMES.len()],
                    LAST_NAMES[(n * 3) % LAST_NAMES.len()]
                ),
                phone: format!("+99890{:07}", 1_000_000 + n * 7_919),
                address: format!("Chilonzor {}, Tashkent", 1 + n % 25),
            })
            .await?;
        customer_ids.push(customer.id);
    }
    println!("✓ Created {} customers", customer_ids.len());

    // Rentals
    let today = SystemClock.today();
    let mut active = 0;
    let mut completed = 0;
    for (n, customer_id) in customer_ids.iter().enumerate() {
        if n % 3 != 0 && n % 5 != 0 {
            continue;
        }

        let started = today - Duration::days((n % 10) as i64);
        let rental = db.rentals().create(customer_id, started).await?;

        for k in 0..=(n % 3) {
            let tool_id = &tool_ids[(n * 7 + k * 5) % tool_ids.len()];
            if let Err(e) = db.rentals().add_item(&rental.id, tool_id, 1).await {
                eprintln!("  Skipped item on rental {}: {}", rental.id, e);
            }
        }

        if n % 5 == 0 {
            db.rentals().complete(&rental.id).await?;
            completed += 1;
        } else {
            active += 1;
        }
    }
    println!("✓ Created {} active and {} completed rentals", active, completed);

    let stats = db.dashboard().stats().await?;

    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "tools": stats.total_tools,
            "available": stats.total_available,
            "committed": stats.total_committed,
            "active_rentals": stats.active_rentals,
        }))?
    );

    db.close().await;
    Ok(())
}
