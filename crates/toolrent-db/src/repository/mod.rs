//! # Repository Module
//!
//! Database repository implementations for ToolRent.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  CLI command                                                           │
//! │       │                                                                 │
//! │       │  db.rentals().add_item(&rental_id, &tool_id, 3)                │
//! │       ▼                                                                 │
//! │  RentalRepository                                                      │
//! │  ├── BEGIN                                                              │
//! │  ├── lock rental row, check status                                     │
//! │  ├── guarded stock decrement on the tool                               │
//! │  ├── insert or merge the line item (rate snapshot)                     │
//! │  ├── recompute total (toolrent-core billing)                           │
//! │  └── COMMIT                                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CategoryRepository`](category::CategoryRepository) - Tool categories
//! - [`ToolRepository`](tool::ToolRepository) - Catalog and stock totals
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer registry
//! - [`RentalRepository`](rental::RentalRepository) - The rental ledger
//! - [`DashboardRepository`](dashboard::DashboardRepository) - Aggregates

pub mod category;
pub mod customer;
pub mod dashboard;
pub mod rental;
pub mod tool;

/// Helper to generate a new record ID.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
