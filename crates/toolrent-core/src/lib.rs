//! # toolrent-core: Pure Business Logic for ToolRent
//!
//! This crate holds the rules of the rental shop as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ToolRent Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              UI / request layer (toolrent-cli, web)             │   │
//! │  │   create rental ──► add items ──► complete ──► dashboard        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 toolrent-db (transactions)                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls                                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ toolrent-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │ billing │ │  stock  │ │  clock  │  │   │
//! │  │   │  Tool   │ │  Money  │ │  days   │ │ reserve │ │  today  │  │   │
//! │  │   │ Rental  │ │         │ │  total  │ │ release │ │         │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO WALL CLOCK READS IN RULES           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Tool, Customer, Rental, RentalItem, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`billing`] - Elapsed-days and rental charge calculation
//! - [`stock`] - Stock commitment rules shared by every ledger operation
//! - [`clock`] - Injected source of "now" and "today"
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use toolrent_core::billing::{elapsed_days, line_charge};
//! use toolrent_core::Money;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
//! let days = elapsed_days(start, Some(end), end);
//! assert_eq!(days, 5);
//!
//! // 2 drills at 150.00 a day for 5 days
//! let charge = line_charge(2, Money::from_cents(15_000), days);
//! assert_eq!(charge.cents(), 150_000);
//! ```

pub mod billing;
pub mod clock;
pub mod error;
pub mod money;
pub mod stock;
pub mod types;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

/// Maximum quantity of a single tool on one line item.
///
/// ## Business Reason
/// Guards against typos on the counter (1000 instead of 10).
/// Real stock levels are far below this.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Number of tools shown in the dashboard "popular tools" panel.
pub const DEFAULT_POPULAR_TOOLS: u32 = 4;

/// Number of rentals shown in the dashboard "recent rentals" panel.
pub const DEFAULT_RECENT_RENTALS: u32 = 5;
