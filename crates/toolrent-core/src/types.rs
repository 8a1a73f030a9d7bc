//! # Domain Types
//!
//! Core domain types used throughout ToolRent.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ToolCategory   │◄──│      Tool       │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, name       │   │  daily_price    │   │  name, phone    │       │
//! │  └─────────────────┘   │  quantity_total │   │  address        │       │
//! │                        │  quantity_avail │   └────────▲────────┘       │
//! │                        └────────▲────────┘            │                │
//! │                                 │ referenced          │ referenced     │
//! │                        ┌────────┴────────┐   ┌────────┴────────┐       │
//! │                        │   RentalItem    │──►│     Rental      │       │
//! │                        │  ─────────────  │   │  ─────────────  │       │
//! │                        │  quantity       │   │  start/end date │       │
//! │                        │  daily_rate     │   │  status, total  │       │
//! │                        │  (snapshot)     │   └─────────────────┘       │
//! │                        └─────────────────┘   owns its items (cascade)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary columns are stored as `*_cents` integers; accessor methods
//! return [`Money`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Catalog
// =============================================================================

/// A grouping of tools ("Power tools", "Ladders").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ToolCategory {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A rentable tool with finite stock.
///
/// ## Stock Counters
/// ```text
/// quantity_total      ─ units the shop owns
/// quantity_available  ─ units on the shelf right now
/// committed           ─ quantity_total - quantity_available (out on rentals)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Tool {
    pub id: String,
    pub category_id: String,
    pub name: String,
    /// Current catalog price per day. Line items copy it at add time.
    pub daily_price_cents: i64,
    pub quantity_total: i64,
    /// May go negative only through an administrative total reduction.
    pub quantity_available: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Tool {
    /// Returns the daily price as Money.
    #[inline]
    pub fn daily_price(&self) -> Money {
        Money::from_cents(self.daily_price_cents)
    }

    /// Units currently out on rentals.
    #[inline]
    pub fn committed(&self) -> i64 {
        self.quantity_total - self.quantity_available
    }

    /// Whether `quantity` units can be put on a rental right now.
    pub fn can_rent(&self, quantity: i64) -> bool {
        self.is_active && quantity > 0 && self.quantity_available >= quantity
    }
}

/// Input for creating a tool.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTool {
    pub name: String,
    pub category_id: String,
    pub daily_price_cents: i64,
    pub quantity_total: i64,
}

/// Administrative edit of a tool. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ToolUpdate {
    pub name: Option<String>,
    pub category_id: Option<String>,
    pub daily_price_cents: Option<i64>,
    pub quantity_total: Option<i64>,
    pub is_active: Option<bool>,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer of the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Input for creating or replacing a customer's details.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub address: String,
}

// =============================================================================
// Rental Status
// =============================================================================

/// Lifecycle status of a rental.
///
/// ```text
///           complete_rental
///  Active ──────────────────► Completed   (terminal)
///    │
///    │      cancel_rental
///    └──────────────────────► Cancelled   (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    /// Tools are out with the customer; billing days keep accruing.
    Active,
    /// Tools came back; billing period frozen at `end_date`.
    Completed,
    /// Rental was called off; stock released.
    Cancelled,
}

impl RentalStatus {
    /// Returns the lowercase name stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Active => "active",
            RentalStatus::Completed => "completed",
            RentalStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled rentals never change status again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RentalStatus::Active)
    }

    /// Whether the state machine allows `self → next`.
    pub fn can_transition_to(&self, next: RentalStatus) -> bool {
        matches!(
            (self, next),
            (RentalStatus::Active, RentalStatus::Completed)
                | (RentalStatus::Active, RentalStatus::Cancelled)
        )
    }
}

impl Default for RentalStatus {
    fn default() -> Self {
        RentalStatus::Active
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RentalStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(RentalStatus::Active),
            "completed" => Ok(RentalStatus::Completed),
            "cancelled" | "canceled" => Ok(RentalStatus::Cancelled),
            other => Err(ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!("unknown status '{}', expected active, completed or cancelled", other),
            }),
        }
    }
}

// =============================================================================
// Rental
// =============================================================================

/// A rental header: who rented, from when, how much so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Rental {
    pub id: String,
    pub customer_id: String,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    /// `None` while active; set when the rental is completed or cancelled.
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    /// Cached Σ quantity × daily_rate × billed days, rewritten on every change.
    pub total_cents: i64,
    pub status: RentalStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Rental {
    /// Returns the stored total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == RentalStatus::Active
    }
}

// =============================================================================
// Rental Item
// =============================================================================

/// One tool on a rental, at a rate frozen when it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RentalItem {
    pub id: String,
    pub rental_id: String,
    pub tool_id: String,
    pub quantity: i64,
    /// Price snapshot copied from `Tool.daily_price_cents`.
    pub daily_rate_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl RentalItem {
    /// Returns the snapshot rate as Money.
    #[inline]
    pub fn daily_rate(&self) -> Money {
        Money::from_cents(self.daily_rate_cents)
    }
}

/// A line item joined with its tool name and current line charge.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RentalLine {
    pub item: RentalItem,
    pub tool_name: String,
    pub line_total_cents: i64,
}

/// Everything a rental detail page shows.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RentalDetail {
    pub rental: Rental,
    pub customer_name: String,
    pub lines: Vec<RentalLine>,
    pub billed_days: i64,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Aggregate counters for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DashboardStats {
    /// Number of tool records in the catalog.
    pub total_tools: i64,
    /// Σ quantity_available.
    pub total_available: i64,
    /// Σ quantity_total − Σ quantity_available.
    pub total_committed: i64,
    pub active_rentals: i64,
    /// Σ total of active rentals created today.
    pub today_income_cents: i64,
}

/// A tool ranked by how many line items reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PopularTool {
    pub tool_id: String,
    pub name: String,
    pub rental_count: i64,
    pub quantity_available: i64,
    pub quantity_total: i64,
}
