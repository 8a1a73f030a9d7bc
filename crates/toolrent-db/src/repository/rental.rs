//! # Rental Repository
//!
//! The rental ledger: rentals, their line items, and the stock those
//! items hold.
//!
//! ## Rental Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Rental Lifecycle                                  │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create() → Rental { status: Active, total: 0 }                 │
//! │                                                                         │
//! │  2. ADD / REMOVE ITEMS (active only)                                   │
//! │     └── add_item()    → stock −q, line item +q, recompute total        │
//! │     └── remove_item() → stock +q, line item gone, recompute total      │
//! │                                                                         │
//! │  3. SETTLE                                                             │
//! │     └── complete() → Completed, end_date = today, stock returned       │
//! │     └── cancel()   → Cancelled, end_date = today, stock returned       │
//! │                                                                         │
//! │  4. (ANY TIME) DELETE                                                  │
//! │     └── delete() → stock returned if still active, rows removed        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transactions
//! Every mutating operation is one transaction whose first statement
//! writes the rental row. SQLite hands out the write lock at that point,
//! so concurrent ledger calls queue (up to the busy timeout) instead of
//! reading stale stock. Stock counters only move through relative,
//! guarded updates. Any error drops the transaction and rolls it back.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use tracing::{debug, info};

use toolrent_core::billing::{billed_days, item_charge, rental_total};
use toolrent_core::stock::{check_reservation, release_all, StockMovement};
use toolrent_core::validation::{validate_line_quantity, validate_quantity, validate_start_date};
use toolrent_core::{
    Clock, CoreError, CoreResult, Rental, RentalDetail, RentalItem, RentalLine, RentalStatus, Tool,
};

use super::generate_id;
use super::tool::TOOL_COLUMNS;
use crate::error::{DbError, DbResult};

pub(crate) const RENTAL_COLUMNS: &str =
    "id, customer_id, start_date, end_date, total_cents, status, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, rental_id, tool_id, quantity, daily_rate_cents, created_at";

/// A line item joined with its tool's name.
#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    #[sqlx(flatten)]
    item: RentalItem,
    tool_name: String,
}

/// Repository for the rental ledger.
///
/// ## Usage
/// ```rust,ignore
/// let ledger = db.rentals();
/// let rental = ledger.create(&customer.id, today).await?;
/// ledger.add_item(&rental.id, &drill.id, 2).await?;
/// let rental = ledger.complete(&rental.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct RentalRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl RentalRepository {
    /// Creates a new RentalRepository.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        RentalRepository { pool, clock }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a rental by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Rental>> {
        let rental = sqlx::query_as::<_, Rental>(&format!(
            "SELECT {} FROM rentals WHERE id = ?1",
            RENTAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rental)
    }

    /// Gets all items for a rental in the order they were added.
    pub async fn get_items(&self, rental_id: &str) -> DbResult<Vec<RentalItem>> {
        let mut conn = self.pool.acquire().await?;
        load_items(&mut conn, rental_id).await
    }

    /// Gets a rental with its customer name and priced lines.
    ///
    /// Line totals use the billing period as of today; the rental total is
    /// the stored value.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<RentalDetail>> {
        let Some(rental) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let customer_name: String =
            sqlx::query_scalar("SELECT name FROM customers WHERE id = ?1")
                .bind(&rental.customer_id)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as::<_, LineRow>(
            r#"
            SELECT
                ri.id, ri.rental_id, ri.tool_id, ri.quantity,
                ri.daily_rate_cents, ri.created_at,
                t.name AS tool_name
            FROM rental_items ri
            JOIN tools t ON t.id = ri.tool_id
            WHERE ri.rental_id = ?1
            ORDER BY ri.created_at, ri.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let days = billed_days(&rental, self.clock.today());
        let lines = rows
            .into_iter()
            .map(|row| RentalLine {
                line_total_cents: item_charge(&row.item, days).cents(),
                item: row.item,
                tool_name: row.tool_name,
            })
            .collect();

        Ok(Some(RentalDetail {
            rental,
            customer_name,
            lines,
            billed_days: days,
        }))
    }

    /// Lists rentals newest first, optionally only those in `status`.
    pub async fn list(&self, status: Option<RentalStatus>) -> DbResult<Vec<Rental>> {
        let rentals = sqlx::query_as::<_, Rental>(&format!(
            r#"
            SELECT {} FROM rentals
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY created_at DESC, id DESC
            "#,
            RENTAL_COLUMNS
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(rentals)
    }

    /// The `limit` most recently created rentals.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Rental>> {
        let rentals = sqlx::query_as::<_, Rental>(&format!(
            "SELECT {} FROM rentals ORDER BY created_at DESC, id DESC LIMIT ?1",
            RENTAL_COLUMNS
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rentals)
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Opens a rental for a customer.
    ///
    /// ## Errors
    /// - `Validation` if `start_date` is after today
    /// - `NotFound` if the customer doesn't exist
    pub async fn create(&self, customer_id: &str, start_date: NaiveDate) -> DbResult<Rental> {
        let now = self.clock.now();
        validate_start_date(start_date, self.clock.today())?;

        let rental = Rental {
            id: generate_id(),
            customer_id: customer_id.to_string(),
            start_date,
            end_date: None,
            total_cents: 0,
            status: RentalStatus::Active,
            created_at: now,
            updated_at: now,
        };

        // The customer check and the insert are one statement
        let inserted = sqlx::query(
            r#"
            INSERT INTO rentals (
                id, customer_id, start_date, end_date,
                total_cents, status, created_at, updated_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
            WHERE EXISTS (SELECT 1 FROM customers WHERE id = ?2)
            "#,
        )
        .bind(&rental.id)
        .bind(&rental.customer_id)
        .bind(rental.start_date)
        .bind(rental.end_date)
        .bind(rental.total_cents)
        .bind(rental.status)
        .bind(rental.created_at)
        .bind(rental.updated_at)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(CoreError::not_found("Customer", customer_id).into());
        }

        info!(id = %rental.id, customer_id = %customer_id, start = %start_date, "Rental created");
        Ok(rental)
    }

    /// Puts `quantity` units of a tool on an active rental.
    ///
    /// ## What This Does (one transaction)
    /// 1. Takes `quantity` off the tool's shelf stock
    /// 2. Adds a line item at the tool's current price, or grows the
    ///    existing line for that tool (its rate snapshot is kept)
    /// 3. Recomputes the rental total
    ///
    /// ## Errors
    /// - `Validation` for a non-positive quantity, a line that would grow
    ///   past `MAX_ITEM_QUANTITY`, an inactive tool or insufficient stock
    /// - `NotFound` for an unknown rental or tool
    /// - `InvalidState` if the rental is not active
    pub async fn add_item(
        &self,
        rental_id: &str,
        tool_id: &str,
        quantity: i64,
    ) -> DbResult<RentalItem> {
        validate_quantity(quantity)?;

        let today = self.clock.today();
        let now = self.clock.now();

        let mut tx = self.pool.begin().await?;

        let mut rental = lock_rental(&mut tx, rental_id, now).await?;
        require_active(&rental, "add items to")?;

        let tool = sqlx::query_as::<_, Tool>(&format!(
            "SELECT {} FROM tools WHERE id = ?1",
            TOOL_COLUMNS
        ))
        .bind(tool_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::not_found("Tool", tool_id))?;

        let on_line: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM rental_items WHERE rental_id = ?1 AND tool_id = ?2",
        )
        .bind(rental_id)
        .bind(tool_id)
        .fetch_one(&mut *tx)
        .await?;
        validate_line_quantity(on_line, quantity)?;

        let reserved = sqlx::query(
            r#"
            UPDATE tools SET
                quantity_available = quantity_available - ?2,
                updated_at = ?3
            WHERE id = ?1 AND is_active = 1 AND quantity_available >= ?2
            "#,
        )
        .bind(tool_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if reserved.rows_affected() == 0 {
            return Err(reservation_refused(&mut tx, tool, quantity).await);
        }

        let item = sqlx::query_as::<_, RentalItem>(&format!(
            r#"
            INSERT INTO rental_items (id, rental_id, tool_id, quantity, daily_rate_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (rental_id, tool_id)
            DO UPDATE SET quantity = quantity + excluded.quantity
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(generate_id())
        .bind(rental_id)
        .bind(tool_id)
        .bind(quantity)
        .bind(tool.daily_price_cents)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        recalculate(&mut tx, &mut rental, today, now).await?;

        tx.commit().await?;

        info!(
            rental_id = %rental_id,
            tool_id = %tool_id,
            quantity = quantity,
            line_quantity = item.quantity,
            total_cents = rental.total_cents,
            "Item added to rental"
        );
        Ok(item)
    }

    /// Takes a line item off an active rental and puts its stock back.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown rental, or an item that isn't on it
    /// - `InvalidState` if the rental is not active
    pub async fn remove_item(&self, rental_id: &str, item_id: &str) -> DbResult<()> {
        let today = self.clock.today();
        let now = self.clock.now();

        let mut tx = self.pool.begin().await?;

        let mut rental = lock_rental(&mut tx, rental_id, now).await?;
        require_active(&rental, "remove items from")?;

        let item = sqlx::query_as::<_, RentalItem>(&format!(
            "DELETE FROM rental_items WHERE id = ?1 AND rental_id = ?2 RETURNING {}",
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .bind(rental_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::not_found("RentalItem", item_id))?;

        apply_movements(&mut tx, &release_all([&item]), now).await?;
        recalculate(&mut tx, &mut rental, today, now).await?;

        tx.commit().await?;

        info!(
            rental_id = %rental_id,
            tool_id = %item.tool_id,
            quantity = item.quantity,
            total_cents = rental.total_cents,
            "Item removed from rental"
        );
        Ok(())
    }

    /// Completes an active rental: the tools came back.
    ///
    /// Sets `end_date` to today, returns every committed unit to stock and
    /// recomputes the total over the now fixed period.
    pub async fn complete(&self, rental_id: &str) -> DbResult<Rental> {
        self.settle(rental_id, RentalStatus::Completed, "complete").await
    }

    /// Cancels an active rental.
    ///
    /// Same stock and date handling as [`complete`](Self::complete).
    pub async fn cancel(&self, rental_id: &str) -> DbResult<Rental> {
        self.settle(rental_id, RentalStatus::Cancelled, "cancel").await
    }

    async fn settle(
        &self,
        rental_id: &str,
        next: RentalStatus,
        operation: &'static str,
    ) -> DbResult<Rental> {
        let today = self.clock.today();
        let now = self.clock.now();

        let mut tx = self.pool.begin().await?;

        let mut rental = lock_rental(&mut tx, rental_id, now).await?;
        if !rental.status.can_transition_to(next) {
            return Err(invalid_status(&rental, operation).into());
        }

        let items = load_items(&mut tx, rental_id).await?;
        let movements = release_all(&items);
        apply_movements(&mut tx, &movements, now).await?;

        sqlx::query("UPDATE rentals SET status = ?2, end_date = ?3 WHERE id = ?1")
            .bind(rental_id)
            .bind(next)
            .bind(today)
            .execute(&mut *tx)
            .await?;
        rental.status = next;
        rental.end_date = Some(today);

        recalculate(&mut tx, &mut rental, today, now).await?;

        tx.commit().await?;

        info!(
            id = %rental_id,
            status = %next,
            tools_returned = movements.len(),
            total_cents = rental.total_cents,
            "Rental settled"
        );
        Ok(rental)
    }

    /// Deletes a rental and its line items.
    ///
    /// An active rental hands its committed stock back first. A completed or
    /// cancelled one already did, so stock is left alone.
    pub async fn delete(&self, rental_id: &str) -> DbResult<()> {
        let now = self.clock.now();

        let mut tx = self.pool.begin().await?;

        let rental = lock_rental(&mut tx, rental_id, now).await?;

        let mut released = 0;
        if rental.is_active() {
            let items = load_items(&mut tx, rental_id).await?;
            let movements = release_all(&items);
            apply_movements(&mut tx, &movements, now).await?;
            released = movements.len();
        }

        sqlx::query("DELETE FROM rentals WHERE id = ?1")
            .bind(rental_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %rental_id, status = %rental.status, tools_returned = released, "Rental deleted");
        Ok(())
    }

    /// Moves a rental's start date.
    ///
    /// Allowed in any status. The total is recomputed only when the date
    /// actually changes.
    ///
    /// ## Errors
    /// - `Validation` if `start_date` is after today
    /// - `NotFound` for an unknown rental
    pub async fn edit_start_date(&self, rental_id: &str, start_date: NaiveDate) -> DbResult<Rental> {
        let today = self.clock.today();
        let now = self.clock.now();
        validate_start_date(start_date, today)?;

        let mut tx = self.pool.begin().await?;

        let mut rental = lock_rental(&mut tx, rental_id, now).await?;

        if rental.start_date != start_date {
            sqlx::query("UPDATE rentals SET start_date = ?2 WHERE id = ?1")
                .bind(rental_id)
                .bind(start_date)
                .execute(&mut *tx)
                .await?;
            rental.start_date = start_date;

            recalculate(&mut tx, &mut rental, today, now).await?;

            debug!(id = %rental_id, start = %start_date, total_cents = rental.total_cents, "Start date changed");
        }

        tx.commit().await?;
        Ok(rental)
    }

    /// Recomputes and stores a rental's total as of today.
    ///
    /// Idempotent while nothing else changes.
    pub async fn recalculate_total(&self, rental_id: &str) -> DbResult<Rental> {
        let today = self.clock.today();
        let now = self.clock.now();

        let mut tx = self.pool.begin().await?;
        let mut rental = lock_rental(&mut tx, rental_id, now).await?;
        recalculate(&mut tx, &mut rental, today, now).await?;
        tx.commit().await?;

        Ok(rental)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Writes the rental row (taking the database write lock) and returns it.
async fn lock_rental(
    conn: &mut SqliteConnection,
    rental_id: &str,
    now: DateTime<Utc>,
) -> DbResult<Rental> {
    sqlx::query_as::<_, Rental>(&format!(
        "UPDATE rentals SET updated_at = ?2 WHERE id = ?1 RETURNING {}",
        RENTAL_COLUMNS
    ))
    .bind(rental_id)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| CoreError::not_found("Rental", rental_id).into())
}

fn invalid_status(rental: &Rental, operation: &'static str) -> CoreError {
    CoreError::InvalidRentalStatus {
        rental_id: rental.id.clone(),
        status: rental.status,
        operation,
    }
}

fn require_active(rental: &Rental, operation: &'static str) -> CoreResult<()> {
    if rental.is_active() {
        Ok(())
    } else {
        Err(invalid_status(rental, operation))
    }
}

/// Explains why the guarded stock update matched no row, from the tool as
/// it is now.
async fn reservation_refused(conn: &mut SqliteConnection, read: Tool, quantity: i64) -> DbError {
    let current = sqlx::query_as::<_, Tool>(&format!(
        "SELECT {} FROM tools WHERE id = ?1",
        TOOL_COLUMNS
    ))
    .bind(&read.id)
    .fetch_optional(&mut *conn)
    .await;

    let tool = match current {
        Ok(Some(tool)) => tool,
        Ok(None) => return CoreError::not_found("Tool", read.id).into(),
        Err(e) => return e.into(),
    };

    match check_reservation(&tool, quantity) {
        Err(e) => e.into(),
        Ok(()) => CoreError::InsufficientStock {
            tool: tool.name,
            available: tool.quantity_available,
            requested: quantity,
        }
        .into(),
    }
}

async fn load_items(conn: &mut SqliteConnection, rental_id: &str) -> DbResult<Vec<RentalItem>> {
    let items = sqlx::query_as::<_, RentalItem>(&format!(
        "SELECT {} FROM rental_items WHERE rental_id = ?1 ORDER BY created_at, id",
        ITEM_COLUMNS
    ))
    .bind(rental_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

async fn apply_movements(
    conn: &mut SqliteConnection,
    movements: &[StockMovement],
    now: DateTime<Utc>,
) -> DbResult<()> {
    for movement in movements {
        debug!(tool_id = %movement.tool_id, delta = movement.delta, "Moving stock");

        let result = sqlx::query(
            r#"
            UPDATE tools SET
                quantity_available = quantity_available + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(&movement.tool_id)
        .bind(movement.delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Tool", movement.tool_id.as_str()));
        }
    }

    Ok(())
}

/// Recomputes `rental.total_cents` from its stored items and writes it back.
///
/// Callers set `rental`'s dates and status before calling.
pub(crate) async fn recalculate(
    conn: &mut SqliteConnection,
    rental: &mut Rental,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let items = load_items(conn, &rental.id).await?;
    let total = rental_total(&items, billed_days(rental, today));

    sqlx::query("UPDATE rentals SET total_cents = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(&rental.id)
        .bind(total.cents())
        .bind(now)
        .execute(&mut *conn)
        .await?;

    rental.total_cents = total.cents();
    rental.updated_at = now;
    Ok(())
}
