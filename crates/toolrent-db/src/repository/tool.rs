//! # Tool Repository
//!
//! Database operations for the tool catalog.
//!
//! ## Key Operations
//! - CRUD operations
//! - Administrative stock-total edits
//! - Guarded deletion
//!
//! ## Stock Counters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Who writes quantity_available?                                         │
//! │                                                                         │
//! │  create()            = quantity_total                                   │
//! │  update() total edit += new_total - old_total   (this file)            │
//! │  rental ledger       -= / += line quantities   (rental.rs)             │
//! │                                                                         │
//! │  Every write is relative (SET x = x + ?), never an absolute value      │
//! │  computed from an earlier read, so no update is lost.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

use toolrent_core::validation::{validate_price_cents, validate_quantity_total, validate_tool_name};
use toolrent_core::{stock, Clock, CoreError, NewTool, Rental, Tool, ToolUpdate};

use super::generate_id;
use super::rental::{recalculate, RENTAL_COLUMNS};
use crate::error::{DbError, DbResult};

pub(crate) const TOOL_COLUMNS: &str = "id, category_id, name, daily_price_cents, quantity_total, \
     quantity_available, is_active, created_at, updated_at";

/// Repository for tool database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.tools();
/// let drill = repo.create(&NewTool { .. }).await?;
/// let rentable = repo.list_rentable().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ToolRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl ToolRepository {
    /// Creates a new ToolRepository.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        ToolRepository { pool, clock }
    }

    /// Creates a tool with all of its stock on the shelf.
    ///
    /// ## Errors
    /// - `Validation` for a bad name, negative price or negative total
    /// - `NotFound` if the category doesn't exist
    pub async fn create(&self, new: &NewTool) -> DbResult<Tool> {
        validate_tool_name(&new.name)?;
        validate_price_cents(new.daily_price_cents)?;
        validate_quantity_total(new.quantity_total)?;

        self.ensure_category(&new.category_id).await?;

        let now = self.clock.now();
        let tool = Tool {
            id: generate_id(),
            category_id: new.category_id.clone(),
            name: new.name.trim().to_string(),
            daily_price_cents: new.daily_price_cents,
            quantity_total: new.quantity_total,
            quantity_available: new.quantity_total,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %tool.id, name = %tool.name, total = tool.quantity_total, "Creating tool");

        sqlx::query(
            r#"
            INSERT INTO tools (
                id, category_id, name, daily_price_cents,
                quantity_total, quantity_available, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&tool.id)
        .bind(&tool.category_id)
        .bind(&tool.name)
        .bind(tool.daily_price_cents)
        .bind(tool.quantity_total)
        .bind(tool.quantity_available)
        .bind(tool.is_active)
        .bind(tool.created_at)
        .bind(tool.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(tool)
    }

    /// Gets a tool by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Tool>> {
        let tool = sqlx::query_as::<_, Tool>(&format!(
            "SELECT {} FROM tools WHERE id = ?1",
            TOOL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tool)
    }

    /// Lists every tool, active or not, by name.
    pub async fn list(&self) -> DbResult<Vec<Tool>> {
        let tools = sqlx::query_as::<_, Tool>(&format!(
            "SELECT {} FROM tools ORDER BY name, id",
            TOOL_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(tools)
    }

    /// Lists tools that can go on a rental now: active with stock on the shelf.
    pub async fn list_rentable(&self) -> DbResult<Vec<Tool>> {
        let tools = sqlx::query_as::<_, Tool>(&format!(
            "SELECT {} FROM tools WHERE is_active = 1 AND quantity_available > 0 ORDER BY name, id",
            TOOL_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(tools)
    }

    /// Administrative edit.
    ///
    /// ## Stock Total Change
    /// A new `quantity_total` shifts `quantity_available` by the same delta
    /// in the same statement, so the committed amount stays put:
    /// ```text
    /// total 10, available 4 (6 out)  ──total=15──►  total 15, available 9
    /// total 10, available 4 (6 out)  ──total=3───►  total 3,  available -3
    /// ```
    /// Cutting below the committed amount is accepted as an override.
    ///
    /// Price changes never touch existing line items.
    pub async fn update(&self, id: &str, changes: &ToolUpdate) -> DbResult<Tool> {
        if let Some(name) = &changes.name {
            validate_tool_name(name)?;
        }
        if let Some(price) = changes.daily_price_cents {
            validate_price_cents(price)?;
        }
        if let Some(total) = changes.quantity_total {
            validate_quantity_total(total)?;
        }
        if let Some(category_id) = &changes.category_id {
            self.ensure_category(category_id).await?;
        }

        debug!(id = %id, ?changes, "Updating tool");

        // SET expressions all read the pre-update row
        let tool = sqlx::query_as::<_, Tool>(&format!(
            r#"
            UPDATE tools SET
                name = COALESCE(?2, name),
                category_id = COALESCE(?3, category_id),
                daily_price_cents = COALESCE(?4, daily_price_cents),
                quantity_available = quantity_available + (COALESCE(?5, quantity_total) - quantity_total),
                quantity_total = COALESCE(?5, quantity_total),
                is_active = COALESCE(?6, is_active),
                updated_at = ?7
            WHERE id = ?1
            RETURNING {}
            "#,
            TOOL_COLUMNS
        ))
        .bind(id)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.category_id.as_deref())
        .bind(changes.daily_price_cents)
        .bind(changes.quantity_total)
        .bind(changes.is_active)
        .bind(self.clock.now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Tool", id))?;

        if !stock::is_consistent(&tool) {
            info!(
                id = %tool.id,
                total = tool.quantity_total,
                available = tool.quantity_available,
                "Stock total cut below committed quantity"
            );
        }

        Ok(tool)
    }

    /// Deletes a tool that is not out on any active rental.
    ///
    /// ## What This Does
    /// 1. Refuses with `Conflict` while an active rental holds the tool
    /// 2. Deletes the tool; its line items on settled rentals go with it
    /// 3. Recomputes the totals of those settled rentals
    ///
    /// All three steps commit together.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let today = self.clock.today();
        let now = self.clock.now();

        debug!(id = %id, "Deleting tool");

        let mut tx = self.pool.begin().await?;

        // Writing the row first takes the write lock before the guard reads
        let touched = sqlx::query("UPDATE tools SET updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(DbError::not_found("Tool", id));
        }

        let affected: Vec<Rental> = sqlx::query_as::<_, Rental>(&format!(
            r#"
            SELECT {} FROM rentals
            WHERE id IN (SELECT rental_id FROM rental_items WHERE tool_id = ?1)
            "#,
            RENTAL_COLUMNS
        ))
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let active = affected.iter().filter(|r| r.is_active()).count();
        if active > 0 {
            return Err(CoreError::DeleteBlocked {
                entity: "Tool",
                id: id.to_string(),
                reason: format!("on {} active rental(s)", active),
            }
            .into());
        }

        sqlx::query("DELETE FROM tools WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for mut rental in affected {
            recalculate(&mut tx, &mut rental, today, now).await?;
        }

        tx.commit().await?;

        info!(id = %id, "Tool deleted");
        Ok(())
    }

    /// Counts catalog tools.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tools")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn ensure_category(&self, category_id: &str) -> DbResult<()> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tool_categories WHERE id = ?1")
            .bind(category_id)
            .fetch_one(&self.pool)
            .await?;

        if exists == 0 {
            return Err(DbError::not_found("Category", category_id));
        }

        Ok(())
    }
}
