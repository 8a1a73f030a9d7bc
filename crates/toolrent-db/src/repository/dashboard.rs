//! # Dashboard Queries
//!
//! Read-only aggregates for the shop's front page.
//!
//! ```text
//! total_tools         COUNT(tools)
//! total_available     Σ quantity_available
//! total_committed     Σ quantity_total − Σ quantity_available
//! active_rentals      COUNT(rentals WHERE active)
//! today_income        Σ total of active rentals created today
//! ```

use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

use toolrent_core::{Clock, DashboardStats, PopularTool};

use crate::error::DbResult;

/// Repository for dashboard aggregates.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl DashboardRepository {
    /// Creates a new DashboardRepository.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        DashboardRepository { pool, clock }
    }

    /// Counters shown on the dashboard.
    ///
    /// "Today" is the UTC calendar day of the injected clock; rentals are
    /// matched on the date part of their `created_at`.
    pub async fn stats(&self) -> DbResult<DashboardStats> {
        let today = self.clock.today().format("%Y-%m-%d").to_string();

        debug!(today = %today, "Loading dashboard stats");

        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM tools) AS total_tools,
                (SELECT COALESCE(SUM(quantity_available), 0) FROM tools) AS total_available,
                (SELECT COALESCE(SUM(quantity_total - quantity_available), 0) FROM tools)
                    AS total_committed,
                (SELECT COUNT(*) FROM rentals WHERE status = 'active') AS active_rentals,
                (SELECT COALESCE(SUM(total_cents), 0) FROM rentals
                    WHERE status = 'active' AND substr(created_at, 1, 10) = ?1)
                    AS today_income_cents
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    /// The `limit` tools referenced by the most line items.
    ///
    /// Ties are broken by name. Tools never rented are included with a
    /// count of zero when there is room.
    pub async fn popular_tools(&self, limit: u32) -> DbResult<Vec<PopularTool>> {
        let tools = sqlx::query_as::<_, PopularTool>(
            r#"
            SELECT
                t.id AS tool_id,
                t.name,
                COUNT(ri.id) AS rental_count,
                t.quantity_available,
                t.quantity_total
            FROM tools t
            LEFT JOIN rental_items ri ON ri.tool_id = t.id
            GROUP BY t.id
            ORDER BY rental_count DESC, t.name, t.id
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(tools)
    }
}
