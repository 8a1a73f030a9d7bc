//! # Category Repository
//!
//! Database operations for tool categories.

use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

use toolrent_core::validation::validate_category_name;
use toolrent_core::{Clock, CoreError, ToolCategory};

use super::generate_id;
use crate::error::{DbError, DbResult};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        CategoryRepository { pool, clock }
    }

    /// Creates a category.
    pub async fn create(&self, name: &str) -> DbResult<ToolCategory> {
        validate_category_name(name)?;

        let category = ToolCategory {
            id: generate_id(),
            name: name.trim().to_string(),
            created_at: self.clock.now(),
        };

        debug!(id = %category.id, name = %category.name, "Creating category");

        sqlx::query("INSERT INTO tool_categories (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(category.created_at)
            .execute(&self.pool)
            .await?;

        Ok(category)
    }

    /// Gets a category by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ToolCategory>> {
        let category = sqlx::query_as::<_, ToolCategory>(
            "SELECT id, name, created_at FROM tool_categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Lists all categories by name.
    pub async fn list(&self) -> DbResult<Vec<ToolCategory>> {
        let categories = sqlx::query_as::<_, ToolCategory>(
            "SELECT id, name, created_at FROM tool_categories ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Deletes a category that no tool references.
    ///
    /// ## Errors
    /// - `Conflict` (DeleteBlocked) while any tool is in the category
    /// - `NotFound` if the category doesn't exist
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        // The guard and the delete are one statement
        let result = sqlx::query(
            r#"
            DELETE FROM tool_categories
            WHERE id = ?1
              AND NOT EXISTS (SELECT 1 FROM tools WHERE category_id = ?1)
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            info!(id = %id, "Category deleted");
            return Ok(());
        }

        let tools: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tools WHERE category_id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        if tools > 0 {
            return Err(CoreError::DeleteBlocked {
                entity: "Category",
                id: id.to_string(),
                reason: format!("{} tool(s) still in this category", tools),
            }
            .into());
        }

        Err(DbError::not_found("Category", id))
    }
}
