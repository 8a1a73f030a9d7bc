//! # Customer Repository
//!
//! Database operations for the customer registry.

use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

use toolrent_core::validation::{validate_address, validate_customer_name, validate_phone};
use toolrent_core::{Clock, CoreError, Customer, NewCustomer};

use super::generate_id;
use crate::error::{DbError, DbResult};

const CUSTOMER_COLUMNS: &str = "id, name, phone, address, created_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

fn validate(input: &NewCustomer) -> DbResult<()> {
    validate_customer_name(&input.name)?;
    validate_phone(&input.phone)?;
    validate_address(&input.address)?;
    Ok(())
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        CustomerRepository { pool, clock }
    }

    /// Registers a customer.
    pub async fn create(&self, input: &NewCustomer) -> DbResult<Customer> {
        validate(input)?;

        let customer = Customer {
            id: generate_id(),
            name: input.name.trim().to_string(),
            phone: input.phone.trim().to_string(),
            address: input.address.trim().to_string(),
            created_at: self.clock.now(),
        };

        debug!(id = %customer.id, name = %customer.name, "Creating customer");

        sqlx::query(
            "INSERT INTO customers (id, name, phone, address, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE id = ?1",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists customers by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers ORDER BY name, id",
            CUSTOMER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Replaces a customer's contact details.
    pub async fn update(&self, id: &str, input: &NewCustomer) -> DbResult<Customer> {
        validate(input)?;

        debug!(id = %id, "Updating customer");

        let customer = sqlx::query_as::<_, Customer>(&format!(
            "UPDATE customers SET name = ?2, phone = ?3, address = ?4 WHERE id = ?1 RETURNING {}",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .bind(input.name.trim())
        .bind(input.phone.trim())
        .bind(input.address.trim())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", id))?;

        Ok(customer)
    }

    /// Deletes a customer with no active rental.
    ///
    /// Completed and cancelled rentals are removed with the customer.
    ///
    /// ## Errors
    /// - `Conflict` (DeleteBlocked) while the customer has an active rental
    /// - `NotFound` if the customer doesn't exist
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query(
            r#"
            DELETE FROM customers
            WHERE id = ?1
              AND NOT EXISTS (
                  SELECT 1 FROM rentals WHERE customer_id = ?1 AND status = 'active'
              )
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            info!(id = %id, "Customer deleted");
            return Ok(());
        }

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM rentals WHERE customer_id = ?1 AND status = 'active'",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if active > 0 {
            return Err(CoreError::DeleteBlocked {
                entity: "Customer",
                id: id.to_string(),
                reason: format!("{} active rental(s)", active),
            }
            .into());
        }

        Err(DbError::not_found("Customer", id))
    }
}
