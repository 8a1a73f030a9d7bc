//! # Validation Module
//!
//! Input validation utilities for ToolRent.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI forms                                                     │
//! │  ├── Basic format checks (empty, length, min=1)                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before any transaction opens)                   │
//! │  ├── Field rules, future start dates, quantities                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Ledger transaction (toolrent-db)                             │
//! │  ├── Stock availability, rental status                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: SQLite                                                       │
//! │  ├── NOT NULL / CHECK / FOREIGN KEY constraints                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a category name (1-100 characters).
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    validate_text("category name", name, 100)
}

/// Validates a tool name (1-200 characters).
///
/// ## Example
/// ```rust
/// use toolrent_core::validation::validate_tool_name;
///
/// assert!(validate_tool_name("Hammer drill").is_ok());
/// assert!(validate_tool_name("   ").is_err());
/// ```
pub fn validate_tool_name(name: &str) -> ValidationResult<()> {
    validate_text("tool name", name, 200)
}

/// Validates a customer name (1-200 characters).
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    validate_text("customer name", name, 200)
}

/// Validates a phone number.
///
/// ## Rules
/// - Required, at most 20 characters
/// - Digits, spaces and `+ - ( )` only, with at least one digit
///
/// ## Example
/// ```rust
/// use toolrent_core::validation::validate_phone;
///
/// assert!(validate_phone("+998901234567").is_ok());
/// assert!(validate_phone("call me").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    validate_text("phone", phone, 20)?;

    let phone = phone.trim();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '));

    if !allowed || !phone.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain digits and only + - ( ) or spaces".to_string(),
        });
    }

    Ok(())
}

/// Validates a postal address. May be empty, at most 500 characters.
pub fn validate_address(address: &str) -> ValidationResult<()> {
    if address.trim().chars().count() > 500 {
        return Err(ValidationError::TooLong {
            field: "address".to_string(),
            max: 500,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line-item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
///
/// Availability is checked later, inside the ledger transaction.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a line that already holds `existing` units after `added` more.
///
/// Adding a tool that is already on the rental grows its line, and the
/// grown line is held to the same cap as a fresh one.
pub fn validate_line_quantity(existing: i64, added: i64) -> ValidationResult<()> {
    validate_quantity(added)?;

    if existing.saturating_add(added) > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates the number of units a shop owns. Zero is allowed.
pub fn validate_quantity_total(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantity_total".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a daily price in the minor unit.
///
/// ## Example
/// ```rust
/// use toolrent_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(15_000).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "daily_price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Rejects a rental start date that lies after `today`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use toolrent_core::validation::validate_start_date;
///
/// let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
/// assert!(validate_start_date(today, today).is_ok());
/// assert!(validate_start_date(today.succ_opt().unwrap(), today).is_err());
/// ```
pub fn validate_start_date(start: NaiveDate, today: NaiveDate) -> ValidationResult<()> {
    if start > today {
        return Err(ValidationError::FutureDate {
            field: "start_date".to_string(),
            date: start,
            today,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_names() {
        assert!(validate_tool_name("Concrete mixer").is_ok());
        assert!(validate_tool_name("").is_err());
        assert!(validate_tool_name(&"A".repeat(201)).is_err());
        assert!(validate_category_name("Ladders").is_ok());
        assert!(validate_category_name(&"x".repeat(101)).is_err());
        assert!(validate_customer_name("Aziz Karimov").is_ok());
        assert!(validate_customer_name("  ").is_err());
    }

    #[test]
    fn test_name_length_counts_characters() {
        // 100 two-byte characters are within the limit
        assert!(validate_category_name(&"ў".repeat(100)).is_ok());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+998901234567").is_ok());
        assert!(validate_phone("(90) 123-45-67").is_ok());
        assert!(validate_phone("").is_err());
        assert!(validate_phone("+-()").is_err());
        assert!(validate_phone("90 123 45 67 ext").is_err());
        assert!(validate_phone(&"1".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("").is_ok());
        assert!(validate_address("Chilonzor 5, Tashkent").is_ok());
        assert!(validate_address(&"a".repeat(501)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_line_quantity() {
        assert!(validate_line_quantity(0, MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_line_quantity(MAX_ITEM_QUANTITY - 1, 1).is_ok());
        assert!(matches!(
            validate_line_quantity(MAX_ITEM_QUANTITY, 1),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_line_quantity(i64::MAX, 1).is_err());
        assert!(matches!(
            validate_line_quantity(3, 0),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_validate_quantity_total_and_price() {
        assert!(validate_quantity_total(0).is_ok());
        assert!(validate_quantity_total(-1).is_err());
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }

    #[test]
    fn test_validate_start_date() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(validate_start_date(today, today).is_ok());
        assert!(validate_start_date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), today).is_ok());
        assert!(matches!(
            validate_start_date(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(), today),
            Err(ValidationError::FutureDate { .. })
        ));
    }
}
