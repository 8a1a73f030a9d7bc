//! # Stock Reservation Rules
//!
//! How quantity moves between "available" and "committed".
//!
//! ## Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation            available           line item                     │
//! │  ──────────────────   ─────────────────   ───────────────────────────   │
//! │  add_item(q)          − q                 + q (new row or merged)       │
//! │  remove_item          + item.quantity     row deleted                   │
//! │  complete_rental      + every item qty    rows kept (billing history)   │
//! │  cancel_rental        + every item qty    rows kept                     │
//! │  delete active rental + every item qty    rows deleted (cascade)        │
//! │  delete settled       no change           rows deleted (cascade)        │
//! │  admin total edit     + (new − old)       no change                     │
//! │                                                                         │
//! │  Invariant: committed = total − available = Σ qty on ACTIVE rentals     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database layer applies each movement as a relative update in the
//! same transaction as the paired line-item change.

use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};
use crate::types::{RentalItem, Tool};
use crate::validation::validate_quantity;

/// A signed change to one tool's `quantity_available`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    pub tool_id: String,
    /// Positive returns stock to the shelf, negative commits it.
    pub delta: i64,
}

/// Checks that `quantity` units of `tool` may be committed to a rental.
///
/// ## Errors
/// - `Validation` if the quantity is not positive or too large
/// - `ToolInactive` if the tool is switched off
/// - `InsufficientStock` if fewer units are on the shelf
pub fn check_reservation(tool: &Tool, quantity: i64) -> CoreResult<()> {
    validate_quantity(quantity)?;

    if !tool.is_active {
        return Err(CoreError::ToolInactive {
            tool: tool.name.clone(),
        });
    }

    if tool.quantity_available < quantity {
        return Err(CoreError::InsufficientStock {
            tool: tool.name.clone(),
            available: tool.quantity_available,
            requested: quantity,
        });
    }

    Ok(())
}

/// Movements that hand back everything `items` hold, one per tool.
///
/// Items of the same tool are merged so each tool row is touched once.
/// Output is ordered by tool id.
pub fn release_all<'a, I>(items: I) -> Vec<StockMovement>
where
    I: IntoIterator<Item = &'a RentalItem>,
{
    let mut per_tool: BTreeMap<&str, i64> = BTreeMap::new();
    for item in items {
        *per_tool.entry(item.tool_id.as_str()).or_insert(0) += item.quantity;
    }

    per_tool
        .into_iter()
        .filter(|(_, qty)| *qty != 0)
        .map(|(tool_id, qty)| StockMovement {
            tool_id: tool_id.to_string(),
            delta: qty,
        })
        .collect()
}

/// New `quantity_available` after an administrative change of the total.
///
/// The committed amount is preserved. Cutting the total below what is
/// committed drives availability negative; that is accepted as an
/// override and not validated here.
///
/// ## Example
/// ```rust
/// use toolrent_core::stock::available_after_total_change;
///
/// // 10 owned, 4 on the shelf (6 out) → now 15 owned
/// assert_eq!(available_after_total_change(10, 4, 15), 9);
/// ```
#[inline]
pub fn available_after_total_change(old_total: i64, old_available: i64, new_total: i64) -> i64 {
    old_available + (new_total - old_total)
}

/// Whether the tool's counters satisfy `0 ≤ available ≤ total`.
#[inline]
pub fn is_consistent(tool: &Tool) -> bool {
    tool.quantity_available >= 0 && tool.quantity_available <= tool.quantity_total
}
