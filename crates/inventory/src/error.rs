//! The insufficiency signal handed to the failure consumer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockwise_core::ItemId;

use crate::model::Item;

/// One item that cannot be supplied in the requested quantity.
///
/// `available_quantity` is the best-known available amount; it is 0 when no stock
/// record serves the item at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsufficiencyRecord {
    pub item: Item,
    pub available_quantity: i64,
    pub requested_quantity: i64,
}

/// Requested quantity cannot be met for one or more items.
///
/// Covers both "no stock record exists" and "not enough stock"; the former is
/// reported with `available_quantity = 0`. Records keep the order in which items
/// were supplied.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("insufficient stock for {} item(s)", .records.len())]
pub struct InsufficientStock {
    records: Vec<InsufficiencyRecord>,
}

impl InsufficientStock {
    pub fn new(records: Vec<InsufficiencyRecord>) -> Self {
        Self { records }
    }

    pub fn single(item: Item, available_quantity: i64, requested_quantity: i64) -> Self {
        Self::new(vec![InsufficiencyRecord {
            item,
            available_quantity,
            requested_quantity,
        }])
    }

    pub fn records(&self) -> &[InsufficiencyRecord] {
        &self.records
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.records.iter().map(|r| r.item.id).collect()
    }
}

/// Result type for sufficiency checks.
pub type AvailabilityResult<T> = Result<T, InsufficientStock>;
