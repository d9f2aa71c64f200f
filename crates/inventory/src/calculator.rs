//! Availability calculator: on-hand minus allocated minus reserved, floored at zero.

use std::collections::HashMap;

use stockwise_core::ItemId;
use stockwise_core::entity::distinct_by_id;

use crate::model::StockRecord;

/// On-hand and allocated totals over a set of stock records.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct StockTotals {
    pub on_hand: i64,
    pub allocated: i64,
}

impl StockTotals {
    /// Sum both quantities, counting each stock record once even if it appears
    /// several times in `stocks`. Sums saturate at `i64::MAX`.
    pub fn of(stocks: &[StockRecord]) -> Self {
        distinct_by_id(stocks).fold(Self::default(), |acc, stock| Self {
            on_hand: acc.on_hand.saturating_add(stock.quantity_on_hand()),
            allocated: acc.allocated.saturating_add(stock.quantity_allocated()),
        })
    }

    pub fn available(&self, reserved_quantity: i64) -> i64 {
        self.on_hand
            .saturating_sub(self.allocated)
            .saturating_sub(reserved_quantity)
            .max(0)
    }
}

/// Net available quantity for `stocks` after subtracting `reserved_quantity`.
///
/// Empty input yields 0.
pub fn compute_available(stocks: &[StockRecord], reserved_quantity: i64) -> i64 {
    StockTotals::of(stocks).available(reserved_quantity)
}

/// True iff at least one record has on-hand above allocated. Reservations are
/// not considered.
pub fn any_available(stocks: &[StockRecord]) -> bool {
    stocks.iter().any(|stock| stock.available_quantity() > 0)
}

/// Group a flat stock lookup result by owning item, preserving row order within
/// each item.
pub fn group_by_item(
    stocks: impl IntoIterator<Item = StockRecord>,
) -> HashMap<ItemId, Vec<StockRecord>> {
    let mut grouped: HashMap<ItemId, Vec<StockRecord>> = HashMap::new();
    for stock in stocks {
        grouped.entry(stock.item_id()).or_default().push(stock);
    }
    grouped
}
