//! Stock sufficiency checks (single item and bulk) and plain availability lookups.
//!
//! These checks read a snapshot and are an optimistic pre-check: two concurrent
//! checkouts can both pass against the same snapshot. The allocation writer must
//! enforce the oversell invariant at commit time (quantity-constrained update or a
//! row lock on the stock records); nothing here prevents overselling on its own.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use stockwise_core::{CheckoutLineId, ItemId};

use crate::calculator::compute_available;
use crate::config::AvailabilityConfig;
use crate::error::{AvailabilityResult, InsufficiencyRecord, InsufficientStock};
use crate::model::{CheckoutLine, Item, RequestedLine, StockRecord};
use crate::reservations::{ReservationAggregator, ReservationSource};

/// Entry point for availability questions at a fixed instant `now`.
#[derive(Debug, Clone)]
pub struct StockChecker<S> {
    reservations: S,
    now: DateTime<Utc>,
    config: AvailabilityConfig,
}

impl<S> StockChecker<S>
where
    S: ReservationSource,
{
    pub fn new(reservations: S, now: DateTime<Utc>, config: AvailabilityConfig) -> Self {
        Self {
            reservations,
            now,
            config,
        }
    }

    fn aggregator(&self) -> ReservationAggregator<'_, S> {
        ReservationAggregator::new(&self.reservations, self.now)
    }

    fn available_for(
        &self,
        stocks: &[StockRecord],
        check_reservations: bool,
        exclude_lines: &HashSet<CheckoutLineId>,
    ) -> i64 {
        let reserved = if self.config.should_check_reservations(check_reservations) {
            self.aggregator().sum_reserved(stocks, exclude_lines)
        } else {
            0
        };
        compute_available(stocks, reserved)
    }

    /// Fail unless `requested_quantity` of `item` can be supplied from `stocks`.
    ///
    /// Untracked items always pass. Tracked items with no stock record fail with
    /// an available quantity of 0.
    #[tracing::instrument(skip_all, fields(item = %item.id, requested = requested_quantity))]
    pub fn check_sufficient(
        &self,
        item: &Item,
        requested_quantity: u64,
        stocks: &[StockRecord],
        check_reservations: bool,
        exclude_lines: &HashSet<CheckoutLineId>,
    ) -> AvailabilityResult<()> {
        if !item.tracks_inventory {
            return Ok(());
        }
        let requested_quantity = i64::try_from(requested_quantity).unwrap_or(i64::MAX);

        if stocks.is_empty() {
            tracing::warn!("no stock record serves item");
            return Err(InsufficientStock::single(*item, 0, requested_quantity));
        }

        let available = self.available_for(stocks, check_reservations, exclude_lines);
        tracing::debug!(available, "computed available quantity");
        if requested_quantity > available {
            tracing::warn!(available, "insufficient stock");
            return Err(InsufficientStock::single(*item, available, requested_quantity));
        }
        Ok(())
    }

    /// Check every requested line at once, collecting all shortfalls.
    ///
    /// With `replace == false` each line's quantity is added to what the checkout
    /// already holds for that item; with `replace == true` it is the final quantity.
    /// Reservations owned by `existing_lines` and by the requested lines' origin
    /// lines are not counted. An item without any stock record is always reported,
    /// tracked or not; the quantity comparison only applies to tracked items.
    #[tracing::instrument(skip_all, fields(lines = lines.len(), replace = replace))]
    pub fn check_sufficient_bulk(
        &self,
        lines: &[RequestedLine],
        stocks_by_item: &HashMap<ItemId, Vec<StockRecord>>,
        existing_lines: &[CheckoutLine],
        replace: bool,
        check_reservations: bool,
    ) -> AvailabilityResult<()> {
        let exclude_lines: HashSet<CheckoutLineId> = existing_lines
            .iter()
            .map(CheckoutLine::id)
            .chain(lines.iter().filter_map(RequestedLine::origin_line))
            .collect();

        let items: Vec<ItemId> = lines.iter().map(|line| line.item().id).collect();
        let reserved_by_item =
            self.reserved_by_item(&items, stocks_by_item, check_reservations, &exclude_lines);

        let mut existing_quantities: HashMap<ItemId, i64> = HashMap::new();
        for line in existing_lines {
            let total = existing_quantities.entry(line.item_id()).or_insert(0);
            *total = total.saturating_add(line.quantity());
        }

        let mut insufficient: Vec<InsufficiencyRecord> = Vec::new();
        for line in lines {
            let item = line.item();
            let mut quantity = line.quantity();
            if !replace {
                let existing = existing_quantities.get(&item.id).copied().unwrap_or(0);
                quantity = quantity.saturating_add(existing);
            }

            let stocks = stocks_for(stocks_by_item, &item.id);
            let reserved = reserved_by_item.get(&item.id).copied().unwrap_or(0);
            let available = compute_available(stocks, reserved);

            let short = if stocks.is_empty() {
                true
            } else {
                item.tracks_inventory && quantity > available
            };
            if short {
                insufficient.push(InsufficiencyRecord {
                    item,
                    available_quantity: available,
                    requested_quantity: quantity,
                });
            }
        }

        if insufficient.is_empty() {
            return Ok(());
        }
        tracing::warn!(items = insufficient.len(), "insufficient stock");
        Err(InsufficientStock::new(insufficient))
    }

    /// Current available quantity for `item`; 0 when no stock record exists.
    #[tracing::instrument(skip_all, fields(item = %item.id))]
    pub fn get_available(
        &self,
        item: &Item,
        stocks: &[StockRecord],
        check_reservations: bool,
        exclude_lines: &HashSet<CheckoutLineId>,
    ) -> i64 {
        if stocks.is_empty() {
            return 0;
        }
        let available = self.available_for(stocks, check_reservations, exclude_lines);
        tracing::debug!(available, "computed available quantity");
        available
    }

    /// Available quantity for each of `items`, with a single reservation lookup.
    /// Items without stock records map to 0.
    #[tracing::instrument(skip_all, fields(items = items.len()))]
    pub fn get_available_bulk(
        &self,
        items: &[Item],
        stocks_by_item: &HashMap<ItemId, Vec<StockRecord>>,
        check_reservations: bool,
        exclude_lines: &HashSet<CheckoutLineId>,
    ) -> HashMap<ItemId, i64> {
        let ids: Vec<ItemId> = items.iter().map(|item| item.id).collect();
        let reserved_by_item =
            self.reserved_by_item(&ids, stocks_by_item, check_reservations, exclude_lines);

        ids.into_iter()
            .map(|id| {
                let reserved = reserved_by_item.get(&id).copied().unwrap_or(0);
                (id, compute_available(stocks_for(stocks_by_item, &id), reserved))
            })
            .collect()
    }

    fn reserved_by_item(
        &self,
        items: &[ItemId],
        stocks_by_item: &HashMap<ItemId, Vec<StockRecord>>,
        check_reservations: bool,
        exclude_lines: &HashSet<CheckoutLineId>,
    ) -> HashMap<ItemId, i64> {
        if !self.config.should_check_reservations(check_reservations) {
            return HashMap::new();
        }

        let mut seen: HashSet<ItemId> = HashSet::new();
        let stocks: Vec<StockRecord> = items
            .iter()
            .filter(|id| seen.insert(**id))
            .flat_map(|id| stocks_for(stocks_by_item, id).iter().cloned())
            .collect();
        self.aggregator().sum_reserved_by_item(&stocks, exclude_lines)
    }
}

fn stocks_for<'a>(
    stocks_by_item: &'a HashMap<ItemId, Vec<StockRecord>>,
    item: &ItemId,
) -> &'a [StockRecord] {
    stocks_by_item.get(item).map(Vec::as_slice).unwrap_or(&[])
}
