//! Reservation aggregation: how much stock active checkout holds are keeping back.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use stockwise_core::{CheckoutLineId, Entity, ItemId, StockId};

use crate::model::{Reservation, StockRecord};

/// Filter describing which reservations count against a set of stock records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationQuery {
    pub stock_ids: HashSet<StockId>,
    pub now: DateTime<Utc>,
    pub exclude_lines: HashSet<CheckoutLineId>,
}

impl ReservationQuery {
    pub fn new(
        stocks: &[StockRecord],
        now: DateTime<Utc>,
        exclude_lines: &HashSet<CheckoutLineId>,
    ) -> Self {
        Self {
            stock_ids: stocks.iter().map(|s| *s.id()).collect(),
            now,
            exclude_lines: exclude_lines.clone(),
        }
    }

    /// Held against one of the queried stocks, not yet expired, and not owned by
    /// an excluded checkout line. Exclusion is by line identity only.
    pub fn matches(&self, reservation: &Reservation) -> bool {
        self.stock_ids.contains(&reservation.stock_id())
            && reservation.is_active(self.now)
            && !reservation
                .checkout_line_id()
                .is_some_and(|line| self.exclude_lines.contains(&line))
    }
}

/// Reservation lookup collaborator.
///
/// Implementations may push the query down to storage; results are re-filtered
/// with [`ReservationQuery::matches`] by the aggregator regardless.
pub trait ReservationSource {
    fn reservations_for(&self, query: &ReservationQuery) -> Vec<Reservation>;
}

impl ReservationSource for [Reservation] {
    fn reservations_for(&self, query: &ReservationQuery) -> Vec<Reservation> {
        self.iter().filter(|r| query.matches(r)).cloned().collect()
    }
}

impl ReservationSource for Vec<Reservation> {
    fn reservations_for(&self, query: &ReservationQuery) -> Vec<Reservation> {
        self.as_slice().reservations_for(query)
    }
}

impl<S> ReservationSource for &S
where
    S: ReservationSource + ?Sized,
{
    fn reservations_for(&self, query: &ReservationQuery) -> Vec<Reservation> {
        (**self).reservations_for(query)
    }
}

impl<S> ReservationSource for Arc<S>
where
    S: ReservationSource + ?Sized,
{
    fn reservations_for(&self, query: &ReservationQuery) -> Vec<Reservation> {
        (**self).reservations_for(query)
    }
}

/// Sums active, non-excluded reservations for sets of stock records.
#[derive(Debug)]
pub struct ReservationAggregator<'a, S: ?Sized> {
    source: &'a S,
    now: DateTime<Utc>,
}

impl<'a, S> ReservationAggregator<'a, S>
where
    S: ReservationSource + ?Sized,
{
    pub fn new(source: &'a S, now: DateTime<Utc>) -> Self {
        Self { source, now }
    }

    fn matching(
        &self,
        stocks: &[StockRecord],
        exclude_lines: &HashSet<CheckoutLineId>,
    ) -> Vec<Reservation> {
        let query = ReservationQuery::new(stocks, self.now, exclude_lines);
        let mut reservations = self.source.reservations_for(&query);
        reservations.retain(|r| query.matches(r));
        reservations
    }

    /// Total reserved quantity across `stocks`. Empty input never reaches the source.
    pub fn sum_reserved(
        &self,
        stocks: &[StockRecord],
        exclude_lines: &HashSet<CheckoutLineId>,
    ) -> i64 {
        if stocks.is_empty() {
            return 0;
        }

        let total: i64 = self
            .matching(stocks, exclude_lines)
            .iter()
            .map(Reservation::quantity_reserved)
            .fold(0, i64::saturating_add);
        tracing::debug!(stocks = stocks.len(), reserved = total, "summed reservations");
        total
    }

    /// Reserved quantity per owning item. Items with no matching reservation are
    /// absent; look them up with an explicit zero fallback.
    pub fn sum_reserved_by_item(
        &self,
        stocks: &[StockRecord],
        exclude_lines: &HashSet<CheckoutLineId>,
    ) -> HashMap<ItemId, i64> {
        let mut by_item: HashMap<ItemId, i64> = HashMap::new();
        if stocks.is_empty() {
            return by_item;
        }

        let mut by_stock: HashMap<StockId, i64> = HashMap::new();
        for reservation in self.matching(stocks, exclude_lines) {
            let total = by_stock.entry(reservation.stock_id()).or_insert(0);
            *total = total.saturating_add(reservation.quantity_reserved());
        }

        let stock_items: HashMap<StockId, ItemId> =
            stocks.iter().map(|s| (*s.id(), s.item_id())).collect();
        for (stock_id, reserved) in by_stock {
            if let Some(item_id) = stock_items.get(&stock_id) {
                let total = by_item.entry(*item_id).or_insert(0);
                *total = total.saturating_add(reserved);
            }
        }

        tracing::debug!(
            stocks = stocks.len(),
            items = by_item.len(),
            "summed reservations by item"
        );
        by_item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;
    use std::cell::Cell;
    use stockwise_core::{LocationId, ReservationId};

    fn stock(item_id: ItemId) -> StockRecord {
        StockRecord::new(StockId::new(), item_id, LocationId::new(), 10, 0).unwrap()
    }

    fn reservation(
        stock: &StockRecord,
        quantity: i64,
        expires_at: DateTime<Utc>,
        line: Option<CheckoutLineId>,
    ) -> Reservation {
        Reservation::new(ReservationId::new(), *stock.id(), quantity, expires_at, line).unwrap()
    }

    /// Source that counts lookups and returns everything it holds unfiltered.
    struct CountingSource {
        rows: Vec<Reservation>,
        calls: Cell<usize>,
    }

    impl ReservationSource for CountingSource {
        fn reservations_for(&self, _query: &ReservationQuery) -> Vec<Reservation> {
            self.calls.set(self.calls.get() + 1);
            self.rows.clone()
        }
    }

    #[test]
    fn expired_reservations_are_ignored() {
        let now = Utc::now();
        let s = stock(ItemId::new());
        let rows = vec![
            reservation(&s, 3, now + Duration::minutes(10), None),
            reservation(&s, 5, now - Duration::minutes(1), None),
            reservation(&s, 7, now, None),
        ];

        let aggregator = ReservationAggregator::new(rows.as_slice(), now);
        assert_eq!(aggregator.sum_reserved(&[s], &HashSet::new()), 3);
    }

    #[test]
    fn excludes_by_line_identity_not_by_item() {
        let now = Utc::now();
        let later = now + Duration::minutes(10);
        let s = stock(ItemId::new());
        let own_line = CheckoutLineId::new();
        let other_line = CheckoutLineId::new();
        let rows = vec![
            reservation(&s, 4, later, Some(own_line)),
            reservation(&s, 2, later, Some(other_line)),
            reservation(&s, 1, later, None),
        ];

        let aggregator = ReservationAggregator::new(&rows, now);
        let exclude: HashSet<CheckoutLineId> = [own_line].into_iter().collect();
        assert_eq!(aggregator.sum_reserved(std::slice::from_ref(&s), &exclude), 3);
        assert_eq!(aggregator.sum_reserved(&[s], &HashSet::new()), 7);
    }

    #[test]
    fn reservations_on_other_stocks_do_not_count() {
        let now = Utc::now();
        let item = ItemId::new();
        let queried = stock(item);
        let elsewhere = stock(item);
        let rows = vec![reservation(&elsewhere, 6, now + Duration::hours(1), None)];

        let aggregator = ReservationAggregator::new(&rows, now);
        assert_eq!(aggregator.sum_reserved(&[queried], &HashSet::new()), 0);
    }

    #[test]
    fn aggregator_refilters_whatever_the_source_returns() {
        let now = Utc::now();
        let s = stock(ItemId::new());
        let source = CountingSource {
            rows: vec![
                reservation(&s, 2, now + Duration::minutes(5), None),
                reservation(&s, 9, now - Duration::minutes(5), None),
            ],
            calls: Cell::new(0),
        };

        let aggregator = ReservationAggregator::new(&source, now);
        assert_eq!(aggregator.sum_reserved(&[s], &HashSet::new()), 2);
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn empty_stock_set_skips_the_lookup() {
        let now = Utc::now();
        let s = stock(ItemId::new());
        let source = CountingSource {
            rows: vec![reservation(&s, 2, now + Duration::minutes(5), None)],
            calls: Cell::new(0),
        };

        let aggregator = ReservationAggregator::new(&source, now);
        assert_eq!(aggregator.sum_reserved(&[], &HashSet::new()), 0);
        assert!(aggregator.sum_reserved_by_item(&[], &HashSet::new()).is_empty());
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn groups_by_owning_item_across_stocks() {
        let now = Utc::now();
        let later = now + Duration::minutes(15);
        let a = ItemId::new();
        let b = ItemId::new();
        let c = ItemId::new();
        let a1 = stock(a);
        let a2 = stock(a);
        let b1 = stock(b);
        let c1 = stock(c);
        let rows = vec![
            reservation(&a1, 1, later, None),
            reservation(&a1, 2, later, None),
            reservation(&a2, 4, later, None),
            reservation(&b1, 5, later, None),
        ];

        let aggregator = ReservationAggregator::new(&rows, now);
        let by_item = aggregator.sum_reserved_by_item(&[a1, a2, b1, c1], &HashSet::new());

        assert_eq!(by_item.get(&a).copied().unwrap_or(0), 7);
        assert_eq!(by_item.get(&b).copied().unwrap_or(0), 5);
        assert!(!by_item.contains_key(&c));
    }

    #[test]
    fn huge_reservation_totals_saturate() {
        let now = Utc::now();
        let later = now + Duration::minutes(5);
        let item = ItemId::new();
        let a = stock(item);
        let b = stock(item);
        let rows = vec![
            reservation(&a, i64::MAX, later, None),
            reservation(&a, 1, later, None),
            reservation(&b, i64::MAX, later, None),
        ];

        let aggregator = ReservationAggregator::new(&rows, now);
        let stocks = [a, b];
        assert_eq!(aggregator.sum_reserved(&stocks, &HashSet::new()), i64::MAX);
        let by_item = aggregator.sum_reserved_by_item(&stocks, &HashSet::new());
        assert_eq!(by_item.get(&item).copied().unwrap_or(0), i64::MAX);
    }

    #[test]
    fn shared_source_behind_arc() {
        let now = Utc::now();
        let s = stock(ItemId::new());
        let rows: Arc<Vec<Reservation>> =
            Arc::new(vec![reservation(&s, 3, now + Duration::minutes(1), None)]);

        let aggregator = ReservationAggregator::new(&rows, now);
        assert_eq!(aggregator.sum_reserved(&[s], &HashSet::new()), 3);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: the sum equals the quantity of reservations expiring after now.
        #[test]
        fn sum_counts_only_unexpired(
            holds in prop::collection::vec((1i64..100, -600i64..600), 0..30)
        ) {
            let now = Utc::now();
            let s = stock(ItemId::new());
            let rows: Vec<Reservation> = holds
                .iter()
                .map(|(q, offset)| reservation(&s, *q, now + Duration::seconds(*offset), None))
                .collect();
            let expected: i64 = holds.iter().filter(|(_, o)| *o > 0).map(|(q, _)| q).sum();

            let aggregator = ReservationAggregator::new(&rows, now);
            prop_assert_eq!(aggregator.sum_reserved(&[s], &HashSet::new()), expected);
        }
    }
}
