//! Read-only inputs to the availability computation.
//!
//! Everything here is owned by collaborators (stock persistence, reservation
//! persistence, the checkout flow); this crate never mutates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockwise_core::{
    CheckoutLineId, DomainError, DomainResult, Entity, ItemId, LocationId, ReservationId, StockId,
};

/// A sellable item (product variant).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub tracks_inventory: bool,
}

impl Item {
    pub fn tracked(id: ItemId) -> Self {
        Self {
            id,
            tracks_inventory: true,
        }
    }

    pub fn untracked(id: ItemId) -> Self {
        Self {
            id,
            tracks_inventory: false,
        }
    }
}

/// Per-location quantity record for one item, with its allocation aggregate attached.
///
/// `quantity_allocated` is the sum of the record's allocation rows, computed by the
/// stock lookup before the record reaches this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    id: StockId,
    item_id: ItemId,
    location_id: LocationId,
    quantity_on_hand: i64,
    quantity_allocated: i64,
}

impl StockRecord {
    pub fn new(
        id: StockId,
        item_id: ItemId,
        location_id: LocationId,
        quantity_on_hand: i64,
        quantity_allocated: i64,
    ) -> DomainResult<Self> {
        if quantity_on_hand < 0 {
            return Err(DomainError::validation("quantity on hand cannot be negative"));
        }
        if quantity_allocated < 0 {
            return Err(DomainError::validation("quantity allocated cannot be negative"));
        }
        Ok(Self {
            id,
            item_id,
            location_id,
            quantity_on_hand,
            quantity_allocated,
        })
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn location_id(&self) -> LocationId {
        self.location_id
    }

    pub fn quantity_on_hand(&self) -> i64 {
        self.quantity_on_hand
    }

    pub fn quantity_allocated(&self) -> i64 {
        self.quantity_allocated
    }

    /// On-hand minus allocated for this record alone.
    ///
    /// Not floored: an over-allocated record contributes a negative amount to
    /// per-item sums, the same as the upstream annotation does.
    pub fn available_quantity(&self) -> i64 {
        self.quantity_on_hand - self.quantity_allocated
    }
}

impl Entity for StockRecord {
    type Id = StockId;

    fn id(&self) -> &StockId {
        &self.id
    }
}

/// A time-bound hold placed by an in-progress checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    stock_id: StockId,
    quantity_reserved: i64,
    expires_at: DateTime<Utc>,
    checkout_line_id: Option<CheckoutLineId>,
}

impl Reservation {
    pub fn new(
        id: ReservationId,
        stock_id: StockId,
        quantity_reserved: i64,
        expires_at: DateTime<Utc>,
        checkout_line_id: Option<CheckoutLineId>,
    ) -> DomainResult<Self> {
        if quantity_reserved <= 0 {
            return Err(DomainError::validation("quantity reserved must be positive"));
        }
        Ok(Self {
            id,
            stock_id,
            quantity_reserved,
            expires_at,
            checkout_line_id,
        })
    }

    pub fn stock_id(&self) -> StockId {
        self.stock_id
    }

    pub fn quantity_reserved(&self) -> i64 {
        self.quantity_reserved
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn checkout_line_id(&self) -> Option<CheckoutLineId> {
        self.checkout_line_id
    }

    /// A reservation holds stock strictly before its expiry instant.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

impl Entity for Reservation {
    type Id = ReservationId;

    fn id(&self) -> &ReservationId {
        &self.id
    }
}

/// An item and the quantity being asked for.
///
/// `origin_line` names the checkout line the request comes from, if any, so that
/// line's own reservation is not counted against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedLine {
    item: Item,
    quantity: i64,
    origin_line: Option<CheckoutLineId>,
}

impl RequestedLine {
    pub fn new(item: Item, quantity: i64) -> DomainResult<Self> {
        if quantity < 0 {
            return Err(DomainError::validation("requested quantity cannot be negative"));
        }
        Ok(Self {
            item,
            quantity,
            origin_line: None,
        })
    }

    pub fn with_origin(mut self, line: CheckoutLineId) -> Self {
        self.origin_line = Some(line);
        self
    }

    pub fn item(&self) -> Item {
        self.item
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn origin_line(&self) -> Option<CheckoutLineId> {
        self.origin_line
    }
}

/// A line already present in the checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLine {
    id: CheckoutLineId,
    item_id: ItemId,
    quantity: i64,
}

impl CheckoutLine {
    pub fn new(id: CheckoutLineId, item_id: ItemId, quantity: i64) -> DomainResult<Self> {
        if quantity < 0 {
            return Err(DomainError::validation("checkout line quantity cannot be negative"));
        }
        Ok(Self {
            id,
            item_id,
            quantity,
        })
    }

    pub fn id(&self) -> CheckoutLineId {
        self.id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }
}
