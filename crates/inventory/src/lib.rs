//! Available-to-promise accounting for items held across stock locations.
//!
//! This crate answers two questions, purely from data handed to it:
//! is there enough unclaimed quantity for a request (single item or a whole
//! checkout), and how much unclaimed quantity is there right now.
//!
//! Available quantity is `on_hand - allocated - active reservations`, floored at 0.
//! Reservations owned by the checkout lines being evaluated are excluded so a
//! session's own hold never counts against it.
//!
//! # Concurrency
//!
//! Every check reads a snapshot supplied by the caller and holds no shared state.
//! Two concurrent checks can both succeed against the same snapshot; the
//! allocation writer is the authoritative oversell gate and must enforce the
//! quantity constraint transactionally when it commits.

pub mod calculator;
pub mod checker;
pub mod config;
pub mod error;
pub mod model;
pub mod reservations;

pub use calculator::{StockTotals, any_available, compute_available, group_by_item};
pub use checker::StockChecker;
pub use config::{AvailabilityConfig, RESERVATIONS_ENABLED_ENV};
pub use error::{AvailabilityResult, InsufficiencyRecord, InsufficientStock};
pub use model::{CheckoutLine, Item, RequestedLine, Reservation, StockRecord};
pub use reservations::{ReservationAggregator, ReservationQuery, ReservationSource};
pub use stockwise_core::Entity;
