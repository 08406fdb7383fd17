//! # Stock Ledger Actor
//!
//! The shared fast store: every item's remaining stock and its per-user purchase locks,
//! owned by one [`ResourceActor`]. All ledger traffic for all items goes through this one
//! mailbox, so reservations are totally ordered and no oversell is possible.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for [`StockCell`]
//! - [`actions`] - [`LedgerAction`], [`LedgerActionResult`] and the [`ReservationResult`] codes
//! - [`error`] - [`LedgerError`]
//!
//! Cells are keyed by [`ItemId`](crate::model::ItemId) and created explicitly when an item is
//! published, so the actor has no id source.
//!
//! ```rust
//! use seckill::clients::LedgerClient;
//! use seckill::ledger_actor::{self, ReservationResult};
//! use seckill::model::{ItemId, SaleWindow, UserId};
//! use chrono::{Duration, Utc};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (actor, client) = ledger_actor::new(32);
//!     tokio::spawn(actor.run(()));
//!     let ledger = LedgerClient::new(client);
//!
//!     let now = Utc::now();
//!     let window = SaleWindow::new(now, now + Duration::hours(1));
//!     ledger.stock_item(ItemId(1), 1, true, window).await?;
//!
//!     let first = ledger.try_reserve(ItemId(1), UserId(1), 1, now).await?;
//!     let second = ledger.try_reserve(ItemId(1), UserId(2), 1, now).await?;
//!     assert_eq!(first, ReservationResult::Ok);
//!     assert_eq!(second, ReservationResult::InsufficientStock);
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::model::StockCell;
use actor_framework::{ResourceActor, ResourceClient};

/// Creates the ledger actor and its generic client.
pub fn new(buffer_size: usize) -> (ResourceActor<StockCell>, ResourceClient<StockCell>) {
    ResourceActor::keyed(buffer_size)
}
