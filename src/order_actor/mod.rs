//! # Order Actor
//!
//! The primary order store and the order lifecycle manager in one: orders are created and
//! moved between states only inside this actor.
//!
//! ```text
//! Pending --pay--------------> Paid
//! Pending --cancel | expire--> Cancelled
//! ```
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for [`Order`]
//! - [`actions`] - [`OrderAction`] and the [`Transition`] outcome
//! - [`error`] - [`OrderError`]
//!
//! ## Context
//!
//! The actor depends on the ledger (claim and release), the expiry scheduler and the
//! catalog sync channel. They arrive through [`OrderContext`] at `run()` time. The scheduler
//! in turn delivers expiries to an [`OrderClient`](crate::clients::OrderClient), so the two
//! form a cycle and the scheduler must be stopped explicitly on shutdown.
//!
//! ## Stock release and throughput
//!
//! A cancel or expiry returns stock to the ledger from inside the actor, before the status is
//! written. While that call and its retry backoff run, every other order waits in the mailbox.
//! [`SeckillSystem`](crate::lifecycle::SeckillSystem) therefore passes
//! [`SeckillConfig::release_retry_policy`](crate::config::SeckillConfig::release_retry_policy)
//! here: at most one retry, a few milliseconds apart. Longer outages surface as a retryable
//! `StockRelease` error and are picked up again by expiry redelivery.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::catalog::CatalogSync;
use crate::clients::LedgerClient;
use crate::compensation::ExpiryScheduler;
use crate::model::{Order, OrderNo};
use crate::retry::RetryPolicy;
use actor_framework::{ResourceActor, ResourceClient};
use std::time::Duration;

/// Dependencies injected into the order actor.
#[derive(Clone)]
pub struct OrderContext {
    pub ledger: LedgerClient,
    pub scheduler: ExpiryScheduler,
    pub catalog: CatalogSync,
    /// How long an order may stay Pending.
    pub order_timeout: Duration,
    /// Applied to stock release during cancellation. Keep it short: see the module docs.
    pub retry: RetryPolicy,
}

/// Creates the Order actor. Order numbers are random UUIDs.
pub fn new(buffer_size: usize) -> (ResourceActor<Order>, ResourceClient<Order>) {
    ResourceActor::new(buffer_size, OrderNo::generate)
}
