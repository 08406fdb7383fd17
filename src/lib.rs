//! # Seckill
//!
//! > **A flash-sale purchase pipeline on resource actors.**
//!
//! Items with a small stock go on sale inside a time window and many buyers try to grab
//! them at once. The pipeline guarantees that stock never goes negative, that each buyer
//! holds at most one purchase per item, and that stock reserved by orders that are cancelled
//! or never paid comes back.
//!
//! ## 🏗️ How a purchase flows
//!
//! ```text
//! purchase ─► AdmissionGate ─► item lookup ─► Ledger::Reserve ─► Order::create ─► Pending
//!                 │                                 │                 │
//!              SystemBusy                 sold out / duplicate /      └─► ExpiryScheduler
//!                                           not on sale
//!
//! Pending ── payment callback ─► Paid ─► CatalogSync
//! Pending ── cancel / expiry ──► Cancelled (stock released)
//! ```
//!
//! The stock check, the decrement and the per-buyer lock happen in a single ledger action,
//! executed by one actor, so concurrent attempts can never oversell. Order state moves only
//! inside the order actor, so competing cancel, pay and expire requests resolve to exactly
//! one winner.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`actor_framework`])
//! The generic single-writer `ResourceActor<T>` every store here is built on.
//!
//! ### 2. The Stores ([`item_actor`], [`ledger_actor`], [`order_actor`])
//! - **Item actor**: catalog records, validated on write.
//! - **Ledger actor**: stock cells with purchase locks. Reserve, release, claim and
//!   rollback are its actions.
//! - **Order actor**: order records and their state machine.
//!
//! ### 3. The Interface ([`clients`], [`service`])
//! Typed clients per actor, and [`SeckillService`](service::SeckillService), the entry
//! point for purchase, cancel, payment callback, search and admin operations.
//!
//! ### 4. Around the edges
//! - [`admission`]: bounded in-flight purchase attempts with RAII permits.
//! - [`compensation`]: at-least-once delivery of order expiries.
//! - [`catalog`]: search with a fallback to the item store, and index sync.
//! - [`retry`]: bounded exponential backoff for transport failures.
//! - [`config`]: `SECKILL_*` environment configuration.
//! - [`lifecycle`]: starts, wires and stops all of the above.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! RUST_LOG=info cargo run
//! cargo test
//! ```

pub mod admission;
pub mod catalog;
pub mod clients;
pub mod compensation;
pub mod config;
pub mod error;
pub mod item_actor;
pub mod ledger_actor;
pub mod lifecycle;
pub mod model;
pub mod order_actor;
pub mod retry;
pub mod service;
