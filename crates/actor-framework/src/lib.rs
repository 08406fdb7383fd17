//! # Actor Framework
//!
//! Single-writer resource actors on Tokio. Each [`ResourceActor`] owns a keyed store of one
//! record type and applies every request to it in order, from one task. The rest of the
//! application talks to it through a cloneable [`ResourceClient`].
//!
//! ## Why a single writer?
//!
//! Stores that several tasks mutate concurrently need either locks or a primitive the store
//! executes without interleaving. An actor *is* that primitive: because the run loop handles
//! one request at a time, an entity's `handle_action` can read, check and write several
//! fields (or several logical keys held in one entity) and no other caller can observe the
//! intermediate state. Scripted check-then-act operations, compare-and-set transitions and
//! counters all fall out of this without a `Mutex`.
//!
//! ## Layers
//!
//! 1. **Entity** ([`ActorEntity`]) - the record type and its hooks.
//! 2. **Runtime** ([`ResourceActor`]) - the mailbox loop that owns the store.
//! 3. **Interface** ([`ResourceClient`], [`ActorClient`]) - typed request/response calls.
//!
//! ## Keys
//!
//! [`ResourceActor::new`] takes an id source for creates that do not name a key;
//! [`ResourceActor::keyed`] builds an actor whose entries are always addressed by the caller
//! (through [`ResourceClient::insert`]).
//!
//! ## Context Injection
//!
//! Dependencies are passed to `run(context)` rather than to the constructor. Actors that
//! depend on each other can all be constructed first, then started with each other's
//! clients. An actor whose hooks call another actor keeps processing strictly in order: it
//! awaits the callee before taking its next message.
//!
//! ## Shutdown
//!
//! The run loop ends when every client clone has been dropped. Cycles of clients held in
//! contexts keep each other alive and need an explicit stop signal.
//!
//! ## Testing
//!
//! See [`mock`] for [`mock::MockClient`] and the hand-driven `create_mock_client` helpers.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;

// Re-export core types for convenience
pub use actor::{IdSource, ResourceActor};
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};
