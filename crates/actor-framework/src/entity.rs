//! # ActorEntity Trait
//!
//! The contract every record type (stock cell, item, order, ...) implements to be owned by a
//! [`ResourceActor`](crate::ResourceActor). It names the associated types for keys, DTOs,
//! actions, context and errors, and provides the lifecycle hooks (`on_create`, `on_update`,
//! `on_delete`, `handle_action`).
//!
//! # Single Writer
//! A hook runs while the owning actor is busy with exactly one request. Whatever a hook reads
//! and writes on `self` is therefore observed by other callers as one indivisible step. This
//! is what lets an `Action` act as a compare-and-set or a scripted multi-key operation.
//!
//! # Provided Methods (Hooks)
//! - [`ActorEntity::on_create`]
//! - [`ActorEntity::on_delete`]
//!
//! Both default to `Ok(())`.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any record type must implement to be managed by a `ResourceActor`.
///
/// # Async & Context
/// Hooks are `#[async_trait]` so they can call other actors. The `Context` type is injected
/// into every hook at `run()` time ("late binding"), which is how an entity reaches the
/// clients it depends on without circular construction.
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// The key this entity is stored under (item id, order number, ...).
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// The data required to update an existing instance.
    type Update: Send + Sync + Debug;

    /// Record-specific operations (e.g. `Reserve`, `Pay`).
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync;

    /// The error type for this entity.
    ///
    /// One error enum per actor rather than one per action: callers match on a single type,
    /// at the cost of the enum being the union of every action's failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full entity from its key and payload.
    /// Called synchronously before `on_create`.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks (Async) ---

    /// Called after construction and before the entity is stored.
    /// An error here aborts the create; nothing is stored.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when an update request is received.
    async fn on_update(
        &mut self,
        update: Self::Update,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error>;

    /// Called immediately before the entity is removed.
    async fn on_delete(&self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    // --- Action Handler (Async) ---

    /// Handle a record-specific action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        _ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}
