//! # Item Actor
//!
//! The primary item store. Plain CRUD with no dependencies and no custom actions; the
//! purchase path only reads from it (sale price, catalog fallback).
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for [`Item`]
//! - [`error`] - [`ItemError`]

pub mod entity;
pub mod error;

pub use error::*;

use crate::model::{Item, ItemId};
use actor_framework::{ResourceActor, ResourceClient};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Creates the Item actor with sequential ids starting at 1.
pub fn new(buffer_size: usize) -> (ResourceActor<Item>, ResourceClient<Item>) {
    let counter = Arc::new(AtomicU32::new(1));
    let next_item_id = move || ItemId(counter.fetch_add(1, Ordering::SeqCst));
    ResourceActor::new(buffer_size, next_item_id)
}
