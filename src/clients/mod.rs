//! Domain wrappers around [`ResourceClient`](actor_framework::ResourceClient), one per actor.

pub mod item_client;
pub mod ledger_client;
pub mod order_client;

pub use item_client::*;
pub use ledger_client::*;
pub use order_client::*;
