//! Plain data carried between actors. The [`ActorEntity`](actor_framework::ActorEntity)
//! implementations live next to the actor that owns each type.

pub mod item;
pub mod order;
pub mod stock;
pub mod user;

pub use item::*;
pub use order::*;
pub use stock::*;
pub use user::*;
