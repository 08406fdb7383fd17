//! # Generic Messages
//!
//! The request envelope exchanged between a [`ResourceClient`](crate::ResourceClient) and its
//! [`ResourceActor`](crate::ResourceActor). Every variant carries a oneshot `respond_to`.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Requests understood by every `ResourceActor`.
///
/// - **Create**: stores a new entity. With `id: None` the actor draws a key from its id
///   source; with `id: Some(..)` the caller chooses the key and the create fails with
///   [`FrameworkError::AlreadyExists`] if it is taken.
/// - **Get** / **List**: read one entity or a snapshot of all of them.
/// - **Update** / **Delete**: generic mutation through the entity hooks.
/// - **Action**: record-specific logic, applied atomically with respect to every other
///   request on the same actor.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        id: Option<T::Id>,
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    List {
        respond_to: Response<Vec<T>>,
    },
    Update {
        id: T::Id,
        update: T::Update,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}
