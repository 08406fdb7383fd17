//! # Item Client
//!
//! High-level API for the primary item store.
use crate::item_actor::ItemError;
use crate::model::{Item, ItemCreate, ItemId, ItemUpdate};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct ItemClient {
    inner: ResourceClient<Item>,
}

impl ItemClient {
    pub fn new(inner: ResourceClient<Item>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self, params), fields(title = %params.title))]
    pub async fn create_item(&self, params: ItemCreate) -> Result<ItemId, ItemError> {
        debug!(?params, "create_item called");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn update_item(&self, id: ItemId, update: ItemUpdate) -> Result<Item, ItemError> {
        debug!("Sending request");
        self.inner.update(id, update).await.map_err(Self::map_error)
    }
}

#[async_trait]
impl ActorClient<Item> for ItemClient {
    type Error = ItemError;

    fn inner(&self) -> &ResourceClient<Item> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::NotFound(id) => ItemError::NotFound(id),
            other => other
                .entity_error::<ItemError>()
                .cloned()
                .unwrap_or_else(|| ItemError::ActorCommunicationError(other.to_string())),
        }
    }
}
