//! # ActorClient Trait
//!
//! Common reads for domain-specific client wrappers, built on a generic `ResourceClient`.
use crate::{ActorEntity, FrameworkError, ResourceClient};
use async_trait::async_trait;

/// Trait for domain clients to inherit the standard reads.
///
/// A wrapper only supplies `inner()` and `map_error()`; `get` and `list` come for free and
/// return the wrapper's own error type.
///
/// ```rust
/// use actor_framework::{ActorClient, ActorEntity, FrameworkError, ResourceClient};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)] struct Sku { id: u32 }
/// #[derive(Debug)] struct SkuCreate;
/// #[derive(Debug)] struct SkuUpdate;
/// #[derive(Debug)] enum SkuAction {}
/// #[derive(Debug, thiserror::Error)] #[error("{0}")] struct SkuError(String);
/// impl From<String> for SkuError { fn from(s: String) -> Self { SkuError(s) } }
///
/// #[async_trait]
/// impl ActorEntity for Sku {
///     type Id = u32; type Create = SkuCreate; type Update = SkuUpdate; type Action = SkuAction;
///     type ActionResult = (); type Context = (); type Error = SkuError;
///     fn from_create_params(id: u32, _: SkuCreate) -> Result<Self, Self::Error> { Ok(Self { id }) }
///     async fn on_update(&mut self, _: SkuUpdate, _: &()) -> Result<(), Self::Error> { Ok(()) }
///     async fn handle_action(&mut self, _: SkuAction, _: &()) -> Result<(), Self::Error> { Ok(()) }
/// }
///
/// struct SkuClient { inner: ResourceClient<Sku> }
///
/// #[async_trait]
/// impl ActorClient<Sku> for SkuClient {
///     type Error = SkuError;
///     fn inner(&self) -> &ResourceClient<Sku> { &self.inner }
///     fn map_error(e: FrameworkError) -> Self::Error { SkuError(e.to_string()) }
/// }
///
/// async fn usage(client: SkuClient) {
///     let _ = client.get(1).await;
///     let _ = client.list().await;
/// }
/// ```
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The domain error type.
    type Error: From<String> + Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the domain error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch an entity by key.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Snapshot of all entities.
    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().list().await.map_err(Self::map_error)
    }
}
