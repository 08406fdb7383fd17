//! Keeps index documents in step with the primary stores.
//!
//! Producers (the order actor on payment, the service on admin edits) fire a
//! [`CatalogEvent`] and move on. The [`SyncWorker`] re-reads the item and its stock and
//! upserts the document. Nothing here ever fails a purchase.

use super::index::{IndexError, ItemDocument, SearchIndex};
use crate::clients::{ItemClient, LedgerClient};
use crate::model::ItemId;
use crate::retry::{retry_with_predicate, RetryPolicy};
use actor_framework::ActorClient;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    PaymentSucceeded { item_id: ItemId },
    ItemChanged { item_id: ItemId },
}

impl CatalogEvent {
    pub fn item_id(&self) -> ItemId {
        match self {
            CatalogEvent::PaymentSucceeded { item_id } | CatalogEvent::ItemChanged { item_id } => {
                *item_id
            }
        }
    }
}

/// Fire-and-forget sender of catalog events.
#[derive(Clone)]
pub struct CatalogSync {
    sender: mpsc::UnboundedSender<CatalogEvent>,
}

impl CatalogSync {
    pub fn new() -> (Self, SyncWorker) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, SyncWorker { receiver })
    }

    pub fn notify(&self, event: CatalogEvent) {
        if let Err(e) = self.sender.send(event) {
            warn!(event = ?e.0, "Catalog sync is not running, event dropped");
        }
    }
}

/// What the worker reads from and writes to.
#[derive(Clone)]
pub struct SyncContext {
    pub items: ItemClient,
    pub ledger: LedgerClient,
    pub index: Arc<dyn SearchIndex>,
    pub retry: RetryPolicy,
}

pub struct SyncWorker {
    receiver: mpsc::UnboundedReceiver<CatalogEvent>,
}

impl SyncWorker {
    /// Processes events until every [`CatalogSync`] handle is dropped.
    pub async fn run(mut self, ctx: SyncContext) {
        info!("Catalog sync started");
        while let Some(event) = self.receiver.recv().await {
            let item_id = event.item_id();
            debug!(?event, "Catalog event");
            let result = retry_with_predicate(
                &ctx.retry,
                || refresh_document(&ctx.items, &ctx.ledger, ctx.index.as_ref(), item_id),
                IndexError::is_retryable,
            )
            .await;
            if let Err(e) = result {
                warn!(%item_id, error = %e, "Index document not refreshed");
            }
        }
        info!("Catalog sync stopped");
    }
}

/// Rebuilds and upserts one item's document. A missing item is skipped.
pub async fn refresh_document(
    items: &ItemClient,
    ledger: &LedgerClient,
    index: &dyn SearchIndex,
    item_id: ItemId,
) -> Result<(), IndexError> {
    let item = items
        .get(item_id)
        .await
        .map_err(|e| IndexError::Source(e.to_string()))?;
    let Some(item) = item else {
        debug!(%item_id, "Item gone, nothing to index");
        return Ok(());
    };
    let remaining = match ledger.remaining(item_id).await {
        Ok(remaining) => remaining,
        Err(e) => {
            warn!(%item_id, error = %e, "Stock unknown, indexing published quantity");
            None
        }
    };
    index.upsert(ItemDocument::from_item(&item, remaining)).await
}
