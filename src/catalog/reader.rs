//! Catalog listings for buyers.
//!
//! The search index answers first. If it fails, the primary item store is scanned with the
//! same filter. Either way each result carries a sold-out flag read live from the ledger.

use super::index::{ItemDocument, SearchIndex, SearchQuery};
use super::sync::refresh_document;
use crate::clients::{ItemClient, LedgerClient};
use crate::error::SeckillError;
use crate::model::{Item, ItemId, SaleWindow};
use actor_framework::ActorClient;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemView {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub sale_price: Decimal,
    pub window: SaleWindow,
    pub sold_out: bool,
}

impl From<ItemDocument> for ItemView {
    fn from(doc: ItemDocument) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            description: doc.description,
            price: doc.price,
            sale_price: doc.sale_price,
            window: doc.window,
            sold_out: false,
        }
    }
}

impl From<Item> for ItemView {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            title: item.title,
            description: item.description,
            price: item.price,
            sale_price: item.sale_price,
            window: item.window,
            sold_out: false,
        }
    }
}

#[derive(Clone)]
pub struct CatalogReader {
    index: Arc<dyn SearchIndex>,
    items: ItemClient,
    ledger: LedgerClient,
}

impl CatalogReader {
    pub fn new(index: Arc<dyn SearchIndex>, items: ItemClient, ledger: LedgerClient) -> Self {
        Self {
            index,
            items,
            ledger,
        }
    }

    /// Active items matching `keyword` in title or description, newest first.
    #[instrument(skip(self))]
    pub async fn search(&self, keyword: &str) -> Result<Vec<ItemView>, SeckillError> {
        let query = SearchQuery::active(keyword);
        let mut views: Vec<ItemView> = match self.index.search(&query).await {
            Ok(docs) => docs.into_iter().map(ItemView::from).collect(),
            Err(e) => {
                warn!(error = %e, "Search index failed, falling back to item store");
                self.search_store(&query).await?
            }
        };
        self.mark_sold_out(&mut views).await;
        debug!(hits = views.len(), "Search done");
        Ok(views)
    }

    /// Writes the current document for one item to the index.
    pub async fn refresh(&self, item_id: ItemId) {
        if let Err(e) = refresh_document(&self.items, &self.ledger, self.index.as_ref(), item_id).await {
            warn!(%item_id, error = %e, "Index document not written");
        }
    }

    async fn search_store(&self, query: &SearchQuery) -> Result<Vec<ItemView>, SeckillError> {
        let mut items: Vec<Item> = self
            .items
            .list()
            .await?
            .into_iter()
            .filter(|item| query.matches(&item.title, &item.description, item.active))
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items.into_iter().map(ItemView::from).collect())
    }

    // Best-effort: anything but a definite zero leaves the flag unset.
    async fn mark_sold_out(&self, views: &mut [ItemView]) {
        for view in views.iter_mut() {
            match self.ledger.remaining(view.id).await {
                Ok(Some(remaining)) => view.sold_out = remaining == 0,
                Ok(None) => warn!(item_id = %view.id, "No stock cell for listed item"),
                Err(e) => warn!(item_id = %view.id, error = %e, "Stock lookup failed"),
            }
        }
    }
}
