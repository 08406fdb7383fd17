//! # Purchase API
//!
//! [`SeckillService`] is what the outside world calls: purchase, cancel, the payment
//! callback, catalog search, and the admin operations that publish and edit items.
//!
//! A purchase attempt runs through these steps, stopping at the first rejection:
//!
//! 1. take an admission permit (or fail with `SystemBusy`);
//! 2. read the item for its sale price;
//! 3. reserve stock and the purchase lock in the ledger, in one step;
//! 4. persist a Pending order, which also registers its expiry deadline.
//!
//! If step 4 fails, the reservation from step 3 is rolled back, so a failed attempt leaves
//! nothing behind.

use crate::admission::AdmissionGate;
use crate::catalog::{CatalogEvent, CatalogReader, CatalogSync, ItemView};
use crate::clients::{ItemClient, LedgerClient, OrderClient};
use crate::error::SeckillError;
use crate::item_actor::ItemError;
use crate::ledger_actor::LedgerError;
use crate::model::{
    Item, ItemCreate, ItemId, ItemUpdate, Order, OrderCreate, OrderNo, StockCellUpdate, UserId,
};
use crate::retry::{retry_with_predicate, RetryPolicy};
use actor_framework::ActorClient;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

#[derive(Clone)]
pub struct SeckillService {
    gate: Arc<AdmissionGate>,
    items: ItemClient,
    ledger: LedgerClient,
    orders: OrderClient,
    catalog: CatalogReader,
    sync: CatalogSync,
    retry: RetryPolicy,
}

impl SeckillService {
    pub fn new(
        gate: Arc<AdmissionGate>,
        items: ItemClient,
        ledger: LedgerClient,
        orders: OrderClient,
        catalog: CatalogReader,
        sync: CatalogSync,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            gate,
            items,
            ledger,
            orders,
            catalog,
            sync,
            retry,
        }
    }

    /// One purchase attempt. Returns the new order number or the reason it was rejected.
    #[instrument(skip(self))]
    pub async fn purchase(
        &self,
        item_id: ItemId,
        user_id: UserId,
        quantity: u32,
    ) -> Result<OrderNo, SeckillError> {
        let _permit = self.gate.enter()?;
        if quantity == 0 {
            return Err(SeckillError::InvalidQuantity(quantity));
        }

        let item = self
            .items
            .get(item_id)
            .await?
            .ok_or(SeckillError::ItemUnavailable(item_id))?;

        let result = self
            .ledger
            .try_reserve(item_id, user_id, quantity, Utc::now())
            .await?;
        if let Some(rejection) = SeckillError::from_reservation(result, item_id, user_id) {
            debug!(code = result.code(), "Reservation rejected");
            return Err(rejection);
        }

        let params = OrderCreate {
            item_id,
            user_id,
            quantity,
            unit_price: item.sale_price,
        };
        match self.orders.create_order(params).await {
            Ok(order_no) => {
                info!(%order_no, "Purchase accepted");
                Ok(order_no)
            }
            Err(e) => {
                let err = SeckillError::from(e);
                match &err {
                    SeckillError::ReservationRequired { .. } => {
                        error!(error = %err, "Reservation vanished before the order was written")
                    }
                    _ => warn!(error = %err, "Order not created"),
                }
                self.undo_reservation(item_id, user_id, quantity).await;
                Err(err)
            }
        }
    }

    /// Cancels a Pending order on request. `false` if it was already paid or cancelled.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_no: OrderNo) -> Result<bool, SeckillError> {
        Ok(self.orders.cancel(order_no).await?)
    }

    /// Payment provider callback. `false` on a repeated or late callback.
    #[instrument(skip(self))]
    pub async fn payment_callback(&self, order_no: OrderNo) -> Result<bool, SeckillError> {
        Ok(self.orders.confirm_payment(order_no).await?)
    }

    pub async fn search(&self, keyword: &str) -> Result<Vec<ItemView>, SeckillError> {
        self.catalog.search(keyword).await
    }

    pub async fn order(&self, order_no: OrderNo) -> Result<Order, SeckillError> {
        self.orders
            .get(order_no.clone())
            .await?
            .ok_or(SeckillError::OrderNotFound(order_no))
    }

    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, SeckillError> {
        Ok(self.orders.orders_for_user(user_id).await?)
    }

    /// Live remaining stock for an item, `None` if it was never stocked.
    pub async fn remaining_stock(&self, item_id: ItemId) -> Result<Option<u32>, SeckillError> {
        Ok(self.ledger.remaining(item_id).await?)
    }

    /// Attempts currently holding an admission permit.
    pub fn in_flight(&self) -> usize {
        self.gate.in_flight()
    }

    /// Puts an item on sale: primary store, ledger stock cell, then the search index.
    #[instrument(skip(self, params), fields(title = %params.title, stock = params.stock))]
    pub async fn publish_item(&self, params: ItemCreate) -> Result<ItemId, SeckillError> {
        let (stock, active, window) = (params.stock, params.active, params.window);
        let item_id = self.items.create_item(params).await?;
        if let Err(e) = self.ledger.stock_item(item_id, stock, active, window).await {
            error!(%item_id, error = %e, "Item stored but not stocked; it cannot be bought");
            return Err(e.into());
        }
        self.catalog.refresh(item_id).await;
        info!(%item_id, "Item published");
        Ok(item_id)
    }

    /// Admin edit. Active flag and sale window are mirrored into the ledger.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        item_id: ItemId,
        update: ItemUpdate,
    ) -> Result<Item, SeckillError> {
        let cell_update = update.affects_ledger().then(|| StockCellUpdate {
            active: update.active,
            window: update.window,
        });
        let item = self
            .items
            .update_item(item_id, update)
            .await
            .map_err(|e| match e {
                ItemError::NotFound(_) => SeckillError::ItemUnavailable(item_id),
                other => other.into(),
            })?;
        if let Some(cell_update) = cell_update {
            self.ledger.update_cell(item_id, cell_update).await?;
        }
        self.sync.notify(CatalogEvent::ItemChanged { item_id });
        Ok(item)
    }

    async fn undo_reservation(&self, item_id: ItemId, user_id: UserId, quantity: u32) {
        let ledger = self.ledger.clone();
        let result = retry_with_predicate(
            &self.retry,
            move || {
                let ledger = ledger.clone();
                async move { ledger.rollback(item_id, user_id, quantity).await }
            },
            LedgerError::is_retryable,
        )
        .await;
        match result {
            Ok(true) => info!(%item_id, %user_id, quantity, "Reservation rolled back"),
            Ok(false) => debug!(%item_id, %user_id, "Nothing to roll back"),
            Err(e) => error!(%item_id, %user_id, quantity, error = %e, "Reservation rollback failed"),
        }
    }
}
