//! [`ActorEntity`] implementation for [`Order`].
//!
//! Creation and every status transition happen inside the order actor, so the hooks below
//! are where the lifecycle rules live:
//!
//! - `on_create` binds the user's ledger reservation to the new order number and registers
//!   the expiry deadline. No reservation, no order.
//! - `handle_action` performs the Pending -> Paid / Cancelled compare-and-set. A winning
//!   cancel returns stock to the ledger *before* the status is written, so a failed release
//!   leaves the order Pending for the next attempt.

use super::actions::{OrderAction, Transition};
use super::error::OrderError;
use super::OrderContext;
use crate::catalog::CatalogEvent;
use crate::ledger_actor::LedgerError;
use crate::model::{Order, OrderCreate, OrderNo, OrderStatus};
use crate::retry::retry_with_predicate;
use actor_framework::ActorEntity;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};

#[async_trait]
impl ActorEntity for Order {
    type Id = OrderNo;
    type Create = OrderCreate;
    type Update = ();
    type Action = OrderAction;
    type ActionResult = Transition;
    type Context = OrderContext;
    type Error = OrderError;

    fn from_create_params(order_no: OrderNo, params: OrderCreate) -> Result<Self, OrderError> {
        if params.quantity == 0 {
            return Err(OrderError::InvalidQuantity(0));
        }
        Ok(Order::new(
            order_no,
            params.user_id,
            params.item_id,
            params.quantity,
            params.unit_price,
        ))
    }

    async fn on_create(&mut self, ctx: &OrderContext) -> Result<(), OrderError> {
        let claimed = ctx
            .ledger
            .claim(
                self.item_id,
                self.user_id,
                self.quantity,
                self.order_no.clone(),
                Utc::now(),
            )
            .await?;
        if !claimed {
            error!(
                item_id = %self.item_id,
                user_id = %self.user_id,
                quantity = self.quantity,
                "Order requested without a matching reservation"
            );
            return Err(OrderError::ReservationRequired {
                item_id: self.item_id,
                user_id: self.user_id,
            });
        }

        // The order stands even if the deadline cannot be registered; it can still be paid
        // or cancelled explicitly.
        if let Err(e) = ctx
            .scheduler
            .schedule_expiry(self.order_no.clone(), ctx.order_timeout)
        {
            error!(order_no = %self.order_no, error = %e, "Failed to schedule expiry");
        }
        Ok(())
    }

    async fn on_update(&mut self, _update: (), _ctx: &OrderContext) -> Result<(), OrderError> {
        Err(OrderError::Immutable(self.order_no.to_string()))
    }

    async fn handle_action(
        &mut self,
        action: OrderAction,
        ctx: &OrderContext,
    ) -> Result<Transition, OrderError> {
        if self.status.is_terminal() {
            return Ok(Transition::AlreadyTerminal(self.status));
        }

        match action {
            OrderAction::Pay { at } => {
                self.status = OrderStatus::Paid;
                self.paid_at = Some(at);
                self.updated_at = at;
                info!(order_no = %self.order_no, amount = %self.amount, "Order paid");
                ctx.catalog.notify(CatalogEvent::PaymentSucceeded {
                    item_id: self.item_id,
                });
            }
            OrderAction::Cancel { at, reason } => {
                let (item_id, quantity) = (self.item_id, self.quantity);
                let ledger = ctx.ledger.clone();
                let remaining = retry_with_predicate(
                    &ctx.retry,
                    move || {
                        let ledger = ledger.clone();
                        async move { ledger.release(item_id, quantity).await }
                    },
                    LedgerError::is_retryable,
                )
                .await
                .map_err(|source| {
                    warn!(order_no = %self.order_no, error = %source, "Stock release failed, order stays pending");
                    OrderError::StockRelease { item_id, source }
                })?;

                self.status = OrderStatus::Cancelled;
                self.cancel_reason = Some(reason);
                self.updated_at = at;
                info!(
                    order_no = %self.order_no,
                    ?reason,
                    %item_id,
                    quantity,
                    remaining,
                    "Order cancelled, stock released"
                );
            }
        }
        Ok(Transition::Applied)
    }
}
