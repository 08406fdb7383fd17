//! # Order Client
//!
//! High-level API for the order lifecycle. Reservation binding and deadline registration
//! happen in the Order actor's `on_create`; transitions are actor actions.
use crate::compensation::{ExpiryHandler, ExpiryOutcome};
use crate::model::{CancelReason, Order, OrderCreate, OrderNo, UserId};
use crate::order_actor::{OrderAction, OrderError, Transition};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, instrument};

#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>) -> Self {
        Self { inner }
    }

    /// Persists a Pending order for an existing reservation and returns its number.
    #[instrument(skip(self, params), fields(item_id = %params.item_id, user_id = %params.user_id))]
    pub async fn create_order(&self, params: OrderCreate) -> Result<OrderNo, OrderError> {
        debug!(?params, "create_order called");
        let order_no = self.inner.create(params).await.map_err(Self::map_error)?;
        info!(%order_no, "Order created");
        Ok(order_no)
    }

    /// Pending -> Paid. `false` if the order was already terminal.
    #[instrument(skip(self))]
    pub async fn confirm_payment(&self, order_no: OrderNo) -> Result<bool, OrderError> {
        debug!("Sending request");
        self.transition(order_no, OrderAction::Pay { at: Utc::now() })
            .await
    }

    /// Pending -> Cancelled on the purchaser's request.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_no: OrderNo) -> Result<bool, OrderError> {
        debug!("Sending request");
        self.transition(
            order_no,
            OrderAction::Cancel {
                at: Utc::now(),
                reason: CancelReason::Requested,
            },
        )
        .await
    }

    /// Pending -> Cancelled because payment never arrived.
    #[instrument(skip(self))]
    pub async fn expire(&self, order_no: OrderNo) -> Result<bool, OrderError> {
        debug!("Sending request");
        self.transition(
            order_no,
            OrderAction::Cancel {
                at: Utc::now(),
                reason: CancelReason::Expired,
            },
        )
        .await
    }

    /// A user's orders, newest first.
    #[instrument(skip(self))]
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, OrderError> {
        debug!("Sending request");
        let mut orders: Vec<Order> = self
            .list()
            .await?
            .into_iter()
            .filter(|order| order.user_id == user_id)
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn transition(&self, order_no: OrderNo, action: OrderAction) -> Result<bool, OrderError> {
        let outcome = self
            .inner
            .perform_action(order_no, action)
            .await
            .map_err(Self::map_error)?;
        if let Transition::AlreadyTerminal(status) = outcome {
            debug!(?status, "Order already terminal, nothing to do");
        }
        Ok(outcome.applied())
    }
}

#[async_trait]
impl ActorClient<Order> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::NotFound(id) => OrderError::NotFound(id),
            other => other
                .entity_error::<OrderError>()
                .cloned()
                .unwrap_or_else(|| OrderError::ActorCommunicationError(other.to_string())),
        }
    }
}

#[async_trait]
impl ExpiryHandler for OrderClient {
    async fn handle_expiry(&self, order_no: &OrderNo) -> Result<ExpiryOutcome, OrderError> {
        match self.expire(order_no.clone()).await {
            Ok(true) => Ok(ExpiryOutcome::Expired),
            Ok(false) => Ok(ExpiryOutcome::AlreadyTerminal),
            Err(OrderError::NotFound(_)) => Ok(ExpiryOutcome::UnknownOrder),
            Err(e) => Err(e),
        }
    }
}
