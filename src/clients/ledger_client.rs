//! # Ledger Client
//!
//! Domain API over the stock ledger actor: the reserve script, release, and the lock
//! bookkeeping the order lifecycle needs.
use crate::ledger_actor::{LedgerAction, LedgerActionResult, LedgerError, ReservationResult};
use crate::model::{ItemId, OrderNo, SaleWindow, StockCell, StockCellCreate, StockCellUpdate, UserId};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct LedgerClient {
    inner: ResourceClient<StockCell>,
}

impl LedgerClient {
    pub fn new(inner: ResourceClient<StockCell>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ActorClient<StockCell> for LedgerClient {
    type Error = LedgerError;

    fn inner(&self) -> &ResourceClient<StockCell> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::NotFound(id) => LedgerError::NotFound(id),
            FrameworkError::AlreadyExists(id) => LedgerError::AlreadyStocked(id),
            other => other
                .entity_error::<LedgerError>()
                .cloned()
                .unwrap_or_else(|| LedgerError::ActorCommunicationError(other.to_string())),
        }
    }
}

fn unexpected(reply: LedgerActionResult) -> LedgerError {
    LedgerError::ActorCommunicationError(format!("unexpected ledger reply: {reply:?}"))
}

impl LedgerClient {
    /// Publishes an item's stock cell. Fails with `AlreadyStocked` if the cell exists.
    #[instrument(skip(self))]
    pub async fn stock_item(
        &self,
        item_id: ItemId,
        remaining: u32,
        active: bool,
        window: SaleWindow,
    ) -> Result<(), LedgerError> {
        debug!("Sending request");
        self.inner
            .insert(
                item_id,
                StockCellCreate {
                    remaining,
                    active,
                    window,
                },
            )
            .await
            .map(|_| ())
            .map_err(Self::map_error)
    }

    /// Mirrors an item's active flag or sale window into its cell.
    #[instrument(skip(self))]
    pub async fn update_cell(
        &self,
        item_id: ItemId,
        update: StockCellUpdate,
    ) -> Result<StockCell, LedgerError> {
        debug!("Sending request");
        self.inner
            .update(item_id, update)
            .await
            .map_err(Self::map_error)
    }

    /// The indivisible check-decrement-lock. An unknown item is `ItemUnavailable`.
    #[instrument(skip(self))]
    pub async fn try_reserve(
        &self,
        item_id: ItemId,
        user_id: UserId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<ReservationResult, LedgerError> {
        debug!("Sending request");
        let action = LedgerAction::Reserve {
            user_id,
            quantity,
            now,
        };
        match self.inner.perform_action(item_id, action).await {
            Ok(LedgerActionResult::Reserve(result)) => {
                debug!(code = result.code(), "Reservation evaluated");
                Ok(result)
            }
            Ok(other) => Err(unexpected(other)),
            Err(FrameworkError::NotFound(_)) => Ok(ReservationResult::ItemUnavailable),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    /// Returns stock to the item. Returns the new remaining count.
    #[instrument(skip(self))]
    pub async fn release(&self, item_id: ItemId, quantity: u32) -> Result<u32, LedgerError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(item_id, LedgerAction::Release { quantity })
            .await
        {
            Ok(LedgerActionResult::Release(remaining)) => Ok(remaining),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    /// Binds the user's reservation to `order_no`. `false` when no matching unclaimed lock
    /// exists.
    #[instrument(skip(self))]
    pub async fn claim(
        &self,
        item_id: ItemId,
        user_id: UserId,
        quantity: u32,
        order_no: OrderNo,
        now: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        debug!("Sending request");
        let action = LedgerAction::Claim {
            user_id,
            quantity,
            order_no,
            now,
        };
        match self.inner.perform_action(item_id, action).await {
            Ok(LedgerActionResult::Claim(claimed)) => Ok(claimed),
            Ok(other) => Err(unexpected(other)),
            Err(FrameworkError::NotFound(_)) => Ok(false),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    /// Undoes an unclaimed reservation. `false` if there was nothing to undo.
    #[instrument(skip(self))]
    pub async fn rollback(
        &self,
        item_id: ItemId,
        user_id: UserId,
        quantity: u32,
    ) -> Result<bool, LedgerError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(item_id, LedgerAction::Rollback { user_id, quantity })
            .await
        {
            Ok(LedgerActionResult::Rollback(undone)) => Ok(undone),
            Ok(other) => Err(unexpected(other)),
            Err(FrameworkError::NotFound(_)) => Ok(false),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    /// Remaining stock, or `None` if the item has no cell.
    #[instrument(skip(self))]
    pub async fn remaining(&self, item_id: ItemId) -> Result<Option<u32>, LedgerError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(item_id, LedgerAction::Remaining)
            .await
        {
            Ok(LedgerActionResult::Remaining(n)) => Ok(Some(n)),
            Ok(other) => Err(unexpected(other)),
            Err(FrameworkError::NotFound(_)) => Ok(None),
            Err(e) => Err(Self::map_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actor_framework::mock::{create_mock_client, expect_action};

    #[tokio::test]
    async fn test_try_reserve_passes_the_script_arguments() {
        let (client, mut receiver) = create_mock_client::<StockCell>(10);
        let ledger = LedgerClient::new(client);
        let now = Utc::now();

        let task =
            tokio::spawn(async move { ledger.try_reserve(ItemId(3), UserId(9), 2, now).await });

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(id, ItemId(3));
        match action {
            LedgerAction::Reserve {
                user_id,
                quantity,
                now: at,
            } => {
                assert_eq!(user_id, UserId(9));
                assert_eq!(quantity, 2);
                assert_eq!(at, now);
            }
            other => panic!("Expected Reserve, got {other:?}"),
        }
        responder
            .send(Ok(LedgerActionResult::Reserve(ReservationResult::DuplicateAttempt)))
            .unwrap();

        let result = task.await.unwrap().unwrap();
        assert_eq!(result, ReservationResult::DuplicateAttempt);
        assert_eq!(result.code(), -3);
    }

    #[tokio::test]
    async fn test_missing_cell_means_item_unavailable() {
        let (client, mut receiver) = create_mock_client::<StockCell>(10);
        let ledger = LedgerClient::new(client);

        let task = tokio::spawn(async move {
            ledger
                .try_reserve(ItemId(404), UserId(1), 1, Utc::now())
                .await
        });

        let (_, _, responder) = expect_action(&mut receiver).await.unwrap();
        responder
            .send(Err(FrameworkError::NotFound("item_404".to_string())))
            .unwrap();

        assert_eq!(
            task.await.unwrap().unwrap(),
            ReservationResult::ItemUnavailable
        );
    }

    #[tokio::test]
    async fn test_entity_errors_are_unwrapped() {
        let (client, mut receiver) = create_mock_client::<StockCell>(10);
        let ledger = LedgerClient::new(client);

        let task = tokio::spawn(async move {
            ledger
                .try_reserve(ItemId(1), UserId(1), 0, Utc::now())
                .await
        });

        let (_, _, responder) = expect_action(&mut receiver).await.unwrap();
        responder
            .send(Err(FrameworkError::EntityError(Box::new(
                LedgerError::InvalidQuantity(0),
            ))))
            .unwrap();

        assert_eq!(
            task.await.unwrap().unwrap_err(),
            LedgerError::InvalidQuantity(0)
        );
    }

    #[tokio::test]
    async fn test_closed_ledger_is_a_retryable_error() {
        let (client, receiver) = create_mock_client::<StockCell>(1);
        drop(receiver);
        let ledger = LedgerClient::new(client);

        let err = ledger.release(ItemId(1), 1).await.unwrap_err();
        assert!(err.is_retryable(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_remaining_of_unknown_item_is_none() {
        let (client, mut receiver) = create_mock_client::<StockCell>(10);
        let ledger = LedgerClient::new(client);

        let task = tokio::spawn(async move { ledger.remaining(ItemId(5)).await });
        let (_, action, responder) = expect_action(&mut receiver).await.unwrap();
        assert!(matches!(action, LedgerAction::Remaining));
        responder
            .send(Err(FrameworkError::NotFound("item_5".to_string())))
            .unwrap();

        assert_eq!(task.await.unwrap().unwrap(), None);
    }
}
