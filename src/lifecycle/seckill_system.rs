use crate::admission::AdmissionGate;
use crate::catalog::{CatalogReader, CatalogSync, MemoryIndex, SearchIndex, SyncContext};
use crate::clients::{ItemClient, LedgerClient, OrderClient};
use crate::compensation::ExpiryScheduler;
use crate::config::SeckillConfig;
use crate::order_actor::OrderContext;
use crate::service::SeckillService;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Starts and owns every actor and background task of the flash-sale pipeline.
///
/// # Components
///
/// - **Item actor**: primary item store
/// - **Ledger actor**: stock counters and purchase locks, the only place stock changes
/// - **Order actor**: primary order store and the order lifecycle
/// - **Expiry scheduler**: delivers "expire if still pending" to the order actor
/// - **Catalog sync worker**: keeps search documents current
///
/// The order actor and the scheduler reference each other, so dropping handles alone does
/// not stop them. Use [`shutdown`](Self::shutdown).
///
/// # Example
///
/// ```ignore
/// let system = SeckillSystem::new(SeckillConfig::from_env());
///
/// let item_id = system.service.publish_item(params).await?;
/// let order_no = system.service.purchase(item_id, UserId(7), 1).await?;
/// system.service.payment_callback(order_no).await?;
///
/// system.shutdown().await?;
/// ```
pub struct SeckillSystem {
    pub service: SeckillService,
    pub items: ItemClient,
    pub ledger: LedgerClient,
    pub orders: OrderClient,
    /// Exposed for journal inspection and [`restore`](ExpiryScheduler::restore).
    pub scheduler: ExpiryScheduler,

    scheduler_handle: JoinHandle<()>,
    /// Stopped in this order once the scheduler is gone.
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl SeckillSystem {
    /// Starts the system with an in-memory search index.
    pub fn new(config: SeckillConfig) -> Self {
        Self::with_index(config, Arc::new(MemoryIndex::new()))
    }

    /// Starts the system against the given search index.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn with_index(config: SeckillConfig, index: Arc<dyn SearchIndex>) -> Self {
        let retry = config.retry_policy();

        // 1. Create actors and background tasks (no dependencies yet)
        let (item_actor, item_inner) = crate::item_actor::new(config.actor_buffer);
        let (ledger_actor, ledger_inner) = crate::ledger_actor::new(config.actor_buffer);
        let (order_actor, order_inner) = crate::order_actor::new(config.actor_buffer);
        let (scheduler, runner) = ExpiryScheduler::new(retry.clone(), config.redelivery_interval());
        let (sync, sync_worker) = CatalogSync::new();

        let items = ItemClient::new(item_inner);
        let ledger = LedgerClient::new(ledger_inner);
        let orders = OrderClient::new(order_inner);

        // 2. Start them with injected context
        let item_handle = tokio::spawn(item_actor.run(()));
        let ledger_handle = tokio::spawn(ledger_actor.run(()));
        let order_handle = tokio::spawn(order_actor.run(OrderContext {
            ledger: ledger.clone(),
            scheduler: scheduler.clone(),
            catalog: sync.clone(),
            order_timeout: config.order_timeout(),
            retry: config.release_retry_policy(),
        }));
        let scheduler_handle = tokio::spawn(runner.run(orders.clone()));
        let sync_handle = tokio::spawn(sync_worker.run(SyncContext {
            items: items.clone(),
            ledger: ledger.clone(),
            index: index.clone(),
            retry: retry.clone(),
        }));

        // 3. The service front
        let service = SeckillService::new(
            Arc::new(AdmissionGate::new(config.max_concurrent)),
            items.clone(),
            ledger.clone(),
            orders.clone(),
            CatalogReader::new(index, items.clone(), ledger.clone()),
            sync,
            retry,
        );

        info!(
            max_concurrent = config.max_concurrent,
            order_timeout_secs = config.order_timeout_secs,
            "Seckill system started"
        );

        Self {
            service,
            items,
            ledger,
            orders,
            scheduler,
            scheduler_handle,
            handles: vec![
                ("order", order_handle),
                ("catalog sync", sync_handle),
                ("item", item_handle),
                ("ledger", ledger_handle),
            ],
        }
    }

    /// Gracefully shuts down the entire system.
    ///
    /// Clones of the service or clients taken from this system must be dropped first,
    /// otherwise the actors they point at never see their channels close.
    ///
    /// Expiries still queued stay in the scheduler journal and are lost with it; read
    /// [`ExpiryScheduler::pending`] beforehand to carry them over to the next run.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");

        // Step 1: break the order actor <-> scheduler cycle
        self.scheduler.shutdown();
        if let Err(e) = self.scheduler_handle.await {
            error!("Expiry scheduler task failed: {:?}", e);
            return Err(format!("Expiry scheduler task failed: {:?}", e));
        }

        // Step 2: close the remaining channels by dropping our handles
        drop(self.service);
        drop(self.orders);
        drop(self.items);
        drop(self.ledger);
        drop(self.scheduler);

        // Step 3: dependents first, so each task's context releases the next one
        for (name, handle) in self.handles {
            if let Err(e) = handle.await {
                error!(task = name, "Task failed: {:?}", e);
                return Err(format!("{} task failed: {:?}", name, e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
