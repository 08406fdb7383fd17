//! Demo run: publish one item, let a crowd of buyers race for it, then pay one order,
//! cancel another and list the catalog.

use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use seckill::config::SeckillConfig;
use seckill::lifecycle::{setup_tracing, SeckillSystem};
use seckill::model::{ItemCreate, SaleWindow, UserId};
use tokio::task::JoinSet;
use tracing::{info, warn, Instrument};

const BUYERS: u64 = 20;

fn main() -> Result<(), String> {
    setup_tracing();

    let config = SeckillConfig::from_env();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()
        .map_err(|e| e.to_string())?;

    runtime.block_on(run(config))
}

async fn run(config: SeckillConfig) -> Result<(), String> {
    info!(?config, "Starting seckill demo");
    let system = SeckillSystem::new(config);
    let service = system.service.clone();

    let now = Utc::now();
    let item_id = service
        .publish_item(ItemCreate {
            title: "Mechanical keyboard".to_string(),
            description: "Hot-swappable, limited run".to_string(),
            price: Decimal::new(12900, 2),
            sale_price: Decimal::new(4900, 2),
            stock: 3,
            active: true,
            window: SaleWindow::new(now, now + ChronoDuration::hours(1)),
        })
        .await
        .map_err(|e| e.to_string())?;
    info!(%item_id, "Item published");

    let span = tracing::info_span!("burst");
    let accepted = async {
        let mut attempts = JoinSet::new();
        for user in 1..=BUYERS {
            let service = service.clone();
            attempts.spawn(async move { service.purchase(item_id, UserId(user), 1).await });
        }

        let mut accepted = Vec::new();
        while let Some(joined) = attempts.join_next().await {
            match joined {
                Ok(Ok(order_no)) => accepted.push(order_no),
                Ok(Err(e)) => info!(reason = %e, "Attempt rejected"),
                Err(e) => warn!(error = %e, "Attempt task failed"),
            }
        }
        accepted
    }
    .instrument(span)
    .await;
    info!(accepted = accepted.len(), buyers = BUYERS, "Burst finished");

    if let Some(order_no) = accepted.first() {
        let paid = service
            .payment_callback(order_no.clone())
            .await
            .map_err(|e| e.to_string())?;
        info!(%order_no, paid, "Payment callback");
    }
    if let Some(order_no) = accepted.get(1) {
        let cancelled = service
            .cancel(order_no.clone())
            .await
            .map_err(|e| e.to_string())?;
        info!(%order_no, cancelled, "Cancel requested");
    }

    let remaining = service
        .remaining_stock(item_id)
        .await
        .map_err(|e| e.to_string())?;
    info!(?remaining, "Stock after payment and cancel");

    let views = service.search("keyboard").await.map_err(|e| e.to_string())?;
    let listing = serde_json::to_string_pretty(&views).map_err(|e| e.to_string())?;
    println!("{listing}");

    info!(pending_expiries = system.scheduler.pending().len(), "Leaving expiries unsent");
    drop(service);
    system.shutdown().await?;

    info!("Demo completed successfully");
    Ok(())
}
