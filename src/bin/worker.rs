//! Library worker: executes jobs from the Redis queue.
//!
//! Runs `jobs.concurrency` loops sharing one Telegram client and one database
//! pool. Ctrl-C stops the loops after their current job.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use teloxide::Bot;
use tokio::sync::watch;

use library_service::{
    config::AppConfig,
    jobs::{RedisJobQueue, Worker},
    logging,
    repository::borrowings::BorrowingsRepository,
    telegram::TelegramSender,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_tracing(&config.logging, "library_worker");

    let token = config.require_bot_token()?.to_string();

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    let queue = RedisJobQueue::new(&config.redis.url, config.jobs.clone())?;
    queue.ping().await.context("Failed to connect to Redis")?;

    let worker = Arc::new(Worker::new(
        Arc::new(TelegramSender::new(Bot::new(token))),
        Arc::new(BorrowingsRepository::new(pool)),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let concurrency = config.jobs.concurrency.max(1);

    tracing::info!(
        concurrency,
        queue = %config.jobs.queue_key,
        "Starting Library Worker v{}",
        env!("CARGO_PKG_VERSION")
    );

    let loops: Vec<_> = (0..concurrency)
        .map(|slot| {
            tokio::spawn(worker.clone().run(queue.clone(), shutdown_rx.clone(), slot))
        })
        .collect();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down worker loops");
    shutdown_tx.send(true)?;

    for handle in loops {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Worker loop failed"),
            Err(e) => tracing::error!(error = %e, "Worker loop panicked"),
        }
    }

    Ok(())
}
