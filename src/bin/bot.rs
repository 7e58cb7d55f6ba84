//! Library bot: Telegram front end answering borrowing lookups

use std::sync::Arc;

use anyhow::Context;
use teloxide::Bot;
use url::Url;

use library_service::{
    config::AppConfig,
    jobs::RedisJobQueue,
    logging,
    telegram::bot::{self, BotSettings},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_tracing(&config.logging, "library_bot");

    let token = config.require_bot_token()?.to_string();
    let website_url = Url::parse(&config.telegram.website_url)
        .with_context(|| format!("Invalid telegram.website_url: {}", config.telegram.website_url))?;

    let queue = RedisJobQueue::new(&config.redis.url, config.jobs.clone())?;
    queue.ping().await.context("Failed to connect to Redis")?;

    tracing::info!("Starting Library Bot v{}", env!("CARGO_PKG_VERSION"));

    bot::run(Bot::new(token), Arc::new(queue), BotSettings { website_url }).await;

    Ok(())
}
