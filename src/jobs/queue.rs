//! Redis-backed job queue

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, Client};
use uuid::Uuid;

use super::{Job, JobQueue, ReadJob};
use crate::{
    config::JobsConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct RedisJobQueue {
    client: Client,
    config: JobsConfig,
}

impl RedisJobQueue {
    /// Create the queue client. No connection is made until first use.
    pub fn new(url: &str, config: JobsConfig) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Queue(format!("Failed to create Redis client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Test the connection
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Queue(format!("Redis connection test failed: {}", e)))?;
        Ok(())
    }

    /// A dedicated connection; blocking pops must not share one
    pub async fn connection(&self) -> AppResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Queue(format!("Failed to get Redis connection: {}", e)))
    }

    /// Pop the next raw payload, waiting at most `poll_timeout_secs`
    pub async fn next_payload(&self, conn: &mut MultiplexedConnection) -> AppResult<Option<String>> {
        let popped = redis::cmd("BRPOP")
            .arg(&self.config.queue_key)
            .arg(self.config.poll_timeout_secs)
            .query_async::<_, Option<(String, String)>>(conn)
            .await?;
        Ok(popped.map(|(_, payload)| payload))
    }

    /// Deliver the text of a read job to whoever waits on `reply_to`
    pub async fn reply(&self, reply_to: &str, text: &str) -> AppResult<()> {
        let mut conn = self.connection().await?;
        redis::pipe()
            .cmd("LPUSH")
            .arg(reply_to)
            .arg(text)
            .ignore()
            .cmd("EXPIRE")
            .arg(reply_to)
            .arg(self.config.reply_ttl_secs)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    fn reply_key(&self) -> String {
        format!("{}:reply:{}", self.config.queue_key, Uuid::new_v4())
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, job: Job) -> AppResult<()> {
        let payload = serde_json::to_string(&job)
            .map_err(|e| AppError::Internal(format!("Failed to encode job: {}", e)))?;
        let mut conn = self.connection().await?;
        redis::cmd("LPUSH")
            .arg(&self.config.queue_key)
            .arg(payload)
            .query_async::<_, i64>(&mut conn)
            .await?;
        tracing::debug!(job = job.kind(), "Job enqueued");
        Ok(())
    }

    async fn request(&self, job: ReadJob, chat_id: i64) -> AppResult<String> {
        let reply_to = self.reply_key();
        self.enqueue(job.into_job(chat_id, reply_to.clone())).await?;

        let mut conn = self.connection().await?;
        let reply = redis::cmd("BLPOP")
            .arg(&reply_to)
            .arg(self.config.reply_timeout_secs)
            .query_async::<_, Option<(String, String)>>(&mut conn)
            .await?;

        match reply {
            Some((_, text)) => Ok(text),
            None => Err(AppError::Timeout(format!(
                "No reply within {} seconds",
                self.config.reply_timeout_secs
            ))),
        }
    }
}
