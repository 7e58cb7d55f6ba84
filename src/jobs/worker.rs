//! Job worker: pops jobs from the queue and executes them.
//!
//! Delivery is at most once. A job that fails is logged and dropped; for read
//! jobs the waiting caller is told the library is unavailable.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use redis::aio::MultiplexedConnection;
use tokio::sync::watch;

use super::{Job, ReadJob, RedisJobQueue};
use crate::{
    error::AppResult,
    models::borrowing::BorrowingSummary,
    repository::borrowings::BorrowingsRepository,
    telegram::{format, sender::ChatSender},
};

/// Borrowing lookups needed by read jobs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BorrowingLookup: Send + Sync {
    async fn active_for_chat(
        &self,
        chat_id: i64,
        due_before: Option<NaiveDate>,
    ) -> AppResult<Option<Vec<BorrowingSummary>>>;
}

#[async_trait]
impl BorrowingLookup for BorrowingsRepository {
    async fn active_for_chat(
        &self,
        chat_id: i64,
        due_before: Option<NaiveDate>,
    ) -> AppResult<Option<Vec<BorrowingSummary>>> {
        BorrowingsRepository::active_for_chat(self, chat_id, due_before).await
    }
}

/// Text to push to a reply key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub to: String,
    pub text: String,
}

pub struct Worker {
    sender: Arc<dyn ChatSender>,
    borrowings: Arc<dyn BorrowingLookup>,
}

impl Worker {
    pub fn new(sender: Arc<dyn ChatSender>, borrowings: Arc<dyn BorrowingLookup>) -> Self {
        Self { sender, borrowings }
    }

    /// Execute one job, returning the reply of read jobs
    pub async fn execute(&self, job: Job) -> AppResult<Option<Reply>> {
        match job {
            Job::SendMessage { chat_id, text } => {
                self.sender.send_message(chat_id, &text).await?;
                tracing::info!(chat_id, "Notification sent");
                Ok(None)
            }
            Job::BorrowingsForChat { chat_id, reply_to } => {
                let text = self.read(ReadJob::Borrowings, chat_id).await?;
                Ok(Some(Reply { to: reply_to, text }))
            }
            Job::OverdueForChat { chat_id, reply_to } => {
                let text = self.read(ReadJob::Overdue, chat_id).await?;
                Ok(Some(Reply { to: reply_to, text }))
            }
        }
    }

    async fn read(&self, kind: ReadJob, chat_id: i64) -> AppResult<String> {
        let due_before = match kind {
            ReadJob::Borrowings => None,
            ReadJob::Overdue => Some(Utc::now().date_naive()),
        };
        let rows = self.borrowings.active_for_chat(chat_id, due_before).await?;
        Ok(format::borrowings_reply(rows.as_deref(), kind))
    }

    /// Decode and execute a raw payload, returning what to push back, if anything
    pub async fn handle_payload(&self, payload: &str) -> Option<Reply> {
        let job: Job = match serde_json::from_str(payload) {
            Ok(job) => job,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed job payload");
                return None;
            }
        };

        let kind = job.kind();
        let reply_to = job.reply_to().map(str::to_string);

        match self.execute(job).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(job = kind, error = %e, "Job failed");
                reply_to.map(|to| Reply {
                    to,
                    text: format::UNAVAILABLE_TEXT.to_string(),
                })
            }
        }
    }

    /// Consume the queue until `shutdown` flips to true. Redis outages are
    /// waited out; the loop only ends on shutdown.
    pub async fn run(
        self: Arc<Self>,
        queue: RedisJobQueue,
        mut shutdown: watch::Receiver<bool>,
        slot: usize,
    ) -> AppResult<()> {
        let Some(mut conn) = connect(&queue, &mut shutdown, slot).await else {
            return Ok(());
        };
        tracing::info!(slot, "Worker loop started");

        while !*shutdown.borrow() {
            let payload = tokio::select! {
                _ = shutdown.changed() => break,
                popped = queue.next_payload(&mut conn) => popped,
            };

            let payload = match payload {
                Ok(Some(payload)) => payload,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(slot, error = %e, "Failed to pop job, reconnecting");
                    match connect(&queue, &mut shutdown, slot).await {
                        Some(fresh) => conn = fresh,
                        None => break,
                    }
                    continue;
                }
            };

            if let Some(reply) = self.handle_payload(&payload).await {
                if let Err(e) = queue.reply(&reply.to, &reply.text).await {
                    tracing::warn!(slot, error = %e, "Failed to deliver job reply");
                }
            }
        }

        tracing::info!(slot, "Worker loop stopped");
        Ok(())
    }
}

/// Delay before reconnect attempt `attempt` (0-based): 1s doubling up to 30s
pub fn reconnect_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(5)).min(MAX_RECONNECT_DELAY)
}

const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// Connect to Redis, retrying with backoff. `None` once shutdown is requested.
async fn connect(
    queue: &RedisJobQueue,
    shutdown: &mut watch::Receiver<bool>,
    slot: usize,
) -> Option<MultiplexedConnection> {
    let mut attempt = 0;
    loop {
        if *shutdown.borrow() {
            return None;
        }
        match queue.connection().await {
            Ok(conn) => {
                if attempt > 0 {
                    tracing::info!(slot, attempt, "Reconnected to Redis");
                }
                return Some(conn);
            }
            Err(e) => {
                let delay = reconnect_delay(attempt);
                tracing::warn!(slot, attempt, error = %e, "Redis unavailable, retrying in {:?}", delay);
                tokio::select! {
                    _ = shutdown.changed() => return None,
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt = attempt.saturating_add(1);
            }
        }
    }
}
