//! Background jobs exchanged through the Redis queue.
//!
//! The API server pushes `send_message` jobs without waiting for them. The
//! bot pushes read jobs and blocks on their reply key, bounded by
//! `jobs.reply_timeout_secs`. The worker binary consumes both.

pub mod queue;
pub mod worker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

pub use queue::RedisJobQueue;
pub use worker::Worker;

/// A unit of work on the queue, serialized as JSON tagged by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    SendMessage { chat_id: i64, text: String },
    BorrowingsForChat { chat_id: i64, reply_to: String },
    OverdueForChat { chat_id: i64, reply_to: String },
}

impl Job {
    /// Reply key of read jobs
    pub fn reply_to(&self) -> Option<&str> {
        match self {
            Job::SendMessage { .. } => None,
            Job::BorrowingsForChat { reply_to, .. } | Job::OverdueForChat { reply_to, .. } => {
                Some(reply_to)
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Job::SendMessage { .. } => "send_message",
            Job::BorrowingsForChat { .. } => "borrowings_for_chat",
            Job::OverdueForChat { .. } => "overdue_for_chat",
        }
    }
}

/// Read jobs the bot can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadJob {
    Borrowings,
    Overdue,
}

impl ReadJob {
    pub fn into_job(self, chat_id: i64, reply_to: String) -> Job {
        match self {
            ReadJob::Borrowings => Job::BorrowingsForChat { chat_id, reply_to },
            ReadJob::Overdue => Job::OverdueForChat { chat_id, reply_to },
        }
    }
}

/// Client side of the job queue
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Push a job and return as soon as it is queued
    async fn enqueue(&self, job: Job) -> AppResult<()>;

    /// Push a read job and wait for its reply text, up to the configured timeout
    async fn request(&self, job: ReadJob, chat_id: i64) -> AppResult<String>;
}
