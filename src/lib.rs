//! Library Service
//!
//! REST API for a small lending library: a book catalog with inventory,
//! borrowings with an owner-only return flow, and Telegram notifications
//! delivered by a separate worker through a Redis job queue.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod repository;
pub mod services;
pub mod telegram;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
