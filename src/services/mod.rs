//! Business logic services

pub mod books;
pub mod borrowings;
pub mod notifications;
pub mod users;

use std::sync::Arc;

use crate::{config::AuthConfig, jobs::JobQueue, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub borrowings: borrowings::BorrowingsService,
    pub users: users::UsersService,
    pub notifications: notifications::NotificationsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository and job queue
    pub fn new(repository: Repository, auth_config: AuthConfig, queue: Arc<dyn JobQueue>) -> Self {
        let notifications = notifications::NotificationsService::new(repository.clone(), queue);
        Self {
            books: books::BooksService::new(repository.clone()),
            borrowings: borrowings::BorrowingsService::new(repository.clone(), notifications.clone()),
            users: users::UsersService::new(repository.clone(), auth_config),
            notifications,
            repository,
        }
    }

    /// Check that the database answers
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        self.repository.ping().await
    }
}
