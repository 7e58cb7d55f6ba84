//! Borrowing workflow: listing, borrowing and returning books

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        borrowing::{
            Borrowing, BorrowingDetails, BorrowingFilter, BorrowingQuery, BorrowingShort,
            CreateBorrowing, ReturnDecision,
        },
        user::UserClaims,
    },
    repository::Repository,
};

use super::notifications::NotificationsService;

#[derive(Clone)]
pub struct BorrowingsService {
    repository: Repository,
    notifications: NotificationsService,
}

impl BorrowingsService {
    pub fn new(repository: Repository, notifications: NotificationsService) -> Self {
        Self {
            repository,
            notifications,
        }
    }

    /// Borrowings visible to the caller, narrowed by the query filters
    pub async fn list(&self, caller: &UserClaims, query: &BorrowingQuery) -> AppResult<Vec<BorrowingShort>> {
        let filter = BorrowingFilter::for_caller(query, caller.user_id, caller.is_staff);
        self.repository.borrowings.list(&filter).await
    }

    /// One borrowing with its book and user. Other users' borrowings are not
    /// found for non-staff callers.
    pub async fn get(&self, caller: &UserClaims, id: i32) -> AppResult<BorrowingDetails> {
        let owner_id = (!caller.is_staff).then_some(caller.user_id);
        let borrowing = self.repository.borrowings.get_visible(id, owner_id).await?;
        let book = self.repository.books.get_by_id(borrowing.book_id).await?;
        let user = self.repository.users.get_short(borrowing.user_id).await?;
        Ok(BorrowingDetails::new(borrowing, book, user))
    }

    /// Borrow a book for the caller and notify them
    pub async fn create(&self, caller: &UserClaims, data: CreateBorrowing) -> AppResult<Borrowing> {
        data.validate()?;

        let (borrowing, book) = self.repository.borrowings.create(caller.user_id, &data).await?;
        tracing::info!(
            borrowing_id = borrowing.id,
            book_id = book.id,
            user_id = caller.user_id,
            inventory = book.inventory,
            "Borrowing created"
        );

        self.notifications
            .notify_borrowing_created(caller.user_id, &book)
            .await;

        Ok(borrowing)
    }

    /// Return a borrowing on behalf of the caller
    pub async fn return_borrowing(&self, caller: &UserClaims, id: i32) -> AppResult<ReturnDecision> {
        let decision = self
            .repository
            .borrowings
            .return_borrowing(id, caller.user_id)
            .await?;
        match decision {
            ReturnDecision::Allowed => {
                tracing::info!(borrowing_id = id, user_id = caller.user_id, "Book returned")
            }
            ReturnDecision::NotOwner => {
                tracing::warn!(borrowing_id = id, user_id = caller.user_id, "Return refused, not the owner")
            }
            ReturnDecision::AlreadyReturned => {
                tracing::debug!(borrowing_id = id, "Borrowing already returned")
            }
        }
        Ok(decision)
    }
}
