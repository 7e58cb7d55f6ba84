//! Borrowings repository for database operations

use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        borrowing::{
            Borrowing, BorrowingFilter, BorrowingShort, BorrowingSummary, CreateBorrowing,
            ReturnDecision,
        },
    },
};

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<Postgres>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List borrowings matching every set field of `filter`
    pub async fn list(&self, filter: &BorrowingFilter) -> AppResult<Vec<BorrowingShort>> {
        let rows = sqlx::query_as::<_, BorrowingShort>(
            r#"
            SELECT br.id, br.borrow_date, br.expected_return_date, br.actual_return_date,
                   (br.actual_return_date IS NULL) AS is_active,
                   br.book_id, br.user_id, b.title AS book_title
            FROM borrowings br
            JOIN books b ON b.id = br.book_id
            WHERE ($1::int IS NULL OR br.user_id = $1)
              AND ($2::int IS NULL OR br.user_id = $2)
              AND ($3::bool IS NULL OR (br.actual_return_date IS NULL) = $3)
            ORDER BY br.id
            "#,
        )
        .bind(filter.owner_id)
        .bind(filter.user_id)
        .bind(filter.active)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Get a borrowing by ID, restricted to `owner_id` when set
    pub async fn get_visible(&self, id: i32, owner_id: Option<i32>) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>(
            "SELECT * FROM borrowings WHERE id = $1 AND ($2::int IS NULL OR user_id = $2)",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))
    }

    /// Borrow a copy: decrement inventory and record the borrowing atomically.
    ///
    /// The decrement is conditional on `inventory > 0`, so concurrent
    /// borrowers of the last copy can not both succeed.
    pub async fn create(&self, user_id: i32, data: &CreateBorrowing) -> AppResult<(Borrowing, Book)> {
        let today = Utc::now().date_naive();
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET inventory = inventory - 1
            WHERE id = $1 AND inventory > 0
            RETURNING *
            "#,
        )
        .bind(data.book_id)
        .fetch_optional(&mut *tx)
        .await?;

        let book = match book {
            Some(book) => book,
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
                        .bind(data.book_id)
                        .fetch_one(&mut *tx)
                        .await?;
                return Err(if exists {
                    AppError::BusinessRule("Book is out of stock".to_string())
                } else {
                    AppError::NotFound(format!("Book with id {} not found", data.book_id))
                });
            }
        };

        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            INSERT INTO borrowings (user_id, book_id, borrow_date, expected_return_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book.id)
        .bind(today)
        .bind(data.expected_return_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((borrowing, book))
    }

    /// Return a borrowing on behalf of `user_id`.
    ///
    /// The borrowing row stays locked until commit, so of two concurrent
    /// returns only one sees it active and increments the inventory.
    pub async fn return_borrowing(&self, id: i32, user_id: i32) -> AppResult<ReturnDecision> {
        let mut tx = self.pool.begin().await?;

        let borrowing =
            sqlx::query_as::<_, Borrowing>("SELECT * FROM borrowings WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))?;

        let decision = borrowing.return_decision(user_id);
        if decision != ReturnDecision::Allowed {
            tx.rollback().await?;
            return Ok(decision);
        }

        sqlx::query("UPDATE borrowings SET actual_return_date = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE books SET inventory = inventory + 1 WHERE id = $1")
            .bind(borrowing.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(decision)
    }

    /// Active borrowings of the user linked to `chat_id`, optionally only those
    /// due before `due_before`. `None` when the chat is not linked to anyone.
    pub async fn active_for_chat(
        &self,
        chat_id: i64,
        due_before: Option<NaiveDate>,
    ) -> AppResult<Option<Vec<BorrowingSummary>>> {
        let user_id: Option<i32> =
            sqlx::query_scalar("SELECT user_id FROM notifications WHERE chat_id = $1")
                .bind(chat_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(user_id) = user_id else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, BorrowingSummary>(
            r#"
            SELECT br.id, b.title, b.author, br.borrow_date, br.expected_return_date
            FROM borrowings br
            JOIN books b ON b.id = br.book_id
            WHERE br.user_id = $1
              AND br.actual_return_date IS NULL
              AND ($2::date IS NULL OR br.expected_return_date < $2)
            ORDER BY br.expected_return_date, br.id
            "#,
        )
        .bind(user_id)
        .bind(due_before)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(rows))
    }
}
