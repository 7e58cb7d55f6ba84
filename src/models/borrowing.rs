//! Borrowing model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::book::Book;
use super::user::UserShort;

/// Borrowing record from database.
///
/// A borrowing is active while `actual_return_date` is unset. Returning it
/// sets that field once; nothing else changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrowing {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub borrow_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub actual_return_date: Option<DateTime<Utc>>,
}

/// Lifecycle state derived from `actual_return_date`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowingState {
    Active,
    Returned,
}

/// What a return request is allowed to do with a borrowing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnDecision {
    AlreadyReturned,
    NotOwner,
    Allowed,
}

impl ReturnDecision {
    /// Message answered to the caller once the decision is carried out
    pub fn message(&self) -> &'static str {
        match self {
            ReturnDecision::AlreadyReturned => ALREADY_RETURNED_MESSAGE,
            ReturnDecision::NotOwner => NOT_OWNER_MESSAGE,
            ReturnDecision::Allowed => RETURNED_MESSAGE,
        }
    }
}

impl Borrowing {
    pub fn state(&self) -> BorrowingState {
        if self.actual_return_date.is_some() {
            BorrowingState::Returned
        } else {
            BorrowingState::Active
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == BorrowingState::Active
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_active() && self.expected_return_date < today
    }

    /// Already-returned wins over ownership: anyone gets the no-op answer.
    pub fn return_decision(&self, user_id: i32) -> ReturnDecision {
        if !self.is_active() {
            ReturnDecision::AlreadyReturned
        } else if self.user_id != user_id {
            ReturnDecision::NotOwner
        } else {
            ReturnDecision::Allowed
        }
    }
}

/// Borrowing row as shown in list results
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowingShort {
    pub id: i32,
    pub borrow_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub book_id: i32,
    pub user_id: i32,
    pub book_title: String,
}

/// Borrowing with nested book and user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowingDetails {
    pub id: i32,
    pub borrow_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub book: Book,
    pub user: UserShort,
}

impl BorrowingDetails {
    pub fn new(borrowing: Borrowing, book: Book, user: UserShort) -> Self {
        Self {
            id: borrowing.id,
            borrow_date: borrowing.borrow_date,
            expected_return_date: borrowing.expected_return_date,
            actual_return_date: borrowing.actual_return_date,
            is_active: borrowing.is_active(),
            book,
            user,
        }
    }
}

/// Create borrowing request; the borrower is always the caller
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBorrowing {
    pub book_id: i32,
    #[validate(custom(function = "validate_expected_return_date"))]
    pub expected_return_date: NaiveDate,
}

fn validate_expected_return_date(date: &NaiveDate) -> Result<(), ValidationError> {
    if *date <= Utc::now().date_naive() {
        return Err(ValidationError::new("expected_return_date")
            .with_message("Expected return date must be in the future".into()));
    }
    Ok(())
}

/// Borrowing list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BorrowingQuery {
    /// Filter borrowings by user id (ex. ?is_user=1)
    pub is_user: Option<i32>,
    /// Filter borrowings by state (ex. ?is_active=true or ?is_active=false)
    pub is_active: Option<String>,
}

/// Resolved list filter. Every set field narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BorrowingFilter {
    /// Visibility restriction, set for non-staff callers
    pub owner_id: Option<i32>,
    /// Caller-supplied `is_user`
    pub user_id: Option<i32>,
    pub active: Option<bool>,
}

impl BorrowingFilter {
    /// Non-staff callers are always restricted to their own borrowings;
    /// an `is_user` pointing elsewhere then yields nothing.
    pub fn for_caller(query: &BorrowingQuery, caller_id: i32, is_staff: bool) -> Self {
        Self {
            owner_id: if is_staff { None } else { Some(caller_id) },
            user_id: query.is_user,
            active: parse_active_flag(query.is_active.as_deref()),
        }
    }
}

/// `true`/`false` in any case; anything else means "no filter"
pub fn parse_active_flag(value: Option<&str>) -> Option<bool> {
    match value.map(str::to_lowercase).as_deref() {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

/// Active borrowing with its book, as listed in chat replies
#[derive(Debug, Clone, FromRow)]
pub struct BorrowingSummary {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub borrow_date: NaiveDate,
    pub expected_return_date: NaiveDate,
}

/// Plain message answer of the return endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

pub const RETURNED_MESSAGE: &str = "Book is returned";
pub const ALREADY_RETURNED_MESSAGE: &str = "This book has already been returned";
pub const NOT_OWNER_MESSAGE: &str = "User has no rights to return this book";
