//! Borrowing endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::borrowing::{
        Borrowing, BorrowingDetails, BorrowingQuery, BorrowingShort, CreateBorrowing,
        MessageResponse, ReturnDecision,
    },
};

use super::AuthenticatedUser;

/// List borrowings visible to the caller
#[utoipa::path(
    get,
    path = "/borrowings/",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(BorrowingQuery),
    responses(
        (status = 200, description = "Borrowings ordered by id", body = Vec<BorrowingShort>),
        (status = 400, description = "Malformed filter"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_borrowings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    query: Result<Query<BorrowingQuery>, QueryRejection>,
) -> AppResult<Json<Vec<BorrowingShort>>> {
    let Query(query) = query?;

    let borrowings = state.services.borrowings.list(&claims, &query).await?;
    Ok(Json(borrowings))
}

/// Get borrowing by ID
#[utoipa::path(
    get,
    path = "/borrowings/{id}/",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Borrowing with book and user", body = BorrowingDetails),
        (status = 404, description = "Borrowing not found")
    )
)]
pub async fn get_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowingDetails>> {
    let borrowing = state.services.borrowings.get(&claims, id).await?;
    Ok(Json(borrowing))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/borrowings/",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    request_body = CreateBorrowing,
    responses(
        (status = 201, description = "Borrowing created", body = Borrowing),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Book is out of stock")
    )
)]
pub async fn create_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    payload: Result<Json<CreateBorrowing>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Borrowing>)> {
    let Json(request) = payload?;
    let borrowing = state.services.borrowings.create(&claims, request).await?;
    Ok((StatusCode::CREATED, Json(borrowing)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/borrowings/{id}/return/",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Book returned, or already returned", body = MessageResponse),
        (status = 403, description = "Caller does not own the borrowing", body = MessageResponse),
        (status = 404, description = "Borrowing not found")
    )
)]
pub async fn return_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let decision = state.services.borrowings.return_borrowing(&claims, id).await?;
    Ok(return_response(decision))
}

fn return_response(decision: ReturnDecision) -> (StatusCode, Json<MessageResponse>) {
    let status = match decision {
        ReturnDecision::NotOwner => StatusCode::FORBIDDEN,
        ReturnDecision::AlreadyReturned | ReturnDecision::Allowed => StatusCode::OK,
    };
    (
        status,
        Json(MessageResponse {
            message: decision.message().to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_statuses() {
        let (status, Json(body)) = return_response(ReturnDecision::NotOwner);
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.message, "User has no rights to return this book");

        let (status, Json(body)) = return_response(ReturnDecision::AlreadyReturned);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.message, "This book has already been returned");

        let (status, _) = return_response(ReturnDecision::Allowed);
        assert_eq!(status, StatusCode::OK);
    }
}
