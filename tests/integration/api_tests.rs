//! API integration tests against a running server.
//!
//! They need a staff account, created directly in the database:
//! `UPDATE users SET is_staff = TRUE WHERE email = 'admin@library.test'`.
//! Override the credentials with `LIBRARY_TEST_STAFF_EMAIL` and
//! `LIBRARY_TEST_STAFF_PASSWORD`.

use chrono::{Duration, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn staff_credentials() -> (String, String) {
    (
        std::env::var("LIBRARY_TEST_STAFF_EMAIL").unwrap_or_else(|_| "admin@library.test".into()),
        std::env::var("LIBRARY_TEST_STAFF_PASSWORD").unwrap_or_else(|_| "admin".into()),
    )
}

async fn login(client: &Client, email: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/users/token", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Register a fresh reader and return their token and id
async fn new_reader(client: &Client) -> (String, i64) {
    let email = format!("reader-{}@library.test", Uuid::new_v4());
    let response = client
        .post(format!("{}/users/register", BASE_URL))
        .json(&json!({ "email": email, "password": "reader-pass" }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    let id = body["id"].as_i64().unwrap();
    (login(client, &email, "reader-pass").await, id)
}

async fn staff_token(client: &Client) -> String {
    let (email, password) = staff_credentials();
    login(client, &email, &password).await
}

async fn create_book(client: &Client, staff: &str, inventory: i32) -> Value {
    let response = client
        .post(format!("{}/books/", BASE_URL))
        .bearer_auth(staff)
        .json(&json!({
            "title": format!("Dune {}", Uuid::new_v4()),
            "author": "Frank Herbert",
            "cover": "HARD",
            "inventory": inventory,
            "daily_fee": "0.50"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn inventory(client: &Client, book_id: i64) -> i64 {
    let book: Value = client
        .get(format!("{}/books/{}/", BASE_URL, book_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    book["inventory"].as_i64().unwrap()
}

async fn borrow(client: &Client, token: &str, book_id: i64) -> reqwest::Response {
    let due = (Utc::now() + Duration::days(7)).date_naive();
    client
        .post(format!("{}/borrowings/", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "book_id": book_id, "expected_return_date": due }))
        .send()
        .await
        .unwrap()
}

async fn return_borrowing(client: &Client, token: &str, id: i64) -> (StatusCode, Value) {
    let response = client
        .post(format!("{}/borrowings/{}/return/", BASE_URL, id))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

async fn list_borrowings(client: &Client, token: &str, query: &str) -> Vec<Value> {
    client
        .get(format!("{}/borrowings/{}", BASE_URL, query))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_moves_inventory_once() {
    let client = Client::new();
    let staff = staff_token(&client).await;
    let (reader, reader_id) = new_reader(&client).await;

    let book = create_book(&client, &staff, 3).await;
    let book_id = book["id"].as_i64().unwrap();

    let response = borrow(&client, &reader, book_id).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let borrowing: Value = response.json().await.unwrap();
    assert_eq!(borrowing["user_id"].as_i64(), Some(reader_id));
    assert!(borrowing["actual_return_date"].is_null());
    assert_eq!(inventory(&client, book_id).await, 2);

    let id = borrowing["id"].as_i64().unwrap();
    let (status, body) = return_borrowing(&client, &reader, id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book is returned");
    assert_eq!(inventory(&client, book_id).await, 3);

    let (status, body) = return_borrowing(&client, &reader, id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "This book has already been returned");
    assert_eq!(inventory(&client, book_id).await, 3);
}

#[tokio::test]
#[ignore]
async fn test_return_by_other_user_is_forbidden() {
    let client = Client::new();
    let staff = staff_token(&client).await;
    let (owner, _) = new_reader(&client).await;
    let (other, _) = new_reader(&client).await;

    let book_id = create_book(&client, &staff, 1).await["id"].as_i64().unwrap();
    let borrowing: Value = borrow(&client, &owner, book_id).await.json().await.unwrap();
    let id = borrowing["id"].as_i64().unwrap();

    let (status, body) = return_borrowing(&client, &other, id).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "User has no rights to return this book");
    assert_eq!(inventory(&client, book_id).await, 0);

    let details: Value = client
        .get(format!("{}/borrowings/{}/", BASE_URL, id))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(details["is_active"], true);
    assert_eq!(details["book"]["id"].as_i64(), Some(book_id));
}

#[tokio::test]
#[ignore]
async fn test_out_of_stock_is_rejected() {
    let client = Client::new();
    let staff = staff_token(&client).await;
    let (reader, _) = new_reader(&client).await;

    let book_id = create_book(&client, &staff, 1).await["id"].as_i64().unwrap();
    assert_eq!(borrow(&client, &reader, book_id).await.status(), StatusCode::CREATED);

    let response = borrow(&client, &reader, book_id).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Book is out of stock");
    assert_eq!(inventory(&client, book_id).await, 0);

    assert_eq!(borrow(&client, &reader, 0).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_readers_only_see_their_borrowings() {
    let client = Client::new();
    let staff = staff_token(&client).await;
    let (alice, alice_id) = new_reader(&client).await;
    let (bob, bob_id) = new_reader(&client).await;

    let book_id = create_book(&client, &staff, 5).await["id"].as_i64().unwrap();
    let first: Value = borrow(&client, &alice, book_id).await.json().await.unwrap();
    borrow(&client, &alice, book_id).await;
    borrow(&client, &bob, book_id).await;
    return_borrowing(&client, &alice, first["id"].as_i64().unwrap()).await;

    let rows = list_borrowings(&client, &alice, "").await;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["user_id"].as_i64() == Some(alice_id)));

    let active = list_borrowings(&client, &alice, "?is_active=TRUE").await;
    assert_eq!(active.len(), 1);
    assert!(active.iter().all(|r| r["actual_return_date"].is_null()));

    let returned = list_borrowings(&client, &alice, "?is_active=false").await;
    assert_eq!(returned.len(), 1);
    assert!(returned.iter().all(|r| !r["actual_return_date"].is_null()));

    let by_bob = format!("?is_user={}", bob_id);
    assert!(list_borrowings(&client, &alice, &by_bob).await.is_empty());
    assert_eq!(list_borrowings(&client, &staff, &by_bob).await.len(), 1);

    let response = client
        .get(format!("{}/borrowings/?is_user=abc", BASE_URL))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_telegram_link_is_unique_per_chat() {
    let client = Client::new();
    let (alice, _) = new_reader(&client).await;
    let (bob, _) = new_reader(&client).await;
    let chat_id = (Utc::now().timestamp_micros() % 1_000_000_000) + 1;

    let response = client
        .put(format!("{}/users/me/telegram", BASE_URL))
        .bearer_auth(&alice)
        .json(&json!({ "chat_id": chat_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .put(format!("{}/users/me/telegram", BASE_URL))
        .bearer_auth(&bob)
        .json(&json!({ "chat_id": chat_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let unlink = || {
        client
            .delete(format!("{}/users/me/telegram", BASE_URL))
            .bearer_auth(&alice)
            .send()
    };
    assert_eq!(unlink().await.unwrap().status(), StatusCode::NO_CONTENT);
    assert_eq!(unlink().await.unwrap().status(), StatusCode::NOT_FOUND);
}
