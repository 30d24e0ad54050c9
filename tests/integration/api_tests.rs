//! API integration tests
//!
//! These run against a live server with a fresh database:
//! `cargo test -- --ignored`

use reqwest::Client;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const BASE_URL: &str = "http://localhost:8080/api";

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Unique suffix per test run, to keep emails and ISBNs from colliding
fn unique_suffix() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .subsec_nanos() as u64;
    let count = COUNTER.fetch_add(1, Ordering::Relaxed) as u64;
    (nanos % 1_000_000) * 1000 + count
}

/// Log in as the bootstrap admin
async fn admin_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@biblioteca.local",
            "password": "admin123"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Register a reader and log them in, returning (token, user id)
async fn reader_token(client: &Client) -> (String, i64) {
    let email = format!("reader{}@example.com", unique_suffix());

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "name": "Test Reader",
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse register response");
    let user_id = body["user"]["id"].as_i64().expect("No user id");

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    (
        body["token"].as_str().expect("No token").to_string(),
        user_id,
    )
}

/// Create a book with the given number of copies, returning its id
async fn create_book(client: &Client, token: &str, quantity: i64) -> i64 {
    let n = unique_suffix();
    // 13 digits: 978 + 10 unique digits
    let isbn = format!("978{:010}", n);

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "isbn": isbn,
            "title": format!("Test Book {}", n),
            "author": "Test Author",
            "category": "Fiction",
            "quantity": quantity
        }))
        .send()
        .await
        .expect("Failed to send create book request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse book response");
    body["book"]["id"].as_i64().expect("No book id")
}

async fn get_book(client: &Client, token: &str, book_id: i64) -> Value {
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send get book request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse book response");
    body["book"].clone()
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
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@biblioteca.local",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "error");
    assert_eq!(body["statusCode"], 401);
}

#[tokio::test]
#[ignore]
async fn test_create_book_rejects_malformed_isbn() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "isbn": "123-4567890",
            "title": "Bad ISBN",
            "author": "Nobody",
            "category": "Fiction",
            "quantity": 1
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_create_book_canonicalizes_isbn() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let n = unique_suffix();
    let digits = format!("978{:010}", n);
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "isbn": digits,
            "title": "Canonical ISBN",
            "author": "Nobody",
            "category": "Fiction",
            "quantity": 1
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let isbn = body["book"]["isbn"].as_str().unwrap();
    // ddd-d-ddd-ddddd-d grouping
    let groups: Vec<&str> = isbn.split('-').collect();
    assert_eq!(
        groups.iter().map(|g| g.len()).collect::<Vec<_>>(),
        vec![3, 1, 3, 5, 1]
    );

    // Same digits again: duplicate
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "isbn": isbn,
            "title": "Duplicate",
            "author": "Nobody",
            "category": "Fiction",
            "quantity": 1
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_loan_decrements_availability() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (reader, _) = reader_token(&client).await;

    let book_id = create_book(&client, &admin, 2).await;

    let response = client
        .post(format!("{}/loans/create", BASE_URL))
        .header("Authorization", format!("Bearer {}", reader))
        .json(&json!({ "bookId": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["loan"]["status"], "PENDING");

    let book = get_book(&client, &admin, book_id).await;
    assert_eq!(book["availableQty"], 1);
    assert_eq!(book["quantity"], 2);
    assert_eq!(book["status"], "AVAILABLE");
}

#[tokio::test]
#[ignore]
async fn test_duplicate_loan_is_rejected() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (reader, _) = reader_token(&client).await;

    let book_id = create_book(&client, &admin, 3).await;

    for expected in [201u16, 409] {
        let response = client
            .post(format!("{}/loans/create", BASE_URL))
            .header("Authorization", format!("Bearer {}", reader))
            .json(&json!({ "bookId": book_id }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), expected);
    }
}

#[tokio::test]
#[ignore]
async fn test_loan_unavailable_when_no_copies() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (first, _) = reader_token(&client).await;
    let (second, _) = reader_token(&client).await;

    let book_id = create_book(&client, &admin, 1).await;

    let response = client
        .post(format!("{}/loans/create", BASE_URL))
        .header("Authorization", format!("Bearer {}", first))
        .json(&json!({ "bookId": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let book = get_book(&client, &admin, book_id).await;
    assert_eq!(book["availableQty"], 0);
    assert_eq!(book["status"], "BORROWED");

    let response = client
        .post(format!("{}/loans/create", BASE_URL))
        .header("Authorization", format!("Bearer {}", second))
        .json(&json!({ "bookId": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_return_with_empty_queue_restocks() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (reader, _) = reader_token(&client).await;

    let book_id = create_book(&client, &admin, 1).await;

    let response = client
        .post(format!("{}/loans/create", BASE_URL))
        .header("Authorization", format!("Bearer {}", reader))
        .json(&json!({ "bookId": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.unwrap();
    let loan_id = body["loan"]["id"].as_i64().unwrap();

    let response = client
        .patch(format!("{}/loans/{}/status", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "status": "RETURNED" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["loan"]["status"], "RETURNED");
    assert!(body["loan"]["returnDate"].is_string());
    // Returned on time: no fine
    let fine = &body["loan"]["fineAmount"];
    let fine_value = fine
        .as_str()
        .map(|s| s.parse::<f64>().unwrap())
        .or_else(|| fine.as_f64())
        .expect("fineAmount missing");
    assert_eq!(fine_value, 0.0);

    let book = get_book(&client, &admin, book_id).await;
    assert_eq!(book["availableQty"], 1);
    assert_eq!(book["status"], "AVAILABLE");
}

#[tokio::test]
#[ignore]
async fn test_return_already_returned_conflicts() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (reader, _) = reader_token(&client).await;

    let book_id = create_book(&client, &admin, 1).await;

    let response = client
        .post(format!("{}/loans/create", BASE_URL))
        .header("Authorization", format!("Bearer {}", reader))
        .json(&json!({ "bookId": book_id }))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let loan_id = body["loan"]["id"].as_i64().unwrap();

    for expected in [200u16, 409] {
        let response = client
            .patch(format!("{}/loans/{}/status", BASE_URL, loan_id))
            .header("Authorization", format!("Bearer {}", admin))
            .json(&json!({ "status": "RETURNED" }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), expected);
    }
}

#[tokio::test]
#[ignore]
async fn test_reservation_fifo_and_promotion() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (holder, _) = reader_token(&client).await;
    let (first, first_id) = reader_token(&client).await;
    let (second, _) = reader_token(&client).await;
    let (third, _) = reader_token(&client).await;

    // One copy, borrowed by `holder`
    let book_id = create_book(&client, &admin, 1).await;
    let response = client
        .post(format!("{}/loans/create", BASE_URL))
        .header("Authorization", format!("Bearer {}", holder))
        .json(&json!({ "bookId": book_id }))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let loan_id = body["loan"]["id"].as_i64().unwrap();

    // A, B, C reserve in order and receive positions 1, 2, 3
    for (token, expected_position) in [(&first, 1), (&second, 2), (&third, 3)] {
        let response = client
            .post(format!("{}/loans/reserve", BASE_URL))
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({ "bookId": book_id }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 201);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["reserve"]["position"], expected_position);
        assert_eq!(body["reserve"]["status"], "ACTIVE");
    }

    // Return: the head reservation is fulfilled, the copy transfers
    let response = client
        .patch(format!("{}/loans/{}/status", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "status": "RETURNED" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    // availableQty stays 0: one loan closed, one opened
    let book = get_book(&client, &admin, book_id).await;
    assert_eq!(book["availableQty"], 0);
    assert_eq!(book["status"], "BORROWED");

    // First reader now holds an ACTIVE loan
    let response = client
        .get(format!("{}/loans/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", first))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let loans = body["loans"].as_array().unwrap();
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0]["status"], "ACTIVE");
    assert_eq!(loans[0]["user"]["id"].as_i64(), Some(first_id));

    // B and C stay queued with unchanged positions
    let response = client
        .get(format!("{}/books/{}/reservations", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let queue = body["reservations"].as_array().unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0]["position"], 2);
    assert_eq!(queue[1]["position"], 3);
}

#[tokio::test]
#[ignore]
async fn test_renewal_extends_due_date() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (reader, _) = reader_token(&client).await;

    let book_id = create_book(&client, &admin, 1).await;
    let response = client
        .post(format!("{}/loans/create", BASE_URL))
        .header("Authorization", format!("Bearer {}", reader))
        .json(&json!({ "bookId": book_id }))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let loan_id = body["loan"]["id"].as_i64().unwrap();
    let original_due = body["loan"]["dueDate"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{}/loans/{}/renew", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", reader))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["loan"]["renewalCount"], 1);
    assert!(body["loan"]["dueDate"].as_str().unwrap() > original_due.as_str());
}

#[tokio::test]
#[ignore]
async fn test_renewal_limit_and_ownership() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (reader, _) = reader_token(&client).await;
    let (other, _) = reader_token(&client).await;

    let book_id = create_book(&client, &admin, 1).await;
    let response = client
        .post(format!("{}/loans/create", BASE_URL))
        .header("Authorization", format!("Bearer {}", reader))
        .json(&json!({ "bookId": book_id }))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let loan_id = body["loan"]["id"].as_i64().unwrap();

    // Someone else cannot renew it
    let response = client
        .post(format!("{}/loans/{}/renew", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", other))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // MAX_RENEWALS defaults to 2: third renewal must be refused
    for expected in [200u16, 200, 409] {
        let response = client
            .post(format!("{}/loans/{}/renew", BASE_URL, loan_id))
            .header("Authorization", format!("Bearer {}", reader))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), expected);
    }
}

#[tokio::test]
#[ignore]
async fn test_overdue_loan_freezes_borrowing() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (reader, _) = reader_token(&client).await;

    let first_book = create_book(&client, &admin, 1).await;
    let second_book = create_book(&client, &admin, 1).await;

    let response = client
        .post(format!("{}/loans/create", BASE_URL))
        .header("Authorization", format!("Bearer {}", reader))
        .json(&json!({ "bookId": first_book }))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let loan_id = body["loan"]["id"].as_i64().unwrap();

    // Librarian marks the loan overdue (normally the sweep's job)
    let response = client
        .patch(format!("{}/loans/{}/status", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "status": "OVERDUE" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    // Borrowing anything else is now frozen
    let response = client
        .post(format!("{}/loans/create", BASE_URL))
        .header("Authorization", format!("Bearer {}", reader))
        .json(&json!({ "bookId": second_book }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_cancel_reservation_requires_holder() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (holder, _) = reader_token(&client).await;
    let (other, _) = reader_token(&client).await;

    let book_id = create_book(&client, &admin, 1).await;

    let response = client
        .post(format!("{}/loans/reserve", BASE_URL))
        .header("Authorization", format!("Bearer {}", holder))
        .json(&json!({ "bookId": book_id }))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let reservation_id = body["reserve"]["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/reservations/{}/cancel", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", other))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = client
        .post(format!("{}/reservations/{}/cancel", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", holder))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["reserve"]["status"], "CANCELLED");
}

#[tokio::test]
#[ignore]
async fn test_book_delete_blocked_by_live_loan() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (reader, _) = reader_token(&client).await;

    let book_id = create_book(&client, &admin, 1).await;
    let response = client
        .post(format!("{}/loans/create", BASE_URL))
        .header("Authorization", format!("Bearer {}", reader))
        .json(&json!({ "bookId": book_id }))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let loan_id = body["loan"]["id"].as_i64().unwrap();

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // After the return the delete goes through
    let response = client
        .patch(format!("{}/loans/{}/status", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "status": "RETURNED" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_settings_roundtrip() {
    let client = Client::new();
    let admin = admin_token(&client).await;

    let response = client
        .get(format!("{}/settings", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    assert!(body["defaultLoanDays"].is_number());
    assert!(body["maxRenewals"].is_number());

    let response = client
        .put(format!("{}/settings", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "maxRenewals": 3 }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["maxRenewals"], 3);

    // Restore the default
    let response = client
        .put(format!("{}/settings", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "maxRenewals": 2 }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans/me", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_staff_role_required_for_status_updates() {
    let client = Client::new();
    let (reader, _) = reader_token(&client).await;

    let response = client
        .patch(format!("{}/loans/1/status", BASE_URL))
        .header("Authorization", format!("Bearer {}", reader))
        .json(&json!({ "status": "RETURNED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}
