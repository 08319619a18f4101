//! Integration tests for the visitor wishlist.
//!
//! Wishlists follow the browser through the session cookie; no login is
//! needed.

use axum::http::StatusCode;
use jewelbox_integration_tests::TestApp;

async fn toggle(app: &TestApp, id: &str, name: &str, price: &str) -> (StatusCode, String) {
    let response = app
        .client
        .post(app.url("/wishlist/toggle"))
        .header("HX-Request", "true")
        .form(&[("id", id), ("name", name), ("price", price), ("image", "")])
        .send()
        .await
        .expect("Failed to toggle wishlist");

    let status = response.status();
    let trigger = response
        .headers()
        .get("HX-Trigger")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    assert_eq!(trigger.as_deref(), Some("wishlist-updated"));

    (status, response.text().await.expect("Failed to read body"))
}

// ============================================================================
// Toggle
// ============================================================================

#[tokio::test]
async fn test_toggle_adds_then_removes() {
    let app = TestApp::spawn().await;

    let (status, body) = toggle(&app, "e1", "Pearl Drops", "9800").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("aria-pressed=\"true\""));
    assert!(app.htmx_get("/wishlist/count").await.contains(">1</span>"));

    let (status, body) = toggle(&app, "e1", "Pearl Drops", "9800").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("aria-pressed=\"false\""));
    assert!(!app.htmx_get("/wishlist/count").await.contains("badge"));
}

#[tokio::test]
async fn test_toggle_rejects_missing_id() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/wishlist/toggle"))
        .form(&[("id", " "), ("name", "Nothing")])
        .send()
        .await
        .expect("Failed to toggle wishlist");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wishlist_page_lists_liked_pieces() {
    let app = TestApp::spawn().await;

    toggle(&app, "r1", "Solitaire Ring", "45000").await;
    toggle(&app, "e1", "Pearl Drops", "9800").await;

    let (status, body) = app.get("/wishlist").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Solitaire Ring"));
    assert!(body.contains("Pearl Drops"));
    assert!(body.contains("₹9,800.00"));
}

#[tokio::test]
async fn test_listing_hearts_reflect_wishlist() {
    let app = TestApp::spawn().await;

    let (_, before) = app.get("/category/rings").await;
    assert!(!before.contains("aria-pressed=\"true\""));

    toggle(&app, "r2", "Stacking Band", "3200").await;

    let (_, after) = app.get("/category/rings").await;
    assert_eq!(after.matches("aria-pressed=\"true\"").count(), 1);
}

// ============================================================================
// Isolation and Persistence
// ============================================================================

#[tokio::test]
async fn test_wishlists_are_per_browser() {
    let app = TestApp::spawn().await;

    toggle(&app, "r1", "Solitaire Ring", "45000").await;

    let other = app.other_browser();
    let badge = other
        .get(app.url("/wishlist/count"))
        .send()
        .await
        .expect("Failed to fetch count")
        .text()
        .await
        .expect("Failed to read body");

    assert!(!badge.contains("badge"));
}

#[tokio::test]
async fn test_toggle_is_persisted() {
    let app = TestApp::spawn().await;
    assert!(app.wishlists.is_empty());

    toggle(&app, "r1", "Solitaire Ring", "45000").await;

    assert_eq!(app.wishlists.len(), 1);
}

#[tokio::test]
async fn test_storage_failure_keeps_in_memory_state() {
    let app = TestApp::spawn().await;
    app.wishlists.set_fail_writes(true);

    let (status, body) = toggle(&app, "r1", "Solitaire Ring", "45000").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("aria-pressed=\"true\""));
    assert!(app.htmx_get("/wishlist/count").await.contains(">1</span>"));
    assert!(app.wishlists.is_empty());

    let (status, _) = app.get("/health/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
