//! Integration tests for browsing: home, category, price band, gift band and
//! product detail pages.

use axum::http::StatusCode;
use jewelbox_integration_tests::{TestApp, unreachable_api};

// ============================================================================
// Category Listings
// ============================================================================

#[tokio::test]
async fn test_category_renders_bare_array_listing() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/category/rings").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>Rings</h1>"));
    assert!(body.contains("Solitaire Ring"));
    assert!(body.contains("Stacking Band"));
    assert!(body.contains("₹45,000.00"));
    assert!(!body.contains("Temple Necklace"));
}

#[tokio::test]
async fn test_category_renders_wrapped_listing() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/category/necklaces").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Temple Necklace"));
    assert!(body.contains("Sold out"));
    assert!(body.contains("₹90,000.00"));
}

#[tokio::test]
async fn test_empty_category_shows_empty_state() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/category/anklets").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No pieces found. Please check back soon."));
}

#[tokio::test]
async fn test_unreachable_api_degrades_to_empty_state() {
    let app = TestApp::spawn_with_api(unreachable_api().await).await;

    let (status, body) = app.get("/category/rings").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No pieces found. Please check back soon."));

    let (status, body) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No pieces found. Please check back soon."));
}

// ============================================================================
// Price and Gift Bands
// ============================================================================

#[tokio::test]
async fn test_price_band_filters_products() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/price/5000/50000").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Solitaire Ring"));
    assert!(body.contains("Pearl Drops"));
    assert!(!body.contains("Stacking Band"));
    assert!(!body.contains("Temple Necklace"));
}

#[tokio::test]
async fn test_price_band_rejects_inverted_bounds() {
    let app = TestApp::spawn().await;

    let (status, _) = app.get("/price/50000/5000").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/price/cheap/5000").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_gift_band_lists_products_in_range() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/gifts/under-5000").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Gifts under 5,000"));
    assert!(body.contains("Stacking Band"));
    assert!(!body.contains("Solitaire Ring"));
}

#[tokio::test]
async fn test_luxury_band_is_open_ended() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/gifts/luxury").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Temple Necklace"));
}

#[tokio::test]
async fn test_unknown_gift_band_is_not_found() {
    let app = TestApp::spawn().await;

    let (status, _) = app.get("/gifts/priceless").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Home and Product Detail
// ============================================================================

#[tokio::test]
async fn test_home_features_configured_category() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Solitaire Ring"));
    assert!(body.contains("/gifts/luxury"));
    assert!(body.contains("/category/earrings"));
}

#[tokio::test]
async fn test_product_detail_page() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/products/r1").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>Solitaire Ring</h1>"));
    assert!(body.contains("Rated 4.8 / 5"));
    assert!(body.contains("Only 2 left"));
    assert!(body.contains("hx-post=\"/cart/add\""));
    assert!(body.contains("id=\"cart-feedback\""));
}

#[tokio::test]
async fn test_sold_out_product_has_no_add_to_cart() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/products/n1").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Sold out"));
    assert!(!body.contains("hx-post=\"/cart/add\""));
}

#[tokio::test]
async fn test_missing_product_renders_not_found_page() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/products/missing").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Not found"));
}
