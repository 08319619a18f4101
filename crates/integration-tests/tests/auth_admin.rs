//! Integration tests for login, logout and the admin panels.

use axum::http::StatusCode;
use jewelbox_integration_tests::{ADMIN_EMAIL, CUSTOMER_EMAIL, PASSWORD, TestApp};

fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_page_renders() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/auth/login?next=/cart").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("name=\"password\""));
    assert!(body.contains("value=\"/cart\""));
}

#[tokio::test]
async fn test_customer_login_redirects_home() {
    let app = TestApp::spawn().await;

    let response = app.login(CUSTOMER_EMAIL, PASSWORD).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let (_, body) = app.get("/").await;
    assert!(body.contains("Hi, Priya"));
    assert!(!body.contains("href=\"/admin/reports\""));
}

#[tokio::test]
async fn test_admin_login_lands_on_reports() {
    let app = TestApp::spawn().await;

    let response = app.login(ADMIN_EMAIL, PASSWORD).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/reports");
}

#[tokio::test]
async fn test_wrong_password_shows_error() {
    let app = TestApp::spawn().await;

    let response = app.login(CUSTOMER_EMAIL, "wrong").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response);
    assert!(target.starts_with("/auth/login?error=credentials"));

    let (_, body) = app.get(&target).await;
    assert!(body.contains("match our records"));
    assert!(body.contains("Log in"));
}

#[tokio::test]
async fn test_malformed_email_is_rejected_locally() {
    let app = TestApp::spawn().await;

    let response = app.login("not-an-email", PASSWORD).await;

    assert!(location(&response).starts_with("/auth/login?error=email"));
}

#[tokio::test]
async fn test_logout_clears_customer() {
    let app = TestApp::spawn().await;
    app.login(CUSTOMER_EMAIL, PASSWORD).await;

    let response = app
        .client
        .post(app.url("/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let (_, body) = app.get("/").await;
    assert!(!body.contains("Hi, Priya"));

    let response = app
        .client
        .get(app.url("/cart"))
        .send()
        .await
        .expect("Failed to fetch cart");
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let app = TestApp::spawn().await;

    let mut limited = false;
    for _ in 0..10 {
        let response = app.login(CUSTOMER_EMAIL, "wrong").await;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            limited = true;
            break;
        }
    }

    assert!(limited);
}

// ============================================================================
// Admin Panels
// ============================================================================

#[tokio::test]
async fn test_admin_requires_login() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/admin/customers"))
        .send()
        .await
        .expect("Failed to fetch admin page");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_admin_forbids_customers() {
    let app = TestApp::spawn().await;
    app.login(CUSTOMER_EMAIL, PASSWORD).await;

    for path in ["/admin/customers", "/admin/orders", "/admin/reports"] {
        let (status, _) = app.get(path).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{path}");
    }
}

#[tokio::test]
async fn test_admin_customers_page() {
    let app = TestApp::spawn().await;
    app.login(ADMIN_EMAIL, PASSWORD).await;

    let (status, body) = app.get("/admin/customers").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(CUSTOMER_EMAIL));
    assert!(body.contains("02 Mar 2024"));
}

#[tokio::test]
async fn test_admin_orders_newest_first() {
    let app = TestApp::spawn().await;
    app.login(ADMIN_EMAIL, PASSWORD).await;

    let (status, body) = app.get("/admin/orders").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("2 orders, 1 open"));
    let newest = body.find("<code>o2</code>").expect("o2 listed");
    let oldest = body.find("<code>o1</code>").expect("o1 listed");
    assert!(newest < oldest);
}

#[tokio::test]
async fn test_admin_reports_page() {
    let app = TestApp::spawn().await;
    app.login(ADMIN_EMAIL, PASSWORD).await;

    let (status, body) = app.get("/admin/reports").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("₹58,000.00"));
    assert!(body.contains("Solitaire Ring"));
    assert!(body.contains("value=\"100\""));
}
