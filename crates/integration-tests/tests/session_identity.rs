//! Session identity persistence through the storefront.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use novashop_integration_tests::{TEST_EMAIL, TestStorefront};

const SIGNED_IN_MARKER: &str = "Signed in as Ada";
const GUEST_MARKER: &str = r#"href="/auth/login""#;

#[tokio::test]
async fn test_new_visitor_is_guest() {
    let shop = TestStorefront::spawn().await;
    let (status, html) = shop.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(GUEST_MARKER));
    assert!(!html.contains(SIGNED_IN_MARKER));
}

#[tokio::test]
async fn test_login_persists_across_requests() {
    let shop = TestStorefront::spawn().await;

    let (location, html) = shop.login().await;
    assert_eq!(location, "/");
    assert!(html.contains(SIGNED_IN_MARKER));

    // Later requests carry only the cookie
    let (_, html) = shop.get("/cart").await;
    assert!(html.contains(SIGNED_IN_MARKER));
    let (_, html) = shop.get("/orders").await;
    assert!(html.contains(SIGNED_IN_MARKER));
}

#[tokio::test]
async fn test_sessions_are_per_browser() {
    let shop = TestStorefront::spawn().await;
    shop.login().await;

    let other = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap();
    let html = other
        .get(shop.url("/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(html.contains(GUEST_MARKER));
}

#[tokio::test]
async fn test_wrong_password_stays_guest() {
    let shop = TestStorefront::spawn().await;

    let (location, html) = shop
        .post_form(
            "/auth/login",
            &[("email", TEST_EMAIL), ("password", "not-it")],
        )
        .await;

    assert_eq!(location, "/auth/login?error=credentials");
    assert!(html.contains("Invalid credentials"));
    assert!(!html.contains(SIGNED_IN_MARKER));
}

#[tokio::test]
async fn test_malformed_email_is_rejected_before_backend() {
    let shop = TestStorefront::spawn().await;

    let (location, _) = shop
        .post_form(
            "/auth/login",
            &[("email", "not-an-email"), ("password", "x")],
        )
        .await;

    assert_eq!(location, "/auth/login?error=credentials");
}

#[tokio::test]
async fn test_logout_returns_to_guest() {
    let shop = TestStorefront::spawn().await;
    shop.login().await;

    let (location, html) = shop.post_form("/auth/logout", &[]).await;
    assert_eq!(location, "/");
    assert!(html.contains(GUEST_MARKER));

    let (_, html) = shop.get("/cart").await;
    assert!(!html.contains(SIGNED_IN_MARKER));
}

#[tokio::test]
async fn test_register_then_login() {
    let shop = TestStorefront::spawn().await;

    let (location, html) = shop
        .post_form(
            "/auth/register",
            &[
                ("name", "Grace"),
                ("email", "grace@example.com"),
                ("password", "cobol-1959"),
            ],
        )
        .await;
    assert_eq!(location, "/auth/login?success=registered");
    assert!(html.contains("Account created. Please log in."));

    // Registration alone does not sign in
    assert!(!html.contains("Signed in as Grace"));

    let (location, html) = shop
        .post_form(
            "/auth/login",
            &[("email", "grace@example.com"), ("password", "cobol-1959")],
        )
        .await;
    assert_eq!(location, "/");
    assert!(html.contains("Signed in as Grace"));
}

#[tokio::test]
async fn test_duplicate_registration_fails() {
    let shop = TestStorefront::spawn().await;

    let (location, html) = shop
        .post_form(
            "/auth/register",
            &[("name", "Ada"), ("email", TEST_EMAIL), ("password", "x")],
        )
        .await;

    assert_eq!(location, "/auth/register?error=registration");
    assert!(html.contains("Registration failed"));
}

#[tokio::test]
async fn test_login_limit_ignores_spoofed_forwarded_for() {
    let shop = TestStorefront::spawn().await;

    let mut statuses = Vec::new();
    for n in 1..=6 {
        let response = shop
            .client
            .post(shop.url("/auth/login"))
            .header("x-forwarded-for", format!("198.51.100.{n}"))
            .form(&[("email", TEST_EMAIL), ("password", "not-it")])
            .send()
            .await
            .unwrap();
        statuses.push(response.status().as_u16());
    }

    // Burst of five from one peer, whatever the header claims
    assert!(statuses[..5].iter().all(|status| *status != 429));
    assert_eq!(statuses[5], 429);
}
