//! Full page flows through the storefront router.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::Ordering;

use axum::http::StatusCode;
use novashop_integration_tests::{DECLINED_CARD, TEST_USER_ID, TestStorefront};

fn checkout_form(card_number: &str) -> Vec<(&'static str, &str)> {
    vec![
        ("full_name", "Ada Lovelace"),
        ("address_line1", "12 St James's Square"),
        ("address_line2", ""),
        ("city", "London"),
        ("state", ""),
        ("postal_code", "SW1Y 4JH"),
        ("country", "GB"),
        ("cardholder_name", "Ada Lovelace"),
        ("card_number", card_number),
        ("expiry", "12/30"),
        ("cvc", "123"),
    ]
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_home_lists_products() {
    let shop = TestStorefront::spawn().await;
    let (status, html) = shop.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Featured products"));
    assert!(!html.contains("(search:"));
    assert!(html.contains("Desk Lamp"));
    assert!(html.contains("Wireless Mouse"));
    assert!(html.contains("Ceramic Mug"));
    assert!(html.contains("$49.99"));
}

#[tokio::test]
async fn test_search_filters_and_labels_heading() {
    let shop = TestStorefront::spawn().await;
    let (_, html) = shop.get("/?q=wireless+mouse").await;

    assert!(html.contains("(search: wireless mouse)"));
    assert!(html.contains("Wireless Mouse"));
    assert!(!html.contains("Desk Lamp"));

    // Search box keeps the query
    assert!(html.contains(r#"value="wireless mouse""#));

    let queries = shop.backend.state.product_queries.lock().unwrap().clone();
    assert_eq!(queries, vec![Some("wireless mouse".to_string())]);
}

#[tokio::test]
async fn test_every_visit_refetches_catalog() {
    let shop = TestStorefront::spawn().await;
    shop.get("/?q=lamp").await;
    shop.backend.state.insert_product("p-lamp-xl", "Desk Lamp XL", "69.99");
    let (_, html) = shop.get("/?q=lamp").await;

    assert!(html.contains("Desk Lamp XL"));
    let queries = shop.backend.state.product_queries.lock().unwrap().clone();
    assert_eq!(
        queries,
        vec![Some("lamp".to_string()), Some("lamp".to_string())]
    );
}

#[tokio::test]
async fn test_search_without_matches() {
    let shop = TestStorefront::spawn().await;
    let (_, html) = shop.get("/?q=teapot").await;

    assert!(html.contains("No products found."));
}

#[tokio::test]
async fn test_catalog_failure_shows_error() {
    let shop = TestStorefront::spawn().await;
    shop.backend.state.fail_products.store(true, Ordering::SeqCst);

    let (status, html) = shop.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Failed to load products"));
    assert!(!html.contains("No products found."));
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_empty_cart_message() {
    let shop = TestStorefront::spawn().await;
    let (_, html) = shop.get("/cart").await;

    assert!(html.contains("Your cart is empty."));
    assert!(!html.contains("Subtotal"));
}

#[tokio::test]
async fn test_add_returns_to_search_and_fills_cart() {
    let shop = TestStorefront::spawn().await;

    let (location, html) = shop
        .post_form(
            "/cart/add",
            &[("product_id", "p-lamp"), ("return_to", "/?q=lamp")],
        )
        .await;
    assert_eq!(location, "/?q=lamp");
    assert!(html.contains("(search: lamp)"));

    shop.post_form("/cart/add", &[("product_id", "p-lamp")])
        .await;

    let (_, html) = shop.get("/cart").await;
    assert!(html.contains("Desk Lamp"));
    assert!(html.contains("$99.98"));
    assert!(!html.contains("Your cart is empty."));

    let lines = shop.backend.state.lines_for("guest");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 2);
}

#[tokio::test]
async fn test_add_ignores_offsite_return_paths() {
    let shop = TestStorefront::spawn().await;

    for return_to in [
        "//evil.example.com",
        "/\\evil.example.com",
        "/\t/evil.example.com",
    ] {
        let (location, html) = shop
            .post_form(
                "/cart/add",
                &[("product_id", "p-mug"), ("return_to", return_to)],
            )
            .await;
        assert_eq!(location, "/");
        assert!(html.contains("Featured products"));
    }

    assert_eq!(shop.backend.state.lines_for("guest")[0].quantity, 3);
}

#[tokio::test]
async fn test_update_and_remove_lines() {
    let shop = TestStorefront::spawn().await;
    let line = shop.backend.state.insert_line("guest", "p-mug", 1);

    let (location, html) = shop
        .post_form("/cart/update", &[("line_id", line.as_str()), ("quantity", "3")])
        .await;
    assert_eq!(location, "/cart");
    assert!(html.contains("$36.00"));

    // Zero floors to one
    shop.post_form("/cart/update", &[("line_id", line.as_str()), ("quantity", "0")])
        .await;
    assert_eq!(shop.backend.state.lines_for("guest")[0].quantity, 1);

    let (location, html) = shop
        .post_form("/cart/remove", &[("line_id", line.as_str())])
        .await;
    assert_eq!(location, "/cart");
    assert!(html.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_failed_update_shows_error_and_old_quantity() {
    let shop = TestStorefront::spawn().await;
    let line = shop.backend.state.insert_line("guest", "p-lamp", 2);
    shop.backend
        .state
        .fail_cart_writes
        .store(true, Ordering::SeqCst);

    let (location, html) = shop
        .post_form("/cart/update", &[("line_id", line.as_str()), ("quantity", "3")])
        .await;

    assert_eq!(location, "/cart/update");
    assert!(html.contains("Failed to update cart"));
    assert!(html.contains("$99.98"));
    assert!(!html.contains("$149.97"));
}

#[tokio::test]
async fn test_failed_remove_keeps_line() {
    let shop = TestStorefront::spawn().await;
    let line = shop.backend.state.insert_line("guest", "p-mouse", 1);
    shop.backend
        .state
        .fail_cart_writes
        .store(true, Ordering::SeqCst);

    let (_, html) = shop
        .post_form("/cart/remove", &[("line_id", line.as_str())])
        .await;

    assert!(html.contains("Failed to update cart"));
    assert!(html.contains("Wireless Mouse"));
    assert!(!html.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_cart_load_failure_shows_error_not_empty() {
    let shop = TestStorefront::spawn().await;
    shop.backend.state.insert_line("guest", "p-lamp", 1);
    shop.backend
        .state
        .fail_cart_reads
        .store(true, Ordering::SeqCst);

    let (_, html) = shop.get("/cart").await;

    assert!(html.contains("Failed to load cart"));
    assert!(!html.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_login_switches_cart_without_merging() {
    let shop = TestStorefront::spawn().await;
    shop.backend.state.insert_line(TEST_USER_ID, "p-mug", 4);
    shop.post_form("/cart/add", &[("product_id", "p-lamp")])
        .await;

    let (_, html) = shop.get("/cart").await;
    assert!(html.contains("Desk Lamp"));

    shop.login().await;
    let (_, html) = shop.get("/cart").await;
    assert!(html.contains("Ceramic Mug"));
    assert!(!html.contains("Desk Lamp"));
    assert!(html.contains("$48.00"));

    // Logging out brings the guest cart back
    shop.post_form("/auth/logout", &[]).await;
    let (_, html) = shop.get("/cart").await;
    assert!(html.contains("Desk Lamp"));
    assert!(!html.contains("Ceramic Mug"));
}

// =============================================================================
// Checkout & Orders
// =============================================================================

#[tokio::test]
async fn test_checkout_success_then_orders() {
    let shop = TestStorefront::spawn().await;
    shop.login().await;
    shop.backend.state.insert_line(TEST_USER_ID, "p-mouse", 2);

    let (location, html) = shop
        .post_form("/checkout", &checkout_form("4242 4242 4242 4242"))
        .await;

    let orders = shop.backend.state.orders_for(TEST_USER_ID);
    assert_eq!(orders.len(), 1);
    let order_id = orders[0]["id"].as_str().unwrap().to_string();

    assert_eq!(location, format!("/order-success/{order_id}"));
    assert!(html.contains("Payment successful"));
    assert!(html.contains(&order_id));
    assert!(shop.backend.state.lines_for(TEST_USER_ID).is_empty());

    let (_, html) = shop.get("/orders").await;
    let short_id = &order_id[order_id.len() - 6..];
    assert!(html.contains(&format!("Order #{short_id}")));
    assert!(html.contains("$49.00"));
    assert!(html.contains("1 items"));
}

#[tokio::test]
async fn test_declined_checkout_keeps_address_not_card() {
    let shop = TestStorefront::spawn().await;
    shop.backend.state.insert_line("guest", "p-lamp", 1);

    let (location, html) = shop
        .post_form("/checkout", &checkout_form(DECLINED_CARD))
        .await;

    assert_eq!(location, "/checkout");
    assert!(html.contains("Payment failed"));
    assert!(html.contains("London"));
    assert!(!html.contains(DECLINED_CARD));
    assert_eq!(shop.backend.state.lines_for("guest").len(), 1);
}

#[tokio::test]
async fn test_guest_orders_are_separate() {
    let shop = TestStorefront::spawn().await;
    shop.backend.state.insert_line(TEST_USER_ID, "p-mug", 1);
    shop.login().await;
    shop.post_form("/checkout", &checkout_form("4242424242424242"))
        .await;
    shop.post_form("/auth/logout", &[]).await;

    let (_, html) = shop.get("/orders").await;
    assert!(html.contains("No orders yet."));
}

// =============================================================================
// Infrastructure
// =============================================================================

#[tokio::test]
async fn test_health_and_headers() {
    let shop = TestStorefront::spawn().await;

    let response = shop.client.get(shop.url("/health")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.headers().contains_key("content-security-policy"));
    assert_eq!(
        response.headers()["x-frame-options"].to_str().unwrap(),
        "DENY"
    );
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let shop = TestStorefront::spawn().await;

    let response = shop
        .client
        .get(shop.url("/"))
        .header("x-request-id", "trace-abc")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.headers()["x-request-id"].to_str().unwrap(),
        "trace-abc"
    );
}

#[tokio::test]
async fn test_static_assets_served() {
    let shop = TestStorefront::spawn().await;
    let (status, css) = shop.get("/static/css/main.css").await;

    assert_eq!(status, StatusCode::OK);
    assert!(!css.is_empty());
}
