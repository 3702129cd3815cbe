//! Integration test harness for the NovaShop storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p novashop-integration-tests
//! ```
//!
//! No external services are needed. [`MockBackend`] serves the backend's
//! REST API from memory on an ephemeral port, and [`TestStorefront`] runs the
//! real storefront router against it with an in-memory session store.
//!
//! # Test Categories
//!
//! - `api_client` - `ApiClient` against the mock backend
//! - `cart_view_model` - Optimistic cart flows over real HTTP
//! - `session_identity` - Identity persistence in the session store
//! - `storefront_pages` - Full page flows through the router

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use novashop_storefront::api::ApiClient;
use novashop_storefront::config::{ApiConfig, StorefrontConfig};
use novashop_storefront::middleware::configure_session_layer;
use novashop_storefront::state::AppState;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::MemoryStore;
use url::Url;

/// Card number the mock backend always declines.
pub const DECLINED_CARD: &str = "4000000000000002";

/// Seeded account.
pub const TEST_EMAIL: &str = "ada@example.com";
pub const TEST_PASSWORD: &str = "correct-horse";
pub const TEST_USER_ID: &str = "user-ada";

// =============================================================================
// Mock Backend
// =============================================================================

/// A cart line as the mock stores it.
#[derive(Debug, Clone)]
pub struct MockLine {
    pub id: String,
    pub owner: String,
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone)]
struct MockUser {
    id: String,
    name: String,
    email: String,
    password: String,
}

/// In-memory backend state. Tests read and poke it directly.
#[derive(Debug, Default)]
pub struct MockState {
    products: Mutex<Vec<Value>>,
    lines: Mutex<Vec<MockLine>>,
    users: Mutex<Vec<MockUser>>,
    orders: Mutex<Vec<(String, Value)>>,
    next_id: AtomicU64,
    /// Every `q` the products endpoint received (`None` when absent).
    pub product_queries: Mutex<Vec<Option<String>>>,
    /// Make `GET /api/products` fail with 500.
    pub fail_products: AtomicBool,
    /// Make `GET /api/cart/{key}` fail with 500.
    pub fail_cart_reads: AtomicBool,
    /// Make cart `POST`/`PATCH`/`DELETE` fail with 500.
    pub fail_cart_writes: AtomicBool,
    /// Make `GET /api/products` return a body that is not JSON.
    pub garble_products: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("mock state mutex poisoned")
}

impl MockState {
    fn seeded() -> Self {
        let state = Self::default();
        *lock(&state.products) = vec![
            json!({"id": "p-lamp", "title": "Desk Lamp", "price": "49.99",
                   "image_url": "https://img.example.com/lamp.jpg",
                   "description": "Warm light for late nights", "rating": 4.5}),
            json!({"id": "p-mouse", "title": "Wireless Mouse", "price": "24.50",
                   "description": "Quiet clicks", "rating": 4.1}),
            json!({"id": "p-mug", "title": "Ceramic Mug", "price": "12.00"}),
        ];
        lock(&state.users).push(MockUser {
            id: TEST_USER_ID.to_string(),
            name: "Ada".to_string(),
            email: TEST_EMAIL.to_string(),
            password: TEST_PASSWORD.to_string(),
        });
        state
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn product(&self, id: &str) -> Option<Value> {
        lock(&self.products)
            .iter()
            .find(|p| p["id"] == id)
            .cloned()
    }

    fn price_cents(product: &Value) -> i64 {
        let price = product["price"].as_str().unwrap_or("0");
        let (whole, frac) = price.split_once('.').unwrap_or((price, "0"));
        whole.parse::<i64>().unwrap_or(0) * 100 + format!("{frac:0<2}")[..2].parse::<i64>().unwrap_or(0)
    }

    /// Lines currently stored under `owner`, in insertion order.
    pub fn lines_for(&self, owner: &str) -> Vec<MockLine> {
        lock(&self.lines)
            .iter()
            .filter(|l| l.owner == owner)
            .cloned()
            .collect()
    }

    /// Add a product to the catalog after startup.
    pub fn insert_product(&self, id: &str, title: &str, price: &str) {
        lock(&self.products).push(json!({"id": id, "title": title, "price": price}));
    }

    /// Put a line straight into a cart, bypassing the API.
    pub fn insert_line(&self, owner: &str, product_id: &str, quantity: u32) -> String {
        let id = self.next_id("line");
        lock(&self.lines).push(MockLine {
            id: id.clone(),
            owner: owner.to_string(),
            product_id: product_id.to_string(),
            quantity,
        });
        id
    }

    /// Orders placed under `owner`.
    pub fn orders_for(&self, owner: &str) -> Vec<Value> {
        lock(&self.orders)
            .iter()
            .filter(|(o, _)| o == owner)
            .map(|(_, order)| order.clone())
            .collect()
    }

    fn line_json(&self, line: &MockLine) -> Value {
        json!({
            "id": line.id,
            "product": self.product(&line.product_id),
            "quantity": line.quantity,
        })
    }
}

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "injected failure"}))).into_response()
}

async fn list_products(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let query = params.get("q").cloned();
    lock(&state.product_queries).push(query.clone());

    if state.fail_products.load(Ordering::SeqCst) {
        return server_error();
    }
    if state.garble_products.load(Ordering::SeqCst) {
        return (StatusCode::OK, "<html>not json</html>").into_response();
    }

    let needle = query.unwrap_or_default().to_lowercase();
    let items: Vec<Value> = lock(&state.products)
        .iter()
        .filter(|p| {
            p["title"]
                .as_str()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect();

    Json(json!({ "items": items })).into_response()
}

async fn get_cart(State(state): State<Arc<MockState>>, Path(key): Path<String>) -> Response {
    if state.fail_cart_reads.load(Ordering::SeqCst) {
        return server_error();
    }
    let items: Vec<Value> = state
        .lines_for(&key)
        .iter()
        .map(|l| state.line_json(l))
        .collect();
    Json(json!({ "items": items })).into_response()
}

#[derive(Deserialize)]
struct AddLine {
    user_id: String,
    product_id: String,
    quantity: u32,
}

async fn add_line(State(state): State<Arc<MockState>>, Json(body): Json<AddLine>) -> Response {
    if state.fail_cart_writes.load(Ordering::SeqCst) {
        return server_error();
    }

    let existing = {
        let mut lines = lock(&state.lines);
        lines
            .iter_mut()
            .find(|l| l.owner == body.user_id && l.product_id == body.product_id)
            .map(|line| {
                line.quantity += body.quantity;
                line.id.clone()
            })
    };
    let id = existing
        .unwrap_or_else(|| state.insert_line(&body.user_id, &body.product_id, body.quantity));

    (StatusCode::CREATED, Json(json!({ "id": id }))).into_response()
}

#[derive(Deserialize)]
struct UpdateLine {
    quantity: u32,
}

async fn update_line(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateLine>,
) -> Response {
    if state.fail_cart_writes.load(Ordering::SeqCst) {
        return server_error();
    }
    let mut lines = lock(&state.lines);
    match lines.iter_mut().find(|l| l.id == id) {
        Some(line) => {
            line.quantity = body.quantity;
            Json(json!({ "ok": true })).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_line(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    if state.fail_cart_writes.load(Ordering::SeqCst) {
        return server_error();
    }
    let mut lines = lock(&state.lines);
    let before = lines.len();
    lines.retain(|l| l.id != id);
    if lines.len() == before {
        StatusCode::NOT_FOUND.into_response()
    } else {
        Json(json!({ "ok": true })).into_response()
    }
}

#[derive(Deserialize)]
struct Credentials {
    #[serde(default)]
    name: String,
    email: String,
    password: String,
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Credentials>) -> Response {
    let users = lock(&state.users);
    match users
        .iter()
        .find(|u| u.email == body.email && u.password == body.password)
    {
        Some(user) => {
            Json(json!({ "id": user.id, "name": user.name, "email": user.email })).into_response()
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Invalid credentials" })),
        )
            .into_response(),
    }
}

async fn register(State(state): State<Arc<MockState>>, Json(body): Json<Credentials>) -> Response {
    if lock(&state.users).iter().any(|u| u.email == body.email) {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "detail": "Email already registered" })),
        )
            .into_response();
    }

    let id = state.next_id("user");
    lock(&state.users).push(MockUser {
        id: id.clone(),
        name: body.name,
        email: body.email,
        password: body.password,
    });
    (StatusCode::CREATED, Json(json!({ "id": id }))).into_response()
}

async fn checkout(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let owner = body["user_id"].as_str().unwrap_or("guest").to_string();
    if body["payment"]["card_number"] == DECLINED_CARD {
        return (
            StatusCode::PAYMENT_REQUIRED,
            Json(json!({ "detail": "Card declined" })),
        )
            .into_response();
    }

    let lines = state.lines_for(&owner);
    let total_cents: i64 = lines
        .iter()
        .map(|l| {
            state
                .product(&l.product_id)
                .map_or(0, |p| MockState::price_cents(&p))
                * i64::from(l.quantity)
        })
        .sum();
    let items: Vec<Value> = lines.iter().map(|l| state.line_json(l)).collect();

    let id = format!(
        "65f0c2a1b9{:04}",
        state.next_id.fetch_add(1, Ordering::SeqCst) + 1
    );
    let order = json!({
        "id": id,
        "total": format!("{}.{:02}", total_cents / 100, total_cents % 100),
        "items": items,
        "status": "paid",
    });
    lock(&state.orders).push((owner.clone(), order));
    lock(&state.lines).retain(|l| l.owner != owner);

    Json(json!({ "id": id })).into_response()
}

async fn list_orders(State(state): State<Arc<MockState>>, Path(key): Path<String>) -> Response {
    Json(json!({ "items": state.orders_for(&key) })).into_response()
}

/// The NovaShop backend API, served from memory.
pub struct MockBackend {
    pub url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    /// Start a seeded backend on an ephemeral port.
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::seeded());

        let app = Router::new()
            .route("/api/products", get(list_products))
            .route("/api/cart", post(add_line))
            .route(
                "/api/cart/{id}",
                get(get_cart).patch(update_line).delete(delete_line),
            )
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/checkout", post(checkout))
            .route("/api/orders/{key}", get(list_orders))
            .with_state(state.clone());

        let addr = serve(app).await;
        Self {
            url: format!("http://{addr}"),
            state,
        }
    }

    /// Default client settings pointing at this backend.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(Url::parse(&self.url).expect("mock URL is valid"))
    }

    /// A storefront API client for this backend.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.api_config()).expect("client builds")
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("test server");
    });
    addr
}

// =============================================================================
// Storefront
// =============================================================================

/// A storefront running against a [`MockBackend`].
pub struct TestStorefront {
    pub url: String,
    pub backend: MockBackend,
    /// Browser-like client: keeps cookies, follows redirects.
    pub client: reqwest::Client,
}

impl TestStorefront {
    /// Start the storefront router with a `MemoryStore` session layer.
    ///
    /// The `PostgreSQL` pool is lazy and never connected; only
    /// `/health/ready` would touch it.
    pub async fn spawn() -> Self {
        let backend = MockBackend::spawn().await;

        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://novashop@127.0.0.1:1/unused".to_string()),
            host: "127.0.0.1".parse().expect("valid ip"),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            api: backend.api_config(),
            static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../storefront/static"),
            trust_proxy_headers: false,
            sentry_dsn: None,
            sentry_environment: None,
        };
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://novashop@127.0.0.1:1/unused")
            .expect("lazy pool");
        let state = AppState::new(config, pool).expect("state builds");

        let session_layer = configure_session_layer(MemoryStore::default(), false);
        let app = novashop_storefront::app(state, session_layer);
        let addr = serve(app).await;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("client builds");

        Self {
            url: format!("http://{addr}"),
            backend,
            client,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }

    /// GET a page and return its status and body.
    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("request");
        let status = StatusCode::from_u16(response.status().as_u16()).expect("status");
        (status, response.text().await.expect("body"))
    }

    /// POST a form, following any redirect. Returns the final URL path and body.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> (String, String) {
        let response = self
            .client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("request");
        let final_url = response.url().clone();
        let location = match final_url.query() {
            Some(query) => format!("{}?{query}", final_url.path()),
            None => final_url.path().to_string(),
        };
        (location, response.text().await.expect("body"))
    }

    /// Log in as the seeded user.
    pub async fn login(&self) -> (String, String) {
        self.post_form(
            "/auth/login",
            &[("email", TEST_EMAIL), ("password", TEST_PASSWORD)],
        )
        .await
    }
}
