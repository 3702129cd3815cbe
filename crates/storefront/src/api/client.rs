//! `reqwest` implementation of the backend client.

use std::sync::Arc;

use novashop_core::{
    CartLine, CheckoutReceipt, CheckoutRequest, Email, LineId, Order, Product, ProductId,
    Quantity, UserProfile,
};
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::cache::CatalogCache;
use super::{ApiError, CartApi, CatalogApi};
use crate::config::ApiConfig;

/// How much of an error body to keep for logs and error messages.
const BODY_EXCERPT_CHARS: usize = 200;

/// Client for the NovaShop backend API.
///
/// Cheap to clone; clones share the connection pool and catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    catalog: CatalogCache,
}

/// List responses are wrapped as `{items: [...]}`; a missing list is empty.
#[derive(Deserialize)]
struct Items<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct AddLineBody<'a> {
    user_id: &'a str,
    product_id: &'a ProductId,
    quantity: Quantity,
}

#[derive(Serialize)]
struct UpdateLineBody {
    quantity: Quantity,
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be used as a path prefix or
    /// the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        if config.base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(config.base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                catalog: CatalogCache::new(config.catalog_cache_ttl),
            }),
        })
    }

    /// Build `<base>/api/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.inner.client.request(method, self.endpoint(segments))
    }

    /// Send a request and return the body of a success response.
    async fn send_raw(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
            tracing::warn!(status = %status, body = %excerpt, "Backend returned non-success status");
            return Err(ApiError::Status {
                status,
                body: excerpt,
            });
        }

        Ok(body)
    }

    /// Send a request and parse the JSON body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send_raw(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(BODY_EXCERPT_CHARS).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for the user record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidCredentials` for any non-success status,
    /// otherwise transport or parse errors.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<UserProfile, ApiError> {
        let request = self
            .request(Method::POST, &["auth", "login"])
            .json(&LoginBody {
                email: email.as_str(),
                password: password.expose_secret(),
            });

        self.send_json(request).await.map_err(|e| match e {
            ApiError::Status { .. } => ApiError::InvalidCredentials,
            other => other,
        })
    }

    /// Create an account. The caller logs in separately afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::RegistrationFailed` for any non-success status,
    /// otherwise transport errors.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, &["auth", "register"])
            .json(&RegisterBody {
                name,
                email: email.as_str(),
                password: password.expose_secret(),
            });

        self.send_raw(request).await.map(drop).map_err(|e| match e {
            ApiError::Status { .. } => ApiError::RegistrationFailed,
            other => other,
        })
    }

    // =========================================================================
    // Checkout & Orders
    // =========================================================================

    /// Submit the checkout form; returns the new order ID on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the payment or the request fails.
    #[instrument(skip(self, checkout), fields(user_id = %checkout.user_id))]
    pub async fn checkout(&self, checkout: &CheckoutRequest) -> Result<CheckoutReceipt, ApiError> {
        let request = self.request(Method::POST, &["checkout"]).json(checkout);
        self.send_json(request).await
    }

    /// Order history stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn orders(&self, key: &str) -> Result<Vec<Order>, ApiError> {
        let request = self.request(Method::GET, &["orders", key]);
        let orders: Items<Order> = self.send_json(request).await?;
        Ok(orders.items)
    }
}

impl CatalogApi for ApiClient {
    #[instrument(skip(self))]
    async fn products(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        if let Some(products) = self.inner.catalog.get(query).await {
            debug!("Cache hit for product listing");
            return Ok(products.as_ref().clone());
        }

        let mut url = self.endpoint(&["products"]);
        if !query.is_empty() {
            url.query_pairs_mut().append_pair("q", query);
        }

        let request = self.inner.client.get(url);
        let listing: Items<Product> = self.send_json(request).await?;
        self.inner
            .catalog
            .insert(query, Arc::new(listing.items.clone()))
            .await;

        Ok(listing.items)
    }
}

impl CartApi for ApiClient {
    #[instrument(skip(self))]
    async fn cart(&self, key: &str) -> Result<Vec<CartLine>, ApiError> {
        let request = self.request(Method::GET, &["cart", key]);
        let cart: Items<CartLine> = self.send_json(request).await?;
        Ok(cart.items)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn add_line(
        &self,
        key: &str,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<(), ApiError> {
        let request = self.request(Method::POST, &["cart"]).json(&AddLineBody {
            user_id: key,
            product_id,
            quantity,
        });
        self.send_raw(request).await.map(drop)
    }

    #[instrument(skip(self), fields(line_id = %line_id, quantity = %quantity))]
    async fn update_line(&self, line_id: &LineId, quantity: Quantity) -> Result<(), ApiError> {
        let request = self
            .request(Method::PATCH, &["cart", line_id.as_str()])
            .json(&UpdateLineBody { quantity });
        self.send_raw(request).await.map(drop)
    }

    #[instrument(skip(self), fields(line_id = %line_id))]
    async fn remove_line(&self, line_id: &LineId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &["cart", line_id.as_str()]);
        self.send_raw(request).await.map(drop)
    }
}
