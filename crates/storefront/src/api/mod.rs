//! NovaShop backend API client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`
//! - The backend is the source of truth - NO local copy of carts or orders
//! - Catalog listings can be cached in memory via `moka` (opt-in TTL, per query)
//!
//! # Endpoints
//!
//! ```text
//! GET    /api/products?q=<query>    {items: Product[]}
//! POST   /api/auth/login            identity record
//! POST   /api/auth/register         created record
//! GET    /api/cart/{key}            {items: CartLine[]}
//! POST   /api/cart                  add a line
//! PATCH  /api/cart/{line_id}        update a line
//! DELETE /api/cart/{line_id}        remove a line
//! POST   /api/checkout              {id}
//! GET    /api/orders/{key}          {items: Order[]}
//! ```
//!
//! `{key}` is the user ID, or `guest` for unauthenticated sessions.
//!
//! # Example
//!
//! ```rust,ignore
//! use novashop_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let products = client.products("wireless mouse").await?;
//! ```

mod cache;
mod client;

pub use client::ApiClient;

use std::future::Future;

use novashop_core::{CartLine, LineId, Product, ProductId, Quantity};
use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: StatusCode,
        /// First bytes of the response body, for diagnostics.
        body: String,
    },

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Login was rejected.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Registration was rejected.
    #[error("Registration failed")]
    RegistrationFailed,

    /// The configured base URL cannot carry API paths.
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Coarse failure classes shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failure or non-2xx response.
    TransportFailure,
    /// Malformed response body.
    ParseFailure,
    /// The backend rejected user input (credentials, registration data).
    ValidationFailure,
}

impl ApiError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) | Self::Status { .. } | Self::InvalidBaseUrl(_) => {
                ErrorKind::TransportFailure
            }
            Self::Parse(_) => ErrorKind::ParseFailure,
            Self::InvalidCredentials | Self::RegistrationFailed => ErrorKind::ValidationFailure,
        }
    }
}

/// Catalog reads.
pub trait CatalogApi: Send + Sync {
    /// List products matching `query`; an empty query lists everything.
    fn products(&self, query: &str) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;
}

/// Cart reads and mutations, keyed by identity.
pub trait CartApi: Send + Sync {
    /// Read the cart stored under `key`.
    fn cart(&self, key: &str) -> impl Future<Output = Result<Vec<CartLine>, ApiError>> + Send;

    /// Add `quantity` of a product to the cart under `key`.
    fn add_line(
        &self,
        key: &str,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Set the quantity of a line.
    fn update_line(
        &self,
        line_id: &LineId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Delete a line.
    fn remove_line(&self, line_id: &LineId) -> impl Future<Output = Result<(), ApiError>> + Send;
}
