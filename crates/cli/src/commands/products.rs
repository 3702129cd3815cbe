//! Catalog listing through the storefront's API client.
//!
//! Useful as a smoke check: it goes through the same URL building, timeout
//! and parsing as the storefront's home page.
//!
//! # Environment Variables
//!
//! - `NOVASHOP_API_URL` - Backend base URL
//! - `NOVASHOP_API_TIMEOUT_SECS` - Request timeout (default: 10)

use novashop_core::Product;
use novashop_storefront::api::{ApiClient, ApiError, CatalogApi};
use novashop_storefront::config::{ApiConfig, ConfigError};

/// Errors from listing products.
#[derive(Debug, thiserror::Error)]
pub enum ProductsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Api(#[from] ApiError),
}

/// One output line per product: `id  price  title`.
fn format_row(product: &Product) -> String {
    format!("{:<12} {:>10}  {}", product.id, product.price, product.title)
}

/// Print products matching `query` to stdout.
///
/// # Errors
///
/// Returns an error if the API settings are missing or the request fails.
pub async fn list(query: &str) -> Result<(), ProductsError> {
    let _ = dotenvy::dotenv();

    let mut config = ApiConfig::from_env()?;
    config.catalog_cache_ttl = std::time::Duration::ZERO;
    let client = ApiClient::new(&config)?;

    let products = client.products(query).await?;
    tracing::info!(count = products.len(), query, "Fetched products");

    #[allow(clippy::print_stdout)]
    for product in &products {
        println!("{}", format_row(product));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use novashop_core::{Price, ProductId};

    use super::*;

    #[test]
    fn test_format_row() {
        let product = Product {
            id: ProductId::new("p-1"),
            title: "Desk Lamp".to_string(),
            price: Price::from_cents(4999),
            image_url: None,
            description: None,
            rating: None,
        };
        let row = format_row(&product);
        assert!(row.starts_with("p-1"));
        assert!(row.ends_with("$49.99  Desk Lamp"));
    }
}
