//! Search query binding for the catalog page.
//!
//! The search query lives in the URL as `?q=`. The home page reads it from
//! the request location and hands it to the catalog fetch, and the search
//! form navigates to a new location instead of mutating any state directly.
//! A location change is therefore the only thing that re-runs the fetch.

use std::fmt;

use axum::http::Uri;
use novashop_core::Product;
use url::form_urlencoded;

use crate::api::CatalogApi;
use crate::fetch::{FetchState, FetchTicket, Tracked};

/// Query parameter holding the search text.
pub const QUERY_PARAM: &str = "q";

/// Message shown when the product list cannot be loaded.
pub const LOAD_FAILED: &str = "Failed to load products";

/// Path and query string of a navigable location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    path: String,
    query: Option<String>,
}

impl Location {
    /// Parse a location such as `/?q=shoes`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (raw, None),
        };
        let path = if path.is_empty() { "/" } else { path };

        Self {
            path: path.to_string(),
            query,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, without the leading `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// First value of a query parameter, decoded.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

impl From<&Uri> for Location {
    fn from(uri: &Uri) -> Self {
        Self {
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.query {
            Some(query) => write!(f, "{}?{query}", self.path),
            None => write!(f, "{}", self.path),
        }
    }
}

/// The search text carried by `location`; empty when absent.
#[must_use]
pub fn query_from_location(location: &Location) -> String {
    location.param(QUERY_PARAM).unwrap_or_default()
}

/// Location of the catalog filtered by `query`.
///
/// An empty query still yields `/?q=`, which is an explicit "no filter"
/// rather than the bare `/`.
#[must_use]
pub fn navigate_with_query(query: &str) -> String {
    let encoded = form_urlencoded::Serializer::new(String::new())
        .append_pair(QUERY_PARAM, query)
        .finish();
    format!("/?{encoded}")
}

/// Product list state of the catalog page.
#[derive(Debug, Default)]
pub struct CatalogView {
    query: String,
    products: Tracked<Vec<Product>>,
}

impl CatalogView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The query of the latest navigation.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn state(&self) -> &FetchState<Vec<Product>> {
        self.products.state()
    }

    /// Start a fetch for `location`: take its query and enter `Loading`.
    ///
    /// Any fetch started earlier is superseded by the returned ticket.
    pub fn navigate(&mut self, location: &Location) -> FetchTicket {
        self.query = query_from_location(location);
        self.products.begin()
    }

    /// Apply the result of the fetch identified by `ticket`.
    ///
    /// Returns `false` if a newer navigation already superseded it.
    pub fn complete<E: fmt::Display>(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Product>, E>,
    ) -> bool {
        self.products.complete(ticket, result, LOAD_FAILED)
    }

    /// Navigate to `location` and fetch its product list.
    pub async fn load(&mut self, api: &impl CatalogApi, location: &Location) {
        let ticket = self.navigate(location);
        let result = api.products(&self.query).await;
        self.complete(ticket, result);
    }
}
