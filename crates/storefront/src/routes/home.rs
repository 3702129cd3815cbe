//! Home page route handler.
//!
//! Renders the hero and the product grid. The grid is driven entirely by the
//! request location: `/?q=lamp` shows products matching "lamp", `/` and
//! `/?q=` show everything.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{OriginalUri, State};
use axum::response::IntoResponse;
use novashop_core::Product;
use tracing::instrument;

use super::NavView;
use crate::catalog::{CatalogView, Location};
use crate::fetch::FetchState;
use crate::filters;
use crate::session::SessionContext;
use crate::state::AppState;

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub title: String,
    pub price: String,
    pub description: String,
    pub image_url: String,
    pub rating: Option<String>,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            title: product.title.clone(),
            price: product.price.to_string(),
            description: product.description.clone().unwrap_or_default(),
            image_url: product.image_url.clone().unwrap_or_default(),
            rating: product.rating.map(|r| format!("{r:.1}")),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: NavView,
    /// Current search text; empty means unfiltered.
    pub query: String,
    /// Where "Add to cart" returns to.
    pub return_to: String,
    pub loading: bool,
    pub error: Option<String>,
    pub products: Vec<ProductCardView>,
}

impl HomeTemplate {
    fn new(nav: NavView, location: &Location, catalog: &CatalogView) -> Self {
        let (loading, error, products) = match catalog.state() {
            FetchState::Idle | FetchState::Loading => (true, None, Vec::new()),
            FetchState::Failed(message) => (false, Some(message.clone()), Vec::new()),
            FetchState::Loaded(products) => (
                false,
                None,
                products.iter().map(ProductCardView::from).collect(),
            ),
        };

        Self {
            nav,
            query: catalog.query().to_string(),
            return_to: location.to_string(),
            loading,
            error,
            products,
        }
    }
}

/// Display the home page.
#[instrument(skip(state, session))]
pub async fn home(
    State(state): State<AppState>,
    session: SessionContext,
    OriginalUri(uri): OriginalUri,
) -> impl IntoResponse {
    let location = Location::from(&uri);
    let mut catalog = CatalogView::new();
    catalog.load(state.api(), &location).await;

    let nav = NavView::new(&session.identity(), catalog.query());
    HomeTemplate::new(nav, &location, &catalog)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use novashop_core::{Price, ProductId};

    use super::*;

    #[test]
    fn test_product_card_view() {
        let product = Product {
            id: ProductId::new("p1"),
            title: "Desk Lamp".to_string(),
            price: Price::from_cents(4999),
            image_url: None,
            description: Some("Warm light".to_string()),
            rating: Some(4.5),
        };
        let card = ProductCardView::from(&product);
        assert_eq!(card.price, "$49.99");
        assert_eq!(card.rating.as_deref(), Some("4.5"));
        assert_eq!(card.image_url, "");
    }

    #[test]
    fn test_heading_shows_query() {
        let mut catalog = CatalogView::new();
        let location = Location::parse("/?q=lamp");
        let ticket = catalog.navigate(&location);
        catalog.complete(ticket, Ok::<_, crate::api::ApiError>(Vec::new()));

        let page = HomeTemplate::new(NavView::default(), &location, &catalog);
        let html = page.render().unwrap();
        assert!(html.contains("(search: lamp)"));
        assert!(!page.loading);
    }
}
