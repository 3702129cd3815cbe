//! Cart route handlers.
//!
//! Each request builds a [`CartViewModel`] for the session identity, loads
//! the backend cart into it and renders from the mirror. Quantity changes and
//! removals go through the view-model's optimistic path: on success the
//! browser is redirected back to `/cart`; on failure the page is rendered
//! right away from the reverted mirror with the error inline.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use novashop_core::{CartLine, LineId, ProductId, Quantity};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use super::NavView;
use crate::api::{ApiClient, CartApi};
use crate::cart::{CartViewModel, MutationError};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::session::SessionContext;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub unit_price: String,
    pub line_price: String,
    pub quantity: u32,
    /// Target of the `-` button; never below 1.
    pub decrement_to: u32,
    /// Target of the `+` button.
    pub increment_to: u32,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        let (title, image_url) = line.product.as_ref().map_or_else(
            || ("Unavailable product".to_string(), String::new()),
            |p| (p.title.clone(), p.image_url.clone().unwrap_or_default()),
        );

        Self {
            id: line.id.to_string(),
            title,
            image_url,
            unit_price: line.unit_price().to_string(),
            line_price: line.line_total().to_string(),
            quantity: line.quantity.get(),
            decrement_to: line.quantity.decremented().get(),
            increment_to: line.quantity.incremented().get(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl<A: CartApi> From<&CartViewModel<A>> for CartView {
    fn from(cart: &CartViewModel<A>) -> Self {
        Self {
            items: cart.lines().iter().map(CartItemView::from).collect(),
            subtotal: cart.subtotal().to_string(),
            item_count: cart.item_count(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    /// Catalog location to go back to, e.g. `/?q=lamp`.
    pub return_to: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub nav: NavView,
    pub cart: CartView,
    /// Load or mutation failure shown above the lines.
    pub error: Option<String>,
}

impl CartShowTemplate {
    fn new<A: CartApi>(
        session: &SessionContext,
        cart: &CartViewModel<A>,
        error: Option<String>,
    ) -> Self {
        Self {
            nav: NavView::for_identity(&session.identity()),
            cart: CartView::from(cart),
            error: error.or_else(|| cart.state().error().map(str::to_string)),
        }
    }
}

/// Load the cart for the session identity. Failures are left in the
/// view-model state for the page to show.
async fn load_cart(state: &AppState, session: &SessionContext) -> CartViewModel<ApiClient> {
    let identity = session.identity();
    let mut cart = CartViewModel::new(state.api().clone(), &identity);
    // Error already logged and recorded as `Failed`
    let _ = cart.fetch_cart(&identity).await;
    cart
}

/// Only same-site paths are allowed as a post-add destination.
///
/// Browsers read `\` as `/` and drop tabs and newlines, so a path is only
/// kept if it resolves against a placeholder origin without leaving it.
fn safe_return_path(return_to: Option<&str>) -> &str {
    const PLACEHOLDER_ORIGIN: &str = "http://storefront.invalid/";

    let Some(path) = return_to else {
        return "/";
    };
    if !path.starts_with('/')
        || path
            .chars()
            .any(|c| c == '\\' || c.is_control() || c.is_whitespace())
    {
        return "/";
    }

    let same_origin = Url::parse(PLACEHOLDER_ORIGIN).ok().is_some_and(|base| {
        base.join(path)
            .is_ok_and(|resolved| resolved.origin() == base.origin())
    });
    if same_origin { path } else { "/" }
}

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: SessionContext) -> impl IntoResponse {
    let cart = load_cart(&state, &session).await;
    CartShowTemplate::new(&session, &cart, None)
}

/// Add one unit of a product, then go back to the catalog.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: SessionContext,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect, AppError> {
    let cart = CartViewModel::new(state.api().clone(), &session.identity());
    let product_id = ProductId::new(form.product_id);

    cart.add_product(&product_id).await.map_err(|e| match e {
        MutationError::Rejected(api) => AppError::Api(api),
        MutationError::UnknownLine(id) => AppError::Internal(format!("unexpected line {id}")),
    })?;

    add_breadcrumb("cart", "Added product", Some(&[("product_id", product_id.as_str())]));
    Ok(Redirect::to(safe_return_path(form.return_to.as_deref())))
}

/// Set a line's quantity. Zero is floored to 1; removal has its own action.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: SessionContext,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let mut cart = load_cart(&state, &session).await;
    let line_id = LineId::new(form.line_id);

    match cart
        .set_quantity(&line_id, Quantity::floored(form.quantity))
        .await
    {
        Ok(()) => Redirect::to("/cart").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, line_id = %line_id, "Cart update failed");
            CartShowTemplate::new(&session, &cart, Some(e.to_string())).into_response()
        }
    }
}

/// Remove a line.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: SessionContext,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let mut cart = load_cart(&state, &session).await;
    let line_id = LineId::new(form.line_id);

    match cart.remove_line(&line_id).await {
        Ok(()) => {
            add_breadcrumb("cart", "Removed line", Some(&[("line_id", line_id.as_str())]));
            Redirect::to("/cart").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, line_id = %line_id, "Cart removal failed");
            CartShowTemplate::new(&session, &cart, Some(e.to_string())).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use novashop_core::{Price, ProductSnapshot};

    use super::*;

    fn line(quantity: u32) -> CartLine {
        CartLine {
            id: LineId::new("l1"),
            product: Some(ProductSnapshot {
                id: ProductId::new("p1"),
                title: "Desk Lamp".to_string(),
                price: Price::from_cents(1250),
                image_url: Some("https://img.example.com/lamp.jpg".to_string()),
            }),
            quantity: Quantity::floored(quantity),
        }
    }

    #[test]
    fn test_item_view_controls() {
        let view = CartItemView::from(&line(1));
        assert_eq!(view.decrement_to, 1);
        assert_eq!(view.increment_to, 2);

        let view = CartItemView::from(&line(3));
        assert_eq!(view.decrement_to, 2);
        assert_eq!(view.line_price, "$37.50");
        assert_eq!(view.unit_price, "$12.50");
    }

    #[test]
    fn test_item_view_without_product() {
        let mut orphan = line(2);
        orphan.product = None;
        let view = CartItemView::from(&orphan);
        assert_eq!(view.title, "Unavailable product");
        assert_eq!(view.line_price, "$0.00");
    }

    #[test]
    fn test_safe_return_path() {
        assert_eq!(safe_return_path(Some("/?q=lamp")), "/?q=lamp");
        assert_eq!(safe_return_path(Some("//evil.example.com")), "/");
        assert_eq!(safe_return_path(Some("https://evil.example.com")), "/");
        assert_eq!(safe_return_path(None), "/");
    }

    #[test]
    fn test_return_path_rejects_browser_normalized_hosts() {
        assert_eq!(safe_return_path(Some("/\\evil.example.com")), "/");
        assert_eq!(safe_return_path(Some("/\\/evil.example.com")), "/");
        assert_eq!(safe_return_path(Some("/\t/evil.example.com")), "/");
        assert_eq!(safe_return_path(Some("/\n/evil.example.com")), "/");
        assert_eq!(safe_return_path(Some("/ /evil.example.com")), "/");
        assert_eq!(safe_return_path(Some("")), "/");
    }

    #[test]
    fn test_return_path_keeps_encoded_search() {
        let path = "/?q=wireless+mouse%2Fpro";
        assert_eq!(safe_return_path(Some(path)), path);
        assert_eq!(safe_return_path(Some("/cart")), "/cart");
    }
}
