//! Order history and confirmation pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use novashop_core::Order;
use tracing::instrument;

use super::NavView;
use crate::fetch::{FetchState, Tracked};
use crate::filters;
use crate::session::SessionContext;
use crate::state::AppState;

/// Message shown when the order list cannot be loaded.
pub const LOAD_FAILED: &str = "Failed to load orders";

/// Order summary display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub short_id: String,
    pub total: String,
    pub item_count: usize,
    pub status: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            short_id: order.short_id().to_string(),
            total: order.total.to_string(),
            item_count: order.item_count(),
            status: order.status.clone(),
        }
    }
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders.html")]
pub struct OrdersTemplate {
    pub nav: NavView,
    pub orders: Vec<OrderView>,
    pub error: Option<String>,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "order_success.html")]
pub struct OrderSuccessTemplate {
    pub nav: NavView,
    pub order_id: String,
}

/// Display the order history for the session identity.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: SessionContext) -> impl IntoResponse {
    let identity = session.identity();

    let mut orders = Tracked::new();
    let ticket = orders.begin();
    let result = state.api().orders(identity.cart_key()).await;
    orders.complete(ticket, result, LOAD_FAILED);

    let (orders, error) = match orders.take() {
        FetchState::Loaded(list) => (list.iter().map(OrderView::from).collect(), None),
        FetchState::Failed(message) => (Vec::new(), Some(message)),
        FetchState::Idle | FetchState::Loading => (Vec::new(), None),
    };

    OrdersTemplate {
        nav: NavView::for_identity(&identity),
        orders,
        error,
    }
}

/// Display the confirmation page for a placed order.
#[instrument(skip(session))]
pub async fn success(session: SessionContext, Path(id): Path<String>) -> impl IntoResponse {
    OrderSuccessTemplate {
        nav: NavView::for_identity(&session.identity()),
        order_id: id,
    }
}
