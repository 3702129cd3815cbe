//! Checkout route handlers.
//!
//! The form posts shipping and payment details straight through to the
//! backend, which charges the cart stored under the session identity.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use novashop_core::{CheckoutRequest, Identity, PaymentDetails, ShippingAddress};
use serde::Deserialize;
use tracing::instrument;

use super::NavView;
use crate::error::add_breadcrumb;
use crate::filters;
use crate::session::SessionContext;
use crate::state::AppState;

/// Shown when the backend rejects or fails the checkout.
pub const CHECKOUT_FAILED: &str = "Payment failed. Please check your details and try again.";

/// Checkout form data. Field names match the backend payload.
#[derive(Deserialize, Default)]
pub struct CheckoutForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub cardholder_name: String,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub expiry: String,
    #[serde(default)]
    pub cvc: String,
}

impl CheckoutForm {
    fn shipping(&self) -> ShippingAddress {
        ShippingAddress {
            full_name: self.full_name.trim().to_string(),
            address_line1: self.address_line1.trim().to_string(),
            address_line2: self.address_line2.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
        }
    }

    /// Build the backend payload for the cart stored under `identity`.
    fn into_request(self, identity: &Identity) -> CheckoutRequest {
        CheckoutRequest {
            user_id: identity.cart_key().to_string(),
            shipping: self.shipping(),
            payment: PaymentDetails {
                cardholder_name: self.cardholder_name.trim().to_string(),
                card_number: self.card_number.chars().filter(|c| !c.is_whitespace()).collect(),
                expiry: self.expiry.trim().to_string(),
                cvc: self.cvc.trim().to_string(),
            },
        }
    }
}

/// Checkout page template.
///
/// Only the shipping address is echoed back after a failure; card fields
/// always render empty.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub nav: NavView,
    pub shipping: ShippingAddress,
    pub error: Option<String>,
}

/// Display the checkout form.
#[instrument(skip(session))]
pub async fn show(session: SessionContext) -> impl IntoResponse {
    CheckoutTemplate {
        nav: NavView::for_identity(&session.identity()),
        shipping: ShippingAddress::default(),
        error: None,
    }
}

/// Submit the checkout form.
#[instrument(skip(state, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: SessionContext,
    Form(form): Form<CheckoutForm>,
) -> Response {
    let identity = session.identity();
    let shipping = form.shipping();
    let request = form.into_request(&identity);

    match state.api().checkout(&request).await {
        Ok(receipt) => {
            tracing::info!(order_id = %receipt.id, "Checkout completed");
            add_breadcrumb("checkout", "Order placed", Some(&[("order_id", receipt.id.as_str())]));
            Redirect::to(&format!("/order-success/{}", receipt.id)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Checkout failed");
            CheckoutTemplate {
                nav: NavView::for_identity(&identity),
                shipping,
                error: Some(CHECKOUT_FAILED.to_string()),
            }
            .into_response()
        }
    }
}
