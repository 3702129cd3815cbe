//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Hero + product grid, filtered by ?q=
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add one unit, redirect back to the catalog
//! POST /cart/update            - Set a line's quantity
//! POST /cart/remove            - Remove a line
//!
//! # Checkout
//! GET  /checkout               - Shipping + payment form
//! POST /checkout               - Submit, redirect to /order-success/{id}
//! GET  /order-success/{id}     - Confirmation
//!
//! # Orders
//! GET  /orders                 - Order history for the session identity
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//! ```
//!
//! Every page is rendered for the identity in the session: the user's ID if
//! signed in, `guest` otherwise.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};
use novashop_core::Identity;

use crate::middleware::{ClientIpKeyExtractor, auth_rate_limiter, cart_rate_limiter};
use crate::state::AppState;

/// Navbar data shared by every page.
#[derive(Debug, Clone, Default)]
pub struct NavView {
    pub signed_in: bool,
    pub user_name: String,
    /// Prefills the search box.
    pub query: String,
}

impl NavView {
    #[must_use]
    pub fn new(identity: &Identity, query: impl Into<String>) -> Self {
        match identity.profile() {
            Some(profile) => Self {
                signed_in: true,
                user_name: if profile.name.is_empty() {
                    profile.email.to_string()
                } else {
                    profile.name.clone()
                },
                query: query.into(),
            },
            None => Self {
                query: query.into(),
                ..Self::default()
            },
        }
    }

    /// Navbar for pages without a search query of their own.
    #[must_use]
    pub fn for_identity(identity: &Identity) -> Self {
        Self::new(identity, String::new())
    }
}

/// Create the auth routes router.
///
/// Form submissions are rate limited; the pages themselves are not.
pub fn auth_routes(client_ip: ClientIpKeyExtractor) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(auth::login)
                .layer(auth_rate_limiter(client_ip))
                .get(auth::login_page),
        )
        .route(
            "/register",
            post(auth::register)
                .layer(auth_rate_limiter(client_ip))
                .get(auth::register_page),
        )
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes(client_ip: ClientIpKeyExtractor) -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add).layer(cart_rate_limiter(client_ip)))
        .route("/update", post(cart::update).layer(cart_rate_limiter(client_ip)))
        .route("/remove", post(cart::remove).layer(cart_rate_limiter(client_ip)))
}

/// Create all routes for the storefront.
///
/// `client_ip` keys every rate limiter in the tree.
pub fn routes(client_ip: ClientIpKeyExtractor) -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/cart", cart_routes(client_ip))
        .route(
            "/checkout",
            post(checkout::submit)
                .layer(cart_rate_limiter(client_ip))
                .get(checkout::show),
        )
        .route("/orders", get(orders::index))
        .route("/order-success/{id}", get(orders::success))
        .nest("/auth", auth_routes(client_ip))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use novashop_core::{Email, UserId, UserProfile};

    use super::*;

    #[test]
    fn test_nav_for_guest() {
        let nav = NavView::new(&Identity::Guest, "lamp");
        assert!(!nav.signed_in);
        assert_eq!(nav.query, "lamp");
    }

    #[test]
    fn test_nav_falls_back_to_email() {
        let identity = Identity::from(UserProfile {
            id: UserId::new("u1"),
            name: String::new(),
            email: Email::parse("ada@example.com").unwrap(),
        });
        let nav = NavView::for_identity(&identity);
        assert!(nav.signed_in);
        assert_eq!(nav.user_name, "ada@example.com");
    }
}
