//! Core types for NovaShop.
//!
//! Wire-compatible with the JSON bodies of the NovaShop backend API.

pub mod cart;
pub mod catalog;
pub mod email;
pub mod id;
pub mod identity;
pub mod order;
pub mod price;

pub use cart::{CartLine, ProductSnapshot, Quantity};
pub use catalog::Product;
pub use email::{Email, EmailError};
pub use id::*;
pub use identity::{GUEST_KEY, Identity, UserProfile};
pub use order::{CheckoutReceipt, CheckoutRequest, Order, PaymentDetails, ShippingAddress};
pub use price::Price;
