//! Orders and the checkout payload.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{OrderId, Price};

/// A past order from `GET /api/orders/{key}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub total: Price,
    /// Line snapshots; only counted here, the shape belongs to the backend.
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub status: String,
}

impl Order {
    /// Last six characters of the order ID, as shown to customers.
    #[must_use]
    pub fn short_id(&self) -> &str {
        let id = self.id.as_str();
        let start = id
            .char_indices()
            .rev()
            .nth(5)
            .map_or(0, |(index, _)| index);
        &id[start..]
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

/// Shipping address section of the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Payment section of the checkout form.
///
/// Forwarded untouched to the backend, which owns payment processing.
/// `Debug` redacts everything except the cardholder name.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub cardholder_name: String,
    pub card_number: String,
    pub expiry: String,
    pub cvc: String,
}

impl fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("cardholder_name", &self.cardholder_name)
            .field("card_number", &"[REDACTED]")
            .field("expiry", &"[REDACTED]")
            .field("cvc", &"[REDACTED]")
            .finish()
    }
}

/// Body of `POST /api/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutRequest {
    /// Cart key of the paying identity (a user ID or `guest`).
    pub user_id: String,
    pub shipping: ShippingAddress,
    pub payment: PaymentDetails,
}

/// Response of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutReceipt {
    pub id: OrderId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        let order: Order = serde_json::from_str(r#"{"id": "65f0c2a1b9e4d7"}"#).unwrap();
        assert_eq!(order.short_id(), "b9e4d7");

        let order: Order = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(order.short_id(), "42");
    }

    #[test]
    fn test_order_defaults() {
        let order: Order =
            serde_json::from_str(r#"{"id": "o1", "total": 30, "items": [{}, {}], "status": "paid"}"#)
                .unwrap();
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.total.to_string(), "$30.00");
        assert_eq!(order.status, "paid");
    }

    #[test]
    fn test_payment_debug_redacts_card() {
        let payment = PaymentDetails {
            cardholder_name: "Ada Lovelace".to_string(),
            card_number: "4242424242424242".to_string(),
            expiry: "12/30".to_string(),
            cvc: "123".to_string(),
        };
        let debug_output = format!("{payment:?}");
        assert!(debug_output.contains("Ada Lovelace"));
        assert!(!debug_output.contains("4242"));
        assert!(!debug_output.contains("123\""));
    }
}
