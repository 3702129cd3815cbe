//! Cart lines and quantities.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{LineId, Price, ProductId};

/// A line quantity. Never below 1.
///
/// Removing a line is the only way to get to zero, so a zero (or missing)
/// quantity coming off the wire is read as 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Self = Self(1);

    /// A quantity of `n`, or `None` for zero.
    #[must_use]
    pub const fn new(n: u32) -> Option<Self> {
        if n == 0 { None } else { Some(Self(n)) }
    }

    /// Floor any requested value at 1.
    #[must_use]
    pub const fn floored(n: u32) -> Self {
        if n == 0 { Self::ONE } else { Self(n) }
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Target of the `-` control.
    #[must_use]
    pub const fn decremented(self) -> Self {
        Self::floored(self.0.saturating_sub(1))
    }

    /// Target of the `+` control.
    #[must_use]
    pub const fn incremented(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl From<u32> for Quantity {
    fn from(n: u32) -> Self {
        Self::floored(n)
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Product data as of the last cart fetch. May be stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// One product-quantity pairing in a cart, identified by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: LineId,
    /// The backend may omit the product if it was deleted from the catalog.
    #[serde(default)]
    pub product: Option<ProductSnapshot>,
    #[serde(default)]
    pub quantity: Quantity,
}

impl CartLine {
    /// Unit price, or zero when the product is gone.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        self.product.as_ref().map_or(Price::ZERO, |p| p.price)
    }

    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price().times(self.quantity.get())
    }
}
