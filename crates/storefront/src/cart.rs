//! Cart view-model.
//!
//! [`CartViewModel`] keeps a local mirror of the backend cart for one
//! identity. Mutations are optimistic: the mirror changes first, then the
//! backend call is made, and a failed call puts the mirror back the way it
//! was. The backend stays authoritative; the mirror only lives for as long as
//! the page that uses it.

use novashop_core::{CartLine, Identity, LineId, Price, ProductId, Quantity};
use thiserror::Error;
use tokio::sync::watch;

use crate::api::{ApiError, CartApi};
use crate::fetch::{FetchState, Tracked};

/// Message shown when the cart cannot be loaded.
pub const LOAD_FAILED: &str = "Failed to load cart";

/// A cart mutation that was not applied.
#[derive(Debug, Error)]
pub enum MutationError {
    /// The line is not in the mirror (never loaded, or already removed).
    #[error("Cart line {0} not found")]
    UnknownLine(LineId),

    /// The backend rejected the change; the mirror has been reverted.
    #[error("Failed to update cart")]
    Rejected(#[source] ApiError),
}

/// Local mirror of the cart for the identity it is bound to.
pub struct CartViewModel<A> {
    api: A,
    owner: String,
    cart: Tracked<Vec<CartLine>>,
}

impl<A: CartApi> CartViewModel<A> {
    /// A view-model bound to `identity` with nothing loaded yet.
    pub fn new(api: A, identity: &Identity) -> Self {
        Self {
            api,
            owner: identity.cart_key().to_string(),
            cart: Tracked::new(),
        }
    }

    /// Key of the identity the mirror belongs to.
    #[must_use]
    pub fn identity_key(&self) -> &str {
        &self.owner
    }

    /// The mirrored lines, in backend order. Empty unless loaded.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        self.cart.state().loaded().map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub const fn state(&self) -> &FetchState<Vec<CartLine>> {
        self.cart.state()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }

    /// Sum of `unit price × quantity` over the mirror.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines().iter().map(CartLine::line_total).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines().iter().map(|line| line.quantity.get()).sum()
    }

    /// Replace the mirror with the backend cart for `identity`.
    ///
    /// Switching to a different identity drops the old mirror first, so lines
    /// from one identity are never shown under another.
    ///
    /// # Errors
    ///
    /// Returns the backend error after leaving the mirror empty and the state
    /// `Failed`.
    pub async fn fetch_cart(&mut self, identity: &Identity) -> Result<(), ApiError> {
        let key = identity.cart_key();
        if key != self.owner {
            tracing::debug!(from = %self.owner, to = %key, "Cart identity changed");
            self.owner = key.to_string();
            self.cart.take();
        }

        let ticket = self.cart.begin();
        match self.api.cart(&self.owner).await {
            Ok(lines) => {
                self.cart.finish(ticket, lines);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, key = %self.owner, "{LOAD_FAILED}");
                self.cart.fail(ticket, LOAD_FAILED);
                Err(e)
            }
        }
    }

    /// Refetch if the session identity changed since the last check.
    ///
    /// `identity` comes from
    /// [`SessionContext::subscribe`](crate::session::SessionContext::subscribe),
    /// so only changes made through that request's context are seen.
    /// Returns whether a refetch happened.
    ///
    /// # Errors
    ///
    /// Returns the backend error from the refetch.
    pub async fn sync_identity(
        &mut self,
        identity: &mut watch::Receiver<Identity>,
    ) -> Result<bool, ApiError> {
        if !identity.has_changed().unwrap_or(false) {
            return Ok(false);
        }

        let current = identity.borrow_and_update().clone();
        if current.cart_key() == self.owner {
            return Ok(false);
        }

        self.fetch_cart(&current).await?;
        Ok(true)
    }

    /// Add one unit of a product to the bound identity's cart.
    ///
    /// The backend assigns the line ID, so the mirror is not touched; call
    /// [`fetch_cart`](Self::fetch_cart) to see the new line.
    ///
    /// # Errors
    ///
    /// Returns `MutationError::Rejected` if the backend call fails.
    pub async fn add_product(&self, product_id: &ProductId) -> Result<(), MutationError> {
        self.api
            .add_line(&self.owner, product_id, Quantity::ONE)
            .await
            .map_err(MutationError::Rejected)
    }

    /// Set a line's quantity, optimistically.
    ///
    /// # Errors
    ///
    /// Returns `MutationError::UnknownLine` if the line is not mirrored, or
    /// `MutationError::Rejected` after reverting the quantity if the backend
    /// call fails.
    pub async fn set_quantity(
        &mut self,
        line_id: &LineId,
        quantity: Quantity,
    ) -> Result<(), MutationError> {
        let previous = {
            let line = self
                .find_line_mut(line_id)
                .ok_or_else(|| MutationError::UnknownLine(line_id.clone()))?;
            std::mem::replace(&mut line.quantity, quantity)
        };

        if let Err(e) = self.api.update_line(line_id, quantity).await {
            tracing::warn!(error = %e, line_id = %line_id, "Reverting quantity change");
            if let Some(line) = self.find_line_mut(line_id) {
                line.quantity = previous;
            }
            return Err(MutationError::Rejected(e));
        }

        Ok(())
    }

    /// Remove a line, optimistically.
    ///
    /// # Errors
    ///
    /// Returns `MutationError::UnknownLine` if the line is not mirrored, or
    /// `MutationError::Rejected` after restoring the line at its old position
    /// if the backend call fails.
    pub async fn remove_line(&mut self, line_id: &LineId) -> Result<(), MutationError> {
        let (index, removed) = {
            let lines = self
                .cart
                .loaded_mut()
                .ok_or_else(|| MutationError::UnknownLine(line_id.clone()))?;
            let index = lines
                .iter()
                .position(|line| &line.id == line_id)
                .ok_or_else(|| MutationError::UnknownLine(line_id.clone()))?;
            (index, lines.remove(index))
        };

        if let Err(e) = self.api.remove_line(line_id).await {
            tracing::warn!(error = %e, line_id = %line_id, "Restoring removed line");
            if let Some(lines) = self.cart.loaded_mut() {
                lines.insert(index.min(lines.len()), removed);
            }
            return Err(MutationError::Rejected(e));
        }

        Ok(())
    }

    fn find_line_mut(&mut self, line_id: &LineId) -> Option<&mut CartLine> {
        self.cart
            .loaded_mut()?
            .iter_mut()
            .find(|line| &line.id == line_id)
    }
}
