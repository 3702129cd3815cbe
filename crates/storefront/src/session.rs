//! Session identity store.
//!
//! The identity of a browser session lives in its tower-sessions record under
//! a single key. [`SessionContext`] is the only code that reads or writes
//! that key: handlers extract it (see `middleware::auth`) and pass it to
//! whatever needs to know who the shopper is.
//!
//! # Lifecycle
//!
//! - Startup/request entry: [`SessionContext::load`] reads the record; a
//!   missing or unreadable record means `Guest`.
//! - Login: [`SessionContext::set_identity`] writes the record.
//! - Logout: [`SessionContext::clear`] removes it.
//!
//! Every change is published on a `watch` channel before the update call
//! returns, so subscribers (a cart view-model bound to the session, for
//! instance) see the new identity on their next check.
//!
//! Notification is scoped to one request. Each request loads its own
//! `SessionContext` with a fresh channel, so a subscriber only hears about
//! changes made through that same context. Other requests pick the change
//! up from the persisted record when they load.

use std::sync::Arc;

use novashop_core::{Identity, UserProfile};
use tokio::sync::watch;
use tower_sessions::Session;

/// Session key holding the serialized [`UserProfile`].
pub const USER_KEY: &str = "user";

/// Error reading or writing the session record.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session store error: {0}")]
    Store(#[from] tower_sessions::session::Error),
}

/// Identity of the current session, persisted write-through.
#[derive(Clone)]
pub struct SessionContext {
    session: Session,
    identity: Arc<watch::Sender<Identity>>,
}

impl SessionContext {
    /// Read the persisted identity.
    ///
    /// Falls back to `Guest` when nothing is stored, and also when the stored
    /// record cannot be read or parsed (logged at `warn`).
    pub async fn load(session: Session) -> Self {
        let identity = match session.get::<UserProfile>(USER_KEY).await {
            Ok(profile) => Identity::from(profile),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable session identity");
                Identity::Guest
            }
        };

        Self {
            session,
            identity: Arc::new(watch::Sender::new(identity)),
        }
    }

    /// The current identity.
    #[must_use]
    pub fn identity(&self) -> Identity {
        self.identity.borrow().clone()
    }

    /// Listen for identity changes made through this context.
    ///
    /// Contexts loaded by other requests for the same browser have their own
    /// channels and are not notified.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Identity> {
        self.identity.subscribe()
    }

    /// Replace the current identity and persist it.
    ///
    /// Signing in rotates the session ID. Setting `Guest` removes the
    /// persisted record.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write; the
    /// in-memory identity is left unchanged in that case.
    pub async fn set_identity(&self, identity: Identity) -> Result<(), SessionError> {
        match &identity {
            Identity::Guest => {
                self.session.remove_value(USER_KEY).await?;
            }
            Identity::Authenticated(profile) => {
                self.session.cycle_id().await?;
                self.session.insert(USER_KEY, profile).await?;
            }
        }

        tracing::debug!(guest = identity.is_guest(), "Session identity updated");
        self.identity.send_replace(identity);
        Ok(())
    }

    /// Reset to `Guest` and remove the persisted record.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the removal.
    pub async fn clear(&self) -> Result<(), SessionError> {
        self.set_identity(Identity::Guest).await
    }

    /// The underlying tower-sessions handle.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }
}
