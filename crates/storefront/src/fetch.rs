//! Page data loading state.
//!
//! Every page that shows backend data (catalog, cart, orders) moves through
//! the same states:
//!
//! ```text
//! Idle ──begin──▶ Loading ──ok──▶ Loaded
//!                    │
//!                    └──err──▶ Failed
//! ```
//!
//! There is no retry transition. Starting a new fetch re-enters `Loading`
//! from any state, including the terminal ones.
//!
//! A page can issue a second fetch before the first one finishes. Each fetch
//! takes a [`FetchTicket`] from a [`FetchSequence`]; completions carrying a
//! ticket other than the latest one are dropped, so an old response can never
//! overwrite a newer one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Loading state of one piece of page data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState<T> {
    Idle,
    Loading,
    Loaded(T),
    /// Holds the message shown inline on the page.
    Failed(String),
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> FetchState<T> {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn loaded_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Identifies one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// Monotonic ticket source shared by every fetch of one page.
#[derive(Debug, Clone, Default)]
pub struct FetchSequence {
    latest: Arc<AtomicU64>,
}

impl FetchSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket newer than every ticket issued before it.
    pub fn issue(&self) -> FetchTicket {
        FetchTicket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether `ticket` is the most recently issued one.
    #[must_use]
    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }
}

/// A [`FetchState`] guarded by a [`FetchSequence`].
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    state: FetchState<T>,
    sequence: FetchSequence,
}

impl<T> Default for Tracked<T> {
    fn default() -> Self {
        Self {
            state: FetchState::Idle,
            sequence: FetchSequence::new(),
        }
    }
}

impl<T> Tracked<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &FetchState<T> {
        &self.state
    }

    /// Enter `Loading` and return the ticket the response must present.
    pub fn begin(&mut self) -> FetchTicket {
        self.state = FetchState::Loading;
        self.sequence.issue()
    }

    /// Store a successful response. Returns `false` if the ticket was
    /// superseded and the value was dropped.
    pub fn finish(&mut self, ticket: FetchTicket, value: T) -> bool {
        if !self.sequence.is_current(ticket) {
            tracing::debug!(?ticket, "Dropping superseded response");
            return false;
        }
        self.state = FetchState::Loaded(value);
        true
    }

    /// Record a failed fetch. Returns `false` if the ticket was superseded.
    pub fn fail(&mut self, ticket: FetchTicket, message: impl Into<String>) -> bool {
        if !self.sequence.is_current(ticket) {
            tracing::debug!(?ticket, "Dropping superseded failure");
            return false;
        }
        self.state = FetchState::Failed(message.into());
        true
    }

    /// Apply a response, logging the error and showing `failure_message`
    /// on failure.
    pub fn complete<E: std::fmt::Display>(
        &mut self,
        ticket: FetchTicket,
        result: Result<T, E>,
        failure_message: &str,
    ) -> bool {
        match result {
            Ok(value) => self.finish(ticket, value),
            Err(e) => {
                tracing::warn!(error = %e, "{failure_message}");
                self.fail(ticket, failure_message)
            }
        }
    }

    pub fn loaded_mut(&mut self) -> Option<&mut T> {
        self.state.loaded_mut()
    }

    /// Reset to `Idle`, returning the previous state.
    pub fn take(&mut self) -> FetchState<T> {
        std::mem::take(&mut self.state)
    }
}
