//! NovaShop Core - Shared domain types.
//!
//! This crate provides the types shared by every NovaShop component:
//! - `storefront` - Server-rendered storefront over the NovaShop backend API
//! - `cli` - Command-line tools for session migrations and catalog checks
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no session
//! storage. The backend API is the source of truth for every value here;
//! these types describe what the storefront reads and sends.
//!
//! # Modules
//!
//! - [`types`] - IDs, emails, prices, identity, catalog, cart and order types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
