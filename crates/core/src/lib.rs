//! Bazaar Core - shared marketplace types.
//!
//! Used by every Bazaar component:
//! - `storefront` - the web storefront, account pages and admin console
//! - `cli` - the `bz` terminal client
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O and no HTTP
//! clients. Records here mirror what the marketplace backend returns and
//! tolerate the shape drift that backend has accumulated.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, roles and statuses
//! - [`models`] - Entity records (users, products, orders, categories, shops)
//! - [`cart`] - The visitor cart kept before sign-in
//! - [`selection`] - The category / subcategory / third-category cascade

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod models;
pub mod selection;
pub mod types;

pub use cart::{CartError, CartItem, CartLineKey, LocalCart, QuantityChange};
pub use models::*;
pub use selection::CategorySelection;
pub use types::*;
