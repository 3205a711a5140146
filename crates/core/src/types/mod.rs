//! Core value types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod role;
pub mod status;

pub use email::{Email, EmailError};
pub use id::{CategoryId, MenuItemId, NotificationId, OrderId, ProductId, ShopId, UserId};
pub use price::Price;
pub use role::Role;
pub use status::{DeliveryStatus, NotificationKind, PaymentStatus};
