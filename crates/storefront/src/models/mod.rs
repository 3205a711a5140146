//! Storefront-side models.
//!
//! Entity records live in `bazaar_core`; this module holds what only the
//! web layer needs: session state and view types shared across routes.

pub mod session;
pub mod views;

pub use session::{CurrentUser, Toast, ToastKind, UserToken, keys as session_keys};
pub use views::*;
