//! Session-related types.
//!
//! Visitor state kept in the session: the backend token, the signed-in
//! account, the guest cart, and one-shot toast messages.

use core::fmt;

use serde::{Deserialize, Serialize};

use bazaar_core::{Role, User};

/// Bearer token issued by the backend at login.
///
/// Implements `Debug` manually so the token never reaches the logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserToken(String);

impl UserToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UserToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserToken([REDACTED])")
    }
}

/// The signed-in visitor: their token and account.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Token for backend calls made on the user's behalf.
    pub token: UserToken,
    /// Account as stored at login (refreshed when the profile changes).
    pub user: User,
}

impl CurrentUser {
    /// The account's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.user.role
    }
}

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    /// CSS modifier class.
    #[must_use]
    pub const fn class(self) -> &'static str {
        match self {
            Self::Success => "toast--success",
            Self::Error => "toast--error",
            Self::Info => "toast--info",
        }
    }
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Info,
            message: message.into(),
        }
    }
}

/// Session keys for visitor state.
pub mod keys {
    /// Key for the backend bearer token.
    pub const USER_TOKEN: &str = "user-token";

    /// Key for the signed-in account.
    pub const USER: &str = "user";

    /// Key for the guest cart.
    pub const LOCAL_CART: &str = "local-cart";

    /// Key for pending toast messages.
    pub const TOASTS: &str = "toasts";
}
