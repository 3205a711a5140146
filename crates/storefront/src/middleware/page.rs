//! Layout context shared by every full page.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use bazaar_core::User;

use crate::models::Toast;
use crate::state::AppState;

use super::auth::load_current_user;
use super::flash::take_toasts;

/// What the base layout needs: who is signed in and which toasts to show.
///
/// Extracting this consumes the pending toasts, so only full-page handlers
/// should take it; HTMX fragments leave toasts for the next page.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// Signed-in account, if any.
    pub user: Option<User>,
    /// One-shot messages queued by earlier requests.
    pub toasts: Vec<Toast>,
    /// Path of the current request, for nav highlighting and login returns.
    pub current_path: String,
}

impl PageContext {
    /// Whether someone is signed in.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// Whether the visitor can open the seller menu tools.
    #[must_use]
    pub fn is_seller(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role.can_sell())
    }

    /// Whether the visitor can open the admin console.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role.is_admin())
    }

    /// Whether the nav link for `prefix` should be highlighted.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            return self.current_path == "/";
        }
        self.current_path.starts_with(prefix)
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (user, toasts) = match parts.extensions.get::<Session>() {
            Some(session) => (
                load_current_user(session).await.map(|c| c.user),
                take_toasts(session).await,
            ),
            None => (None, Vec::new()),
        };

        Ok(Self {
            user,
            toasts,
            current_path: parts.uri.path().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_active() {
        let ctx = PageContext {
            current_path: "/account/orders".to_string(),
            ..PageContext::default()
        };
        assert!(ctx.is_active("/account"));
        assert!(!ctx.is_active("/"));
        assert!(!ctx.is_admin());
        assert!(!ctx.is_signed_in());
    }
}
