//! Authentication middleware and extractors.
//!
//! Provides route guards for signed-in visitors, sellers and admins, plus
//! the helpers that read and write sign-in state in the session.

use axum::{
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use bazaar_core::User;

use crate::error::clear_sentry_user;
use crate::models::{CurrentUser, Toast, UserToken, session_keys};

use super::flash::push_toast;

/// Extractor that requires a signed-in visitor.
///
/// If nobody is signed in, returns a redirect to the login page carrying the
/// requested path, or 401 Unauthorized for API requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(current): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", current.user.display_name())
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a seller or admin account.
///
/// Signed-out visitors are sent to login; other roles get 403 Forbidden.
pub struct RequireSeller(pub CurrentUser);

/// Extractor that requires an admin account.
///
/// Signed-out visitors are sent to login; other roles get 403 Forbidden.
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when a guard rejects the request.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests), then back to this path.
    RedirectToLogin(String),
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Signed in, but the role is not allowed here.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(next) => Redirect::to(&login_url(&next)).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have permission to view this page",
            )
                .into_response(),
        }
    }
}

/// Login URL that returns to `next` afterwards.
#[must_use]
pub fn login_url(next: &str) -> String {
    if next.is_empty() || next == "/" {
        return "/auth/login".to_string();
    }
    format!("/auth/login?next={}", urlencoding::encode(next))
}

/// Rejection for a request that needs a signed-in visitor.
fn signed_out_rejection(parts: &Parts) -> AuthRejection {
    let is_api = parts.uri.path().starts_with("/api/");
    if is_api {
        AuthRejection::Unauthorized
    } else {
        let next = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);
        AuthRejection::RedirectToLogin(next)
    }
}

/// Read the signed-in visitor from the session.
///
/// Both the token and the account must be present.
pub async fn load_current_user(session: &Session) -> Option<CurrentUser> {
    let token: UserToken = session
        .get(session_keys::USER_TOKEN)
        .await
        .ok()
        .flatten()?;
    let user: User = session.get(session_keys::USER).await.ok().flatten()?;
    Some(CurrentUser { token, user })
}

async fn require_user(parts: &Parts) -> Result<CurrentUser, AuthRejection> {
    // Get the session from extensions (set by SessionManagerLayer)
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;

    load_current_user(session)
        .await
        .ok_or_else(|| signed_out_rejection(parts))
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_user(parts).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireSeller
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let current = require_user(parts).await?;
        if !current.role().can_sell() {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(current))
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let current = require_user(parts).await?;
        if !current.role().is_admin() {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(current))
    }
}

/// Extractor that optionally gets the signed-in visitor.
///
/// Unlike `RequireAuth`, this never rejects the request.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     OptionalAuth(current): OptionalAuth,
/// ) -> impl IntoResponse {
///     match current {
///         Some(c) => format!("Hello, {}!", c.user.display_name()),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let current = match parts.extensions.get::<Session>() {
            Some(session) => load_current_user(session).await,
            None => None,
        };

        Ok(Self(current))
    }
}

/// Store the token and account after login or registration.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    token: &UserToken,
    user: &User,
) -> Result<(), tower_sessions::session::Error> {
    // New identity, new session ID
    session.cycle_id().await?;
    session.insert(session_keys::USER_TOKEN, token).await?;
    session.insert(session_keys::USER, user).await
}

/// Replace the stored account (after a profile update).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn update_stored_user(
    session: &Session,
    user: &User,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::USER, user).await
}

/// Remove the token and account from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<UserToken>(session_keys::USER_TOKEN).await?;
    session.remove::<User>(session_keys::USER).await?;
    Ok(())
}

// =============================================================================
// Expired Token Handling
// =============================================================================

/// Response marker set when the backend rejected the visitor's token.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

/// Middleware that signs the visitor out when the backend rejected their token.
///
/// Handlers (through `AppError`) mark such responses with [`SessionExpired`].
/// The token and account are dropped from the session and the visitor is
/// sent to login; HTMX requests get an `HX-Redirect` instead.
pub async fn session_expiry_middleware(session: Session, request: Request, next: Next) -> Response {
    let next_path = request
        .uri()
        .path_and_query()
        .map_or_else(|| "/".to_string(), ToString::to_string);
    let is_htmx = request.headers().contains_key("hx-request");

    let response = next.run(request).await;
    if response.extensions().get::<SessionExpired>().is_none() {
        return response;
    }

    tracing::info!("Backend rejected session token, signing out");
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear expired session: {e}");
    }
    clear_sentry_user();
    push_toast(&session, Toast::info("Your session has expired. Please sign in again.")).await;

    let target = login_url(&next_path);
    if is_htmx {
        return (StatusCode::OK, [("HX-Redirect", target)]).into_response();
    }
    Redirect::to(&target).into_response()
}
