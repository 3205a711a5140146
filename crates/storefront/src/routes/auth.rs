//! Authentication route handlers.
//!
//! Handles login, registration and logout against the marketplace backend.
//! A successful sign-in stores the token and account in the session and
//! hands the guest cart over to the server cart in the background.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{AuthSession, Email};

use crate::api::ApiError;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext, push_toast, set_current_user};
use crate::models::{Toast, UserToken};
use crate::state::AppState;

use super::cart::take_local_cart;
use super::safe_next;

/// Shortest password accepted at registration.
const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub next: Option<String>,
}

impl RegisterForm {
    /// Check the form before calling the backend.
    fn validate(&self) -> Result<Email, String> {
        if self.name.trim().is_empty() {
            return Err("Please enter your name".to_string());
        }
        let email = Email::parse(&self.email).map_err(|e| e.to_string())?;
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            ));
        }
        if self.password != self.password_confirm {
            return Err("Passwords do not match".to_string());
        }
        Ok(email)
    }
}

/// Query parameters for the auth pages.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub next: String,
    pub email: String,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub next: String,
    pub name: String,
    pub email: String,
    pub error: Option<String>,
}

// =============================================================================
// Sign-in
// =============================================================================

/// Store the new sign-in and merge the guest cart.
///
/// The merge posts every guest line to the server cart on a spawned task;
/// failures are logged and never block the sign-in.
async fn complete_sign_in(
    state: &AppState,
    session: &Session,
    auth: AuthSession,
) -> Result<(), tower_sessions::session::Error> {
    let token = UserToken::new(auth.token);
    set_current_user(session, &token, &auth.user).await?;
    // Only drained once the account is in place, so a failed sign-in keeps it.
    let guest_lines = take_local_cart(session).await;
    set_sentry_user(&auth.user.id, Some(&auth.user.email));

    if !guest_lines.is_empty() {
        let api = state.api().clone();
        let user_id = auth.user.id.clone();
        tokio::spawn(async move {
            let total = guest_lines.len();
            let merged = api.merge_into_server_cart(&token, guest_lines).await;
            tracing::info!(user_id = %user_id, merged, total, "Merged guest cart");
        });
    }

    push_toast(
        session,
        Toast::success(format!("Welcome, {}!", auth.user.display_name())),
    )
    .await;
    Ok(())
}

/// Message for a failed login or registration.
fn auth_failure_message(err: &ApiError, fallback: &str) -> String {
    match err {
        ApiError::Rejected { message, .. } if !message.is_empty() => message.clone(),
        ApiError::Unauthorized | ApiError::NotFound(_) | ApiError::Rejected { .. } => {
            fallback.to_string()
        }
        other => other.user_message(),
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    ctx: PageContext,
    OptionalAuth(current): OptionalAuth,
    Query(query): Query<NextQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref(), "/").to_string();
    if current.is_some() {
        return Redirect::to(&next).into_response();
    }

    LoginTemplate {
        ctx,
        next,
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, ctx, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next(form.next.as_deref(), "/").to_string();
    let render_error = |ctx: PageContext, message: String| {
        LoginTemplate {
            ctx,
            next: next.clone(),
            email: form.email.trim().to_string(),
            error: Some(message),
        }
        .into_response()
    };

    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => return render_error(ctx, e.to_string()),
    };

    let auth = match state.api().login(email.as_str(), &form.password).await {
        Ok(auth) => auth,
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            return render_error(
                ctx,
                auth_failure_message(&e, "Invalid email or password"),
            );
        }
    };

    if let Err(e) = complete_sign_in(&state, &session, auth).await {
        tracing::error!("Failed to set session: {e}");
        return render_error(ctx, "Could not sign you in. Please try again.".to_string());
    }

    Redirect::to(&next).into_response()
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    ctx: PageContext,
    OptionalAuth(current): OptionalAuth,
    Query(query): Query<NextQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref(), "/").to_string();
    if current.is_some() {
        return Redirect::to(&next).into_response();
    }

    RegisterTemplate {
        ctx,
        next,
        name: String::new(),
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle registration form submission.
#[instrument(skip(state, session, ctx, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<RegisterForm>,
) -> Response {
    let next = safe_next(form.next.as_deref(), "/").to_string();
    let render_error = |ctx: PageContext, message: String| {
        RegisterTemplate {
            ctx,
            next: next.clone(),
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            error: Some(message),
        }
        .into_response()
    };

    let email = match form.validate() {
        Ok(email) => email,
        Err(message) => return render_error(ctx, message),
    };

    let auth = match state
        .api()
        .register(form.name.trim(), email.as_str(), &form.password)
        .await
    {
        Ok(auth) => auth,
        Err(e) => {
            tracing::warn!("Registration failed: {e}");
            return render_error(
                ctx,
                auth_failure_message(&e, "Could not create your account"),
            );
        }
    };

    if let Err(e) = complete_sign_in(&state, &session, auth).await {
        tracing::error!("Failed to set session: {e}");
        return render_error(ctx, "Account created. Please sign in.".to_string());
    }

    Redirect::to(&next).into_response()
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// Destroys the whole session, guest cart included.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {e}");
    }
    clear_sentry_user();

    push_toast(&session, Toast::info("You have been signed out")).await;
    Redirect::to("/").into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use bazaar_core::{CartItem, LocalCart, Price, ProductId};
    use tower_sessions::SessionStore;
    use tower_sessions::session::{Id, Record};
    use tower_sessions::session_store;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::models::session_keys;

    /// Store that cannot drop the old record when the session id is cycled.
    #[derive(Debug)]
    struct UndeletableStore;

    #[async_trait]
    impl SessionStore for UndeletableStore {
        async fn save(&self, _record: &Record) -> session_store::Result<()> {
            Ok(())
        }

        async fn load(&self, _id: &Id) -> session_store::Result<Option<Record>> {
            Ok(None)
        }

        async fn delete(&self, _id: &Id) -> session_store::Result<()> {
            Err(session_store::Error::Backend("store offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_sign_in_keeps_guest_cart() {
        let config = StorefrontConfig::for_api("http://127.0.0.1:9").unwrap();
        let state = AppState::new(config).unwrap();
        let session = Session::new(None, Arc::new(UndeletableStore), None);
        let mut cart = LocalCart::default();
        cart.add(CartItem {
            product_id: ProductId::new("p1"),
            name: "Tee".to_string(),
            image: None,
            size: "M".to_string(),
            color: "Red".to_string(),
            quantity: 2,
            price: Price::from_cents(1250),
        });
        session.insert(session_keys::LOCAL_CART, &cart).await.unwrap();

        let auth: AuthSession = serde_json::from_value(serde_json::json!({
            "token": "t-1",
            "user": {"_id": "u1", "name": "Asha", "email": "asha@example.com", "role": 0}
        }))
        .unwrap();
        assert!(complete_sign_in(&state, &session, auth).await.is_err());

        let kept: Option<LocalCart> = session.get(session_keys::LOCAL_CART).await.unwrap();
        assert_eq!(kept.unwrap().item_count(), 2);
    }

    fn form(name: &str, email: &str, password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password_confirm: confirm.to_string(),
            next: None,
        }
    }

    #[test]
    fn test_register_validation() {
        assert!(form("Asha", "asha@example.com", "secret1", "secret1")
            .validate()
            .is_ok());
        assert_eq!(
            form(" ", "asha@example.com", "secret1", "secret1").validate(),
            Err("Please enter your name".to_string())
        );
        assert!(form("Asha", "not-an-email", "secret1", "secret1")
            .validate()
            .is_err());
        assert_eq!(
            form("Asha", "asha@example.com", "abc", "abc").validate(),
            Err("Password must be at least 6 characters".to_string())
        );
        assert_eq!(
            form("Asha", "asha@example.com", "secret1", "secret2").validate(),
            Err("Passwords do not match".to_string())
        );
    }

    #[test]
    fn test_auth_failure_message_prefers_backend_text() {
        let err = ApiError::Rejected {
            status: 400,
            message: "Email already registered".to_string(),
        };
        assert_eq!(
            auth_failure_message(&err, "fallback"),
            "Email already registered"
        );
        assert_eq!(
            auth_failure_message(&ApiError::Unauthorized, "Invalid email or password"),
            "Invalid email or password"
        );
    }
}
