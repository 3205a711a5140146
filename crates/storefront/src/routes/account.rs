//! Account route handlers.
//!
//! All routes require a signed-in visitor. Profile, orders, wishlist,
//! recently viewed products and the notification inbox.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{
    Email, NotificationId, OrderId, ProductId, User, models::notification::unread_count,
};

use crate::api::{ApiError, ProfileUpdate};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireAuth, update_stored_user};
use crate::models::{NotificationView, OrderSummaryView, OrderView, ProductCard};
use crate::state::AppState;

use super::{done_to, fail_to, invalid_to, non_blank, safe_next};

/// Shortest password accepted on change.
const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// Form Types
// =============================================================================

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

impl ProfileForm {
    fn to_update(&self) -> std::result::Result<ProfileUpdate, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name cannot be empty".to_string());
        }
        let email = Email::parse(&self.email).map_err(|e| e.to_string())?;
        Ok(ProfileUpdate {
            name: name.to_string(),
            email: String::from(email),
            phone: non_blank(self.phone.as_deref()),
            avatar: non_blank(self.avatar.as_deref()),
        })
    }
}

/// Password change form data.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordForm {
    fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.current_password.is_empty() {
            return Err("Enter your current password");
        }
        if self.new_password.len() < MIN_PASSWORD_LEN {
            return Err("New password must be at least 6 characters");
        }
        if self.new_password != self.confirm_password {
            return Err("New passwords do not match");
        }
        Ok(())
    }
}

/// Wishlist add form data.
#[derive(Debug, Deserialize)]
pub struct WishlistForm {
    pub product_id: String,
    pub return_to: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub user: User,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<OrderSummaryView>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub ctx: PageContext,
    pub order: OrderView,
}

/// Product list template shared by the wishlist and recent views.
#[derive(Template, WebTemplate)]
#[template(path = "account/products.html")]
pub struct SavedProductsTemplate {
    pub ctx: PageContext,
    pub title: &'static str,
    pub empty_message: &'static str,
    pub products: Vec<ProductCard>,
    pub removable: bool,
}

/// Notification inbox template.
#[derive(Template, WebTemplate)]
#[template(path = "account/notifications.html")]
pub struct NotificationsTemplate {
    pub ctx: PageContext,
    pub notifications: Vec<NotificationView>,
    pub unread: usize,
}

/// Unread notification badge fragment (for HTMX polling).
#[derive(Template, WebTemplate)]
#[template(path = "partials/notification_badge.html")]
pub struct NotificationBadgeTemplate {
    pub unread: usize,
    pub poll_secs: u64,
}

// =============================================================================
// Profile
// =============================================================================

/// Display the profile page.
#[instrument(skip(state, ctx, current))]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let user = state.api().profile(&current.token).await?;
    Ok(ProfileTemplate { ctx, user })
}

/// Handle profile form submission.
#[instrument(skip(state, session, current, form))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Response {
    let update = match form.to_update() {
        Ok(update) => update,
        Err(message) => return invalid_to(&session, message, "/account").await,
    };

    match state.api().update_profile(&current.token, &update).await {
        Ok(user) => {
            if let Err(e) = update_stored_user(&session, &user).await {
                tracing::error!("Failed to refresh stored account: {e}");
            }
            done_to(&session, "Profile updated", "/account").await
        }
        Err(e) => fail_to(&session, e, "/account").await,
    }
}

/// Handle password change.
#[instrument(skip(state, session, current, form))]
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Form(form): Form<PasswordForm>,
) -> Response {
    if let Err(message) = form.validate() {
        return invalid_to(&session, message, "/account").await;
    }

    match state
        .api()
        .change_password(&current.token, &form.current_password, &form.new_password)
        .await
    {
        Ok(()) => done_to(&session, "Password changed", "/account").await,
        Err(e) => fail_to(&session, e, "/account").await,
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Display order history.
#[instrument(skip(state, ctx, current))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let orders = state.api().my_orders(&current.token).await?;
    Ok(OrdersTemplate {
        ctx,
        orders: orders.iter().map(OrderSummaryView::from).collect(),
    })
}

/// Display one order.
#[instrument(skip(state, ctx, current))]
pub async fn order(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ctx: PageContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let order = state.api().order(&current.token, &OrderId::new(id)).await?;
    Ok(OrderTemplate {
        ctx,
        order: OrderView::from(&order),
    })
}

/// Cancel an order that is still processing.
#[instrument(skip(state, session, current))]
pub async fn cancel_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Path(id): Path<String>,
) -> Response {
    let id = OrderId::new(id);
    let target = format!("/account/orders/{id}");

    let order = match state.api().order(&current.token, &id).await {
        Ok(order) => order,
        Err(e) => return fail_to(&session, e, "/account/orders").await,
    };
    if !order.can_cancel() {
        return invalid_to(
            &session,
            format!(
                "This order is {} and can no longer be cancelled",
                order.delivery_status.label().to_lowercase()
            ),
            &target,
        )
        .await;
    }

    match state.api().cancel_order(&current.token, &id).await {
        Ok(()) => done_to(&session, "Order cancelled", &target).await,
        Err(e) => fail_to(&session, e, &target).await,
    }
}

// =============================================================================
// Wishlist & Recent Views
// =============================================================================

/// Display the wishlist.
#[instrument(skip(state, ctx, current))]
pub async fn wishlist(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let products = state.api().wishlist(&current.token).await?;
    Ok(SavedProductsTemplate {
        ctx,
        title: "Wishlist",
        empty_message: "You have not saved any products yet.",
        products: products.iter().map(ProductCard::from).collect(),
        removable: true,
    })
}

/// Save a product to the wishlist.
#[instrument(skip(state, session, current))]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Form(form): Form<WishlistForm>,
) -> Response {
    let id = ProductId::new(form.product_id.trim());
    let fallback = format!("/products/{id}");
    let target = safe_next(form.return_to.as_deref(), &fallback).to_string();

    match state.api().add_to_wishlist(&current.token, &id).await {
        Ok(()) => done_to(&session, "Saved to your wishlist", &target).await,
        Err(e) => fail_to(&session, e, &target).await,
    }
}

/// Remove a product from the wishlist.
#[instrument(skip(state, session, current))]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Path(product_id): Path<String>,
) -> Response {
    let id = ProductId::new(product_id);
    match state.api().remove_from_wishlist(&current.token, &id).await {
        Ok(()) => done_to(&session, "Removed from your wishlist", "/account/wishlist").await,
        Err(e) => fail_to(&session, e, "/account/wishlist").await,
    }
}

/// Display recently viewed products.
#[instrument(skip(state, ctx, current))]
pub async fn recent(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let products = state.api().recent_views(&current.token).await?;
    Ok(SavedProductsTemplate {
        ctx,
        title: "Recently viewed",
        empty_message: "Products you open will show up here.",
        products: products.iter().map(ProductCard::from).collect(),
        removable: false,
    })
}

// =============================================================================
// Notifications
// =============================================================================

/// Display the notification inbox.
#[instrument(skip(state, ctx, current))]
pub async fn notifications(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let notifications = state.api().notifications(&current.token).await?;
    Ok(NotificationsTemplate {
        ctx,
        unread: unread_count(&notifications),
        notifications: notifications.iter().map(NotificationView::from).collect(),
    })
}

/// Unread badge (HTMX, polled).
///
/// Backend hiccups render an empty badge so polling carries on; a rejected
/// token signs the visitor out.
#[instrument(skip(state, current))]
pub async fn notification_badge(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Response {
    let poll_secs = state.config().notification_poll_secs;
    match state.api().notifications(&current.token).await {
        Ok(notifications) => NotificationBadgeTemplate {
            unread: unread_count(&notifications),
            poll_secs,
        }
        .into_response(),
        Err(ApiError::Unauthorized) => AppError::Api(ApiError::Unauthorized).into_response(),
        Err(e) => {
            tracing::warn!("Failed to poll notifications: {e}");
            NotificationBadgeTemplate {
                unread: 0,
                poll_secs,
            }
            .into_response()
        }
    }
}

/// Mark one notification read.
#[instrument(skip(state, session, current))]
pub async fn mark_read(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Path(id): Path<String>,
) -> Response {
    let id = NotificationId::new(id);
    match state.api().mark_notification_read(&current.token, &id).await {
        Ok(()) => axum::response::Redirect::to("/account/notifications").into_response(),
        Err(e) => fail_to(&session, e, "/account/notifications").await,
    }
}

/// Mark every notification read.
#[instrument(skip(state, session, current))]
pub async fn mark_all_read(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
) -> Response {
    match state.api().mark_all_notifications_read(&current.token).await {
        Ok(()) => done_to(&session, "All notifications marked as read", "/account/notifications").await,
        Err(e) => fail_to(&session, e, "/account/notifications").await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_form_normalizes() {
        let form = ProfileForm {
            name: "  Asha ".to_string(),
            email: " Asha@Example.COM ".to_string(),
            phone: Some(String::new()),
            avatar: Some(" https://img.example/a.png ".to_string()),
        };
        let update = form.to_update().unwrap_or_default();
        assert_eq!(update.name, "Asha");
        assert_eq!(update.email, "asha@example.com");
        assert_eq!(update.phone, None);
        assert_eq!(update.avatar.as_deref(), Some("https://img.example/a.png"));
    }

    #[test]
    fn test_password_form_validation() {
        let form = |current: &str, new: &str, confirm: &str| PasswordForm {
            current_password: current.to_string(),
            new_password: new.to_string(),
            confirm_password: confirm.to_string(),
        };
        assert!(form("old", "secret1", "secret1").validate().is_ok());
        assert!(form("", "secret1", "secret1").validate().is_err());
        assert!(form("old", "abc", "abc").validate().is_err());
        assert!(form("old", "secret1", "secret2").validate().is_err());
    }
}
