//! HTTP route handlers for the storefront, account pages and admin console.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page
//!
//! # Catalog
//! GET  /collections                   - Product grid (category, subcategory, third, q, page)
//! GET  /collections/filters           - Cascading category dropdowns (fragment)
//! GET  /products/{id}                 - Product detail
//! GET  /shops                         - Shop list
//! GET  /shops/{id}                    - Shop page with menu
//!
//! # Cart (HTMX fragments, HX-Trigger: cart-updated)
//! GET  /cart                          - Cart page
//! POST /cart/add                      - Add a line (returns cart_count fragment)
//! POST /cart/update                   - Set quantity or step +/- (returns cart_items fragment)
//! POST /cart/remove                   - Remove a line (returns cart_items fragment)
//! GET  /cart/count                    - Cart count badge (fragment)
//!
//! # Checkout (requires auth)
//! GET  /checkout                      - Shipping form
//! POST /checkout                      - Place order
//!
//! # Auth
//! GET  /auth/login                    - Login page
//! POST /auth/login                    - Login action (merges the guest cart)
//! GET  /auth/register                 - Register page
//! POST /auth/register                 - Register action
//! POST /auth/logout                   - Logout action
//!
//! # Account (requires auth)
//! GET  /account                       - Profile
//! POST /account                       - Update profile
//! POST /account/password              - Change password
//! GET  /account/orders                - Order history
//! GET  /account/orders/{id}           - Order detail
//! POST /account/orders/{id}/cancel    - Cancel a processing order
//! GET  /account/wishlist              - Saved products
//! POST /account/wishlist              - Save a product
//! POST /account/wishlist/{id}/remove  - Unsave a product
//! GET  /account/recent                - Recently viewed products
//! GET  /account/notifications         - Notification inbox
//! GET  /account/notifications/badge   - Unread badge (fragment, polled)
//! POST /account/notifications/{id}/read
//! POST /account/notifications/read-all
//!
//! # Admin (admin role; menu pages open to sellers)
//! GET  /admin                         - Dashboard
//! GET  /admin/products                - Product list
//! GET  /admin/products/new            - New product form
//! POST /admin/products                - Create product
//! GET  /admin/products/category-options - Cascading dropdowns (fragment)
//! GET  /admin/products/{id}/edit      - Edit product form
//! POST /admin/products/{id}           - Update product
//! POST /admin/products/{id}/delete    - Delete product
//! GET  /admin/categories              - Category tree
//! POST /admin/categories              - Create category
//! POST /admin/categories/{id}         - Rename category
//! POST /admin/categories/{id}/delete  - Delete category
//! POST /admin/categories/{id}/subcategories - Add subcategory
//! POST /admin/categories/{id}/third   - Add third category
//! GET  /admin/shops                   - Shop list
//! GET  /admin/shops/new               - New shop form
//! POST /admin/shops                   - Create shop
//! GET  /admin/shops/{id}/edit         - Edit shop form
//! POST /admin/shops/{id}              - Update shop
//! POST /admin/shops/{id}/delete       - Delete shop
//! GET  /admin/shops/{id}/menu         - Menu editor (seller)
//! POST /admin/shops/{id}/menu         - Add menu item (seller)
//! POST /admin/menu/{id}               - Update menu item (seller)
//! POST /admin/menu/{id}/delete        - Delete menu item (seller)
//! GET  /admin/users                   - User list
//! POST /admin/users/{id}/role         - Change role
//! POST /admin/users/{id}/delete       - Delete user
//! GET  /admin/orders                  - Order list (?status=)
//! GET  /admin/orders/{id}             - Order detail
//! POST /admin/orders/{id}/status      - Update payment / delivery status
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod collections;
pub mod home;
pub mod products;
pub mod shops;

use axum::{
    Router,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;

use crate::api::ApiError;
use crate::error::AppError;
use crate::middleware::push_toast;
use crate::models::Toast;
use crate::state::AppState;

// =============================================================================
// Shared Helpers
// =============================================================================

/// Whether the request came from HTMX.
pub(crate) fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Toast a failed backend mutation and redirect.
///
/// A rejected token is not toasted: it becomes an `AppError` so the session
/// expiry layer signs the visitor out.
pub(crate) async fn fail_to(session: &Session, err: ApiError, target: &str) -> Response {
    if matches!(err, ApiError::Unauthorized) {
        return AppError::Api(err).into_response();
    }
    if err.is_server_side() {
        tracing::error!(error = %err, "Backend call failed");
    } else {
        tracing::warn!(error = %err, "Backend refused request");
    }
    push_toast(session, Toast::error(err.user_message())).await;
    Redirect::to(target).into_response()
}

/// Toast a validation message and redirect.
pub(crate) async fn invalid_to(session: &Session, message: impl Into<String>, target: &str) -> Response {
    push_toast(session, Toast::error(message)).await;
    Redirect::to(target).into_response()
}

/// Toast a success message and redirect.
pub(crate) async fn done_to(session: &Session, message: impl Into<String>, target: &str) -> Response {
    push_toast(session, Toast::success(message)).await;
    Redirect::to(target).into_response()
}

/// Local redirect target from a `next` parameter, or `fallback`.
///
/// Only same-site paths are honoured.
pub(crate) fn safe_next<'a>(next: Option<&'a str>, fallback: &'a str) -> &'a str {
    next.map(str::trim)
        .filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.starts_with("/\\"))
        .unwrap_or(fallback)
}

/// Trimmed form value, `None` when blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

// =============================================================================
// Routers
// =============================================================================

/// Create the catalog routes router.
fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/collections", get(collections::index))
        .route("/collections/filters", get(collections::filters))
        .route("/products/{id}", get(products::show))
        .route("/shops", get(shops::index))
        .route("/shops/{id}", get(shops::show))
}

/// Create the cart routes router.
fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the auth routes router.
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the account routes router.
fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::profile).post(account::update_profile))
        .route("/password", post(account::change_password))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route("/orders/{id}/cancel", post(account::cancel_order))
        .route(
            "/wishlist",
            get(account::wishlist).post(account::add_to_wishlist),
        )
        .route(
            "/wishlist/{product_id}/remove",
            post(account::remove_from_wishlist),
        )
        .route("/recent", get(account::recent))
        .route("/notifications", get(account::notifications))
        .route("/notifications/badge", get(account::notification_badge))
        .route("/notifications/read-all", post(account::mark_all_read))
        .route("/notifications/{id}/read", post(account::mark_read))
}

/// Create the admin routes router.
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route(
            "/products",
            get(admin::products::index).post(admin::products::create),
        )
        .route("/products/new", get(admin::products::new))
        .route(
            "/products/category-options",
            get(admin::products::category_options),
        )
        .route("/products/{id}", post(admin::products::update))
        .route("/products/{id}/edit", get(admin::products::edit))
        .route("/products/{id}/delete", post(admin::products::delete))
        .route(
            "/categories",
            get(admin::categories::index).post(admin::categories::create),
        )
        .route("/categories/{id}", post(admin::categories::rename))
        .route("/categories/{id}/delete", post(admin::categories::delete))
        .route(
            "/categories/{id}/subcategories",
            post(admin::categories::add_subcategory),
        )
        .route("/categories/{id}/third", post(admin::categories::add_third))
        .route(
            "/shops",
            get(admin::shops::index).post(admin::shops::create),
        )
        .route("/shops/new", get(admin::shops::new))
        .route("/shops/{id}", post(admin::shops::update))
        .route("/shops/{id}/edit", get(admin::shops::edit))
        .route("/shops/{id}/delete", post(admin::shops::delete))
        .route(
            "/shops/{id}/menu",
            get(admin::menu::index).post(admin::menu::create),
        )
        .route("/menu/{id}", post(admin::menu::update))
        .route("/menu/{id}/delete", post(admin::menu::delete))
        .route("/users", get(admin::users::index))
        .route("/users/{id}/role", post(admin::users::change_role))
        .route("/users/{id}/delete", post(admin::users::delete))
        .route("/orders", get(admin::orders::index))
        .route("/orders/{id}", get(admin::orders::show))
        .route("/orders/{id}/status", post(admin::orders::update_status))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::place_order))
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .nest("/admin", admin_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(Some("/account/orders"), "/"), "/account/orders");
        assert_eq!(safe_next(Some("//evil.example"), "/"), "/");
        assert_eq!(safe_next(Some("https://evil.example"), "/"), "/");
        assert_eq!(safe_next(None, "/account"), "/account");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some(" M ")), Some("M".to_string()));
    }
}
