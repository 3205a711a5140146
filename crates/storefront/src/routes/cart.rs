//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Guests keep their lines in the session (`local-cart`); signed-in visitors
//! use the backend cart. Every mutation answers with
//! `HX-Trigger: cart-updated` so the navbar badge refreshes itself.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Deserializer};
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{CartItem, CartItemError, CartLineKey, LocalCart, ProductId, QuantityChange};

use crate::api::ApiError;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext, push_toast};
use crate::models::{CartView, CurrentUser, Toast, session_keys};
use crate::state::AppState;

const CART_UPDATED: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Error fragments replace the page's `#cart-error` slot, not the request target.
const ERROR_TARGET: [(&str, &str); 2] = [("HX-Retarget", "#cart-error"), ("HX-Reswap", "innerHTML")];

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the guest cart from the session.
pub(crate) async fn local_cart(session: &Session) -> LocalCart {
    session
        .get::<LocalCart>(session_keys::LOCAL_CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Save the guest cart to the session.
async fn save_local_cart(
    session: &Session,
    cart: &LocalCart,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::LOCAL_CART, cart).await
}

/// Empty the guest cart and return its lines.
pub(crate) async fn take_local_cart(session: &Session) -> Vec<CartItem> {
    match session.remove::<LocalCart>(session_keys::LOCAL_CART).await {
        Ok(Some(mut cart)) => cart.drain_for_merge(),
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::error!("Failed to read guest cart: {e}");
            Vec::new()
        }
    }
}

/// The visitor's cart lines, wherever they live.
pub(crate) async fn cart_items(
    state: &AppState,
    session: &Session,
    current: Option<&CurrentUser>,
) -> Result<Vec<CartItem>, ApiError> {
    match current {
        Some(current) => state.api().server_cart(&current.token).await,
        None => Ok(local_cart(session).await.items().to_vec()),
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Deserialize blank strings as None for optional numeric fields.
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub quantity: Option<u32>,
}

/// Update cart form data.
///
/// Either `quantity` is set, or `step` is `+` / `-`.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub quantity: Option<u32>,
    pub step: Option<String>,
}

impl UpdateCartForm {
    fn key(&self) -> CartLineKey {
        CartLineKey::new(ProductId::new(self.product_id.trim()), &self.size, &self.color)
    }

    fn change(&self) -> Option<QuantityChange> {
        match self.step.as_deref().map(str::trim) {
            Some("+" | "increment") => Some(QuantityChange::Increment),
            Some("-" | "decrement") => Some(QuantityChange::Decrement),
            _ => self.quantity.map(QuantityChange::Set),
        }
    }
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
}

impl RemoveFromCartForm {
    fn key(&self) -> CartLineKey {
        CartLineKey::new(ProductId::new(self.product_id.trim()), &self.size, &self.color)
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub signed_in: bool,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Inline error message fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/form_error.html")]
pub struct FormErrorTemplate {
    pub message: String,
}

/// Error message fragment for HTMX targets.
///
/// A rejected token becomes an `AppError` so the visitor is signed out.
fn error_fragment(err: &ApiError) -> Response {
    if matches!(err, ApiError::Unauthorized) {
        return AppError::Api(ApiError::Unauthorized).into_response();
    }
    tracing::warn!(error = %err, "Cart request failed");
    form_error(err.user_message())
}

/// Validation message fragment.
fn form_error(message: impl Into<String>) -> Response {
    (
        AppendHeaders(ERROR_TARGET),
        FormErrorTemplate {
            message: message.into(),
        },
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, ctx, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    OptionalAuth(auth): OptionalAuth,
) -> Response {
    let cart = match cart_items(&state, &session, auth.as_ref()).await {
        Ok(items) => CartView::from_items(&items),
        Err(ApiError::Unauthorized) => return AppError::Api(ApiError::Unauthorized).into_response(),
        Err(e) => {
            tracing::warn!("Failed to fetch cart: {e}");
            CartView::from_items(&[])
        }
    };

    CartShowTemplate { ctx, cart }.into_response()
}

/// Add item to cart (HTMX).
///
/// The product is looked up so the line carries the current name, image and
/// variant price. Products with variants require a matching size and color.
#[instrument(skip(state, session, auth, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let product_id = ProductId::new(form.product_id.trim());
    let product = match state.api().product(&product_id).await {
        Ok(product) => product,
        Err(e) => return error_fragment(&e),
    };

    let item = match product.cart_item(&form.size, &form.color, form.quantity.unwrap_or(1)) {
        Ok(item) => item,
        Err(CartItemError::UnknownVariant { .. }) => {
            return form_error("Please choose an available size and color");
        }
        Err(CartItemError::Unavailable(_)) => {
            return form_error("This product is not available right now");
        }
    };

    let count = match &auth {
        Some(current) => {
            if let Err(e) = state.api().add_to_server_cart(&current.token, &item).await {
                return error_fragment(&e);
            }
            match state.api().server_cart(&current.token).await {
                Ok(items) => items.iter().map(|i| i.quantity).sum(),
                Err(e) => {
                    tracing::warn!("Failed to refresh cart count: {e}");
                    0
                }
            }
        }
        None => {
            let mut cart = local_cart(&session).await;
            cart.add(item);
            if let Err(e) = save_local_cart(&session, &cart).await {
                tracing::error!("Failed to save guest cart: {e}");
                return AppError::Session(e).into_response();
            }
            cart.item_count()
        }
    };

    if !super::is_htmx(&headers) {
        push_toast(&session, Toast::success(format!("Added {} to your cart", product.name))).await;
        return Redirect::to("/cart").into_response();
    }

    (AppendHeaders([CART_UPDATED]), CartCountTemplate { count }).into_response()
}

/// Update cart item quantity (HTMX).
#[instrument(skip(state, session, auth, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let htmx = super::is_htmx(&headers);
    let key = form.key();
    let Some(change) = form.change() else {
        return cart_items_response(&state, &session, auth.as_ref(), htmx).await;
    };

    match &auth {
        Some(current) => {
            let current_qty = match state.api().server_cart(&current.token).await {
                Ok(items) => items.iter().find(|i| i.key() == key).map(|i| i.quantity),
                Err(e) => return error_fragment(&e),
            };
            let Some(current_qty) = current_qty else {
                tracing::warn!(line = %key, "Update for a line not in the server cart");
                return cart_items_response(&state, &session, auth.as_ref(), htmx).await;
            };
            if let Err(e) = state
                .api()
                .update_server_cart(&current.token, &key, change.apply(current_qty))
                .await
            {
                return error_fragment(&e);
            }
        }
        None => {
            let mut cart = local_cart(&session).await;
            match cart.change_quantity(&key, change) {
                Ok(_) => {
                    if let Err(e) = save_local_cart(&session, &cart).await {
                        return AppError::Session(e).into_response();
                    }
                }
                Err(e) => tracing::warn!("Failed to update guest cart: {e}"),
            }
        }
    }

    cart_items_response(&state, &session, auth.as_ref(), htmx).await
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session, auth, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let htmx = super::is_htmx(&headers);
    let key = form.key();

    match &auth {
        Some(current) => {
            if let Err(e) = state.api().remove_from_server_cart(&current.token, &key).await {
                return error_fragment(&e);
            }
        }
        None => {
            let mut cart = local_cart(&session).await;
            if cart.remove(&key).is_some()
                && let Err(e) = save_local_cart(&session, &cart).await
            {
                return AppError::Session(e).into_response();
            }
        }
    }

    cart_items_response(&state, &session, auth.as_ref(), htmx).await
}

/// Re-render the cart lines with the cart-updated trigger.
///
/// Plain form posts go back to the cart page instead.
async fn cart_items_response(
    state: &AppState,
    session: &Session,
    current: Option<&CurrentUser>,
    htmx: bool,
) -> Response {
    if !htmx {
        return Redirect::to("/cart").into_response();
    }
    match cart_items(state, session, current).await {
        Ok(items) => (
            AppendHeaders([CART_UPDATED]),
            CartItemsTemplate {
                cart: CartView::from_items(&items),
                signed_in: current.is_some(),
            },
        )
            .into_response(),
        Err(e) => error_fragment(&e),
    }
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session, auth))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> Response {
    let count = match cart_items(&state, &session, auth.as_ref()).await {
        Ok(items) => items.iter().map(|i| i.quantity).sum(),
        Err(ApiError::Unauthorized) => return AppError::Api(ApiError::Unauthorized).into_response(),
        Err(e) => {
            tracing::warn!("Failed to fetch cart count: {e}");
            0
        }
    };

    CartCountTemplate { count }.into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{Request, header};

    use super::*;

    async fn decode<T: serde::de::DeserializeOwned + Send>(body: &'static str) -> Option<T> {
        let request = Request::post("/cart/add")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        Form::<T>::from_request(request, &()).await.ok().map(|Form(form)| form)
    }

    #[tokio::test]
    async fn test_blank_quantity_reads_as_missing() {
        let add: AddToCartForm = decode("product_id=p1&size=M&color=Red&quantity=").await.unwrap();
        assert_eq!(add.quantity, None);

        let add: AddToCartForm = decode("product_id=p1&quantity=+2+").await.unwrap();
        assert_eq!(add.quantity, Some(2));

        let update: UpdateCartForm = decode("product_id=p1&quantity=%20&step=%2B").await.unwrap();
        assert_eq!(update.quantity, None);
        assert_eq!(update.change(), Some(QuantityChange::Increment));

        assert!(decode::<AddToCartForm>("product_id=p1&quantity=lots").await.is_none());
    }

    fn update_form(quantity: Option<u32>, step: Option<&str>) -> UpdateCartForm {
        UpdateCartForm {
            product_id: " p1 ".to_string(),
            size: "M".to_string(),
            color: "Red".to_string(),
            quantity,
            step: step.map(String::from),
        }
    }

    #[test]
    fn test_update_form_change() {
        assert_eq!(
            update_form(Some(3), Some("+")).change(),
            Some(QuantityChange::Increment)
        );
        assert_eq!(
            update_form(None, Some("decrement")).change(),
            Some(QuantityChange::Decrement)
        );
        assert_eq!(update_form(Some(0), None).change(), Some(QuantityChange::Set(0)));
        assert_eq!(update_form(None, None).change(), None);
        assert_eq!(update_form(None, None).key().product_id.as_str(), "p1");
    }

    #[test]
    fn test_form_quantity_zero_clamps_to_one() {
        let change = update_form(Some(0), None).change().unwrap_or(QuantityChange::Set(1));
        assert_eq!(change.apply(5), 1);
    }
}
