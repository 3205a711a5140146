//! Checkout: shipping form and order placement.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{NewOrder, OrderError, ShippingAddress};

use crate::api::ApiError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireAuth, push_toast};
use crate::models::{CartView, Toast};
use crate::state::AppState;

/// Payment methods offered at checkout, as (code, label).
pub const PAYMENT_METHODS: [(&str, &str); 2] =
    [("cod", "Cash on delivery"), ("card", "Card on delivery")];

const DEFAULT_PAYMENT_METHOD: &str = "cod";

/// One payment radio button.
#[derive(Debug, Clone)]
pub struct PaymentOption {
    pub code: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Shipping form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: String,
    pub payment_method: Option<String>,
}

impl CheckoutForm {
    fn address(&self) -> ShippingAddress {
        ShippingAddress {
            full_name: self.full_name.trim().to_string(),
            line1: self.line1.trim().to_string(),
            line2: self.line2.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }

    fn payment_method(&self) -> &'static str {
        let wanted = self.payment_method.as_deref().unwrap_or_default().trim();
        PAYMENT_METHODS
            .iter()
            .find(|(code, _)| *code == wanted)
            .map_or(DEFAULT_PAYMENT_METHOD, |(code, _)| *code)
    }

    fn payment_options(&self) -> Vec<PaymentOption> {
        let selected = self.payment_method();
        PAYMENT_METHODS
            .iter()
            .map(|&(code, label)| PaymentOption {
                code,
                label,
                selected: code == selected,
            })
            .collect()
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
    pub form: CheckoutForm,
    pub payment_options: Vec<PaymentOption>,
    pub error: Option<String>,
}

/// Display the checkout form.
#[instrument(skip(state, session, ctx, current))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    ctx: PageContext,
) -> Result<Response> {
    let items = state.api().server_cart(&current.token).await?;
    if items.is_empty() {
        push_toast(&session, Toast::info("Your cart is empty")).await;
        return Ok(Redirect::to("/cart").into_response());
    }

    let form = CheckoutForm {
        full_name: current.user.name.clone(),
        phone: current.user.phone.clone().unwrap_or_default(),
        ..CheckoutForm::default()
    };

    Ok(CheckoutTemplate {
        ctx,
        cart: CartView::from_items(&items),
        payment_options: form.payment_options(),
        form,
        error: None,
    }
    .into_response())
}

/// Place the order.
///
/// An invalid address re-renders the form with the visitor's input. After
/// the order is placed its lines are removed from the server cart; a line
/// that fails to clear is only logged.
#[instrument(skip(state, session, ctx, current, form))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    ctx: PageContext,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let items = state.api().server_cart(&current.token).await?;
    let cart = CartView::from_items(&items);

    let new_order = match NewOrder::new(items, form.address(), form.payment_method()) {
        Ok(order) => order,
        Err(OrderError::EmptyCart) => {
            push_toast(&session, Toast::info("Your cart is empty")).await;
            return Ok(Redirect::to("/cart").into_response());
        }
        Err(OrderError::Address(e)) => {
            return Ok(CheckoutTemplate {
                ctx,
                cart,
                payment_options: form.payment_options(),
                form,
                error: Some(e.to_string()),
            }
            .into_response());
        }
    };

    let order = match state.api().place_order(&current.token, &new_order).await {
        Ok(order) => order,
        Err(e @ ApiError::Rejected { .. }) => {
            return Ok(CheckoutTemplate {
                ctx,
                cart,
                payment_options: form.payment_options(),
                form,
                error: Some(e.user_message()),
            }
            .into_response());
        }
        Err(e) => return Err(AppError::from(e)),
    };

    for item in &new_order.items {
        if let Err(e) = state
            .api()
            .remove_from_server_cart(&current.token, &item.key())
            .await
        {
            tracing::warn!(line = %item.key(), "Failed to clear ordered cart line: {e}");
        }
    }

    tracing::info!(order_id = %order.id, "Order placed");
    push_toast(
        &session,
        Toast::success(format!("Order {} placed", order.reference())),
    )
    .await;
    Ok(Redirect::to(&format!("/account/orders/{}", order.id)).into_response())
}
