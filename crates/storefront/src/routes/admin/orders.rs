//! Admin order management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{DeliveryStatus, OrderId, PaymentStatus};

use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::models::{OrderSummaryView, OrderView};
use crate::routes::{done_to, fail_to, invalid_to, non_blank};
use crate::state::AppState;

/// One `<option>` of a status picker.
#[derive(Debug, Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn delivery_options(current: Option<DeliveryStatus>) -> Vec<StatusOption> {
    DeliveryStatus::SETTABLE
        .into_iter()
        .map(|s| StatusOption {
            value: s.as_str(),
            label: s.label(),
            selected: Some(s) == current,
        })
        .collect()
}

fn payment_options(current: PaymentStatus) -> Vec<StatusOption> {
    PaymentStatus::SETTABLE
        .into_iter()
        .map(|s| StatusOption {
            value: s.as_str(),
            label: s.as_str(),
            selected: s == current,
        })
        .collect()
}

/// Order list filter.
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilterQuery {
    pub status: Option<String>,
}

impl OrderFilterQuery {
    /// The requested delivery status; blank or unknown means all orders.
    fn status(&self) -> Option<DeliveryStatus> {
        non_blank(self.status.as_deref()).and_then(|s| s.parse().ok())
    }
}

/// Status update form. Blank fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct StatusForm {
    pub payment_status: Option<String>,
    pub delivery_status: Option<String>,
}

impl StatusForm {
    fn parse(
        &self,
    ) -> std::result::Result<(Option<PaymentStatus>, Option<DeliveryStatus>), String> {
        let payment = non_blank(self.payment_status.as_deref())
            .map(|s| s.parse::<PaymentStatus>())
            .transpose()?;
        let delivery = non_blank(self.delivery_status.as_deref())
            .map(|s| s.parse::<DeliveryStatus>())
            .transpose()?;
        if payment.is_none() && delivery.is_none() {
            return Err("Nothing to update".to_string());
        }
        Ok((payment, delivery))
    }
}

/// Admin order list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders/index.html")]
pub struct OrdersIndexTemplate {
    pub ctx: PageContext,
    pub orders: Vec<OrderSummaryView>,
    pub statuses: Vec<StatusOption>,
    pub filtered: bool,
}

/// Admin order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders/show.html")]
pub struct OrderShowTemplate {
    pub ctx: PageContext,
    pub order: OrderView,
    pub payment_options: Vec<StatusOption>,
    pub delivery_options: Vec<StatusOption>,
}

/// List orders, newest first.
#[instrument(skip(state, current, ctx))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(current): RequireAdmin,
    ctx: PageContext,
    Query(query): Query<OrderFilterQuery>,
) -> Result<impl IntoResponse> {
    let status = query.status();
    let mut orders = state.api().all_orders(&current.token, status).await?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(OrdersIndexTemplate {
        ctx,
        orders: orders.iter().map(OrderSummaryView::from).collect(),
        statuses: delivery_options(status),
        filtered: status.is_some(),
    })
}

/// Display one order with the status controls.
#[instrument(skip(state, current, ctx))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(current): RequireAdmin,
    ctx: PageContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let order = state.api().order(&current.token, &OrderId::new(id)).await?;
    Ok(OrderShowTemplate {
        ctx,
        payment_options: payment_options(order.payment_status),
        delivery_options: delivery_options(Some(order.delivery_status)),
        order: OrderView::from(&order),
    })
}

/// Update payment and/or delivery status.
#[instrument(skip(state, session, current))]
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(current): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Response {
    let id = OrderId::new(id);
    let target = format!("/admin/orders/{id}");
    let (payment, delivery) = match form.parse() {
        Ok(statuses) => statuses,
        Err(message) => return invalid_to(&session, message, &target).await,
    };
    match state
        .api()
        .update_order_status(&current.token, &id, payment, delivery)
        .await
    {
        Ok(()) => {
            tracing::info!(order_id = %id, ?payment, ?delivery, "Order status updated");
            done_to(&session, "Order updated", &target).await
        }
        Err(e) => fail_to(&session, e, &target).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_ignores_unknown_status() {
        let query = OrderFilterQuery {
            status: Some("shipped".to_string()),
        };
        assert_eq!(query.status(), Some(DeliveryStatus::Shipped));
        let query = OrderFilterQuery {
            status: Some("lost".to_string()),
        };
        assert_eq!(query.status(), None);
        assert_eq!(OrderFilterQuery::default().status(), None);
    }

    #[test]
    fn test_status_form_parsing() {
        let form = StatusForm {
            payment_status: Some("paid".to_string()),
            delivery_status: Some(String::new()),
        };
        assert_eq!(form.parse(), Ok((Some(PaymentStatus::Paid), None)));

        let form = StatusForm {
            payment_status: None,
            delivery_status: Some("out-for-delivery".to_string()),
        };
        assert_eq!(
            form.parse(),
            Ok((None, Some(DeliveryStatus::OutForDelivery)))
        );

        assert_eq!(
            StatusForm::default().parse(),
            Err("Nothing to update".to_string())
        );
        let form = StatusForm {
            payment_status: Some("bogus".to_string()),
            delivery_status: None,
        };
        assert!(form.parse().is_err());
    }

    #[test]
    fn test_delivery_options_mark_selection() {
        let options = delivery_options(Some(DeliveryStatus::Delivered));
        assert_eq!(options.iter().filter(|o| o.selected).count(), 1);
        assert!(options.iter().any(|o| o.value == "delivered" && o.selected));
    }
}
