//! Admin console route handlers.
//!
//! Every handler is guarded by `RequireAdmin`, except the shop menu editor,
//! which sellers may use too (`RequireSeller`).

pub mod categories;
pub mod menu;
pub mod orders;
pub mod products;
pub mod shops;
pub mod users;

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use bazaar_core::{DeliveryStatus, Order, Price};

use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::models::OrderSummaryView;
use crate::state::AppState;

/// Orders listed on the dashboard.
const RECENT_ORDERS: usize = 5;

/// Dashboard metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardMetrics {
    pub categories: usize,
    pub shops: usize,
    pub users: usize,
    pub orders: usize,
    pub open_orders: usize,
    pub revenue: String,
}

impl DashboardMetrics {
    /// Tally the dashboard counters.
    ///
    /// Revenue counts every order that was not cancelled.
    #[must_use]
    pub fn collect(categories: usize, shops: usize, users: usize, orders: &[Order]) -> Self {
        let revenue: Price = orders
            .iter()
            .filter(|o| o.delivery_status != DeliveryStatus::Cancelled)
            .map(Order::total)
            .sum();
        Self {
            categories,
            shops,
            users,
            orders: orders.len(),
            open_orders: orders
                .iter()
                .filter(|o| !o.delivery_status.is_final())
                .count(),
            revenue: revenue.to_string(),
        }
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub metrics: DashboardMetrics,
    pub recent_orders: Vec<OrderSummaryView>,
}

/// Display the admin dashboard.
#[instrument(skip(state, current, ctx))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(current): RequireAdmin,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let api = state.api();
    let (categories, shops, users, orders) = tokio::join!(
        api.categories(),
        api.shops(),
        api.list_users(&current.token),
        api.all_orders(&current.token, None),
    );
    let mut orders = orders?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(DashboardTemplate {
        ctx,
        metrics: DashboardMetrics::collect(categories?.len(), shops?.len(), users?.len(), &orders),
        recent_orders: orders
            .iter()
            .take(RECENT_ORDERS)
            .map(OrderSummaryView::from)
            .collect(),
    })
}
