//! Shop list and shop pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use bazaar_core::{MenuItem, ShopId};

use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::models::ShopCard;
use crate::state::AppState;

/// Menu item display data for templates.
#[derive(Debug, Clone)]
pub struct MenuItemView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image: Option<String>,
    pub available: bool,
}

impl From<&MenuItem> for MenuItemView {
    fn from(item: &MenuItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price.to_string(),
            image: item.image.clone(),
            available: item.available,
        }
    }
}

/// Shop list template.
#[derive(Template, WebTemplate)]
#[template(path = "shops/index.html")]
pub struct ShopsIndexTemplate {
    pub ctx: PageContext,
    pub shops: Vec<ShopCard>,
}

/// Shop page template.
#[derive(Template, WebTemplate)]
#[template(path = "shops/show.html")]
pub struct ShopShowTemplate {
    pub ctx: PageContext,
    pub shop: ShopCard,
    pub menu: Vec<MenuItemView>,
}

/// Display every shop.
#[instrument(skip(state, ctx))]
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let shops = state.api().shops().await?;
    Ok(ShopsIndexTemplate {
        ctx,
        shops: shops.iter().map(ShopCard::from).collect(),
    })
}

/// Display one shop and its menu.
#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = ShopId::new(id);
    let (shop, menu) = tokio::join!(state.api().shop(&id), state.api().menu(&id));
    let shop = shop?;
    let menu = menu.unwrap_or_else(|e| {
        tracing::warn!(shop_id = %id, "Failed to load menu: {e}");
        Vec::new()
    });

    Ok(ShopShowTemplate {
        ctx,
        shop: ShopCard::from(&shop),
        menu: menu.iter().map(MenuItemView::from).collect(),
    })
}
