//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use bazaar_core::Category;

use crate::api::ProductFilter;
use crate::filters;
use crate::middleware::PageContext;
use crate::models::{ProductCard, ShopCard};
use crate::state::AppState;

/// Products shown in the featured strip.
const FEATURED_LIMIT: u32 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub categories: Vec<Category>,
    pub shops: Vec<ShopCard>,
    pub featured: Vec<ProductCard>,
}

/// Display the home page.
///
/// Each section degrades to empty on its own when the backend call fails.
#[instrument(skip(state, ctx))]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> impl IntoResponse {
    let filter = ProductFilter {
        limit: Some(FEATURED_LIMIT),
        ..ProductFilter::default()
    };
    let api = state.api();
    let (categories, shops, products) =
        tokio::join!(api.categories(), api.shops(), api.products(&filter));

    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!("Failed to load categories for home page: {e}");
        Vec::new()
    });
    let shops = shops.map_or_else(
        |e| {
            tracing::warn!("Failed to load shops for home page: {e}");
            Vec::new()
        },
        |shops| shops.iter().map(ShopCard::from).collect(),
    );
    let featured = products.map_or_else(
        |e| {
            tracing::warn!("Failed to load featured products: {e}");
            Vec::new()
        },
        |page| {
            page.products
                .iter()
                .take(FEATURED_LIMIT as usize)
                .map(ProductCard::from)
                .collect()
        },
    );

    HomeTemplate {
        ctx,
        categories,
        shops,
        featured,
    }
}
