//! Product detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use bazaar_core::{Product, ProductId};

use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext};
use crate::state::AppState;

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub variants: Vec<VariantView>,
    pub in_stock: bool,
    /// Category path, top level first.
    pub breadcrumbs: Vec<String>,
    pub shop_id: Option<String>,
}

/// Variant row for the size/color/price table.
#[derive(Debug, Clone)]
pub struct VariantView {
    pub size: String,
    pub color: String,
    pub price: String,
    pub stock: u32,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product
                .lowest_price()
                .map_or_else(String::new, |p| p.to_string()),
            images: product.images.clone(),
            sizes: product.sizes().into_iter().map(String::from).collect(),
            colors: product.colors().into_iter().map(String::from).collect(),
            variants: product
                .variants
                .iter()
                .map(|v| VariantView {
                    size: v.size.clone(),
                    color: v.color.clone(),
                    price: v.price.to_string(),
                    stock: v.quantity,
                })
                .collect(),
            in_stock: product.in_stock(),
            breadcrumbs: [
                &product.category,
                &product.subcategory,
                &product.third_category,
            ]
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .cloned()
            .collect(),
            shop_id: product.shop.as_ref().map(ToString::to_string),
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub product: ProductView,
}

/// Display product detail page.
///
/// Signed-in visitors get the view recorded in the background; a failed
/// recording is only logged.
#[instrument(skip(state, ctx, auth))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    auth: OptionalAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(id);
    let product = state.api().product(&id).await?;

    if let OptionalAuth(Some(current)) = auth {
        let api = state.api().clone();
        tokio::spawn(async move {
            if let Err(e) = api.record_view(&current.token, &id).await {
                tracing::warn!(product_id = %id, "Failed to record recent view: {e}");
            }
        });
    }

    Ok(ProductShowTemplate {
        ctx,
        product: ProductView::from(&product),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_product_view() {
        let product: Product = serde_json::from_str(
            r#"{
                "_id": "p1",
                "name": "Tee",
                "category": "Clothing",
                "subcategory": "Men",
                "thirdCategory": "",
                "variants": [
                    {"size": "M", "color": "Red", "price": 12.5, "quantity": 3},
                    {"size": "L", "color": "Red", "price": 14, "quantity": 0}
                ]
            }"#,
        )
        .unwrap();
        let view = ProductView::from(&product);
        assert_eq!(view.breadcrumbs, vec!["Clothing", "Men"]);
        assert_eq!(view.price, "$12.50");
        assert_eq!(view.sizes, vec!["M", "L"]);
        assert_eq!(view.colors, vec!["Red"]);
        assert_eq!(view.variants[1].stock, 0);
        assert!(view.in_stock);
    }
}
