//! Admin product management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{
    Category, CategorySelection, Price, Product, ProductDraft, ProductId, Shop, ShopId, Variant,
};

use crate::api::ProductFilter;
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::routes::collections::{CategorySelects, CategorySelectsTemplate, cascade, trigger_name};
use crate::routes::{done_to, fail_to, non_blank};
use crate::state::AppState;

const LIST: &str = "/admin/products";

// =============================================================================
// Form
// =============================================================================

/// Product form data.
///
/// Images are one URL per line. Variants are one per line as
/// `size | color | price | quantity`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub third_category: String,
    #[serde(default)]
    pub images: String,
    #[serde(default)]
    pub variants: String,
    #[serde(default)]
    pub shop: String,
}

fn variant_line(v: &Variant) -> String {
    format!("{} | {} | {} | {}", v.size, v.color, v.price.amount(), v.quantity)
}

/// Parse the variants textarea.
fn parse_variants(text: &str) -> std::result::Result<Vec<Variant>, String> {
    let mut variants = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        let [size, color, price, quantity] = fields.as_slice() else {
            return Err(format!(
                "Variant line {}: expected size | color | price | quantity",
                n + 1
            ));
        };
        let price = Price::parse_input(price)
            .ok_or_else(|| format!("Variant line {}: invalid price", n + 1))?;
        let quantity = quantity
            .parse::<u32>()
            .map_err(|_| format!("Variant line {}: invalid quantity", n + 1))?;
        variants.push(Variant {
            size: (*size).to_string(),
            color: (*color).to_string(),
            price,
            quantity,
        });
    }
    if variants.is_empty() {
        return Err("Add at least one variant".to_string());
    }
    Ok(variants)
}

impl ProductForm {
    fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            subcategory: product.subcategory.clone(),
            third_category: product.third_category.clone(),
            images: product.images.join("\n"),
            variants: product
                .variants
                .iter()
                .map(variant_line)
                .collect::<Vec<_>>()
                .join("\n"),
            shop: product
                .shop
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }

    fn selection(&self, categories: &[Category]) -> CategorySelection {
        CategorySelection::from_parts(
            Some(&self.category),
            Some(&self.subcategory),
            Some(&self.third_category),
        )
        .normalized(categories)
    }

    /// Validate the form into a backend draft.
    fn to_draft(&self, categories: &[Category]) -> std::result::Result<ProductDraft, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Product name is required".to_string());
        }
        let selection = self.selection(categories);
        let Some(category) = selection.category else {
            return Err("Pick a category".to_string());
        };
        Ok(ProductDraft {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            category,
            subcategory: selection.subcategory.unwrap_or_default(),
            third_category: selection.third.unwrap_or_default(),
            variants: parse_variants(&self.variants)?,
            images: self
                .images
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
            shop: non_blank(Some(&self.shop)).map(ShopId::from),
        })
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product row in the admin list.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: String,
    pub stock: u32,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category: [
                product.category.as_str(),
                product.subcategory.as_str(),
                product.third_category.as_str(),
            ]
            .into_iter()
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(" / "),
            price: product
                .lowest_price()
                .map(|p| p.to_string())
                .unwrap_or_default(),
            stock: product.total_stock(),
        }
    }
}

/// Shop choice in the product form.
#[derive(Debug, Clone)]
pub struct ShopOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

fn shop_options(shops: &[Shop], current: &str) -> Vec<ShopOption> {
    shops
        .iter()
        .map(|s| ShopOption {
            id: s.id.to_string(),
            name: s.name.clone(),
            selected: s.id.as_str() == current.trim(),
        })
        .collect()
}

/// Admin product list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/index.html")]
pub struct ProductsIndexTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductRow>,
    pub page: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// Product create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/form.html")]
pub struct ProductFormTemplate {
    pub ctx: PageContext,
    pub title: String,
    pub action: String,
    pub form: ProductForm,
    pub selects: CategorySelects,
    pub shops: Vec<ShopOption>,
    pub error: Option<String>,
}

/// Page query for the admin list.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// Query sent by the cascading dropdowns on the product form.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryOptionsQuery {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub third_category: Option<String>,
}

async fn form_page(
    state: &AppState,
    ctx: PageContext,
    title: &str,
    action: String,
    form: ProductForm,
    error: Option<String>,
) -> Result<Response> {
    let api = state.api();
    let (categories, shops) = tokio::join!(api.categories(), api.shops());
    let categories = categories?;
    let shops = shops?;
    Ok(ProductFormTemplate {
        ctx,
        title: title.to_string(),
        action,
        selects: CategorySelects::for_product_form(&form.selection(&categories), &categories),
        shops: shop_options(&shops, &form.shop),
        form,
        error,
    }
    .into_response())
}

// =============================================================================
// Handlers
// =============================================================================

/// List products.
#[instrument(skip(state, _admin, ctx))]
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ctx: PageContext,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let filter = ProductFilter {
        page: Some(query.page.unwrap_or(1).max(1)),
        limit: Some(state.config().page_size),
        ..ProductFilter::default()
    };
    let listing = state.api().products(&filter).await?;
    Ok(ProductsIndexTemplate {
        ctx,
        products: listing.products.iter().map(ProductRow::from).collect(),
        page: listing.page,
        prev_url: listing
            .has_prev()
            .then(|| format!("{LIST}?page={}", listing.page - 1)),
        next_url: listing
            .has_next()
            .then(|| format!("{LIST}?page={}", listing.page + 1)),
    })
}

/// New product form.
#[instrument(skip(state, _admin, ctx))]
pub async fn new(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ctx: PageContext,
) -> Result<Response> {
    form_page(
        &state,
        ctx,
        "New product",
        LIST.to_string(),
        ProductForm::default(),
        None,
    )
    .await
}

/// Create a product.
#[instrument(skip(state, session, current, ctx, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(current): RequireAdmin,
    ctx: PageContext,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let categories = state.api().categories().await?;
    let draft = match form.to_draft(&categories) {
        Ok(draft) => draft,
        Err(message) => {
            return form_page(&state, ctx, "New product", LIST.to_string(), form, Some(message))
                .await;
        }
    };

    match state.api().create_product(&current.token, &draft).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product created");
            Ok(done_to(&session, format!("Created {}", draft.name), LIST).await)
        }
        Err(e) => Ok(fail_to(&session, e, "/admin/products/new").await),
    }
}

/// Edit product form.
#[instrument(skip(state, _admin, ctx))]
pub async fn edit(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ctx: PageContext,
    Path(id): Path<String>,
) -> Result<Response> {
    let product = state.api().product(&ProductId::new(id)).await?;
    form_page(
        &state,
        ctx,
        &format!("Edit {}", product.name),
        format!("{LIST}/{}", product.id),
        ProductForm::from_product(&product),
        None,
    )
    .await
}

/// Update a product.
#[instrument(skip(state, session, current, ctx, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(current): RequireAdmin,
    ctx: PageContext,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let id = ProductId::new(id);
    let categories = state.api().categories().await?;
    let draft = match form.to_draft(&categories) {
        Ok(draft) => draft,
        Err(message) => {
            return form_page(
                &state,
                ctx,
                "Edit product",
                format!("{LIST}/{id}"),
                form,
                Some(message),
            )
            .await;
        }
    };

    match state.api().update_product(&current.token, &id, &draft).await {
        Ok(()) => Ok(done_to(&session, format!("Saved {}", draft.name), LIST).await),
        Err(e) => Ok(fail_to(&session, e, &format!("{LIST}/{id}/edit")).await),
    }
}

/// Delete a product.
#[instrument(skip(state, session, current))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(current): RequireAdmin,
    Path(id): Path<String>,
) -> Response {
    match state
        .api()
        .delete_product(&current.token, &ProductId::new(id))
        .await
    {
        Ok(()) => done_to(&session, "Product deleted", LIST).await,
        Err(e) => fail_to(&session, e, LIST).await,
    }
}

/// Re-render the product form's category dropdowns (HTMX).
#[instrument(skip(state, _admin, headers))]
pub async fn category_options(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    headers: HeaderMap,
    Query(query): Query<CategoryOptionsQuery>,
) -> Result<impl IntoResponse> {
    let categories = state.api().categories().await?;
    let selection = cascade(
        query.category.as_deref(),
        query.subcategory.as_deref(),
        query.third_category.as_deref(),
        trigger_name(&headers),
        &categories,
    );
    Ok(CategorySelectsTemplate {
        selects: CategorySelects::for_product_form(&selection, &categories),
    })
}
