//! Product grid with the cascading category filter.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::{Category, CategorySelection};

use crate::api::ProductFilter;
use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::models::ProductCard;
use crate::state::AppState;

/// Query parameters for the product grid.
#[derive(Debug, Default, Deserialize)]
pub struct CollectionQuery {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub third: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
}

/// One `<option>` in a dropdown.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

fn options(values: Vec<String>, current: Option<&String>) -> Vec<SelectOption> {
    values
        .into_iter()
        .map(|value| SelectOption {
            selected: current.is_some_and(|c| c.eq_ignore_ascii_case(&value)),
            value,
        })
        .collect()
}

/// The three cascading dropdowns, ready to render.
#[derive(Debug, Clone)]
pub struct CategorySelects {
    pub categories: Vec<SelectOption>,
    pub subcategories: Vec<SelectOption>,
    pub thirds: Vec<SelectOption>,
    /// Form field name for the third level.
    pub third_field: &'static str,
    /// Fragment URL re-rendering these dropdowns.
    pub refresh_url: &'static str,
    /// Whether a category must be picked before submitting.
    pub required: bool,
}

impl CategorySelects {
    /// Dropdowns for the storefront filter bar.
    #[must_use]
    pub fn for_filters(selection: &CategorySelection, categories: &[Category]) -> Self {
        Self::build(selection, categories, "third", "/collections/filters", false)
    }

    /// Dropdowns for the admin product form.
    #[must_use]
    pub fn for_product_form(selection: &CategorySelection, categories: &[Category]) -> Self {
        Self::build(
            selection,
            categories,
            "third_category",
            "/admin/products/category-options",
            true,
        )
    }

    fn build(
        selection: &CategorySelection,
        categories: &[Category],
        third_field: &'static str,
        refresh_url: &'static str,
        required: bool,
    ) -> Self {
        Self {
            categories: options(
                CategorySelection::category_options(categories),
                selection.category.as_ref(),
            ),
            subcategories: options(
                selection.subcategory_options(categories),
                selection.subcategory.as_ref(),
            ),
            thirds: options(
                selection.third_options(categories),
                selection.third.as_ref(),
            ),
            third_field,
            refresh_url,
            required,
        }
    }
}

/// Apply a dropdown change to the cascade.
///
/// `changed` is the name of the dropdown that fired (HTMX sends it as
/// `HX-Trigger-Name`). Levels below the changed one are reset.
#[must_use]
pub fn cascade(
    category: Option<&str>,
    subcategory: Option<&str>,
    third: Option<&str>,
    changed: Option<&str>,
    categories: &[Category],
) -> CategorySelection {
    let mut selection = CategorySelection::default();
    selection.select_category(category);
    if changed != Some("category") {
        selection.select_subcategory(subcategory);
        if changed != Some("subcategory") {
            selection.select_third(third);
        }
    }
    selection.normalized(categories)
}

/// Name of the form control that triggered an HTMX request.
pub(crate) fn trigger_name(headers: &HeaderMap) -> Option<&str> {
    headers.get("hx-trigger-name").and_then(|v| v.to_str().ok())
}

/// Product grid page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/index.html")]
pub struct CollectionTemplate {
    pub ctx: PageContext,
    pub selects: CategorySelects,
    pub query: String,
    pub heading: String,
    pub products: Vec<ProductCard>,
    pub page: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// Cascading filter dropdowns (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/category_selects.html")]
pub struct CategorySelectsTemplate {
    pub selects: CategorySelects,
}

/// Link to another page of the same listing.
fn page_url(selection: &CategorySelection, query: Option<&str>, page: u32) -> String {
    let mut params = vec![];
    let mut push = |key: &str, value: Option<&str>| {
        if let Some(v) = value {
            params.push(format!("{key}={}", urlencoding::encode(v)));
        }
    };
    push("category", selection.category.as_deref());
    push("subcategory", selection.subcategory.as_deref());
    push("third", selection.third.as_deref());
    push("q", query);
    params.push(format!("page={page}"));
    format!("/collections?{}", params.join("&"))
}

/// Display the product grid.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<CollectionQuery>,
) -> Result<impl IntoResponse> {
    let categories = state.api().categories().await?;
    let selection = CategorySelection::from_parts(
        query.category.as_deref(),
        query.subcategory.as_deref(),
        query.third.as_deref(),
    )
    .normalized(&categories);
    let search = super::non_blank(query.q.as_deref());

    let filter = ProductFilter {
        query: search.clone(),
        page: Some(query.page.unwrap_or(1).max(1)),
        limit: Some(state.config().page_size),
        ..ProductFilter::from_selection(&selection)
    };
    let listing = state.api().products(&filter).await?;

    let heading = selection
        .third
        .as_ref()
        .or(selection.subcategory.as_ref())
        .or(selection.category.as_ref())
        .cloned()
        .unwrap_or_else(|| "All products".to_string());

    Ok(CollectionTemplate {
        ctx,
        selects: CategorySelects::for_filters(&selection, &categories),
        query: search.clone().unwrap_or_default(),
        heading,
        products: listing.products.iter().map(ProductCard::from).collect(),
        page: listing.page,
        prev_url: listing
            .has_prev()
            .then(|| page_url(&selection, search.as_deref(), listing.page - 1)),
        next_url: listing
            .has_next()
            .then(|| page_url(&selection, search.as_deref(), listing.page + 1)),
    })
}

/// Re-render the filter dropdowns after one of them changed (HTMX).
#[instrument(skip(state, headers))]
pub async fn filters(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CollectionQuery>,
) -> Result<impl IntoResponse> {
    let categories = state.api().categories().await?;
    let selection = cascade(
        query.category.as_deref(),
        query.subcategory.as_deref(),
        query.third.as_deref(),
        trigger_name(&headers),
        &categories,
    );

    Ok(CategorySelectsTemplate {
        selects: CategorySelects::for_filters(&selection, &categories),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn tree() -> Vec<Category> {
        serde_json::from_str(
            r#"[
                {"_id":"c1","name":"Clothing","subcategories":[
                    {"name":"Men","thirdCategories":["Shirts","Jeans"]},
                    {"name":"Women","thirdCategories":["Dresses"]}
                ]},
                {"_id":"c2","name":"Food","subcategories":[{"name":"Snacks"}]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_changing_category_resets_lower_levels() {
        let selection = cascade(
            Some("Food"),
            Some("Men"),
            Some("Shirts"),
            Some("category"),
            &tree(),
        );
        assert_eq!(selection.category.as_deref(), Some("Food"));
        assert_eq!(selection.subcategory, None);
        assert_eq!(selection.third, None);
    }

    #[test]
    fn test_changing_subcategory_resets_third() {
        let selection = cascade(
            Some("Clothing"),
            Some("Women"),
            Some("Shirts"),
            Some("subcategory"),
            &tree(),
        );
        assert_eq!(selection.subcategory.as_deref(), Some("Women"));
        assert_eq!(selection.third, None);
    }

    #[test]
    fn test_third_change_keeps_upper_levels() {
        let selection = cascade(
            Some("Clothing"),
            Some("Men"),
            Some("Jeans"),
            Some("third"),
            &tree(),
        );
        assert_eq!(selection.third.as_deref(), Some("Jeans"));
        let selects = CategorySelects::for_filters(&selection, &tree());
        assert_eq!(selects.thirds.len(), 2);
        assert!(selects.thirds[1].selected);
        assert!(selects.categories[0].selected);
    }

    #[test]
    fn test_page_url_encodes_values() {
        let selection = CategorySelection::from_parts(Some("Home & Garden"), None, None);
        assert_eq!(
            page_url(&selection, Some("red mug"), 2),
            "/collections?category=Home%20%26%20Garden&q=red%20mug&page=2"
        );
    }
}
