//! Catalog browsing.

use bazaar_storefront::api::ProductFilter;

use super::Context;
use crate::error::CliError;
use crate::output::{category_tree, emit, product_rows};

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Listing filter from command-line flags; pages start at 1.
pub fn product_filter(
    category: Option<String>,
    subcategory: Option<String>,
    third_category: Option<String>,
    query: Option<String>,
    page: u32,
) -> ProductFilter {
    ProductFilter {
        category: non_blank(category),
        subcategory: non_blank(subcategory),
        third_category: non_blank(third_category),
        query: non_blank(query),
        page: Some(page.max(1)),
        ..ProductFilter::default()
    }
}

/// Print the category tree.
pub async fn categories(ctx: &Context) -> Result<(), CliError> {
    let categories = ctx.api().categories().await?;
    emit(&category_tree(&categories));
    Ok(())
}

/// Print one page of products.
pub async fn products(ctx: &Context, filter: &ProductFilter) -> Result<(), CliError> {
    let page = ctx.api().products(filter).await?;
    if page.products.is_empty() {
        emit(&["No products match".to_string()]);
        return Ok(());
    }
    let mut lines = product_rows(&page.products);
    lines.push(format!("Page {} of {}", page.page, page.total_pages));
    emit(&lines);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_filter_drops_blank_flags() {
        let filter = product_filter(
            Some("Clothing".to_string()),
            Some("  ".to_string()),
            None,
            Some(" shirt ".to_string()),
            0,
        );
        assert_eq!(filter.category.as_deref(), Some("Clothing"));
        assert_eq!(filter.subcategory, None);
        assert_eq!(filter.query.as_deref(), Some("shirt"));
        assert_eq!(filter.page, Some(1));
    }
}
