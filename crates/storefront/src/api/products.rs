//! Product catalog endpoints.

use bazaar_core::{CategorySelection, Product, ProductDraft, ProductId};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use super::{ApiClient, ApiError, decode_list, segment};
use crate::models::UserToken;

/// Query filters for the product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub third_category: Option<String>,
    #[serde(rename = "q", skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ProductFilter {
    /// Filter on a category cascade selection.
    #[must_use]
    pub fn from_selection(selection: &CategorySelection) -> Self {
        Self {
            category: selection.category.clone(),
            subcategory: selection.subcategory.clone(),
            third_category: selection.third.clone(),
            ..Self::default()
        }
    }
}

/// One page of the product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub page: u32,
    pub total_pages: u32,
}

impl ProductPage {
    /// Read a listing body: a bare array, or an object with paging fields.
    fn from_value(value: Value, requested_page: u32) -> Result<Self, ApiError> {
        let number = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
        };
        let page = number("page")
            .or_else(|| number("currentPage"))
            .unwrap_or(requested_page)
            .max(1);
        let total_pages = number("totalPages")
            .or_else(|| number("pages"))
            .unwrap_or(page)
            .max(page);
        Ok(Self {
            products: decode_list(value)?,
            page,
            total_pages,
        })
    }

    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }
}

impl ApiClient {
    /// List products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, filter: &ProductFilter) -> Result<ProductPage, ApiError> {
        let request = self
            .request(Method::GET, "api/products", None)?
            .query(filter);
        let value = self.send(request).await?;
        ProductPage::from_value(value, filter.page.unwrap_or(1))
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown ID.
    #[instrument(skip(self))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let request = self.request(Method::GET, &format!("api/products/{}", segment(id)), None)?;
        self.send_one(request).await
    }

    /// Create a product (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, draft), fields(name = %draft.name))]
    pub async fn create_product(
        &self,
        token: &UserToken,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        let request = self
            .request(Method::POST, "api/products", Some(token))?
            .json(draft);
        self.send_one(request).await
    }

    /// Update a product (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, draft))]
    pub async fn update_product(
        &self,
        token: &UserToken,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, &format!("api/products/{}", segment(id)), Some(token))?
            .json(draft);
        self.send_empty(request).await
    }

    /// Delete a product (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn delete_product(&self, token: &UserToken, id: &ProductId) -> Result<(), ApiError> {
        let request = self.request(
            Method::DELETE,
            &format!("api/products/{}", segment(id)),
            Some(token),
        )?;
        self.send_empty(request).await
    }
}
