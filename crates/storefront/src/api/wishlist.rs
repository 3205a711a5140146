//! Wishlist and recently-viewed endpoints.

use bazaar_core::{Product, ProductId};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiClient, ApiError, segment};
use crate::models::UserToken;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductRef<'a> {
    product_id: &'a ProductId,
}

/// A saved-product entry: the populated product, or a wrapper around it.
#[derive(Deserialize)]
#[serde(untagged)]
enum SavedProduct {
    Bare(Product),
    Wrapped { product: Product },
}

impl From<SavedProduct> for Product {
    fn from(saved: SavedProduct) -> Self {
        match saved {
            SavedProduct::Bare(product) | SavedProduct::Wrapped { product } => product,
        }
    }
}

impl ApiClient {
    /// Products on the caller's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn wishlist(&self, token: &UserToken) -> Result<Vec<Product>, ApiError> {
        let request = self.request(Method::GET, "api/wishlist", Some(token))?;
        let saved: Vec<SavedProduct> = self.send_list(request).await?;
        Ok(saved.into_iter().map(Product::from).collect())
    }

    /// Add a product to the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn add_to_wishlist(&self, token: &UserToken, id: &ProductId) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, "api/wishlist", Some(token))?
            .json(&ProductRef { product_id: id });
        self.send_empty(request).await
    }

    /// Remove a product from the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn remove_from_wishlist(
        &self,
        token: &UserToken,
        id: &ProductId,
    ) -> Result<(), ApiError> {
        let request = self.request(
            Method::DELETE,
            &format!("api/wishlist/{}", segment(id)),
            Some(token),
        )?;
        self.send_empty(request).await
    }

    /// Products the caller viewed recently.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn recent_views(&self, token: &UserToken) -> Result<Vec<Product>, ApiError> {
        let request = self.request(Method::GET, "api/recent-views", Some(token))?;
        let saved: Vec<SavedProduct> = self.send_list(request).await?;
        Ok(saved.into_iter().map(Product::from).collect())
    }

    /// Record a product view.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn record_view(&self, token: &UserToken, id: &ProductId) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, "api/recent-views", Some(token))?
            .json(&ProductRef { product_id: id });
        self.send_empty(request).await
    }
}
