//! Shop endpoints. The shop list is cached; mutations invalidate it.

use bazaar_core::{Shop, ShopDraft, ShopId};
use reqwest::Method;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::{ApiClient, ApiError, segment};
use crate::models::UserToken;

impl ApiClient {
    /// Every shop.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn shops(&self) -> Result<Vec<Shop>, ApiError> {
        if let Some(CacheValue::Shops(shops)) = self.inner.cache.get(&CacheKey::Shops).await {
            debug!("Cache hit for shops");
            return Ok(shops);
        }

        let request = self.request(Method::GET, "api/shops", None)?;
        let shops: Vec<Shop> = self.send_list(request).await?;

        self.inner
            .cache
            .insert(CacheKey::Shops, CacheValue::Shops(shops.clone()))
            .await;

        Ok(shops)
    }

    /// A single shop.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown ID.
    #[instrument(skip(self))]
    pub async fn shop(&self, id: &ShopId) -> Result<Shop, ApiError> {
        let request = self.request(Method::GET, &format!("api/shops/{}", segment(id)), None)?;
        self.send_one(request).await
    }

    /// Create a shop (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, draft), fields(name = %draft.name))]
    pub async fn create_shop(&self, token: &UserToken, draft: &ShopDraft) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, "api/shops", Some(token))?
            .json(draft);
        let result = self.send_empty(request).await;
        self.invalidate(CacheKey::Shops).await;
        result
    }

    /// Update a shop (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, draft))]
    pub async fn update_shop(
        &self,
        token: &UserToken,
        id: &ShopId,
        draft: &ShopDraft,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, &format!("api/shops/{}", segment(id)), Some(token))?
            .json(draft);
        let result = self.send_empty(request).await;
        self.invalidate(CacheKey::Shops).await;
        result
    }

    /// Delete a shop (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn delete_shop(&self, token: &UserToken, id: &ShopId) -> Result<(), ApiError> {
        let request = self.request(
            Method::DELETE,
            &format!("api/shops/{}", segment(id)),
            Some(token),
        )?;
        let result = self.send_empty(request).await;
        self.invalidate(CacheKey::Shops).await;
        result
    }
}
