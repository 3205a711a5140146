//! Shop menu endpoints (seller or admin for mutations).

use bazaar_core::{MenuItem, MenuItemDraft, MenuItemId, ShopId};
use reqwest::Method;
use tracing::instrument;

use super::{ApiClient, ApiError, segment};
use crate::models::UserToken;

impl ApiClient {
    /// A shop's menu.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn menu(&self, shop: &ShopId) -> Result<Vec<MenuItem>, ApiError> {
        let request = self.request(Method::GET, &format!("api/menu/{}", segment(shop)), None)?;
        self.send_list(request).await
    }

    /// Add an item to a shop's menu.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, draft), fields(name = %draft.name))]
    pub async fn add_menu_item(
        &self,
        token: &UserToken,
        shop: &ShopId,
        draft: &MenuItemDraft,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, &format!("api/menu/{}", segment(shop)), Some(token))?
            .json(draft);
        self.send_empty(request).await
    }

    /// Update a menu item.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, draft))]
    pub async fn update_menu_item(
        &self,
        token: &UserToken,
        id: &MenuItemId,
        draft: &MenuItemDraft,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, &format!("api/menu/item/{}", segment(id)), Some(token))?
            .json(draft);
        self.send_empty(request).await
    }

    /// Delete a menu item.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn delete_menu_item(&self, token: &UserToken, id: &MenuItemId) -> Result<(), ApiError> {
        let request = self.request(
            Method::DELETE,
            &format!("api/menu/item/{}", segment(id)),
            Some(token),
        )?;
        self.send_empty(request).await
    }
}
