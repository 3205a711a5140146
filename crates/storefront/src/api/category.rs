//! Category tree endpoints. The list is cached; mutations invalidate it.

use bazaar_core::{Category, CategoryDraft, CategoryId};
use reqwest::Method;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::{ApiClient, ApiError, segment};
use crate::models::UserToken;

impl ApiClient {
    /// Every category with its subcategories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let request = self.request(Method::GET, "api/category", None)?;
        let categories: Vec<Category> = self.send_list(request).await?;

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    /// Fetch one category from the cached list.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no category has this ID.
    pub async fn category(&self, id: &CategoryId) -> Result<Category, ApiError> {
        self.categories()
            .await?
            .into_iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("category {id}")))
    }

    /// Create a category (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, draft), fields(name = %draft.name))]
    pub async fn create_category(
        &self,
        token: &UserToken,
        draft: &CategoryDraft,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, "api/category", Some(token))?
            .json(draft);
        let result = self.send_empty(request).await;
        self.invalidate(CacheKey::Categories).await;
        result
    }

    /// Replace a category's name and subcategory tree (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, draft))]
    pub async fn update_category(
        &self,
        token: &UserToken,
        id: &CategoryId,
        draft: &CategoryDraft,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, &format!("api/category/{}", segment(id)), Some(token))?
            .json(draft);
        let result = self.send_empty(request).await;
        self.invalidate(CacheKey::Categories).await;
        result
    }

    /// Delete a category (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn delete_category(&self, token: &UserToken, id: &CategoryId) -> Result<(), ApiError> {
        let request = self.request(
            Method::DELETE,
            &format!("api/category/{}", segment(id)),
            Some(token),
        )?;
        let result = self.send_empty(request).await;
        self.invalidate(CacheKey::Categories).await;
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_categories_are_cached_until_mutation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/category"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"_id": "c1", "name": "Food", "subcategories": []}])),
            )
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/category/c9"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = ApiClient::new(&ApiConfig::new(&server.uri()).unwrap()).unwrap();
        assert_eq!(client.categories().await.unwrap().len(), 1);
        assert_eq!(client.categories().await.unwrap().len(), 1);

        client
            .delete_category(&UserToken::new("t"), &CategoryId::new("c9"))
            .await
            .unwrap();
        client.categories().await.unwrap();
    }

    #[tokio::test]
    async fn test_category_lookup_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/category"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "categories": [{"_id": "c1", "name": "Food"}, {"_id": "c2", "name": "Clothing"}]
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&ApiConfig::new(&server.uri()).unwrap()).unwrap();
        let category = client.category(&CategoryId::new("c2")).await.unwrap();
        assert_eq!(category.name, "Clothing");
        assert!(matches!(
            client.category(&CategoryId::new("zz")).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
