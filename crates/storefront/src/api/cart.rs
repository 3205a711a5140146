//! Server cart endpoints for signed-in visitors.
//!
//! Lines are keyed on product + size + color; the backend sums quantities
//! when the same line is posted twice.

use bazaar_core::{CartItem, CartLineKey};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::{ApiClient, ApiError};
use crate::models::UserToken;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LineQuantity<'a> {
    #[serde(flatten)]
    key: &'a CartLineKey,
    quantity: u32,
}

impl ApiClient {
    /// Lines in the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn server_cart(&self, token: &UserToken) -> Result<Vec<CartItem>, ApiError> {
        let request = self.request(Method::GET, "api/users/cart", Some(token))?;
        self.send_list(request).await
    }

    /// Add a line to the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product = %item.product_id))]
    pub async fn add_to_server_cart(
        &self,
        token: &UserToken,
        item: &CartItem,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, "api/users/cart", Some(token))?
            .json(item);
        self.send_empty(request).await
    }

    /// Set a line's quantity. Callers clamp to at least 1 first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(line = %key))]
    pub async fn update_server_cart(
        &self,
        token: &UserToken,
        key: &CartLineKey,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, "api/users/cart", Some(token))?
            .json(&LineQuantity {
                key,
                quantity: quantity.max(1),
            });
        self.send_empty(request).await
    }

    /// Remove a line from the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(line = %key))]
    pub async fn remove_from_server_cart(
        &self,
        token: &UserToken,
        key: &CartLineKey,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::DELETE, "api/users/cart", Some(token))?
            .query(key);
        self.send_empty(request).await
    }

    /// Post every guest line to the server cart, one request per line.
    ///
    /// Failures are logged and skipped; returns how many lines were accepted.
    #[instrument(skip_all, fields(lines = items.len()))]
    pub async fn merge_into_server_cart(&self, token: &UserToken, items: Vec<CartItem>) -> usize {
        let mut merged = 0;
        for item in items {
            match self.add_to_server_cart(token, &item).await {
                Ok(()) => merged += 1,
                Err(e) => tracing::warn!(
                    product = %item.product_id,
                    error = %e,
                    "Failed to merge local cart line"
                ),
            }
        }
        merged
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use bazaar_core::{Price, ProductId};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&ApiConfig::new(&server.uri()).unwrap()).unwrap()
    }

    fn item(id: &str) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: "Tee".into(),
            image: None,
            size: "M".into(),
            color: "Red".into(),
            quantity: 2,
            price: Price::from_cents(1000),
        }
    }

    #[tokio::test]
    async fn test_server_cart_decodes_wrapped_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cart": [{"productId": {"_id": "p1", "name": "Tee", "price": 10}, "size": "M", "color": "Red", "quantity": 3}]
            })))
            .mount(&server)
            .await;

        let lines = client(&server)
            .await
            .server_cart(&UserToken::new("t"))
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines.first().unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_update_sends_key_and_quantity() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/users/cart"))
            .and(body_json(json!({"productId": "p1", "size": "M", "color": "Red", "quantity": 1})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let key = CartLineKey::new(ProductId::new("p1"), "M", "Red");
        client(&server)
            .await
            .update_server_cart(&UserToken::new("t"), &key, 0)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_remove_uses_query_key() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/users/cart"))
            .and(query_param("productId", "p1"))
            .and(query_param("size", "M"))
            .and(query_param("color", "Red"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let key = CartLineKey::new(ProductId::new("p1"), "M", "Red");
        client(&server)
            .await
            .remove_from_server_cart(&UserToken::new("t"), &key)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_merge_posts_every_line_and_counts_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/cart"))
            .and(body_json(json!({
                "productId": "bad", "name": "Tee", "size": "M", "color": "Red", "quantity": 2, "price": 10.0
            })))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/users/cart"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let merged = client(&server)
            .await
            .merge_into_server_cart(&UserToken::new("t"), vec![item("p1"), item("bad"), item("p2")])
            .await;
        assert_eq!(merged, 2);
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }
}
