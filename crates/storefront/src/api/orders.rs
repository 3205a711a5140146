//! Order endpoints.

use bazaar_core::{DeliveryStatus, NewOrder, Order, OrderId, PaymentStatus};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::{ApiClient, ApiError, segment};
use crate::models::UserToken;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delivery_status: Option<DeliveryStatus>,
}

#[derive(Serialize)]
struct StatusFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<DeliveryStatus>,
}

impl ApiClient {
    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the backend refuses the order.
    #[instrument(skip(self, token, order), fields(lines = order.items.len(), total = %order.total))]
    pub async fn place_order(&self, token: &UserToken, order: &NewOrder) -> Result<Order, ApiError> {
        let request = self
            .request(Method::POST, "api/orders", Some(token))?
            .json(order);
        self.send_one(request).await
    }

    /// The signed-in user's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn my_orders(&self, token: &UserToken) -> Result<Vec<Order>, ApiError> {
        let request = self.request(Method::GET, "api/orders/my", Some(token))?;
        self.send_list(request).await
    }

    /// One order. The backend checks ownership unless the caller is admin.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` or `ApiError::Forbidden`.
    #[instrument(skip(self, token))]
    pub async fn order(&self, token: &UserToken, id: &OrderId) -> Result<Order, ApiError> {
        let request = self.request(
            Method::GET,
            &format!("api/orders/{}", segment(id)),
            Some(token),
        )?;
        self.send_one(request).await
    }

    /// Cancel one of the caller's orders.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` once the order has left processing.
    #[instrument(skip(self, token))]
    pub async fn cancel_order(&self, token: &UserToken, id: &OrderId) -> Result<(), ApiError> {
        let request = self.request(
            Method::PUT,
            &format!("api/orders/{}/cancel", segment(id)),
            Some(token),
        )?;
        self.send_empty(request).await
    }

    /// Every order, optionally filtered by delivery status (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn all_orders(
        &self,
        token: &UserToken,
        status: Option<DeliveryStatus>,
    ) -> Result<Vec<Order>, ApiError> {
        let request = self
            .request(Method::GET, "api/orders", Some(token))?
            .query(&StatusFilter { status });
        self.send_list(request).await
    }

    /// Set payment and/or delivery status (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn update_order_status(
        &self,
        token: &UserToken,
        id: &OrderId,
        payment_status: Option<PaymentStatus>,
        delivery_status: Option<DeliveryStatus>,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, &format!("api/orders/{}/status", segment(id)), Some(token))?
            .json(&StatusUpdate {
                payment_status,
                delivery_status,
            });
        self.send_empty(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use serde_json::json;
    use bazaar_core::{CartItem, Price, ProductId, ShippingAddress};
    use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&ApiConfig::new(&server.uri()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_place_order_posts_lines_and_decodes_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orders"))
            .and(header("authorization", "Bearer t"))
            .and(body_partial_json(json!({
                "items": [{"productId": "p1", "size": "M", "color": "Red", "quantity": 2}],
                "total": 25.0,
                "paymentMethod": "cod"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {"_id": "o9", "orderStatus": "processing", "totalPrice": 25}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let order = NewOrder {
            items: vec![CartItem {
                product_id: ProductId::new("p1"),
                name: "Tee".to_string(),
                image: None,
                size: "M".to_string(),
                color: "Red".to_string(),
                quantity: 2,
                price: Price::from_cents(1250),
            }],
            shipping_address: ShippingAddress::default(),
            total: Price::from_cents(2500),
            payment_method: "cod".to_string(),
        };
        let placed = client(&server)
            .place_order(&UserToken::new("t"), &order)
            .await
            .unwrap();
        assert_eq!(placed.id, OrderId::new("o9"));
        assert_eq!(placed.total(), Price::from_cents(2500));
    }

    #[tokio::test]
    async fn test_my_orders_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orders/my"))
            .and(header("authorization", "Bearer t"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"_id": "o1"}, {"_id": "o2", "paymentStatus": "paid"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let orders = client(&server).my_orders(&UserToken::new("t")).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders.last().unwrap().payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_foreign_order_is_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orders/o2"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"message": "Not your order"})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .order(&UserToken::new("t"), &OrderId::new("o2"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(m) if m == "Not your order"));
    }

    #[tokio::test]
    async fn test_cancel_uses_cancel_path() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/orders/o1/cancel"))
            .and(header("authorization", "Bearer t"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .cancel_order(&UserToken::new("t"), &OrderId::new("o1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_status_update_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/orders/o1/status"))
            .and(body_json(json!({"deliveryStatus": "out-for-delivery"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&ApiConfig::new(&server.uri()).unwrap()).unwrap();
        client
            .update_order_status(
                &UserToken::new("t"),
                &OrderId::new("o1"),
                None,
                Some(DeliveryStatus::OutForDelivery),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_all_orders_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orders"))
            .and(query_param("status", "shipped"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"orders": [
                {"_id": "o1", "orderStatus": "shipped"}
            ]})))
            .mount(&server)
            .await;

        let client = ApiClient::new(&ApiConfig::new(&server.uri()).unwrap()).unwrap();
        let orders = client
            .all_orders(&UserToken::new("t"), Some(DeliveryStatus::Shipped))
            .await
            .unwrap();
        assert_eq!(orders.first().unwrap().delivery_status, DeliveryStatus::Shipped);
    }
}
