//! In-app notification endpoints.

use bazaar_core::{Notification, NotificationId};
use reqwest::Method;
use tracing::instrument;

use super::{ApiClient, ApiError, segment};
use crate::models::UserToken;

impl ApiClient {
    /// The signed-in user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn notifications(&self, token: &UserToken) -> Result<Vec<Notification>, ApiError> {
        let request = self.request(Method::GET, "api/users/notifications", Some(token))?;
        let notifications: Vec<Notification> = self.send_list(request).await?;
        Ok(bazaar_core::models::notification::latest_first(notifications))
    }

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn mark_notification_read(
        &self,
        token: &UserToken,
        id: &NotificationId,
    ) -> Result<(), ApiError> {
        let request = self.request(
            Method::PUT,
            &format!("api/users/notifications/{}/read", segment(id)),
            Some(token),
        )?;
        self.send_empty(request).await
    }

    /// Mark every notification read.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn mark_all_notifications_read(&self, token: &UserToken) -> Result<(), ApiError> {
        let request = self.request(Method::PUT, "api/users/notifications/read-all", Some(token))?;
        self.send_empty(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_notifications_sorted_newest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/notifications"))
            .and(header("authorization", "Bearer t"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"notifications": [
                {"_id": "n1", "message": "old", "createdAt": "2024-01-01T00:00:00Z"},
                {"_id": "n2", "message": "new", "createdAt": "2024-02-01T00:00:00Z"}
            ]})))
            .mount(&server)
            .await;

        let client = ApiClient::new(&ApiConfig::new(&server.uri()).unwrap()).unwrap();
        let list = client.notifications(&UserToken::new("t")).await.unwrap();
        assert_eq!(list.first().unwrap().id.as_str(), "n2");
    }

    #[tokio::test]
    async fn test_mark_read_path() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/users/notifications/n1/read"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&ApiConfig::new(&server.uri()).unwrap()).unwrap();
        client
            .mark_notification_read(&UserToken::new("t"), &NotificationId::new("n1"))
            .await
            .unwrap();
    }
}
