//! Profile endpoints for the signed-in user.

use bazaar_core::User;
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::{ApiClient, ApiError};
use crate::models::UserToken;

/// Editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordChange<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

impl ApiClient {
    /// The caller's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn profile(&self, token: &UserToken) -> Result<User, ApiError> {
        let request = self.request(Method::GET, "api/profile", Some(token))?;
        self.send_one(request).await
    }

    /// Update the caller's profile and return the stored account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` for invalid fields.
    #[instrument(skip(self, token))]
    pub async fn update_profile(
        &self,
        token: &UserToken,
        update: &ProfileUpdate,
    ) -> Result<User, ApiError> {
        let request = self
            .request(Method::PUT, "api/profile", Some(token))?
            .json(update);
        self.send_one(request).await
    }

    /// Change the caller's password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the current password is wrong.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        token: &UserToken,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, "api/profile/password", Some(token))?
            .json(&PasswordChange {
                current_password,
                new_password,
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
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&ApiConfig::new(&server.uri()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_profile_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/profile"))
            .and(header("authorization", "Bearer t"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"_id": "u1", "name": "Asha", "email": "asha@example.com"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = client(&server).profile(&UserToken::new("t")).await.unwrap();
        assert_eq!(user.name, "Asha");
    }

    #[tokio::test]
    async fn test_update_profile_skips_empty_optionals() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/profile"))
            .and(header("authorization", "Bearer t"))
            .and(body_json(json!({"name": "Asha R", "email": "asha@example.com"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "u1", "name": "Asha R", "email": "asha@example.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let update = ProfileUpdate {
            name: "Asha R".to_string(),
            email: "asha@example.com".to_string(),
            ..ProfileUpdate::default()
        };
        let user = client(&server)
            .update_profile(&UserToken::new("t"), &update)
            .await
            .unwrap();
        assert_eq!(user.name, "Asha R");
    }

    #[tokio::test]
    async fn test_change_password_body_and_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/profile/password"))
            .and(body_json(json!({"currentPassword": "old-one", "newPassword": "new-one"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/profile/password"))
            .and(body_json(json!({"currentPassword": "wrong", "newPassword": "new-one"})))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"message": "Current password is incorrect"})),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        let token = UserToken::new("t");
        client.change_password(&token, "old-one", "new-one").await.unwrap();

        match client.change_password(&token, "wrong", "new-one").await {
            Err(ApiError::Rejected { message, .. }) => {
                assert_eq!(message, "Current password is incorrect");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
