//! Authentication and account administration endpoints.

use bazaar_core::{AuthSession, Role, User, UserId};
use reqwest::Method;
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use super::{ApiClient, ApiError, segment};
use crate::models::UserToken;

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct Registration<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

impl ApiClient {
    /// Exchange credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` or `ApiError::Rejected` for bad
    /// credentials, or a transport error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let request = self
            .request(Method::POST, "api/users/login", None)?
            .json(&Credentials { email, password });
        self.send_one(request).await
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the backend refuses the sign-up.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ApiError> {
        let request = self
            .request(Method::POST, "api/users/register", None)?
            .json(&Registration {
                name,
                email,
                password,
            });
        self.send_one(request).await
    }

    /// The account behind a token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when the token is no longer valid.
    #[instrument(skip_all)]
    pub async fn me(&self, token: &UserToken) -> Result<User, ApiError> {
        let request = self.request(Method::GET, "api/users/me", Some(token))?;
        self.send_one(request).await
    }

    /// Every account (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn list_users(&self, token: &UserToken) -> Result<Vec<User>, ApiError> {
        let request = self.request(Method::GET, "api/users", Some(token))?;
        self.send_list(request).await
    }

    /// Change an account's role (admin). Roles go out as integer codes.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn set_user_role(
        &self,
        token: &UserToken,
        id: &UserId,
        role: Role,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, &format!("api/users/{}/role", segment(id)), Some(token))?
            .json(&json!({ "role": role.code() }));
        self.send_empty(request).await
    }

    /// Delete an account (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn delete_user(&self, token: &UserToken, id: &UserId) -> Result<(), ApiError> {
        let request = self.request(
            Method::DELETE,
            &format!("api/users/{}", segment(id)),
            Some(token),
        )?;
        self.send_empty(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&ApiConfig::new(&server.uri()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_login_decodes_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/login"))
            .and(body_json(json!({"email": "a@x.io", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "t-1",
                "user": {"_id": "u1", "name": "Asha", "email": "a@x.io", "role": 2}
            })))
            .mount(&server)
            .await;

        let session = client(&server).await.login("a@x.io", "pw").await.unwrap();
        assert_eq!(session.token, "t-1");
        assert_eq!(session.user.role, Role::Seller);
    }

    #[tokio::test]
    async fn test_login_rejected_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/login"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid password"})),
            )
            .mount(&server)
            .await;

        let err = client(&server).await.login("a@x.io", "bad").await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid password");
    }

    #[tokio::test]
    async fn test_me_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "u1"}})),
            )
            .mount(&server)
            .await;

        let user = client(&server)
            .await
            .me(&UserToken::new("secret-token"))
            .await
            .unwrap();
        assert_eq!(user.id.as_str(), "u1");
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .me(&UserToken::new("old"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn test_set_role_sends_code() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/users/u7/role"))
            .and(body_json(json!({"role": 1})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .await
            .set_user_role(&UserToken::new("t"), &UserId::new("u7"), Role::Admin)
            .await
            .unwrap();
    }
}
