//! REST client for the marketplace backend.
//!
//! # Architecture
//!
//! - One `reqwest::Client` shared by every request, with a per-request timeout
//! - Authenticated calls take a [`UserToken`] and send it as a bearer token
//! - Category and shop lists are cached in memory via `moka`; admin
//!   mutations on those resources invalidate the cached entry
//! - The backend wraps responses inconsistently, so list endpoints accept a
//!   bare array or an object holding the array under a well-known key, and
//!   single-entity endpoints accept the entity bare or under `data`
//!
//! # Example
//!
//! ```rust,ignore
//! use bazaar_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let session = client.login(&email, &password).await?;
//! let orders = client.my_orders(&UserToken::new(session.token)).await?;
//! ```

mod cache;
mod cart;
mod category;
mod menu;
mod notifications;
mod orders;
mod products;
mod profile;
mod shops;
mod users;
mod wishlist;

pub use products::{ProductFilter, ProductPage};
pub use profile::ProfileUpdate;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;
use crate::models::UserToken;

use cache::{CacheKey, CacheValue};

/// Object keys under which the backend nests list payloads.
const LIST_KEYS: &[&str] = &[
    "data",
    "items",
    "products",
    "categories",
    "shops",
    "menu",
    "menuItems",
    "orders",
    "users",
    "notifications",
    "wishlist",
    "recentViews",
    "cart",
];

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The bearer token was missing, expired, or rejected (401).
    #[error("Unauthorized")]
    Unauthorized,

    /// The account lacks the role for this call (403).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The resource does not exist (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused the request (other 4xx).
    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The backend failed (5xx).
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Message safe to show to the visitor.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Unauthorized => "Please sign in again.".to_string(),
            Self::Forbidden(_) => "You do not have permission to do that.".to_string(),
            Self::NotFound(_) => "We couldn't find what you were looking for.".to_string(),
            Self::Http(_) | Self::Url(_) | Self::Server { .. } | Self::Decode(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    /// Whether the failure is on the backend side rather than the request.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Url(_) | Self::Server { .. } | Self::Decode(_)
        )
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the marketplace REST backend.
///
/// Cheap to clone; all clones share one connection pool and one cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("bazaar/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(64)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// The backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Start a request against `path` (relative, e.g. `api/products`).
    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&UserToken>,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(path.trim_start_matches('/'))?;
        let builder = self.inner.client.request(method, url);
        Ok(match token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        })
    }

    /// Send a request and return the JSON body after status checks.
    async fn send(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Decode(e)
        })
    }

    /// Send a request and decode a single entity.
    async fn send_one<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        decode_one(self.send(request).await?)
    }

    /// Send a request and decode a list.
    async fn send_list<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Vec<T>, ApiError> {
        decode_list(self.send(request).await?)
    }

    /// Send a request whose body is not needed.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.send(request).await.map(|_| ())
    }

    /// Drop a cached catalog entry after a mutation.
    async fn invalidate(&self, key: CacheKey) {
        debug!(?key, "Invalidating cached catalog entry");
        self.inner.cache.invalidate(&key).await;
    }
}

/// Percent-encode an id so it stays a single path segment.
fn segment(id: impl AsRef<str>) -> String {
    urlencoding::encode(id.as_ref()).into_owned()
}

// =============================================================================
// Response Decoding
// =============================================================================

/// Map a non-success status to an error, pulling the backend's message.
fn status_error(status: StatusCode, body: &str) -> ApiError {
    let message = error_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });

    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        s if s.is_client_error() => ApiError::Rejected {
            status: s.as_u16(),
            message,
        },
        s => {
            tracing::error!(
                status = %s,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned server error"
            );
            ApiError::Server {
                status: s.as_u16(),
                message,
            }
        }
    }
}

/// Extract `message` or `error` from a JSON error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error", "msg"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(ToOwned::to_owned)
}

/// Decode a list from a bare array or an object wrapping one.
pub(crate) fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, ApiError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(mut map) => {
            let nested = LIST_KEYS
                .iter()
                .find_map(|key| map.remove(*key).filter(|v| v.is_array() || v.is_object()));
            match nested {
                Some(inner) => decode_list(inner),
                None => Ok(serde_json::from_value(Value::Object(map))?),
            }
        }
        other => Ok(serde_json::from_value(other)?),
    }
}

/// Decode an entity given bare or under `data`.
pub(crate) fn decode_one<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    match serde_json::from_value::<T>(value.clone()) {
        Ok(entity) => Ok(entity),
        Err(err) => match value {
            Value::Object(mut map) => match map.remove("data") {
                Some(inner) => Ok(serde_json::from_value(inner)?),
                None => Err(ApiError::Decode(err)),
            },
            _ => Err(ApiError::Decode(err)),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bazaar_core::{Category, Product, User};
    use serde_json::json;

    #[test]
    fn test_segment_escapes_path_characters() {
        assert_eq!(segment("p1"), "p1");
        assert_eq!(segment("a/b?c#d"), "a%2Fb%3Fc%23d");
        assert_eq!(segment(&bazaar_core::ProductId::new("../admin")), "..%2Fadmin");
    }

    #[test]
    fn test_decode_list_bare_array() {
        let users: Vec<User> = decode_list(json!([{"_id": "u1"}, {"id": "u2"}])).unwrap();
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn test_decode_list_wrapped() {
        let products: Vec<Product> =
            decode_list(json!({"products": [{"_id": "p1", "name": "Tee"}], "totalPages": 3}))
                .unwrap();
        assert_eq!(products.len(), 1);

        let categories: Vec<Category> =
            decode_list(json!({"success": true, "data": {"categories": [{"_id": "c1", "name": "Food"}]}}))
                .unwrap();
        assert_eq!(categories.len(), 1);
    }

    #[test]
    fn test_decode_list_null_is_empty() {
        let users: Vec<User> = decode_list(Value::Null).unwrap();
        assert!(users.is_empty());
    }

    #[test]
    fn test_decode_one_unwraps_data() {
        let user: User = decode_one(json!({"data": {"_id": "u1", "name": "A"}})).unwrap();
        assert_eq!(user.id.as_str(), "u1");
        let bare: User = decode_one(json!({"_id": "u2"})).unwrap();
        assert_eq!(bare.id.as_str(), "u2");
        assert!(decode_one::<User>(json!({"nothing": true})).is_err());
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, r#"{"message":"admins only"}"#),
            ApiError::Forbidden(m) if m == "admins only"
        ));
        match status_error(StatusCode::BAD_REQUEST, r#"{"error":"Email taken"}"#) {
            ApiError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Email taken");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(status_error(StatusCode::BAD_GATEWAY, "<html>").is_server_side());
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = ApiError::Server {
            status: 500,
            message: "stack trace".to_string(),
        };
        assert!(!err.user_message().contains("stack"));
        let err = ApiError::Rejected {
            status: 400,
            message: "Out of stock".to_string(),
        };
        assert_eq!(err.user_message(), "Out of stock");
    }
}
