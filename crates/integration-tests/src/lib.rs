//! End-to-end tests for the Bazaar storefront.
//!
//! Each test starts the real router on an ephemeral port, pointed at a
//! `wiremock` server standing in for the marketplace backend. The HTTP
//! client keeps cookies and does not follow redirects, so tests can assert
//! on `Location` headers.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```

use std::net::SocketAddr;

use bazaar_storefront::{build_router, config::StorefrontConfig, state::AppState};
use reqwest::{Client, Response, redirect::Policy};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A running storefront and its mocked backend.
pub struct TestApp {
    pub addr: SocketAddr,
    pub backend: MockServer,
    pub client: Client,
}

impl TestApp {
    /// Start the storefront against a fresh mock backend.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    #[allow(clippy::unwrap_used)]
    pub async fn spawn() -> Self {
        let backend = MockServer::start().await;
        let config = StorefrontConfig::for_api(&backend.uri()).unwrap();
        let state = AppState::new(config).unwrap();
        let router = build_router(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .unwrap();

        Self {
            addr,
            backend,
            client,
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// GET a storefront path.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::unwrap_used)]
    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// GET a storefront path as HTMX would.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::unwrap_used)]
    pub async fn htmx_get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .header("HX-Request", "true")
            .send()
            .await
            .unwrap()
    }

    /// POST a form to a storefront path.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::unwrap_used)]
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// POST a form as HTMX would.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::unwrap_used)]
    pub async fn htmx_post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// Mount a backend login for an account with `role` (0 user, 1 admin,
    /// 2 seller) and sign in through the storefront.
    ///
    /// # Panics
    ///
    /// Panics if the login is not accepted.
    pub async fn sign_in(&self, role: u8) -> Response {
        Mock::given(method("POST"))
            .and(path("/api/users/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "t-1",
                "user": {"_id": "u1", "name": "Asha", "email": "asha@example.com", "role": role}
            })))
            .mount(&self.backend)
            .await;

        let response = self
            .post_form(
                "/auth/login",
                &[("email", "asha@example.com"), ("password", "secret1")],
            )
            .await;
        assert!(
            response.status().is_redirection(),
            "login failed with {}",
            response.status()
        );
        response
    }

    /// Serve `body` for `GET /api/products/{id}`.
    pub async fn mount_product(&self, id: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/products/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.backend)
            .await;
    }

    /// Wait until the backend has seen a request matching `method_name` and
    /// `path_name`, for work done on spawned tasks.
    ///
    /// # Panics
    ///
    /// Panics if no such request arrives within two seconds.
    #[allow(clippy::unwrap_used)]
    pub async fn wait_for_request(&self, method_name: &str, path_name: &str) -> Vec<u8> {
        for _ in 0..100 {
            let requests = self.backend.received_requests().await.unwrap_or_default();
            if let Some(request) = requests
                .into_iter()
                .find(|r| r.method.as_str() == method_name && r.url.path() == path_name)
            {
                return request.body;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("backend never received {method_name} {path_name}");
    }
}

/// `Location` header of a redirect, or an empty string.
#[must_use]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
