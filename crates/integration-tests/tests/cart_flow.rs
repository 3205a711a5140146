//! Guest cart, sign-in merge and the server cart.

use bazaar_integration_tests::{TestApp, location};
use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn tee() -> Value {
    json!({
        "_id": "p1",
        "name": "Tee",
        "variants": [
            {"size": "M", "color": "Red", "price": 12.5, "quantity": 4},
            {"size": "L", "color": "Red", "price": 14, "quantity": 1}
        ]
    })
}

fn add_form(quantity: &'static str) -> [(&'static str, &'static str); 4] {
    [
        ("product_id", "p1"),
        ("size", "M"),
        ("color", "Red"),
        ("quantity", quantity),
    ]
}

#[tokio::test]
async fn test_guest_add_updates_count_badge() {
    let app = TestApp::spawn().await;
    app.mount_product("p1", tee()).await;

    let response = app.htmx_post("/cart/add", &add_form("2")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("hx-trigger").unwrap(), "cart-updated");
    assert!(response.text().await.unwrap().contains(">2<"));

    app.htmx_post("/cart/add", &add_form("1")).await;
    let body = app.htmx_get("/cart/count").await.text().await.unwrap();
    assert!(body.contains(">3<"));
}

#[tokio::test]
async fn test_blank_quantity_adds_one_unit() {
    let app = TestApp::spawn().await;
    app.mount_product("p1", tee()).await;

    let response = app.htmx_post("/cart/add", &add_form("")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains(">1<"));

    let response = app.post_form("/cart/add", &add_form("  ")).await;
    assert_eq!(location(&response), "/cart");
    let body = app.htmx_get("/cart/count").await.text().await.unwrap();
    assert!(body.contains(">2<"));
}

#[tokio::test]
async fn test_unknown_variant_is_refused() {
    let app = TestApp::spawn().await;
    app.mount_product("p1", tee()).await;

    let response = app
        .htmx_post(
            "/cart/add",
            &[("product_id", "p1"), ("size", "XL"), ("color", "Blue")],
        )
        .await;
    assert_eq!(response.headers().get("hx-retarget").unwrap(), "#cart-error");

    let body = app.htmx_get("/cart/count").await.text().await.unwrap();
    assert!(!body.contains("badge"));
}

#[tokio::test]
async fn test_guest_quantity_steps_and_remove() {
    let app = TestApp::spawn().await;
    app.mount_product("p1", tee()).await;
    app.htmx_post("/cart/add", &add_form("1")).await;

    let step = |s: &'static str| {
        [
            ("product_id", "p1"),
            ("size", "M"),
            ("color", "Red"),
            ("step", s),
        ]
    };
    let response = app.htmx_post("/cart/update", &step("+")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("<span>2</span>"));

    // Decrement never drops below one.
    app.htmx_post("/cart/update", &step("-")).await;
    let response = app.htmx_post("/cart/update", &step("-")).await;
    assert!(response.text().await.unwrap().contains("<span>1</span>"));

    let response = app
        .htmx_post(
            "/cart/remove",
            &[("product_id", "p1"), ("size", "M"), ("color", "Red")],
        )
        .await;
    assert!(response.text().await.unwrap().contains("Your cart is empty"));
}

#[tokio::test]
async fn test_non_htmx_add_redirects_to_cart() {
    let app = TestApp::spawn().await;
    app.mount_product("p1", tee()).await;

    let response = app.post_form("/cart/add", &add_form("1")).await;
    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn test_sign_in_merges_guest_cart_into_server_cart() {
    let app = TestApp::spawn().await;
    app.mount_product("p1", tee()).await;
    Mock::given(method("POST"))
        .and(path("/api/users/cart"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cart": [{"productId": "p1", "name": "Tee", "size": "M", "color": "Red", "quantity": 2, "price": 12.5}]
        })))
        .mount(&app.backend)
        .await;

    app.htmx_post("/cart/add", &add_form("2")).await;
    app.sign_in(0).await;

    let body = app.wait_for_request("POST", "/api/users/cart").await;
    let line: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(line["productId"], "p1");
    assert_eq!(line["quantity"], 2);

    // Signed in, the badge reads the server cart.
    let body = app.htmx_get("/cart/count").await.text().await.unwrap();
    assert!(body.contains(">2<"));
}

#[tokio::test]
async fn test_checkout_with_empty_server_cart_returns_to_cart() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/users/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cart": []})))
        .mount(&app.backend)
        .await;
    app.sign_in(0).await;

    let response = app.get("/checkout").await;
    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn test_place_order_clears_ordered_lines() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/users/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cart": [{"productId": "p1", "name": "Tee", "size": "M", "color": "Red", "quantity": 1, "price": 12.5}]
        })))
        .mount(&app.backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"_id": "o1"})))
        .expect(1)
        .mount(&app.backend)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/users/cart"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.backend)
        .await;
    app.sign_in(0).await;

    let response = app
        .post_form(
            "/checkout",
            &[
                ("full_name", "Asha Rao"),
                ("line1", "12 MG Road"),
                ("city", "Pune"),
                ("state", "MH"),
                ("postal_code", "411001"),
                ("country", "India"),
                ("phone", "9800000000"),
                ("payment_method", "cod"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/account/orders/o1");
}
