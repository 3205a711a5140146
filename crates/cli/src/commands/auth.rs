//! Sign-in commands.

use bazaar_core::Email;
use bazaar_storefront::models::UserToken;
use tracing::instrument;

use super::Context;
use crate::error::CliError;
use crate::output::emit;

/// Sign in, store the token, and hand the guest cart to the server cart.
#[instrument(skip(ctx, password))]
pub async fn login(ctx: &mut Context, email: &str, password: &str) -> Result<(), CliError> {
    let email = Email::parse(email).map_err(|e| CliError::Invalid(e.to_string()))?;
    let auth = ctx.api().login(email.as_str(), password).await?;

    let token = UserToken::new(auth.token.clone());
    let guest_lines = ctx.state.local_cart.drain_for_merge();
    ctx.state.user_token = Some(auth.token);
    ctx.state.user = Some(auth.user.clone());
    ctx.save()?;

    let mut lines = vec![format!("Signed in as {}", auth.user.display_name())];
    if !guest_lines.is_empty() {
        let total = guest_lines.len();
        let merged = ctx.api().merge_into_server_cart(&token, guest_lines).await;
        tracing::info!(user_id = %auth.user.id, merged, total, "Merged guest cart");
        lines.push(format!("Moved {merged} of {total} cart lines to your account"));
    }
    emit(&lines);
    Ok(())
}

/// Forget the token and account.
pub fn logout(ctx: &mut Context) -> Result<(), CliError> {
    ctx.state.sign_out();
    ctx.save()?;
    emit(&["Signed out".to_string()]);
    Ok(())
}

/// Show the account behind the stored token, refreshing the stored copy.
pub async fn whoami(ctx: &mut Context) -> Result<(), CliError> {
    let token = ctx.token()?;
    let result = ctx.api().me(&token).await;
    let user = ctx.check(result)?;

    emit(&[format!("{} <{}> ({})", user.display_name(), user.email, user.role)]);
    ctx.state.user = Some(user);
    ctx.save()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::test_support::{context, reload};
    use bazaar_core::{CartItem, Price, ProductId};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_login_stores_token_and_merges_guest_cart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "t-1",
                "user": {"_id": "u1", "name": "Asha", "email": "asha@example.com", "role": 0}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/users/cart"))
            .and(body_partial_json(json!({"productId": "p1", "quantity": 2})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut ctx = context(&server);
        ctx.state.local_cart.add(CartItem {
            product_id: ProductId::new("p1"),
            name: "Tee".to_string(),
            image: None,
            size: "M".to_string(),
            color: "Red".to_string(),
            quantity: 2,
            price: Price::from_cents(1000),
        });

        login(&mut ctx, "asha@example.com", "secret1").await.unwrap();

        let saved = reload(&ctx);
        assert_eq!(saved.user_token.as_deref(), Some("t-1"));
        assert_eq!(saved.user.unwrap().name, "Asha");
        assert!(saved.local_cart.is_empty());
    }

    #[tokio::test]
    async fn test_bad_email_never_reaches_backend() {
        let server = MockServer::start().await;
        let mut ctx = context(&server);
        let err = login(&mut ctx, "not-an-email", "x").await.unwrap_err();
        assert!(matches!(err, CliError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_rejected_token_signs_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let mut ctx = context(&server);
        ctx.state.user_token = Some("stale".to_string());
        ctx.save().unwrap();

        let err = whoami(&mut ctx).await.unwrap_err();
        assert!(matches!(err, CliError::Api(_)));
        assert!(reload(&ctx).user_token.is_none());
    }

    #[tokio::test]
    async fn test_whoami_requires_sign_in() {
        let server = MockServer::start().await;
        let mut ctx = context(&server);
        assert!(matches!(whoami(&mut ctx).await, Err(CliError::NotSignedIn)));
    }
}
