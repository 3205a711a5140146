//! Admin shop management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{Shop, ShopDraft, ShopId, User, UserId};

use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::models::{ShopCard, UserToken};
use crate::routes::{done_to, fail_to, non_blank};
use crate::state::AppState;

const LIST: &str = "/admin/shops";

/// Shop form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShopForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub owner: String,
}

impl ShopForm {
    fn from_shop(shop: &Shop) -> Self {
        Self {
            name: shop.name.clone(),
            description: shop.description.clone(),
            image: shop.image.clone().unwrap_or_default(),
            address: shop.address.clone(),
            owner: shop.owner.as_ref().map(ToString::to_string).unwrap_or_default(),
        }
    }

    fn to_draft(&self) -> std::result::Result<ShopDraft, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Shop name is required".to_string());
        }
        Ok(ShopDraft {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            image: non_blank(Some(&self.image)),
            address: self.address.trim().to_string(),
            owner: non_blank(Some(&self.owner)).map(UserId::from),
        })
    }
}

/// Owner choice in the shop form.
#[derive(Debug, Clone)]
pub struct OwnerOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

/// Accounts that may own a shop: sellers and admins.
fn owner_options(users: &[User], current: &str) -> Vec<OwnerOption> {
    users
        .iter()
        .filter(|u| u.role.can_sell())
        .map(|u| OwnerOption {
            id: u.id.to_string(),
            label: format!("{} ({})", u.display_name(), u.email),
            selected: u.id.as_str() == current.trim(),
        })
        .collect()
}

/// Admin shop list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/shops/index.html")]
pub struct ShopsIndexTemplate {
    pub ctx: PageContext,
    pub shops: Vec<ShopCard>,
}

/// Shop create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/shops/form.html")]
pub struct ShopFormTemplate {
    pub ctx: PageContext,
    pub title: String,
    pub action: String,
    pub form: ShopForm,
    pub owners: Vec<OwnerOption>,
    pub error: Option<String>,
}

async fn form_page(
    state: &AppState,
    token: &UserToken,
    ctx: PageContext,
    title: String,
    action: String,
    form: ShopForm,
    error: Option<String>,
) -> Result<Response> {
    let users = state.api().list_users(token).await?;
    Ok(ShopFormTemplate {
        ctx,
        title,
        action,
        owners: owner_options(&users, &form.owner),
        form,
        error,
    }
    .into_response())
}

/// List shops.
#[instrument(skip(state, _admin, ctx))]
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let shops = state.api().shops().await?;
    Ok(ShopsIndexTemplate {
        ctx,
        shops: shops.iter().map(ShopCard::from).collect(),
    })
}

/// New shop form.
#[instrument(skip(state, current, ctx))]
pub async fn new(
    State(state): State<AppState>,
    RequireAdmin(current): RequireAdmin,
    ctx: PageContext,
) -> Result<Response> {
    form_page(
        &state,
        &current.token,
        ctx,
        "New shop".to_string(),
        LIST.to_string(),
        ShopForm::default(),
        None,
    )
    .await
}

/// Create a shop.
#[instrument(skip(state, session, current, ctx, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(current): RequireAdmin,
    ctx: PageContext,
    Form(form): Form<ShopForm>,
) -> Result<Response> {
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(message) => {
            return form_page(
                &state,
                &current.token,
                ctx,
                "New shop".to_string(),
                LIST.to_string(),
                form,
                Some(message),
            )
            .await;
        }
    };
    match state.api().create_shop(&current.token, &draft).await {
        Ok(()) => Ok(done_to(&session, format!("Created {}", draft.name), LIST).await),
        Err(e) => Ok(fail_to(&session, e, "/admin/shops/new").await),
    }
}

/// Edit shop form.
#[instrument(skip(state, current, ctx))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAdmin(current): RequireAdmin,
    ctx: PageContext,
    Path(id): Path<String>,
) -> Result<Response> {
    let shop = state.api().shop(&ShopId::new(id)).await?;
    form_page(
        &state,
        &current.token,
        ctx,
        format!("Edit {}", shop.name),
        format!("{LIST}/{}", shop.id),
        ShopForm::from_shop(&shop),
        None,
    )
    .await
}

/// Update a shop.
#[instrument(skip(state, session, current, ctx, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(current): RequireAdmin,
    ctx: PageContext,
    Path(id): Path<String>,
    Form(form): Form<ShopForm>,
) -> Result<Response> {
    let id = ShopId::new(id);
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(message) => {
            return form_page(
                &state,
                &current.token,
                ctx,
                "Edit shop".to_string(),
                format!("{LIST}/{id}"),
                form,
                Some(message),
            )
            .await;
        }
    };
    match state.api().update_shop(&current.token, &id, &draft).await {
        Ok(()) => Ok(done_to(&session, format!("Saved {}", draft.name), LIST).await),
        Err(e) => Ok(fail_to(&session, e, &format!("{LIST}/{id}/edit")).await),
    }
}

/// Delete a shop.
#[instrument(skip(state, session, current))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(current): RequireAdmin,
    Path(id): Path<String>,
) -> Response {
    match state
        .api()
        .delete_shop(&current.token, &ShopId::new(id))
        .await
    {
        Ok(()) => done_to(&session, "Shop deleted", LIST).await,
        Err(e) => fail_to(&session, e, LIST).await,
    }
}
