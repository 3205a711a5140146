//! Shop menu editor, open to sellers for their own shops and to admins.

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

use bazaar_core::{MenuItemDraft, MenuItemId, Price, Shop, ShopId};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireSeller};
use crate::models::{CurrentUser, ShopCard};
use crate::routes::shops::MenuItemView;
use crate::routes::{done_to, fail_to, invalid_to, non_blank};
use crate::state::AppState;

fn menu_url(shop: &str) -> String {
    format!("/admin/shops/{shop}/menu")
}

/// Admins manage every shop; sellers only the shops they own.
fn can_manage(current: &CurrentUser, shop: &Shop) -> bool {
    current.role().is_admin() || shop.owner.as_ref() == Some(&current.user.id)
}

/// Load a shop the current user may edit.
async fn managed_shop(state: &AppState, current: &CurrentUser, id: &str) -> Result<Shop> {
    let shop = state.api().shop(&ShopId::new(id)).await?;
    if !can_manage(current, &shop) {
        return Err(AppError::Forbidden(format!("shop {id}")));
    }
    Ok(shop)
}

/// Menu item form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuItemForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub image: String,
    /// Checkbox; present when ticked.
    pub available: Option<String>,
    /// Shop the item belongs to, for ownership checks and the redirect.
    #[serde(default)]
    pub shop: String,
}

impl MenuItemForm {
    fn to_draft(&self) -> std::result::Result<MenuItemDraft, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Item name is required".to_string());
        }
        let price = Price::parse_input(&self.price).ok_or("Enter a valid price")?;
        Ok(MenuItemDraft {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price,
            image: non_blank(Some(&self.image)),
            available: self.available.is_some(),
        })
    }
}

/// Menu editor template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/menu.html")]
pub struct MenuTemplate {
    pub ctx: PageContext,
    pub shop: ShopCard,
    pub items: Vec<MenuItemView>,
}

/// Display a shop's menu editor.
#[instrument(skip(state, current, ctx))]
pub async fn index(
    State(state): State<AppState>,
    RequireSeller(current): RequireSeller,
    ctx: PageContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let shop = managed_shop(&state, &current, &id).await?;
    let items = state.api().menu(&shop.id).await?;
    Ok(MenuTemplate {
        ctx,
        shop: ShopCard::from(&shop),
        items: items.iter().map(MenuItemView::from).collect(),
    })
}

/// Add a menu item.
#[instrument(skip(state, session, current, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(current): RequireSeller,
    Path(id): Path<String>,
    Form(form): Form<MenuItemForm>,
) -> Result<Response> {
    let shop = managed_shop(&state, &current, &id).await?;
    let target = menu_url(shop.id.as_str());
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(message) => return Ok(invalid_to(&session, message, &target).await),
    };
    match state.api().add_menu_item(&current.token, &shop.id, &draft).await {
        Ok(()) => Ok(done_to(&session, format!("Added {}", draft.name), &target).await),
        Err(e) => Ok(fail_to(&session, e, &target).await),
    }
}

/// Update a menu item.
#[instrument(skip(state, session, current, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(current): RequireSeller,
    Path(id): Path<String>,
    Form(form): Form<MenuItemForm>,
) -> Result<Response> {
    let shop = managed_shop(&state, &current, &form.shop).await?;
    let target = menu_url(shop.id.as_str());
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(message) => return Ok(invalid_to(&session, message, &target).await),
    };
    match state
        .api()
        .update_menu_item(&current.token, &MenuItemId::new(id), &draft)
        .await
    {
        Ok(()) => Ok(done_to(&session, format!("Saved {}", draft.name), &target).await),
        Err(e) => Ok(fail_to(&session, e, &target).await),
    }
}

/// Shop reference sent with a delete.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub shop: String,
}

/// Delete a menu item.
#[instrument(skip(state, session, current))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(current): RequireSeller,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Result<Response> {
    let shop = managed_shop(&state, &current, &form.shop).await?;
    let target = menu_url(shop.id.as_str());
    match state
        .api()
        .delete_menu_item(&current.token, &MenuItemId::new(id))
        .await
    {
        Ok(()) => Ok(done_to(&session, "Menu item deleted", &target).await),
        Err(e) => Ok(fail_to(&session, e, &target).await),
    }
}
