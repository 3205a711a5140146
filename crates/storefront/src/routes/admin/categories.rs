//! Admin category tree management.
//!
//! The backend replaces a category's whole subcategory tree on update, so
//! every edit loads the current category, changes the draft and PUTs it back.

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

use bazaar_core::{Category, CategoryDraft, CategoryId};

use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::models::CurrentUser;
use crate::routes::{done_to, fail_to, invalid_to};
use crate::state::AppState;

const LIST: &str = "/admin/categories";

/// Single-name form (create, rename, add subcategory).
#[derive(Debug, Deserialize)]
pub struct NameForm {
    #[serde(default)]
    pub name: String,
}

/// Add-third-category form.
#[derive(Debug, Deserialize)]
pub struct ThirdForm {
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub name: String,
}

/// Category tree template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/categories.html")]
pub struct CategoriesTemplate {
    pub ctx: PageContext,
    pub categories: Vec<Category>,
}

/// Apply one change to a category draft.
fn apply_change(
    category: &Category,
    change: impl FnOnce(&mut CategoryDraft) -> std::result::Result<(), String>,
) -> std::result::Result<CategoryDraft, String> {
    let mut draft = CategoryDraft::from(category);
    change(&mut draft)?;
    Ok(draft)
}

/// Load a category, change it and save the full draft.
async fn edit_category(
    state: &AppState,
    session: &Session,
    current: &CurrentUser,
    id: String,
    change: impl FnOnce(&mut CategoryDraft) -> std::result::Result<(), String>,
    done: &str,
) -> Response {
    let id = CategoryId::new(id);
    let category = match state.api().category(&id).await {
        Ok(category) => category,
        Err(e) => return fail_to(session, e, LIST).await,
    };
    let draft = match apply_change(&category, change) {
        Ok(draft) => draft,
        Err(message) => return invalid_to(session, message, LIST).await,
    };
    match state
        .api()
        .update_category(&current.token, &id, &draft)
        .await
    {
        Ok(()) => done_to(session, done, LIST).await,
        Err(e) => fail_to(session, e, LIST).await,
    }
}

/// Display the category tree.
#[instrument(skip(state, _admin, ctx))]
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let categories = state.api().categories().await?;
    Ok(CategoriesTemplate { ctx, categories })
}

/// Create a top-level category.
#[instrument(skip(state, session, current))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(current): RequireAdmin,
    Form(form): Form<NameForm>,
) -> Response {
    let draft = CategoryDraft::new(form.name);
    if draft.name.is_empty() {
        return invalid_to(&session, "Category name is required", LIST).await;
    }
    match state.api().create_category(&current.token, &draft).await {
        Ok(()) => done_to(&session, format!("Created {}", draft.name), LIST).await,
        Err(e) => fail_to(&session, e, LIST).await,
    }
}

/// Rename a category.
#[instrument(skip(state, session, current))]
pub async fn rename(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(current): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<NameForm>,
) -> Response {
    let name = form.name.trim().to_string();
    edit_category(
        &state,
        &session,
        &current,
        id,
        |draft| {
            if name.is_empty() {
                return Err("Category name is required".to_string());
            }
            draft.name = name;
            Ok(())
        },
        "Category renamed",
    )
    .await
}

/// Delete a category.
#[instrument(skip(state, session, current))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(current): RequireAdmin,
    Path(id): Path<String>,
) -> Response {
    match state
        .api()
        .delete_category(&current.token, &CategoryId::new(id))
        .await
    {
        Ok(()) => done_to(&session, "Category deleted", LIST).await,
        Err(e) => fail_to(&session, e, LIST).await,
    }
}

/// Add a subcategory.
#[instrument(skip(state, session, current))]
pub async fn add_subcategory(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(current): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<NameForm>,
) -> Response {
    edit_category(
        &state,
        &session,
        &current,
        id,
        |draft| {
            if draft.add_subcategory(&form.name) {
                Ok(())
            } else {
                Err("Subcategory name is blank or already exists".to_string())
            }
        },
        "Subcategory added",
    )
    .await
}

/// Add a third-level category under a subcategory.
#[instrument(skip(state, session, current))]
pub async fn add_third(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(current): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<ThirdForm>,
) -> Response {
    edit_category(
        &state,
        &session,
        &current,
        id,
        |draft| {
            if draft.add_third(&form.subcategory, &form.name) {
                Ok(())
            } else {
                Err("Pick a subcategory and enter a new name".to_string())
            }
        },
        "Category added",
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn clothing() -> Category {
        serde_json::from_str(
            r#"{"_id":"c1","name":"Clothing","subcategories":[
                {"name":"Men","thirdCategories":["Shirts"]}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_apply_change_keeps_existing_tree() {
        let draft = apply_change(&clothing(), |d| {
            d.add_subcategory("Women");
            Ok(())
        })
        .unwrap();
        assert_eq!(draft.name, "Clothing");
        assert_eq!(draft.subcategories.len(), 2);
        assert_eq!(draft.subcategories[0].third_categories, vec!["Shirts".to_string()]);
    }

    #[test]
    fn test_apply_change_reports_rejection() {
        let result = apply_change(&clothing(), |d| {
            if d.add_third("Kids", "Toys") {
                Ok(())
            } else {
                Err("nope".to_string())
            }
        });
        assert_eq!(result, Err("nope".to_string()));
    }
}
