//! Admin user management.

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

use bazaar_core::{Role, User, UserId};

use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::routes::{done_to, fail_to, invalid_to};
use crate::state::AppState;

const LIST: &str = "/admin/users";

/// Roles offered in the role picker.
const ROLES: [Role; 3] = [Role::User, Role::Seller, Role::Admin];

/// Role option in a user row.
#[derive(Debug, Clone)]
pub struct RoleOption {
    pub value: String,
    pub label: &'static str,
    pub selected: bool,
}

/// User row in the admin list.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: &'static str,
    pub roles: Vec<RoleOption>,
    /// The signed-in admin's own row; no role or delete controls.
    pub is_self: bool,
}

impl UserRow {
    fn new(user: &User, self_id: &UserId) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.display_name().to_string(),
            email: user.email.clone(),
            role: user.role.label(),
            roles: ROLES
                .iter()
                .map(|&r| RoleOption {
                    value: r.to_string(),
                    label: r.label(),
                    selected: r == user.role,
                })
                .collect(),
            is_self: &user.id == self_id,
        }
    }
}

/// Role change form.
#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: String,
}

/// Admin user list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
    pub ctx: PageContext,
    pub users: Vec<UserRow>,
}

/// Check a role change before sending it.
///
/// An admin cannot demote themselves.
fn check_role_change(self_id: &UserId, target: &UserId, role: &str) -> std::result::Result<Role, String> {
    let role: Role = role.parse()?;
    if self_id == target && role != Role::Admin {
        return Err("You cannot remove your own admin role".to_string());
    }
    Ok(role)
}

/// List accounts.
#[instrument(skip(state, current, ctx))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(current): RequireAdmin,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let users = state.api().list_users(&current.token).await?;
    Ok(UsersTemplate {
        ctx,
        users: users
            .iter()
            .map(|u| UserRow::new(u, &current.user.id))
            .collect(),
    })
}

/// Change an account's role.
#[instrument(skip(state, session, current))]
pub async fn change_role(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(current): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<RoleForm>,
) -> Response {
    let target = UserId::new(id);
    let role = match check_role_change(&current.user.id, &target, &form.role) {
        Ok(role) => role,
        Err(message) => return invalid_to(&session, message, LIST).await,
    };
    match state
        .api()
        .set_user_role(&current.token, &target, role)
        .await
    {
        Ok(()) => {
            tracing::info!(user_id = %target, %role, "Role changed");
            done_to(&session, format!("Role set to {}", role.label()), LIST).await
        }
        Err(e) => fail_to(&session, e, LIST).await,
    }
}

/// Delete an account.
#[instrument(skip(state, session, current))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(current): RequireAdmin,
    Path(id): Path<String>,
) -> Response {
    let target = UserId::new(id);
    if target == current.user.id {
        return invalid_to(&session, "You cannot delete your own account", LIST).await;
    }
    match state.api().delete_user(&current.token, &target).await {
        Ok(()) => done_to(&session, "User deleted", LIST).await,
        Err(e) => fail_to(&session, e, LIST).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_cannot_demote_self() {
        let me = UserId::from("u1");
        assert_eq!(
            check_role_change(&me, &me, "seller"),
            Err("You cannot remove your own admin role".to_string())
        );
        assert_eq!(check_role_change(&me, &me, "admin"), Ok(Role::Admin));
        assert_eq!(
            check_role_change(&me, &UserId::from("u2"), "seller"),
            Ok(Role::Seller)
        );
        assert!(check_role_change(&me, &UserId::from("u2"), "wizard").is_err());
    }

    #[test]
    fn test_user_row_marks_self_and_role() {
        let user: User = serde_json::from_str(
            r#"{"_id":"u1","name":"Asha","email":"a@example.com","role":"seller"}"#,
        )
        .unwrap();
        let row = UserRow::new(&user, &UserId::from("u1"));
        assert!(row.is_self);
        assert_eq!(row.role, "Seller");
        assert!(row.roles[1].selected);
        assert_eq!(row.roles[1].value, "seller");
    }
}
