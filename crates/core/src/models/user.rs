//! Account records.

use serde::{Deserialize, Serialize};

use crate::types::{Role, UserId};

/// A marketplace account as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, alias = "profilePicture", skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl User {
    /// Name to greet the user with; falls back to the email's local part.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if !self.name.trim().is_empty() {
            return self.name.trim();
        }
        self.email.split('@').next().unwrap_or("there")
    }

    /// Initial shown in the avatar bubble when no picture is set.
    #[must_use]
    pub fn initial(&self) -> char {
        self.display_name()
            .chars()
            .next()
            .map_or('?', |c| c.to_ascii_uppercase())
    }
}

/// Token and account returned by login and registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,
    #[serde(alias = "data")]
    pub user: User,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_accepts_id_or_underscore_id() {
        let a: User = serde_json::from_str(r#"{"_id":"u1","name":"A","email":"a@x.io"}"#).unwrap();
        let b: User = serde_json::from_str(r#"{"id":"u1","name":"A","email":"a@x.io"}"#).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.role, Role::User);
    }

    #[test]
    fn test_user_serializes_underscore_id() {
        let user: User = serde_json::from_str(r#"{"id":7,"email":"a@x.io","role":1}"#).unwrap();
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["_id"], "7");
        assert_eq!(json["role"], "admin");
    }

    #[test]
    fn test_display_name_fallback() {
        let user: User = serde_json::from_str(r#"{"_id":"u","name":"  ","email":"sam@x.io"}"#).unwrap();
        assert_eq!(user.display_name(), "sam");
        assert_eq!(user.initial(), 'S');
    }

    #[test]
    fn test_auth_session_aliases() {
        let session: AuthSession = serde_json::from_str(
            r#"{"accessToken":"t0k","data":{"_id":"u1","email":"a@x.io","role":"seller"}}"#,
        )
        .unwrap();
        assert_eq!(session.token, "t0k");
        assert_eq!(session.user.role, Role::Seller);
    }
}
