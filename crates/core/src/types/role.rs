//! Account roles used for route gating.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Role attached to every marketplace account.
///
/// The backend stores roles either as integers (`0` user, `1` admin,
/// `2` seller) or as strings; both decode here. Unknown values fall back to
/// [`Role::User`] so an unexpected value never grants elevated access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular shopper.
    #[default]
    User,
    /// Shop owner who can manage their menu.
    Seller,
    /// Full back-office access.
    Admin,
}

impl Role {
    /// Whether this role may open the seller tools.
    #[must_use]
    pub const fn can_sell(self) -> bool {
        matches!(self, Self::Seller | Self::Admin)
    }

    /// Whether this role may open the admin console.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Integer code understood by the backend.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::User => 0,
            Self::Admin => 1,
            Self::Seller => 2,
        }
    }

    /// Map an integer code to a role.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Admin,
            2 => Self::Seller,
            _ => Self::User,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "Customer",
            Self::Seller => "Seller",
            Self::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Seller => f.write_str("seller"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "customer" | "0" => Ok(Self::User),
            "admin" | "1" => Ok(Self::Admin),
            "seller" | "vendor" | "2" => Ok(Self::Seller),
            other => Err(format!("invalid role: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawRole {
            Code(i64),
            Name(String),
        }

        Ok(match RawRole::deserialize(deserializer)? {
            RawRole::Code(code) => Self::from_code(code),
            RawRole::Name(name) => name.parse().unwrap_or_default(),
        })
    }
}
