//! Persistent client state.
//!
//! The CLI keeps the same three values the web session does, in a JSON file:
//! the backend token (`user-token`), the signed-in account (`user`) and the
//! guest cart (`local-cart`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use bazaar_core::{LocalCart, User};
use bazaar_storefront::models::UserToken;

use crate::error::CliError;

/// Default state file, relative to the working directory.
pub const DEFAULT_STATE_FILE: &str = ".bazaar-state.json";

/// Everything the CLI remembers between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliState {
    #[serde(rename = "user-token", default, skip_serializing_if = "Option::is_none")]
    pub user_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(rename = "local-cart", default)]
    pub local_cart: LocalCart,
}

impl CliState {
    /// The stored token, when signed in.
    #[must_use]
    pub fn token(&self) -> Option<UserToken> {
        self.user_token.as_deref().map(UserToken::new)
    }

    /// Forget the token and account; the guest cart stays.
    pub fn sign_out(&mut self) {
        self.user_token = None;
        self.user = None;
    }
}

/// The state file on disk.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// Use an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path from `BAZAAR_STATE_FILE`, or the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("BAZAAR_STATE_FILE")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string()),
        )
    }

    /// Where the state lives.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state; a missing file is an empty state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<CliState, CliError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| CliError::StateFormat {
                path: self.path.clone(),
                source: e,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CliState::default()),
            Err(e) => Err(CliError::StateIo {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    /// Write the state, replacing the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, state: &CliState) -> Result<(), CliError> {
        let text = serde_json::to_string_pretty(state).map_err(|e| CliError::StateFormat {
            path: self.path.clone(),
            source: e,
        })?;
        std::fs::write(&self.path, text).map_err(|e| CliError::StateIo {
            path: self.path.clone(),
            source: e,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bazaar_core::{CartItem, Price, ProductId};

    fn temp_file() -> StateFile {
        StateFile::new(std::env::temp_dir().join(format!("bz-state-{}.json", uuid::Uuid::new_v4())))
    }

    #[test]
    fn test_missing_file_is_empty_state() {
        let file = temp_file();
        assert_eq!(file.load().unwrap(), CliState::default());
    }

    #[test]
    fn test_state_survives_a_save() {
        let file = temp_file();
        let mut state = CliState {
            user_token: Some("tok".to_string()),
            ..CliState::default()
        };
        state.local_cart.add(CartItem {
            product_id: ProductId::new("p1"),
            name: "Tee".to_string(),
            image: None,
            size: "M".to_string(),
            color: String::new(),
            quantity: 2,
            price: Price::from_cents(999),
        });
        file.save(&state).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        assert!(text.contains("\"user-token\""));
        assert!(text.contains("\"local-cart\""));
        assert_eq!(file.load().unwrap(), state);
        std::fs::remove_file(file.path()).unwrap();
    }

    #[test]
    fn test_sign_out_keeps_guest_cart() {
        let mut state = CliState {
            user_token: Some("tok".to_string()),
            ..CliState::default()
        };
        state.sign_out();
        assert!(state.token().is_none());
        assert!(state.user.is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let file = temp_file();
        std::fs::write(file.path(), "{not json").unwrap();
        assert!(matches!(file.load(), Err(CliError::StateFormat { .. })));
        std::fs::remove_file(file.path()).unwrap();
    }
}
