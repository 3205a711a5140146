//! Command implementations.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod notifications;
pub mod orders;

use bazaar_storefront::api::{ApiClient, ApiError};
use bazaar_storefront::config::{ApiConfig, ConfigError};
use bazaar_storefront::models::UserToken;

use crate::error::CliError;
use crate::state::{CliState, StateFile};

/// Backend client plus the persisted state a command works on.
pub struct Context {
    api: ApiClient,
    file: StateFile,
    pub state: CliState,
}

impl Context {
    /// Build from `BAZAAR_API_URL` and `BAZAAR_STATE_FILE`.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    pub fn from_env() -> Result<Self, CliError> {
        let _ = dotenvy::dotenv();

        let api_url = std::env::var("BAZAAR_API_URL")
            .map_err(|_| ConfigError::MissingEnvVar("BAZAAR_API_URL".to_string()))?;
        Self::new(&api_url, StateFile::from_env())
    }

    /// Build against an explicit backend and state file.
    pub fn new(api_url: &str, file: StateFile) -> Result<Self, CliError> {
        let api = ApiClient::new(&ApiConfig::new(api_url)?)?;
        let state = file.load()?;
        tracing::debug!(path = %file.path().display(), "Loaded state file");
        Ok(Self { api, file, state })
    }

    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Persist the current state.
    pub fn save(&self) -> Result<(), CliError> {
        self.file.save(&self.state)
    }

    /// The stored token, or `NotSignedIn`.
    pub fn token(&self) -> Result<UserToken, CliError> {
        self.state.token().ok_or(CliError::NotSignedIn)
    }

    /// Pass a signed-in call's result through.
    ///
    /// A rejected token is forgotten so the next command runs as a guest.
    pub fn check<T>(&mut self, result: Result<T, ApiError>) -> Result<T, CliError> {
        if matches!(result, Err(ApiError::Unauthorized)) {
            tracing::warn!("Stored sign-in was rejected, signing out");
            self.state.sign_out();
            self.save()?;
        }
        result.map_err(CliError::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use super::*;
    use wiremock::MockServer;

    /// A context against `server` with a fresh temp state file.
    pub fn context(server: &MockServer) -> Context {
        let file = StateFile::new(
            std::env::temp_dir().join(format!("bz-cmd-{}.json", uuid::Uuid::new_v4())),
        );
        Context::new(&server.uri(), file).unwrap()
    }

    /// Reload what was saved to disk.
    pub fn reload(ctx: &Context) -> CliState {
        ctx.file.load().unwrap()
    }
}
