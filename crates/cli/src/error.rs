//! CLI error type.

use std::path::PathBuf;

use thiserror::Error;

use bazaar_core::CartError;
use bazaar_storefront::api::ApiError;
use bazaar_storefront::config::ConfigError;

/// Errors that can end a `bz` command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Backend configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Backend call failed.
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    /// The state file could not be read or written.
    #[error("Cannot access {}: {source}", path.display())]
    StateIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The state file is not valid JSON.
    #[error("Cannot parse {}: {source}", path.display())]
    StateFormat {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The command needs a signed-in user.
    #[error("Not signed in. Run `bz login -e <email> -p <password>` first.")]
    NotSignedIn,

    /// Guest cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Bad input on the command line.
    #[error("{0}")]
    Invalid(String),
}
