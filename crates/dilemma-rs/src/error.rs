//! Error type shared by every layer of the crate.
//!
//! None of these are retried internally. Each one surfaces to the caller
//! (ultimately the tournament engine), which decides whether a failure aborts
//! the iteration or forfeits a single match.

use crate::catalog::ProviderFamily;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The prompt template is malformed or names an unsupported placeholder.
    #[error("template error: {reason}")]
    Template { reason: String },

    /// The template references a numeric placeholder whose value was not
    /// configured for this player.
    #[error("config error: template references `{{{placeholder}}}` but no value is configured")]
    Config { placeholder: String },

    /// No provider family claims this model id.
    #[error("unknown model `{0}`: not registered in any provider catalog")]
    UnknownModel(String),

    /// Network or vendor failure for a single call.
    #[error("{vendor} provider error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Provider {
        vendor: ProviderFamily,
        status: Option<u16>,
        message: String,
    },

    /// The model answered with something other than a single move code.
    #[error("invalid move: {0:?}")]
    InvalidMove(String),

    /// A model catalog could not be loaded or parsed.
    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl Error {
    pub(crate) fn template(reason: impl Into<String>) -> Self {
        Error::Template {
            reason: reason.into(),
        }
    }

    pub(crate) fn provider(
        vendor: ProviderFamily,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Error::Provider {
            vendor,
            status,
            message: message.into(),
        }
    }
}
