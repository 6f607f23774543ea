//! CLI errors.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors reported by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// The gateway client failed.
    #[error(transparent)]
    Paygate(#[from] paygate::PaygateError),

    /// A file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Output could not be rendered as JSON.
    #[error("cannot render output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code: 2 for business errors from the gateway, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Paygate(err) if err.api_error().is_some() => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use paygate::{ApiError, PaygateError};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_exit_codes() {
        let api = ApiError::from_body(404, &json!({"object": "error", "code": "not_found"}));
        assert_eq!(CliError::from(PaygateError::from(api)).exit_code(), 2);
        assert_eq!(CliError::from(PaygateError::Config("missing key".to_owned())).exit_code(), 1);
    }
}
