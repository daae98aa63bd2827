use std::time::Duration;
use thiserror::Error;

/// Failure of an [`Authorizer`](crate::authorizer::Authorizer) to produce a decision.
///
/// A denial is never an `AuthorizerError`; it is a successful
/// [`Decision`](crate::authorizer::Decision) with `allowed == false`.
#[derive(Error, Debug)]
pub enum AuthorizerError {
    #[error("Authorizer unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid policy state: {0}")]
    InvalidPolicy(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Errors raised by the review handlers themselves, never by the authorizer.
#[derive(Error, Debug)]
pub enum ReviewError {
    /// `create` was called outside of a Tokio runtime.
    #[error("No async runtime available to run the review")]
    NoRuntime,

    /// The caller's own bound elapsed before a result was published.
    #[error("Review result not delivered within {0:?}")]
    Timeout(Duration),

    /// The review task ended without publishing a result.
    #[error("Review task ended without delivering a result")]
    Abandoned,
}

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Failed to read policy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse policy document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid rule: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// Result of rule storage and authorizer operations
pub type Result<T, E = AuthorizerError> = std::result::Result<T, E>;

impl From<PolicyError> for AuthorizerError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Validation(msg) => AuthorizerError::InvalidPolicy(msg),
            other => AuthorizerError::Internal(anyhow::Error::new(other)),
        }
    }
}
