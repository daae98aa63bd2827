use crate::{error::AuthorizerError, models::AuthorizationAttributes};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Verdict returned by an authorizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: String,
}

impl Decision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Users and groups permitted to perform an action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedSubjects {
    pub users: Vec<String>,
    pub groups: Vec<String>,
}

/// Pluggable decision engine consulted by the review handlers.
///
/// Implementations are shared between concurrent reviews and must not keep
/// per-request state; attributes are only ever lent to them.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Decide whether the subject in `attributes` may perform the action.
    ///
    /// A denial is `Ok` with `allowed == false`. `Err` means no decision
    /// could be produced.
    async fn authorize(
        &self,
        attributes: &AuthorizationAttributes,
    ) -> Result<Decision, AuthorizerError>;

    /// List the users and groups that may perform the verb on the resource
    /// in the namespace of `attributes`. The subject in `attributes` is ignored.
    async fn get_allowed_subjects(
        &self,
        attributes: &AuthorizationAttributes,
    ) -> Result<AllowedSubjects, AuthorizerError>;
}
