use crate::error::AuthorizerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Subject access review as submitted by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Empty for anonymous requests
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub groups: Vec<String>,
    pub verb: String,
    pub resource: String,
}

impl ReviewRequest {
    pub fn new(user: &str, groups: &[&str], verb: &str, resource: &str) -> Self {
        Self {
            user: user.to_string(),
            groups: groups.iter().map(|g| g.to_string()).collect(),
            verb: verb.to_string(),
            resource: resource.to_string(),
        }
    }
}

/// Identity on whose behalf an action is requested
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub groups: Vec<String>,
}

impl UserInfo {
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for UserInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.groups.is_empty() {
            write!(f, "{:?}", self.name)
        } else {
            write!(f, "{:?} (groups: {})", self.name, self.groups.join(","))
        }
    }
}

/// Canonical "who wants to do what, to which resource, where" handed to an authorizer.
///
/// Built exactly once per review and never mutated afterwards; authorizers
/// only ever see it by shared reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorizationAttributes {
    pub user: UserInfo,
    pub verb: String,
    pub resource: String,
    pub namespace: String,
}

impl AuthorizationAttributes {
    /// Attributes for a subject access review. Group order is preserved.
    pub fn from_request(request: &ReviewRequest, namespace: &str) -> Self {
        Self {
            user: UserInfo {
                name: request.user.clone(),
                groups: request.groups.clone(),
            },
            verb: request.verb.clone(),
            resource: request.resource.clone(),
            namespace: namespace.to_string(),
        }
    }

    /// Attributes without a subject, used to ask who may perform an action.
    pub fn for_resource(request: &ResourceAccessReviewRequest, namespace: &str) -> Self {
        Self {
            user: UserInfo::default(),
            verb: request.verb.clone(),
            resource: request.resource.clone(),
            namespace: namespace.to_string(),
        }
    }
}

impl fmt::Display for AuthorizationAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} in {:?}",
            self.user, self.verb, self.resource, self.namespace
        )
    }
}

/// Decision for a subject access review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub namespace: String,
    pub allowed: bool,
    pub reason: String,
}

/// "Who can VERB RESOURCE here?"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAccessReviewRequest {
    pub verb: String,
    pub resource: String,
}

impl ResourceAccessReviewRequest {
    pub fn new(verb: &str, resource: &str) -> Self {
        Self {
            verb: verb.to_string(),
            resource: resource.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAccessReviewResponse {
    pub namespace: String,
    pub users: Vec<String>,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusReason {
    InternalError,
}

/// Status returned in place of a response when the authorizer itself failed.
///
/// Carries no decision fields.
#[derive(Debug, Clone, Serialize)]
pub struct FailureStatus {
    pub status: String,
    pub code: u16,
    pub reason: StatusReason,
    pub message: String,
    #[serde(skip)]
    cause: Arc<AuthorizerError>,
}

impl FailureStatus {
    pub const FAILURE: &'static str = "Failure";

    pub fn internal(err: AuthorizerError) -> Self {
        Self {
            status: Self::FAILURE.to_string(),
            code: 500,
            reason: StatusReason::InternalError,
            message: format!("Internal error occurred: {}", err),
            cause: Arc::new(err),
        }
    }

    /// The authorizer error this status was built from, unchanged.
    pub fn cause(&self) -> &AuthorizerError {
        &self.cause
    }
}

impl fmt::Display for FailureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.status, self.code, self.message)
    }
}

/// Value a pending subject access review resolves to
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum ReviewOutcome {
    Response(ReviewResponse),
    Failure(FailureStatus),
}

impl ReviewOutcome {
    pub fn response(&self) -> Option<&ReviewResponse> {
        match self {
            ReviewOutcome::Response(response) => Some(response),
            ReviewOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureStatus> {
        match self {
            ReviewOutcome::Response(_) => None,
            ReviewOutcome::Failure(status) => Some(status),
        }
    }
}

/// Value a pending resource access review resolves to
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum ResourceReviewOutcome {
    Response(ResourceAccessReviewResponse),
    Failure(FailureStatus),
}

impl ResourceReviewOutcome {
    pub fn response(&self) -> Option<&ResourceAccessReviewResponse> {
        match self {
            ResourceReviewOutcome::Response(response) => Some(response),
            ResourceReviewOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureStatus> {
        match self {
            ResourceReviewOutcome::Response(_) => None,
            ResourceReviewOutcome::Failure(status) => Some(status),
        }
    }
}
