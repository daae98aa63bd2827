//! Translation of authorizer results into review outcomes.
//!
//! Pure functions: the namespace echoed in a response is always the one the
//! attributes were built with, and decisions are copied without change.

use crate::{
    authorizer::{AllowedSubjects, Decision},
    error::AuthorizerError,
    models::{
        FailureStatus, ResourceAccessReviewResponse, ResourceReviewOutcome, ReviewOutcome,
        ReviewResponse,
    },
};

/// Build the outcome of a subject access review.
///
/// Any error wins over a decision; a denial is a successful response.
pub fn build_review_outcome(
    namespace: &str,
    result: Result<Decision, AuthorizerError>,
) -> ReviewOutcome {
    match result {
        Ok(decision) => ReviewOutcome::Response(ReviewResponse {
            namespace: namespace.to_string(),
            allowed: decision.allowed,
            reason: decision.reason,
        }),
        Err(err) => ReviewOutcome::Failure(FailureStatus::internal(err)),
    }
}

/// Build the outcome of a resource access review.
pub fn build_resource_outcome(
    namespace: &str,
    result: Result<AllowedSubjects, AuthorizerError>,
) -> ResourceReviewOutcome {
    match result {
        Ok(subjects) => ResourceReviewOutcome::Response(ResourceAccessReviewResponse {
            namespace: namespace.to_string(),
            users: subjects.users,
            groups: subjects.groups,
        }),
        Err(err) => ResourceReviewOutcome::Failure(FailureStatus::internal(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_is_a_response() {
        let outcome = build_review_outcome("unittest", Ok(Decision::deny("because reasons")));

        assert_eq!(
            outcome.response(),
            Some(&ReviewResponse {
                namespace: "unittest".to_string(),
                allowed: false,
                reason: "because reasons".to_string(),
            })
        );
        assert!(outcome.failure().is_none());
    }

    #[test]
    fn test_allow_passes_through() {
        let outcome = build_review_outcome("ns", Ok(Decision::allow("")));
        let response = outcome.response().unwrap();
        assert!(response.allowed);
        assert_eq!(response.reason, "");
        assert_eq!(response.namespace, "ns");
    }

    #[test]
    fn test_error_becomes_failure_status() {
        let outcome = build_review_outcome(
            "unittest",
            Err(AuthorizerError::Unavailable("some-random-failure".into())),
        );

        assert!(outcome.response().is_none());
        let status = outcome.failure().unwrap();
        assert_eq!(status.code, 500);
        assert!(status.message.contains("some-random-failure"));
    }

    #[test]
    fn test_resource_outcome() {
        let outcome = build_resource_outcome(
            "team-a",
            Ok(AllowedSubjects {
                users: vec!["alice".into()],
                groups: vec!["admins".into()],
            }),
        );
        let response = outcome.response().unwrap();
        assert_eq!(response.namespace, "team-a");
        assert_eq!(response.users, vec!["alice"]);
        assert_eq!(response.groups, vec!["admins"]);

        let failed = build_resource_outcome(
            "team-a",
            Err(AuthorizerError::Repository("gone".into())),
        );
        assert!(failed.failure().is_some());
    }
}
