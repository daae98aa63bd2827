use crate::{
    authorizer::Authorizer,
    context::RequestContext,
    error::ReviewError,
    models::{AuthorizationAttributes, ReviewOutcome, ReviewRequest},
    response::build_review_outcome,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info_span, warn, Instrument};

/// Result of a review that is still being decided.
///
/// Resolves exactly once, to exactly one consumer. Awaiting it directly waits
/// as long as the authorizer takes; use [`Pending::wait_timeout`] to bound it.
#[derive(Debug)]
pub struct Pending<T> {
    rx: oneshot::Receiver<T>,
}

pub type PendingReview = Pending<ReviewOutcome>;

impl<T> Pending<T> {
    pub(crate) fn new(rx: oneshot::Receiver<T>) -> Self {
        Self { rx }
    }

    /// Wait at most `limit` for the outcome.
    ///
    /// An elapsed bound is reported as [`ReviewError::Timeout`], never as a
    /// failure status or a denial.
    pub async fn wait_timeout(self, limit: Duration) -> Result<T, ReviewError> {
        tokio::time::timeout(limit, self)
            .await
            .map_err(|_| ReviewError::Timeout(limit))?
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T, ReviewError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.map_err(|_| ReviewError::Abandoned))
    }
}

/// Spawn `review` on the current runtime and hand back its pending result.
pub(crate) fn spawn_review<T, F>(review: F, span: tracing::Span) -> Result<Pending<T>, ReviewError>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    let runtime = Handle::try_current().map_err(|_| ReviewError::NoRuntime)?;
    let (tx, rx) = oneshot::channel();

    runtime.spawn(
        async move {
            let outcome = review.await;
            if tx.send(outcome).is_err() {
                debug!("Caller stopped waiting, review result dropped");
            }
        }
        .instrument(span),
    );

    Ok(Pending::new(rx))
}

/// Subject access review endpoint.
///
/// Every call to [`create`](Self::create) builds one set of attributes, asks
/// the authorizer exactly once and publishes one outcome.
#[derive(Clone)]
pub struct AccessReviewHandler {
    authorizer: Arc<dyn Authorizer>,
}

impl std::fmt::Debug for AccessReviewHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessReviewHandler")
            .field("authorizer", &"<dyn Authorizer>")
            .finish()
    }
}

impl AccessReviewHandler {
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self { authorizer }
    }

    /// Start reviewing `request` in the namespace carried by `ctx`.
    ///
    /// Authorizer errors and denials both arrive through the returned
    /// [`PendingReview`]. The only synchronous error is
    /// [`ReviewError::NoRuntime`].
    pub fn create(
        &self,
        ctx: &RequestContext,
        request: ReviewRequest,
    ) -> Result<PendingReview, ReviewError> {
        let namespace = ctx.namespace().to_string();
        let span = info_span!(
            "access_review",
            request_id = %ctx.request_id(),
            namespace = %namespace,
            verb = %request.verb,
            resource = %request.resource,
        );
        let authorizer = Arc::clone(&self.authorizer);

        spawn_review(
            async move { review(authorizer.as_ref(), &request, &namespace).await },
            span,
        )
    }
}

async fn review(
    authorizer: &dyn Authorizer,
    request: &ReviewRequest,
    namespace: &str,
) -> ReviewOutcome {
    let attributes = AuthorizationAttributes::from_request(request, namespace);
    let result = authorizer.authorize(&attributes).await;

    match &result {
        Ok(decision) if decision.allowed => {
            debug!(user = %attributes.user, reason = %decision.reason, "Access allowed")
        }
        Ok(decision) => {
            debug!(user = %attributes.user, reason = %decision.reason, "Access denied")
        }
        Err(err) => warn!(error = %err, "Authorizer failed to produce a decision"),
    }

    build_review_outcome(namespace, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorizer::{AllowedSubjects, Decision};
    use crate::error::AuthorizerError;
    use crate::models::ReviewResponse;
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        pub Authz {}

        #[async_trait]
        impl Authorizer for Authz {
            async fn authorize(
                &self,
                attributes: &AuthorizationAttributes,
            ) -> Result<Decision, AuthorizerError>;

            async fn get_allowed_subjects(
                &self,
                attributes: &AuthorizationAttributes,
            ) -> Result<AllowedSubjects, AuthorizerError>;
        }
    }

    const LIMIT: Duration = Duration::from_millis(100);

    #[tokio::test]
    async fn test_authorizer_called_once_with_request_attributes() {
        let request = ReviewRequest::new("foo", &["first", "second"], "get", "pods");
        let expected = AuthorizationAttributes::from_request(&request, "unittest");

        let mut authz = MockAuthz::new();
        authz
            .expect_authorize()
            .withf(move |attributes| *attributes == expected)
            .times(1)
            .returning(|_| Ok(Decision::allow("bound to admin")));
        authz.expect_get_allowed_subjects().never();

        let handler = AccessReviewHandler::new(Arc::new(authz));
        let ctx = RequestContext::new().with_namespace("unittest");
        let outcome = handler
            .create(&ctx, request)
            .unwrap()
            .wait_timeout(LIMIT)
            .await
            .unwrap();

        assert_eq!(
            outcome.response(),
            Some(&ReviewResponse {
                namespace: "unittest".to_string(),
                allowed: true,
                reason: "bound to admin".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_authorizer_error_is_not_a_denial() {
        let mut authz = MockAuthz::new();
        authz
            .expect_authorize()
            .times(1)
            .returning(|_| Err(AuthorizerError::Unavailable("policy cache cold".into())));

        let handler = AccessReviewHandler::new(Arc::new(authz));
        let ctx = RequestContext::new().with_namespace("unittest");
        let outcome = handler
            .create(&ctx, ReviewRequest::new("foo", &[], "get", "pods"))
            .unwrap()
            .wait_timeout(LIMIT)
            .await
            .unwrap();

        assert!(outcome.response().is_none());
        assert!(matches!(
            outcome.failure().map(|s| s.cause()),
            Some(AuthorizerError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_namespace_is_empty() {
        let mut authz = MockAuthz::new();
        authz
            .expect_authorize()
            .withf(|attributes| attributes.namespace.is_empty())
            .times(1)
            .returning(|_| Ok(Decision::deny("")));

        let handler = AccessReviewHandler::new(Arc::new(authz));
        let outcome = handler
            .create(&RequestContext::new(), ReviewRequest::new("", &[], "", ""))
            .unwrap()
            .await
            .unwrap();

        assert_eq!(outcome.response().map(|r| r.namespace.as_str()), Some(""));
    }

    #[test]
    fn test_create_without_runtime_fails_synchronously() {
        let handler = AccessReviewHandler::new(Arc::new(MockAuthz::new()));
        let result = handler.create(
            &RequestContext::new().with_namespace("unittest"),
            ReviewRequest::new("foo", &[], "get", "pods"),
        );
        assert!(matches!(result, Err(ReviewError::NoRuntime)));
    }

    struct SlowAuthorizer;

    #[async_trait]
    impl Authorizer for SlowAuthorizer {
        async fn authorize(
            &self,
            _attributes: &AuthorizationAttributes,
        ) -> Result<Decision, AuthorizerError> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(Decision::allow("late"))
        }

        async fn get_allowed_subjects(
            &self,
            _attributes: &AuthorizationAttributes,
        ) -> Result<AllowedSubjects, AuthorizerError> {
            Ok(AllowedSubjects::default())
        }
    }

    #[tokio::test]
    async fn test_caller_timeout_is_distinct() {
        let handler = AccessReviewHandler::new(Arc::new(SlowAuthorizer));
        let result = handler
            .create(
                &RequestContext::new().with_namespace("unittest"),
                ReviewRequest::new("foo", &[], "get", "pods"),
            )
            .unwrap()
            .wait_timeout(Duration::from_millis(20))
            .await;

        assert!(matches!(result, Err(ReviewError::Timeout(_))));
    }

    struct PanickingAuthorizer;

    #[async_trait]
    impl Authorizer for PanickingAuthorizer {
        async fn authorize(
            &self,
            _attributes: &AuthorizationAttributes,
        ) -> Result<Decision, AuthorizerError> {
            panic!("authorizer bug")
        }

        async fn get_allowed_subjects(
            &self,
            _attributes: &AuthorizationAttributes,
        ) -> Result<AllowedSubjects, AuthorizerError> {
            panic!("authorizer bug")
        }
    }

    #[tokio::test]
    async fn test_abandoned_review() {
        let handler = AccessReviewHandler::new(Arc::new(PanickingAuthorizer));
        let result = handler
            .create(
                &RequestContext::new().with_namespace("unittest"),
                ReviewRequest::new("foo", &[], "get", "pods"),
            )
            .unwrap()
            .wait_timeout(LIMIT)
            .await;

        assert!(matches!(result, Err(ReviewError::Abandoned)));
    }
}
