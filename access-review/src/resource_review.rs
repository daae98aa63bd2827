use crate::{
    authorizer::Authorizer,
    context::RequestContext,
    error::ReviewError,
    handler::{spawn_review, Pending},
    models::{AuthorizationAttributes, ResourceAccessReviewRequest, ResourceReviewOutcome},
    response::build_resource_outcome,
};
use std::sync::Arc;
use tracing::{debug, info_span, warn};

pub type PendingResourceReview = Pending<ResourceReviewOutcome>;

/// Resource access review endpoint: who may perform an action in a namespace.
#[derive(Clone)]
pub struct ResourceAccessReviewHandler {
    authorizer: Arc<dyn Authorizer>,
}

impl std::fmt::Debug for ResourceAccessReviewHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceAccessReviewHandler")
            .field("authorizer", &"<dyn Authorizer>")
            .finish()
    }
}

impl ResourceAccessReviewHandler {
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self { authorizer }
    }

    pub fn create(
        &self,
        ctx: &RequestContext,
        request: ResourceAccessReviewRequest,
    ) -> Result<PendingResourceReview, ReviewError> {
        let namespace = ctx.namespace().to_string();
        let span = info_span!(
            "resource_access_review",
            request_id = %ctx.request_id(),
            namespace = %namespace,
            verb = %request.verb,
            resource = %request.resource,
        );
        let authorizer = Arc::clone(&self.authorizer);

        spawn_review(
            async move {
                let attributes = AuthorizationAttributes::for_resource(&request, &namespace);
                let result = authorizer.get_allowed_subjects(&attributes).await;

                match &result {
                    Ok(subjects) => debug!(
                        users = subjects.users.len(),
                        groups = subjects.groups.len(),
                        "Resolved allowed subjects"
                    ),
                    Err(err) => warn!(error = %err, "Authorizer failed to list allowed subjects"),
                }

                build_resource_outcome(&namespace, result)
            },
            span,
        )
    }
}
