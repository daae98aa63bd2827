use crate::{
    authorizer::Decision,
    error::AuthorizerError,
    models::AuthorizationAttributes,
    policy::repository::RuleRepository,
};
use std::sync::Arc;
use tracing::debug;

/// Evaluates attributes against the stored rules.
///
/// The first rule (oldest first) that applies in the namespace, permits the
/// verb and resource, and names the user or one of its groups allows the
/// request. Otherwise the request is denied.
pub struct RuleChecker {
    repository: Arc<dyn RuleRepository>,
}

impl RuleChecker {
    pub fn new(repository: Arc<dyn RuleRepository>) -> Self {
        Self { repository }
    }

    pub async fn check(
        &self,
        attributes: &AuthorizationAttributes,
    ) -> Result<Decision, AuthorizerError> {
        let rules = self
            .repository
            .read_rules(&attributes.namespace)
            .await?;

        debug!("Checking {} against {} rules", attributes, rules.len());

        let granting = rules.iter().find(|rule| {
            rule.permits(&attributes.verb, &attributes.resource)
                && rule.subject.matches(&attributes.user)
        });

        Ok(match granting {
            Some(rule) => {
                debug!("Granted by rule {}", rule);
                Decision::allow(format!("allowed by rule {} for {}", rule.id, rule.subject))
            }
            None => Decision::deny(denial_reason(attributes)),
        })
    }
}

fn denial_reason(attributes: &AuthorizationAttributes) -> String {
    let scope = if attributes.namespace.is_empty() {
        "cluster scope".to_string()
    } else {
        format!("namespace {:?}", attributes.namespace)
    };
    format!(
        "user {:?} cannot {} {} in {}",
        attributes.user.name, attributes.verb, attributes.resource, scope
    )
}
