use crate::{
    authorizer::{AllowedSubjects, Authorizer, Decision},
    error::{AuthorizerError, PolicyError, Result},
    models::AuthorizationAttributes,
    policy::{
        check::RuleChecker,
        expand::SubjectLister,
        repository::{InMemoryRuleRepository, RuleRepository},
        PolicyDocument, PolicyRule,
    },
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Production authorizer backed by a rule repository
pub struct PolicyAuthorizer {
    /// Storage for policy rules
    repository: Arc<dyn RuleRepository>,

    checker: RuleChecker,

    lister: SubjectLister,
}

impl std::fmt::Debug for PolicyAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyAuthorizer")
            .field("repository", &"<dyn RuleRepository>")
            .finish()
    }
}

impl PolicyAuthorizer {
    pub fn new(repository: Arc<dyn RuleRepository>) -> Self {
        Self {
            checker: RuleChecker::new(repository.clone()),
            lister: SubjectLister::new(repository.clone()),
            repository,
        }
    }

    /// Empty policy in memory: every request is denied until rules are written.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRuleRepository::new()))
    }

    pub async fn from_document(document: PolicyDocument) -> Result<Self> {
        let authorizer = Self::in_memory();
        for rule in document.rules {
            authorizer.write_rule(rule).await?;
        }
        Ok(authorizer)
    }

    pub async fn from_policy_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = PolicyDocument::from_file(path).map_err(|err| match err {
            PolicyError::Io(io) => {
                AuthorizerError::Unavailable(format!("{}: {}", path.display(), io))
            }
            other => other.into(),
        })?;

        info!(path = %path.display(), rules = document.rules.len(), "Loaded policy file");
        Self::from_document(document).await
    }

    // =============================================================================
    // Rule Management
    // =============================================================================

    pub async fn write_rule(&self, rule: PolicyRule) -> Result<()> {
        rule.validate()?;
        info!("Writing rule {}: {}", rule.id, rule);
        self.repository.write_rule(rule).await
    }

    pub async fn delete_rule(&self, id: Uuid) -> Result<bool> {
        info!("Deleting rule {}", id);
        self.repository.delete_rule(id).await
    }

    /// Rules that apply in `namespace`, cluster-wide rules included
    pub async fn read_rules(&self, namespace: &str) -> Result<Vec<PolicyRule>> {
        self.repository.read_rules(namespace).await
    }

    pub async fn list_rules(&self) -> Result<Vec<PolicyRule>> {
        self.repository.list_rules().await
    }
}

#[async_trait]
impl Authorizer for PolicyAuthorizer {
    async fn authorize(
        &self,
        attributes: &AuthorizationAttributes,
    ) -> Result<Decision, AuthorizerError> {
        let decision = self.checker.check(attributes).await?;
        debug!(allowed = decision.allowed, "Policy decision for {}", attributes);
        Ok(decision)
    }

    async fn get_allowed_subjects(
        &self,
        attributes: &AuthorizationAttributes,
    ) -> Result<AllowedSubjects, AuthorizerError> {
        self.lister.allowed_subjects(attributes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReviewRequest;
    use crate::policy::RuleSubject;

    #[tokio::test]
    async fn test_basic_authorize() {
        let authorizer = PolicyAuthorizer::in_memory();
        let attrs = AuthorizationAttributes::from_request(
            &ReviewRequest::new("alice", &[], "edit", "documents"),
            "records",
        );

        // Initially no permission
        assert!(!authorizer.authorize(&attrs).await.unwrap().allowed);

        let rule = PolicyRule::new(RuleSubject::user("alice"), &["edit"], &["documents"])
            .in_namespace("records");
        let id = rule.id;
        authorizer.write_rule(rule).await.unwrap();
        assert!(authorizer.authorize(&attrs).await.unwrap().allowed);
        assert_eq!(authorizer.read_rules("records").await.unwrap().len(), 1);
        assert!(authorizer.read_rules("billing").await.unwrap().is_empty());
        assert_eq!(authorizer.list_rules().await.unwrap().len(), 1);

        assert!(authorizer.delete_rule(id).await.unwrap());
        assert!(!authorizer.authorize(&attrs).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_invalid_rule_rejected() {
        let authorizer = PolicyAuthorizer::in_memory();
        let err = authorizer
            .write_rule(PolicyRule::new(RuleSubject::group(""), &["get"], &["pods"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthorizerError::InvalidPolicy(_)));
        assert!(authorizer.list_rules().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_policy_file() {
        let err = PolicyAuthorizer::from_policy_file("/nonexistent/policy.yaml")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthorizerError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_duplicate_rule_ids_rejected() {
        let path = std::env::temp_dir().join(format!("duplicate-ids-{}.yaml", Uuid::new_v4()));
        let id = Uuid::new_v4();
        let contents = format!(
            r#"
rules:
  - id: {id}
    subject: {{ kind: User, name: alice }}
    verbs: [get]
    resources: [pods]
  - id: {id}
    subject: {{ kind: Group, name: ops }}
    verbs: ["*"]
    resources: ["*"]
"#
        );
        std::fs::write(&path, contents).unwrap();

        let result = PolicyAuthorizer::from_policy_file(&path).await;
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(AuthorizerError::InvalidPolicy(_))));
    }
}
