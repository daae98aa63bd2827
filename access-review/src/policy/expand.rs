use crate::{
    authorizer::AllowedSubjects,
    error::AuthorizerError,
    models::AuthorizationAttributes,
    policy::{repository::RuleRepository, RuleSubject},
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Lists every user and group granted an action by the stored rules
pub struct SubjectLister {
    repository: Arc<dyn RuleRepository>,
}

impl SubjectLister {
    pub fn new(repository: Arc<dyn RuleRepository>) -> Self {
        Self { repository }
    }

    /// Distinct users and groups, each sorted by name.
    pub async fn allowed_subjects(
        &self,
        attributes: &AuthorizationAttributes,
    ) -> Result<AllowedSubjects, AuthorizerError> {
        let rules = self
            .repository
            .read_rules(&attributes.namespace)
            .await?;

        let mut users = BTreeSet::new();
        let mut groups = BTreeSet::new();

        for rule in rules
            .iter()
            .filter(|rule| rule.permits(&attributes.verb, &attributes.resource))
        {
            match rule.subject {
                RuleSubject::User(ref name) => users.insert(name.clone()),
                RuleSubject::Group(ref name) => groups.insert(name.clone()),
            };
        }

        debug!(
            "{} users and {} groups may {} {} in {:?}",
            users.len(),
            groups.len(),
            attributes.verb,
            attributes.resource,
            attributes.namespace
        );

        Ok(AllowedSubjects {
            users: users.into_iter().collect(),
            groups: groups.into_iter().collect(),
        })
    }
}
