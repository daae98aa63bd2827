use crate::{error::Result, policy::PolicyRule};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Storage for policy rules
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Insert or replace a rule by id
    async fn write_rule(&self, rule: PolicyRule) -> Result<()>;

    /// Remove a rule, returning whether it existed
    async fn delete_rule(&self, id: Uuid) -> Result<bool>;

    /// Rules that apply in `namespace`, cluster-wide rules included, oldest first
    async fn read_rules(&self, namespace: &str) -> Result<Vec<PolicyRule>>;

    /// Every stored rule regardless of scope, oldest first
    async fn list_rules(&self) -> Result<Vec<PolicyRule>>;

    async fn rule_exists(&self, id: Uuid) -> Result<bool>;
}

/// In-memory rule repository for tests, the CLI and file-backed policies
pub struct InMemoryRuleRepository {
    rules: Arc<DashMap<Uuid, PolicyRule>>,
}

impl InMemoryRuleRepository {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(DashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn collect(&self, keep: impl Fn(&PolicyRule) -> bool) -> Vec<PolicyRule> {
        let mut rules: Vec<PolicyRule> = self
            .rules
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        // DashMap iteration order is arbitrary
        rules.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        rules
    }
}

impl Default for InMemoryRuleRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuleRepository for InMemoryRuleRepository {
    async fn write_rule(&self, rule: PolicyRule) -> Result<()> {
        self.rules.insert(rule.id, rule);
        Ok(())
    }

    async fn delete_rule(&self, id: Uuid) -> Result<bool> {
        Ok(self.rules.remove(&id).is_some())
    }

    async fn read_rules(&self, namespace: &str) -> Result<Vec<PolicyRule>> {
        Ok(self.collect(|rule| rule.applies_in(namespace)))
    }

    async fn list_rules(&self) -> Result<Vec<PolicyRule>> {
        Ok(self.collect(|_| true))
    }

    async fn rule_exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.rules.contains_key(&id))
    }
}
