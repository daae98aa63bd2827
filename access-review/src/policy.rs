//! Rule-based [`Authorizer`](crate::authorizer::Authorizer) implementation.
//!
//! Policy is a flat set of rules. Each rule binds one user or group to a set
//! of verbs and resources, either in a single namespace or cluster-wide:
//!
//! ```yaml
//! rules:
//!   - subject: { kind: Group, name: system:masters }
//!     verbs: ["*"]
//!     resources: ["*"]
//!   - subject: { kind: User, name: alice }
//!     verbs: [get, list]
//!     resources: [pods]
//!     namespace: team-a
//! ```

pub mod check;
pub mod engine;
pub mod expand;
pub mod repository;

pub use engine::PolicyAuthorizer;
pub use repository::{InMemoryRuleRepository, RuleRepository};

use crate::{error::PolicyError, models::UserInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Matches any verb or resource
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name")]
pub enum RuleSubject {
    User(String),
    Group(String),
}

impl RuleSubject {
    pub fn user(name: &str) -> Self {
        RuleSubject::User(name.to_string())
    }

    pub fn group(name: &str) -> Self {
        RuleSubject::Group(name.to_string())
    }

    fn name(&self) -> &str {
        match self {
            RuleSubject::User(name) | RuleSubject::Group(name) => name,
        }
    }

    /// Whether `user` is this subject or belongs to this group.
    pub fn matches(&self, user: &UserInfo) -> bool {
        match self {
            RuleSubject::User(name) => !user.is_anonymous() && user.name == *name,
            RuleSubject::Group(name) => user.groups.iter().any(|g| g == name),
        }
    }
}

impl fmt::Display for RuleSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSubject::User(name) => write!(f, "user:{}", name),
            RuleSubject::Group(name) => write!(f, "group:{}", name),
        }
    }
}

/// Grants `subject` the listed verbs on the listed resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub subject: RuleSubject,
    pub verbs: Vec<String>,
    pub resources: Vec<String>,
    /// `None` applies in every namespace
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl PolicyRule {
    pub fn new(subject: RuleSubject, verbs: &[&str], resources: &[&str]) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject,
            verbs: verbs.iter().map(|v| v.to_string()).collect(),
            resources: resources.iter().map(|r| r.to_string()).collect(),
            namespace: None,
            created_at: Utc::now(),
        }
    }

    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.subject.name().is_empty() {
            return Err(PolicyError::Validation(format!(
                "rule {} has an empty subject name",
                self.id
            )));
        }
        if self.verbs.is_empty() || self.verbs.iter().any(String::is_empty) {
            return Err(PolicyError::Validation(format!(
                "rule {} for {} needs at least one non-empty verb",
                self.id, self.subject
            )));
        }
        if self.resources.is_empty() || self.resources.iter().any(String::is_empty) {
            return Err(PolicyError::Validation(format!(
                "rule {} for {} needs at least one non-empty resource",
                self.id, self.subject
            )));
        }
        if matches!(self.namespace.as_deref(), Some("")) {
            return Err(PolicyError::Validation(format!(
                "rule {} has an empty namespace; omit it for cluster scope",
                self.id
            )));
        }
        Ok(())
    }

    pub fn applies_in(&self, namespace: &str) -> bool {
        match self.namespace {
            Some(ref ns) => ns == namespace,
            None => true,
        }
    }

    pub fn permits(&self, verb: &str, resource: &str) -> bool {
        let verb_ok = self.verbs.iter().any(|v| v == WILDCARD || v == verb);
        let resource_ok = self.resources.iter().any(|r| r == WILDCARD || r == resource);
        verb_ok && resource_ok
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] on [{}]",
            self.subject,
            self.verbs.join(","),
            self.resources.join(",")
        )?;
        match self.namespace {
            Some(ref ns) => write!(f, " in {}", ns),
            None => write!(f, " cluster-wide"),
        }
    }
}

/// On-disk policy format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

impl PolicyDocument {
    /// Parses and validates a document. Rule ids must be unique within it.
    pub fn from_yaml_str(contents: &str) -> Result<Self, PolicyError> {
        let document: PolicyDocument = serde_yaml::from_str(contents)?;
        let mut seen = HashSet::with_capacity(document.rules.len());
        for rule in &document.rules {
            rule.validate()?;
            if !seen.insert(rule.id) {
                return Err(PolicyError::Validation(format!(
                    "duplicate rule id {} ({})",
                    rule.id, rule
                )));
            }
        }
        Ok(document)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }
}
