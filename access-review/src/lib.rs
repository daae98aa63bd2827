//! Access review endpoint for RustCare Engine
//!
//! Answers "may this subject do this?" and "who may do this?" on behalf of a
//! request-dispatch layer, delegating the actual decision to a pluggable
//! [`Authorizer`]:
//! - Subject access review: user + groups + verb + resource in a namespace
//! - Resource access review: users and groups allowed a verb on a resource
//! - Single-result asynchronous delivery with caller-side timeouts
//! - Rule-based production authorizer loadable from YAML policy files
//!
//! # Core Concepts
//!
//! - **Attributes**: the canonical (user, verb, resource, namespace) value an authorizer sees
//! - **Decision**: allowed or denied, with a human-readable reason
//! - **Failure status**: returned instead of a decision when the authorizer itself fails
//!
//! A denial is a successful review. Only authorizer failures produce a
//! [`FailureStatus`].
//!
//! # Example
//!
//! ```rust,no_run
//! use access_review::{
//!     AccessReviewHandler, PolicyAuthorizer, PolicyRule, RequestContext, ReviewRequest,
//!     RuleSubject,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let authorizer = PolicyAuthorizer::in_memory();
//!     authorizer
//!         .write_rule(PolicyRule::new(RuleSubject::group("ops"), &["get"], &["pods"]))
//!         .await?;
//!
//!     let handler = AccessReviewHandler::new(Arc::new(authorizer));
//!     let ctx = RequestContext::new().with_namespace("team-a");
//!
//!     let outcome = handler
//!         .create(&ctx, ReviewRequest::new("alice", &["ops"], "get", "pods"))?
//!         .wait_timeout(Duration::from_millis(100))
//!         .await?;
//!
//!     assert!(outcome.response().map(|r| r.allowed).unwrap_or(false));
//!     Ok(())
//! }
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)
)]

pub mod authorizer;
pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod models;
pub mod observability;
pub mod policy;
pub mod resource_review;
pub mod response;

pub use authorizer::{AllowedSubjects, Authorizer, Decision};
pub use config::{AccessReviewConfig, LoggingConfig};
pub use context::RequestContext;
pub use error::*;
pub use handler::{AccessReviewHandler, Pending, PendingReview};
pub use models::*;
pub use policy::{
    InMemoryRuleRepository, PolicyAuthorizer, PolicyDocument, PolicyRule, RuleRepository,
    RuleSubject,
};
pub use resource_review::{PendingResourceReview, ResourceAccessReviewHandler};
pub use response::{build_resource_outcome, build_review_outcome};
