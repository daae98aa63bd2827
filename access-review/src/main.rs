#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)
)]

use access_review::{
    observability::init_tracing, AccessReviewConfig, AccessReviewHandler, Authorizer,
    PolicyAuthorizer, RequestContext, ResourceAccessReviewHandler, ResourceAccessReviewRequest,
    ReviewRequest,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Evaluate access reviews against a policy file
#[derive(Parser, Debug)]
#[command(name = "access-review")]
#[command(about = "Subject and resource access reviews from the command line")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "ACCESS_REVIEW_CONFIG")]
    config: Option<PathBuf>,

    /// Policy file, overrides the configured one
    #[arg(short, long, global = true)]
    policy: Option<PathBuf>,

    /// Namespace of the review, defaults to the configured namespace
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// May USER (with GROUPs) perform VERB on RESOURCE?
    Check {
        #[arg(short, long, default_value = "")]
        user: String,

        #[arg(short, long = "group")]
        groups: Vec<String>,

        #[arg(long)]
        verb: String,

        #[arg(long)]
        resource: String,
    },
    /// Which users and groups may perform VERB on RESOURCE?
    WhoCan {
        #[arg(long)]
        verb: String,

        #[arg(long)]
        resource: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AccessReviewConfig::load(args.config.as_deref())?;
    init_tracing(&config.logging)?;

    let policy = args.policy.as_ref().or(config.policy_file.as_ref());
    let authorizer: Arc<dyn Authorizer> = match policy {
        Some(path) => Arc::new(
            PolicyAuthorizer::from_policy_file(path)
                .await
                .with_context(|| format!("loading policy {}", path.display()))?,
        ),
        None => {
            warn!("No policy file configured, every request will be denied");
            Arc::new(PolicyAuthorizer::in_memory())
        }
    };

    let namespace = args
        .namespace
        .unwrap_or_else(|| config.default_namespace.clone());
    let ctx = RequestContext::new().with_namespace(&namespace);
    info!(request_id = %ctx.request_id(), namespace = %namespace, "Running review");

    let output = match args.command {
        Command::Check {
            user,
            groups,
            verb,
            resource,
        } => {
            let request = ReviewRequest {
                user,
                groups,
                verb,
                resource,
            };
            let outcome = AccessReviewHandler::new(authorizer)
                .create(&ctx, request)?
                .wait_timeout(config.await_timeout())
                .await?;
            serde_json::to_string_pretty(&outcome)?
        }
        Command::WhoCan { verb, resource } => {
            let request = ResourceAccessReviewRequest { verb, resource };
            let outcome = ResourceAccessReviewHandler::new(authorizer)
                .create(&ctx, request)?
                .wait_timeout(config.await_timeout())
                .await?;
            serde_json::to_string_pretty(&outcome)?
        }
    };

    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_after_subcommand() {
        let args = Args::try_parse_from([
            "access-review",
            "check",
            "--user",
            "alice",
            "--verb",
            "get",
            "--resource",
            "pods",
            "--namespace",
            "team-a",
        ])
        .unwrap();

        assert_eq!(args.namespace.as_deref(), Some("team-a"));
        match args.command {
            Command::Check { user, groups, verb, resource } => {
                assert_eq!(user, "alice");
                assert!(groups.is_empty());
                assert_eq!(verb, "get");
                assert_eq!(resource, "pods");
            }
            Command::WhoCan { .. } => panic!("expected check"),
        }
    }

    #[test]
    fn test_namespace_and_policy_before_subcommand() {
        let args = Args::try_parse_from([
            "access-review",
            "-n",
            "team-b",
            "--policy",
            "policy.yaml",
            "who-can",
            "--verb",
            "list",
            "--resource",
            "pods",
        ])
        .unwrap();

        assert_eq!(args.namespace.as_deref(), Some("team-b"));
        assert_eq!(args.policy, Some(PathBuf::from("policy.yaml")));
        assert!(matches!(
            args.command,
            Command::WhoCan { ref verb, ref resource } if verb == "list" && resource == "pods"
        ));
    }

    #[test]
    fn test_repeated_groups_keep_order() {
        let args = Args::try_parse_from([
            "access-review",
            "check",
            "--group",
            "first",
            "-g",
            "second",
            "--group",
            "first",
            "--verb",
            "delete",
            "--resource",
            "deploymentConfigs",
        ])
        .unwrap();

        assert!(args.namespace.is_none());
        match args.command {
            Command::Check { user, groups, .. } => {
                assert_eq!(user, "");
                assert_eq!(groups, vec!["first", "second", "first"]);
            }
            Command::WhoCan { .. } => panic!("expected check"),
        }
    }

    #[test]
    fn test_missing_verb_is_rejected() {
        assert!(Args::try_parse_from(["access-review", "check", "--resource", "pods"]).is_err());
    }
}
