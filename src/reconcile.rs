use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing::{debug, info};
use url::Url;

use crate::github::{GitHubClient, Hook, HookId};
use crate::input::{Operation, OutRequest};

/// Builds the resource check callback this webhook should point at, from the
/// fixed ATC template. The percent-encoded serialization is the idempotency
/// key: a hook counts as "already configured" only if its `config.url`
/// equals this string exactly.
pub fn callback_url(request: &OutRequest) -> Result<String> {
    let raw = format!(
        "{}/api/v1/teams/{}/pipelines/{}/resources/{}/check/webhook?webhook_token={}",
        request.external_url,
        request.team_name,
        request.pipeline_name,
        request.resource_name,
        request.webhook_token,
    );
    let url = Url::parse(&raw).with_context(|| format!("couldn't parse callback url {}", raw))?;
    Ok(url.to_string())
}

fn matching_hook<'a>(hooks: &'a [Hook], target: &str) -> Option<&'a Hook> {
    hooks.iter().find(|hook| hook.config.url.as_deref() == Some(target))
}

/// Version id for the "delete, nothing existed" path, where there is no real
/// hook id to report.
fn synthetic_id() -> HookId {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_millis();
    HookId::Number(millis as u64)
}

/// Drives the repository's hook list towards the requested state and returns
/// the hook id to publish as the resource version.
pub async fn reconcile(client: &GitHubClient, request: &OutRequest) -> Result<HookId> {
    let target = callback_url(request)?;
    debug!("reconciling {} webhook for {}", request.repo, target);

    let hooks = client.list_hooks().await?;
    let existing = matching_hook(&hooks, &target);

    match (request.operation, existing) {
        (Operation::Create, Some(hook)) => {
            info!("webhook {} already installed, nothing to create", hook.id);
            Ok(hook.id.clone())
        }
        (Operation::Create, None) => {
            let hook = client.create_hook(&target).await?;
            info!("created webhook {}", hook.id);
            Ok(hook.id)
        }
        (Operation::Delete, Some(hook)) => {
            client.delete_hook(&hook.id).await?;
            info!("deleted webhook {}", hook.id);
            Ok(hook.id.clone())
        }
        (Operation::Delete, None) => {
            let id = synthetic_id();
            info!("no webhook matched, nothing to delete");
            Ok(id)
        }
    }
}
