use anyhow::{bail, Result};
use serde::Deserialize;
use tracing::error;

use crate::config::BuildEnv;

/// Put request as Concourse hands it to us on stdin.
///
/// Every leaf is optional at this stage so a single validation pass can
/// diagnose each missing field by path instead of failing on the first one.
#[derive(Debug, Default, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub params: Params,
}

#[derive(Debug, Default, Deserialize)]
pub struct Source {
    pub github_api: Option<String>,
    pub github_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Params {
    pub org: Option<String>,
    pub repo: Option<String>,
    pub operation: Option<String>,
    pub resource_name: Option<String>,
    pub webhook_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Delete,
}

/// Fully validated request: the stdin payload combined with the build
/// metadata from the environment. Immutable once constructed.
#[derive(Debug)]
pub struct OutRequest {
    pub github_api: String,
    pub github_token: String,
    pub org: String,
    pub repo: String,
    pub operation: Operation,
    pub resource_name: String,
    pub webhook_token: String,
    pub external_url: String,
    pub team_name: String,
    pub pipeline_name: String,
}

/// Tracks the aggregate outcome across checks. Failure is sticky: once any
/// check fails the validation stays failed, but later checks still run so
/// one run reports every problem.
struct Validator {
    valid: bool,
}

impl Validator {
    fn new() -> Self {
        Self { valid: true }
    }

    fn require(&mut self, path: &str, value: Option<String>) -> Option<String> {
        if value.is_none() {
            error!("missing required field {}", path);
            self.valid = false;
        }
        value
    }
}

pub fn validate(payload: Payload, env: BuildEnv) -> Result<OutRequest> {
    let mut validator = Validator::new();

    let github_api = validator.require("source.github_api", payload.source.github_api);
    let github_token = validator.require("source.github_token", payload.source.github_token);
    let org = validator.require("params.org", payload.params.org);
    let repo = validator.require("params.repo", payload.params.repo);
    let resource_name = validator.require("params.resource_name", payload.params.resource_name);
    let webhook_token = validator.require("params.webhook_token", payload.params.webhook_token);
    let operation = match validator.require("params.operation", payload.params.operation) {
        Some(raw) => match raw.to_lowercase().as_str() {
            "create" => Some(Operation::Create),
            "delete" => Some(Operation::Delete),
            _ => {
                error!("unsupported operation {:?}, expected create or delete", raw);
                validator.valid = false;
                None
            }
        },
        None => None,
    };
    let external_url = validator.require("ATC_EXTERNAL_URL", env.external_url);
    let team_name = validator.require("BUILD_TEAM_NAME", env.team_name);
    let pipeline_name = validator.require("BUILD_PIPELINE_NAME", env.pipeline_name);

    let (
        Some(github_api),
        Some(github_token),
        Some(org),
        Some(repo),
        Some(resource_name),
        Some(webhook_token),
        Some(operation),
        Some(external_url),
        Some(team_name),
        Some(pipeline_name),
        true,
    ) = (
        github_api,
        github_token,
        org,
        repo,
        resource_name,
        webhook_token,
        operation,
        external_url,
        team_name,
        pipeline_name,
        validator.valid,
    ) else {
        bail!("put request failed validation");
    };

    Ok(OutRequest {
        github_api,
        github_token,
        org,
        repo,
        operation,
        resource_name,
        webhook_token,
        external_url,
        team_name,
        pipeline_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_env() -> BuildEnv {
        BuildEnv {
            external_url: Some("https://ci.example.com".to_string()),
            team_name: Some("main".to_string()),
            pipeline_name: Some("deploy".to_string()),
        }
    }

    fn payload(operation: &str) -> Payload {
        serde_json::from_str(&format!(
            r#"{{
                "source": {{
                    "github_api": "https://api.github.com",
                    "github_token": "t0ken"
                }},
                "params": {{
                    "org": "prologin",
                    "repo": "site",
                    "operation": "{}",
                    "resource_name": "site-source",
                    "webhook_token": "hunter2"
                }}
            }}"#,
            operation
        ))
        .unwrap()
    }

    #[test]
    fn accepts_a_complete_request() {
        let request = validate(payload("create"), build_env()).unwrap();

        assert_eq!(request.github_api, "https://api.github.com");
        assert_eq!(request.github_token, "t0ken");
        assert_eq!(request.org, "prologin");
        assert_eq!(request.repo, "site");
        assert_eq!(request.operation, Operation::Create);
        assert_eq!(request.resource_name, "site-source");
        assert_eq!(request.webhook_token, "hunter2");
        assert_eq!(request.external_url, "https://ci.example.com");
        assert_eq!(request.team_name, "main");
        assert_eq!(request.pipeline_name, "deploy");
    }

    #[test]
    fn operation_is_case_insensitive() {
        let request = validate(payload("CREATE"), build_env()).unwrap();
        assert_eq!(request.operation, Operation::Create);

        let request = validate(payload("Delete"), build_env()).unwrap();
        assert_eq!(request.operation, Operation::Delete);
    }

    #[test]
    fn rejects_unsupported_operation() {
        assert!(validate(payload("update"), build_env()).is_err());
    }

    #[test]
    fn rejects_missing_payload_field() {
        let mut payload = payload("delete");
        payload.params.repo = None;

        assert!(validate(payload, build_env()).is_err());
    }

    #[test]
    fn rejects_missing_build_metadata() {
        let mut env = build_env();
        env.external_url = None;

        assert!(validate(payload("create"), env).is_err());
    }

    #[test]
    fn rejects_empty_payload() {
        let payload: Payload = serde_json::from_str("{}").unwrap();
        assert!(validate(payload, build_env()).is_err());
    }

    #[test]
    fn later_passing_checks_do_not_reset_a_failure() {
        let mut payload = payload("create");
        payload.source.github_api = None;

        // every field after the first failed check is present and valid
        assert!(validate(payload, build_env()).is_err());
    }
}
