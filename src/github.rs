use std::fmt;

use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

const USER_AGENT_STRING: &str = "github-webhook-resource";

/// GitHub hooks API client, bound to the single repository a put request
/// targets.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api: String,
    org: String,
    repo: String,
}

/// Subset of GitHub's hook resource this program reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Hook {
    pub id: HookId,
    #[serde(default)]
    pub config: HookConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookConfig {
    #[serde(default)]
    pub url: Option<String>,
}

/// Hook ids are numeric on github.com but some Enterprise deployments have
/// returned them as strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum HookId {
    Number(u64),
    Text(String),
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookId::Number(id) => write!(f, "{}", id),
            HookId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateHook<'a> {
    name: &'static str,
    config: CreateHookConfig<'a>,
}

#[derive(Debug, Serialize)]
struct CreateHookConfig<'a> {
    url: &'a str,
    #[serde(rename = "content-type")]
    content_type: &'static str,
}

impl GitHubClient {
    pub fn new(api: &str, token: &str, org: &str, repo: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
        let mut auth = HeaderValue::from_str(&format!("token {}", token))
            .context("github_token isn't a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("couldn't build HTTP client")?;

        Ok(Self {
            http,
            api: api.to_string(),
            org: org.to_string(),
            repo: repo.to_string(),
        })
    }

    fn hooks_url(&self) -> String {
        format!("{}/repos/{}/{}/hooks", self.api, self.org, self.repo)
    }

    pub async fn list_hooks(&self) -> Result<Vec<Hook>> {
        let response = self.call(Method::GET, self.hooks_url(), None).await?;
        response.json().await.context("couldn't decode hook list")
    }

    pub async fn create_hook(&self, callback_url: &str) -> Result<Hook> {
        let body = CreateHook {
            name: "web",
            config: CreateHookConfig {
                url: callback_url,
                content_type: "json",
            },
        };
        let response = self
            .call(Method::POST, self.hooks_url(), Some(serde_json::to_value(&body)?))
            .await?;
        response.json().await.context("couldn't decode created hook")
    }

    pub async fn delete_hook(&self, id: &HookId) -> Result<()> {
        let url = format!("{}/{}", self.hooks_url(), id);
        self.call(Method::DELETE, url, None).await?;
        Ok(())
    }

    /// Single outbound-call primitive. Every GitHub request goes through
    /// here so failures are diagnosed in one place.
    async fn call(&self, method: Method, url: String, body: Option<Value>) -> Result<Response> {
        debug!("{} {}", method, url);

        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("{} {} failed", method, url))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response.text().await.unwrap_or_default();
        error!("GitHub replied {} to {} {}: {}", status, method, url, detail);
        if status == StatusCode::NOT_FOUND {
            error!(
                "a 404 usually means the token cannot administer {}/{} or lacks the public_repo scope, check {}",
                self.org,
                self.repo,
                self.settings_url()
            );
        }

        bail!("GitHub request {} {} failed with status {}", method, url, status)
    }

    /// Best-effort rewrite of the API base into the repository settings
    /// page, for the 404 remediation hint.
    fn settings_url(&self) -> String {
        let base = self.api.replace("api.github.com", "github.com");
        let base = base.trim_end_matches('/').trim_end_matches("/api/v3");
        format!("{}/{}/{}/settings/hooks", base, self.org, self.repo)
    }
}
