//! Configuration for the Gitea client

use gitea_tools_api::{
    ActionsError,
    ActionsResult,
    RepoRef,
};
use secrecy::SecretString;

pub const HOST_ENV: &str = "GITEA_HOST";
pub const TOKEN_ENV: &str = "GITEA_ACCESS_TOKEN";
pub const DEFAULT_HOST: &str = "https://git.holdenitdown.net";

/// Host and credential used to reach a Gitea instance
#[derive(Debug)]
pub struct GiteaConfig {
    host: String,
    token: Option<SecretString>,
}

impl GiteaConfig {
    pub fn new(host: Option<String>, token: Option<String>) -> Self {
        Self {
            host: normalize_host(host.as_deref()),
            token: token
                .filter(|t| !t.trim().is_empty())
                .map(|t| SecretString::from(t.trim().to_string())),
        }
    }

    /// Reads `GITEA_HOST` and `GITEA_ACCESS_TOKEN` from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(lookup(HOST_ENV), lookup(TOKEN_ENV))
    }

    /// Overrides the host, ignoring blank values
    pub fn with_host(mut self, host: Option<String>) -> Self {
        if host.as_deref().is_some_and(|h| !h.trim().is_empty()) {
            self.host = normalize_host(host.as_deref());
        }
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> ActionsResult<&SecretString> {
        self.token
            .as_ref()
            .ok_or_else(|| ActionsError::MissingCredential(TOKEN_ENV.to_string()))
    }

    pub fn api_url(&self) -> String {
        build_api_url(&self.host)
    }
}

fn normalize_host(host: Option<&str>) -> String {
    host.and_then(|h| {
        let trimmed = h.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.trim_end_matches('/').to_string())
        }
    })
    .unwrap_or_else(|| DEFAULT_HOST.to_string())
}

pub(crate) fn build_api_url(host: &str) -> String {
    format!("{}/api/v1", host)
}

/// `{api_url}/repos/{owner}/{repo}/actions/{tail}` with encoded path segments
pub(crate) fn actions_url(api_url: &str, repo: &RepoRef, tail: &str) -> String {
    format!(
        "{}/repos/{}/{}/actions/{}",
        api_url,
        urlencoding::encode(&repo.owner),
        urlencoding::encode(&repo.repo),
        tail
    )
}
