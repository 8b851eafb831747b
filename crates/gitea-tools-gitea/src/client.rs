use std::time::Duration;

use async_trait::async_trait;
use gitea_tools_api::{
    ActionsApi,
    ActionsError,
    ActionsResult,
    DispatchRequest,
    RepoRef,
    TaskList,
    TaskQuery,
};
use reqwest::header::{
    HeaderMap,
    HeaderValue,
    ACCEPT,
    AUTHORIZATION,
};
use secrecy::ExposeSecret;
use tracing::debug;

use crate::config::{
    actions_url,
    GiteaConfig,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct GiteaClient {
    http_client: reqwest::Client,
    api_url: String,
}

impl GiteaClient {
    /// Builds a client for the configured host.
    ///
    /// Fails with `MissingCredential` when no access token is configured,
    /// before any connection is attempted.
    pub fn new(config: &GiteaConfig) -> ActionsResult<Self> {
        let token = config.token()?;

        let mut auth = HeaderValue::from_str(&format!("token {}", token.expose_secret()))
            .map_err(|e| ActionsError::InvalidInput(format!("Invalid token format: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("gitea-tools/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ActionsError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_http_client(http_client, config.api_url()))
    }

    pub fn with_http_client(http_client: reqwest::Client, api_url: String) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> ActionsResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ActionsError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ActionsError::http(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
                &error_text,
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl ActionsApi for GiteaClient {
    async fn list_tasks(&self, repo: &RepoRef, query: &TaskQuery) -> ActionsResult<TaskList> {
        let url = actions_url(&self.api_url, repo, "tasks");

        let mut params: Vec<(&str, String)> = Vec::with_capacity(3);
        if let Some(page) = query.page {
            params.push(("page", page.to_string()));
        }
        params.push(("limit", query.limit.to_string()));
        if let Some(status) = query.status {
            params.push(("status", status.to_string()));
        }

        debug!(%repo, ?params, "Listing actions tasks");

        let request = self
            .http_client
            .get(&url)
            .query(&params)
            .header(ACCEPT, "application/json");
        let response = self.send(request).await?;

        response.json::<TaskList>().await.map_err(|e| {
            ActionsError::Serialization(format!("Failed to parse tasks response: {}", e))
        })
    }

    async fn job_logs(&self, repo: &RepoRef, run_number: u64) -> ActionsResult<String> {
        let url = actions_url(&self.api_url, repo, &format!("jobs/{}/logs", run_number));

        debug!(%repo, run_number, "Fetching job logs");

        let request = self.http_client.get(&url).header(ACCEPT, "text/plain");
        let response = self.send(request).await?;

        response
            .text()
            .await
            .map_err(|e| ActionsError::Network(e.to_string()))
    }

    async fn dispatch_workflow(
        &self, repo: &RepoRef, workflow: &str, request: &DispatchRequest,
    ) -> ActionsResult<()> {
        let url = actions_url(
            &self.api_url,
            repo,
            &format!("workflows/{}/dispatches", urlencoding::encode(workflow)),
        );

        debug!(%repo, workflow, git_ref = %request.git_ref, "Dispatching workflow");

        let builder = self
            .http_client
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(request);
        self.send(builder).await?;

        Ok(())
    }
}
