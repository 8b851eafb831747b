pub mod dispatch;
pub mod job_logs;
pub mod run_detail;
pub mod summary;
pub mod watch;
pub mod workflow_runs;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::time::Duration;

use gitea_tools_api::{
    ActionsApi,
    ActionsError,
    ActionsResult,
    RepoRef,
};
use gitea_tools_gitea::{
    GiteaClient,
    GiteaConfig,
};
use serde::Deserialize;
use tracing::debug;

use self::dispatch::{
    DispatchArgs,
    DispatchOutcome,
    WorkflowDispatcher,
};
use self::job_logs::{
    JobLogFetcher,
    JobLogsArgs,
    LogFetchRequest,
};
use self::run_detail::RunDetailArgs;
use self::summary::SummaryArgs;
use self::workflow_runs::WorkflowRunsArgs;
use crate::output::{
    to_pretty_json,
    ToolOutput,
};

pub(crate) fn repo_ref(owner: &str, repo: &str) -> ActionsResult<RepoRef> {
    let owner = owner.trim();
    let repo = repo.trim();
    if owner.is_empty() || repo.is_empty() {
        return Err(ActionsError::InvalidInput(
            "owner and repo must not be empty".to_string(),
        ));
    }
    Ok(RepoRef::new(owner, repo))
}

/// Sleep intervals used while waiting on runs
#[derive(Debug, Clone, Copy)]
pub struct PollTiming {
    /// Between status checks of a running workflow
    pub status_interval: Duration,
    /// Before the first lookup of a freshly dispatched run
    pub dispatch_grace: Duration,
    /// Between lookups of a dispatched run that has not appeared yet
    pub dispatch_lookup_interval: Duration,
}

impl Default for PollTiming {
    fn default() -> Self {
        Self {
            status_interval: Duration::from_secs(5),
            dispatch_grace: Duration::from_secs(8),
            dispatch_lookup_interval: Duration::from_secs(3),
        }
    }
}

/// A structured tool invocation: `{"tool": "...", "args": {...}}`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "tool", content = "args")]
pub enum ToolCall {
    #[serde(rename = "gitea-job-logs")]
    JobLogs(JobLogsArgs),
    #[serde(rename = "gitea-workflow-runs")]
    WorkflowRuns(WorkflowRunsArgs),
    #[serde(rename = "gitea-workflow-run-detail")]
    RunDetail(RunDetailArgs),
    #[serde(rename = "gitea-workflow-summary")]
    Summary(SummaryArgs),
    #[serde(rename = "gitea-workflow-dispatch")]
    Dispatch(DispatchArgs),
}

impl ToolCall {
    pub fn from_json(input: &str) -> Result<Self, ToolOutput> {
        serde_json::from_str(input).map_err(|e| {
            ToolOutput::failure(
                "Error",
                &ActionsError::InvalidInput(format!("invalid tool call: {}", e)),
            )
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::JobLogs(_) => "gitea-job-logs",
            ToolCall::WorkflowRuns(_) => "gitea-workflow-runs",
            ToolCall::RunDetail(_) => "gitea-workflow-run-detail",
            ToolCall::Summary(_) => "gitea-workflow-summary",
            ToolCall::Dispatch(_) => "gitea-workflow-dispatch",
        }
    }

    /// Prefix for transport failures reported by this tool
    pub fn error_context(&self) -> &'static str {
        match self {
            ToolCall::JobLogs(_) => "Error fetching job logs",
            ToolCall::WorkflowRuns(_) => "Error fetching workflow runs",
            ToolCall::RunDetail(_) => "Error fetching workflow run details",
            ToolCall::Summary(_) => "Error fetching workflow summary",
            ToolCall::Dispatch(_) => "Error triggering workflow",
        }
    }
}

/// Runs tool calls against one `ActionsApi`
pub struct Toolbox {
    api: Arc<dyn ActionsApi>,
    timing: PollTiming,
}

impl Toolbox {
    pub fn new(api: Arc<dyn ActionsApi>) -> Self {
        Self {
            api,
            timing: PollTiming::default(),
        }
    }

    /// Builds a Gitea-backed toolbox; fails without a token before any request
    pub fn connect(config: &GiteaConfig) -> ActionsResult<Self> {
        let client = GiteaClient::new(config)?;
        debug!(host = config.host(), "Gitea client ready");
        Ok(Self::new(Arc::new(client)))
    }

    pub fn with_timing(mut self, timing: PollTiming) -> Self {
        self.timing = timing;
        self
    }

    pub async fn call(&self, call: ToolCall) -> ToolOutput {
        let context = call.error_context();
        debug!(tool = call.name(), "Running tool");
        ToolOutput::from_result(context, self.run(call).await)
    }

    async fn run(&self, call: ToolCall) -> ActionsResult<String> {
        let api = self.api.as_ref();
        match call {
            ToolCall::JobLogs(args) => {
                let request = LogFetchRequest::try_from(args)?;
                JobLogFetcher::new(api, self.timing.status_interval)
                    .fetch(&request)
                    .await
            }
            ToolCall::WorkflowRuns(args) => {
                to_pretty_json(&workflow_runs::list_workflow_runs(api, &args).await?)
            }
            ToolCall::RunDetail(args) => {
                to_pretty_json(&run_detail::workflow_run_detail(api, &args).await?)
            }
            ToolCall::Summary(args) => to_pretty_json(&summary::workflow_summary(api, &args).await?),
            ToolCall::Dispatch(args) => {
                match WorkflowDispatcher::new(api, self.timing)
                    .dispatch(&args)
                    .await?
                {
                    DispatchOutcome::Triggered(ack) => to_pretty_json(&ack),
                    DispatchOutcome::Completed(text) => Ok(text),
                }
            }
        }
    }
}

/// Runs one tool call against the configured Gitea instance.
///
/// Never fails: every outcome, including a missing token, is a `ToolOutput`.
pub async fn execute(config: &GiteaConfig, call: ToolCall) -> ToolOutput {
    match Toolbox::connect(config) {
        Ok(toolbox) => toolbox.call(call).await,
        Err(e) => ToolOutput::failure(call.error_context(), &e),
    }
}
