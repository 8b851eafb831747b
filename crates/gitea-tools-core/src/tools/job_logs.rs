//! Job log retrieval, optionally waiting for the run to finish first

use std::str::FromStr;
use std::time::Duration;

use gitea_tools_api::{
    ActionsApi,
    ActionsError,
    ActionsResult,
    RepoRef,
    RunStatus,
    TaskQuery,
    WorkflowRun,
};
use serde::Deserialize;
use tracing::{
    debug,
    info,
};

use super::repo_ref;
use super::watch::{
    timeout_from_secs,
    Budget,
    RunWatcher,
};

/// Returned instead of an empty body; logs may not exist yet or may have been purged
pub const NO_LOGS_AVAILABLE: &str =
    "No logs available for this run (they may not exist yet or may have been purged)";

#[derive(Debug, Clone, Deserialize)]
pub struct JobLogsArgs {
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub run_number: Option<u64>,
    /// Workflow file name; selects the run through `run_selector`
    #[serde(default)]
    pub workflow: Option<String>,
    /// `latest` (default), `latest-failure` or a run number
    #[serde(default)]
    pub run_selector: Option<String>,
    #[serde(default)]
    pub wait: bool,
    /// Seconds; defaults to 300
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Which run of a workflow to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunSelector {
    Latest,
    LatestFailure,
    Number(u64),
}

impl FromStr for RunSelector {
    type Err = ActionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "latest" => Ok(RunSelector::Latest),
            "latest-failure" => Ok(RunSelector::LatestFailure),
            other => match other.parse::<u64>() {
                Ok(number) if number > 0 => Ok(RunSelector::Number(number)),
                _ => Err(ActionsError::InvalidInput(format!(
                    "invalid run_selector '{}'; use 'latest', 'latest-failure' or a run number",
                    s
                ))),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunTarget {
    Number(u64),
    Workflow {
        workflow: String,
        selector: RunSelector,
    },
}

#[derive(Debug, Clone)]
pub struct LogFetchRequest {
    pub repo: RepoRef,
    pub target: RunTarget,
    pub wait: bool,
    pub timeout: Duration,
}

impl TryFrom<JobLogsArgs> for LogFetchRequest {
    type Error = ActionsError;

    fn try_from(args: JobLogsArgs) -> ActionsResult<Self> {
        let workflow = args
            .workflow
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty());

        let target = match (args.run_number, workflow) {
            (Some(0), _) => {
                return Err(ActionsError::InvalidInput(
                    "run_number must be a positive integer".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(ActionsError::InvalidInput(
                    "pass either run_number or workflow with run_selector, not both".to_string(),
                ))
            }
            (Some(number), None) if args.run_selector.is_none() => RunTarget::Number(number),
            (Some(_), None) => {
                return Err(ActionsError::InvalidInput(
                    "run_selector requires workflow".to_string(),
                ))
            }
            (None, None) => {
                return Err(ActionsError::InvalidInput(
                    "either run_number or workflow is required".to_string(),
                ))
            }
            (None, Some(workflow)) => RunTarget::Workflow {
                workflow: workflow.to_string(),
                selector: match args.run_selector.as_deref() {
                    Some(raw) => raw.parse()?,
                    None => RunSelector::Latest,
                },
            },
        };

        Ok(Self {
            repo: repo_ref(&args.owner, &args.repo)?,
            target,
            wait: args.wait,
            timeout: timeout_from_secs(args.timeout)?,
        })
    }
}

pub struct JobLogFetcher<'a> {
    api: &'a dyn ActionsApi,
    poll_interval: Duration,
}

impl<'a> JobLogFetcher<'a> {
    pub fn new(api: &'a dyn ActionsApi, poll_interval: Duration) -> Self {
        Self { api, poll_interval }
    }

    /// Returns the log text of the run, or `NO_LOGS_AVAILABLE` when it is blank.
    ///
    /// With `wait` set, the run status is polled first and no log request is
    /// made if the run does not settle within the timeout.
    pub async fn fetch(&self, request: &LogFetchRequest) -> ActionsResult<String> {
        let budget = Budget::start(request.timeout);

        let (run_number, known_status) = match &request.target {
            RunTarget::Number(number) => (*number, None),
            RunTarget::Workflow { workflow, selector } => {
                let run = self.select_run(&request.repo, workflow, *selector).await?;
                (run.run_number, Some(run.status))
            }
        };

        let settled = known_status.is_some_and(|status| !status.is_active());
        if request.wait && !settled {
            let watcher = RunWatcher::new(self.api, &request.repo, self.poll_interval);
            let status = watcher.wait_until_settled(run_number, &budget).await?;
            info!(
                repo = %request.repo,
                run_number,
                %status,
                waited_secs = budget.elapsed().as_secs(),
                "Run finished, fetching logs"
            );
        }

        fetch_logs(self.api, &request.repo, run_number).await
    }

    /// Resolves a selector against the recent runs of one workflow
    async fn select_run(
        &self, repo: &RepoRef, workflow: &str, selector: RunSelector,
    ) -> ActionsResult<WorkflowRun> {
        let tasks = self.api.list_tasks(repo, &TaskQuery::recent()).await?;
        let (runs, others): (Vec<WorkflowRun>, Vec<WorkflowRun>) = tasks
            .workflow_runs
            .into_iter()
            .partition(|run| run.is_workflow(workflow));

        if runs.is_empty() {
            let mut available: Vec<&str> = others
                .iter()
                .filter_map(|run| run.workflow_id.as_deref())
                .collect();
            available.sort_unstable();
            available.dedup();
            return Err(ActionsError::WorkflowNotFound {
                workflow: workflow.to_string(),
                available: available.join(", "),
            });
        }

        let available_runs = runs
            .iter()
            .map(|run| format!("#{}", run.run_number))
            .collect::<Vec<_>>()
            .join(", ");

        let selected = match selector {
            RunSelector::Latest => runs.into_iter().next(),
            RunSelector::LatestFailure => runs
                .into_iter()
                .find(|run| run.status == RunStatus::Failure),
            RunSelector::Number(number) => runs.into_iter().find(|run| run.run_number == number),
        };

        let run = selected.ok_or_else(|| match selector {
            RunSelector::LatestFailure => ActionsError::NoFailedRuns(workflow.to_string()),
            RunSelector::Number(number) => ActionsError::WorkflowRunNotFound {
                workflow: workflow.to_string(),
                run_number: number,
                available: available_runs,
            },
            RunSelector::Latest => ActionsError::WorkflowNotFound {
                workflow: workflow.to_string(),
                available: String::new(),
            },
        })?;
        debug!(%repo, workflow, ?selector, run_number = run.run_number, "Selected run");
        Ok(run)
    }
}

pub(crate) async fn fetch_logs(
    api: &dyn ActionsApi, repo: &RepoRef, run_number: u64,
) -> ActionsResult<String> {
    let logs = api.job_logs(repo, run_number).await?;
    if logs.trim().is_empty() {
        Ok(NO_LOGS_AVAILABLE.to_string())
    } else {
        Ok(logs)
    }
}
