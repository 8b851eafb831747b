use chrono::{
    DateTime,
    Utc,
};
use gitea_tools_api::{
    ActionsApi,
    ActionsError,
    ActionsResult,
    RunStatus,
    TaskQuery,
    WorkflowRun,
    MAX_PAGE_SIZE,
};
use serde::{
    Deserialize,
    Serialize,
};

use super::repo_ref;

const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRunsArgs {
    pub owner: String,
    pub repo: String,
    /// Workflow file name to filter by, e.g. `build.yml`
    #[serde(default)]
    pub workflow: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub status: Option<RunStatus>,
}

#[derive(Debug, Serialize)]
pub struct RunListItem {
    pub workflow_run_id: i64,
    pub run_number: u64,
    pub workflow_id: Option<String>,
    pub name: Option<String>,
    pub status: RunStatus,
    pub event: Option<String>,
    pub head_branch: Option<String>,
    pub head_sha: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

impl From<&WorkflowRun> for RunListItem {
    fn from(run: &WorkflowRun) -> Self {
        Self {
            workflow_run_id: run.id,
            run_number: run.run_number,
            workflow_id: run.workflow_id.clone(),
            name: run.name.clone(),
            status: run.status,
            event: run.event.clone(),
            head_branch: run.head_branch.clone(),
            head_sha: run.head_sha.clone(),
            created_at: run.created_at,
            updated_at: run.updated_at,
            url: run.url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunListing {
    pub total_count: u64,
    pub workflow_runs: Vec<RunListItem>,
    pub workflow_filter: String,
    pub summary: String,
}

pub async fn list_workflow_runs(
    api: &dyn ActionsApi, args: &WorkflowRunsArgs,
) -> ActionsResult<RunListing> {
    let repo = repo_ref(&args.owner, &args.repo)?;

    let page = args.page.unwrap_or(1);
    if page == 0 {
        return Err(ActionsError::InvalidInput("page must be >= 1".to_string()));
    }
    let limit = args.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_PAGE_SIZE);
    if limit == 0 {
        return Err(ActionsError::InvalidInput("limit must be >= 1".to_string()));
    }
    if let Some(status) = args.status {
        if !RunStatus::REPORTED.contains(&status) {
            return Err(ActionsError::InvalidInput(format!(
                "status must be one of: {}",
                RunStatus::REPORTED.map(|s| s.as_str()).join(", ")
            )));
        }
    }

    let query = TaskQuery::page(page, limit).with_status(args.status);
    let tasks = api.list_tasks(&repo, &query).await?;

    let listing = match args.workflow.as_deref().filter(|w| !w.is_empty()) {
        Some(workflow) => {
            let runs: Vec<RunListItem> = tasks
                .workflow_runs
                .iter()
                .filter(|run| run.is_workflow(workflow))
                .map(RunListItem::from)
                .collect();
            RunListing {
                total_count: runs.len() as u64,
                summary: format!("Found {} runs for workflow '{}'", runs.len(), workflow),
                workflow_runs: runs,
                workflow_filter: workflow.to_string(),
            }
        }
        None => {
            let total_pages = tasks.total_count.div_ceil(u64::from(limit));
            RunListing {
                total_count: tasks.total_count,
                summary: format!(
                    "Found {} workflow runs (page {}/{})",
                    tasks.total_count, page, total_pages
                ),
                workflow_runs: tasks.workflow_runs.iter().map(RunListItem::from).collect(),
                workflow_filter: "none".to_string(),
            }
        }
    };

    Ok(listing)
}
