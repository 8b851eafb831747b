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
};
use serde::{
    Deserialize,
    Serialize,
};

use super::repo_ref;

#[derive(Debug, Clone, Deserialize)]
pub struct RunDetailArgs {
    pub owner: String,
    pub repo: String,
    /// Server-assigned run id, not the run number
    pub run_id: i64,
}

#[derive(Debug, Serialize)]
pub struct RunDetail {
    pub workflow_run_id: i64,
    pub run_number: u64,
    pub workflow_id: Option<String>,
    pub name: Option<String>,
    pub display_title: Option<String>,
    pub status: RunStatus,
    pub event: Option<String>,
    pub head_branch: Option<String>,
    pub head_sha: Option<String>,
    pub run_started_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub note: String,
}

pub async fn workflow_run_detail(
    api: &dyn ActionsApi, args: &RunDetailArgs,
) -> ActionsResult<RunDetail> {
    let repo = repo_ref(&args.owner, &args.repo)?;
    let tasks = api.list_tasks(&repo, &TaskQuery::recent()).await?;

    let run = tasks
        .find_id(args.run_id)
        .ok_or(ActionsError::RunIdNotFound(args.run_id))?;

    Ok(RunDetail {
        workflow_run_id: run.id,
        run_number: run.run_number,
        workflow_id: run.workflow_id.clone(),
        name: run.name.clone(),
        display_title: run.display_title.clone(),
        status: run.status,
        event: run.event.clone(),
        head_branch: run.head_branch.clone(),
        head_sha: run.head_sha.clone(),
        run_started_at: run.run_started_at,
        created_at: run.created_at,
        updated_at: run.updated_at,
        url: run.url.clone(),
        note: format!(
            "Use gitea-job-logs with run_number={} to fetch execution logs",
            run.run_number
        ),
    })
}
