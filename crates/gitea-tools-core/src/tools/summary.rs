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

const DEFAULT_LIMIT: u32 = 20;
const RECENT_RUNS: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryArgs {
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Per-status counts; statuses outside the reported set are not counted
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub success: u64,
    pub failure: u64,
    pub cancelled: u64,
    pub running: u64,
    pub waiting: u64,
    pub blocked: u64,
    pub skipped: u64,
}

impl StatusBreakdown {
    fn record(&mut self, status: RunStatus) {
        let slot = match status {
            RunStatus::Success => &mut self.success,
            RunStatus::Failure => &mut self.failure,
            RunStatus::Cancelled => &mut self.cancelled,
            RunStatus::Running => &mut self.running,
            RunStatus::Waiting => &mut self.waiting,
            RunStatus::Blocked => &mut self.blocked,
            RunStatus::Skipped => &mut self.skipped,
            RunStatus::Pending | RunStatus::Unknown => return,
        };
        *slot += 1;
    }
}

#[derive(Debug, Serialize)]
pub struct RecentRun {
    pub id: i64,
    pub name: Option<String>,
    pub status: RunStatus,
    pub event: Option<String>,
    pub branch: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
}

impl From<&WorkflowRun> for RecentRun {
    fn from(run: &WorkflowRun) -> Self {
        Self {
            id: run.id,
            name: run.name.clone(),
            status: run.status,
            event: run.event.clone(),
            branch: run.head_branch.clone(),
            created_at: run.created_at,
            duration_seconds: run.duration_seconds(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WorkflowSummary {
    pub total_count: u64,
    pub analyzed_runs: usize,
    pub status_breakdown: StatusBreakdown,
    pub recent_runs: Vec<RecentRun>,
}

pub async fn workflow_summary(
    api: &dyn ActionsApi, args: &SummaryArgs,
) -> ActionsResult<WorkflowSummary> {
    let repo = repo_ref(&args.owner, &args.repo)?;
    let limit = args.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_PAGE_SIZE);
    if limit == 0 {
        return Err(ActionsError::InvalidInput("limit must be >= 1".to_string()));
    }

    let tasks = api.list_tasks(&repo, &TaskQuery::page(1, limit)).await?;

    let mut status_breakdown = StatusBreakdown::default();
    for run in &tasks.workflow_runs {
        status_breakdown.record(run.status);
    }

    Ok(WorkflowSummary {
        total_count: tasks.total_count,
        analyzed_runs: tasks.workflow_runs.len(),
        status_breakdown,
        recent_runs: tasks
            .workflow_runs
            .iter()
            .take(RECENT_RUNS)
            .map(RecentRun::from)
            .collect(),
    })
}
