use std::collections::HashMap;
use std::fmt;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Maximum page size accepted by the Gitea tasks endpoint
pub const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failure,
    Cancelled,
    Running,
    Waiting,
    Blocked,
    Skipped,
    Pending,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// The statuses a run can be filtered by and counted under
    pub const REPORTED: [RunStatus; 7] = [
        RunStatus::Success,
        RunStatus::Failure,
        RunStatus::Cancelled,
        RunStatus::Running,
        RunStatus::Waiting,
        RunStatus::Blocked,
        RunStatus::Skipped,
    ];

    /// Whether the run has not reached a final state yet
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RunStatus::Running | RunStatus::Waiting | RunStatus::Pending
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failure => "failure",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Running => "running",
            RunStatus::Waiting => "waiting",
            RunStatus::Blocked => "blocked",
            RunStatus::Skipped => "skipped",
            RunStatus::Pending => "pending",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        RunStatus::REPORTED
            .iter()
            .chain(std::iter::once(&RunStatus::Pending))
            .find(|status| status.as_str() == normalized)
            .copied()
            .ok_or_else(|| format!("Unknown run status: {}", s))
    }
}

/// Owner/name pair identifying a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A workflow run as returned by the actions tasks endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: i64,
    pub run_number: u64,
    pub status: RunStatus,
    /// Workflow file name, e.g. `build.yml`
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_title: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub head_branch: Option<String>,
    #[serde(default)]
    pub head_sha: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub run_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub run_finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WorkflowRun {
    /// Whole seconds between start and finish, if both are known and ordered
    pub fn duration_seconds(&self) -> Option<i64> {
        let started = self.run_started_at?;
        let finished = self.run_finished_at?;
        let millis = (finished - started).num_milliseconds();
        if millis < 0 {
            return None;
        }
        Some((millis + 500) / 1000)
    }

    pub fn is_workflow(&self, workflow: &str) -> bool {
        self.workflow_id.as_deref() == Some(workflow)
    }
}

/// Response body of `GET /repos/{owner}/{repo}/actions/tasks`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskList {
    #[serde(default)]
    pub workflow_runs: Vec<WorkflowRun>,
    #[serde(default)]
    pub total_count: u64,
}

impl TaskList {
    pub fn find_run_number(&self, run_number: u64) -> Option<&WorkflowRun> {
        self.workflow_runs
            .iter()
            .find(|run| run.run_number == run_number)
    }

    pub fn find_id(&self, id: i64) -> Option<&WorkflowRun> {
        self.workflow_runs.iter().find(|run| run.id == id)
    }
}

/// Query parameters for the tasks endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub page: Option<u32>,
    pub limit: u32,
    pub status: Option<RunStatus>,
}

impl TaskQuery {
    /// The most recent page of runs, as large as the server allows
    pub fn recent() -> Self {
        Self {
            page: None,
            limit: MAX_PAGE_SIZE,
            status: None,
        }
    }

    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: limit.min(MAX_PAGE_SIZE),
            status: None,
        }
    }

    pub fn with_status(mut self, status: Option<RunStatus>) -> Self {
        self.status = status;
        self
    }
}

/// Body of `POST /repos/{owner}/{repo}/actions/workflows/{workflow}/dispatches`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    #[serde(rename = "ref")]
    pub git_ref: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub inputs: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_list_deserialization() {
        let body = r#"{
            "workflow_runs": [
                {
                    "id": 812,
                    "run_number": 31,
                    "status": "running",
                    "workflow_id": "build.yml",
                    "name": "build",
                    "head_branch": "main",
                    "created_at": "2024-05-01T10:00:00Z",
                    "run_started_at": "2024-05-01T10:00:05Z",
                    "run_finished_at": null
                },
                { "id": 811, "run_number": 30, "status": "queued" }
            ],
            "total_count": 2
        }"#;

        let list: TaskList = serde_json::from_str(body).unwrap();
        assert_eq!(list.total_count, 2);
        assert_eq!(list.workflow_runs[0].status, RunStatus::Running);
        assert_eq!(list.workflow_runs[1].status, RunStatus::Unknown);
        assert!(list.find_run_number(31).unwrap().is_workflow("build.yml"));
        assert!(list.find_id(999).is_none());
    }

    #[test]
    fn test_empty_task_list() {
        let list: TaskList = serde_json::from_str("{}").unwrap();
        assert!(list.workflow_runs.is_empty());
        assert_eq!(list.total_count, 0);
    }

    #[test]
    fn test_active_statuses() {
        assert!(RunStatus::Running.is_active());
        assert!(RunStatus::Waiting.is_active());
        assert!(RunStatus::Pending.is_active());
        for status in [
            RunStatus::Success,
            RunStatus::Failure,
            RunStatus::Cancelled,
            RunStatus::Blocked,
            RunStatus::Skipped,
        ] {
            assert!(!status.is_active(), "{} should be final", status);
        }
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("Failure".parse::<RunStatus>(), Ok(RunStatus::Failure));
        assert_eq!("pending".parse::<RunStatus>(), Ok(RunStatus::Pending));
        assert!("queued".parse::<RunStatus>().is_err());
    }

    #[test]
    fn test_duration_seconds() {
        let mut run: WorkflowRun = serde_json::from_value(serde_json::json!({
            "id": 1,
            "run_number": 1,
            "status": "success",
            "run_started_at": "2024-05-01T10:00:00Z",
            "run_finished_at": "2024-05-01T10:01:30.600Z"
        }))
        .unwrap();
        assert_eq!(run.duration_seconds(), Some(91));

        run.run_finished_at = Some("2024-05-01T09:00:00Z".parse().unwrap());
        assert_eq!(run.duration_seconds(), None);

        run.run_finished_at = None;
        assert_eq!(run.duration_seconds(), None);
    }

    #[test]
    fn test_dispatch_request_omits_empty_inputs() {
        let request = DispatchRequest {
            git_ref: "main".to_string(),
            inputs: HashMap::new(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "ref": "main" })
        );
    }

    #[test]
    fn test_page_query_clamps_limit() {
        assert_eq!(TaskQuery::page(1, 200).limit, MAX_PAGE_SIZE);
        assert_eq!(TaskQuery::recent().page, None);
    }
}
