use async_trait::async_trait;

use crate::error::ActionsResult;
use crate::types::{
    DispatchRequest,
    RepoRef,
    TaskList,
    TaskQuery,
};

/// Remote Gitea Actions API - the seam between the tools and HTTP
#[async_trait]
pub trait ActionsApi: Send + Sync {
    /// List recent workflow runs (`GET .../actions/tasks`)
    async fn list_tasks(&self, repo: &RepoRef, query: &TaskQuery) -> ActionsResult<TaskList>;

    /// Fetch the plain-text log for a run (`GET .../actions/jobs/{run_number}/logs`)
    async fn job_logs(&self, repo: &RepoRef, run_number: u64) -> ActionsResult<String>;

    /// Trigger a workflow dispatch event
    async fn dispatch_workflow(
        &self, repo: &RepoRef, workflow: &str, request: &DispatchRequest,
    ) -> ActionsResult<()>;
}
