//! Workflow dispatch, optionally following the triggered run to completion

use std::collections::HashMap;

use chrono::{
    DateTime,
    Utc,
};
use gitea_tools_api::{
    ActionsApi,
    ActionsError,
    ActionsResult,
    DispatchRequest,
    RepoRef,
    TaskQuery,
    WorkflowRun,
};
use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    info,
};

use super::job_logs::fetch_logs;
use super::watch::{
    timeout_from_secs,
    Budget,
    RunWatcher,
};
use super::{
    repo_ref,
    PollTiming,
};

const DEFAULT_REF: &str = "main";
/// Runs created this long before the dispatch still count as the triggered run
const DISPATCH_CLOCK_SKEW_SECS: i64 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchArgs {
    pub owner: String,
    pub repo: String,
    /// Workflow file name, e.g. `build.yml`
    pub workflow: String,
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub inputs: HashMap<String, String>,
    #[serde(default)]
    pub wait: bool,
    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct DispatchAck {
    pub success: bool,
    pub message: String,
    pub owner: String,
    pub repo: String,
    pub workflow: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub inputs: HashMap<String, String>,
}

#[derive(Debug)]
pub enum DispatchOutcome {
    /// Dispatch accepted, not followed
    Triggered(DispatchAck),
    /// Header plus the log text of the finished run
    Completed(String),
}

pub struct WorkflowDispatcher<'a> {
    api: &'a dyn ActionsApi,
    timing: PollTiming,
}

impl<'a> WorkflowDispatcher<'a> {
    pub fn new(api: &'a dyn ActionsApi, timing: PollTiming) -> Self {
        Self { api, timing }
    }

    pub async fn dispatch(&self, args: &DispatchArgs) -> ActionsResult<DispatchOutcome> {
        let repo = repo_ref(&args.owner, &args.repo)?;
        let workflow = args.workflow.trim();
        if workflow.is_empty() {
            return Err(ActionsError::InvalidInput(
                "workflow must not be empty".to_string(),
            ));
        }
        let timeout = timeout_from_secs(args.timeout)?;
        let git_ref = args
            .git_ref
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REF)
            .to_string();

        let request = DispatchRequest {
            git_ref: git_ref.clone(),
            inputs: args.inputs.clone(),
        };

        let dispatched_at = Utc::now();
        let budget = Budget::start(timeout);
        self.api
            .dispatch_workflow(&repo, workflow, &request)
            .await?;
        info!(%repo, workflow, git_ref = %git_ref, "Workflow dispatched");

        if !args.wait {
            return Ok(DispatchOutcome::Triggered(DispatchAck {
                success: true,
                message: format!(
                    "Workflow '{}' triggered successfully on ref '{}'",
                    workflow, git_ref
                ),
                owner: repo.owner,
                repo: repo.repo,
                workflow: workflow.to_string(),
                git_ref,
                inputs: request.inputs,
            }));
        }

        tokio::time::sleep(self.timing.dispatch_grace).await;
        let run = self
            .find_dispatched_run(&repo, workflow, dispatched_at, &budget)
            .await?;
        let run_number = run.run_number;

        let status = RunWatcher::new(self.api, &repo, self.timing.status_interval)
            .follow(run_number, run.status, &budget)
            .await?;
        info!(%repo, workflow, run_number, %status, "Dispatched run finished");

        let logs = fetch_logs(self.api, &repo, run_number).await?;

        Ok(DispatchOutcome::Completed(format!(
            "=== Workflow '{}' triggered successfully ===\n=== Run #{}, Status: {} ===\n\n{}",
            workflow, run_number, status, logs
        )))
    }

    /// Newest run of `workflow` created around or after the dispatch
    async fn find_dispatched_run(
        &self, repo: &RepoRef, workflow: &str, dispatched_at: DateTime<Utc>, budget: &Budget,
    ) -> ActionsResult<WorkflowRun> {
        let not_before = dispatched_at - chrono::Duration::seconds(DISPATCH_CLOCK_SKEW_SECS);

        loop {
            let tasks = self.api.list_tasks(repo, &TaskQuery::recent()).await?;
            let newest = tasks
                .workflow_runs
                .into_iter()
                .filter(|run| run.is_workflow(workflow))
                .filter(|run| run.created_at.is_some_and(|c| c >= not_before))
                .max_by_key(|run| run.created_at);

            if let Some(run) = newest {
                debug!(%repo, workflow, run_number = run.run_number, "Found dispatched run");
                return Ok(run);
            }
            if budget.is_spent() {
                return Err(ActionsError::DispatchedRunNotFound(workflow.to_string()));
            }

            tokio::time::sleep(self.timing.dispatch_lookup_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use gitea_tools_api::RunStatus;

    use super::*;
    use crate::tools::job_logs::NO_LOGS_AVAILABLE;
    use crate::tools::testing::{
        created,
        run,
        tasks,
        FakeActions,
    };

    fn args(wait: bool, timeout: Option<u64>) -> DispatchArgs {
        DispatchArgs {
            owner: "homelab".to_string(),
            repo: "infra".to_string(),
            workflow: "build.yml".to_string(),
            git_ref: None,
            inputs: HashMap::new(),
            wait,
            timeout,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_without_wait() {
        let api = FakeActions::new();
        let dispatcher = WorkflowDispatcher::new(&api, PollTiming::default());

        let mut args = args(false, None);
        args.inputs
            .insert("image_tag".to_string(), "v1.2.3".to_string());
        let outcome = dispatcher.dispatch(&args).await.unwrap();

        let DispatchOutcome::Triggered(ack) = outcome else {
            panic!("expected an acknowledgement");
        };
        assert!(ack.success);
        assert_eq!(ack.git_ref, "main");
        assert_eq!(
            ack.message,
            "Workflow 'build.yml' triggered successfully on ref 'main'"
        );
        assert_eq!(api.dispatch_calls(), 1);
        assert_eq!(api.task_calls(), 0);

        let (workflow, request) = api.last_dispatch.lock().unwrap().clone().unwrap();
        assert_eq!(workflow, "build.yml");
        assert_eq!(request.inputs.get("image_tag").map(String::as_str), Some("v1.2.3"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_wait_follows_new_run() {
        let now = Utc::now();
        let stale = created(run(40, 4, RunStatus::Success), now - chrono::Duration::hours(1));
        let fresh = |status| created(run(41, 5, status), now);

        let api = FakeActions::new()
            .with_tasks(vec![
                tasks(vec![stale.clone()]),
                tasks(vec![fresh(RunStatus::Running), stale.clone()]),
                tasks(vec![fresh(RunStatus::Running), stale.clone()]),
                tasks(vec![fresh(RunStatus::Success), stale]),
            ])
            .with_logs("compiled\n");
        let dispatcher = WorkflowDispatcher::new(&api, PollTiming::default());

        let outcome = dispatcher.dispatch(&args(true, None)).await.unwrap();

        let DispatchOutcome::Completed(text) = outcome else {
            panic!("expected completed run output");
        };
        assert!(text.starts_with("=== Workflow 'build.yml' triggered successfully ===\n"));
        assert!(text.contains("=== Run #5, Status: success ==="));
        assert!(text.ends_with("compiled\n"));
        assert_eq!(api.task_calls(), 4);
        assert_eq!(api.log_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_wait_finished_run_with_blank_logs() {
        let api = FakeActions::new()
            .with_tasks(vec![tasks(vec![created(
                run(41, 5, RunStatus::Failure),
                Utc::now(),
            )])])
            .with_logs("  ");
        let dispatcher = WorkflowDispatcher::new(&api, PollTiming::default());

        let outcome = dispatcher.dispatch(&args(true, None)).await.unwrap();

        let DispatchOutcome::Completed(text) = outcome else {
            panic!("expected completed run output");
        };
        assert!(text.contains("Status: failure"));
        assert!(text.ends_with(NO_LOGS_AVAILABLE));
        assert_eq!(api.task_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_wait_times_out_with_run_number() {
        let api = FakeActions::new().with_tasks(vec![tasks(vec![created(
            run(41, 5, RunStatus::Running),
            Utc::now(),
        )])]);
        let dispatcher = WorkflowDispatcher::new(&api, PollTiming::default());

        let err = dispatcher
            .dispatch(&args(true, Some(20)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ActionsError::Timeout {
                run_number: Some(5),
                last_status: RunStatus::Running,
                ..
            }
        ));
        assert_eq!(api.log_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_wait_rides_out_status_gaps() {
        let now = Utc::now();
        let fresh = |status| created(run(41, 5, status), now);

        let api = FakeActions::new()
            .with_tasks(vec![
                tasks(vec![fresh(RunStatus::Running)]),
                tasks(vec![]),
                tasks(vec![fresh(RunStatus::Running)]),
                tasks(vec![fresh(RunStatus::Success)]),
            ])
            .with_failing_task_calls(&[2], 502)
            .with_logs("deployed\n");
        let dispatcher = WorkflowDispatcher::new(&api, PollTiming::default());

        let outcome = dispatcher.dispatch(&args(true, None)).await.unwrap();

        let DispatchOutcome::Completed(text) = outcome else {
            panic!("expected completed run output");
        };
        assert!(text.contains("=== Run #5, Status: success ==="));
        // lookup, 502, missing from window, running, success
        assert_eq!(api.task_calls(), 5);
        assert_eq!(api.log_runs(), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_wait_gaps_still_time_out() {
        let api = FakeActions::new()
            .with_tasks(vec![
                tasks(vec![created(run(41, 5, RunStatus::Waiting), Utc::now())]),
                tasks(vec![]),
            ]);
        let dispatcher = WorkflowDispatcher::new(&api, PollTiming::default());

        let err = dispatcher
            .dispatch(&args(true, Some(20)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ActionsError::Timeout {
                run_number: Some(5),
                last_status: RunStatus::Waiting,
                ..
            }
        ));
        assert_eq!(api.log_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatched_run_never_appears() {
        let api = FakeActions::new();
        let dispatcher = WorkflowDispatcher::new(&api, PollTiming::default());

        let err = dispatcher
            .dispatch(&args(true, Some(10)))
            .await
            .unwrap_err();

        assert!(matches!(err, ActionsError::DispatchedRunNotFound(ref w) if w == "build.yml"));
        assert_eq!(api.task_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_rejected() {
        let api = FakeActions::new().with_dispatch_error(422);
        let dispatcher = WorkflowDispatcher::new(&api, PollTiming::default());

        let err = dispatcher.dispatch(&args(true, None)).await.unwrap_err();

        assert!(matches!(err, ActionsError::Http { status: 422, .. }));
        assert_eq!(api.task_calls(), 0);
    }
}
