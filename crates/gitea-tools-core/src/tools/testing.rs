//! In-memory `ActionsApi` used by the tool tests

use std::collections::VecDeque;
use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};
use std::sync::Mutex;

use async_trait::async_trait;
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
    RunStatus,
    TaskList,
    TaskQuery,
    WorkflowRun,
};

pub(crate) struct FakeActions {
    task_pages: Mutex<VecDeque<TaskList>>,
    tasks_error: Option<u16>,
    failing_task_calls: Vec<(usize, u16)>,
    logs: String,
    logs_error: Option<u16>,
    dispatch_error: Option<u16>,
    pub(crate) task_calls: AtomicUsize,
    pub(crate) log_calls: AtomicUsize,
    pub(crate) dispatch_calls: AtomicUsize,
    pub(crate) log_runs: Mutex<Vec<u64>>,
    pub(crate) last_query: Mutex<Option<TaskQuery>>,
    pub(crate) last_dispatch: Mutex<Option<(String, DispatchRequest)>>,
}

impl FakeActions {
    pub(crate) fn new() -> Self {
        Self {
            task_pages: Mutex::new(VecDeque::new()),
            tasks_error: None,
            failing_task_calls: Vec::new(),
            logs: String::new(),
            logs_error: None,
            dispatch_error: None,
            task_calls: AtomicUsize::new(0),
            log_calls: AtomicUsize::new(0),
            dispatch_calls: AtomicUsize::new(0),
            log_runs: Mutex::new(Vec::new()),
            last_query: Mutex::new(None),
            last_dispatch: Mutex::new(None),
        }
    }

    /// Pages are served in order; the last one repeats forever
    pub(crate) fn with_tasks(self, pages: Vec<TaskList>) -> Self {
        *self.task_pages.lock().unwrap() = pages.into();
        self
    }

    pub(crate) fn with_tasks_error(mut self, status: u16) -> Self {
        self.tasks_error = Some(status);
        self
    }

    /// Fails the given 1-based listing calls without consuming a page
    pub(crate) fn with_failing_task_calls(mut self, calls: &[usize], status: u16) -> Self {
        self.failing_task_calls = calls.iter().map(|&call| (call, status)).collect();
        self
    }

    pub(crate) fn with_logs(mut self, logs: &str) -> Self {
        self.logs = logs.to_string();
        self
    }

    pub(crate) fn with_logs_error(mut self, status: u16) -> Self {
        self.logs_error = Some(status);
        self
    }

    pub(crate) fn with_dispatch_error(mut self, status: u16) -> Self {
        self.dispatch_error = Some(status);
        self
    }

    pub(crate) fn task_calls(&self) -> usize {
        self.task_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn log_calls(&self) -> usize {
        self.log_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn dispatch_calls(&self) -> usize {
        self.dispatch_calls.load(Ordering::SeqCst)
    }

    /// Run numbers whose logs were requested, in order
    pub(crate) fn log_runs(&self) -> Vec<u64> {
        self.log_runs.lock().unwrap().clone()
    }
}

fn http_error(status: u16) -> ActionsError {
    ActionsError::http(status, "Simulated", "simulated failure")
}

#[async_trait]
impl ActionsApi for FakeActions {
    async fn list_tasks(&self, _repo: &RepoRef, query: &TaskQuery) -> ActionsResult<TaskList> {
        let call = self.task_calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_query.lock().unwrap() = Some(query.clone());

        if let Some(status) = self.tasks_error {
            return Err(http_error(status));
        }
        if let Some(&(_, status)) = self.failing_task_calls.iter().find(|(n, _)| *n == call) {
            return Err(http_error(status));
        }

        let mut pages = self.task_pages.lock().unwrap();
        let page = if pages.len() > 1 {
            pages.pop_front()
        } else {
            pages.front().cloned()
        };
        Ok(page.unwrap_or_default())
    }

    async fn job_logs(&self, _repo: &RepoRef, run_number: u64) -> ActionsResult<String> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        self.log_runs.lock().unwrap().push(run_number);
        match self.logs_error {
            Some(status) => Err(http_error(status)),
            None => Ok(self.logs.clone()),
        }
    }

    async fn dispatch_workflow(
        &self, _repo: &RepoRef, workflow: &str, request: &DispatchRequest,
    ) -> ActionsResult<()> {
        self.dispatch_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_dispatch.lock().unwrap() = Some((workflow.to_string(), request.clone()));
        match self.dispatch_error {
            Some(status) => Err(http_error(status)),
            None => Ok(()),
        }
    }
}

pub(crate) fn run(id: i64, run_number: u64, status: RunStatus) -> WorkflowRun {
    WorkflowRun {
        id,
        run_number,
        status,
        workflow_id: Some("build.yml".to_string()),
        name: Some(format!("build #{}", run_number)),
        display_title: None,
        event: Some("push".to_string()),
        head_branch: Some("main".to_string()),
        head_sha: Some("deadbeef".to_string()),
        url: None,
        created_at: None,
        run_started_at: None,
        run_finished_at: None,
        updated_at: None,
    }
}

pub(crate) fn for_workflow(mut run: WorkflowRun, workflow: &str) -> WorkflowRun {
    run.workflow_id = Some(workflow.to_string());
    run
}

pub(crate) fn created(mut run: WorkflowRun, at: DateTime<Utc>) -> WorkflowRun {
    run.created_at = Some(at);
    run
}

pub(crate) fn tasks(runs: Vec<WorkflowRun>) -> TaskList {
    TaskList {
        total_count: runs.len() as u64,
        workflow_runs: runs,
    }
}

pub(crate) fn repo() -> RepoRef {
    RepoRef::new("homelab", "infra")
}
