//! Poll-with-timeout over the recent tasks window

use std::time::Duration;

use gitea_tools_api::{
    ActionsApi,
    ActionsError,
    ActionsResult,
    RepoRef,
    RunStatus,
    TaskQuery,
    MAX_PAGE_SIZE,
};
use tokio::time::Instant;
use tracing::{
    debug,
    warn,
};

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Wall-clock budget for one tool invocation
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    started: Instant,
    timeout: Duration,
}

impl Budget {
    pub(crate) fn start(timeout: Duration) -> Self {
        Self {
            started: Instant::now(),
            timeout,
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub(crate) fn is_spent(&self) -> bool {
        self.elapsed() >= self.timeout
    }
}

pub(crate) fn timeout_from_secs(timeout: Option<u64>) -> ActionsResult<Duration> {
    match timeout.unwrap_or(DEFAULT_TIMEOUT_SECS) {
        0 => Err(ActionsError::InvalidInput(
            "timeout must be a positive number of seconds".to_string(),
        )),
        secs => Ok(Duration::from_secs(secs)),
    }
}

pub(crate) struct RunWatcher<'a> {
    api: &'a dyn ActionsApi,
    repo: &'a RepoRef,
    interval: Duration,
}

impl<'a> RunWatcher<'a> {
    pub(crate) fn new(api: &'a dyn ActionsApi, repo: &'a RepoRef, interval: Duration) -> Self {
        Self {
            api,
            repo,
            interval,
        }
    }

    /// Current status of a run, looked up by number in the recent window
    pub(crate) async fn status(&self, run_number: u64) -> ActionsResult<RunStatus> {
        let tasks = self.api.list_tasks(self.repo, &TaskQuery::recent()).await?;
        tasks
            .find_run_number(run_number)
            .map(|run| run.status)
            .ok_or_else(|| ActionsError::RunNotFound {
                owner: self.repo.owner.clone(),
                repo: self.repo.repo.clone(),
                run_number,
                window: MAX_PAGE_SIZE,
            })
    }

    /// Polls until the run leaves running/waiting/pending or the budget is spent.
    ///
    /// Returns the final status. A run that is missing from the recent window
    /// ends the wait with `RunNotFound`.
    pub(crate) async fn wait_until_settled(
        &self, run_number: u64, budget: &Budget,
    ) -> ActionsResult<RunStatus> {
        let mut polls = 0u32;
        loop {
            let status = self.status(run_number).await?;
            polls += 1;

            if !status.is_active() {
                debug!(repo = %self.repo, run_number, %status, polls, "Run settled");
                return Ok(status);
            }

            if let Some(err) = self.timed_out(run_number, status, budget, None) {
                return Err(err);
            }

            debug!(repo = %self.repo, run_number, %status, polls, "Run still active");
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Follows a run whose status is already known, sleeping before each check.
    ///
    /// Unlike `wait_until_settled`, a failed status response or a run briefly
    /// missing from the window keeps the last known status and polling goes on
    /// until the budget is spent. Timeouts carry the run number.
    pub(crate) async fn follow(
        &self, run_number: u64, mut status: RunStatus, budget: &Budget,
    ) -> ActionsResult<RunStatus> {
        while status.is_active() {
            if let Some(err) = self.timed_out(run_number, status, budget, Some(run_number)) {
                return Err(err);
            }

            tokio::time::sleep(self.interval).await;
            match self.status(run_number).await {
                Ok(current) => status = current,
                Err(
                    err @ (ActionsError::Http { .. }
                    | ActionsError::Network(_)
                    | ActionsError::RunNotFound { .. }),
                ) => {
                    warn!(
                        repo = %self.repo,
                        run_number,
                        %status,
                        error = %err,
                        "Status check failed, keeping last status"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        debug!(repo = %self.repo, run_number, %status, "Followed run settled");
        Ok(status)
    }

    fn timed_out(
        &self, run_number: u64, status: RunStatus, budget: &Budget, reported: Option<u64>,
    ) -> Option<ActionsError> {
        let elapsed = budget.elapsed();
        if elapsed < budget.timeout {
            return None;
        }

        warn!(
            repo = %self.repo,
            run_number,
            %status,
            elapsed_secs = elapsed.as_secs(),
            "Timed out waiting for run"
        );
        Some(ActionsError::Timeout {
            elapsed_secs: elapsed.as_secs(),
            last_status: status,
            run_number: reported,
        })
    }
}
