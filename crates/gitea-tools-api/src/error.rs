use thiserror::Error;

use crate::types::RunStatus;

/// Maximum number of characters of an HTTP error body kept in messages
pub const ERROR_BODY_SNIPPET_LEN: usize = 500;

/// Actions tool error types
#[derive(Error, Debug)]
pub enum ActionsError {
    #[error("{0} environment variable is not set")]
    MissingCredential(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Run #{run_number} not found in the {window} most recent runs of {owner}/{repo}")]
    RunNotFound {
        owner: String,
        repo: String,
        run_number: u64,
        window: u32,
    },

    #[error("No runs found for workflow '{workflow}'. Available workflows: {available}")]
    WorkflowNotFound {
        workflow: String,
        available: String,
    },

    #[error("No failed runs found for workflow '{0}'")]
    NoFailedRuns(String),

    #[error("Run #{run_number} not found for workflow '{workflow}'. Available runs: {available}")]
    WorkflowRunNotFound {
        workflow: String,
        run_number: u64,
        available: String,
    },

    #[error("Workflow run with ID {0} not found in recent runs. List runs first to find a valid ID.")]
    RunIdNotFound(i64),

    #[error(
        "Workflow run not found after triggering '{0}'. It may have started but the API did not return it yet."
    )]
    DispatchedRunNotFound(String),

    #[error("{status} {reason} - {body}")]
    Http {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{}", timeout_message(.elapsed_secs, .last_status, .run_number))]
    Timeout {
        elapsed_secs: u64,
        last_status: RunStatus,
        run_number: Option<u64>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn timeout_message(elapsed_secs: &u64, last_status: &RunStatus, run_number: &Option<u64>) -> String {
    match run_number {
        Some(number) => format!(
            "Timeout waiting for workflow to complete after {} seconds. Current status: {}. Run number: {}",
            elapsed_secs, last_status, number
        ),
        None => format!(
            "Timeout waiting for job to complete after {} seconds. Current status: {}",
            elapsed_secs, last_status
        ),
    }
}

impl ActionsError {
    /// Builds an HTTP error, truncating the response body to a short snippet
    pub fn http(status: u16, reason: impl Into<String>, body: &str) -> Self {
        ActionsError::Http {
            status,
            reason: reason.into(),
            body: snippet(body),
        }
    }

    /// Whether the error originates from the caller side rather than transport.
    ///
    /// Caller-side errors are reported with a plain `Error:` prefix, transport
    /// errors with the tool-specific prefix.
    pub fn is_caller_side(&self) -> bool {
        matches!(
            self,
            ActionsError::MissingCredential(_)
                | ActionsError::InvalidInput(_)
                | ActionsError::RunNotFound { .. }
                | ActionsError::WorkflowNotFound { .. }
                | ActionsError::NoFailedRuns(_)
                | ActionsError::WorkflowRunNotFound { .. }
                | ActionsError::RunIdNotFound(_)
                | ActionsError::DispatchedRunNotFound(_)
                | ActionsError::Timeout { .. }
        )
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(ERROR_BODY_SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

pub type ActionsResult<T> = Result<T, ActionsError>;

impl From<serde_json::Error> for ActionsError {
    fn from(err: serde_json::Error) -> Self {
        ActionsError::Serialization(err.to_string())
    }
}
