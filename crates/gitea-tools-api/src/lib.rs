//! Shared types for the Gitea Actions tools
//!
//! - `types` - workflow runs, task listings and request bodies
//! - `error` - the error enum every tool operation returns
//! - `api` - the `ActionsApi` trait implemented by the HTTP client

pub mod api;
pub mod error;
pub mod types;

pub use api::ActionsApi;
pub use error::{
    ActionsError,
    ActionsResult,
};
pub use types::{
    DispatchRequest,
    RepoRef,
    RunStatus,
    TaskList,
    TaskQuery,
    WorkflowRun,
    MAX_PAGE_SIZE,
};
