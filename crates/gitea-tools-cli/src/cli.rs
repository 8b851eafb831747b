use std::collections::HashMap;
use std::io::Read;

use clap::{
    Args,
    Parser,
    Subcommand,
};
use gitea_tools_api::RunStatus;
use gitea_tools_core::tools::dispatch::DispatchArgs;
use gitea_tools_core::tools::job_logs::JobLogsArgs;
use gitea_tools_core::tools::run_detail::RunDetailArgs;
use gitea_tools_core::tools::summary::SummaryArgs;
use gitea_tools_core::tools::workflow_runs::WorkflowRunsArgs;
use gitea_tools_core::{
    ToolCall,
    ToolOutput,
};

#[derive(Parser, Debug)]
#[command(name = "gitea-tools")]
#[command(about = "Inspect and trigger Gitea Actions workflow runs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Gitea base URL (overrides GITEA_HOST)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct RepoArgs {
    /// Repository owner username or organization
    #[arg(short, long)]
    pub owner: String,

    /// Repository name
    #[arg(short, long)]
    pub repo: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the log of a workflow run
    JobLogs {
        #[command(flatten)]
        repo: RepoArgs,

        /// Run number
        #[arg(long, conflicts_with_all = ["workflow", "run_selector"])]
        run_number: Option<u64>,

        /// Workflow file name, e.g. build.yml; picks the run with --run-selector
        #[arg(short, long)]
        workflow: Option<String>,

        /// latest (default), latest-failure or a run number
        #[arg(long, requires = "workflow")]
        run_selector: Option<String>,

        /// Wait for the run to finish first (polls every 5 seconds)
        #[arg(long)]
        wait: bool,

        /// Seconds to wait before giving up (default: 300)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// List recent workflow runs
    Runs {
        #[command(flatten)]
        repo: RepoArgs,

        /// Workflow file name, e.g. build.yml
        #[arg(short, long)]
        workflow: Option<String>,

        #[arg(long)]
        page: Option<u32>,

        /// Page size (default: 10, max: 50)
        #[arg(long)]
        limit: Option<u32>,

        /// success, failure, cancelled, running, waiting, blocked or skipped
        #[arg(long)]
        status: Option<RunStatus>,
    },

    /// Show one workflow run by its ID
    RunDetail {
        #[command(flatten)]
        repo: RepoArgs,

        /// Workflow run ID
        #[arg(long)]
        run_id: i64,
    },

    /// Status breakdown of recent runs
    Summary {
        #[command(flatten)]
        repo: RepoArgs,

        /// Number of runs to analyze (default: 20, max: 50)
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Trigger a workflow dispatch
    Dispatch {
        #[command(flatten)]
        repo: RepoArgs,

        /// Workflow file name, e.g. build.yml
        #[arg(short, long)]
        workflow: String,

        /// Branch, tag or commit (default: main)
        #[arg(long = "ref")]
        git_ref: Option<String>,

        /// Workflow input as KEY=VALUE, repeatable
        #[arg(short, long = "input", value_parser = parse_input)]
        inputs: Vec<(String, String)>,

        /// Wait for the run to finish and print its log
        #[arg(long)]
        wait: bool,

        /// Seconds to wait before giving up (default: 300)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Run a JSON tool call: {"tool": "...", "args": {...}} (reads stdin when omitted)
    Call { json: Option<String> },
}

fn parse_input(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

impl Command {
    /// Converts the subcommand into a tool call, or an error output to print
    pub fn into_call(self) -> Result<ToolCall, ToolOutput> {
        let call = match self {
            Command::JobLogs {
                repo,
                run_number,
                workflow,
                run_selector,
                wait,
                timeout,
            } => ToolCall::JobLogs(JobLogsArgs {
                owner: repo.owner,
                repo: repo.repo,
                run_number,
                workflow,
                run_selector,
                wait,
                timeout,
            }),
            Command::Runs {
                repo,
                workflow,
                page,
                limit,
                status,
            } => ToolCall::WorkflowRuns(WorkflowRunsArgs {
                owner: repo.owner,
                repo: repo.repo,
                workflow,
                page,
                limit,
                status,
            }),
            Command::RunDetail { repo, run_id } => ToolCall::RunDetail(RunDetailArgs {
                owner: repo.owner,
                repo: repo.repo,
                run_id,
            }),
            Command::Summary { repo, limit } => ToolCall::Summary(SummaryArgs {
                owner: repo.owner,
                repo: repo.repo,
                limit,
            }),
            Command::Dispatch {
                repo,
                workflow,
                git_ref,
                inputs,
                wait,
                timeout,
            } => ToolCall::Dispatch(DispatchArgs {
                owner: repo.owner,
                repo: repo.repo,
                workflow,
                git_ref,
                inputs: inputs.into_iter().collect::<HashMap<_, _>>(),
                wait,
                timeout,
            }),
            Command::Call { json } => {
                let input = match json {
                    Some(json) => json,
                    None => read_stdin()?,
                };
                return ToolCall::from_json(&input);
            }
        };
        Ok(call)
    }
}

fn read_stdin() -> Result<String, ToolOutput> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| ToolOutput {
            text: format!("Error: failed to read tool call from stdin: {}", e),
            is_error: true,
        })?;
    Ok(input)
}
