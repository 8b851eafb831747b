mod cli;

use std::process::ExitCode;

use anyhow::anyhow;
use clap::Parser;
use gitea_tools_gitea::GiteaConfig;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    gitea_tools_core::logging::init(cli.verbose);

    let config = GiteaConfig::from_env().with_host(cli.host);
    tracing::debug!("Using Gitea host {}", config.host());

    let output = match cli.command.into_call() {
        Ok(call) => gitea_tools_core::execute(&config, call).await,
        Err(output) => output,
    };

    println!("{}", output.text);

    Ok(if output.is_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
