//! Binary entry point for the `hcloud-deploy` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;

use hcloud_deploy::{
    ActionConfig, ActionError, CleanOutcome, GithubOutput, HcloudApi, HcloudApiError, Orchestrator,
};

mod cli;

use cli::Cli;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Action(#[from] ActionError<HcloudApiError>),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    match cli {
        Cli::Deploy => run_deploy().await.map(|()| 0),
        Cli::Clean => run_clean().await.map(|()| 0),
    }
}

fn load_orchestrator() -> Result<(ActionConfig, Orchestrator<HcloudApi, GithubOutput>), CliError> {
    let config =
        ActionConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    let provider = HcloudApi::new(&config).map_err(|err| CliError::Config(err.to_string()))?;
    Ok((config, Orchestrator::new(provider, GithubOutput::from_env())))
}

async fn run_deploy() -> Result<(), CliError> {
    let (config, mut orchestrator) = load_orchestrator()?;
    let deployment = orchestrator.deploy(&config).await?;

    let mut stdout = io::stdout();
    writeln!(
        stdout,
        "server {} deployed at {}",
        deployment.server.id, deployment.server.public_ipv4
    )
    .ok();
    if let Some(address) = &deployment.floating_ip {
        writeln!(stdout, "floating IP {address} assigned").ok();
    }
    Ok(())
}

async fn run_clean() -> Result<(), CliError> {
    let (config, orchestrator) = load_orchestrator()?;
    let outcome = orchestrator.clean(&config).await?;

    let mut stdout = io::stdout();
    match outcome {
        CleanOutcome::Skipped => writeln!(stdout, "delete-server disabled; server kept").ok(),
        CleanOutcome::Deleted { server_id } => writeln!(stdout, "server {server_id} deleted").ok(),
    };
    Ok(())
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
