//! Command-line surface: argument parsing and the program boundary where
//! file config, `.env` values and the process environment are combined.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::config::{load_env_file, overlay_lookup, Config, Settings, DEFAULT_ENV_FILE};
use crate::deployment::{DeployReport, Deployer};
use crate::diagnose;
use crate::report::{ConfigBanner, ConfigFailure, DeploySummary, DiagnosticsSummary};
use crate::teamcity_client::TeamCityClient;
use crate::types::DeployError;

#[derive(Parser, Debug)]
#[command(
    name = "tc-settings-sync",
    version,
    about = "Enable TeamCity versioned settings and wait for the import to land"
)]
pub struct Cli {
    /// JSON config file (defaults to ./tc-sync.json when present).
    #[arg(long, global = true, env = "TC_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// KEY=value file read before the process environment.
    #[arg(long, global = true, default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the VCS root, enable versioned settings and confirm the import.
    Deploy(DeployArgs),

    /// Print VCS roots, project features, projects and build configurations.
    Diagnose,
}

#[derive(Args, Debug, Default)]
pub struct DeployArgs {
    /// Seconds to wait for the marker project.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Seconds between inventory polls.
    #[arg(long)]
    pub interval: Option<u64>,

    /// Rewrite an existing versioned-settings feature that points elsewhere.
    #[arg(long)]
    pub repoint: bool,
}

/// Run the parsed command and return the process exit code.
pub async fn execute(cli: Cli) -> u8 {
    let command = cli.command.unwrap_or(Command::Deploy(DeployArgs::default()));

    let settings = match resolve_settings(cli.config, &cli.env_file, &command).await {
        Ok(settings) => settings,
        Err(err) if matches!(command, Command::Diagnose) => {
            print!("{}", ConfigFailure(&err));
            return 1;
        }
        Err(err) => {
            let report = DeployReport::configuration_failure(err);
            print!(
                "{}",
                DeploySummary {
                    report: &report,
                    server_url: "",
                }
            );
            return report.exit_code();
        }
    };
    println!("{}", ConfigBanner(&settings));

    match command {
        Command::Deploy(_) => run_deploy(settings).await,
        Command::Diagnose => run_diagnose(settings).await,
    }
}

async fn resolve_settings(
    config_path: Option<PathBuf>,
    env_file: &std::path::Path,
    command: &Command,
) -> Result<Settings, DeployError> {
    let mut config = Config::load(config_path.as_deref()).await?;
    if let Command::Deploy(args) = command {
        if let Some(timeout) = args.timeout {
            config.poll_timeout_secs = timeout;
        }
        if let Some(interval) = args.interval {
            config.poll_interval_secs = interval;
        }
        config.repoint_existing |= args.repoint;
    }
    let file_values = load_env_file(env_file).await?;
    Settings::resolve(config, overlay_lookup(file_values))
}

async fn run_deploy(settings: Settings) -> u8 {
    let server_url = settings.server_url.clone();
    let report = match Deployer::new(settings) {
        Ok(deployer) => deployer.run().await,
        Err(err) => DeployReport::configuration_failure(err),
    };
    info!(outcome = ?report.outcome(), "Deployment finished");
    print!(
        "{}",
        DeploySummary {
            report: &report,
            server_url: &server_url,
        }
    );
    report.exit_code()
}

async fn run_diagnose(settings: Settings) -> u8 {
    let client = match TeamCityClient::new(&settings) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let diagnostics = diagnose::collect(&client, &settings.root_project_id).await;
    print!("{}", DiagnosticsSummary(&diagnostics));
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_parses_without_subcommand() {
        let cli = Cli::try_parse_from(["tc-settings-sync"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.env_file, PathBuf::from(".env"));
    }

    #[test]
    fn deploy_flags_parse() {
        let cli = Cli::try_parse_from([
            "tc-settings-sync",
            "deploy",
            "--timeout",
            "30",
            "--interval",
            "5",
            "--repoint",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Deploy(args)) => {
                assert_eq!(args.timeout, Some(30));
                assert_eq!(args.interval, Some(5));
                assert!(args.repoint);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
