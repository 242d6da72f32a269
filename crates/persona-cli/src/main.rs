use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use persona_common::{
    config::{API_URL_ENV, ClientConfig, TOKEN_PATH_ENV},
    error::{PersonaError, Result},
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "persona", about = "Sort a folder of photos by personality type")]
struct Cli {
    /// Base URL of the classification service.
    #[arg(long, global = true, env = API_URL_ENV)]
    api_url: Option<String>,

    /// Where the login session is stored.
    #[arg(long, global = true, env = TOKEN_PATH_ENV)]
    token_file: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload every image in a folder and download the sorted archive.
    Classify {
        dir: PathBuf,

        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Log in and remember the session.
    Login {
        #[arg(long)]
        username: Option<String>,
    },
    /// Create an account.
    Register,
    /// Forget the stored session.
    Logout,
    /// Show who is logged in.
    Whoami,
}

#[tokio::main]
async fn main() -> std::result::Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter =
        EnvFilter::from_default_env().add_directive(format!("persona={level}").parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", report(&err));
            ExitCode::FAILURE
        }
    })
}

/// Logs a failed command and returns the line shown to the user.
fn report(err: &PersonaError) -> String {
    warn!(error = %err, "command failed");
    err.notice()
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = cli.api_url.as_deref() {
        config = config.with_api_url(api_url)?;
    }
    if let Some(token_file) = cli.token_file {
        config = config.with_token_path(token_file);
    }

    match cli.command {
        Command::Classify { dir, out } => cmd::classify::run(&config, &dir, &out).await.map(drop),
        Command::Login { username } => cmd::account::login(&config, username).await,
        Command::Register => cmd::account::register(&config).await,
        Command::Logout => cmd::account::logout(&config).await,
        Command::Whoami => cmd::account::whoami(&config).await,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::{CommandFactory, Parser};
    use persona_common::error::PersonaError;

    use super::{Cli, Command, report};

    #[test]
    fn command_line_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn every_subcommand_is_described() {
        let cli = Cli::command();
        for sub in cli.get_subcommands() {
            assert!(sub.get_about().is_some(), "{} has no help text", sub.get_name());
        }
    }

    #[test]
    fn classify_takes_folder_and_output() {
        let cli = Cli::try_parse_from([
            "persona",
            "--api-url",
            "http://classifier:8000",
            "classify",
            "photos",
            "--out",
            "sorted",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://classifier:8000"));
        match cli.command {
            Command::Classify { dir, out } => {
                assert_eq!(dir, PathBuf::from("photos"));
                assert_eq!(out, PathBuf::from("sorted"));
            }
            _ => panic!("expected classify"),
        }
    }

    #[test]
    fn classify_writes_to_working_directory_by_default() {
        let cli = Cli::try_parse_from(["persona", "classify", "photos"]).unwrap();
        assert!(matches!(cli.command, Command::Classify { out, .. } if out == PathBuf::from(".")));
    }

    #[test]
    fn failures_are_reported_by_notice() {
        assert_eq!(report(&PersonaError::NotLoggedIn), "Please log in first.");
        assert_eq!(
            report(&PersonaError::Transport("connection refused".to_string())),
            "Error occurred"
        );
        assert_eq!(
            report(&PersonaError::JobFailed("Failed to fetch result.".to_string())),
            "Failed to fetch result."
        );
    }
}
