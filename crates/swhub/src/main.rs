mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Some(Command::Completions(args)) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "swhub", &mut std::io::stdout());
            Ok(())
        }

        Some(Command::Disconnect(args)) => {
            let conn = config::resolve_connection(&cli.global)?;
            commands::disconnect::handle(&args, &conn).await
        }

        None => {
            let request = commands::fetch::request_from(&cli.select, cli.output.summary);
            // Nothing selected: show usage instead of logging in for nothing.
            if request.is_empty() {
                Cli::command().print_help()?;
                return Ok(());
            }

            let conn = config::resolve_connection(&cli.global)?;
            tracing::debug!(switch = %conn.base_url, "resolved connection");
            commands::fetch::handle(&request, &conn, &cli.output).await
        }
    }
}
