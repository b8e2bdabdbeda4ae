//! `swhub disconnect`: repeated forced-disconnect passes with progress on stdout.

use std::time::Duration;

use swhub_api::{DisconnectOutcome, DisconnectPolicy};
use swhub_config::Connection;

use crate::cli::DisconnectArgs;
use crate::config::build_client;
use crate::error::CliError;
use crate::output::print_output;

const RULE: &str = "============================================================";

pub async fn handle(args: &DisconnectArgs, conn: &Connection) -> Result<(), CliError> {
    let client = build_client(conn);
    let policy = DisconnectPolicy {
        passes: args.passes,
        pause: Duration::from_millis(args.pause_ms),
    };

    print_output(&format!("{RULE}\nForcing session disconnect on {}\n{RULE}", conn.base_url));

    let outcomes = client
        .force_disconnect_repeated(&policy, |pass, outcome| {
            print_output(&format!("Pass {pass}/{}: {}", policy.passes, outcome.status_line()));
        })
        .await;

    let released = outcomes
        .iter()
        .filter(|o| **o == DisconnectOutcome::Released)
        .count();
    print_output(&format!(
        "{RULE}\nDone: {released}/{} passes confirmed by the switch\n{RULE}",
        outcomes.len()
    ));
    Ok(())
}
