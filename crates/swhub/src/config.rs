//! CLI-side connection resolution: turns `GlobalOpts` into a flag layer
//! for `swhub_config` and the result into a ready `SwitchClient`.

use swhub_api::{Credentials, RetryPolicy, SwitchClient, TransportConfig};
use swhub_config::{Connection, Settings};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Flag values as the top configuration layer.
fn flag_layer(global: &GlobalOpts) -> Settings {
    Settings {
        ip: global.ip.clone(),
        user: global.user.clone(),
        password: global.password.clone(),
        timeout_secs: global.timeout,
        max_attempts: global.max_attempts,
        retry_delay_ms: global.retry_delay_ms,
    }
}

/// Resolve flags over the env file into a validated connection.
pub fn resolve_connection(global: &GlobalOpts) -> Result<Connection, CliError> {
    swhub_config::resolve(flag_layer(global), &global.env_file)
        .map_err(|e| CliError::from_config(e, &global.env_file))
}

pub fn build_client(conn: &Connection) -> SwitchClient {
    let transport = TransportConfig {
        timeout: conn.timeout,
        ..TransportConfig::default()
    };
    SwitchClient::new(
        conn.base_url.clone(),
        Credentials::new(conn.username.clone(), conn.password.clone()),
    )
    .with_transport(transport)
}

pub fn retry_policy(conn: &Connection) -> RetryPolicy {
    RetryPolicy {
        max_attempts: conn.max_attempts,
        initial_delay: conn.retry_delay,
        ..RetryPolicy::default()
    }
}
