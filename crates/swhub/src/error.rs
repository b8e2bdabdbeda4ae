//! CLI error types with miette diagnostics.
//!
//! Maps `swhub_api::Error` and `swhub_config::ConfigError` into
//! user-facing errors with actionable help text and exit codes.

use miette::Diagnostic;
use thiserror::Error;

use swhub_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Connection settings are incomplete: {fields} not set")]
    #[diagnostic(
        code(swhub::missing_connection),
        help(
            "Pass --ip, --user and --password, or set them in {env_file}:\n  \
             SWITCH_IP=192.168.1.10\n  \
             SWITCH_USER=admin\n  \
             SWITCH_PASSWORD=your_password"
        )
    )]
    MissingConnection { fields: String, env_file: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(swhub::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(swhub::config))]
    Config(Box<figment::Error>),

    #[error("Could not read env file {path}")]
    #[diagnostic(code(swhub::env_file), help("Check the --env-file path and its permissions."))]
    EnvFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ── Device ───────────────────────────────────────────────────────
    #[error("The switch kept refusing the login after {attempts} attempts")]
    #[diagnostic(
        code(swhub::session_conflict),
        help(
            "The switch allows one management session and an older one is still held.\n\
             Log out of the web UI, or run: swhub disconnect\n\
             Waiting longer between attempts may also help: --max-attempts / --retry-delay-ms"
        )
    )]
    SessionConflict {
        attempts: u32,
        #[source]
        source: swhub_api::Error,
    },

    #[error("Could not connect to the switch")]
    #[diagnostic(
        code(swhub::connection_failed),
        help("Check the switch address (--ip / SWITCH_IP) and that its web UI is reachable.")
    )]
    ConnectionFailed {
        #[source]
        source: swhub_api::Error,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(swhub::timeout),
        help("Increase the timeout with --timeout or check the switch's responsiveness.")
    )]
    Timeout { seconds: u64 },

    #[error(transparent)]
    #[diagnostic(code(swhub::device))]
    Device(swhub_api::Error),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render JSON output: {0}")]
    #[diagnostic(code(swhub::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingConnection { .. }
            | Self::Validation { .. }
            | Self::Config(_)
            | Self::EnvFile { .. } => exit_code::USAGE,
            Self::SessionConflict { .. } => exit_code::CONFLICT,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Device(_) | Self::Io(_) | Self::Json(_) => exit_code::GENERAL,
        }
    }

    /// Map a configuration failure, naming the env file in the help text.
    pub fn from_config(err: ConfigError, env_file: &std::path::Path) -> Self {
        match err {
            ConfigError::MissingFields { fields } => Self::MissingConnection {
                fields: fields.join(", "),
                env_file: env_file.display().to_string(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Figment(err) => Self::Config(err),
            ConfigError::Io { path, source } => Self::EnvFile {
                path: path.display().to_string(),
                source,
            },
        }
    }
}

// ── swhub_api::Error → CliError mapping ──────────────────────────────

impl From<swhub_api::Error> for CliError {
    fn from(err: swhub_api::Error) -> Self {
        match err {
            swhub_api::Error::RetriesExhausted { attempts, .. } => Self::SessionConflict {
                attempts,
                source: err,
            },
            swhub_api::Error::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            err if err.is_connect() => Self::ConnectionFailed { source: err },
            err => Self::Device(err),
        }
    }
}
