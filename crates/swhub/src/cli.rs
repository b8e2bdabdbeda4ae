//! Clap derive structures for the `swhub` CLI.
//!
//! Shared with `build.rs` for man page generation, so this file may only
//! depend on clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

const AFTER_HELP: &str = "\
Connection settings are read from the env file (default .env):
  SWITCH_IP=192.168.1.10
  SWITCH_USER=admin
  SWITCH_PASSWORD=your_password
Optional: SWITCH_TIMEOUT (s), SWITCH_MAX_ATTEMPTS, SWITCH_RETRY_DELAY_MS.
Command-line flags take precedence over the file.

Examples:
  swhub --env-file .env.office-floor1 --mac --pretty
  swhub --all --summary
  swhub disconnect";

// ── Top-Level CLI ────────────────────────────────────────────────────

/// swhub -- read port, VLAN and MAC tables from an ELECOM-class switch
#[derive(Debug, Parser)]
#[command(
    name = "swhub",
    version,
    about = "Read status from ELECOM-class managed switches through their web UI",
    long_about = "Logs into the switch's web management interface the way a browser \
        does, queries the requested tables and prints them as JSON.\n\n\
        The switch allows a single management session; a login refused \
        because an older session is still held is retried with backoff.",
    after_help = AFTER_HELP,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub select: Selection,

    #[command(flatten)]
    pub output: OutputOpts,

    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Option<Command>,
}

// ── Data selection ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Args)]
#[command(next_help_heading = "Data")]
#[allow(clippy::struct_excessive_bools)]
pub struct Selection {
    /// Port link status (panel_info)
    #[arg(long)]
    pub status: bool,

    /// Port settings and panel layout
    #[arg(long)]
    pub port: bool,

    /// VLAN port settings, configuration and membership
    #[arg(long)]
    pub vlan: bool,

    /// Dynamic and static MAC address tables
    #[arg(long)]
    pub mac: bool,

    /// Switch identity and basic information
    #[arg(long)]
    pub main: bool,

    /// Traffic counters for every port
    #[arg(long)]
    pub traffic: bool,

    /// Everything above
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Clone, Default, Args)]
#[command(next_help_heading = "Output")]
pub struct OutputOpts {
    /// Indented JSON
    #[arg(long, conflicts_with = "summary")]
    pub pretty: bool,

    /// Human-readable tables instead of JSON; on its own, fetches everything
    #[arg(long)]
    pub summary: bool,

    /// When to color the summary tables
    #[arg(long, value_enum, default_value = "auto")]
    pub color: ColorMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Color if stdout is a terminal and NO_COLOR is unset
    #[default]
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Clone, Args)]
#[command(next_help_heading = "Connection")]
pub struct GlobalOpts {
    /// Switch IP address or host (overrides SWITCH_IP)
    #[arg(long, global = true)]
    pub ip: Option<String>,

    /// Login user (overrides SWITCH_USER)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Login password (overrides SWITCH_PASSWORD)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Env file holding the connection settings
    #[arg(long, global = true, default_value = ".env", value_name = "PATH")]
    pub env_file: PathBuf,

    /// Per-request timeout in seconds [default: 10]
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Login attempts before giving up on a held session [default: 2]
    #[arg(long, global = true, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// First retry delay in milliseconds, doubled per retry [default: 1000]
    #[arg(long, global = true, value_name = "MS")]
    pub retry_delay_ms: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

// ── Subcommands ──────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Force the switch to drop a management session it refuses to release
    Disconnect(DisconnectArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct DisconnectArgs {
    /// Number of disconnect passes
    #[arg(long, default_value_t = 3)]
    pub passes: u32,

    /// Pause after each pass, in milliseconds
    #[arg(long, default_value_t = 1000, value_name = "MS")]
    pub pause_ms: u64,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
