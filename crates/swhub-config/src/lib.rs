//! Connection settings for swhub.
//!
//! Reads `.env`-style `KEY=VALUE` files, layers command-line values over
//! them with figment, and validates the result into a [`Connection`].
//! Precedence is flag > env file > built-in default.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use figment::{Figment, providers::Serialized};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

// ── Keys ────────────────────────────────────────────────────────────

pub const KEY_IP: &str = "SWITCH_IP";
pub const KEY_USER: &str = "SWITCH_USER";
pub const KEY_PASSWORD: &str = "SWITCH_PASSWORD";
pub const KEY_TIMEOUT: &str = "SWITCH_TIMEOUT";
pub const KEY_MAX_ATTEMPTS: &str = "SWITCH_MAX_ATTEMPTS";
pub const KEY_RETRY_DELAY_MS: &str = "SWITCH_RETRY_DELAY_MS";

pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing connection settings: {}", .fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Env file ────────────────────────────────────────────────────────

/// Parse `KEY=VALUE` lines.
///
/// Blank lines, `#` comments and lines without `=` are skipped. The first
/// `=` splits key from value; both sides are trimmed. Later duplicates win.
pub fn parse_env(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .collect()
}

/// Read and parse an env file. A file that does not exist reads as empty.
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(parse_env(&contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Settings layer ──────────────────────────────────────────────────

/// One layer of connection settings. Absent fields never override a
/// lower layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
}

impl Settings {
    /// Built-in tuning defaults. Connection fields have none.
    pub fn builtin() -> Self {
        Self {
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            retry_delay_ms: Some(DEFAULT_RETRY_DELAY_MS),
            ..Self::default()
        }
    }

    /// Build a layer from parsed env-file variables. Unknown keys are
    /// ignored; empty values count as absent.
    pub fn from_env_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).filter(|v| !v.is_empty()).cloned();
        Ok(Self {
            ip: get(KEY_IP),
            user: get(KEY_USER),
            password: get(KEY_PASSWORD),
            timeout_secs: parse_number(KEY_TIMEOUT, get(KEY_TIMEOUT))?,
            max_attempts: parse_number(KEY_MAX_ATTEMPTS, get(KEY_MAX_ATTEMPTS))?,
            retry_delay_ms: parse_number(KEY_RETRY_DELAY_MS, get(KEY_RETRY_DELAY_MS))?,
        })
    }

    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_env_vars(&load_env_file(path)?)
    }

    /// Drop empty strings so `--ip ""` falls through to the file.
    fn without_blanks(self) -> Self {
        let keep = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            ip: keep(self.ip),
            user: keep(self.user),
            password: keep(self.password),
            ..self
        }
    }

    /// Validate a fully merged layer.
    pub fn into_connection(self) -> Result<Connection, ConfigError> {
        let mut missing = Vec::new();
        if self.ip.is_none() {
            missing.push(KEY_IP);
        }
        if self.user.is_none() {
            missing.push(KEY_USER);
        }
        if self.password.is_none() {
            missing.push(KEY_PASSWORD);
        }
        let (Some(ip), Some(username), Some(password)) = (self.ip, self.user, self.password)
        else {
            return Err(ConfigError::MissingFields { fields: missing });
        };

        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: KEY_TIMEOUT.into(),
                reason: "must be at least 1 second".into(),
            });
        }
        let max_attempts = self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if max_attempts == 0 {
            return Err(ConfigError::Validation {
                field: KEY_MAX_ATTEMPTS.into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(Connection {
            base_url: base_url(&ip)?,
            username,
            password: SecretString::from(password),
            timeout: Duration::from_secs(timeout_secs),
            max_attempts,
            retry_delay: Duration::from_millis(self.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS)),
        })
    }
}

fn parse_number<T: FromStr>(key: &str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value.parse::<T>().map_err(|e| ConfigError::Validation {
            field: key.into(),
            reason: format!("'{value}' is not a valid number ({e})"),
        })
    })
    .transpose()
}

/// `192.168.1.10` becomes `http://192.168.1.10/`; explicit schemes are kept.
fn base_url(host: &str) -> Result<Url, ConfigError> {
    let raw = if host.contains("://") {
        host.to_owned()
    } else {
        format!("http://{host}")
    };
    let invalid = |reason: String| ConfigError::Validation {
        field: KEY_IP.into(),
        reason,
    };

    let url = Url::parse(&raw).map_err(|e| invalid(format!("'{host}' is not a valid host ({e})")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid(format!("'{host}' has no host")));
    }
    Ok(url)
}

// ── Resolution ──────────────────────────────────────────────────────

/// Validated connection parameters for one switch.
#[derive(Debug, Clone)]
pub struct Connection {
    pub base_url: Url,
    pub username: String,
    pub password: SecretString,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

/// Merge built-in defaults, the env file at `env_file` and `flags`, in
/// increasing precedence, into a validated [`Connection`].
pub fn resolve(flags: Settings, env_file: &Path) -> Result<Connection, ConfigError> {
    let file = Settings::from_env_file(env_file)?;
    merge(file, flags)?.into_connection()
}

/// Layer `flags` over `file` over the built-in defaults.
pub fn merge(file: Settings, flags: Settings) -> Result<Settings, ConfigError> {
    let merged = Figment::new()
        .merge(Serialized::defaults(Settings::builtin()))
        .merge(Serialized::defaults(file.without_blanks()))
        .merge(Serialized::defaults(flags.without_blanks()))
        .extract()?;
    Ok(merged)
}
