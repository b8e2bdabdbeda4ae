// Fetch request and result model
//
// A `FetchResult` maps each requested command identifier to either the
// decoded JSON the switch returned or a short error marker. It is filled in
// one slot at a time so a failed category never hides its siblings.

use indexmap::IndexMap;
use serde::Serialize;
use serde::ser::SerializeMap;
use serde_json::Value;

use crate::catalog::{Category, PORT_TRAFFIC_KEY};

/// Marker recorded when the switch rejected the call or returned nothing useful.
pub const AUTH_FAILED_MARKER: &str = "Authentication failed or no data";

/// Marker recorded when a plausible-looking body was not valid JSON.
pub const PARSE_ERROR_MARKER: &str = "JSON parse error";

/// Bodies at or below this many bytes are treated as rejections.
pub const MIN_VALID_BODY_LEN: usize = 50;

/// Body substrings the switch uses to signal an unauthenticated session
/// or a malformed request.
pub const REJECTION_SIGNATURES: [&str; 2] = ["notAuth", "Bad Request"];

// ── Request ─────────────────────────────────────────────────────────

/// What one handshake run should fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRequest {
    /// Command identifiers, fetched in this order.
    pub commands: Vec<String>,
    /// Also fetch traffic counters for every port.
    pub port_traffic: bool,
}

impl FetchRequest {
    /// Expand categories into their command identifiers, preserving order
    /// and skipping duplicates.
    pub fn from_categories(categories: &[Category], port_traffic: bool) -> Self {
        let mut commands: Vec<String> = Vec::new();
        for category in categories {
            for cmd in category.commands() {
                if !commands.iter().any(|c| c == cmd.id) {
                    commands.push(cmd.id.to_owned());
                }
            }
        }
        Self {
            commands,
            port_traffic,
        }
    }

    /// `true` when there is nothing to fetch.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && !self.port_traffic
    }
}

// ── Payload ─────────────────────────────────────────────────────────

/// One slot of a [`FetchResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Decoded JSON as returned by the switch.
    Data(Value),
    /// `{"error": "..."}` marker.
    Error { error: String },
}

impl Payload {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Data(v) => Some(v),
            Self::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Data(_) => None,
            Self::Error { error } => Some(error),
        }
    }

    /// Classify a CGI response body.
    ///
    /// Bodies longer than [`MIN_VALID_BODY_LEN`] bytes that carry none of
    /// the [`REJECTION_SIGNATURES`] are decoded as JSON; everything else is
    /// an authentication marker.
    pub fn from_body(body: &str) -> Self {
        let rejected = body.len() <= MIN_VALID_BODY_LEN
            || REJECTION_SIGNATURES.iter().any(|sig| body.contains(sig));
        if rejected {
            return Self::error(AUTH_FAILED_MARKER);
        }
        match serde_json::from_str(body) {
            Ok(value) => Self::Data(value),
            Err(_) => Self::error(PARSE_ERROR_MARKER),
        }
    }
}

// ── Result ──────────────────────────────────────────────────────────

/// Everything one successful handshake run fetched.
///
/// Serializes as a flat JSON object: command identifiers in request order,
/// then `port_traffic_all` (keyed by port name) when traffic was requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResult {
    entries: IndexMap<String, Payload>,
    port_traffic: Option<IndexMap<String, Payload>>,
}

impl FetchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, command: impl Into<String>, payload: Payload) {
        self.entries.insert(command.into(), payload);
    }

    pub fn insert_port_traffic(&mut self, port: impl Into<String>, payload: Payload) {
        self.port_traffic
            .get_or_insert_with(IndexMap::new)
            .insert(port.into(), payload);
    }

    pub fn get(&self, command: &str) -> Option<&Payload> {
        self.entries.get(command)
    }

    /// Command slots in request order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Payload)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Per-port traffic slots, if traffic was requested.
    pub fn port_traffic(&self) -> Option<&IndexMap<String, Payload>> {
        self.port_traffic.as_ref()
    }

    /// Number of top-level keys in the serialized document.
    pub fn len(&self) -> usize {
        self.entries.len() + usize::from(self.port_traffic.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count of slots (commands and ports) holding an error marker.
    pub fn error_count(&self) -> usize {
        let commands = self.entries.values().filter(|p| p.is_error()).count();
        let ports = self
            .port_traffic
            .as_ref()
            .map_or(0, |m| m.values().filter(|p| p.is_error()).count());
        commands + ports
    }
}

impl Serialize for FetchResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, payload) in &self.entries {
            map.serialize_entry(key, payload)?;
        }
        if let Some(ref traffic) = self.port_traffic {
            map.serialize_entry(PORT_TRAFFIC_KEY, traffic)?;
        }
        map.end()
    }
}
