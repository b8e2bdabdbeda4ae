//! Output formatting: JSON documents and the `--summary` tables.
//!
//! JSON goes through serde. Summary tables use `tabled`, colored with
//! `owo-colors` when the color mode allows it.

use std::collections::BTreeSet;
use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::{Table, Tabled, settings::Style};

use swhub_api::catalog::label_for;
use swhub_api::{FetchResult, PORT_TRAFFIC_KEY, Payload};

use crate::cli::ColorMode;
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

fn paint_result(ok: bool, color: bool) -> String {
    match (ok, color) {
        (true, true) => "ok".green().to_string(),
        (true, false) => "ok".to_owned(),
        (false, true) => "error".red().bold().to_string(),
        (false, false) => "error".to_owned(),
    }
}

fn heading(title: &str, color: bool) -> String {
    if color {
        title.bold().cyan().to_string()
    } else {
        title.to_owned()
    }
}

// ── JSON ─────────────────────────────────────────────────────────────

pub fn render_json<T: serde::Serialize + ?Sized>(data: &T, pretty: bool) -> Result<String, CliError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(data)?
    } else {
        serde_json::to_string(data)?
    };
    Ok(rendered)
}

/// `{"error": "<message>"}` for terminal failures.
pub fn render_error(message: &str, pretty: bool) -> Result<String, CliError> {
    render_json(&serde_json::json!({ "error": message }), pretty)
}

pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Summary ──────────────────────────────────────────────────────────

#[derive(Tabled)]
struct OverviewRow {
    #[tabled(rename = "Command")]
    command: String,
    #[tabled(rename = "Description")]
    label: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Items / Error")]
    detail: String,
}

/// Overview of every slot, then the device identity and traffic tables
/// when those were fetched.
pub fn render_summary(result: &FetchResult, color: bool) -> String {
    let mut sections = Vec::new();

    let mut rows: Vec<OverviewRow> = result
        .entries()
        .map(|(command, payload)| OverviewRow {
            command: command.to_owned(),
            label: label_for(command).unwrap_or("-").to_owned(),
            result: paint_result(!payload.is_error(), color),
            detail: detail(payload),
        })
        .collect();
    if let Some(traffic) = result.port_traffic() {
        let failed = traffic.values().filter(|p| p.is_error()).count();
        rows.push(OverviewRow {
            command: PORT_TRAFFIC_KEY.to_owned(),
            label: "Traffic counters, all ports".to_owned(),
            result: paint_result(failed == 0, color),
            detail: format!("{} ports, {failed} failed", traffic.len()),
        });
    }
    if !rows.is_empty() {
        sections.push(format!(
            "{}\n{}",
            heading("Overview", color),
            Table::new(&rows).with(Style::rounded())
        ));
    }

    if let Some(identity) = result
        .get("home_main")
        .and_then(Payload::data)
        .and_then(render_identity)
    {
        sections.push(format!("{}\n{identity}", heading("Device", color)));
    }

    if let Some(traffic) = render_traffic(result, color) {
        sections.push(format!("{}\n{traffic}", heading("Traffic", color)));
    }

    sections.join("\n\n")
}

fn detail(payload: &Payload) -> String {
    match payload {
        Payload::Error { error } => error.clone(),
        Payload::Data(value) => item_count(value).map_or_else(|| "-".to_owned(), |n| n.to_string()),
    }
}

/// Number of rows in a table-shaped response: the `data` array itself, or
/// the longest array directly under `data`.
fn item_count(value: &Value) -> Option<usize> {
    let data = value.get("data").unwrap_or(value);
    match data {
        Value::Array(items) => Some(items.len()),
        Value::Object(fields) => fields
            .values()
            .filter_map(Value::as_array)
            .map(Vec::len)
            .max(),
        _ => None,
    }
}

/// Scalar fields are shown as text; nested structures are skipped.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Key/value table of the scalar fields in `home_main`'s `data` object.
fn render_identity(value: &Value) -> Option<String> {
    let fields = value.get("data").unwrap_or(value).as_object()?;
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut any = false;
    for (key, value) in fields {
        if let Some(text) = scalar_text(value) {
            builder.push_record([key.clone(), text]);
            any = true;
        }
    }
    any.then(|| builder.build().with(Style::rounded()).to_string())
}

/// One row per port; columns are the union of scalar counters reported.
fn render_traffic(result: &FetchResult, color: bool) -> Option<String> {
    let traffic = result.port_traffic()?;

    let counters = |payload: &Payload| -> Vec<(String, String)> {
        payload
            .data()
            .and_then(|v| v.get("data").unwrap_or(v).as_object())
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|(k, v)| scalar_text(v).map(|t| (k.clone(), t)))
                    .collect()
            })
            .unwrap_or_default()
    };

    let columns: BTreeSet<String> = traffic
        .values()
        .flat_map(|p| counters(p).into_iter().map(|(k, _)| k))
        .collect();

    let mut builder = Builder::default();
    builder.push_record(
        ["Port".to_owned(), "Result".to_owned()]
            .into_iter()
            .chain(columns.iter().cloned()),
    );
    for (port, payload) in traffic {
        let values = counters(payload);
        let mut record = vec![port.clone(), paint_result(!payload.is_error(), color)];
        for column in &columns {
            let cell = values
                .iter()
                .find(|(k, _)| k == column)
                .map_or_else(|| "-".to_owned(), |(_, v)| v.clone());
            record.push(cell);
        }
        builder.push_record(record);
    }
    Some(builder.build().with(Style::rounded()).to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;
    use swhub_api::AUTH_FAILED_MARKER;

    fn sample() -> FetchResult {
        let mut result = FetchResult::new();
        result.insert(
            "home_main",
            Payload::Data(json!({"data": {"model": "GS-1008", "fwVer": "1.0.3", "ports": [1, 2]}})),
        );
        result.insert(
            "mac_dynamic",
            Payload::Data(json!({"data": {"entries": [{"mac": "aa"}, {"mac": "bb"}], "total": 2}})),
        );
        result.insert("vlan_conf", Payload::error(AUTH_FAILED_MARKER));
        result.insert_port_traffic("GE1", Payload::Data(json!({"data": {"rxGoodPkt": 5, "txGoodPkt": 7}})));
        result.insert_port_traffic("GE2", Payload::error(AUTH_FAILED_MARKER));
        result
    }

    #[test]
    fn item_counts_follow_the_longest_array() {
        assert_eq!(item_count(&json!({"data": [1, 2, 3]})), Some(3));
        assert_eq!(item_count(&json!({"data": {"a": [1], "b": [1, 2]}})), Some(2));
        assert_eq!(item_count(&json!({"data": {"title": "X"}})), None);
    }

    #[test]
    fn summary_without_color_has_every_section() {
        let text = render_summary(&sample(), false);

        assert!(text.contains("Overview"));
        assert!(text.contains("mac_dynamic"));
        assert!(text.contains(AUTH_FAILED_MARKER));
        assert!(text.contains("Device"));
        assert!(text.contains("GS-1008"));
        assert!(text.contains("Traffic"));
        assert!(text.contains("rxGoodPkt"));
        assert!(text.contains("2 ports, 1 failed"));
        assert!(!text.contains('\u{1b}'), "no escape codes without color");
    }

    #[test]
    fn summary_with_color_emits_escape_codes() {
        assert!(render_summary(&sample(), true).contains('\u{1b}'));
    }

    #[test]
    fn identity_skips_nested_fields() {
        let table = render_identity(&json!({"data": {"model": "GS-1008", "ports": [1]}})).unwrap();
        assert!(table.contains("model"));
        assert!(!table.contains("ports"));
    }

    #[test]
    fn error_document_shape() {
        let text = render_error("HTTP Error 503: Service Unavailable", false).unwrap();
        assert_eq!(text, r#"{"error":"HTTP Error 503: Service Unavailable"}"#);
    }
}
