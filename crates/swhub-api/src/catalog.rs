// Static command catalog
//
// Maps each data category the CLI can request to the device-side command
// identifiers served by `/cgi/get.cgi?cmd=<id>`. The table is fixed at
// compile time and never mutated.

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// One device-side command identifier and its human label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Command {
    pub id: &'static str,
    pub label: &'static str,
}

/// Data categories the switch exposes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    /// Link state of every front-panel port.
    Status,
    /// Port configuration and the panel layout.
    Port,
    /// VLAN port settings, VLAN table and membership.
    Vlan,
    /// Dynamic and static MAC address tables.
    Mac,
    /// Device identity (model, firmware, addresses).
    Main,
}

const STATUS: &[Command] = &[Command {
    id: "panel_info",
    label: "Port status",
}];

const PORT: &[Command] = &[
    Command {
        id: "port_port",
        label: "Port settings",
    },
    Command {
        id: "panel_layout",
        label: "Panel layout",
    },
];

const VLAN: &[Command] = &[
    Command {
        id: "vlan_port",
        label: "VLAN port settings",
    },
    Command {
        id: "vlan_conf",
        label: "VLAN configuration",
    },
    Command {
        id: "vlan_membership",
        label: "VLAN membership",
    },
];

const MAC: &[Command] = &[
    Command {
        id: "mac_dynamic",
        label: "Dynamic MAC address table",
    },
    Command {
        id: "mac_static",
        label: "Static MAC address table",
    },
];

const MAIN: &[Command] = &[Command {
    id: "home_main",
    label: "Switch information",
}];

impl Category {
    /// Device commands fetched for this category, in request order.
    pub fn commands(self) -> &'static [Command] {
        match self {
            Self::Status => STATUS,
            Self::Port => PORT,
            Self::Vlan => VLAN,
            Self::Mac => MAC,
            Self::Main => MAIN,
        }
    }
}

/// Look up the label for a command identifier.
pub fn label_for(id: &str) -> Option<&'static str> {
    [STATUS, PORT, VLAN, MAC, MAIN]
        .iter()
        .flat_map(|cmds| cmds.iter())
        .find(|cmd| cmd.id == id)
        .map(|cmd| cmd.label)
}

// ── Traffic counters ────────────────────────────────────────────────

/// Command serving per-port traffic counters; takes a `port=<name>` parameter.
pub const PORT_COUNTER_COMMAND: &str = "port_cnt";

/// Result key under which per-port counters are collected.
pub const PORT_TRAFFIC_KEY: &str = "port_traffic_all";

/// Physical ports followed by link-aggregation groups.
pub const PORTS: [&str; 12] = [
    "GE1", "GE2", "GE3", "GE4", "GE5", "GE6", "GE7", "GE8", "LAG1", "LAG2", "LAG3", "LAG4",
];
