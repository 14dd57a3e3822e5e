//!
//! # Source Connectivity Graph & Device Catalog
//!
//! The minimal schematic-side data consumed by net extraction and the
//! auto-layout pipeline: devices with kind-ids, parameters, and absolute
//! port positions; wires; net labels; and the catalog describing each
//! device kind. Both are owned by external collaborators; these are the
//! crate's serde-able adapter types.
//!

// Std-Lib
use std::collections::BTreeMap;

// Crates.io
use serde::{Deserialize, Serialize};

// Local Imports
use crate::geom::Point;
use crate::utils::SerdeFile;

/// # Enumerated Device Categories
///
/// Physical categories receive generated layout; reference and source
/// categories are skipped by the pipeline (recorded, not errored).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeviceCategory {
    Mosfet,
    Resistor,
    Capacitor,
    /// Ground reference; forces its net name to "0"
    Ground,
    /// Supply reference
    Power,
    /// Independent voltage/current source
    Source,
    /// Controlled source
    ControlledSource,
}
impl DeviceCategory {
    /// Whether devices of this category produce physical layout
    pub fn is_physical(&self) -> bool {
        matches!(self, Self::Mosfet | Self::Resistor | Self::Capacitor)
    }
}

/// # Device Port Definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortDef {
    pub name: String,
}

/// # Device Parameter Definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParamDef {
    pub name: String,
    /// Unit string, e.g. "m", "ohm", "F"
    pub unit: String,
    pub default: Option<f64>,
}

/// # Device-Kind Definition
///
/// One catalog entry: category, simulation model name, SPICE-style
/// name prefix, port list, and parameter schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceDef {
    /// Device-kind identity, e.g. "nmos", "res"
    pub kind_id: String,
    pub category: DeviceCategory,
    /// Simulation model type, e.g. "BSIM4"
    pub model: String,
    /// SPICE-style name prefix, e.g. "M", "R", "C"
    pub prefix: String,
    pub ports: Vec<PortDef>,
    pub params: Vec<ParamDef>,
}

/// # Device Catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceCatalog {
    pub devices: Vec<DeviceDef>,
}
impl DeviceCatalog {
    /// Get the definition for `kind_id`, if present
    pub fn device(&self, kind_id: &str) -> Option<&DeviceDef> {
        self.devices.iter().find(|d| d.kind_id == kind_id)
    }
    /// A small built-in catalog covering the supported categories
    pub fn builtin() -> Self {
        let dev = |kind: &str, cat, model: &str, prefix: &str, ports: &[&str], params: &[(&str, &str)]| {
            DeviceDef {
                kind_id: kind.to_string(),
                category: cat,
                model: model.to_string(),
                prefix: prefix.to_string(),
                ports: ports.iter().map(|p| PortDef { name: p.to_string() }).collect(),
                params: params
                    .iter()
                    .map(|(n, u)| ParamDef {
                        name: n.to_string(),
                        unit: u.to_string(),
                        default: None,
                    })
                    .collect(),
            }
        };
        Self {
            devices: vec![
                dev("nmos", DeviceCategory::Mosfet, "nmos", "M", &["D", "G", "S", "B"], &[("w", "m"), ("l", "m")]),
                dev("pmos", DeviceCategory::Mosfet, "pmos", "M", &["D", "G", "S", "B"], &[("w", "m"), ("l", "m")]),
                dev("res", DeviceCategory::Resistor, "res", "R", &["P", "N"], &[("r", "ohm")]),
                dev("cap", DeviceCategory::Capacitor, "cap", "C", &["P", "N"], &[("c", "F")]),
                dev("gnd", DeviceCategory::Ground, "", "", &["P"], &[]),
                dev("vdd", DeviceCategory::Power, "", "", &["P"], &[]),
                dev("vsource", DeviceCategory::Source, "vsource", "V", &["P", "N"], &[("dc", "V")]),
            ],
        }
    }
}

/// # Source Device
///
/// A schematic component: kind-id into the catalog, parameter values,
/// a nominal position, and absolute port positions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourceDevice {
    pub name: String,
    pub kind_id: String,
    pub params: BTreeMap<String, f64>,
    pub loc: Point,
    /// Absolute port positions, by port name
    pub ports: BTreeMap<String, Point>,
}

/// # Schematic Wire
///
/// A two-endpoint wire, optionally carrying a net name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Wire {
    pub a: Point,
    pub b: Point,
    pub net: Option<String>,
}

/// # Net Label
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetLabel {
    pub text: String,
    pub loc: Point,
}

/// # Source Connectivity Graph
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourceGraph {
    pub name: String,
    pub devices: Vec<SourceDevice>,
    pub wires: Vec<Wire>,
    pub labels: Vec<NetLabel>,
}
impl SerdeFile for SourceGraph {}
