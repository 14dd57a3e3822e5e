//!
//! # Layout Data Model
//!
//! Defines the primary structures for representation of hierarchical
//! geometry-based IC layout, including [LayoutDocument], [Cell], [Element],
//! and related types.
//!
//! Entity identities are monotone, document-allocated ids: stable once
//! assigned, and never reused. Cells are keyed in a slot-map table.
//!

// Std-Lib
use std::collections::BTreeMap;

// Crates.io
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

// Local Imports
use crate::bbox::BoundBox;
use crate::geom::{Geometry, GeometryOps, Point, Rect, Size, Transform};
use crate::utils::SerdeFile;

// Create key-types for each internal type stored in [SlotMap]s
new_key_type! {
    /// Keys for [Cell] entries
    pub struct CellKey;
}

/// Identifier for a shape [Element]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub u64);
/// Identifier for a [Via]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViaId(pub u64);
/// Identifier for a [Pin]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PinId(pub u64);
/// Identifier for a [Label]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelId(pub u64);
/// Identifier for an [Instance]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u64);
/// Identifier for a [Net]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetId(pub u64);

/// Layer-Purpose Enumeration
/// Includes the common use-cases for each shape, and a named escape hatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerPurpose {
    #[default]
    Drawing,
    Pin,
    Label,
    Obstruction,
    /// Named purpose, not first-class supported
    Named(String),
}

/// # Layer Identity
///
/// A (name, purpose) pair acting as a layer's identity key throughout the
/// system. GDS layer/datatype numbers live only in the technology
/// database's display definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId {
    pub name: String,
    pub purpose: LayerPurpose,
}
impl LayerId {
    /// Create a drawing-purpose [LayerId] named `name`
    pub fn drawing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            purpose: LayerPurpose::Drawing,
        }
    }
    pub fn new(name: impl Into<String>, purpose: LayerPurpose) -> Self {
        Self {
            name: name.into(),
            purpose,
        }
    }
}

/// # Shape Element
///
/// Primary unit of geometric layout definition.
/// Combines a [Geometry] with a z-axis [LayerId], optional net
/// connectivity, and a free-form property bag.
///
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Element {
    pub id: ElementId,
    pub layer: LayerId,
    pub net: Option<NetId>,
    pub geometry: Geometry,
    pub props: BTreeMap<String, String>,
}

/// # Via
///
/// References a technology via-definition by id; geometry is derived at
/// use time from the referenced definition's cut size.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Via {
    pub id: ViaId,
    /// Via-definition reference into the technology database
    pub viadef: String,
    pub loc: Point,
    pub net: Option<NetId>,
}

/// Pin-role enumeration; drives antenna-rule applicability
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PinRole {
    #[default]
    Signal,
    Power,
    Ground,
    Gate,
    Source,
    Drain,
    Bulk,
}

/// # Pin
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Pin {
    pub id: PinId,
    pub name: String,
    pub loc: Point,
    pub size: Size,
    pub layer: LayerId,
    pub net: Option<NetId>,
    pub role: PinRole,
}
impl Pin {
    /// Pin geometry: a rect of `size` centered at `loc`
    pub fn rect(&self) -> Rect {
        Rect::new(
            Point::new(self.loc.x - self.size.w / 2.0, self.loc.y - self.size.h / 2.0),
            self.size,
        )
    }
}

/// # Text Label
///
/// Non-geometric annotation: text at a position on a layer,
/// optionally naming a net.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Label {
    pub id: LabelId,
    pub text: String,
    pub loc: Point,
    pub layer: LayerId,
    pub net: Option<NetId>,
}

/// # Instance of another Cell
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Instance {
    pub id: InstanceId,
    /// Instance Name
    pub name: String,
    /// Cell Definition Reference
    pub cell: CellKey,
    /// Placement transform
    pub transform: Transform,
}

/// # Electrical Net
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Net {
    pub id: NetId,
    pub name: String,
}

/// # Analog Placement Constraint
///
/// Consumed by the annealing placement engine; identified by the
/// names of the instances it binds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Constraint {
    /// Mirror-symmetric pair about a shared vertical axis
    Symmetric { a: String, b: String },
    /// Identical orientation for all members
    Matched(Vec<String>),
    /// Members share a common centroid
    CommonCentroid(Vec<String>),
    /// Members alternate along a row
    Interdigitated(Vec<String>),
}
impl Constraint {
    /// Names of the instances this constraint binds
    pub fn members(&self) -> Vec<&str> {
        match self {
            Constraint::Symmetric { a, b } => vec![a.as_str(), b.as_str()],
            Constraint::Matched(v) | Constraint::CommonCentroid(v) | Constraint::Interdigitated(v) => {
                v.iter().map(|s| s.as_str()).collect()
            }
        }
    }
}

/// # Layout Cell Definition
///
/// Owns collections of shape elements, vias, labels, pins, sub-instances,
/// nets, and analog placement constraints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cell {
    /// Cell Name
    pub name: String,
    pub elements: Vec<Element>,
    pub vias: Vec<Via>,
    pub labels: Vec<Label>,
    pub pins: Vec<Pin>,
    pub instances: Vec<Instance>,
    pub nets: Vec<Net>,
    pub constraints: Vec<Constraint>,
}
impl Cell {
    /// Create a new and empty Cell named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    /// Get the [Net] with id `id`, if present
    pub fn net(&self, id: NetId) -> Option<&Net> {
        self.nets.iter().find(|n| n.id == id)
    }
    /// Get the [Net] named `name`, if present
    pub fn net_named(&self, name: &str) -> Option<&Net> {
        self.nets.iter().find(|n| n.name == name)
    }
    /// Get the [Pin] named `name`, if present
    pub fn pin_named(&self, name: &str) -> Option<&Pin> {
        self.pins.iter().find(|p| p.name == name)
    }
    /// Non-hierarchical bounding box over own elements and pins.
    /// Sub-instances are not descended; see the DRC flattener for that.
    pub fn local_bbox(&self) -> BoundBox {
        let mut bbox = BoundBox::empty();
        for elem in &self.elements {
            let b = elem.geometry.bbox();
            bbox = bbox.union_point(&b.p0).union_point(&b.p1);
        }
        for pin in &self.pins {
            let r = pin.rect();
            bbox = bbox.union_point(&r.min()).union_point(&r.max());
        }
        bbox
    }
}

/// # Layout Document
///
/// A table of [Cell] definitions with a designated top cell,
/// plus the document-wide id allocator and distance units.
///
/// The document is a plain value: structural copies back snapshot-based
/// undo. Mutations belong to [crate::edit::Editor] and are atomic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutDocument {
    /// Document Name
    pub name: String,
    /// Design-units per micrometer
    pub units: f64,
    /// Cell Definitions
    pub cells: SlotMap<CellKey, Cell>,
    /// Designated top cell
    pub top: Option<CellKey>,
    /// Next entity-id to be allocated. Monotone; ids are never reused.
    next_id: u64,
}
// SlotMap carries no PartialEq; compare the cell tables entry-wise
impl PartialEq for LayoutDocument {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.units == other.units
            && self.top == other.top
            && self.next_id == other.next_id
            && self.cells.len() == other.cells.len()
            && self
                .cells
                .iter()
                .zip(other.cells.iter())
                .all(|(a, b)| a == b)
    }
}
impl Default for LayoutDocument {
    fn default() -> Self {
        Self {
            name: String::new(),
            units: 1000.0,
            cells: SlotMap::with_key(),
            top: None,
            next_id: 1,
        }
    }
}
impl LayoutDocument {
    /// Create a new and empty document
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    /// Allocate the next entity id
    pub fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
    /// Add [Cell] `cell` to our cell table
    pub fn add_cell(&mut self, cell: Cell) -> CellKey {
        self.cells.insert(cell)
    }
    /// Get the [CellKey] of the cell named `name`, if present
    pub fn cell_named(&self, name: &str) -> Option<CellKey> {
        self.cells.iter().find(|(_, c)| c.name == name).map(|(k, _)| k)
    }
}
impl SerdeFile for LayoutDocument {}

/// # Design Unit
///
/// Binds a synthesized layout back to its source connectivity graph:
/// component-to-instance, net-name-to-net-id, and device-kind-to-template-
/// cell mappings, keyed by a content hash of the source schematic.
///
/// The binding is considered stale, but is not auto-invalidated, once the
/// source schematic's hash diverges.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DesignUnit {
    pub name: String,
    /// Source component-name to layout instance-id
    pub components: BTreeMap<String, InstanceId>,
    /// Source net-name to layout net-id in the top cell
    pub nets: BTreeMap<String, NetId>,
    /// Device-kind-id to generated template cell
    pub device_cells: BTreeMap<String, CellKey>,
    /// Content hash of the source schematic
    pub schematic_hash: u64,
}
impl DesignUnit {
    /// Whether this binding is stale relative to `hash` of the current source
    pub fn is_stale(&self, hash: u64) -> bool {
        self.schematic_hash != hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_compare_by_cell_content() {
        let mut doc = LayoutDocument::new("d");
        let key = doc.add_cell(Cell::new("top"));
        doc.top = Some(key);
        let copy = doc.clone();
        assert_eq!(doc, copy);

        let mut renamed = doc.clone();
        renamed.cells.get_mut(key).unwrap().name = "other".into();
        assert_ne!(doc, renamed);

        let mut extended = doc.clone();
        extended.add_cell(Cell::new("extra"));
        assert_ne!(doc, extended);
    }
}
