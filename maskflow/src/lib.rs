//!
//! # Maskflow
//!
//! A physical-layout synthesis and verification engine:
//! a geometric data model, a technology-rule database, a batch DRC engine,
//! and a multi-stage auto-layout pipeline lowering device connectivity
//! into placed and routed geometry, followed by quality scoring.
//!
//! Persistence uses structured serialization via [maskflowutils::SerializationFormat];
//! foreign binary formats are delegated to external converter commands.
//!

// Internal modules & re-exports
pub use maskflowutils as utils;

pub mod bbox;
pub mod conv;
pub mod data;
pub mod drc;
pub mod edit;
pub mod error;
pub mod extract;
pub mod flow;
pub mod geom;
pub mod place;
pub mod route;
pub mod schematic;
pub mod tech;


// Crate-wide re-exports
pub use bbox::{BoundBox, BoundBoxTrait};
pub use data::{
    Cell, CellKey, Constraint, DesignUnit, Element, ElementId, Instance, InstanceId, Label,
    LabelId, LayerId, LayerPurpose, LayoutDocument, Net, NetId, Pin, PinId, PinRole, Via, ViaId,
};
pub use conv::{ExternalConverter, FormatConverter, NativeConverter};
pub use drc::{run_drc, DrcReport, Violation, ViolationKind};
pub use error::{LayoutError, LayoutResult};
pub use extract::{extract_nets, ExtractedNet};
pub use flow::{FlowConfig, FlowResult, LayoutFlow, PlacerChoice, QualityMetrics, RouterChoice};
pub use place::{
    AnnealingConfig, AnnealingPlacer, CancelToken, GreedyPlacer, PlaceItem, PlacementResult, Placer,
};
pub use route::{MstRouter, Router, RoutingNet, RoutingPin, RoutingResult, SteinerRouter};
pub use schematic::{DeviceCatalog, DeviceCategory, DeviceDef, SourceDevice, SourceGraph, Wire};
pub use geom::{Coord, Dir, Geometry, GeometryOps, Path, Point, Polygon, Rect, Rotation, Size,
    Transform, TransformTrait};
pub use tech::{AntennaRule, LayerDef, RuleSet, TechnologyDatabase, ViaDef};
