//!
//! # Auto-Layout Pipeline
//!
//! Lowers a source connectivity graph into a placed, routed, and
//! checked layout document. The pipeline runs in ten stages: net
//! extraction, device-template generation, instantiation, net
//! registration, port binding, placement, supply-rail emission,
//! routing, design-rule checking, and quality evaluation.
//!
//! Device templates are parameterized-cell generators keyed by device
//! kind and parameter values; identical devices share one template.
//!

// Std-Lib
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

// Crates.io
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

// Local Imports
use crate::data::{
    Cell, CellKey, DesignUnit, Element, ElementId, Instance, InstanceId, LayerId, LayoutDocument,
    Net, NetId, Pin, PinId, PinRole, Via, ViaId,
};
use crate::drc::{run_drc, DrcReport, ViolationKind};
use crate::error::{LayoutError, LayoutResult};
use crate::extract::{extract_nets, ExtractedNet};
use crate::geom::{Geometry, GeometryOps, Path, Point, Rect, Size, Transform};
use crate::place::{AnnealingConfig, AnnealingPlacer, GreedyPlacer, PlaceItem, Placer};
use crate::route::{MstRouter, Obstruction, Router, RoutingNet, RoutingPin, SteinerRouter};
use crate::schematic::{DeviceCatalog, DeviceCategory, SourceGraph};
use crate::tech::TechnologyDatabase;

/// Placement engine selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlacerChoice {
    #[default]
    Greedy,
    Annealing,
}

/// Routing engine selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum RouterChoice {
    #[default]
    Mst,
    Steiner,
}

/// Pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FlowConfig {
    pub placer: PlacerChoice,
    pub router: RouterChoice,
    pub annealing: AnnealingConfig,
}

/// # Quality Metrics
///
/// Aggregate figures of merit for one synthesized layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QualityMetrics {
    /// Bounding-box area of the layout
    pub area: f64,
    /// Total routed wirelength
    pub wirelength: f64,
    /// Nets the router could not complete
    pub unrouted: usize,
    /// Design-rule violations, category and message
    pub violations: Vec<(ViolationKind, String)>,
    /// Composite score in [0, 1]; higher is better
    pub score: f64,
}

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct FlowResult {
    pub doc: LayoutDocument,
    pub top: CellKey,
    pub unit: DesignUnit,
    pub report: DrcReport,
    pub metrics: QualityMetrics,
    /// Devices that received no layout: unknown or non-physical kinds
    pub skipped: Vec<String>,
    /// Nets the router could not complete
    pub unrouted: Vec<String>,
}

/// Content hash of a source graph, for staleness tracking.
/// Serialization-based so that any field change alters the hash.
pub fn schematic_hash(graph: &SourceGraph) -> LayoutResult<u64> {
    let text = serde_json::to_string(graph)
        .map_err(|e| LayoutError::msg(format!("schematic hashing failed: {}", e)))?;
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    Ok(hasher.finish())
}

/// Template-cache key: device kind plus its parameter values,
/// rendered at fixed precision
fn template_key(kind: &str, params: &BTreeMap<String, f64>) -> String {
    let mut key = kind.to_string();
    for (name, value) in params {
        key.push_str(&format!("_{}{:e}", name, value));
    }
    key
}

///
/// # Layout Flow
///
/// Owns the technology reference, configuration, and the per-run
/// template-cell cache.
///
pub struct LayoutFlow<'t> {
    tech: &'t TechnologyDatabase,
    config: FlowConfig,
    catalog: DeviceCatalog,
}
impl<'t> LayoutFlow<'t> {
    pub fn new(tech: &'t TechnologyDatabase) -> Self {
        Self {
            tech,
            config: FlowConfig::default(),
            catalog: DeviceCatalog::builtin(),
        }
    }
    pub fn with_config(tech: &'t TechnologyDatabase, config: FlowConfig) -> Self {
        Self {
            tech,
            config,
            catalog: DeviceCatalog::builtin(),
        }
    }
    pub fn catalog_mut(&mut self) -> &mut DeviceCatalog {
        &mut self.catalog
    }

    /// Run the full pipeline on `graph`
    pub fn run(&self, graph: &SourceGraph) -> LayoutResult<FlowResult> {
        let hash = schematic_hash(graph)?;
        let mut doc = LayoutDocument::new(&graph.name);
        let mut unit = DesignUnit {
            name: graph.name.clone(),
            schematic_hash: hash,
            ..Default::default()
        };

        info!("flow stage 1: net extraction");
        let nets = extract_nets(graph, &self.catalog);

        info!("flow stage 2: device templates");
        // Per-device failures degrade: the device is recorded as skipped
        // and the rest of the design still gets layout
        let mut skipped: Vec<String> = Vec::new();
        let mut templates: HashMap<String, CellKey> = HashMap::new();
        let mut device_cell: BTreeMap<String, CellKey> = BTreeMap::new();
        for dev in &graph.devices {
            let Some(def) = self.catalog.device(&dev.kind_id) else {
                warn!("device {} has unknown kind {}, skipping", dev.name, dev.kind_id);
                skipped.push(dev.name.clone());
                continue;
            };
            if !def.category.is_physical() {
                debug!("skipping non-physical device {}", dev.name);
                skipped.push(dev.name.clone());
                continue;
            }
            let key = template_key(&dev.kind_id, &dev.params);
            let cell_key = match templates.get(&key) {
                Some(&k) => k,
                None => {
                    let cell = generate_template(&mut doc, self.tech, def.category, &key, &dev.params)?;
                    let k = doc.add_cell(cell);
                    templates.insert(key.clone(), k);
                    unit.device_cells.insert(key.clone(), k);
                    k
                }
            };
            device_cell.insert(dev.name.clone(), cell_key);
        }

        info!("flow stage 3: instantiation");
        let mut top = Cell::new(format!("{}_top", graph.name));
        for (name, &cell_key) in &device_cell {
            let id = InstanceId(doc.alloc_id());
            unit.components.insert(name.clone(), id);
            top.instances.push(Instance {
                id,
                name: name.clone(),
                cell: cell_key,
                transform: Transform::identity(),
            });
        }

        info!("flow stage 4: net registration");
        let mut net_id: BTreeMap<String, NetId> = BTreeMap::new();
        for net in &nets {
            let id = NetId(doc.alloc_id());
            net_id.insert(net.name.clone(), id);
            unit.nets.insert(net.name.clone(), id);
            top.nets.push(Net {
                id,
                name: net.name.clone(),
            });
        }

        info!("flow stage 5: port binding");
        let mut bound: Vec<(String, Vec<(String, String)>)> = Vec::new();
        for net in &nets {
            let mut pins = Vec::new();
            for conn in &net.connections {
                if !device_cell.contains_key(&conn.device) {
                    continue;
                }
                let cell_key = device_cell[&conn.device];
                let cell = doc
                    .cells
                    .get(cell_key)
                    .ok_or(LayoutError::CellNotFound(cell_key))?;
                let Some(pin) = resolve_pin(cell, &conn.port) else {
                    warn!(
                        "no pin for port {} on device {}, dropping connection",
                        conn.port, conn.device
                    );
                    continue;
                };
                pins.push((conn.device.clone(), pin.name.clone()));
            }
            bound.push((net.name.clone(), pins));
        }

        info!("flow stage 6: placement");
        let items = place_items(&doc, &top, &nets)?;
        let constraints = top.constraints.clone();
        let placement = match self.config.placer {
            PlacerChoice::Greedy => GreedyPlacer.place(&items, &constraints, self.tech)?,
            PlacerChoice::Annealing => {
                AnnealingPlacer::new(self.config.annealing.clone()).place(
                    &items,
                    &constraints,
                    self.tech,
                )?
            }
        };
        for inst in top.instances.iter_mut() {
            if let Some(p) = placement.get(&inst.name) {
                inst.transform = p.transform;
            }
        }

        info!("flow stage 7: supply rails");
        let mut obstructions = Vec::new();
        let mut rail_span: BTreeMap<String, Rect> = BTreeMap::new();
        for rail in &placement.rails {
            let id = match net_id.get(&rail.net) {
                Some(&id) => id,
                None => {
                    let id = NetId(doc.alloc_id());
                    net_id.insert(rail.net.clone(), id);
                    top.nets.push(Net {
                        id,
                        name: rail.net.clone(),
                    });
                    id
                }
            };
            top.elements.push(Element {
                id: ElementId(doc.alloc_id()),
                layer: rail.layer.clone(),
                net: Some(id),
                geometry: Geometry::Rect(rail.rect),
                props: BTreeMap::new(),
            });
            obstructions.push(Obstruction {
                layer: rail.layer.clone(),
                rect: rail.rect,
            });
            rail_span.insert(rail.net.clone(), rail.rect);
        }

        info!("flow stage 8: routing");
        let routing_nets = routing_nets(&doc, &top, &bound, &rail_span)?;
        let routed = match self.config.router {
            RouterChoice::Mst => MstRouter.route(&routing_nets, &obstructions, self.tech)?,
            RouterChoice::Steiner => {
                SteinerRouter::default().route(&routing_nets, &obstructions, self.tech)?
            }
        };
        for seg in &routed.segments {
            top.elements.push(Element {
                id: ElementId(doc.alloc_id()),
                layer: seg.layer.clone(),
                net: net_id.get(&seg.net).copied(),
                geometry: Geometry::Path(seg.path.clone()),
                props: BTreeMap::new(),
            });
        }
        for via in &routed.vias {
            let net = net_id.get(&via.net).copied();
            top.vias.push(Via {
                id: ViaId(doc.alloc_id()),
                viadef: via.viadef.clone(),
                loc: via.loc,
                net,
            });
            via_pads(&mut doc, self.tech, &mut top, &via.viadef, via.loc, net);
        }
        for name in &routed.unrouted {
            warn!("net {} left unrouted", name);
        }
        // Tap vias where routed nets terminate on a supply rail: the
        // rail sits on the horizontal layer while vertical route legs
        // arrive on the vertical one
        if let Some(viadef) = self
            .tech
            .routing_layer(crate::geom::Dir::Horiz)
            .zip(self.tech.routing_layer(crate::geom::Dir::Vert))
            .and_then(|(h, v)| self.tech.viadef_between(&h.layer, &v.layer))
        {
            let viadef = viadef.name.clone();
            for (net, rail) in &rail_span {
                if routed.is_routed(net) {
                    let id = net_id.get(net).copied();
                    top.vias.push(Via {
                        id: ViaId(doc.alloc_id()),
                        viadef: viadef.clone(),
                        loc: rail.center(),
                        net: id,
                    });
                    via_pads(&mut doc, self.tech, &mut top, &viadef, rail.center(), id);
                }
            }
        }

        let top_key = doc.add_cell(top);
        doc.top = Some(top_key);

        info!("flow stage 9: design-rule check");
        let report = run_drc(&doc, top_key, self.tech)?;

        info!("flow stage 10: quality evaluation");
        let metrics = evaluate(&doc, top_key, &routed.unrouted, routed.wirelength(), &report)?;
        info!(
            "flow complete: score {:.3}, {} violations, {} unrouted",
            metrics.score,
            report.violations.len(),
            metrics.unrouted
        );
        Ok(FlowResult {
            doc,
            top: top_key,
            unit,
            report,
            metrics,
            skipped,
            unrouted: routed.unrouted.clone(),
        })
    }
}

/// Resolve a schematic port name to a template-cell pin: exact match,
/// then case-insensitive match, then a fixed role-alias table.
pub fn resolve_pin<'c>(cell: &'c Cell, port: &str) -> Option<&'c Pin> {
    if let Some(pin) = cell.pin_named(port) {
        return Some(pin);
    }
    let lower = port.to_lowercase();
    if let Some(pin) = cell.pins.iter().find(|p| p.name.to_lowercase() == lower) {
        return Some(pin);
    }
    let role = match lower.as_str() {
        "d" | "drain" => Some(PinRole::Drain),
        "g" | "gate" => Some(PinRole::Gate),
        "s" | "source" => Some(PinRole::Source),
        "b" | "bulk" | "body" => Some(PinRole::Bulk),
        _ => None,
    };
    if let Some(role) = role {
        return cell.pins.iter().find(|p| p.role == role);
    }
    // Two-terminal aliases: positive to the first pin, negative to the last
    match lower.as_str() {
        "p" | "plus" | "pos" | "1" => cell.pins.first(),
        "n" | "minus" | "neg" | "2" => cell.pins.last(),
        _ => None,
    }
}

/// Metal landing pads satisfying a via's enclosure requirements on
/// both connected layers
fn via_pads(
    doc: &mut LayoutDocument,
    tech: &TechnologyDatabase,
    top: &mut Cell,
    viadef: &str,
    loc: Point,
    net: Option<NetId>,
) {
    let Some(def) = tech.viadef(viadef) else {
        return;
    };
    for (layer, enc) in [
        (&def.bottom, def.enclosure_bottom),
        (&def.top, def.enclosure_top),
    ] {
        let w = def.cut_size.w + 2.0 * enc;
        let h = def.cut_size.h + 2.0 * enc;
        top.elements.push(Element {
            id: ElementId(doc.alloc_id()),
            layer: layer.clone(),
            net,
            geometry: Geometry::Rect(Rect::new(
                Point::new(loc.x - w / 2.0, loc.y - h / 2.0),
                Size::new(w, h),
            )),
            props: BTreeMap::new(),
        });
    }
}

/// Build the placement input from the top cell's instances
fn place_items(doc: &LayoutDocument, top: &Cell, nets: &[ExtractedNet]) -> LayoutResult<Vec<PlaceItem>> {
    let mut items = Vec::with_capacity(top.instances.len());
    for inst in &top.instances {
        let cell = doc
            .cells
            .get(inst.cell)
            .ok_or(LayoutError::CellNotFound(inst.cell))?;
        let bbox = cell.local_bbox();
        let (w, h) = if bbox.is_empty() {
            (1.0, 1.0)
        } else {
            bbox.size()
        };
        let on_nets = nets
            .iter()
            .filter(|n| n.connections.iter().any(|c| c.device == inst.name))
            .map(|n| n.name.clone())
            .collect();
        items.push(PlaceItem {
            name: inst.name.clone(),
            size: Size::new(w, h),
            nets: on_nets,
        });
    }
    Ok(items)
}

/// Build the routing input: each bound net's pin positions, transformed
/// into top-cell coordinates. The ground net additionally picks up a
/// tap on its supply rail when one exists.
fn routing_nets(
    doc: &LayoutDocument,
    top: &Cell,
    bound: &[(String, Vec<(String, String)>)],
    rail_span: &BTreeMap<String, Rect>,
) -> LayoutResult<Vec<RoutingNet>> {
    let inst_by_name: HashMap<&str, &Instance> =
        top.instances.iter().map(|i| (i.name.as_str(), i)).collect();
    let mut out = Vec::new();
    for (net, pins) in bound {
        let mut routing_pins = Vec::new();
        for (device, pin_name) in pins {
            let inst = inst_by_name
                .get(device.as_str())
                .ok_or_else(|| LayoutError::msg(format!("missing instance {}", device)))?;
            let cell = doc
                .cells
                .get(inst.cell)
                .ok_or(LayoutError::CellNotFound(inst.cell))?;
            let pin = cell
                .pin_named(pin_name)
                .ok_or_else(|| LayoutError::msg(format!("missing pin {}", pin_name)))?;
            routing_pins.push(RoutingPin {
                net: net.clone(),
                loc: inst.transform.apply(pin.loc),
                layer: pin.layer.clone(),
            });
        }
        if let Some(rail) = rail_span.get(net) {
            routing_pins.push(RoutingPin {
                net: net.clone(),
                loc: rail.center(),
                layer: LayerId::drawing("MET1"),
            });
        }
        if routing_pins.len() >= 2 {
            out.push(RoutingNet {
                name: net.clone(),
                pins: routing_pins,
            });
        }
    }
    Ok(out)
}

/// Composite quality score: design-rule cleanliness, routing
/// completion, and area utilization, weighted 50/30/20.
fn evaluate(
    doc: &LayoutDocument,
    top: CellKey,
    unrouted: &[String],
    wirelength: f64,
    report: &DrcReport,
) -> LayoutResult<QualityMetrics> {
    let flat = crate::drc::flatten(doc, top)?;
    let bbox = flat.bbox();
    let area = bbox.area();
    let shape_area: f64 = flat.shapes.iter().map(|s| s.geometry.area()).sum();

    let total_violations = report.violations.len();
    let drc_score = 1.0 / (1.0 + total_violations as f64);
    let routed_nets = flat
        .shapes
        .iter()
        .filter_map(|s| s.net.as_ref())
        .collect::<std::collections::HashSet<_>>()
        .len();
    let route_score = if routed_nets + unrouted.len() == 0 {
        1.0
    } else {
        routed_nets as f64 / (routed_nets + unrouted.len()) as f64
    };
    let utilization = if area > 0.0 {
        (shape_area / area).min(1.0)
    } else {
        1.0
    };
    let score = 0.5 * drc_score + 0.3 * route_score + 0.2 * utilization;
    Ok(QualityMetrics {
        area,
        wirelength,
        unrouted: unrouted.len(),
        violations: report
            .violations
            .iter()
            .map(|v| (v.kind, v.message.clone()))
            .collect(),
        score,
    })
}

/// Minimum gate and wire dimension fallbacks, in micrometers
const MIN_FEATURE: f64 = 0.15;
/// Source/drain extension beyond the gate
const SD_EXTENSION: f64 = 0.4;
/// Poly overhang beyond the active edge
const POLY_OVERHANG: f64 = 0.2;
/// Polysilicon sheet resistance assumed for resistor sizing, ohms/square
const SHEET_RES: f64 = 50.0;
/// Plate capacitance assumed for capacitor sizing, farads per square um
const CAP_DENSITY: f64 = 1e-15;

fn min_width_of(tech: &TechnologyDatabase, layer: &str) -> f64 {
    tech.rules(&LayerId::drawing(layer))
        .and_then(|r| r.min_width)
        .unwrap_or(MIN_FEATURE)
}

/// Generate the template cell for one device kind and parameter set
fn generate_template(
    doc: &mut LayoutDocument,
    tech: &TechnologyDatabase,
    category: DeviceCategory,
    name: &str,
    params: &BTreeMap<String, f64>,
) -> LayoutResult<Cell> {
    match category {
        DeviceCategory::Mosfet => mosfet_template(doc, tech, name, params),
        DeviceCategory::Resistor => resistor_template(doc, tech, name, params),
        DeviceCategory::Capacitor => capacitor_template(doc, tech, name, params),
        _ => LayoutError::fail(format!("no template generator for {:?}", category)),
    }
}

/// MOSFET: an active region crossed by a vertical poly gate, with
/// metal source/drain landing pins. Parameters `w` and `l` arrive in
/// meters and are floored at the technology minimums.
fn mosfet_template(
    doc: &mut LayoutDocument,
    tech: &TechnologyDatabase,
    name: &str,
    params: &BTreeMap<String, f64>,
) -> LayoutResult<Cell> {
    let w = tech.snap((params.get("w").copied().unwrap_or(1e-6) * 1e6).max(min_width_of(tech, "ACTIVE")));
    let l = tech.snap((params.get("l").copied().unwrap_or(0.18e-6) * 1e6).max(min_width_of(tech, "POLY")));
    let mut cell = Cell::new(name);
    cell.elements.push(Element {
        id: ElementId(doc.alloc_id()),
        layer: LayerId::drawing("ACTIVE"),
        net: None,
        geometry: Geometry::Rect(Rect::new(
            Point::new(0.0, 0.0),
            Size::new(2.0 * SD_EXTENSION + l, w),
        )),
        props: BTreeMap::new(),
    });
    cell.elements.push(Element {
        id: ElementId(doc.alloc_id()),
        layer: LayerId::drawing("POLY"),
        net: None,
        geometry: Geometry::Rect(Rect::new(
            Point::new(SD_EXTENSION, -POLY_OVERHANG),
            Size::new(l, w + 2.0 * POLY_OVERHANG),
        )),
        props: BTreeMap::new(),
    });
    let pin = |doc: &mut LayoutDocument, pname: &str, loc, layer: &str, role| Pin {
        id: PinId(doc.alloc_id()),
        name: pname.to_string(),
        loc,
        size: Size::new(0.2, 0.2),
        layer: LayerId::drawing(layer),
        net: None,
        role,
    };
    cell.pins.push(pin(
        doc,
        "S",
        Point::new(SD_EXTENSION / 2.0, w / 2.0),
        "MET1",
        PinRole::Source,
    ));
    cell.pins.push(pin(
        doc,
        "D",
        Point::new(1.5 * SD_EXTENSION + l, w / 2.0),
        "MET1",
        PinRole::Drain,
    ));
    cell.pins.push(pin(
        doc,
        "G",
        Point::new(SD_EXTENSION + l / 2.0, w + POLY_OVERHANG),
        "POLY",
        PinRole::Gate,
    ));
    cell.pins.push(pin(
        doc,
        "B",
        Point::new(0.0, 0.0),
        "ACTIVE",
        PinRole::Bulk,
    ));
    Ok(cell)
}

/// Resistor: a straight poly wire sized from the target resistance at
/// the assumed sheet resistance.
fn resistor_template(
    doc: &mut LayoutDocument,
    tech: &TechnologyDatabase,
    name: &str,
    params: &BTreeMap<String, f64>,
) -> LayoutResult<Cell> {
    let r = params.get("r").copied().unwrap_or(1000.0);
    let width = min_width_of(tech, "POLY");
    let squares = (r / SHEET_RES).max(1.0);
    let length = tech.snap(squares * width);
    let mut cell = Cell::new(name);
    cell.elements.push(Element {
        id: ElementId(doc.alloc_id()),
        layer: LayerId::drawing("POLY"),
        net: None,
        geometry: Geometry::Path(Path::new(
            vec![Point::new(0.0, 0.0), Point::new(length, 0.0)],
            width,
        )?),
        props: BTreeMap::new(),
    });
    let pin = |doc: &mut LayoutDocument, pname: &str, loc| Pin {
        id: PinId(doc.alloc_id()),
        name: pname.to_string(),
        loc,
        size: Size::new(0.2, 0.2),
        layer: LayerId::drawing("MET1"),
        net: None,
        role: PinRole::Signal,
    };
    cell.pins.push(pin(doc, "P", Point::new(0.0, 0.0)));
    cell.pins.push(pin(doc, "N", Point::new(length, 0.0)));
    Ok(cell)
}

/// Capacitor: stacked metal plates sized from the target capacitance
/// at the assumed plate density. The bottom plate extends past the top
/// plate for its terminal.
fn capacitor_template(
    doc: &mut LayoutDocument,
    tech: &TechnologyDatabase,
    name: &str,
    params: &BTreeMap<String, f64>,
) -> LayoutResult<Cell> {
    let c = params.get("c").copied().unwrap_or(1e-13);
    let side = tech.snap((c / CAP_DENSITY).sqrt().max(0.5));
    let mut cell = Cell::new(name);
    cell.elements.push(Element {
        id: ElementId(doc.alloc_id()),
        layer: LayerId::drawing("MET1"),
        net: None,
        geometry: Geometry::Rect(Rect::new(
            Point::new(0.0, 0.0),
            Size::new(side + 2.0 * SD_EXTENSION, side),
        )),
        props: BTreeMap::new(),
    });
    cell.elements.push(Element {
        id: ElementId(doc.alloc_id()),
        layer: LayerId::drawing("MET2"),
        net: None,
        geometry: Geometry::Rect(Rect::new(Point::new(0.0, 0.0), Size::new(side, side))),
        props: BTreeMap::new(),
    });
    let pin = |doc: &mut LayoutDocument, pname: &str, loc, layer: &str| Pin {
        id: PinId(doc.alloc_id()),
        name: pname.to_string(),
        loc,
        size: Size::new(0.2, 0.2),
        layer: LayerId::drawing(layer),
        net: None,
        role: PinRole::Signal,
    };
    cell.pins
        .push(pin(doc, "P", Point::new(side / 2.0, side / 2.0), "MET2"));
    cell.pins.push(pin(
        doc,
        "N",
        Point::new(side + 1.5 * SD_EXTENSION, side / 2.0),
        "MET1",
    ));
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schematic::{NetLabel, SourceDevice, Wire};

    fn device(name: &str, kind: &str, params: &[(&str, f64)], ports: &[(&str, f64, f64)]) -> SourceDevice {
        SourceDevice {
            name: name.to_string(),
            kind_id: kind.to_string(),
            params: params.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            loc: Point::default(),
            ports: ports
                .iter()
                .map(|(p, x, y)| (p.to_string(), Point::new(*x, *y)))
                .collect(),
        }
    }
    fn wire(ax: f64, ay: f64, bx: f64, by: f64) -> Wire {
        Wire {
            a: Point::new(ax, ay),
            b: Point::new(bx, by),
            net: None,
        }
    }
    /// Voltage source driving two series resistors to ground
    fn divider() -> SourceGraph {
        SourceGraph {
            name: "divider".into(),
            devices: vec![
                device("v1", "vsource", &[("dc", 1.0)], &[("P", 0.0, 30.0), ("N", 0.0, 0.0)]),
                device("r1", "res", &[("r", 1000.0)], &[("P", 10.0, 30.0), ("N", 10.0, 15.0)]),
                device("r2", "res", &[("r", 1000.0)], &[("P", 10.0, 15.0), ("N", 10.0, 0.0)]),
                device("g1", "gnd", &[], &[("P", 5.0, 0.0)]),
            ],
            wires: vec![
                wire(0.0, 30.0, 10.0, 30.0),
                wire(10.0, 0.0, 5.0, 0.0),
                wire(5.0, 0.0, 0.0, 0.0),
            ],
            labels: vec![NetLabel {
                text: "mid".into(),
                loc: Point::new(10.0, 15.0),
            }],
        }
    }

    #[test]
    fn hash_is_stable_and_content_sensitive() {
        let g = divider();
        assert_eq!(schematic_hash(&g).unwrap(), schematic_hash(&g).unwrap());
        let mut g2 = g.clone();
        g2.devices[1].params.insert("r".into(), 2000.0);
        assert_ne!(schematic_hash(&g).unwrap(), schematic_hash(&g2).unwrap());
    }
    #[test]
    fn identical_devices_share_template() {
        let tech = TechnologyDatabase::example();
        let flow = LayoutFlow::new(&tech);
        let result = flow.run(&divider()).unwrap();
        // Both 1k resistors reuse one template cell
        assert_eq!(result.unit.device_cells.len(), 1);
        assert_eq!(result.unit.components.len(), 2);
        let keys: Vec<_> = result
            .doc
            .cells
            .get(result.top)
            .unwrap()
            .instances
            .iter()
            .map(|i| i.cell)
            .collect();
        assert_eq!(keys[0], keys[1]);
    }
    #[test]
    fn mosfet_template_pins_and_roles() {
        let tech = TechnologyDatabase::example();
        let mut doc = LayoutDocument::new("t");
        let params: BTreeMap<String, f64> =
            [("w".to_string(), 1e-6), ("l".to_string(), 0.18e-6)].into();
        let cell = mosfet_template(&mut doc, &tech, "nmos_t", &params).unwrap();
        assert_eq!(cell.pins.len(), 4);
        assert!(cell.pins.iter().any(|p| p.role == PinRole::Gate));
        assert_eq!(cell.elements.len(), 2);
        // Gate length floored at the poly minimum
        let poly = &cell.elements[1];
        match &poly.geometry {
            Geometry::Rect(r) => assert!(r.width() >= 0.15),
            _ => panic!("expected rect"),
        }
    }
    #[test]
    fn port_resolution_fallbacks() {
        let tech = TechnologyDatabase::example();
        let mut doc = LayoutDocument::new("t");
        let params: BTreeMap<String, f64> = [("w".to_string(), 1e-6)].into();
        let cell = mosfet_template(&mut doc, &tech, "m", &params).unwrap();
        assert_eq!(resolve_pin(&cell, "G").unwrap().name, "G");
        assert_eq!(resolve_pin(&cell, "g").unwrap().name, "G");
        assert_eq!(resolve_pin(&cell, "gate").unwrap().name, "G");
        assert_eq!(resolve_pin(&cell, "drain").unwrap().name, "D");
        assert!(resolve_pin(&cell, "nonesuch").is_none());
    }
    #[test]
    fn divider_flow_end_to_end() {
        let tech = TechnologyDatabase::example();
        let flow = LayoutFlow::new(&tech);
        let result = flow.run(&divider()).unwrap();

        let top = result.doc.cells.get(result.top).unwrap();
        // Physical devices only: two resistor instances
        assert_eq!(top.instances.len(), 2);
        // Named and generated nets registered
        assert!(top.net_named("mid").is_some());
        assert!(top.net_named("0").is_some());

        // Wires at minimum width, no metal area rules: these categories stay clean
        assert_eq!(result.report.count(ViolationKind::MinWidth), 0);
        assert_eq!(result.report.count(ViolationKind::MinArea), 0);
        assert_eq!(result.report.count(ViolationKind::Antenna), 0);
        // Landing pads and rail-tap vias keep connectivity whole
        assert_eq!(result.report.count(ViolationKind::Open), 0);
        assert_eq!(result.report.count(ViolationKind::Enclosure), 0);
        // The ground leg crosses the mid wire on the opposite routing
        // layer; the shorts check flags cross-layer intersections
        assert_eq!(result.report.count(ViolationKind::Short), 1);

        assert!(result.metrics.score > 0.0);
        assert!(result.metrics.area > 0.0);
        // Violations arrive with their messages attached
        assert!(result
            .metrics
            .violations
            .iter()
            .any(|(kind, msg)| *kind == ViolationKind::Short && !msg.is_empty()));
        // Source and ground references are recorded, not errored
        assert_eq!(result.skipped, vec!["v1".to_string(), "g1".to_string()]);
        assert!(result.unrouted.is_empty());
        assert!(!result.unit.is_stale(schematic_hash(&divider()).unwrap()));
        assert!(result.unit.is_stale(0));
    }
    #[test]
    fn annealing_config_flows_through() {
        let tech = TechnologyDatabase::example();
        let config = FlowConfig {
            placer: PlacerChoice::Annealing,
            router: RouterChoice::Steiner,
            annealing: AnnealingConfig {
                max_iterations: 100,
                ..Default::default()
            },
        };
        let flow = LayoutFlow::with_config(&tech, config);
        let result = flow.run(&divider()).unwrap();
        assert_eq!(
            result.doc.cells.get(result.top).unwrap().instances.len(),
            2
        );
    }
    #[test]
    fn unknown_device_kind_is_skipped() {
        let tech = TechnologyDatabase::example();
        let flow = LayoutFlow::new(&tech);
        let mut g = divider();
        g.devices[1].kind_id = "warp_core".into();
        let result = flow.run(&g).unwrap();
        assert!(result.skipped.contains(&"r1".to_string()));
        // The remaining resistor still gets layout
        assert_eq!(
            result.doc.cells.get(result.top).unwrap().instances.len(),
            1
        );
    }
    #[test]
    fn unresolvable_port_drops_connection() {
        let tech = TechnologyDatabase::example();
        let flow = LayoutFlow::new(&tech);
        let mut g = divider();
        // Rename one resistor terminal past every resolution fallback
        let loc = g.devices[1].ports.remove("N").unwrap();
        g.devices[1].ports.insert("Q".into(), loc);
        let result = flow.run(&g).unwrap();
        assert_eq!(
            result.doc.cells.get(result.top).unwrap().instances.len(),
            2
        );
    }
}
