//!
//! # Design-Rule Checking
//!
//! Batch verification of a layout document against its technology
//! database. The hierarchy is flattened through instance-transform
//! chains first; all checks then run over flat, net-annotated shapes.
//!
//! Seven checks: minimum width, minimum spacing, minimum area, via
//! enclosure, layer density, electrical shorts, and electrical opens,
//! plus antenna-ratio verification on nets with gate pins.
//!

// Std-Lib
use std::collections::{BTreeMap, HashMap};

// Crates.io
use log::{debug, info};
use serde::{Deserialize, Serialize};

// Local Imports
use crate::bbox::BoundBox;
use crate::data::{Cell, CellKey, LayerId, LayoutDocument, NetId, PinRole};
use crate::error::{LayoutError, LayoutResult};
use crate::extract::UnionFind;
use crate::geom::{apply_chain, Geometry, GeometryOps, Point, Rect, Transform, TransformTrait, EPS};
use crate::tech::TechnologyDatabase;

/// Violation category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ViolationKind {
    MinWidth,
    MinSpacing,
    MinArea,
    Enclosure,
    Density,
    Short,
    Open,
    Antenna,
}
impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MinWidth => "min-width",
            Self::MinSpacing => "min-spacing",
            Self::MinArea => "min-area",
            Self::Enclosure => "enclosure",
            Self::Density => "density",
            Self::Short => "short",
            Self::Open => "open",
            Self::Antenna => "antenna",
        };
        write!(f, "{}", s)
    }
}

/// One design-rule violation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
    pub layer: Option<LayerId>,
    /// Region of the offending geometry, in top-cell coordinates
    pub region: BoundBox,
}

/// Full check report
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DrcReport {
    pub violations: Vec<Violation>,
}
impl DrcReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
    /// Number of violations of `kind`
    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }
    /// Violation counts per category
    pub fn summary(&self) -> BTreeMap<ViolationKind, usize> {
        let mut map = BTreeMap::new();
        for v in &self.violations {
            *map.entry(v.kind).or_insert(0) += 1;
        }
        map
    }
}

/// One flattened, net-annotated shape in top-cell coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct FlatShape {
    pub layer: LayerId,
    /// Instance-path-qualified net name, e.g. "xdiff/out"
    pub net: Option<String>,
    pub geometry: Geometry,
}

/// One flattened via
#[derive(Debug, Clone, PartialEq)]
pub struct FlatVia {
    pub viadef: String,
    pub loc: Point,
    pub net: Option<String>,
}

/// One flattened pin
#[derive(Debug, Clone, PartialEq)]
pub struct FlatPin {
    pub net: Option<String>,
    pub role: PinRole,
    pub layer: LayerId,
    pub rect: Rect,
}

/// Flattened view of one cell hierarchy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatLayout {
    pub shapes: Vec<FlatShape>,
    pub vias: Vec<FlatVia>,
    pub pins: Vec<FlatPin>,
}
impl FlatLayout {
    /// Bounding box over all flattened geometry
    pub fn bbox(&self) -> BoundBox {
        let mut bbox = BoundBox::empty();
        for shape in &self.shapes {
            let b = shape.geometry.bbox();
            bbox = bbox.union_point(&b.p0).union_point(&b.p1);
        }
        for pin in &self.pins {
            bbox = bbox.union_point(&pin.rect.min()).union_point(&pin.rect.max());
        }
        bbox
    }
}

/// Flatten the hierarchy under `top` into top-cell coordinates.
///
/// Each instance's transform is pushed onto a chain applied child-first;
/// net identities become instance-path-qualified names so that distinct
/// sub-instance nets never merge by accident.
pub fn flatten(doc: &LayoutDocument, top: CellKey) -> LayoutResult<FlatLayout> {
    let mut out = FlatLayout::default();
    let mut chain: Vec<Transform> = Vec::new();
    walk(doc, top, &mut chain, "", &mut out)?;
    debug!(
        "flattened {} shapes, {} vias, {} pins",
        out.shapes.len(),
        out.vias.len(),
        out.pins.len()
    );
    Ok(out)
}

/// Apply an outermost-first transform chain to a whole [Geometry]
fn chain_geometry(chain: &[Transform], g: &Geometry) -> Geometry {
    chain.iter().rev().fold(g.clone(), |g, t| g.transform(t))
}

fn qualify(prefix: &str, net: &str) -> String {
    if prefix.is_empty() {
        net.to_string()
    } else {
        format!("{}/{}", prefix, net)
    }
}

fn walk(
    doc: &LayoutDocument,
    key: CellKey,
    chain: &mut Vec<Transform>,
    prefix: &str,
    out: &mut FlatLayout,
) -> LayoutResult<()> {
    let cell: &Cell = doc.cells.get(key).ok_or(LayoutError::CellNotFound(key))?;
    // Ids with no registered [Net] record keep their identity under a
    // raw "#id" name rather than degrading to net-less
    let net_name = |id: NetId| match cell.net(id) {
        Some(n) => qualify(prefix, &n.name),
        None => qualify(prefix, &format!("#{}", id.0)),
    };
    for elem in &cell.elements {
        out.shapes.push(FlatShape {
            layer: elem.layer.clone(),
            net: elem.net.map(&net_name),
            geometry: chain_geometry(chain, &elem.geometry),
        });
    }
    for via in &cell.vias {
        out.vias.push(FlatVia {
            viadef: via.viadef.clone(),
            loc: apply_chain(chain, via.loc),
            net: via.net.map(&net_name),
        });
    }
    for pin in &cell.pins {
        let rect = chain.iter().rev().fold(pin.rect(), |r, t| r.transform(t));
        out.pins.push(FlatPin {
            net: pin.net.map(&net_name),
            role: pin.role,
            layer: pin.layer.clone(),
            rect,
        });
    }
    for inst in &cell.instances {
        chain.push(inst.transform);
        let child_prefix = qualify(prefix, &inst.name);
        walk(doc, inst.cell, chain, &child_prefix, out)?;
        chain.pop();
    }
    Ok(())
}

/// Shape width under the minimum-width rule: the shorter rect side, a
/// path's wire width, or the polygon parallel-edge approximation.
fn shape_width(g: &Geometry) -> Option<f64> {
    match g {
        Geometry::Rect(r) => Some(r.width().min(r.height())),
        Geometry::Path(p) => Some(p.width),
        Geometry::Polygon(p) => p.min_width(),
    }
}

/// Run all checks on the hierarchy under `top`
pub fn run_drc(
    doc: &LayoutDocument,
    top: CellKey,
    tech: &TechnologyDatabase,
) -> LayoutResult<DrcReport> {
    let flat = flatten(doc, top)?;
    let mut report = DrcReport::default();
    check_widths_and_areas(&flat, tech, &mut report);
    check_spacing(&flat, tech, &mut report);
    check_shorts(&flat, &mut report);
    check_enclosures(&flat, tech, &mut report);
    check_density(&flat, tech, &mut report);
    check_opens(&flat, tech, &mut report);
    check_antenna(&flat, tech, &mut report);
    info!(
        "drc finished: {} violations over {} shapes",
        report.violations.len(),
        flat.shapes.len()
    );
    Ok(report)
}

fn check_widths_and_areas(flat: &FlatLayout, tech: &TechnologyDatabase, report: &mut DrcReport) {
    for shape in &flat.shapes {
        let Some(rules) = tech.rules(&shape.layer) else {
            continue;
        };
        if let (Some(min_width), Some(width)) = (rules.min_width, shape_width(&shape.geometry)) {
            if width < min_width - EPS {
                report.violations.push(Violation {
                    kind: ViolationKind::MinWidth,
                    message: format!(
                        "width {:.4} below minimum {:.4} on {}",
                        width, min_width, shape.layer.name
                    ),
                    layer: Some(shape.layer.clone()),
                    region: shape.geometry.bbox(),
                });
            }
        }
        if let Some(min_area) = rules.min_area {
            let area = shape.geometry.area();
            if area < min_area - EPS {
                report.violations.push(Violation {
                    kind: ViolationKind::MinArea,
                    message: format!(
                        "area {:.4} below minimum {:.4} on {}",
                        area, min_area, shape.layer.name
                    ),
                    layer: Some(shape.layer.clone()),
                    region: shape.geometry.bbox(),
                });
            }
        }
    }
}

fn pair_region(a: &FlatShape, b: &FlatShape) -> BoundBox {
    a.geometry
        .bbox()
        .union_point(&b.geometry.bbox().p0)
        .union_point(&b.geometry.bbox().p1)
}

/// Spacing: a pairwise same-layer sweep. Same-net pairs are exempt, as
/// are touching pairs where both shapes carry nets (those belong to
/// the shorts check). Touching pairs with a net-less side stay in
/// scope here. A distance exactly equal to the rule passes.
fn check_spacing(flat: &FlatLayout, tech: &TechnologyDatabase, report: &mut DrcReport) {
    // Bucket by layer first; pairwise within each bucket
    let mut by_layer: BTreeMap<&LayerId, Vec<&FlatShape>> = BTreeMap::new();
    for shape in &flat.shapes {
        by_layer.entry(&shape.layer).or_default().push(shape);
    }
    for (layer, shapes) in by_layer {
        let Some(min_spacing) = tech.rules(layer).and_then(|r| r.min_spacing) else {
            continue;
        };
        for (i, a) in shapes.iter().enumerate() {
            for b in &shapes[i + 1..] {
                let same_net = match (&a.net, &b.net) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                };
                if same_net {
                    continue;
                }
                let dist = crate::geom::minimum_distance(&a.geometry, &b.geometry);
                if dist <= EPS && a.net.is_some() && b.net.is_some() {
                    continue;
                }
                if dist < min_spacing - EPS {
                    report.violations.push(Violation {
                        kind: ViolationKind::MinSpacing,
                        message: format!(
                            "spacing {:.4} below minimum {:.4} on {}",
                            dist, min_spacing, layer.name
                        ),
                        layer: Some(layer.clone()),
                        region: pair_region(a, b),
                    });
                }
            }
        }
    }
}

/// Shorts: any two shapes whose geometries intersect and whose net
/// assignments both exist and differ, regardless of layer. Cross-layer
/// intersection is flagged as-is; a deliberately broad policy, neither
/// extended nor restricted here.
fn check_shorts(flat: &FlatLayout, report: &mut DrcReport) {
    for (i, a) in flat.shapes.iter().enumerate() {
        let Some(ref na) = a.net else {
            continue;
        };
        for b in &flat.shapes[i + 1..] {
            let Some(ref nb) = b.net else {
                continue;
            };
            if na == nb {
                continue;
            }
            if a.geometry.intersects(&b.geometry) {
                let layer = (a.layer == b.layer).then(|| a.layer.clone());
                report.violations.push(Violation {
                    kind: ViolationKind::Short,
                    message: format!("nets {} and {} intersect", na, nb),
                    layer,
                    region: pair_region(a, b),
                });
            }
        }
    }
}

/// Sample points for enclosure containment: center plus the two
/// diagonal corners of the required landing rectangle.
fn enclosure_samples(required: &Rect) -> [Point; 3] {
    [required.center(), required.min(), required.max()]
}

fn check_enclosures(flat: &FlatLayout, tech: &TechnologyDatabase, report: &mut DrcReport) {
    for via in &flat.vias {
        let Some(def) = tech.viadef(&via.viadef) else {
            report.violations.push(Violation {
                kind: ViolationKind::Enclosure,
                message: format!("via references unknown definition {}", via.viadef),
                layer: None,
                region: BoundBox::from_point(via.loc),
            });
            continue;
        };
        let cut = Rect::new(
            Point::new(
                via.loc.x - def.cut_size.w / 2.0,
                via.loc.y - def.cut_size.h / 2.0,
            ),
            def.cut_size,
        );
        for (layer, enclosure) in [
            (&def.bottom, def.enclosure_bottom),
            (&def.top, def.enclosure_top),
        ] {
            let required = cut.expanded(enclosure);
            let covered = enclosure_samples(&required).iter().all(|pt| {
                flat.shapes
                    .iter()
                    .any(|s| &s.layer == layer && s.geometry.contains(pt))
            });
            if !covered {
                report.violations.push(Violation {
                    kind: ViolationKind::Enclosure,
                    message: format!(
                        "via {} cut not enclosed by {:.3} on {}",
                        def.name, enclosure, layer.name
                    ),
                    layer: Some(layer.clone()),
                    region: BoundBox::from_points(required.min(), required.max()),
                });
            }
        }
    }
}

fn check_density(flat: &FlatLayout, tech: &TechnologyDatabase, report: &mut DrcReport) {
    let bbox = flat.bbox();
    if bbox.is_empty() {
        return;
    }
    let design_area = bbox.area();
    if design_area <= EPS {
        return;
    }
    let mut areas: BTreeMap<&LayerId, f64> = BTreeMap::new();
    for shape in &flat.shapes {
        *areas.entry(&shape.layer).or_insert(0.0) += shape.geometry.area();
    }
    for layer_def in &tech.layers {
        let Some(rules) = tech.rules(&layer_def.layer) else {
            continue;
        };
        if rules.min_density.is_none() && rules.max_density.is_none() {
            continue;
        }
        let density = areas.get(&layer_def.layer).copied().unwrap_or(0.0) / design_area;
        let bad = rules.min_density.map_or(false, |m| density < m - EPS)
            || rules.max_density.map_or(false, |m| density > m + EPS);
        if bad {
            report.violations.push(Violation {
                kind: ViolationKind::Density,
                message: format!(
                    "density {:.4} outside bounds on {}",
                    density, layer_def.layer.name
                ),
                layer: Some(layer_def.layer.clone()),
                region: bbox,
            });
        }
    }
}

/// Opens: each named net's shapes and via cuts must form one connected
/// component. Same-layer shapes connect when touching; a via connects
/// shapes on its bottom and top layers that contain its location.
fn check_opens(flat: &FlatLayout, tech: &TechnologyDatabase, report: &mut DrcReport) {
    let mut by_net: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, shape) in flat.shapes.iter().enumerate() {
        if let Some(ref net) = shape.net {
            by_net.entry(net.as_str()).or_default().push(i);
        }
    }
    for (net, indices) in by_net {
        if indices.len() < 2 {
            continue;
        }
        let mut uf = UnionFind::new(indices.len());
        // Same-layer touching shapes
        for (a, &ia) in indices.iter().enumerate() {
            for (b, &ib) in indices.iter().enumerate().skip(a + 1) {
                let (sa, sb) = (&flat.shapes[ia], &flat.shapes[ib]);
                if sa.layer == sb.layer && sa.geometry.intersects(&sb.geometry) {
                    uf.union(a, b);
                }
            }
        }
        // Vias bridge their bottom and top layers
        for via in flat.vias.iter().filter(|v| v.net.as_deref() == Some(net)) {
            let Some(def) = tech.viadef(&via.viadef) else {
                continue;
            };
            let touched: Vec<usize> = indices
                .iter()
                .enumerate()
                .filter(|(_, &i)| {
                    let s = &flat.shapes[i];
                    (s.layer == def.bottom || s.layer == def.top)
                        && s.geometry.contains(&via.loc)
                })
                .map(|(a, _)| a)
                .collect();
            for pair in touched.windows(2) {
                uf.union(pair[0], pair[1]);
            }
        }
        let components = uf.component_count();
        if components > 1 {
            let mut region = BoundBox::empty();
            for &i in &indices {
                let b = flat.shapes[i].geometry.bbox();
                region = region.union_point(&b.p0).union_point(&b.p1);
            }
            report.violations.push(Violation {
                kind: ViolationKind::Open,
                message: format!("net {} split into {} islands", net, components),
                layer: None,
                region,
            });
        }
    }
}

/// Antenna: per net and per ruled layer, the ratio of that layer's
/// conductor area to the net's total gate-pin area must not exceed the
/// rule. Nets without gate pins are skipped.
fn check_antenna(flat: &FlatLayout, tech: &TechnologyDatabase, report: &mut DrcReport) {
    let mut gate_area: HashMap<&str, f64> = HashMap::new();
    for pin in &flat.pins {
        if pin.role == PinRole::Gate {
            if let Some(ref net) = pin.net {
                *gate_area.entry(net.as_str()).or_insert(0.0) += pin.rect.size.area();
            }
        }
    }
    for rule in &tech.antenna_rules {
        let mut metal_area: HashMap<&str, f64> = HashMap::new();
        for shape in flat.shapes.iter().filter(|s| s.layer == rule.layer) {
            if let Some(ref net) = shape.net {
                *metal_area.entry(net.as_str()).or_insert(0.0) += shape.geometry.area();
            }
        }
        let mut nets: Vec<&&str> = metal_area.keys().collect();
        nets.sort();
        for net in nets {
            let Some(&gate) = gate_area.get(*net) else {
                continue;
            };
            if gate <= EPS {
                continue;
            }
            let ratio = metal_area[*net] / gate;
            if ratio > rule.max_ratio + EPS {
                report.violations.push(Violation {
                    kind: ViolationKind::Antenna,
                    message: format!(
                        "net {} antenna ratio {:.1} exceeds {:.1} on {}",
                        net, ratio, rule.max_ratio, rule.layer.name
                    ),
                    layer: Some(rule.layer.clone()),
                    region: BoundBox::empty(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Element, Instance, Net, NetId, Pin, Via};
    use crate::geom::{Rotation, Size};

    fn met1() -> LayerId {
        LayerId::drawing("MET1")
    }
    fn rect(x: f64, y: f64, w: f64, h: f64) -> Geometry {
        Geometry::Rect(Rect::new(Point::new(x, y), Size::new(w, h)))
    }
    fn doc_with(elements: Vec<Element>) -> (LayoutDocument, CellKey) {
        let mut doc = LayoutDocument::new("t");
        let mut cell = Cell::new("top");
        cell.elements = elements;
        let key = doc.add_cell(cell);
        doc.top = Some(key);
        (doc, key)
    }
    fn elem(layer: LayerId, net: Option<NetId>, geometry: Geometry) -> Element {
        Element {
            layer,
            net,
            geometry,
            ..Default::default()
        }
    }

    #[test]
    fn clean_layout_passes() {
        let tech = TechnologyDatabase::example();
        let (doc, key) = doc_with(vec![elem(met1(), None, rect(0.0, 0.0, 1.0, 1.0))]);
        let report = run_drc(&doc, key, &tech).unwrap();
        assert!(report.is_clean());
    }
    #[test]
    fn narrow_shape_flagged() {
        let tech = TechnologyDatabase::example();
        let (doc, key) = doc_with(vec![elem(met1(), None, rect(0.0, 0.0, 0.05, 1.0))]);
        let report = run_drc(&doc, key, &tech).unwrap();
        assert_eq!(report.count(ViolationKind::MinWidth), 1);
    }
    #[test]
    fn small_area_flagged() {
        let tech = TechnologyDatabase::example();
        // POLY carries a 0.02 min-area rule; 0.1 x 0.1 = 0.01
        let (doc, key) = doc_with(vec![elem(
            LayerId::drawing("POLY"),
            None,
            rect(0.0, 0.0, 0.1, 0.1),
        )]);
        let report = run_drc(&doc, key, &tech).unwrap();
        assert_eq!(report.count(ViolationKind::MinArea), 1);
        // Below POLY's 0.15 min width too
        assert_eq!(report.count(ViolationKind::MinWidth), 1);
    }
    #[test]
    fn spacing_violation_and_exact_boundary() {
        let tech = TechnologyDatabase::example();
        // MET1 min spacing 0.1; gap of 0.05 violates
        let (doc, key) = doc_with(vec![
            elem(met1(), None, rect(0.0, 0.0, 1.0, 1.0)),
            elem(met1(), None, rect(1.05, 0.0, 1.0, 1.0)),
        ]);
        let report = run_drc(&doc, key, &tech).unwrap();
        assert_eq!(report.count(ViolationKind::MinSpacing), 1);

        // Exactly at the rule passes
        let (doc, key) = doc_with(vec![
            elem(met1(), None, rect(0.0, 0.0, 1.0, 1.0)),
            elem(met1(), None, rect(1.1, 0.0, 1.0, 1.0)),
        ]);
        let report = run_drc(&doc, key, &tech).unwrap();
        assert_eq!(report.count(ViolationKind::MinSpacing), 0);
    }
    #[test]
    fn same_net_spacing_exempt() {
        let tech = TechnologyDatabase::example();
        let net = Some(NetId(1));
        let (doc, key) = doc_with(vec![
            elem(met1(), net, rect(0.0, 0.0, 1.0, 1.0)),
            elem(met1(), net, rect(1.05, 0.0, 1.0, 1.0)),
        ]);
        let report = run_drc(&doc, key, &tech).unwrap();
        assert_eq!(report.count(ViolationKind::MinSpacing), 0);
    }
    #[test]
    fn unregistered_net_ids_keep_identity() {
        // No Net record for id 7; the flat names still match each other
        let (doc, key) = doc_with(vec![
            elem(met1(), Some(NetId(7)), rect(0.0, 0.0, 1.0, 1.0)),
            elem(met1(), Some(NetId(7)), rect(5.0, 0.0, 1.0, 1.0)),
        ]);
        let flat = flatten(&doc, key).unwrap();
        assert_eq!(flat.shapes[0].net.as_deref(), Some("#7"));
        assert_eq!(flat.shapes[0].net, flat.shapes[1].net);
    }
    #[test]
    fn netless_touching_pair_stays_spacing_checked() {
        let tech = TechnologyDatabase::example();
        // Overlapping MET1 shapes, one with no net: not a short
        // candidate, so spacing still applies
        let (doc, key) = doc_with(vec![
            elem(met1(), Some(NetId(1)), rect(0.0, 0.0, 1.0, 1.0)),
            elem(met1(), None, rect(0.5, 0.0, 1.0, 1.0)),
        ]);
        let report = run_drc(&doc, key, &tech).unwrap();
        assert_eq!(report.count(ViolationKind::MinSpacing), 1);
        assert_eq!(report.count(ViolationKind::Short), 0);
    }
    #[test]
    fn touching_different_nets_short() {
        let tech = TechnologyDatabase::example();
        let mut doc = LayoutDocument::new("t");
        let mut cell = Cell::new("top");
        cell.nets = vec![
            Net {
                id: NetId(1),
                name: "a".into(),
            },
            Net {
                id: NetId(2),
                name: "b".into(),
            },
        ];
        cell.elements = vec![
            elem(met1(), Some(NetId(1)), rect(0.0, 0.0, 1.0, 1.0)),
            elem(met1(), Some(NetId(2)), rect(0.5, 0.0, 1.0, 1.0)),
        ];
        let key = doc.add_cell(cell);
        let report = run_drc(&doc, key, &tech).unwrap();
        assert_eq!(report.count(ViolationKind::Short), 1);
        assert_eq!(report.count(ViolationKind::MinSpacing), 0);
    }
    #[test]
    fn cross_layer_intersection_is_a_short() {
        let tech = TechnologyDatabase::example();
        let mut doc = LayoutDocument::new("t");
        let mut cell = Cell::new("top");
        cell.nets = vec![
            Net {
                id: NetId(1),
                name: "a".into(),
            },
            Net {
                id: NetId(2),
                name: "b".into(),
            },
        ];
        // Overlapping shapes on different layers, different nets
        cell.elements = vec![
            elem(met1(), Some(NetId(1)), rect(0.0, 0.0, 1.0, 1.0)),
            elem(
                LayerId::drawing("MET2"),
                Some(NetId(2)),
                rect(0.5, 0.5, 1.0, 1.0),
            ),
        ];
        let key = doc.add_cell(cell);
        let report = run_drc(&doc, key, &tech).unwrap();
        assert_eq!(report.count(ViolationKind::Short), 1);
        let v = report
            .violations
            .iter()
            .find(|v| v.kind == ViolationKind::Short)
            .unwrap();
        assert!(v.layer.is_none());
    }
    #[test]
    fn disconnected_net_reports_open() {
        let tech = TechnologyDatabase::example();
        let mut doc = LayoutDocument::new("t");
        let mut cell = Cell::new("top");
        cell.nets = vec![Net {
            id: NetId(1),
            name: "a".into(),
        }];
        cell.elements = vec![
            elem(met1(), Some(NetId(1)), rect(0.0, 0.0, 1.0, 1.0)),
            elem(met1(), Some(NetId(1)), rect(5.0, 5.0, 1.0, 1.0)),
        ];
        let key = doc.add_cell(cell);
        let report = run_drc(&doc, key, &tech).unwrap();
        assert_eq!(report.count(ViolationKind::Open), 1);
    }
    #[test]
    fn via_heals_cross_layer_open() {
        let tech = TechnologyDatabase::example();
        let mut doc = LayoutDocument::new("t");
        let mut cell = Cell::new("top");
        cell.nets = vec![Net {
            id: NetId(1),
            name: "a".into(),
        }];
        cell.elements = vec![
            elem(met1(), Some(NetId(1)), rect(0.0, 0.0, 1.0, 1.0)),
            elem(
                LayerId::drawing("MET2"),
                Some(NetId(1)),
                rect(0.0, 0.0, 1.0, 1.0),
            ),
        ];
        cell.vias = vec![Via {
            viadef: "VIA1".into(),
            loc: Point::new(0.5, 0.5),
            net: Some(NetId(1)),
            ..Default::default()
        }];
        let key = doc.add_cell(cell);
        let report = run_drc(&doc, key, &tech).unwrap();
        assert_eq!(report.count(ViolationKind::Open), 0);
    }
    #[test]
    fn bare_via_flags_enclosure() {
        let tech = TechnologyDatabase::example();
        let mut doc = LayoutDocument::new("t");
        let mut cell = Cell::new("top");
        cell.vias = vec![Via {
            viadef: "VIA1".into(),
            loc: Point::new(0.5, 0.5),
            ..Default::default()
        }];
        // A shape keeps the design bbox non-degenerate
        cell.elements = vec![elem(met1(), None, rect(5.0, 5.0, 1.0, 1.0))];
        let key = doc.add_cell(cell);
        let report = run_drc(&doc, key, &tech).unwrap();
        // Both bottom and top landings are missing
        assert_eq!(report.count(ViolationKind::Enclosure), 2);
    }
    #[test]
    fn density_bounds_checked() {
        let mut tech = TechnologyDatabase::example();
        tech.rules.get_mut(&met1()).unwrap().max_density = Some(0.5);
        // One MET1 shape covering most of the design area
        let (doc, key) = doc_with(vec![
            elem(met1(), None, rect(0.0, 0.0, 10.0, 10.0)),
            elem(LayerId::drawing("MET2"), None, rect(0.0, 0.0, 11.0, 11.0)),
        ]);
        let report = run_drc(&doc, key, &tech).unwrap();
        assert_eq!(report.count(ViolationKind::Density), 1);
    }
    #[test]
    fn antenna_ratio_flagged() {
        let tech = TechnologyDatabase::example();
        let mut doc = LayoutDocument::new("t");
        let mut cell = Cell::new("top");
        cell.nets = vec![Net {
            id: NetId(1),
            name: "g".into(),
        }];
        // Large MET1 area against a tiny gate pin: ratio far above 400
        cell.elements = vec![elem(met1(), Some(NetId(1)), rect(0.0, 0.0, 100.0, 100.0))];
        cell.pins = vec![Pin {
            name: "G".into(),
            loc: Point::new(0.0, 0.0),
            size: Size::new(0.1, 0.1),
            layer: LayerId::drawing("POLY"),
            net: Some(NetId(1)),
            role: PinRole::Gate,
            ..Default::default()
        }];
        let key = doc.add_cell(cell);
        let report = run_drc(&doc, key, &tech).unwrap();
        assert_eq!(report.count(ViolationKind::Antenna), 1);
    }
    #[test]
    fn netless_gate_skipped() {
        let tech = TechnologyDatabase::example();
        let mut doc = LayoutDocument::new("t");
        let mut cell = Cell::new("top");
        cell.elements = vec![elem(met1(), None, rect(0.0, 0.0, 100.0, 100.0))];
        let key = doc.add_cell(cell);
        let report = run_drc(&doc, key, &tech).unwrap();
        assert_eq!(report.count(ViolationKind::Antenna), 0);
    }
    #[test]
    fn hierarchy_flattens_through_transforms() {
        let tech = TechnologyDatabase::example();
        let mut doc = LayoutDocument::new("t");
        let mut child = Cell::new("child");
        // Narrow bar at the child origin
        child.elements = vec![elem(met1(), None, rect(0.0, 0.0, 0.05, 1.0))];
        let child_key = doc.add_cell(child);
        let mut top = Cell::new("top");
        top.instances = vec![Instance {
            name: "x0".into(),
            cell: child_key,
            transform: Transform {
                loc: Point::new(10.0, 0.0),
                rotation: Rotation::R0,
                mirror_x: false,
                mirror_y: false,
            },
            ..Default::default()
        }];
        let top_key = doc.add_cell(top);
        let report = run_drc(&doc, top_key, &tech).unwrap();
        let v = report
            .violations
            .iter()
            .find(|v| v.kind == ViolationKind::MinWidth)
            .unwrap();
        // Region reported in top-cell coordinates
        assert!(v.region.p0.x >= 10.0 - EPS);
    }
    #[test]
    fn sub_instance_nets_stay_distinct() {
        let tech = TechnologyDatabase::example();
        let mut doc = LayoutDocument::new("t");
        let mut child = Cell::new("child");
        child.nets = vec![Net {
            id: NetId(1),
            name: "out".into(),
        }];
        child.elements = vec![elem(met1(), Some(NetId(1)), rect(0.0, 0.0, 1.0, 1.0))];
        let child_key = doc.add_cell(child);
        let mut top = Cell::new("top");
        top.instances = vec![
            Instance {
                name: "x0".into(),
                cell: child_key,
                transform: Transform::translate(0.0, 0.0),
                ..Default::default()
            },
            Instance {
                name: "x1".into(),
                cell: child_key,
                transform: Transform::translate(0.5, 0.0),
                ..Default::default()
            },
        ];
        let top_key = doc.add_cell(top);
        let flat = flatten(&doc, top_key).unwrap();
        let nets: Vec<_> = flat.shapes.iter().filter_map(|s| s.net.clone()).collect();
        assert_eq!(nets, vec!["x0/out".to_string(), "x1/out".to_string()]);
        // Overlapping copies of the same cell truly short
        let report = run_drc(&doc, top_key, &tech).unwrap();
        assert_eq!(report.count(ViolationKind::Short), 1);
    }
}
