//!
//! # Net Extraction
//!
//! Unions wire endpoints and device ports into named electrical nets,
//! the shared front-end adapter feeding the auto-layout pipeline.
//!
//! Endpoints are snapped to an integer grid to absorb floating-point
//! jitter; endpoints sharing a snapped position form implicit junctions.
//!

// Std-Lib
use std::collections::{BTreeMap, HashMap};

// Crates.io
use log::debug;

// Local Imports
use crate::geom::Point;
use crate::schematic::{DeviceCatalog, DeviceCategory, SourceGraph};

///
/// # Union-Find
///
/// Disjoint-set structure with path compression and union by rank,
/// used for connectivity grouping here and in the DRC opens check.
///
#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}
impl UnionFind {
    /// Create with `n` singleton entries
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }
    /// Add one more singleton entry, returning its index
    pub fn push(&mut self) -> usize {
        let idx = self.parent.len();
        self.parent.push(idx);
        self.rank.push(0);
        idx
    }
    /// Find the root of `x`, compressing paths along the way
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }
    /// Union the sets containing `a` and `b`
    pub fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
    /// Number of entries
    pub fn len(&self) -> usize {
        self.parent.len()
    }
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
    /// Number of distinct connected components
    pub fn component_count(&mut self) -> usize {
        let n = self.len();
        let mut roots = std::collections::HashSet::new();
        for i in 0..n {
            let r = self.find(i);
            roots.insert(r);
        }
        roots.len()
    }
}

/// Reference to one device port on a net
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRef {
    pub device: String,
    pub port: String,
}

/// # Extracted Net
///
/// One electrical net: resolved name, source endpoints, and the device
/// ports it connects.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedNet {
    pub name: String,
    pub endpoints: Vec<Point>,
    pub connections: Vec<PortRef>,
}

/// Snap a point to the integer grid used for junction detection
fn snap(p: &Point) -> (i64, i64) {
    (p.x.round() as i64, p.y.round() as i64)
}

/// Extract electrical nets from `graph`.
///
/// Wire endpoints and device ports sharing a grid-snapped position are
/// unioned; each wire also unions its own two endpoints. Net names are
/// resolved per group with priority: an explicit label at a merged
/// endpoint, then the first wire-carried name, then a generated `netN`
/// name in deterministic group order. Any net touching a port of a
/// ground-category device is renamed to "0" unconditionally.
pub fn extract_nets(graph: &SourceGraph, catalog: &DeviceCatalog) -> Vec<ExtractedNet> {
    // Node layout: two endpoints per wire, then one node per device port
    let mut uf = UnionFind::new(graph.wires.len() * 2);
    let mut by_pos: HashMap<(i64, i64), usize> = HashMap::new();
    let mut node_pos: Vec<Point> = Vec::new();

    let mut join = |uf: &mut UnionFind, by_pos: &mut HashMap<(i64, i64), usize>, idx: usize, p: &Point| {
        match by_pos.get(&snap(p)) {
            Some(&first) => uf.union(first, idx),
            None => {
                by_pos.insert(snap(p), idx);
            }
        }
    };

    for (w, wire) in graph.wires.iter().enumerate() {
        let (ia, ib) = (2 * w, 2 * w + 1);
        node_pos.push(wire.a);
        node_pos.push(wire.b);
        join(&mut uf, &mut by_pos, ia, &wire.a);
        join(&mut uf, &mut by_pos, ib, &wire.b);
        // A wire connects itself
        uf.union(ia, ib);
    }
    // Device ports join by position too
    let mut port_nodes: Vec<(usize, usize, String)> = Vec::new(); // (node, device-index, port-name)
    for (d, dev) in graph.devices.iter().enumerate() {
        for (port, loc) in &dev.ports {
            let idx = uf.push();
            node_pos.push(*loc);
            join(&mut uf, &mut by_pos, idx, loc);
            port_nodes.push((idx, d, port.clone()));
        }
    }

    // Gather groups, ordered deterministically by their smallest node index
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for node in 0..uf.len() {
        let root = uf.find(node);
        let entry = groups.entry(root).or_default();
        entry.push(node);
    }
    let mut ordered: Vec<Vec<usize>> = groups.into_values().collect();
    ordered.sort_by_key(|nodes| *nodes.iter().min().unwrap_or(&usize::MAX));

    // Index labels by snapped position
    let mut labels_at: HashMap<(i64, i64), &str> = HashMap::new();
    for label in &graph.labels {
        labels_at.entry(snap(&label.loc)).or_insert(label.text.as_str());
    }

    let mut nets = Vec::new();
    let mut auto_index = 0usize;
    for nodes in ordered {
        // Resolve the group's name: label > wire-carried > generated
        let mut label_name: Option<&str> = None;
        let mut wire_name: Option<&str> = None;
        for &node in &nodes {
            if label_name.is_none() {
                if let Some(&text) = labels_at.get(&snap(&node_pos[node])) {
                    label_name = Some(text);
                }
            }
            if node < graph.wires.len() * 2 && wire_name.is_none() {
                if let Some(ref name) = graph.wires[node / 2].net {
                    wire_name = Some(name.as_str());
                }
            }
        }
        let mut name = match (label_name, wire_name) {
            (Some(l), _) => l.to_string(),
            (None, Some(w)) => w.to_string(),
            (None, None) => format!("net{}", auto_index),
        };
        if label_name.is_none() && wire_name.is_none() {
            auto_index += 1;
        }

        // Collect connections, and force ground nets to "0"
        let mut connections = Vec::new();
        for (node, d, port) in &port_nodes {
            if nodes.contains(node) {
                let dev = &graph.devices[*d];
                connections.push(PortRef {
                    device: dev.name.clone(),
                    port: port.clone(),
                });
                let is_ground = catalog
                    .device(&dev.kind_id)
                    .map(|def| def.category == DeviceCategory::Ground)
                    .unwrap_or(false);
                if is_ground {
                    name = "0".to_string();
                }
            }
        }
        let endpoints = nodes.iter().map(|&n| node_pos[n]).collect();
        debug!("extracted net {:?} with {} connections", name, connections.len());
        nets.push(ExtractedNet {
            name,
            endpoints,
            connections,
        });
    }
    nets
}
