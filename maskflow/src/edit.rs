//!
//! # Document Editing
//!
//! All document mutation flows through [Editor], under one contract:
//! locate the target cell, locate the target entity for update/remove,
//! apply the mutation to an in-memory copy, then commit atomically.
//! Either the whole operation succeeds and is recorded for undo, or it
//! fails and the document is left unchanged.
//!
//! Undo is snapshot-based: each successful mutation pushes the
//! pre-mutation document onto a bounded stack. Because the document is a
//! plain value, a snapshot is a structural copy whose cost scales with
//! document size; acceptable at small-to-medium scale.
//!

// Std-Lib
use std::collections::BTreeMap;
use std::collections::VecDeque;

// Crates.io
use log::debug;

// Local Imports
use crate::data::{
    Cell, CellKey, Constraint, Element, ElementId, Instance, InstanceId, Label, LabelId,
    LayerId, LayoutDocument, Net, NetId, Pin, PinId, PinRole, Via, ViaId,
};
use crate::error::{LayoutError, LayoutResult};
use crate::geom::{Geometry, Point, Size, Transform};

/// Default maximum number of retained undo snapshots
pub const DEFAULT_UNDO_DEPTH: usize = 100;

/// # Document Editor
///
/// Owns a [LayoutDocument] plus its undo and redo snapshot stacks.
/// Single-writer: concurrent mutation must be serialized externally.
#[derive(Debug, Clone)]
pub struct Editor {
    doc: LayoutDocument,
    undo_stack: VecDeque<LayoutDocument>,
    redo_stack: Vec<LayoutDocument>,
    depth: usize,
}
impl Editor {
    /// Create an editor over `doc` with the default undo depth
    pub fn new(doc: LayoutDocument) -> Self {
        Self::with_depth(doc, DEFAULT_UNDO_DEPTH)
    }
    /// Create an editor with undo depth `depth`
    pub fn with_depth(doc: LayoutDocument, depth: usize) -> Self {
        Self {
            doc,
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            depth,
        }
    }
    /// Shared access to the current document
    pub fn document(&self) -> &LayoutDocument {
        &self.doc
    }
    /// Consume the editor, returning its document
    pub fn into_document(self) -> LayoutDocument {
        self.doc
    }

    /// Commit `next` as the new document state, snapshotting the prior one.
    /// Evicts the oldest snapshot beyond the configured depth and clears redo.
    fn commit(&mut self, next: LayoutDocument) {
        let prior = std::mem::replace(&mut self.doc, next);
        self.undo_stack.push_back(prior);
        while self.undo_stack.len() > self.depth {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
    }
    /// Undo the most recent mutation. Returns whether a snapshot was restored.
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop_back() {
            Some(prior) => {
                let current = std::mem::replace(&mut self.doc, prior);
                self.redo_stack.push(current);
                true
            }
            None => false,
        }
    }
    /// Redo the most recently undone mutation
    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(next) => {
                let current = std::mem::replace(&mut self.doc, next);
                self.undo_stack.push_back(current);
                true
            }
            None => false,
        }
    }

    /// Fetch cell `key` from `doc`, mutably, or fail with [LayoutError::CellNotFound]
    fn cell_mut(doc: &mut LayoutDocument, key: CellKey) -> LayoutResult<&mut Cell> {
        doc.cells.get_mut(key).ok_or(LayoutError::CellNotFound(key))
    }

    /// Add a shape element to cell `key`
    pub fn add_shape(
        &mut self,
        key: CellKey,
        layer: LayerId,
        geometry: Geometry,
        net: Option<NetId>,
        props: BTreeMap<String, String>,
    ) -> LayoutResult<ElementId> {
        let mut next = self.doc.clone();
        let id = ElementId(next.alloc_id());
        let cell = Self::cell_mut(&mut next, key)?;
        cell.elements.push(Element {
            id,
            layer,
            net,
            geometry,
            props,
        });
        self.commit(next);
        Ok(id)
    }
    /// Replace the geometry of shape `id` in cell `key`
    pub fn update_shape(
        &mut self,
        key: CellKey,
        id: ElementId,
        geometry: Geometry,
    ) -> LayoutResult<()> {
        let mut next = self.doc.clone();
        let cell = Self::cell_mut(&mut next, key)?;
        let elem = cell
            .elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(LayoutError::ElementNotFound(id))?;
        elem.geometry = geometry;
        self.commit(next);
        Ok(())
    }
    /// Remove shape `id` from cell `key`
    pub fn remove_shape(&mut self, key: CellKey, id: ElementId) -> LayoutResult<()> {
        let mut next = self.doc.clone();
        let cell = Self::cell_mut(&mut next, key)?;
        let idx = cell
            .elements
            .iter()
            .position(|e| e.id == id)
            .ok_or(LayoutError::ElementNotFound(id))?;
        cell.elements.remove(idx);
        self.commit(next);
        Ok(())
    }
    /// Add a via to cell `key`
    pub fn add_via(
        &mut self,
        key: CellKey,
        viadef: impl Into<String>,
        loc: Point,
        net: Option<NetId>,
    ) -> LayoutResult<ViaId> {
        let mut next = self.doc.clone();
        let id = ViaId(next.alloc_id());
        let cell = Self::cell_mut(&mut next, key)?;
        cell.vias.push(Via {
            id,
            viadef: viadef.into(),
            loc,
            net,
        });
        self.commit(next);
        Ok(id)
    }
    /// Remove via `id` from cell `key`
    pub fn remove_via(&mut self, key: CellKey, id: ViaId) -> LayoutResult<()> {
        let mut next = self.doc.clone();
        let cell = Self::cell_mut(&mut next, key)?;
        let idx = cell
            .vias
            .iter()
            .position(|v| v.id == id)
            .ok_or(LayoutError::ViaNotFound(id))?;
        cell.vias.remove(idx);
        self.commit(next);
        Ok(())
    }
    /// Add a text label to cell `key`
    pub fn add_label(
        &mut self,
        key: CellKey,
        text: impl Into<String>,
        loc: Point,
        layer: LayerId,
        net: Option<NetId>,
    ) -> LayoutResult<LabelId> {
        let mut next = self.doc.clone();
        let id = LabelId(next.alloc_id());
        let cell = Self::cell_mut(&mut next, key)?;
        cell.labels.push(Label {
            id,
            text: text.into(),
            loc,
            layer,
            net,
        });
        self.commit(next);
        Ok(id)
    }
    /// Remove label `id` from cell `key`
    pub fn remove_label(&mut self, key: CellKey, id: LabelId) -> LayoutResult<()> {
        let mut next = self.doc.clone();
        let cell = Self::cell_mut(&mut next, key)?;
        let idx = cell
            .labels
            .iter()
            .position(|l| l.id == id)
            .ok_or(LayoutError::LabelNotFound(id))?;
        cell.labels.remove(idx);
        self.commit(next);
        Ok(())
    }
    /// Add a pin to cell `key`
    #[allow(clippy::too_many_arguments)]
    pub fn add_pin(
        &mut self,
        key: CellKey,
        name: impl Into<String>,
        loc: Point,
        size: Size,
        layer: LayerId,
        net: Option<NetId>,
        role: PinRole,
    ) -> LayoutResult<PinId> {
        let mut next = self.doc.clone();
        let id = PinId(next.alloc_id());
        let cell = Self::cell_mut(&mut next, key)?;
        cell.pins.push(Pin {
            id,
            name: name.into(),
            loc,
            size,
            layer,
            net,
            role,
        });
        self.commit(next);
        Ok(id)
    }
    /// Remove pin `id` from cell `key`
    pub fn remove_pin(&mut self, key: CellKey, id: PinId) -> LayoutResult<()> {
        let mut next = self.doc.clone();
        let cell = Self::cell_mut(&mut next, key)?;
        let idx = cell
            .pins
            .iter()
            .position(|p| p.id == id)
            .ok_or(LayoutError::PinNotFound(id))?;
        cell.pins.remove(idx);
        self.commit(next);
        Ok(())
    }
    /// Add an instance of `child` to cell `key`.
    /// Rejects self-reference and any instantiation that would create a
    /// cycle in the cell graph.
    pub fn add_instance(
        &mut self,
        key: CellKey,
        name: impl Into<String>,
        child: CellKey,
        transform: Transform,
    ) -> LayoutResult<InstanceId> {
        if !self.doc.cells.contains_key(child) {
            return Err(LayoutError::CellNotFound(child));
        }
        if Self::reaches(&self.doc, child, key) {
            return Err(LayoutError::Validation(format!(
                "Instantiating cell {:?} inside {:?} would create a hierarchy cycle",
                child, key
            )));
        }
        let mut next = self.doc.clone();
        let id = InstanceId(next.alloc_id());
        let cell = Self::cell_mut(&mut next, key)?;
        cell.instances.push(Instance {
            id,
            name: name.into(),
            cell: child,
            transform,
        });
        self.commit(next);
        Ok(id)
    }
    /// Remove instance `id` from cell `key`
    pub fn remove_instance(&mut self, key: CellKey, id: InstanceId) -> LayoutResult<()> {
        let mut next = self.doc.clone();
        let cell = Self::cell_mut(&mut next, key)?;
        let idx = cell
            .instances
            .iter()
            .position(|i| i.id == id)
            .ok_or(LayoutError::InstanceNotFound(id))?;
        cell.instances.remove(idx);
        self.commit(next);
        Ok(())
    }
    /// Add a net named `name` to cell `key`
    pub fn add_net(&mut self, key: CellKey, name: impl Into<String>) -> LayoutResult<NetId> {
        let mut next = self.doc.clone();
        let id = NetId(next.alloc_id());
        let cell = Self::cell_mut(&mut next, key)?;
        cell.nets.push(Net {
            id,
            name: name.into(),
        });
        self.commit(next);
        Ok(id)
    }
    /// Remove net `id` from cell `key`, clearing references from the
    /// cell's shapes, vias, pins, and labels.
    pub fn remove_net(&mut self, key: CellKey, id: NetId) -> LayoutResult<()> {
        let mut next = self.doc.clone();
        let cell = Self::cell_mut(&mut next, key)?;
        let idx = cell
            .nets
            .iter()
            .position(|n| n.id == id)
            .ok_or(LayoutError::NetNotFound(id))?;
        cell.nets.remove(idx);
        for e in cell.elements.iter_mut().filter(|e| e.net == Some(id)) {
            e.net = None;
        }
        for v in cell.vias.iter_mut().filter(|v| v.net == Some(id)) {
            v.net = None;
        }
        for p in cell.pins.iter_mut().filter(|p| p.net == Some(id)) {
            p.net = None;
        }
        for l in cell.labels.iter_mut().filter(|l| l.net == Some(id)) {
            l.net = None;
        }
        self.commit(next);
        Ok(())
    }
    /// Add a placement constraint to cell `key`
    pub fn add_constraint(&mut self, key: CellKey, constraint: Constraint) -> LayoutResult<()> {
        let mut next = self.doc.clone();
        let cell = Self::cell_mut(&mut next, key)?;
        cell.constraints.push(constraint);
        self.commit(next);
        Ok(())
    }

    /// Depth-first reachability: whether `from` reaches `to` through instances
    fn reaches(doc: &LayoutDocument, from: CellKey, to: CellKey) -> bool {
        if from == to {
            return true;
        }
        let mut stack = vec![from];
        let mut seen = std::collections::HashSet::new();
        while let Some(key) = stack.pop() {
            if !seen.insert(key) {
                continue;
            }
            if let Some(cell) = doc.cells.get(key) {
                for inst in &cell.instances {
                    if inst.cell == to {
                        debug!("cycle check: {:?} reaches {:?}", from, to);
                        return true;
                    }
                    stack.push(inst.cell);
                }
            }
        }
        false
    }
}
