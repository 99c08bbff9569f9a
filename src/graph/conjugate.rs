//! Conjugate (double-stranded) directed multigraph
//! ===============================================
//!
//! Every vertex and edge carries a pointer to its reverse-complement
//! twin; all mutation primitives create and destroy the two strands in
//! lock-step, so the involution invariants
//! `conj(conj(x)) == x`, `start(conj(e)) == conj(end(e))` and
//! `data(conj(e)) == master.conjugate(data(e))` hold after every
//! operation. Entities live in slot arenas addressed by small integer
//! handles; a vertex record keeps only its outgoing edge list, and
//! incoming queries are answered through the conjugate view.

use ahash::AHashSet;

use crate::core::errors::AssemblyError;
use crate::graph::events::{GraphEvent, GraphHandler, GraphHandlerRef, PairedHandlerApplier};
use crate::Result;

/// Capability set the graph needs from its domain data: strand
/// conjugation, palindrome detection, path-contraction merging and the
/// edge-length measure used by coverage and the removal engine.
pub trait DataMaster {
    type VertexData: Clone + Send + Sync;
    type EdgeData: Clone + Send + Sync;

    fn conjugate_vertex(&self, data: &Self::VertexData) -> Self::VertexData;
    fn conjugate_edge(&self, data: &Self::EdgeData) -> Self::EdgeData;
    fn is_self_conjugate(&self, data: &Self::EdgeData) -> bool;
    fn merge(&self, left: &Self::EdgeData, right: &Self::EdgeData) -> Self::EdgeData;
    fn length(&self, data: &Self::EdgeData) -> usize;
}

/// Handle of a vertex slot. Invalidated by deletion of the vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

/// Handle of an edge slot. Invalidated by deletion of the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl VertexId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

struct VertexRecord<V> {
    data: V,
    conjugate: VertexId,
    outgoing: Vec<EdgeId>,
}

struct EdgeRecord<E> {
    data: E,
    end: VertexId,
    conjugate: EdgeId,
}

pub struct ConjugateGraph<M: DataMaster> {
    master: M,
    vertices: Vec<Option<VertexRecord<M::VertexData>>>,
    edges: Vec<Option<EdgeRecord<M::EdgeData>>>,
    free_vertices: Vec<u32>,
    free_edges: Vec<u32>,
    handlers: Vec<GraphHandlerRef<M>>,
}

impl<M: DataMaster> ConjugateGraph<M> {
    pub fn new(master: M) -> Self {
        ConjugateGraph {
            master,
            vertices: Vec::new(),
            edges: Vec::new(),
            free_vertices: Vec::new(),
            free_edges: Vec::new(),
            handlers: Vec::new(),
        }
    }

    pub fn master(&self) -> &M {
        &self.master
    }

    /// Register a mutation handler; handlers fire in registration order.
    pub fn add_handler(&mut self, handler: GraphHandlerRef<M>) {
        self.handlers.push(handler);
    }

    /* ----------------------------- queries ----------------------------- */

    #[inline]
    pub fn contains_vertex(&self, v: VertexId) -> bool {
        self.vertices
            .get(v.index())
            .map_or(false, Option::is_some)
    }

    #[inline]
    pub fn contains_edge(&self, e: EdgeId) -> bool {
        self.edges.get(e.index()).map_or(false, Option::is_some)
    }

    fn vertex(&self, v: VertexId) -> &VertexRecord<M::VertexData> {
        self.vertices[v.index()]
            .as_ref()
            .expect("stale vertex handle")
    }

    fn vertex_mut(&mut self, v: VertexId) -> &mut VertexRecord<M::VertexData> {
        self.vertices[v.index()]
            .as_mut()
            .expect("stale vertex handle")
    }

    fn edge(&self, e: EdgeId) -> &EdgeRecord<M::EdgeData> {
        self.edges[e.index()].as_ref().expect("stale edge handle")
    }

    pub fn vertex_data(&self, v: VertexId) -> &M::VertexData {
        &self.vertex(v).data
    }

    pub fn edge_data(&self, e: EdgeId) -> &M::EdgeData {
        &self.edge(e).data
    }

    /// Length of an edge as measured by the data master.
    pub fn length(&self, e: EdgeId) -> usize {
        self.master.length(&self.edge(e).data)
    }

    pub fn conjugate_vertex(&self, v: VertexId) -> VertexId {
        self.vertex(v).conjugate
    }

    pub fn conjugate_edge(&self, e: EdgeId) -> EdgeId {
        self.edge(e).conjugate
    }

    pub fn is_self_conjugate(&self, e: EdgeId) -> bool {
        self.edge(e).conjugate == e
    }

    pub fn edge_end(&self, e: EdgeId) -> VertexId {
        self.edge(e).end
    }

    /// `start(e) = conj(end(conj(e)))`.
    pub fn edge_start(&self, e: EdgeId) -> VertexId {
        let twin = self.edge(e).conjugate;
        self.conjugate_vertex(self.edge(twin).end)
    }

    pub fn outgoing(&self, v: VertexId) -> Vec<EdgeId> {
        self.vertex(v).outgoing.clone()
    }

    /// Incoming edges, read as the conjugates of the conjugate vertex's
    /// outgoing edges.
    pub fn incoming(&self, v: VertexId) -> Vec<EdgeId> {
        self.vertex(self.conjugate_vertex(v))
            .outgoing
            .iter()
            .map(|&e| self.conjugate_edge(e))
            .collect()
    }

    pub fn out_degree(&self, v: VertexId) -> usize {
        self.vertex(v).outgoing.len()
    }

    pub fn in_degree(&self, v: VertexId) -> usize {
        self.vertex(self.conjugate_vertex(v)).outgoing.len()
    }

    pub fn edges_between(&self, u: VertexId, w: VertexId) -> Vec<EdgeId> {
        self.vertex(u)
            .outgoing
            .iter()
            .copied()
            .filter(|&e| self.edge_end(e) == w)
            .collect()
    }

    /// Vertices are related when equal or conjugate twins.
    pub fn related(&self, u: VertexId, w: VertexId) -> bool {
        u == w || self.conjugate_vertex(u) == w
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|slot| slot.is_some()).count()
    }

    /// Live vertex handles in stable slot order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| VertexId(i as u32)))
    }

    /// Live edge handles in stable slot order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| EdgeId(i as u32)))
    }

    /* ------------------------- event dispatch -------------------------- */

    fn fire(&self, event: GraphEvent) {
        let handlers: Vec<GraphHandlerRef<M>> = self.handlers.clone();
        for handler in handlers {
            PairedHandlerApplier::apply(self, &mut *handler.lock(), &event);
        }
    }

    /// Single-strand dispatch for sequences the caller mirrors itself
    /// (vertex split).
    fn fire_single(&self, event: GraphEvent) {
        let handlers: Vec<GraphHandlerRef<M>> = self.handlers.clone();
        for handler in handlers {
            handler.lock().handle(self, &event);
        }
    }

    /* --------------------- hidden mutation layer ----------------------- */

    fn alloc_vertex(&mut self, record: VertexRecord<M::VertexData>) -> VertexId {
        match self.free_vertices.pop() {
            Some(slot) => {
                self.vertices[slot as usize] = Some(record);
                VertexId(slot)
            }
            None => {
                self.vertices.push(Some(record));
                VertexId((self.vertices.len() - 1) as u32)
            }
        }
    }

    fn alloc_edge(&mut self, record: EdgeRecord<M::EdgeData>) -> EdgeId {
        match self.free_edges.pop() {
            Some(slot) => {
                self.edges[slot as usize] = Some(record);
                EdgeId(slot)
            }
            None => {
                self.edges.push(Some(record));
                EdgeId((self.edges.len() - 1) as u32)
            }
        }
    }

    /// Create a vertex together with its conjugate twin.
    fn hidden_add_vertex(&mut self, data: M::VertexData) -> VertexId {
        let twin_data = self.master.conjugate_vertex(&data);
        let v = self.alloc_vertex(VertexRecord {
            data,
            conjugate: VertexId(u32::MAX),
            outgoing: Vec::new(),
        });
        let twin = self.alloc_vertex(VertexRecord {
            data: twin_data,
            conjugate: v,
            outgoing: Vec::new(),
        });
        self.vertex_mut(v).conjugate = twin;
        v
    }

    fn hidden_delete_vertex(&mut self, v: VertexId) {
        let twin = self.conjugate_vertex(v);
        debug_assert!(self.vertex(v).outgoing.is_empty());
        debug_assert!(self.vertex(twin).outgoing.is_empty());
        self.vertices[v.index()] = None;
        self.free_vertices.push(v.0);
        if twin != v {
            self.vertices[twin.index()] = None;
            self.free_vertices.push(twin.0);
        }
    }

    fn add_single_edge(&mut self, from: VertexId, to: VertexId, data: M::EdgeData) -> EdgeId {
        let e = self.alloc_edge(EdgeRecord {
            data,
            end: to,
            conjugate: EdgeId(u32::MAX),
        });
        self.vertex_mut(from).outgoing.push(e);
        e
    }

    fn hidden_add_edge(
        &mut self,
        from: VertexId,
        to: VertexId,
        data: M::EdgeData,
    ) -> Result<EdgeId> {
        if !self.contains_vertex(from) || !self.contains_vertex(to) {
            return Err(AssemblyError::invariant("add_edge on unknown vertex").into());
        }
        let self_conjugate = self.master.is_self_conjugate(&data);
        if self_conjugate && from != self.conjugate_vertex(to) {
            return Err(
                AssemblyError::invariant("self-conjugate edge must join conjugate vertices").into(),
            );
        }
        let twin_data = self.master.conjugate_edge(&data);
        let e = self.add_single_edge(from, to, data);
        if self_conjugate {
            self.edges[e.index()].as_mut().unwrap().conjugate = e;
            return Ok(e);
        }
        let rc_from = self.conjugate_vertex(to);
        let rc_to = self.conjugate_vertex(from);
        let twin = self.add_single_edge(rc_from, rc_to, twin_data);
        self.edges[e.index()].as_mut().unwrap().conjugate = twin;
        self.edges[twin.index()].as_mut().unwrap().conjugate = e;
        Ok(e)
    }

    fn hidden_delete_edge(&mut self, e: EdgeId) {
        let twin = self.conjugate_edge(e);
        let start = self.edge_start(e);
        let rc_start = self.conjugate_vertex(self.edge_end(e));
        self.vertex_mut(start).outgoing.retain(|&x| x != e);
        if twin != e {
            self.vertex_mut(rc_start).outgoing.retain(|&x| x != twin);
            self.edges[twin.index()] = None;
            self.free_edges.push(twin.0);
        }
        self.edges[e.index()] = None;
        self.free_edges.push(e.0);
    }

    /* ------------------------ public mutations ------------------------- */

    /// Create a vertex (and its conjugate twin); fires `VertexAdded` on
    /// both strands.
    pub fn add_vertex(&mut self, data: M::VertexData) -> VertexId {
        let v = self.hidden_add_vertex(data);
        self.fire(GraphEvent::VertexAdded(v));
        v
    }

    /// Delete an edge-free vertex and its conjugate.
    pub fn delete_vertex(&mut self, v: VertexId) -> Result<()> {
        if !self.contains_vertex(v) {
            return Err(AssemblyError::invariant("delete of unknown vertex").into());
        }
        if self.out_degree(v) != 0 || self.in_degree(v) != 0 {
            return Err(AssemblyError::invariant("delete of vertex with incident edges").into());
        }
        self.fire(GraphEvent::VertexRemoved(v));
        self.hidden_delete_vertex(v);
        Ok(())
    }

    /// Create an edge `from -> to` and, unless the data is palindromic,
    /// its conjugate `conj(to) -> conj(from)`. Parallel edges between
    /// the same endpoints are permitted.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId, data: M::EdgeData) -> Result<EdgeId> {
        let e = self.hidden_add_edge(from, to, data)?;
        self.fire(GraphEvent::EdgeAdded(e));
        Ok(e)
    }

    /// Delete an edge and its conjugate (once, if self-conjugate).
    pub fn delete_edge(&mut self, e: EdgeId) -> Result<()> {
        if !self.contains_edge(e) {
            return Err(AssemblyError::invariant("delete of unknown edge").into());
        }
        self.fire(GraphEvent::EdgeRemoved(e));
        self.hidden_delete_edge(e);
        Ok(())
    }

    /// Clone `splitting_edges` onto a fresh vertex carrying the same
    /// data as `v`, re-routing every occurrence of `v` at either end to
    /// the clone vertex. Returns the new vertex and the
    /// (original, clone) edge pairs. The event sequence runs the
    /// primary strand to completion, then mirrors it on the conjugate
    /// strand.
    pub fn split_vertex(
        &mut self,
        v: VertexId,
        splitting_edges: &[EdgeId],
        coefficients: Option<Vec<f64>>,
    ) -> Result<(VertexId, Vec<(EdgeId, EdgeId)>)> {
        if !self.contains_vertex(v) {
            return Err(AssemblyError::invariant("split of unknown vertex").into());
        }
        let coefficients = coefficients.unwrap_or_else(|| vec![1.0; splitting_edges.len()]);
        if coefficients.len() != splitting_edges.len() {
            return Err(AssemblyError::invariant("split coefficient arity mismatch").into());
        }

        let new_vertex = self.hidden_add_vertex(self.vertex(v).data.clone());
        let mut clones = Vec::with_capacity(splitting_edges.len());
        let mut rc_clones = Vec::with_capacity(splitting_edges.len());
        for &e in splitting_edges {
            if !self.contains_edge(e) {
                return Err(AssemblyError::invariant("split over unknown edge").into());
            }
            let mut from = self.edge_start(e);
            let mut to = self.edge_end(e);
            if from == v {
                from = new_vertex;
            }
            if to == v {
                to = new_vertex;
            }
            let clone = self.hidden_add_edge(from, to, self.edge(e).data.clone())?;
            clones.push((e, clone));
            rc_clones.push((self.conjugate_edge(e), self.conjugate_edge(clone)));
        }

        self.fire_single(GraphEvent::VertexSplit {
            new_vertex,
            clones: clones.clone(),
            coefficients: coefficients.clone(),
            old_vertex: v,
        });
        self.fire_single(GraphEvent::VertexAdded(new_vertex));
        for &(_, clone) in &clones {
            self.fire_single(GraphEvent::EdgeAdded(clone));
        }

        let rc_new = self.conjugate_vertex(new_vertex);
        self.fire_single(GraphEvent::VertexSplit {
            new_vertex: rc_new,
            clones: rc_clones.clone(),
            coefficients,
            old_vertex: self.conjugate_vertex(v),
        });
        self.fire_single(GraphEvent::VertexAdded(rc_new));
        for &(_, clone) in &rc_clones {
            self.fire_single(GraphEvent::EdgeAdded(clone));
        }

        Ok((new_vertex, clones))
    }

    /// Fold a path so that a self-conjugate edge, if present, lies at
    /// the centre with each side the palindromic image of the other.
    /// Contracting the corrected path can then never contradict the
    /// strand symmetry.
    pub fn correct_merge_path(&self, path: &[EdgeId]) -> Vec<EdgeId> {
        for i in 0..path.len() {
            if path[i] == self.conjugate_edge(path[i]) {
                let mut centre = i;
                let mut result: Vec<EdgeId> = if i < path.len() - 1 - i {
                    centre = path.len() - 1 - i;
                    path.iter()
                        .rev()
                        .map(|&e| self.conjugate_edge(e))
                        .collect()
                } else {
                    path.to_vec()
                };
                let size = 2 * centre + 1;
                for j in result.len()..size {
                    result.push(self.conjugate_edge(result[size - 1 - j]));
                }
                return result;
            }
        }
        path.to_vec()
    }

    /// Edges of the corrected path with conjugate duplicates removed;
    /// deleting each deletes its twin.
    fn edges_to_delete(&self, path: &[EdgeId]) -> Vec<EdgeId> {
        let mut seen = AHashSet::new();
        let mut result = Vec::new();
        seen.insert(path[0]);
        result.push(path[0]);
        for &e in &path[1..] {
            if !seen.contains(&self.conjugate_edge(e)) && seen.insert(e) {
                result.push(e);
            }
        }
        result
    }

    /// Interior vertices of the corrected path, conjugate-deduplicated.
    fn vertices_to_delete(&self, path: &[EdgeId]) -> Vec<VertexId> {
        let mut seen = AHashSet::new();
        let mut result = Vec::new();
        for &e in &path[1..] {
            let v = self.edge_start(e);
            if !seen.contains(&self.conjugate_vertex(v)) && seen.insert(v) {
                result.push(v);
            }
        }
        result
    }

    /// Contract a path of consecutive edges into a single edge whose
    /// data is the fold of `master.merge` over the path. Interior
    /// vertices and the path edges are retired together with their
    /// conjugates.
    pub fn merge_path(&mut self, path: &[EdgeId]) -> Result<EdgeId> {
        if path.is_empty() {
            return Err(AssemblyError::invariant("merge of empty path").into());
        }
        for window in path.windows(2) {
            if self.edge_end(window[0]) != self.edge_start(window[1]) {
                return Err(AssemblyError::invariant("merge of disconnected path").into());
            }
        }

        let path = self.correct_merge_path(path);
        let start = self.edge_start(path[0]);
        let end = self.edge_end(path[path.len() - 1]);
        let mut merged = self.edge(path[0]).data.clone();
        for &e in &path[1..] {
            merged = self.master.merge(&merged, &self.edge(e).data);
        }

        let new_edge = self.hidden_add_edge(start, end, merged)?;
        self.fire(GraphEvent::Merge {
            path: path.clone(),
            new_edge,
        });
        self.fire(GraphEvent::EdgeAdded(new_edge));

        let edges = self.edges_to_delete(&path);
        let vertices = self.vertices_to_delete(&path);
        for &e in &edges {
            self.fire(GraphEvent::EdgeRemoved(e));
        }
        for &v in &vertices {
            self.fire(GraphEvent::VertexRemoved(v));
        }

        for e in edges {
            self.hidden_delete_edge(e);
        }
        for v in vertices {
            if self.contains_vertex(v) {
                self.hidden_delete_vertex(v);
            }
        }
        Ok(new_edge)
    }

    /// Fold a parallel duplicate edge onto `kept`, announcing the glue
    /// so handlers can transfer derived weight.
    pub fn glue_parallel_edges(&mut self, removed: EdgeId, kept: EdgeId) -> Result<()> {
        if !self.contains_edge(removed) || !self.contains_edge(kept) {
            return Err(AssemblyError::invariant("glue of unknown edge").into());
        }
        if removed == kept {
            return Err(AssemblyError::invariant("glue of an edge onto itself").into());
        }
        if self.edge_start(removed) != self.edge_start(kept)
            || self.edge_end(removed) != self.edge_end(kept)
        {
            return Err(AssemblyError::invariant("glue of non-parallel edges").into());
        }
        self.fire(GraphEvent::Glue { removed, kept });
        self.fire(GraphEvent::EdgeRemoved(removed));
        self.hidden_delete_edge(removed);
        Ok(())
    }
}
