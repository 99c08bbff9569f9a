//! Chain compression and orphan cleanup
//! ====================================
//!
//! After erroneous edges are removed, every interior vertex with exactly
//! one incoming and one outgoing edge is superfluous: the maximal chain
//! through it collapses into a single edge via
//! [`ConjugateGraph::merge_path`]. Vertices left without incident edges
//! are then retired.

use ahash::AHashSet;
use tracing::debug;

use crate::graph::conjugate::{ConjugateGraph, DataMaster, VertexId};
use crate::Result;

/// Collapses unambiguous degree-(1,1) chains.
pub struct Compressor;

impl Compressor {
    fn can_compress<M: DataMaster>(graph: &ConjugateGraph<M>, v: VertexId) -> bool {
        graph.contains_vertex(v) && graph.in_degree(v) == 1 && graph.out_degree(v) == 1
    }

    /// Compress the maximal chain running through `v`. Returns true if
    /// the graph changed.
    pub fn compress_vertex<M: DataMaster>(
        graph: &mut ConjugateGraph<M>,
        v: VertexId,
    ) -> Result<bool> {
        if !Self::can_compress(graph, v) {
            return Ok(false);
        }

        // walk back to the chain head, guarding against cycles
        let mut first = graph.incoming(v)[0];
        let mut visited: AHashSet<VertexId> = AHashSet::new();
        visited.insert(v);
        loop {
            let u = graph.edge_start(first);
            if !Self::can_compress(graph, u) || !visited.insert(u) {
                break;
            }
            first = graph.incoming(u)[0];
        }

        // walk forward collecting the chain
        let head = graph.edge_start(first);
        let mut path = vec![first];
        let mut tail = graph.edge_end(first);
        while Self::can_compress(graph, tail) && tail != head {
            let next = graph.outgoing(tail)[0];
            path.push(next);
            tail = graph.edge_end(next);
        }

        if path.len() < 2 {
            return Ok(false);
        }
        graph.merge_path(&path)?;
        Ok(true)
    }

    /// Compress every compressible vertex. Returns true if the graph
    /// changed.
    pub fn compress_all<M: DataMaster>(graph: &mut ConjugateGraph<M>) -> Result<bool> {
        let mut changed = false;
        let snapshot: Vec<VertexId> = graph.vertices().collect();
        for v in snapshot {
            changed |= Self::compress_vertex(graph, v)?;
        }
        if changed {
            debug!(
                vertices = graph.vertex_count(),
                edges = graph.edge_count(),
                "compressed unambiguous chains"
            );
        }
        Ok(changed)
    }
}

/// Removes vertices with no incident edges.
pub struct Cleaner;

impl Cleaner {
    pub fn clean<M: DataMaster>(graph: &mut ConjugateGraph<M>) -> Result<bool> {
        let mut changed = false;
        let snapshot: Vec<VertexId> = graph.vertices().collect();
        for v in snapshot {
            if graph.contains_vertex(v) && graph.out_degree(v) == 0 && graph.in_degree(v) == 0 {
                graph.delete_vertex(v)?;
                changed = true;
            }
        }
        Ok(changed)
    }
}
