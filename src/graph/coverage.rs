//! Handler-maintained per-edge coverage
//! ====================================
//!
//! Coverage is derived state: the pipeline's filling listener deposits
//! mapped-k-mer weight per edge, and the [`CoverageIndex`] keeps that
//! weight consistent under graph mutation (merge, split, glue, removal)
//! by listening to mutation events. `coverage(e) = weight(e) / length(e)`.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::graph::conjugate::{ConjugateGraph, DataMaster, EdgeId};
use crate::graph::events::{GraphEvent, GraphHandler};

type WeightMap = Arc<RwLock<AHashMap<EdgeId, f64>>>;

/// Shared per-edge weight table. Clones share storage, so the same
/// index can be registered as a graph handler and filled by pipeline
/// listeners.
#[derive(Clone, Default)]
pub struct CoverageIndex {
    weights: WeightMap,
}

impl CoverageIndex {
    pub fn new() -> Self {
        CoverageIndex::default()
    }

    /// Accumulated mapped weight of an edge.
    pub fn weight(&self, e: EdgeId) -> f64 {
        self.weights.read().get(&e).copied().unwrap_or(0.0)
    }

    pub fn add_weight(&self, e: EdgeId, weight: f64) {
        *self.weights.write().entry(e).or_insert(0.0) += weight;
    }

    pub fn set_weight(&self, e: EdgeId, weight: f64) {
        self.weights.write().insert(e, weight);
    }

    /// Average per-position coverage of an edge.
    pub fn coverage<M: DataMaster>(&self, graph: &ConjugateGraph<M>, e: EdgeId) -> f64 {
        let length = graph.length(e).max(1);
        self.weight(e) / length as f64
    }
}

impl<M: DataMaster> GraphHandler<M> for CoverageIndex {
    fn handle(&mut self, _graph: &ConjugateGraph<M>, event: &GraphEvent) {
        match event {
            GraphEvent::EdgeAdded(e) => {
                self.weights.write().entry(*e).or_insert(0.0);
            }
            GraphEvent::EdgeRemoved(e) => {
                self.weights.write().remove(e);
            }
            GraphEvent::Merge { path, new_edge } => {
                let total: f64 = path.iter().map(|&e| self.weight(e)).sum();
                self.set_weight(*new_edge, total);
            }
            GraphEvent::VertexSplit {
                clones,
                coefficients,
                ..
            } => {
                // weight is conserved: each clone takes its coefficient
                // share of the original edge
                for (&(original, clone), &c) in clones.iter().zip(coefficients) {
                    let w = self.weight(original);
                    self.set_weight(clone, w * c);
                    self.set_weight(original, w * (1.0 - c));
                }
            }
            GraphEvent::Glue { removed, kept } => {
                let w = self.weight(*removed);
                self.add_weight(*kept, w);
            }
            GraphEvent::VertexAdded(_) | GraphEvent::VertexRemoved(_) => {}
        }
    }
}
