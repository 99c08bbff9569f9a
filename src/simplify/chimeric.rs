//! Removal of the short bridging edges the graph constructor inserts
//! between unrelated genomic regions: an edge of near-k length whose
//! start has a single incoming and whose end has a single outgoing
//! edge.

use crate::graph::conjugate::{ConjugateGraph, DataMaster, EdgeId, VertexId};
use crate::graph::coverage::CoverageIndex;
use crate::simplify::config::ChimericConfig;
use crate::simplify::Criterion;
use crate::Result;

pub struct ChimericEdgesRemover {
    k: usize,
    config: ChimericConfig,
}

impl ChimericEdgesRemover {
    pub fn new(k: usize, config: ChimericConfig) -> Self {
        ChimericEdgesRemover { k, config }
    }

    fn check_start<M: DataMaster>(&self, graph: &ConjugateGraph<M>, v: VertexId) -> bool {
        graph.in_degree(v) == 1
    }

    fn check_end<M: DataMaster>(&self, graph: &ConjugateGraph<M>, v: VertexId) -> bool {
        graph.out_degree(v) == 1
    }
}

impl<M: DataMaster> Criterion<M> for ChimericEdgesRemover {
    fn check(
        &self,
        graph: &ConjugateGraph<M>,
        _coverage: &CoverageIndex,
        e: EdgeId,
    ) -> Result<bool> {
        let length = graph.length(e);
        Ok(length <= self.k
            && length + self.config.max_overlap >= self.k
            && self.check_end(graph, graph.edge_end(e))
            && self.check_start(graph, graph.edge_start(e)))
    }
}
