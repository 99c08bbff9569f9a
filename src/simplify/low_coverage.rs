//! Coverage-driven removal: edges that are both short and weakly
//! covered are sequencing artefacts.

use crate::graph::conjugate::{ConjugateGraph, DataMaster, EdgeId};
use crate::graph::coverage::CoverageIndex;
use crate::simplify::config::LowCoverageConfig;
use crate::simplify::{Criterion, VisitOrder};
use crate::Result;

/// Full-scan removal of short, low-coverage edges.
pub struct LowCoverageEdgeRemover {
    config: LowCoverageConfig,
}

impl LowCoverageEdgeRemover {
    pub fn new(config: LowCoverageConfig) -> Self {
        LowCoverageEdgeRemover { config }
    }
}

impl<M: DataMaster> Criterion<M> for LowCoverageEdgeRemover {
    fn check(
        &self,
        graph: &ConjugateGraph<M>,
        coverage: &CoverageIndex,
        e: EdgeId,
    ) -> Result<bool> {
        Ok(graph.length(e) < self.config.max_length
            && coverage.coverage(graph, e) < self.config.max_coverage)
    }
}

/// Same predicate visited in coverage-ascending order; once an edge
/// exceeds the coverage bound every remaining edge is safe and the
/// scan stops. One pass of the iterative scheme.
pub struct IterativeLowCoverageEdgeRemover {
    config: LowCoverageConfig,
}

impl IterativeLowCoverageEdgeRemover {
    pub fn new(config: LowCoverageConfig) -> Self {
        IterativeLowCoverageEdgeRemover { config }
    }
}

impl<M: DataMaster> Criterion<M> for IterativeLowCoverageEdgeRemover {
    fn visit_order(&self) -> VisitOrder {
        VisitOrder::CoverageAscending
    }

    fn stop(&self, graph: &ConjugateGraph<M>, coverage: &CoverageIndex, e: EdgeId) -> bool {
        coverage.coverage(graph, e) > self.config.max_coverage
    }

    fn check(
        &self,
        graph: &ConjugateGraph<M>,
        coverage: &CoverageIndex,
        e: EdgeId,
    ) -> Result<bool> {
        Ok(graph.length(e) < self.config.max_length
            && coverage.coverage(graph, e) < self.config.max_coverage)
    }
}
