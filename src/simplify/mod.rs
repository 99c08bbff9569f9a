//! Erroneous-edge removal engine
//! =============================
//!
//! A family of removal policies sharing one skeleton: visit edges in a
//! policy-specific order, stop early when the order makes the stop
//! condition monotone, delete every edge the criterion flags, then
//! compress unambiguous chains and clean orphan vertices. A policy is a
//! value composing a [`Criterion`] with a [`VisitOrder`], an optional
//! early stop and a related-structure deletion flag consumed by the
//! [`EdgeRemover`].

pub mod chimeric;
pub mod config;
pub mod low_coverage;
pub mod pair_info;
pub mod topology;

use tracing::{debug, info};

use crate::graph::compression::{Cleaner, Compressor};
use crate::graph::conjugate::{ConjugateGraph, DataMaster, EdgeId, VertexId};
use crate::graph::coverage::CoverageIndex;
use crate::Result;

pub use chimeric::ChimericEdgesRemover;
pub use config::SimplificationConfig;
pub use low_coverage::{IterativeLowCoverageEdgeRemover, LowCoverageEdgeRemover};
pub use pair_info::{PairInfoAwareErroneousEdgeRemover, PairedInfoIndex, PairedInfoStore, PairedPoint};
pub use topology::{
    AdvancedTopologyChimericEdgeRemover, NewTopologyBasedChimericEdgeRemover,
    TopologyBasedChimericEdgeRemover,
};

/// Edge visitation order of a removal pass. Early stop is sound only
/// when the comparator makes the stop condition monotone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOrder {
    Arbitrary,
    LengthAscending,
    CoverageAscending,
}

/// A removal policy: predicate, visitation order, early stop and the
/// related-structure flag.
pub trait Criterion<M: DataMaster>: Send {
    fn visit_order(&self) -> VisitOrder {
        VisitOrder::Arbitrary
    }

    /// Monotone stop condition under [`Criterion::visit_order`];
    /// scanning ends at the first edge for which this holds.
    fn stop(&self, _graph: &ConjugateGraph<M>, _coverage: &CoverageIndex, _e: EdgeId) -> bool {
        false
    }

    /// True when the edge is erroneous and must go.
    fn check(&self, graph: &ConjugateGraph<M>, coverage: &CoverageIndex, e: EdgeId)
        -> Result<bool>;

    /// Whether deletion may also remove structure between related
    /// (conjugate-linked) endpoints.
    fn delete_related(&self) -> bool {
        true
    }
}

/// Routes criterion-flagged deletions and retires endpoints that become
/// isolated.
pub struct EdgeRemover;

impl EdgeRemover {
    pub fn delete_edge<M: DataMaster>(
        graph: &mut ConjugateGraph<M>,
        e: EdgeId,
        delete_between_related: bool,
    ) -> Result<bool> {
        let start = graph.edge_start(e);
        let end = graph.edge_end(e);
        if !delete_between_related && graph.related(start, end) {
            return Ok(false);
        }
        graph.delete_edge(e)?;
        if !graph.related(start, end) {
            Self::retire_if_isolated(graph, end)?;
        }
        Self::retire_if_isolated(graph, start)?;
        Ok(true)
    }

    fn retire_if_isolated<M: DataMaster>(graph: &mut ConjugateGraph<M>, v: VertexId) -> Result<()> {
        if graph.contains_vertex(v) && graph.out_degree(v) == 0 && graph.in_degree(v) == 0 {
            graph.delete_vertex(v)?;
        }
        Ok(())
    }
}

/// Run one policy to completion, then compress degree-(1,1) chains and
/// clean disconnected singletons. Returns true if the graph changed.
pub fn run_policy<M, C>(
    graph: &mut ConjugateGraph<M>,
    coverage: &CoverageIndex,
    criterion: &C,
) -> Result<bool>
where
    M: DataMaster,
    C: Criterion<M>,
{
    let mut order: Vec<EdgeId> = graph.edges().collect();
    match criterion.visit_order() {
        VisitOrder::Arbitrary => {}
        VisitOrder::LengthAscending => {
            order.sort_by_key(|&e| (graph.length(e), e));
        }
        VisitOrder::CoverageAscending => {
            order.sort_by(|&a, &b| {
                coverage
                    .coverage(graph, a)
                    .total_cmp(&coverage.coverage(graph, b))
                    .then(a.cmp(&b))
            });
        }
    }

    let mut removed = 0usize;
    for e in order {
        // the removal of a previous edge may have taken this one with it
        if !graph.contains_edge(e) {
            continue;
        }
        if criterion.stop(graph, coverage, e) {
            debug!(edge = e.0, "stop condition reached");
            break;
        }
        if criterion.check(graph, coverage, e)? && EdgeRemover::delete_edge(
            graph,
            e,
            criterion.delete_related(),
        )? {
            removed += 1;
        }
    }

    let compressed = Compressor::compress_all(graph)?;
    let cleaned = Cleaner::clean(graph)?;
    if removed > 0 {
        info!(removed, "erroneous edges removed");
    }
    Ok(removed > 0 || compressed || cleaned)
}
