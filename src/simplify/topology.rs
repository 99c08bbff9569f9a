//! Topology-driven chimeric edge removal
//! =====================================
//!
//! Three refinements of the same idea: a short edge is chimeric when
//! the structure around it says the genomic walk goes elsewhere.
//! Uniqueness and plausibility of neighbouring edges default to plain
//! length thresholds and can be overridden; the advanced variant
//! measures the cumulative length of unique/plausible walks computed
//! by path-finder collaborators.

use ahash::AHashSet;

use crate::core::errors::AssemblyError;
use crate::graph::conjugate::{ConjugateGraph, DataMaster, EdgeId, VertexId};
use crate::graph::coverage::CoverageIndex;
use crate::simplify::config::{RelativeTopologyConfig, TopologyConfig};
use crate::simplify::{Criterion, VisitOrder};
use crate::Result;

/// Deletes a short edge when every adjacent edge out-covers it by a
/// configured gap or is long enough to be trusted.
pub struct TopologyBasedChimericEdgeRemover {
    config: TopologyConfig,
}

impl TopologyBasedChimericEdgeRemover {
    pub fn new(config: TopologyConfig) -> Self {
        TopologyBasedChimericEdgeRemover { config }
    }

    fn strong_neighbour<M: DataMaster>(
        &self,
        graph: &ConjugateGraph<M>,
        coverage: &CoverageIndex,
        neighbour: EdgeId,
        candidate: EdgeId,
    ) -> bool {
        neighbour == candidate
            || coverage.coverage(graph, neighbour)
                > coverage.coverage(graph, candidate) * self.config.coverage_gap
            || graph.length(neighbour) >= self.config.neighbour_length_threshold
    }
}

impl<M: DataMaster> Criterion<M> for TopologyBasedChimericEdgeRemover {
    fn visit_order(&self) -> VisitOrder {
        VisitOrder::LengthAscending
    }

    fn stop(&self, graph: &ConjugateGraph<M>, _coverage: &CoverageIndex, e: EdgeId) -> bool {
        graph.length(e) > self.config.max_length
    }

    fn check(
        &self,
        graph: &ConjugateGraph<M>,
        coverage: &CoverageIndex,
        e: EdgeId,
    ) -> Result<bool> {
        let start = graph.edge_start(e);
        let end = graph.edge_end(e);
        let mut adjacent = graph.outgoing(start);
        adjacent.extend(graph.incoming(start));
        adjacent.extend(graph.outgoing(end));
        adjacent.extend(graph.incoming(end));
        Ok(adjacent
            .into_iter()
            .all(|n| self.strong_neighbour(graph, coverage, n, e)))
    }

    fn delete_related(&self) -> bool {
        false
    }
}

/// How an edge qualifies as genomically unique.
pub trait UniquenessPredicate<M: DataMaster>: Send {
    fn is_unique(&self, graph: &ConjugateGraph<M>, e: EdgeId, forward: bool) -> bool;
}

/// How an edge qualifies as lying on a plausible genomic walk.
pub trait PlausibilityPredicate<M: DataMaster>: Send {
    fn is_plausible(&self, graph: &ConjugateGraph<M>, e: EdgeId) -> bool;
}

/// Default uniqueness: length at or above a threshold.
pub struct LengthUniqueness {
    pub threshold: usize,
}

impl<M: DataMaster> UniquenessPredicate<M> for LengthUniqueness {
    fn is_unique(&self, graph: &ConjugateGraph<M>, e: EdgeId, _forward: bool) -> bool {
        graph.length(e) >= self.threshold
    }
}

/// Default plausibility: length at or above a threshold.
pub struct LengthPlausibility {
    pub threshold: usize,
}

impl<M: DataMaster> PlausibilityPredicate<M> for LengthPlausibility {
    fn is_plausible(&self, graph: &ConjugateGraph<M>, e: EdgeId) -> bool {
        graph.length(e) >= self.threshold
    }
}

/// Deletes a short edge when one of its sides is entered by a single
/// unique edge while another, plausible continuation exists on that
/// side (the genomic walk demonstrably bypasses the candidate).
pub struct NewTopologyBasedChimericEdgeRemover<U, P> {
    max_length: usize,
    unique: U,
    plausible: P,
}

impl NewTopologyBasedChimericEdgeRemover<LengthUniqueness, LengthPlausibility> {
    pub fn new(config: RelativeTopologyConfig) -> Result<Self> {
        validate_lengths(&config)?;
        Ok(NewTopologyBasedChimericEdgeRemover {
            max_length: config.max_length,
            unique: LengthUniqueness {
                threshold: config.uniqueness_length,
            },
            plausible: LengthPlausibility {
                threshold: config.plausibility_length,
            },
        })
    }
}

fn validate_lengths(config: &RelativeTopologyConfig) -> Result<()> {
    if config.max_length >= config.plausibility_length {
        return Err(AssemblyError::config(format!(
            "max_length {} must stay below plausibility_length {}",
            config.max_length, config.plausibility_length
        ))
        .into());
    }
    if config.uniqueness_length <= config.plausibility_length {
        return Err(AssemblyError::config(format!(
            "uniqueness_length {} must exceed plausibility_length {}",
            config.uniqueness_length, config.plausibility_length
        ))
        .into());
    }
    Ok(())
}

impl<U, P> NewTopologyBasedChimericEdgeRemover<U, P> {
    /// Custom uniqueness/plausibility notions over validated lengths.
    pub fn with_predicates(
        config: RelativeTopologyConfig,
        unique: U,
        plausible: P,
    ) -> Result<Self> {
        validate_lengths(&config)?;
        Ok(NewTopologyBasedChimericEdgeRemover {
            max_length: config.max_length,
            unique,
            plausible,
        })
    }

    fn unique_entry<M: DataMaster>(
        &self,
        graph: &ConjugateGraph<M>,
        edges: &[EdgeId],
        forward: bool,
    ) -> bool
    where
        U: UniquenessPredicate<M>,
    {
        edges.len() == 1 && self.unique.is_unique(graph, edges[0], forward)
    }

    fn exists_plausible<M: DataMaster>(&self, graph: &ConjugateGraph<M>, edges: &[EdgeId]) -> bool
    where
        P: PlausibilityPredicate<M>,
    {
        edges.iter().any(|&n| self.plausible.is_plausible(graph, n))
    }

    fn check_start<M: DataMaster>(&self, graph: &ConjugateGraph<M>, e: EdgeId) -> bool
    where
        U: UniquenessPredicate<M>,
        P: PlausibilityPredicate<M>,
    {
        let start = graph.edge_start(e);
        self.unique_entry(graph, &graph.incoming(start), false)
            && self.exists_plausible(graph, &graph.outgoing(start))
    }

    fn check_end<M: DataMaster>(&self, graph: &ConjugateGraph<M>, e: EdgeId) -> bool
    where
        U: UniquenessPredicate<M>,
        P: PlausibilityPredicate<M>,
    {
        let end = graph.edge_end(e);
        self.unique_entry(graph, &graph.outgoing(end), true)
            && self.exists_plausible(graph, &graph.incoming(end))
    }
}

impl<M, U, P> Criterion<M> for NewTopologyBasedChimericEdgeRemover<U, P>
where
    M: DataMaster,
    U: UniquenessPredicate<M>,
    P: PlausibilityPredicate<M>,
{
    fn visit_order(&self) -> VisitOrder {
        VisitOrder::LengthAscending
    }

    fn stop(&self, graph: &ConjugateGraph<M>, _coverage: &CoverageIndex, e: EdgeId) -> bool {
        graph.length(e) > self.max_length
    }

    fn check(
        &self,
        graph: &ConjugateGraph<M>,
        _coverage: &CoverageIndex,
        e: EdgeId,
    ) -> Result<bool> {
        Ok(self.check_start(graph, e) || self.check_end(graph, e))
    }

    fn delete_related(&self) -> bool {
        false
    }
}

/// Walk direction of a path finder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Produces the maximal walk from an edge whose every joint extends
/// uniquely.
pub trait UniquePathFinder<M: DataMaster>: Send {
    fn unique_path(&self, graph: &ConjugateGraph<M>, e: EdgeId, direction: Direction)
        -> Vec<EdgeId>;
}

/// Produces a walk from an edge that a genomic traversal would
/// plausibly follow.
pub trait PlausiblePathFinder<M: DataMaster>: Send {
    fn plausible_path(
        &self,
        graph: &ConjugateGraph<M>,
        e: EdgeId,
        direction: Direction,
    ) -> Vec<EdgeId>;
}

/// Default unique walker: extends while the joint vertex has exactly
/// one incoming and one outgoing edge.
pub struct DegreeUniquePathFinder;

impl<M: DataMaster> UniquePathFinder<M> for DegreeUniquePathFinder {
    fn unique_path(
        &self,
        graph: &ConjugateGraph<M>,
        e: EdgeId,
        direction: Direction,
    ) -> Vec<EdgeId> {
        let mut path = vec![e];
        let mut visited: AHashSet<VertexId> = AHashSet::new();
        loop {
            let joint = match direction {
                Direction::Forward => graph.edge_end(*path.last().unwrap()),
                Direction::Backward => graph.edge_start(*path.last().unwrap()),
            };
            if graph.in_degree(joint) != 1 || graph.out_degree(joint) != 1 || !visited.insert(joint)
            {
                return path;
            }
            let next = match direction {
                Direction::Forward => graph.outgoing(joint)[0],
                Direction::Backward => graph.incoming(joint)[0],
            };
            path.push(next);
        }
    }
}

/// Default plausible walker: greedily follows the longest continuation
/// until a dead end or a revisited vertex.
pub struct LongestContinuationPathFinder;

impl<M: DataMaster> PlausiblePathFinder<M> for LongestContinuationPathFinder {
    fn plausible_path(
        &self,
        graph: &ConjugateGraph<M>,
        e: EdgeId,
        direction: Direction,
    ) -> Vec<EdgeId> {
        let mut path = vec![e];
        let mut visited: AHashSet<VertexId> = AHashSet::new();
        loop {
            let joint = match direction {
                Direction::Forward => graph.edge_end(*path.last().unwrap()),
                Direction::Backward => graph.edge_start(*path.last().unwrap()),
            };
            if !visited.insert(joint) {
                return path;
            }
            let continuations = match direction {
                Direction::Forward => graph.outgoing(joint),
                Direction::Backward => graph.incoming(joint),
            };
            let next = continuations
                .into_iter()
                .max_by_key(|&n| (graph.length(n), n));
            match next {
                Some(n) => path.push(n),
                None => return path,
            }
        }
    }
}

fn cumulative_length<M: DataMaster>(graph: &ConjugateGraph<M>, path: &[EdgeId]) -> usize {
    path.iter().map(|&e| graph.length(e)).sum()
}

/// Uniqueness measured as the cumulative length of the unique walk.
pub struct PathUniqueness<F> {
    finder: F,
    threshold: usize,
}

impl<M, F> UniquenessPredicate<M> for PathUniqueness<F>
where
    M: DataMaster,
    F: UniquePathFinder<M>,
{
    fn is_unique(&self, graph: &ConjugateGraph<M>, e: EdgeId, forward: bool) -> bool {
        let direction = if forward {
            Direction::Forward
        } else {
            Direction::Backward
        };
        cumulative_length(graph, &self.finder.unique_path(graph, e, direction)) >= self.threshold
    }
}

/// Plausibility measured as the cumulative length of the plausible
/// walk, probed in both directions.
pub struct PathPlausibility<F> {
    finder: F,
    threshold: usize,
}

impl<M, F> PlausibilityPredicate<M> for PathPlausibility<F>
where
    M: DataMaster,
    F: PlausiblePathFinder<M>,
{
    fn is_plausible(&self, graph: &ConjugateGraph<M>, e: EdgeId) -> bool {
        [Direction::Forward, Direction::Backward]
            .into_iter()
            .any(|direction| {
                cumulative_length(graph, &self.finder.plausible_path(graph, e, direction))
                    >= self.threshold
            })
    }
}

/// The advanced refinement: same side conditions as
/// [`NewTopologyBasedChimericEdgeRemover`], with uniqueness and
/// plausibility measured over walks instead of single edges.
pub type AdvancedTopologyChimericEdgeRemover<UF, PF> =
    NewTopologyBasedChimericEdgeRemover<PathUniqueness<UF>, PathPlausibility<PF>>;

impl<UF, PF> AdvancedTopologyChimericEdgeRemover<UF, PF> {
    pub fn with_path_finders(
        config: RelativeTopologyConfig,
        unique_finder: UF,
        plausible_finder: PF,
    ) -> Result<Self> {
        let unique = PathUniqueness {
            finder: unique_finder,
            threshold: config.uniqueness_length,
        };
        let plausible = PathPlausibility {
            finder: plausible_finder,
            threshold: config.plausibility_length,
        };
        NewTopologyBasedChimericEdgeRemover::with_predicates(config, unique, plausible)
    }
}
