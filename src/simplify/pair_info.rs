//! Paired-information store and the pair-info-aware removal policy
//! ===============================================================
//!
//! Paired reads yield `(edge, edge, distance)` observations. The store
//! keys them by unordered edge pair (the symmetric observation is the
//! same point with negated distance). The removal policy deletes a
//! short edge when, for every (incoming-of-start, outgoing-of-end)
//! neighbour pair, the library bounds say an observation through the
//! edge should exist and none compatible is recorded.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::errors::AssemblyError;
use crate::graph::conjugate::{ConjugateGraph, DataMaster, EdgeId};
use crate::graph::coverage::CoverageIndex;
use crate::simplify::config::PairInfoConfig;
use crate::simplify::{Criterion, VisitOrder};
use crate::Result;

/// One paired observation between two edges: estimated distance
/// between the edge starts, accumulated weight, distance variance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairedPoint {
    pub d: f64,
    pub weight: f64,
    pub variance: f64,
}

/// Read-only surface the removal policy consumes.
pub trait PairedInfoIndex: Send + Sync {
    /// All observations between `first` and `second`, with distances
    /// oriented from `first` to `second`.
    fn pair_info(&self, first: EdgeId, second: EdgeId) -> Vec<PairedPoint>;
}

type PairKey = (EdgeId, EdgeId);

/// Shared observation store filled by the pipeline's paired-info
/// listener. Clones share storage.
#[derive(Clone, Default)]
pub struct PairedInfoStore {
    points: Arc<RwLock<AHashMap<PairKey, Vec<PairedPoint>>>>,
}

impl PairedInfoStore {
    pub fn new() -> Self {
        PairedInfoStore::default()
    }

    fn canonical(first: EdgeId, second: EdgeId, d: f64) -> (PairKey, f64) {
        if first <= second {
            ((first, second), d)
        } else {
            ((second, first), -d)
        }
    }

    /// Record an observation; observations at the same distance merge
    /// their weights.
    pub fn add_observation(
        &self,
        first: EdgeId,
        second: EdgeId,
        d: f64,
        weight: f64,
        variance: f64,
    ) {
        let (key, d) = Self::canonical(first, second, d);
        let mut points = self.points.write();
        let bucket = points.entry(key).or_default();
        if let Some(existing) = bucket
            .iter_mut()
            .find(|p| (p.d - d).abs() <= f64::EPSILON && p.variance == variance)
        {
            existing.weight += weight;
            return;
        }
        bucket.push(PairedPoint {
            d,
            weight,
            variance,
        });
        bucket.sort_by(|a, b| a.d.total_cmp(&b.d));
    }

    pub fn pair_count(&self) -> usize {
        self.points.read().len()
    }
}

impl PairedInfoIndex for PairedInfoStore {
    fn pair_info(&self, first: EdgeId, second: EdgeId) -> Vec<PairedPoint> {
        let (key, _) = Self::canonical(first, second, 0.0);
        let points = self.points.read();
        let Some(bucket) = points.get(&key) else {
            return Vec::new();
        };
        if first <= second {
            bucket.clone()
        } else {
            bucket
                .iter()
                .map(|p| PairedPoint { d: -p.d, ..*p })
                .collect()
        }
    }
}

/// Removal policy 7: short edges contradicted by the paired library.
pub struct PairInfoAwareErroneousEdgeRemover<P: PairedInfoIndex> {
    index: P,
    k: usize,
    config: PairInfoConfig,
    gap: usize,
}

impl<P: PairedInfoIndex> PairInfoAwareErroneousEdgeRemover<P> {
    pub fn new(index: P, k: usize, config: PairInfoConfig) -> Result<Self> {
        if config.insert_size < 2 * config.read_length {
            return Err(AssemblyError::config(format!(
                "insert size {} below twice the read length {}",
                config.insert_size, config.read_length
            ))
            .into());
        }
        if config.insert_size <= k + 2 {
            return Err(AssemblyError::config(format!(
                "insert size {} too small for k {}",
                config.insert_size, k
            ))
            .into());
        }
        let gap = config.insert_size - 2 * config.read_length;
        Ok(PairInfoAwareErroneousEdgeRemover {
            index,
            k,
            config,
            gap,
        })
    }

    /// Shortest gap the library can still span between these edges.
    fn path_length_lower_bound(&self, len1: usize, len2: usize) -> usize {
        (self.gap + self.k + 2).saturating_sub(len1 + len2)
    }

    /// Longest gap the insert size permits.
    fn path_length_upper_bound(&self) -> usize {
        self.config.insert_size - self.k - 2
    }

    /// Whether the library must have produced an observation between
    /// `first` and `second` across a gap of `gap_length`.
    fn should_contain_info<M: DataMaster>(
        &self,
        graph: &ConjugateGraph<M>,
        first: EdgeId,
        second: EdgeId,
        gap_length: usize,
    ) -> bool {
        let lower = self.path_length_lower_bound(graph.length(first), graph.length(second));
        gap_length >= lower && gap_length <= self.path_length_upper_bound()
    }

    /// Whether a recorded observation is compatible with the walk
    /// `first -> candidate -> second`. Observations beyond what the
    /// insert size permits are inconsistent and abort the scan.
    fn contains_info<M: DataMaster>(
        &self,
        graph: &ConjugateGraph<M>,
        first: EdgeId,
        second: EdgeId,
        candidate_length: usize,
    ) -> Result<bool> {
        let distance = (graph.length(first) + candidate_length) as f64;
        let feasible = (graph.length(first) + self.path_length_upper_bound()) as f64;
        let mut found = false;
        for point in self.index.pair_info(first, second) {
            if point.d - point.variance > feasible {
                return Err(AssemblyError::InconsistentPairedInfo {
                    first: first.0,
                    second: second.0,
                    distance: point.d,
                }
                .into());
            }
            if distance + point.variance >= point.d && distance <= point.d + point.variance {
                found = true;
            }
        }
        Ok(found)
    }

    fn adjacent_long_enough<M: DataMaster>(
        &self,
        graph: &ConjugateGraph<M>,
        edges: &[EdgeId],
    ) -> bool {
        edges
            .iter()
            .all(|&n| graph.length(n) >= self.config.min_neighbour_length)
    }
}

impl<M, P> Criterion<M> for PairInfoAwareErroneousEdgeRemover<P>
where
    M: DataMaster,
    P: PairedInfoIndex,
{
    fn visit_order(&self) -> VisitOrder {
        VisitOrder::LengthAscending
    }

    fn stop(&self, graph: &ConjugateGraph<M>, _coverage: &CoverageIndex, e: EdgeId) -> bool {
        graph.length(e) > self.config.max_length
    }

    fn check(
        &self,
        graph: &ConjugateGraph<M>,
        _coverage: &CoverageIndex,
        e: EdgeId,
    ) -> Result<bool> {
        let incoming = graph.incoming(graph.edge_start(e));
        let outgoing = graph.outgoing(graph.edge_end(e));
        if !self.adjacent_long_enough(graph, &incoming)
            || !self.adjacent_long_enough(graph, &outgoing)
        {
            return Ok(false);
        }
        let length = graph.length(e);
        for &first in &incoming {
            for &second in &outgoing {
                if !self.should_contain_info(graph, first, second, length) {
                    trace!(edge = e.0, "pair info not expected, keeping edge");
                    return Ok(false);
                }
                if self.contains_info(graph, first, second, length)? {
                    trace!(edge = e.0, "compatible pair info found, keeping edge");
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn delete_related(&self) -> bool {
        false
    }
}
