//! Configuration for the simplification policies. Range constraints
//! are validated by the policy constructors and surface as
//! `ConfigOutOfRange`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowCoverageConfig {
    /// Only edges shorter than this are candidates.
    pub max_length: usize,
    /// Delete below this average coverage.
    pub max_coverage: f64,
}

impl Default for LowCoverageConfig {
    fn default() -> Self {
        LowCoverageConfig {
            max_length: 100,
            max_coverage: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChimericConfig {
    /// Maximum overlap the graph constructor may have bridged; flags
    /// edges of length within `[k - max_overlap, k]`.
    pub max_overlap: usize,
}

impl Default for ChimericConfig {
    fn default() -> Self {
        ChimericConfig { max_overlap: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub max_length: usize,
    /// A neighbour supports deletion when its coverage exceeds
    /// `coverage_gap` times the candidate's.
    pub coverage_gap: f64,
    pub neighbour_length_threshold: usize,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        TopologyConfig {
            max_length: 100,
            coverage_gap: 10.0,
            neighbour_length_threshold: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelativeTopologyConfig {
    pub max_length: usize,
    /// Length at which an edge is statistically unique in the genome.
    pub uniqueness_length: usize,
    /// Length at which an edge plausibly lies on a genomic walk.
    pub plausibility_length: usize,
}

impl Default for RelativeTopologyConfig {
    fn default() -> Self {
        RelativeTopologyConfig {
            max_length: 100,
            uniqueness_length: 1500,
            plausibility_length: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairInfoConfig {
    pub max_length: usize,
    pub min_neighbour_length: usize,
    pub insert_size: usize,
    pub read_length: usize,
}

impl Default for PairInfoConfig {
    fn default() -> Self {
        PairInfoConfig {
            max_length: 100,
            min_neighbour_length: 100,
            insert_size: 400,
            read_length: 100,
        }
    }
}

/// Aggregate configuration of a full simplification round.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimplificationConfig {
    pub low_coverage: LowCoverageConfig,
    pub chimeric: ChimericConfig,
    pub topology: TopologyConfig,
    pub relative_topology: RelativeTopologyConfig,
    pub pair_info: PairInfoConfig,
}
