//! Shipped pipeline listeners: coverage filling and paired-info
//! collection. Both keep strictly thread-local buffers between merge
//! points and publish shared state only inside `merge_buffer`.

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};

use crate::graph::conjugate::{ConjugateGraph, DataMaster, EdgeId};
use crate::graph::coverage::CoverageIndex;
use crate::mapper::MappingPath;
use crate::pipeline::notifier::SequenceMapperListener;
use crate::simplify::pair_info::PairedInfoStore;
use crate::Result;

/// Accumulates mapped length per edge and publishes it into a shared
/// [`CoverageIndex`], mirroring every contribution onto the conjugate
/// strand.
pub struct CoverageFillingListener {
    coverage: CoverageIndex,
    conjugates: AHashMap<EdgeId, EdgeId>,
    buffers: RwLock<Vec<Mutex<AHashMap<EdgeId, f64>>>>,
}

impl CoverageFillingListener {
    /// Snapshot the conjugate pairing of the (read-only) graph so merge
    /// steps can mirror weight without touching the graph.
    pub fn new<M: DataMaster>(graph: &ConjugateGraph<M>, coverage: CoverageIndex) -> Self {
        let conjugates = graph
            .edges()
            .map(|e| (e, graph.conjugate_edge(e)))
            .collect();
        CoverageFillingListener {
            coverage,
            conjugates,
            buffers: RwLock::new(Vec::new()),
        }
    }
}

impl SequenceMapperListener for CoverageFillingListener {
    fn start_process_library(&self, threads: usize) -> Result<()> {
        let mut buffers = self.buffers.write();
        buffers.clear();
        buffers.resize_with(threads, Default::default);
        Ok(())
    }

    fn process_single(&self, thread: usize, path: &MappingPath) -> Result<()> {
        let buffers = self.buffers.read();
        let mut buffer = buffers[thread].lock();
        for range in path.iter() {
            *buffer.entry(range.edge).or_insert(0.0) += range.on_edge.len() as f64;
        }
        Ok(())
    }

    fn merge_buffer(&self, thread: usize) -> Result<()> {
        let buffers = self.buffers.read();
        let mut buffer = buffers[thread].lock();
        for (edge, weight) in buffer.drain() {
            self.coverage.add_weight(edge, weight);
            if let Some(&twin) = self.conjugates.get(&edge) {
                if twin != edge {
                    self.coverage.add_weight(twin, weight);
                }
            }
        }
        Ok(())
    }
}

struct RawObservation {
    first: EdgeId,
    second: EdgeId,
    distance: f64,
    weight: f64,
}

/// Derives `(edge, edge, distance)` observations from paired mapping
/// paths and merges them into a shared [`PairedInfoStore`]. Every
/// observation is mirrored onto the conjugate strand with the distance
/// corrected by the edge-length difference.
pub struct PairedInfoFillingListener {
    store: PairedInfoStore,
    edge_info: AHashMap<EdgeId, (EdgeId, usize)>,
    buffers: RwLock<Vec<Mutex<Vec<RawObservation>>>>,
}

impl PairedInfoFillingListener {
    /// Snapshot the conjugate pairing and edge lengths of the
    /// (read-only) graph.
    pub fn new<M: DataMaster>(graph: &ConjugateGraph<M>, store: PairedInfoStore) -> Self {
        let edge_info = graph
            .edges()
            .map(|e| (e, (graph.conjugate_edge(e), graph.length(e))))
            .collect();
        PairedInfoFillingListener {
            store,
            edge_info,
            buffers: RwLock::new(Vec::new()),
        }
    }
}

impl SequenceMapperListener for PairedInfoFillingListener {
    fn start_process_library(&self, threads: usize) -> Result<()> {
        let mut buffers = self.buffers.write();
        buffers.clear();
        buffers.resize_with(threads, Default::default);
        Ok(())
    }

    fn process_paired(
        &self,
        thread: usize,
        first: &MappingPath,
        second: &MappingPath,
        distance: usize,
    ) -> Result<()> {
        let buffers = self.buffers.read();
        let mut buffer = buffers[thread].lock();
        for r1 in first.iter() {
            for r2 in second.iter() {
                // distance between edge starts implied by the mates
                let d = distance as i64
                    + (r2.read.start as i64 - r2.on_edge.start as i64)
                    - (r1.read.start as i64 - r1.on_edge.start as i64);
                buffer.push(RawObservation {
                    first: r1.edge,
                    second: r2.edge,
                    distance: d as f64,
                    weight: 1.0,
                });
            }
        }
        Ok(())
    }

    fn merge_buffer(&self, thread: usize) -> Result<()> {
        let buffers = self.buffers.read();
        let mut buffer = buffers[thread].lock();
        for obs in buffer.drain(..) {
            self.store
                .add_observation(obs.first, obs.second, obs.distance, obs.weight, 0.0);
            let (first_twin, first_len) = self.edge_info[&obs.first];
            let (second_twin, second_len) = self.edge_info[&obs.second];
            if (second_twin, first_twin) != (obs.first, obs.second) {
                self.store.add_observation(
                    second_twin,
                    first_twin,
                    obs.distance + second_len as f64 - first_len as f64,
                    obs.weight,
                    0.0,
                );
            }
        }
        Ok(())
    }
}
