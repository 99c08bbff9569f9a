//! Sequence-to-graph mapper
//! ========================
//!
//! Slides (k+1)-mers over a read and anchors each one in the graph
//! through a k-mer index, producing an ordered [`MappingPath`] of
//! (edge, range) pairs. Consecutive anchors at successive offsets on
//! one edge coalesce into a single range; k-mers absent from the index
//! are not errors and contribute nothing.

use std::ops::Range;

use ahash::AHashMap;

use crate::core::kmer::Kmer;
use crate::core::sequence::Sequence;
use crate::graph::conjugate::{ConjugateGraph, DataMaster, EdgeId};

/// Resolves a (k+1)-mer to its unique location in the graph.
pub trait KmerIndex: Send + Sync {
    fn contains(&self, kmer: &Kmer) -> bool;
    fn get(&self, kmer: &Kmer) -> Option<(EdgeId, usize)>;
}

/// Canonicalises k-mers before lookup; identity unless reads went
/// through error correction.
pub trait KmerMapper: Send + Sync {
    fn substitute(&self, kmer: Kmer) -> Kmer;
}

/// Default substitution map.
pub struct IdentityKmerMapper;

impl KmerMapper for IdentityKmerMapper {
    #[inline]
    fn substitute(&self, kmer: Kmer) -> Kmer {
        kmer
    }
}

/// One aligned stretch: read positions `read` land on edge positions
/// `on_edge`, both half-open and equally long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRange {
    pub edge: EdgeId,
    pub read: Range<usize>,
    pub on_edge: Range<usize>,
}

/// Ordered alignment of a read to graph edges, offsets monotone within
/// each range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingPath {
    ranges: Vec<MappedRange>,
}

impl MappingPath {
    pub fn new() -> Self {
        MappingPath::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn ranges(&self) -> &[MappedRange] {
        &self.ranges
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappedRange> {
        self.ranges.iter()
    }

    /// Edge handles in path order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.ranges.iter().map(|r| r.edge)
    }

    fn push_anchor(&mut self, edge: EdgeId, read_pos: usize, offset: usize) {
        if let Some(last) = self.ranges.last_mut() {
            if last.edge == edge && last.on_edge.end == offset && last.read.end == read_pos {
                last.on_edge.end += 1;
                last.read.end += 1;
                return;
            }
        }
        self.ranges.push(MappedRange {
            edge,
            read: read_pos..read_pos + 1,
            on_edge: offset..offset + 1,
        });
    }
}

/// `AHashMap`-backed index over every (k+1)-mer of every edge label.
pub struct EdgeKmerIndex {
    k: usize,
    anchors: AHashMap<Kmer, (EdgeId, usize)>,
}

impl EdgeKmerIndex {
    /// Walk all edge labels of the graph and record each (k+1)-mer with
    /// its (edge, offset) location.
    pub fn build<M>(graph: &ConjugateGraph<M>, k: usize) -> Self
    where
        M: DataMaster<EdgeData = Sequence>,
    {
        let mut anchors = AHashMap::new();
        for e in graph.edges() {
            let label = graph.edge_data(e);
            debug_assert!(label.len() > k);
            let mut kmer = label.kmer_at(0, k + 1);
            anchors.insert(kmer, (e, 0));
            for offset in 1..=label.len() - k - 1 {
                kmer = kmer.shift_left(label.at(offset + k));
                anchors.insert(kmer, (e, offset));
            }
        }
        EdgeKmerIndex { k, anchors }
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

impl KmerIndex for EdgeKmerIndex {
    fn contains(&self, kmer: &Kmer) -> bool {
        self.anchors.contains_key(kmer)
    }

    fn get(&self, kmer: &Kmer) -> Option<(EdgeId, usize)> {
        self.anchors.get(kmer).copied()
    }
}

/// Maps read sequences onto paths of graph edges.
pub struct SequenceMapper<I: KmerIndex, S: KmerMapper> {
    index: I,
    kmer_mapper: S,
    k: usize,
}

impl<I: KmerIndex, S: KmerMapper> SequenceMapper<I, S> {
    pub fn new(index: I, kmer_mapper: S, k: usize) -> Self {
        SequenceMapper {
            index,
            kmer_mapper,
            k,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Align `seq` to the graph. Unanchored stretches are dropped.
    pub fn map_sequence(&self, seq: &Sequence) -> MappingPath {
        let mut path = MappingPath::new();
        let window = self.k + 1;
        if seq.len() < window {
            return path;
        }
        let mut kmer = seq.kmer_at(0, window);
        for pos in 0..=seq.len() - window {
            if pos > 0 {
                kmer = kmer.shift_left(seq.at(pos + window - 1));
            }
            let canonical = self.kmer_mapper.substitute(kmer);
            if let Some((edge, offset)) = self.index.get(&canonical) {
                path.push_anchor(edge, pos, offset);
            }
        }
        path
    }
}
