//! De Bruijn instantiation of the conjugate graph: vertices are k-mers,
//! edges are (>= k+1)-nucleotide sequences whose first and last k-mers
//! are the endpoint labels. Edge length is measured in graph
//! coordinates, `sequence length - k`.

use crate::core::kmer::Kmer;
use crate::core::sequence::Sequence;
use crate::graph::conjugate::{ConjugateGraph, DataMaster};

/// Data master of the paired de Bruijn graph.
#[derive(Debug, Clone)]
pub struct DebruijnDataMaster {
    k: usize,
}

impl DebruijnDataMaster {
    pub fn new(k: usize) -> Self {
        DebruijnDataMaster { k }
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

impl DataMaster for DebruijnDataMaster {
    type VertexData = Kmer;
    type EdgeData = Sequence;

    fn conjugate_vertex(&self, data: &Kmer) -> Kmer {
        data.reverse_complement()
    }

    fn conjugate_edge(&self, data: &Sequence) -> Sequence {
        data.reverse_complement()
    }

    fn is_self_conjugate(&self, data: &Sequence) -> bool {
        *data == data.reverse_complement()
    }

    fn merge(&self, left: &Sequence, right: &Sequence) -> Sequence {
        debug_assert!(
            left.subsequence(left.len() - self.k, left.len())
                == right.subsequence(0, self.k),
            "merged edges must overlap by k"
        );
        left.concat(&right.subsequence(self.k, right.len()))
    }

    fn length(&self, data: &Sequence) -> usize {
        debug_assert!(data.len() > self.k);
        data.len() - self.k
    }
}

/// The paired de Bruijn graph used throughout the assembly core.
pub type DebruijnGraph = ConjugateGraph<DebruijnDataMaster>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overlaps_by_k() {
        let master = DebruijnDataMaster::new(2);
        let left = Sequence::from_str("ACGT").unwrap();
        let right = Sequence::from_str("GTAC").unwrap();
        assert_eq!(master.merge(&left, &right).to_string(), "ACGTAC");
        assert_eq!(master.length(&left), 2);
    }

    #[test]
    fn palindromic_edge_is_self_conjugate() {
        let master = DebruijnDataMaster::new(1);
        let palindrome = Sequence::from_str("ACGT").unwrap();
        assert!(master.is_self_conjugate(&palindrome));
        let plain = Sequence::from_str("AACT").unwrap();
        assert!(!master.is_self_conjugate(&plain));
    }
}
