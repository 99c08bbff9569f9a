//! Variable-length immutable DNA string with the same 2-bit packing as
//! [`Kmer`](crate::core::kmer::Kmer). Reads and edge labels travel
//! through the core as `Sequence` values.

use std::fmt;

use crate::core::kmer::Kmer;
use crate::core::nucl;
use crate::Result;

/// Immutable 2-bit packed DNA string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Sequence {
    data: Vec<u64>,
    len: usize,
}

impl Sequence {
    pub fn new() -> Self {
        Sequence::default()
    }

    /// Parse an ACGT string of arbitrary length.
    pub fn from_str(s: &str) -> Result<Self> {
        let mut seq = Sequence {
            data: vec![0; (s.len() + 31) / 32],
            len: s.len(),
        };
        for (i, c) in s.chars().enumerate() {
            seq.set(i, nucl::try_digit(c, i)?);
        }
        Ok(seq)
    }

    /// Build from 2-bit digits; out-of-range digits are rejected the
    /// same way `from_str` rejects non-ACGT characters.
    pub fn from_digits(digits: &[u8]) -> Result<Self> {
        let mut seq = Sequence {
            data: vec![0; (digits.len() + 31) / 32],
            len: digits.len(),
        };
        for (i, &d) in digits.iter().enumerate() {
            seq.set(i, nucl::try_digit_nucl(d, i)?);
        }
        Ok(seq)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 2-bit digit at position `i`.
    #[inline]
    pub fn at(&self, i: usize) -> u8 {
        debug_assert!(i < self.len);
        ((self.data[i / 32] >> ((i % 32) * 2)) & 3) as u8
    }

    #[inline]
    fn set(&mut self, i: usize, d: u8) {
        let shift = (i % 32) * 2;
        let word = &mut self.data[i / 32];
        *word = (*word & !(3u64 << shift)) | ((d as u64) << shift);
    }

    #[inline]
    pub fn first(&self) -> u8 {
        self.at(0)
    }

    #[inline]
    pub fn last(&self) -> u8 {
        self.at(self.len - 1)
    }

    /// Copy of positions `from..to`.
    pub fn subsequence(&self, from: usize, to: usize) -> Sequence {
        assert!(from <= to && to <= self.len);
        let mut out = Sequence {
            data: vec![0; (to - from + 31) / 32],
            len: to - from,
        };
        for i in from..to {
            out.set(i - from, self.at(i));
        }
        out
    }

    pub fn reverse_complement(&self) -> Sequence {
        let mut out = Sequence {
            data: vec![0; self.data.len()],
            len: self.len,
        };
        for i in 0..self.len {
            out.set(i, nucl::complement(self.at(self.len - 1 - i)));
        }
        out
    }

    /// `self` followed by `other`.
    pub fn concat(&self, other: &Sequence) -> Sequence {
        let mut out = Sequence {
            data: vec![0; (self.len + other.len + 31) / 32],
            len: self.len + other.len,
        };
        for i in 0..self.len {
            out.set(i, self.at(i));
        }
        for i in 0..other.len {
            out.set(self.len + i, other.at(i));
        }
        out
    }

    /// The `k`-mer starting at `pos`. Entry point for rolling a window
    /// along the sequence: the next window is
    /// `kmer.shift_left(seq.at(pos + k))`.
    pub fn kmer_at(&self, pos: usize, k: usize) -> Kmer {
        assert!(pos + k <= self.len);
        let mut kmer = Kmer::empty();
        for i in pos..pos + k {
            kmer = kmer.push_back(self.at(i));
        }
        kmer
    }

    pub fn to_string(&self) -> String {
        (0..self.len).map(|i| nucl::char_of(self.at(i))).collect()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_and_subsequence() {
        let seq = Sequence::from_str("ACGTACGTT").unwrap();
        assert_eq!(seq.len(), 9);
        assert_eq!(seq.to_string(), "ACGTACGTT");
        assert_eq!(seq.subsequence(2, 6).to_string(), "GTAC");
        assert_eq!(seq.subsequence(4, 4).len(), 0);
    }

    #[test]
    fn reverse_complement_matches_kmer() {
        let seq = Sequence::from_str("ACGTT").unwrap();
        assert_eq!(seq.reverse_complement().to_string(), "AACGT");
        let kmer = seq.kmer_at(0, 5).reverse_complement();
        assert_eq!(kmer.to_string(), "AACGT");
    }

    #[test]
    fn kmer_window_rolls() {
        let seq = Sequence::from_str("ACGTAC").unwrap();
        let mut kmer = seq.kmer_at(0, 4);
        assert_eq!(kmer.to_string(), "ACGT");
        for pos in 1..=2 {
            kmer = kmer.shift_left(seq.at(pos + 3));
            assert_eq!(kmer, seq.kmer_at(pos, 4));
        }
    }

    #[test]
    fn concat_spans_word_boundary() {
        let left: String = "ACGT".chars().cycle().take(30).collect();
        let right = "TTGCA";
        let seq = Sequence::from_str(&left)
            .unwrap()
            .concat(&Sequence::from_str(right).unwrap());
        assert_eq!(seq.to_string(), format!("{left}{right}"));
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(Sequence::from_str("ACGU").is_err());
    }

    #[test]
    fn from_digits_matches_from_str() {
        let seq = Sequence::from_digits(&[3, 2, 1, 0]).unwrap();
        assert_eq!(seq, Sequence::from_str("TGCA").unwrap());
        assert!(Sequence::from_digits(&[1, 5]).is_err());
    }
}
