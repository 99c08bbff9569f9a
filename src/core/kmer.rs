//! Bit-packed immutable k-mer
//! ==========================
//!
//! Fixed-capacity 2-bit encoding of a DNA word of length `k <= 128`.
//! Nucleotide `i` lives at bit offset `2 * (i % 32)` of word `i / 32`.
//! All bits at positions `>= 2 * k` are zero (the "padding-is-A"
//! invariant), which makes word-wise memory equality and the polynomial
//! hash insensitive to unused storage.
//!
//! Values are never mutated after construction; every operation returns
//! a fresh k-mer.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::core::nucl;
use crate::Result;

/// Largest supported k-mer length.
pub const MAX_K: usize = 128;

/// Storage words; 32 nucleotides per `u64`.
const WORDS: usize = MAX_K / 32;

/// Immutable bit-packed k-mer with runtime length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kmer {
    data: [u64; WORDS],
    k: u16,
}

impl Kmer {
    /// The empty k-mer (`k == 0`). All operations on it are trivially
    /// valid; shifts return it unchanged.
    pub const fn empty() -> Self {
        Kmer {
            data: [0; WORDS],
            k: 0,
        }
    }

    /// Parse an ACGT string of length `<= 128`.
    pub fn from_str(s: &str) -> Result<Self> {
        assert!(s.len() <= MAX_K, "k-mer length {} exceeds {}", s.len(), MAX_K);
        let mut kmer = Kmer {
            data: [0; WORDS],
            k: s.len() as u16,
        };
        for (i, c) in s.chars().enumerate() {
            kmer.set(i, nucl::try_digit(c, i)?);
        }
        Ok(kmer)
    }

    /// Build from 2-bit digits; out-of-range digits are rejected the
    /// same way `from_str` rejects non-ACGT characters.
    pub fn from_digits(digits: &[u8]) -> Result<Self> {
        assert!(digits.len() <= MAX_K);
        let mut kmer = Kmer {
            data: [0; WORDS],
            k: digits.len() as u16,
        };
        for (i, &d) in digits.iter().enumerate() {
            kmer.set(i, nucl::try_digit_nucl(d, i)?);
        }
        Ok(kmer)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.k as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.k == 0
    }

    /// 2-bit digit at position `i` (`0 <= i < k`).
    #[inline]
    pub fn at(&self, i: usize) -> u8 {
        debug_assert!(i < self.len());
        ((self.data[i / 32] >> ((i % 32) * 2)) & 3) as u8
    }

    #[inline]
    fn set(&mut self, i: usize, d: u8) {
        let shift = (i % 32) * 2;
        let word = &mut self.data[i / 32];
        *word = (*word & !(3u64 << shift)) | ((d as u64) << shift);
    }

    /// Number of storage words actually holding nucleotides.
    #[inline]
    fn occupied_words(&self) -> usize {
        (self.len() + 31) / 32
    }

    /// Zero every bit at positions `>= k`, restoring the padding
    /// invariant after a word-wise shift.
    fn mask_padding(data: &mut [u64; WORDS], k: usize) {
        let full = k / 32;
        let rem = k % 32;
        if full < WORDS {
            if rem == 0 {
                data[full] = 0;
            } else {
                data[full] &= (1u64 << (rem * 2)) - 1;
            }
            for word in data.iter_mut().skip(full + 1) {
                *word = 0;
            }
        }
    }

    /// `out[i] = complement(in[k - 1 - i])`.
    pub fn reverse_complement(&self) -> Self {
        let k = self.len();
        let mut out = Kmer {
            data: [0; WORDS],
            k: self.k,
        };
        for i in 0..k {
            out.set(i, nucl::complement(self.at(k - 1 - i)));
        }
        out
    }

    /// Roll forward: drop position 0, append `d` at position `k - 1`.
    pub fn shift_left(&self, d: u8) -> Self {
        debug_assert!(nucl::is_digit_nucl(d));
        if self.is_empty() {
            return *self;
        }
        let mut data = self.data;
        for i in 0..WORDS {
            let carry = if i + 1 < WORDS { data[i + 1] & 3 } else { 0 };
            data[i] = (data[i] >> 2) | (carry << 62);
        }
        let mut out = Kmer { data, k: self.k };
        // old position k was padding, so position k - 1 is clear
        out.set(self.len() - 1, d);
        out
    }

    /// Roll backward: drop position `k - 1`, prepend `d` at position 0.
    pub fn shift_right(&self, d: u8) -> Self {
        debug_assert!(nucl::is_digit_nucl(d));
        if self.is_empty() {
            return *self;
        }
        let mut data = self.data;
        let mut carry = d as u64;
        for word in data.iter_mut() {
            let next = (*word >> 62) & 3;
            *word = (*word << 2) | carry;
            carry = next;
        }
        Self::mask_padding(&mut data, self.len());
        Kmer { data, k: self.k }
    }

    /// Append `d`, growing the k-mer by one position.
    pub fn push_back(&self, d: u8) -> Self {
        debug_assert!(nucl::is_digit_nucl(d));
        assert!(self.len() < MAX_K, "k-mer capacity exceeded");
        let mut out = Kmer {
            data: self.data,
            k: self.k + 1,
        };
        out.set(self.len(), d);
        out
    }

    /// Prepend `d`, growing the k-mer by one position.
    pub fn push_front(&self, d: u8) -> Self {
        debug_assert!(nucl::is_digit_nucl(d));
        assert!(self.len() < MAX_K, "k-mer capacity exceeded");
        let mut data = self.data;
        let mut carry = d as u64;
        for word in data.iter_mut() {
            let next = (*word >> 62) & 3;
            *word = (*word << 2) | carry;
            carry = next;
        }
        Kmer {
            data,
            k: self.k + 1,
        }
    }

    /// The first `k2` positions.
    pub fn prefix(&self, k2: usize) -> Self {
        assert!(k2 <= self.len());
        let mut data = self.data;
        Self::mask_padding(&mut data, k2);
        Kmer {
            data,
            k: k2 as u16,
        }
    }

    /// The last `k2` positions.
    pub fn suffix(&self, k2: usize) -> Self {
        assert!(k2 <= self.len());
        self.sub_kmer(self.len() - k2, k2)
    }

    /// `k2` positions starting at `offset`; also the constructor "from a
    /// larger k-mer with offset".
    pub fn sub_kmer(&self, offset: usize, k2: usize) -> Self {
        assert!(offset + k2 <= self.len());
        let mut out = Kmer {
            data: [0; WORDS],
            k: k2 as u16,
        };
        for i in 0..k2 {
            out.set(i, self.at(offset + i));
        }
        out
    }

    #[inline]
    pub fn first(&self) -> u8 {
        self.at(0)
    }

    #[inline]
    pub fn last(&self) -> u8 {
        self.at(self.len() - 1)
    }

    /// Deterministic polynomial fold over the occupied storage words:
    /// `h = 239; h = h * 31 + w`. Depends only on nucleotide content
    /// thanks to the padding invariant.
    pub fn hash_value(&self) -> u64 {
        let mut h: u64 = 239;
        for &w in &self.data[..self.occupied_words()] {
            h = h.wrapping_mul(31).wrapping_add(w);
        }
        h
    }

    /// Lexicographic comparison by nucleotide digits (not by storage
    /// words); a shorter k-mer that is a prefix of a longer one sorts
    /// first.
    pub fn cmp_lex(&self, other: &Self) -> Ordering {
        let common = self.len().min(other.len());
        for i in 0..common {
            match self.at(i).cmp(&other.at(i)) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        self.len().cmp(&other.len())
    }

    pub fn to_string(&self) -> String {
        (0..self.len()).map(|i| nucl::char_of(self.at(i))).collect()
    }
}

impl Hash for Kmer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_value());
        state.write_u16(self.k);
    }
}

impl PartialOrd for Kmer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Kmer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_lex(other)
    }
}

impl fmt::Display for Kmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string())
    }
}
