// Copyright 2014-2016 Johannes Köster, Taylor Cramer.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Suffix array sampling.
//!
//! Only a fraction of the suffix array is kept resident; the rest is
//! recovered via LF-mapping (one backward BWT step moves a row to the row
//! of the text position one earlier) until a sampled row is hit. Rows are
//! sampled by *text position*, not by row index — row `i` is sampled iff
//! `SA[i] % rate == 0` — which bounds the walk to at most `rate` steps,
//! per spec.md §3's "SA samples sufficient for `sa2pos(i)`".

use super::bwt::{Bwt, Less, Occ, GAP};
use vers_vecs::{BitVec, RsVec};

/// The un-sampled suffix array, kept around only during construction.
pub type RawSuffixArray = Vec<u64>;

/// LF-mapping: given `bwt[row]`, returns the row whose suffix starts one
/// text position earlier.
fn lf(bwt: &Bwt, less: &Less, occ: &Occ, row: u64) -> u64 {
    let c = bwt[row as usize];
    if c == GAP {
        occ.occ_gap(bwt, row as i64) - 1
    } else {
        let base = c - 1;
        less[base as usize] + occ.occ(bwt, base, row as i64) - 1
    }
}

/// A suffix array sampled by text position, with LF-mapping fallback.
pub struct SampledSuffixArray {
    rate: u64,
    is_sampled: RsVec,
    positions: Vec<u64>,
}

impl SampledSuffixArray {
    /// Sample `sa` keeping one entry per `rate` text positions.
    pub fn sample(sa: &RawSuffixArray, rate: u64) -> Self {
        assert!(rate > 0, "suffix array sample rate must be positive");
        let mut bits = BitVec::from_zeros(sa.len());
        let mut positions = Vec::new();
        for (row, &pos) in sa.iter().enumerate() {
            if pos % rate == 0 {
                bits.set(row, 1).unwrap();
                positions.push(pos);
            }
        }
        SampledSuffixArray {
            rate,
            is_sampled: RsVec::from_bit_vec(bits),
            positions,
        }
    }

    /// Recover the text position of SA row `row`.
    pub fn sa2pos(&self, mut row: u64, bwt: &Bwt, less: &Less, occ: &Occ) -> u64 {
        let mut steps = 0u64;
        while self.is_sampled.get(row as usize) != Some(1) {
            row = lf(bwt, less, occ, row);
            steps += 1;
        }
        let sample_index = self.is_sampled.rank1(row as usize);
        self.positions[sample_index] + steps
    }

    pub fn rate(&self) -> u64 {
        self.rate
    }

    /// Rebuild from persisted parts: one flag per SA row (`true` iff
    /// sampled) and the text positions of the sampled rows, in row order.
    pub fn from_parts(rate: u64, flags: &[bool], positions: Vec<u64>) -> Self {
        let mut bits = BitVec::from_zeros(flags.len());
        for (row, &sampled) in flags.iter().enumerate() {
            if sampled {
                bits.set(row, 1).unwrap();
            }
        }
        SampledSuffixArray {
            rate,
            is_sampled: RsVec::from_bit_vec(bits),
            positions,
        }
    }

    /// One flag per SA row (`true` iff sampled), for persistence.
    pub fn sampled_flags(&self, rows: usize) -> Vec<bool> {
        (0..rows).map(|i| self.is_sampled.get(i) == Some(1)).collect()
    }

    /// Text positions of the sampled rows, in row order, for persistence.
    pub fn sampled_positions(&self) -> &[u64] {
        &self.positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::bwt::{less as compute_less, to_internal, Occ as OccStruct};

    fn naive_sa(text: &[u8]) -> RawSuffixArray {
        let n = text.len() as u64;
        let mut sa: Vec<u64> = (0..=n).collect();
        sa.sort_by_key(|&i| &text[i as usize..]);
        sa
    }

    fn build_bwt(text: &[u8], sa: &RawSuffixArray) -> Bwt {
        sa.iter()
            .map(|&pos| {
                if pos == 0 {
                    text[text.len() - 1]
                } else {
                    text[(pos - 1) as usize]
                }
            })
            .collect()
    }

    #[test]
    fn test_sa2pos_matches_raw_sa() {
        // internal codes: GAP=0, A=1 C=2 G=3 T=4.
        // two chromosomes "ACGT" and "TTTT" separated and terminated by GAP.
        let text: Vec<u8> = [b'A', b'C', b'G', b'T']
            .iter()
            .map(|&b| to_internal(crate::alphabets::dna::encode(b)))
            .chain(std::iter::once(GAP))
            .chain(std::iter::repeat(to_internal(crate::alphabets::dna::encode(b'T'))).take(4))
            .chain(std::iter::once(GAP))
            .collect();
        let sa = naive_sa(&text);
        let bwt = build_bwt(&text, &sa);
        let less = compute_less(&bwt);
        let occ = OccStruct::new(&bwt, 2);

        for rate in [1u64, 2, 3] {
            let sampled = SampledSuffixArray::sample(&sa, rate);
            for (row, &expected_pos) in sa.iter().enumerate() {
                assert_eq!(
                    sampled.sa2pos(row as u64, &bwt, &less, &occ),
                    expected_pos,
                    "rate={rate} row={row}"
                );
            }
        }
    }
}
