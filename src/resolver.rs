// Copyright 2014-2016 Johannes Köster, Taylor Cramer.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Resolves an SA interval to the distinct set of reference ids it
//! touches, in first-occurrence order, using a reusable "seen" scratch
//! bitmap cleared only at the entries it touched (spec.md §4.4).

use crate::data_structures::fmindex::{FMIndex, Interval};
use crate::reference::Bns;

pub struct Resolver {
    seen: Vec<bool>,
}

impl Resolver {
    pub fn new(n_seqs: usize) -> Self {
        Resolver {
            seen: vec![false; n_seqs],
        }
    }

    /// Reference ids touched by `interval`, in order of first occurrence
    /// scanning SA rows from `k` upward. Rows whose text position falls
    /// in an inter-sequence gap are skipped (spec: `rid == -1`), and so
    /// are rows falling in an ambiguous (`N`) run, since those are
    /// matches against the reference's placeholder base, not the real
    /// sequence.
    pub fn resolve(&mut self, fm: &FMIndex, bns: &Bns, interval: Interval) -> Vec<usize> {
        let mut ids = Vec::new();
        if interval.is_empty() {
            return ids;
        }
        for row in interval.k..=interval.l {
            let pos = fm.sa2pos(row);
            if bns.in_ambiguous_region(pos) {
                continue;
            }
            if let Some(rid) = bns.pos2rid(pos) {
                if !self.seen[rid] {
                    self.seen[rid] = true;
                    ids.push(rid);
                }
            }
        }
        for &rid in &ids {
            self.seen[rid] = false;
        }
        debug_assert!(self.seen.iter().all(|&b| !b));
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabets::dna;
    use crate::construct::build_reference;

    #[test]
    fn test_resolve_distinct_and_ordered() {
        let records = vec![
            ("chr1".to_string(), b"ACGT".to_vec()),
            ("chr2".to_string(), b"TTTT".to_vec()),
        ];
        let (bns, fm) = build_reference(&records);
        let pattern = dna::encode_seq(b"TT");
        let (interval, _) = fm.backward_search(&pattern, Interval::full(fm.seq_len()));
        let mut resolver = Resolver::new(bns.n_seqs());
        let ids = resolver.resolve(&fm, &bns, interval);
        assert_eq!(ids, vec![1]);
        // the bitmap must be reset after resolution.
        assert_eq!(resolver.seen, vec![false; bns.n_seqs()]);
    }

    #[test]
    fn test_resolve_empty_interval_yields_no_ids() {
        let records = vec![("chr1".to_string(), b"ACGT".to_vec())];
        let (bns, fm) = build_reference(&records);
        let mut resolver = Resolver::new(bns.n_seqs());
        let ids = resolver.resolve(&fm, &bns, Interval::empty());
        assert!(ids.is_empty());
    }
}
