// Copyright 2014-2016 Johannes Köster, Taylor Cramer.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Reference construction: turns a set of named sequences into the BNS
//! offset table and a fully built FM-index. Peripheral to the matching
//! core (spec's "BWT construction algorithm itself" is out of scope for
//! the core, but a working builder is required for a usable crate), so
//! a naive `O(n log^2 n)` comparison sort is good enough — no suffix
//! array induction.

use crate::alphabets::dna;
use crate::data_structures::bwt::{less, to_internal, Bwt, Occ, GAP};
use crate::data_structures::fmindex::FMIndex;
use crate::data_structures::suffix_array::{RawSuffixArray, SampledSuffixArray};
use crate::reference::Bns;

/// Default suffix array sample rate for freshly built indexes.
pub const DEFAULT_SA_SAMPLE_RATE: u64 = 32;
/// Default occurrence-checkpoint bucket size for freshly built indexes.
pub const OCC_BUCKET: usize = 64;

/// The base code substituted for `N` when indexing the reference: the
/// BWT/Occ alphabet only has room for the four real bases, so `N`
/// positions are packed as `A` the way the original program packs
/// ambiguous bases in its `.pac` file. Their true positions are recorded
/// separately as [`Bns`] ambiguous runs, and any hit resolving into one
/// is a placeholder match, not a real one (`Resolver::resolve` filters
/// these out).
const N_PLACEHOLDER: u8 = 0;

/// Encode a set of named sequences into the internal BWT alphabet
/// (`GAP`=0, A=1, C=2, G=3, T=4), concatenated with one gap byte after
/// each sequence. `N` bases are substituted with [`N_PLACEHOLDER`].
pub fn internal_text(records: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut text = Vec::new();
    for (_, seq) in records {
        text.extend(dna::encode_seq(seq).into_iter().map(|code| {
            let code = if code == dna::N { N_PLACEHOLDER } else { code };
            to_internal(code)
        }));
        text.push(GAP);
    }
    text
}

fn naive_suffix_array(text: &[u8]) -> RawSuffixArray {
    let mut sa: RawSuffixArray = (0..text.len() as u64).collect();
    sa.sort_unstable_by(|&a, &b| text[a as usize..].cmp(&text[b as usize..]));
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

fn build_bns(records: &[(String, Vec<u8>)]) -> Bns {
    let mut names = Vec::with_capacity(records.len());
    let mut starts = Vec::with_capacity(records.len());
    let mut lens = Vec::with_capacity(records.len());
    let mut amb_starts = Vec::new();
    let mut amb_lens = Vec::new();
    let mut offset = 0u64;
    for (name, seq) in records {
        names.push(name.clone());
        starts.push(offset);
        lens.push(seq.len() as u64);

        let mut run_start: Option<u64> = None;
        for (i, &base) in seq.iter().enumerate() {
            if dna::encode(base) == dna::N {
                run_start.get_or_insert(offset + i as u64);
            } else if let Some(start) = run_start.take() {
                amb_starts.push(start);
                amb_lens.push(offset + i as u64 - start);
            }
        }
        if let Some(start) = run_start {
            amb_starts.push(start);
            amb_lens.push(offset + seq.len() as u64 - start);
        }

        offset += seq.len() as u64 + 1; // one gap byte follows each sequence
    }
    Bns::with_ambiguous(names, starts, lens, offset, amb_starts, amb_lens)
}

/// Build the BNS layout and a fully sampled FM-index from a set of named
/// sequences, using the crate's default sample rate and occurrence
/// bucket size.
pub fn build_reference(records: &[(String, Vec<u8>)]) -> (Bns, FMIndex) {
    build_reference_with_params(records, DEFAULT_SA_SAMPLE_RATE, OCC_BUCKET)
}

/// As [`build_reference`], with an explicit suffix array sample rate and
/// occurrence bucket size.
pub fn build_reference_with_params(
    records: &[(String, Vec<u8>)],
    sa_sample_rate: u64,
    occ_bucket: usize,
) -> (Bns, FMIndex) {
    let bns = build_bns(records);
    let text = internal_text(records);
    let sa = naive_suffix_array(&text);
    let bwt = build_bwt(&text, &sa);
    let less_table = less(&bwt);
    let occ = Occ::new(&bwt, occ_bucket);
    let sampled = SampledSuffixArray::sample(&sa, sa_sample_rate);
    let fm = FMIndex::new(bwt, less_table, occ, sampled);
    (bns, fm)
}
