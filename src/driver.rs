// Copyright 2014-2016 Johannes Köster, Taylor Cramer.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! The streaming k-mer driver: slides a K-length window over a read,
//! choosing between cold restart and warm continue, and applies the
//! skip-after-failure heuristic (spec.md §4.3).

use std::io::{self, Write};

use crate::alphabets::dna;
use crate::data_structures::fmindex::{FMIndex, Interval};
use crate::data_structures::klcp::Klcp;
use crate::io::Read;
use crate::reference::Bns;
use crate::resolver::Resolver;

/// Matching knobs forwarded from the CLI to the driver.
pub struct MatchOptions {
    pub k: u32,
    pub use_klcp: bool,
    pub skip_after_failure: bool,
    pub print_headers: bool,
}

/// The skip-after-failure constant is `K - 2`, preserved exactly as
/// observed in the source this system is derived from even though a
/// single substitution invalidates `K` consecutive windows (spec.md §9
/// flags this as an asymmetric but deliberately-preserved behavior).
fn skip_after_failure_count(k: u32) -> usize {
    (k as usize).saturating_sub(2)
}

/// Stream the k-mer windows of `read` against `fm`, writing one output
/// line per window to `out`. `klcp` is required when `opts.use_klcp` is
/// set; passing `None` with `use_klcp` true is a caller bug (cold
/// restart is always used, making the flag a no-op).
pub fn match_read<W: Write>(
    read: &Read,
    fm: &FMIndex,
    klcp: Option<&Klcp>,
    bns: &Bns,
    resolver: &mut Resolver,
    opts: &MatchOptions,
    out: &mut W,
) -> io::Result<()> {
    if opts.print_headers {
        writeln!(out, "#{}", String::from_utf8_lossy(&dna::decode_seq(&read.seq)))?;
    }

    let k = opts.k as usize;
    let len = read.seq.len();
    if len < k {
        return Ok(());
    }
    let last_p = len - k;

    let mut p = 0usize;
    let mut prev: Option<Interval> = None;
    let mut was_one = false;
    let mut zero_streak = 0u32;

    while p <= last_p {
        let window = &read.seq[p..p + k];
        let warm = opts.use_klcp && p > 0 && prev.map_or(false, |iv| !iv.is_empty());

        let (raw_interval, full_matched) = if warm {
            let prev_iv = prev.expect("warm implies a previous interval");
            let klcp = klcp.expect("use_klcp requires a loaded klcp");
            let widened = Interval {
                k: klcp.decrease_k(prev_iv.k),
                l: klcp.increase_l(prev_iv.l),
            };
            // Only the new trailing base is searched; the rest of the
            // window was already verified when `prev` was computed, so
            // the true matched length is `k - 1` plus whatever this
            // single-character search consumed.
            let (interval, matched) = fm.backward_search(&window[k - 1..], widened);
            (interval, k - 1 + matched)
        } else {
            let (interval, matched) = fm.backward_search(window, Interval::full(fm.seq_len()));
            (interval, matched)
        };

        // A window containing an N is a total miss, not a partial match:
        // `full_matched < k` means backward search stopped early,
        // regardless of whether the partial interval it returned happens
        // to be non-empty.
        let interval = if full_matched < window.len() {
            Interval::empty()
        } else {
            raw_interval
        };

        let ids = resolver.resolve(fm, bns, interval);
        write_hit_line(out, &ids)?;
        prev = Some(interval);

        if opts.skip_after_failure {
            if interval.is_empty() {
                if was_one && zero_streak == 0 {
                    let skip = skip_after_failure_count(opts.k).min(last_p - p);
                    for _ in 0..skip {
                        writeln!(out, "0")?;
                    }
                    p += skip;
                }
                zero_streak += 1;
            } else {
                was_one = true;
                zero_streak = 0;
            }
        }

        p += 1;
    }

    Ok(())
}

fn write_hit_line<W: Write>(out: &mut W, ids: &[usize]) -> io::Result<()> {
    write!(out, "{}", ids.len())?;
    for id in ids {
        write!(out, " {id}")?;
    }
    writeln!(out)
}
