// Copyright 2014-2016 Johannes Köster, Taylor Cramer.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! On-disk layout for a built reference and its KLCP sibling structure.
//!
//! An index lives under a path prefix `<prefix>` as four little-endian
//! files:
//!
//! - `<prefix>.bns`  — chromosome names, offsets and lengths.
//! - `<prefix>.pac`  — the concatenated reference in the internal BWT
//!   alphabet, one byte per symbol (gap bytes included). Kept around so
//!   the `index` subcommand can build KLCP by direct text lookup rather
//!   than re-deriving the text from the BWT.
//! - `<prefix>.bwt`  — the Burrows-Wheeler transform plus the suffix
//!   array sample.
//! - `<prefix>.<K>.bit.klcp` — the KLCP bit vector for a chosen `K`.
//!
//! `L2` and the occurrence checkpoints are not persisted: both are cheap
//! to rebuild from the BWT bytes on load (spec.md §4.6 only requires the
//! BWT-derived structures to round-trip exactly, not every field).

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::data_structures::bwt::{less, Bwt, Occ};
use crate::data_structures::fmindex::FMIndex;
use crate::data_structures::klcp::Klcp;
use crate::data_structures::suffix_array::SampledSuffixArray;
use crate::error::{Error, Result};
use crate::reference::Bns;

use crate::construct::OCC_BUCKET;

fn load_err(path: &Path, source: io::Error) -> Error {
    Error::IndexLoad {
        path: path.to_path_buf(),
        source,
    }
}

fn corrupt_err(path: &Path, reason: impl Into<String>) -> Error {
    Error::IndexCorrupt {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn bns_path(prefix: &Path) -> PathBuf {
    with_suffix(prefix, ".bns")
}

fn pac_path(prefix: &Path) -> PathBuf {
    with_suffix(prefix, ".pac")
}

fn bwt_path(prefix: &Path) -> PathBuf {
    with_suffix(prefix, ".bwt")
}

fn klcp_path(prefix: &Path, k: u32) -> PathBuf {
    with_suffix(prefix, &format!(".{}.bit.klcp", k))
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut s = prefix.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

/// Write `<prefix>.bns`, `<prefix>.pac` and `<prefix>.bwt`.
pub fn save_index(prefix: &Path, bns: &Bns, fm: &FMIndex, text: &[u8]) -> Result<()> {
    save_bns(prefix, bns)?;
    save_pac(prefix, text)?;
    save_bwt(prefix, fm)?;
    Ok(())
}

/// Load the BNS table, raw text and FM-index previously written by
/// [`save_index`].
pub fn load_index(prefix: &Path) -> Result<(Bns, Vec<u8>, FMIndex)> {
    let bns = load_bns(prefix)?;
    let text = load_pac(prefix)?;
    let fm = load_bwt(prefix)?;
    Ok((bns, text, fm))
}

fn save_bns(prefix: &Path, bns: &Bns) -> Result<()> {
    let path = bns_path(prefix);
    let file = File::create(&path).map_err(|e| load_err(&path, e))?;
    let mut w = BufWriter::new(file);
    (|| -> io::Result<()> {
        w.write_u64::<LittleEndian>(bns.n_seqs() as u64)?;
        w.write_u64::<LittleEndian>(bns.seq_len())?;
        for i in 0..bns.n_seqs() {
            let name = bns.name(i).as_bytes();
            w.write_u32::<LittleEndian>(name.len() as u32)?;
            w.write_all(name)?;
            w.write_u64::<LittleEndian>(bns.start(i))?;
            w.write_u64::<LittleEndian>(bns.len(i))?;
        }
        w.write_u64::<LittleEndian>(bns.amb_starts().len() as u64)?;
        for (&start, &len) in bns.amb_starts().iter().zip(bns.amb_lens()) {
            w.write_u64::<LittleEndian>(start)?;
            w.write_u64::<LittleEndian>(len)?;
        }
        Ok(())
    })()
    .map_err(|e| load_err(&path, e))
}

fn load_bns(prefix: &Path) -> Result<Bns> {
    let path = bns_path(prefix);
    let file = File::open(&path).map_err(|e| load_err(&path, e))?;
    let mut r = BufReader::new(file);
    let n_seqs = r.read_u64::<LittleEndian>().map_err(|e| load_err(&path, e))? as usize;
    let seq_len = r.read_u64::<LittleEndian>().map_err(|e| load_err(&path, e))?;
    let mut names = Vec::with_capacity(n_seqs);
    let mut starts = Vec::with_capacity(n_seqs);
    let mut lens = Vec::with_capacity(n_seqs);
    for _ in 0..n_seqs {
        let name_len = r.read_u32::<LittleEndian>().map_err(|e| load_err(&path, e))? as usize;
        let mut name_bytes = vec![0u8; name_len];
        r.read_exact(&mut name_bytes).map_err(|e| load_err(&path, e))?;
        let name = String::from_utf8(name_bytes)
            .map_err(|e| corrupt_err(&path, format!("non-utf8 sequence name: {e}")))?;
        let start = r.read_u64::<LittleEndian>().map_err(|e| load_err(&path, e))?;
        let len = r.read_u64::<LittleEndian>().map_err(|e| load_err(&path, e))?;
        names.push(name);
        starts.push(start);
        lens.push(len);
    }
    let n_amb = r.read_u64::<LittleEndian>().map_err(|e| load_err(&path, e))? as usize;
    let mut amb_starts = Vec::with_capacity(n_amb);
    let mut amb_lens = Vec::with_capacity(n_amb);
    for _ in 0..n_amb {
        amb_starts.push(r.read_u64::<LittleEndian>().map_err(|e| load_err(&path, e))?);
        amb_lens.push(r.read_u64::<LittleEndian>().map_err(|e| load_err(&path, e))?);
    }
    Ok(Bns::with_ambiguous(names, starts, lens, seq_len, amb_starts, amb_lens))
}

fn save_pac(prefix: &Path, text: &[u8]) -> Result<()> {
    let path = pac_path(prefix);
    let file = File::create(&path).map_err(|e| load_err(&path, e))?;
    let mut w = BufWriter::new(file);
    (|| -> io::Result<()> {
        w.write_u64::<LittleEndian>(text.len() as u64)?;
        w.write_all(text)
    })()
    .map_err(|e| load_err(&path, e))
}

fn load_pac(prefix: &Path) -> Result<Vec<u8>> {
    let path = pac_path(prefix);
    let file = File::open(&path).map_err(|e| load_err(&path, e))?;
    let mut r = BufReader::new(file);
    let len = r.read_u64::<LittleEndian>().map_err(|e| load_err(&path, e))? as usize;
    let mut text = vec![0u8; len];
    r.read_exact(&mut text).map_err(|e| load_err(&path, e))?;
    Ok(text)
}

fn save_bwt(prefix: &Path, fm: &FMIndex) -> Result<()> {
    let path = bwt_path(prefix);
    let file = File::create(&path).map_err(|e| load_err(&path, e))?;
    let mut w = BufWriter::new(file);
    let bwt = fm.bwt();
    let rows = bwt.len();
    let flags = fm.sampled_flags();
    let positions = fm.sampled_positions();
    (|| -> io::Result<()> {
        w.write_u64::<LittleEndian>(rows as u64)?;
        w.write_all(bwt)?;
        w.write_u64::<LittleEndian>(fm.sample_rate())?;
        for chunk in flags.chunks(8) {
            let mut byte = 0u8;
            for (i, &bit) in chunk.iter().enumerate() {
                if bit {
                    byte |= 1 << i;
                }
            }
            w.write_u8(byte)?;
        }
        w.write_u64::<LittleEndian>(positions.len() as u64)?;
        for &pos in positions {
            w.write_u64::<LittleEndian>(pos)?;
        }
        Ok(())
    })()
    .map_err(|e| load_err(&path, e))
}

fn load_bwt(prefix: &Path) -> Result<FMIndex> {
    let path = bwt_path(prefix);
    let file = File::open(&path).map_err(|e| load_err(&path, e))?;
    let mut r = BufReader::new(file);
    let rows = r.read_u64::<LittleEndian>().map_err(|e| load_err(&path, e))? as usize;
    let mut bwt: Bwt = vec![0u8; rows];
    r.read_exact(&mut bwt).map_err(|e| load_err(&path, e))?;
    let sample_rate = r.read_u64::<LittleEndian>().map_err(|e| load_err(&path, e))?;
    let n_flag_bytes = (rows + 7) / 8;
    let mut flag_bytes = vec![0u8; n_flag_bytes];
    r.read_exact(&mut flag_bytes).map_err(|e| load_err(&path, e))?;
    let flags: Vec<bool> = (0..rows)
        .map(|i| flag_bytes[i / 8] & (1 << (i % 8)) != 0)
        .collect();
    let n_positions = r.read_u64::<LittleEndian>().map_err(|e| load_err(&path, e))? as usize;
    let mut positions = Vec::with_capacity(n_positions);
    for _ in 0..n_positions {
        positions.push(r.read_u64::<LittleEndian>().map_err(|e| load_err(&path, e))?);
    }
    let less_table = less(&bwt);
    let occ = Occ::new(&bwt, OCC_BUCKET);
    let sa = SampledSuffixArray::from_parts(sample_rate, &flags, positions);
    Ok(FMIndex::new(bwt, less_table, occ, sa))
}

/// Write `<prefix>.<K>.bit.klcp`.
pub fn save_klcp(prefix: &Path, seq_len: u64, klcp: &Klcp) -> Result<()> {
    let path = klcp_path(prefix, klcp.k());
    let file = File::create(&path).map_err(|e| load_err(&path, e))?;
    let mut w = BufWriter::new(file);
    let bits = klcp.bits();
    (|| -> io::Result<()> {
        w.write_u64::<LittleEndian>(seq_len)?;
        w.write_u32::<LittleEndian>(klcp.k())?;
        w.write_u64::<LittleEndian>(bits.len() as u64)?;
        for chunk in bits.chunks(8) {
            let mut byte = 0u8;
            for (i, &bit) in chunk.iter().enumerate() {
                if bit {
                    byte |= 1 << i;
                }
            }
            w.write_u8(byte)?;
        }
        Ok(())
    })()
    .map_err(|e| load_err(&path, e))
}

/// Load the KLCP built for k-mer length `expected_k`, failing cleanly on
/// a mismatch (spec.md §4.6/§7).
pub fn load_klcp(prefix: &Path, expected_k: u32) -> Result<Klcp> {
    let path = klcp_path(prefix, expected_k);
    let file = File::open(&path).map_err(|e| load_err(&path, e))?;
    let mut r = BufReader::new(file);
    let _seq_len = r.read_u64::<LittleEndian>().map_err(|e| load_err(&path, e))?;
    let found_k = r.read_u32::<LittleEndian>().map_err(|e| load_err(&path, e))?;
    if found_k != expected_k {
        return Err(Error::IndexMismatch {
            expected_k,
            found_k,
        });
    }
    let rows = r.read_u64::<LittleEndian>().map_err(|e| load_err(&path, e))? as usize;
    let n_bytes = (rows + 7) / 8;
    let mut bytes = vec![0u8; n_bytes];
    r.read_exact(&mut bytes).map_err(|e| load_err(&path, e))?;
    let bits: Vec<bool> = (0..rows)
        .map(|i| bytes[i / 8] & (1 << (i % 8)) != 0)
        .collect();
    Ok(Klcp::from_bits(expected_k, bits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabets::dna;
    use crate::construct::{build_reference, internal_text};
    use crate::data_structures::fmindex::Interval;
    use tempfile::tempdir;

    #[test]
    fn test_index_round_trip() {
        let records = vec![
            ("chr1".to_string(), b"ACGTACGTA".to_vec()),
            ("chr2".to_string(), b"TTTTGGGG".to_vec()),
        ];
        let (bns, fm) = build_reference(&records);
        let text = internal_text(&records);

        let dir = tempdir().unwrap();
        let prefix = dir.path().join("ref");
        save_index(&prefix, &bns, &fm, &text).unwrap();
        let (loaded_bns, loaded_text, loaded_fm) = load_index(&prefix).unwrap();

        assert_eq!(loaded_bns, bns);
        assert_eq!(loaded_text, text);

        let pattern = dna::encode_seq(b"ACGT");
        let (expected, _) = fm.backward_search(&pattern, Interval::full(fm.seq_len()));
        let (got, _) = loaded_fm.backward_search(&pattern, Interval::full(loaded_fm.seq_len()));
        assert_eq!(expected, got);
    }

    #[test]
    fn test_index_round_trip_preserves_ambiguous_regions() {
        let records = vec![("chr1".to_string(), b"ACGTNNNACGT".to_vec())];
        let (bns, fm) = build_reference(&records);
        let text = internal_text(&records);

        let dir = tempdir().unwrap();
        let prefix = dir.path().join("ref");
        save_index(&prefix, &bns, &fm, &text).unwrap();
        let (loaded_bns, _loaded_text, _loaded_fm) = load_index(&prefix).unwrap();

        assert_eq!(loaded_bns, bns);
        assert_eq!(loaded_bns.amb_starts(), &[4]);
        assert_eq!(loaded_bns.amb_lens(), &[3]);
    }

    #[test]
    fn test_klcp_round_trip() {
        let records = vec![("chr1".to_string(), b"ACGTACGTA".to_vec())];
        let (_bns, fm) = build_reference(&records);
        let text = internal_text(&records);
        let klcp = Klcp::build(&fm, &text, 3);

        let dir = tempdir().unwrap();
        let prefix = dir.path().join("ref");
        save_klcp(&prefix, fm.seq_len(), &klcp).unwrap();
        let loaded = load_klcp(&prefix, 3).unwrap();

        assert_eq!(loaded.bits(), klcp.bits());
        assert_eq!(loaded.k(), klcp.k());
    }

    #[test]
    fn test_klcp_mismatched_k_fails() {
        let records = vec![("chr1".to_string(), b"ACGTACGTA".to_vec())];
        let (_bns, fm) = build_reference(&records);
        let text = internal_text(&records);
        let klcp = Klcp::build(&fm, &text, 3);

        let dir = tempdir().unwrap();
        let prefix = dir.path().join("ref");
        save_klcp(&prefix, fm.seq_len(), &klcp).unwrap();

        match load_klcp(&prefix, 4) {
            Err(Error::IndexLoad { .. }) => {} // file <prefix>.4.bit.klcp does not exist
            other => panic!("expected a load error, got {other:?}"),
        }
    }
}
