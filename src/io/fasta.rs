// Copyright 2014-2016 Johannes Köster, Taylor Cramer.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! A minimal FASTA reader. FASTQ/BAM input is out of scope (spec.md §1);
//! this module exists only to turn `>name` / sequence-line records into
//! the `{0,1,2,3,4}`-coded [`crate::io::Read`] the matching core
//! consumes. Sequence lines are validated against the DNA alphabet
//! (`ACGTN`, either case) before parsing succeeds, rather than silently
//! mapping any stray byte to `N`.

use std::io::{self, BufRead};

use crate::alphabets::dna;
use crate::io::Read as DecodedRead;

/// One `>name` record with its (possibly multi-line) raw sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub seq: Vec<u8>,
}

/// Wraps a buffered reader over FASTA text.
pub struct Reader<R: BufRead> {
    inner: R,
    line: String,
}

impl<R: BufRead> Reader<R> {
    pub fn new(inner: R) -> Self {
        Reader {
            inner,
            line: String::new(),
        }
    }

    /// Iterate over the records in this file.
    pub fn records(self) -> Records<R> {
        Records { reader: self }
    }

    fn read_record(&mut self) -> io::Result<Option<Record>> {
        if self.line.is_empty() && self.inner.read_line(&mut self.line)? == 0 {
            return Ok(None);
        }
        if !self.line.starts_with('>') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "expected '>' at start of FASTA record",
            ));
        }
        let name = self.line[1..].trim_end().to_string();
        self.line.clear();

        let mut seq = Vec::new();
        loop {
            let mut next = String::new();
            if self.inner.read_line(&mut next)? == 0 {
                break;
            }
            if next.starts_with('>') {
                self.line = next;
                break;
            }
            seq.extend(next.trim_end().bytes());
        }
        if !dna::alphabet().is_word(&seq) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("record {name:?} contains a non-DNA byte"),
            ));
        }
        Ok(Some(Record { name, seq }))
    }
}

/// Iterator over the records of a [`Reader`].
pub struct Records<R: BufRead> {
    reader: Reader<R>,
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_record().transpose()
    }
}

/// Adapts [`Records`] into the decoded [`crate::io::Read`] the matching
/// core consumes.
pub struct FastaReads<R: BufRead> {
    records: Records<R>,
}

impl<R: BufRead> FastaReads<R> {
    pub fn new(inner: R) -> Self {
        FastaReads {
            records: Reader::new(inner).records(),
        }
    }
}

impl<R: BufRead> Iterator for FastaReads<R> {
    type Item = io::Result<DecodedRead>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next().map(|r| {
            r.map(|record| DecodedRead {
                name: record.name,
                seq: dna::encode_seq(&record.seq),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parses_multiple_records() {
        let data = b">chr1\nACGT\nACGT\n>chr2\nTTTT\n";
        let reader = Reader::new(Cursor::new(&data[..]));
        let records: Vec<Record> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "chr1");
        assert_eq!(records[0].seq, b"ACGTACGT");
        assert_eq!(records[1].name, "chr2");
        assert_eq!(records[1].seq, b"TTTT");
    }

    #[test]
    fn test_fasta_reads_encodes_bases() {
        let data = b">read1\nACGTN\n";
        let reads: Vec<DecodedRead> = FastaReads::new(Cursor::new(&data[..]))
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(reads.len(), 1);
        assert_eq!(reads[0].name, "read1");
        assert_eq!(reads[0].seq, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_rejects_missing_header() {
        let data = b"ACGT\n";
        let reader = Reader::new(Cursor::new(&data[..]));
        assert!(reader.records().next().unwrap().is_err());
    }

    #[test]
    fn test_rejects_non_dna_bytes() {
        let data = b">chr1\nACGU\n";
        let reader = Reader::new(Cursor::new(&data[..]));
        assert!(reader.records().next().unwrap().is_err());
    }

    #[test]
    fn test_accepts_ambiguous_bases() {
        let data = b">chr1\nACGTN\n";
        let reader = Reader::new(Cursor::new(&data[..]));
        let records: Vec<Record> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records[0].seq, b"ACGTN");
    }
}
