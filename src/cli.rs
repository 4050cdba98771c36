// Copyright 2014-2016 Johannes Köster, Taylor Cramer.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Command-line surface: `build-index`, `index`, `match`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fmlocate")]
#[command(author = "Johannes Köster <johannes.koester@tu-dortmund.de>")]
#[command(version)]
#[command(about = "Streaming exact k-mer chromosome membership over an FM-index", long_about = None)]
pub struct Cli {
    /// Suppress progress logging (equivalent to RUST_LOG=warn).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a fresh FM-index and BNS layout from a FASTA reference.
    BuildIndex {
        /// Reference FASTA file.
        fasta: PathBuf,

        /// Path prefix to write `<prefix>.bns`/`.pac`/`.bwt` to.
        prefix: PathBuf,
    },

    /// Build the KLCP sibling structure for an existing index.
    Index {
        /// Index path prefix (as produced by `build-index`).
        prefix: PathBuf,

        /// k-mer length to build the KLCP for.
        #[arg(short = 'k', long = "kmer-length", default_value_t = 14)]
        kmer_length: u32,
    },

    /// Stream reads against an index, emitting per-k-mer hit sets.
    Match {
        /// Index path prefix.
        prefix: PathBuf,

        /// FASTA file of query reads.
        reads: PathBuf,

        /// k-mer length.
        #[arg(short = 'k', long = "kmer-length", default_value_t = 14)]
        kmer_length: u32,

        /// Use the KLCP warm-continue acceleration (requires a matching
        /// `index` run beforehand).
        #[arg(short = 'u')]
        use_klcp: bool,

        /// Print a `#<read>` header line before each read's hits.
        #[arg(short = 'v')]
        print_headers: bool,

        /// Apply the skip-after-failure heuristic.
        #[arg(short = 's')]
        skip_after_failure: bool,

        /// Write hits to this file instead of stdout.
        #[arg(short = 'f', long = "output")]
        output: Option<PathBuf>,
    },
}
