// Copyright 2014-2016 Johannes Köster, Taylor Cramer.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use fmlocate::cli::{Cli, Commands};
use fmlocate::data_structures::klcp::Klcp;
use fmlocate::driver::{match_read, MatchOptions};
use fmlocate::io::fasta::{FastaReads, Reader as FastaReader};
use fmlocate::resolver::Resolver;
use fmlocate::{construct, persistence};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::BuildIndex { fasta, prefix } => build_index(&fasta, &prefix),
        Commands::Index { prefix, kmer_length } => build_klcp(&prefix, kmer_length),
        Commands::Match {
            prefix,
            reads,
            kmer_length,
            use_klcp,
            print_headers,
            skip_after_failure,
            output,
        } => run_match(
            &prefix,
            &reads,
            kmer_length,
            use_klcp,
            print_headers,
            skip_after_failure,
            output.as_deref(),
        ),
    }
}

fn build_index(fasta: &std::path::Path, prefix: &std::path::Path) -> Result<()> {
    let file = File::open(fasta).with_context(|| format!("opening {}", fasta.display()))?;
    let records: Vec<(String, Vec<u8>)> = FastaReader::new(BufReader::new(file))
        .records()
        .map(|r| r.map(|rec| (rec.name, rec.seq)))
        .collect::<io::Result<Vec<_>>>()
        .with_context(|| format!("parsing {}", fasta.display()))?;
    log::info!("building index from {} sequences", records.len());

    let (bns, fm) = construct::build_reference(&records);
    let text = construct::internal_text(&records);
    persistence::save_index(prefix, &bns, &fm, &text)?;
    log::info!("wrote index to {}.{{bns,pac,bwt}}", prefix.display());
    Ok(())
}

fn build_klcp(prefix: &std::path::Path, k: u32) -> Result<()> {
    let start = Instant::now();
    let (_bns, text, fm) = persistence::load_index(prefix)?;
    log::info!("loaded index ({} BWT rows)", fm.bwt().len());

    let klcp = Klcp::build(&fm, &text, k);
    persistence::save_klcp(prefix, fm.seq_len(), &klcp)?;
    log::info!(
        "built klcp for k={k} in {:.2}s",
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_match(
    prefix: &std::path::Path,
    reads_path: &std::path::Path,
    k: u32,
    use_klcp: bool,
    print_headers: bool,
    skip_after_failure: bool,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let (bns, _text, fm) = persistence::load_index(prefix)?;
    log::info!("loaded index ({} reference sequences)", bns.n_seqs());

    let klcp = if use_klcp {
        Some(persistence::load_klcp(prefix, k)?)
    } else {
        None
    };

    let opts = MatchOptions {
        k,
        use_klcp,
        skip_after_failure,
        print_headers,
    };

    let reads_file = File::open(reads_path)
        .with_context(|| format!("opening {}", reads_path.display()))?;
    let reads = FastaReads::new(BufReader::new(reads_file));

    let mut resolver = Resolver::new(bns.n_seqs());
    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let start = Instant::now();
    let mut n_reads = 0u64;
    for read in reads {
        let read = read.with_context(|| format!("reading {}", reads_path.display()))?;
        match_read(&read, &fm, klcp.as_ref(), &bns, &mut resolver, &opts, &mut out)?;
        n_reads += 1;
        if n_reads % 1000 == 0 {
            log::debug!("matched {n_reads} reads");
        }
    }
    out.flush()?;
    log::info!(
        "matched {n_reads} reads in {:.2}s",
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
