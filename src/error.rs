// Copyright 2014-2016 Johannes Köster, Taylor Cramer.
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Error kinds surfaced by the index loader, the read source and the CLI.
//!
//! An empty suffix-array interval is deliberately not a variant here: per
//! the matching contract, a k-mer with no occurrences is a normal `Ok`
//! result that simply carries `k > l`.

use std::io;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to load index file {path:?}: {source}")]
    IndexLoad {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("index file {path:?} is truncated or corrupt: {reason}")]
    IndexCorrupt { path: PathBuf, reason: String },

    #[error("klcp was built for k={found_k} but k={expected_k} was requested")]
    IndexMismatch { expected_k: u32, found_k: u32 },

    #[error("failed to read input: {0}")]
    InputParse(#[source] io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;
