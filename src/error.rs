use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Failure reading one source file. Never fatal to a load; the loader turns it
/// into a [`SourceWarning`] and moves on to the next source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed CSV in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("cannot decode row {row} of {path:?} as {encoding}")]
    Decode {
        path: PathBuf,
        row: usize,
        encoding: &'static str,
    },
    #[error("{path:?} has no header row")]
    EmptySource { path: PathBuf },
}

#[derive(Debug)]
pub struct SourceWarning {
    pub source: String,
    pub path: PathBuf,
    pub error: LoadError,
}

impl fmt::Display for SourceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped source '{}': {}", self.source, self.error)
    }
}
