//! Reads, normalizes, and merges the configured sources, once.
//!
//! [`DatasetLoader`] holds at most one loaded [`LoadOutcome`]. Callers share
//! it through an `Arc`; [`DatasetLoader::invalidate`] and
//! [`DatasetLoader::reload`] are the only ways to replace it.

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8};
use itertools::Itertools;
use log::{debug, info, warn};

use crate::{
    canonical::CanonicalizationReport,
    cli::DatasetArgs,
    dataset::{Dataset, merge},
    error::SourceWarning,
    io_utils,
    normalize::normalize_with_profile,
    profile::ProfileSet,
    raw::{self, read_raw_table},
};

pub const DEFAULT_SOURCE_FILES: [&str; 3] = [
    "dataset_principal.csv",
    "dataset_burnout.csv",
    "dataset_workplace.csv",
];

pub fn default_sources(data_dir: &Path) -> Vec<PathBuf> {
    DEFAULT_SOURCE_FILES
        .iter()
        .map(|name| data_dir.join(name))
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub dataset: Dataset,
    pub warnings: Vec<SourceWarning>,
    pub reports: Vec<CanonicalizationReport>,
}

impl LoadOutcome {
    pub fn unmapped_total(&self) -> usize {
        self.reports.iter().map(CanonicalizationReport::total).sum()
    }
}

/// Loads every source that can be read and merges the survivors.
///
/// A source that cannot be opened, decoded, or parsed is skipped and
/// reported in [`LoadOutcome::warnings`]; if none survive, the dataset is
/// empty.
pub fn load_sources(paths: &[PathBuf], profiles: &ProfileSet, options: LoadOptions) -> LoadOutcome {
    let mut tables = Vec::new();
    let mut warnings = Vec::new();
    let mut reports = Vec::new();

    for path in paths {
        let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
        match read_raw_table(path, delimiter, options.encoding) {
            Ok(table) => {
                let profile = profiles.resolve_path(path);
                let normalized = normalize_with_profile(&table, profile);
                log_report(&normalized.report);
                info!(
                    "Loaded {} row(s) from {:?} (profile '{}')",
                    normalized.len(),
                    path,
                    profile.name
                );
                reports.push(normalized.report.clone());
                tables.push(normalized);
            }
            Err(error) => {
                let warning = SourceWarning {
                    source: raw::source_tag(path),
                    path: path.clone(),
                    error,
                };
                warn!("{warning}");
                warnings.push(warning);
            }
        }
    }

    if tables.is_empty() {
        warn!("No source could be loaded; continuing with an empty dataset");
    }
    LoadOutcome {
        dataset: merge(tables),
        warnings,
        reports,
    }
}

fn log_report(report: &CanonicalizationReport) {
    let entries = report.entries();
    for (field, group) in &entries.iter().chunk_by(|(field, _, _)| *field) {
        let group = group.collect::<Vec<_>>();
        let count: usize = group.iter().map(|(_, _, count)| count).sum();
        let examples = group
            .iter()
            .take(3)
            .map(|(_, value, _)| format!("'{value}'"))
            .join(", ");
        warn!(
            "{}: {count} {field} value(s) fell back to the default (e.g. {examples})",
            report.source
        );
    }
}

pub struct DatasetLoader {
    paths: Vec<PathBuf>,
    profiles: ProfileSet,
    options: LoadOptions,
    cache: Mutex<Option<Arc<LoadOutcome>>>,
    loads: AtomicUsize,
}

impl DatasetLoader {
    pub fn new(paths: Vec<PathBuf>, profiles: ProfileSet, options: LoadOptions) -> Self {
        Self {
            paths,
            profiles,
            options,
            cache: Mutex::new(None),
            loads: AtomicUsize::new(0),
        }
    }

    /// Builds a loader from command-line options.
    pub fn from_args(args: &DatasetArgs) -> Result<Self> {
        let profiles = match &args.profiles {
            Some(path) => ProfileSet::load(path)
                .with_context(|| format!("Loading source profiles from {path:?}"))?,
            None => ProfileSet::builtin(),
        };
        let paths = if args.sources.is_empty() {
            default_sources(&args.data_dir)
        } else {
            args.sources.clone()
        };
        let options = LoadOptions {
            delimiter: args.delimiter,
            encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
        };
        debug!(
            "Sources: {:?} (delimiter {:?}, encoding {})",
            paths,
            options.delimiter.map(io_utils::printable_delimiter),
            options.encoding.name()
        );
        Ok(Self::new(paths, profiles, options))
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// The cached outcome, loading it on first access.
    pub fn get(&self) -> Arc<LoadOutcome> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(outcome) = cache.as_ref() {
            return Arc::clone(outcome);
        }
        let outcome = Arc::new(self.load());
        *cache = Some(Arc::clone(&outcome));
        outcome
    }

    pub fn invalidate(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        *cache = None;
    }

    pub fn reload(&self) -> Arc<LoadOutcome> {
        self.invalidate();
        self.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of times sources were actually read from disk.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    fn load(&self) -> LoadOutcome {
        self.loads.fetch_add(1, Ordering::Relaxed);
        load_sources(&self.paths, &self.profiles, self.options)
    }
}
