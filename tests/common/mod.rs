#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};
use workpulse::{
    dataset::Dataset,
    loader::{self, LoadOptions, LoadOutcome},
    profile::ProfileSet,
};

pub const SOURCE_FIXTURES: [&str; 3] = [
    "dataset_principal.csv",
    "dataset_burnout.csv",
    "dataset_workplace.csv",
];

/// Rows across the three fixtures: 6 + 8 + 6.
pub const FIXTURE_ROWS: usize = 20;

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn fixture_sources() -> Vec<PathBuf> {
    SOURCE_FIXTURES.iter().map(|name| fixture_path(name)).collect()
}

/// Loads the three fixtures with the built-in profiles.
pub fn load_fixtures() -> LoadOutcome {
    loader::load_sources(
        &fixture_sources(),
        &ProfileSet::builtin(),
        LoadOptions::default(),
    )
}

pub fn fixture_dataset() -> Dataset {
    load_fixtures().dataset
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }

    /// Copies the named fixtures into the workspace root, as a data directory.
    pub fn with_fixtures(names: &[&str]) -> Self {
        let workspace = Self::new();
        for name in names {
            fs::copy(fixture_path(name), workspace.path().join(name)).expect("copy fixture");
        }
        workspace
    }
}
