mod common;

use std::fs;

use common::{SOURCE_FIXTURES, TestWorkspace, fixture_path, fixture_sources};
use workpulse::{
    error::LoadError,
    loader::{DatasetLoader, LoadOptions, default_sources, load_sources},
    profile::ProfileSet,
};

#[test]
fn default_sources_live_under_the_data_directory() {
    let workspace = TestWorkspace::with_fixtures(&SOURCE_FIXTURES);
    let paths = default_sources(workspace.path());
    assert_eq!(paths.len(), 3);
    assert!(paths.iter().all(|p| p.exists()));
    assert!(paths[1].ends_with("dataset_burnout.csv"));
}

#[test]
fn missing_source_is_skipped_with_a_warning() {
    let workspace = TestWorkspace::with_fixtures(&["dataset_burnout.csv"]);
    let outcome = load_sources(
        &default_sources(workspace.path()),
        &ProfileSet::builtin(),
        LoadOptions::default(),
    );
    assert_eq!(outcome.dataset.len(), 8);
    assert_eq!(outcome.warnings.len(), 2);
    assert_eq!(outcome.warnings[0].source, "dataset_principal");
    assert!(matches!(outcome.warnings[0].error, LoadError::Io { .. }));
    assert!(
        outcome.warnings[1]
            .to_string()
            .starts_with("skipped source 'dataset_workplace'")
    );
}

#[test]
fn no_readable_sources_yield_an_empty_dataset() {
    let workspace = TestWorkspace::new();
    let empty = workspace.write("dataset_workplace.csv", "");
    let outcome = load_sources(
        &[workspace.path().join("nope.csv"), empty],
        &ProfileSet::builtin(),
        LoadOptions::default(),
    );
    assert!(outcome.dataset.is_empty());
    assert_eq!(outcome.warnings.len(), 2);
    assert!(matches!(
        outcome.warnings[1].error,
        LoadError::EmptySource { .. }
    ));
}

#[test]
fn undecodable_source_is_skipped() {
    let workspace = TestWorkspace::new();
    let mut bytes = b"JobRole,RemoteWork\nNurse,".to_vec();
    bytes.extend([0xff, 0xfe, b'\n']);
    let broken = workspace.write_bytes("dataset_workplace.csv", &bytes);
    let mut paths = vec![broken];
    paths.push(fixture_path("dataset_burnout.csv"));
    let outcome = load_sources(&paths, &ProfileSet::builtin(), LoadOptions::default());
    assert_eq!(outcome.dataset.len(), 8);
    assert!(matches!(
        outcome.warnings[0].error,
        LoadError::Decode { row: 2, .. }
    ));
}

#[test]
fn latin1_sources_decode_with_an_explicit_encoding() {
    let workspace = TestWorkspace::new();
    let (encoded, _, _) = encoding_rs::WINDOWS_1252
        .encode("role,work_mode,stress_score,burnout_level,hours_per_week,policy\nEnfermeira,Híbrido,7,high,44,Sim\n");
    let path = workspace.write_bytes("pesquisa.csv", &encoded);
    let options = LoadOptions {
        delimiter: None,
        encoding: encoding_rs::WINDOWS_1252,
    };
    let outcome = load_sources(&[path], &ProfileSet::builtin(), options);
    assert!(outcome.warnings.is_empty());
    let record = &outcome.dataset.records()[0];
    assert_eq!(record.base.role, "Enfermeira");
    assert_eq!(record.base.work_mode, workpulse::record::WorkMode::Hybrid);
    assert_eq!(record.base.source, "pesquisa");
}

#[test]
fn legacy_cells_that_resemble_a_byte_order_mark_stay_intact() {
    let workspace = TestWorkspace::new();
    let (encoded, _, _) = encoding_rs::WINDOWS_1252
        .encode("role,work_mode,stress_score,burnout_level,hours_per_week,policy\nÿþab,remote,4,low,38,Sim\n");
    let path = workspace.write_bytes("pesquisa.csv", &encoded);
    let options = LoadOptions {
        delimiter: None,
        encoding: encoding_rs::WINDOWS_1252,
    };
    let outcome = load_sources(&[path], &ProfileSet::builtin(), options);
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.dataset.records()[0].base.role, "ÿþab");
}

#[test]
fn loader_caches_until_invalidated() {
    let workspace = TestWorkspace::with_fixtures(&SOURCE_FIXTURES);
    let loader = DatasetLoader::new(
        default_sources(workspace.path()),
        ProfileSet::builtin(),
        LoadOptions::default(),
    );
    assert!(!loader.is_loaded());

    let first = loader.get();
    let second = loader.get();
    assert_eq!(loader.load_count(), 1);
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(first.dataset.len(), 20);

    // Changes on disk stay invisible until the cache is cleared.
    fs::remove_file(workspace.path().join("dataset_principal.csv")).unwrap();
    assert_eq!(loader.get().dataset.len(), 20);

    loader.invalidate();
    assert!(!loader.is_loaded());
    let refreshed = loader.get();
    assert_eq!(loader.load_count(), 2);
    assert_eq!(refreshed.dataset.len(), 14);
    assert_eq!(refreshed.warnings.len(), 1);

    let reloaded = loader.reload();
    assert_eq!(loader.load_count(), 3);
    assert!(!std::sync::Arc::ptr_eq(&refreshed, &reloaded));
}

#[test]
fn loader_is_shareable_across_threads() {
    let loader = std::sync::Arc::new(DatasetLoader::new(
        fixture_sources(),
        ProfileSet::builtin(),
        LoadOptions::default(),
    ));
    let handles = (0..4)
        .map(|_| {
            let loader = std::sync::Arc::clone(&loader);
            std::thread::spawn(move || loader.get().dataset.len())
        })
        .collect::<Vec<_>>();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 20);
    }
    assert_eq!(loader.load_count(), 1);
}
