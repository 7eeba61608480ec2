mod common;

use std::fs;

use assert_cmd::Command;
use common::{SOURCE_FIXTURES, TestWorkspace};
use predicates::prelude::*;
use predicates::str::contains;
use workpulse::profile::ProfileSet;

fn workpulse(workspace: &TestWorkspace) -> Command {
    let mut cmd = Command::cargo_bin("workpulse").expect("binary exists");
    cmd.current_dir(workspace.path()).env("RUST_LOG", "warn");
    cmd
}

fn fixtures() -> TestWorkspace {
    let workspace = TestWorkspace::with_fixtures(&SOURCE_FIXTURES);
    fs::create_dir(workspace.path().join("data")).expect("data dir");
    for name in SOURCE_FIXTURES {
        fs::rename(workspace.path().join(name), workspace.path().join("data").join(name))
            .expect("move fixture");
    }
    workspace
}

#[test]
fn export_writes_the_unified_table() {
    let workspace = fixtures();
    let output = workspace.path().join("unified.csv");
    workpulse(&workspace)
        .args(["export", "-o", output.to_str().unwrap()])
        .assert()
        .success();

    let contents = fs::read_to_string(&output).expect("read export");
    let mut lines = contents.lines();
    assert_eq!(
        lines.next().unwrap(),
        "role,work_mode,stress_score,burnout_level,hours_per_week,policy,segment,source,age,gender,hours_band,burnout_numeric,age_group"
    );
    assert_eq!(lines.count(), 20);
    assert!(contents.contains("Sales Representative,onsite,10,high,55,Without Support,Sales,dataset_workplace,52,male,>45h,3,50+"));
}

#[test]
fn export_applies_filters_and_output_delimiter() {
    let workspace = fixtures();
    workpulse(&workspace)
        .args([
            "export",
            "--work-mode",
            "remote",
            "--segment",
            "Asia,Europe",
            "--output-delimiter",
            ";",
        ])
        .assert()
        .success()
        .stdout(contains("Software Engineer;remote;8;high;52"))
        .stdout(contains("Data Scientist;remote;5;medium;41"))
        .stdout(contains("Sales;remote;2;low;30"))
        .stdout(contains("dataset_principal").not());
}

#[test]
fn preview_renders_a_table() {
    let workspace = fixtures();
    workpulse(&workspace)
        .args(["preview", "--rows", "3", "--role", "Nurse"])
        .assert()
        .success()
        .stdout(contains("role"))
        .stdout(contains("hours_band"))
        .stdout(contains("Nurse"))
        .stdout(contains("North America"));
}

#[test]
fn summary_json_reports_deltas_against_all_rows() {
    let workspace = fixtures();
    let assert = workpulse(&workspace)
        .args(["summary", "--json", "--work-mode", "onsite"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let cards: serde_json::Value = serde_json::from_str(&stdout).expect("json output");
    assert_eq!(cards[0]["name"], "respondents");
    assert_eq!(cards[0]["value"], 12.0);
    assert_eq!(cards[0]["global"], 20.0);
    assert_eq!(cards[2]["name"], "high_burnout_pct");
    assert_eq!(cards[2]["global"], 35.0);
}

#[test]
fn group_by_policy_hides_small_groups() {
    let workspace = fixtures();
    workpulse(&workspace)
        .args(["group", "--by", "policy", "--min-count", "3"])
        .assert()
        .success()
        .stdout(contains("policy"))
        .stdout(contains("Yes"))
        .stdout(contains("With Support"))
        .stdout(contains("Not sure").not());
}

#[test]
fn composition_splits_policies_by_burnout_level() {
    let workspace = fixtures();
    let assert = workpulse(&workspace)
        .args(["composition", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let groups: serde_json::Value = serde_json::from_str(&stdout).expect("json output");
    let groups = groups.as_array().expect("array");
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["group"], "No");
    assert_eq!(groups[0]["respondents"], 5);
    assert!((groups[0]["high_pct"].as_f64().unwrap() - 40.0).abs() < 1e-9);
    assert_eq!(groups[1]["group"], "Yes");
    assert!((groups[1]["low_pct"].as_f64().unwrap() - 37.5).abs() < 1e-9);

    workpulse(&workspace)
        .args(["composition", "--min-count", "1"])
        .assert()
        .success()
        .stdout(contains("Not sure"))
        .stdout(contains("100.0%"));
}

#[test]
fn frequency_counts_work_modes() {
    let workspace = fixtures();
    workpulse(&workspace)
        .args(["frequency", "--column", "work_mode"])
        .assert()
        .success()
        .stdout(contains("onsite"))
        .stdout(contains("60.00%"))
        .stdout(contains("25.00%"))
        .stdout(contains("15.00%"));
}

#[test]
fn correlate_prints_the_three_numeric_columns() {
    let workspace = fixtures();
    workpulse(&workspace)
        .arg("correlate")
        .assert()
        .success()
        .stdout(contains("stress_score"))
        .stdout(contains("hours_per_week"))
        .stdout(contains("burnout_numeric"))
        .stdout(contains("1.000"));
}

#[test]
fn delta_rejects_a_single_mode() {
    let workspace = fixtures();
    workpulse(&workspace)
        .args(["delta", "--modes", "remote"])
        .assert()
        .failure()
        .stderr(contains("exactly two work modes"));
}

#[test]
fn empty_selection_is_not_an_error() {
    let workspace = fixtures();
    workpulse(&workspace)
        .args(["summary", "--role", "Astronaut"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(contains("No rows match"));
}

#[test]
fn missing_sources_degrade_to_an_empty_table() {
    let workspace = TestWorkspace::new();
    workpulse(&workspace)
        .args(["export"])
        .assert()
        .success()
        .stdout(contains("role,work_mode"))
        .stderr(contains("skipped source 'dataset_principal'"));
}

#[test]
fn unknown_where_column_fails() {
    let workspace = fixtures();
    workpulse(&workspace)
        .args(["preview", "--where", "salary > 10"])
        .assert()
        .failure()
        .stderr(contains("Unknown column 'salary'"));
}

#[test]
fn profiles_round_trip_through_yaml() {
    let workspace = fixtures();
    let output = workspace.path().join("profiles.yaml");
    workpulse(&workspace)
        .args(["profiles", "-o", output.to_str().unwrap()])
        .assert()
        .success();
    let yaml = fs::read_to_string(&output).expect("read profiles");
    assert_eq!(ProfileSet::from_yaml_str(&yaml).unwrap(), ProfileSet::builtin());

    // Edited profiles drive the load: rename the principal survey's role column.
    let edited = yaml.replace("column: Occupation", "column: Country");
    let custom = workspace.write("custom.yaml", &edited);
    workpulse(&workspace)
        .args([
            "export",
            "--profiles",
            custom.to_str().unwrap(),
            "--where",
            "source = dataset_principal",
        ])
        .assert()
        .success()
        .stdout(contains("United Kingdom,onsite"));
}

#[test]
fn explicit_sources_replace_the_defaults() {
    let workspace = fixtures();
    let burnout = workspace.path().join("data").join("dataset_burnout.csv");
    workpulse(&workspace)
        .args(["frequency", "-C", "source", "--source", burnout.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("dataset_burnout"))
        .stdout(contains("100.00%"))
        .stdout(contains("dataset_workplace").not());
}
