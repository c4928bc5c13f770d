// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 read2vec contributors

//! End-to-end tests for the read2vec binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const GMSV: &str = "\
#chrom\tstart\tend\tcalls
chr1\t100\t200\tCG;CA;CG
chr1\t300\t400\tNA
chr2\t150\t250\tCG
chr2\t900\t1000\tCG;CG
chrX\t500\t600\tCA;CG;CG;CT
chr3\t10\t20\tNA
";

const PANEL: &str = "\
chr1\t0\t1000
chr2\t100\t300
chr2\t950\t960
chrX\t550\t551
chr3\t0\t50
";

fn setup() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    let gmsv_dir = root.join("S1").join("07.gMSV");
    std::fs::create_dir_all(&gmsv_dir).unwrap();
    std::fs::write(gmsv_dir.join("S1.gMSV"), GMSV).unwrap();

    let panels = root.join("reference_panels");
    std::fs::create_dir_all(&panels).unwrap();
    std::fs::write(panels.join("1kg.bed"), PANEL).unwrap();

    temp_dir
}

fn read2vec(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("read2vec").unwrap();
    cmd.env("NO_COLOR", "1")
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("READ2VEC_CONFIG")
        .env_remove("READ2VEC_BEDTOOLS")
        .env_remove("RUST_LOG");
    cmd
}

fn output(root: &Path, name: &str) -> PathBuf {
    root.join("08.read2vec").join(name)
}

fn line_count(path: &Path) -> usize {
    std::fs::read_to_string(path).unwrap().lines().count()
}

/// Executable that answers `bedtools intersect -u -a <bed> -b <panel>` by
/// printing the sample BED without its chr3 lines
#[cfg(unix)]
fn fake_bedtools(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-bedtools");
    std::fs::write(&path, "#!/bin/sh\ngrep -v '^chr3' \"$4\"\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn test_fresh_run_produces_every_artifact() {
    let temp_dir = setup();
    let root = temp_dir.path();

    read2vec(root)
        .args(["--intersect-tool", "builtin"])
        .arg(root)
        .args(["S1", "1kg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All processes completed successfully!"));

    for name in ["S1.gMSV2bed.bed", "S1.intersected.bed", "S1.Encoding.txt"] {
        assert!(line_count(&output(root, name)) >= 5, "{} is too short", name);
    }

    let encoding = std::fs::read_to_string(output(root, "S1.Encoding.txt")).unwrap();
    assert!(encoding.starts_with("01 0000000100 0000000200 0003\n"));
}

#[cfg(unix)]
#[test]
fn test_default_bedtools_run_completes() {
    let temp_dir = setup();
    let root = temp_dir.path();
    let bedtools = fake_bedtools(root);

    read2vec(root)
        .arg("--bedtools")
        .arg(&bedtools)
        .arg(root)
        .args(["S1", "1kg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All processes completed successfully!"));

    let intersected = std::fs::read_to_string(output(root, "S1.intersected.bed")).unwrap();
    assert_eq!(intersected.lines().count(), 5);
    assert!(!intersected.contains("chr3\t"));
    assert_eq!(line_count(&output(root, "S1.Encoding.txt")), 5);
}

#[test]
fn test_second_run_reports_already_done() {
    let temp_dir = setup();
    let root = temp_dir.path();

    read2vec(root)
        .args(["--intersect-tool", "builtin"])
        .arg(root)
        .args(["S1", "1kg"])
        .assert()
        .success();

    let before = std::fs::read_to_string(output(root, "S1.Encoding.txt")).unwrap();

    read2vec(root)
        .args(["--intersect-tool", "builtin"])
        .arg(root)
        .args(["S1", "1kg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("S1.gMSV2bed.bed is already done"))
        .stdout(predicate::str::contains("S1.intersected.bed is already done"))
        .stdout(predicate::str::contains("S1.Encoding.txt is already done"))
        .stdout(predicate::str::contains("starting fresh").not());

    let after = std::fs::read_to_string(output(root, "S1.Encoding.txt")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_resumes_truncated_stage() {
    let temp_dir = setup();
    let root = temp_dir.path();

    read2vec(root)
        .args(["--intersect-tool", "builtin"])
        .arg(root)
        .args(["S1", "1kg"])
        .assert()
        .success();

    std::fs::write(output(root, "S1.intersected.bed"), "chr1\t100\t200\t3\n").unwrap();

    read2vec(root)
        .args(["--intersect-tool", "builtin"])
        .arg(root)
        .args(["S1", "1kg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("S1.intersected.bed is incomplete"));

    assert!(line_count(&output(root, "S1.intersected.bed")) >= 5);
}

#[test]
fn test_missing_arguments_exit_with_one() {
    let temp_dir = TempDir::new().unwrap();

    read2vec(temp_dir.path())
        .arg(temp_dir.path())
        .arg("S1")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_missing_source_fails_with_diagnostic() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    let assert = read2vec(root)
        .args(["--intersect-tool", "builtin"])
        .arg(root)
        .args(["S1", "1kg"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("S1.gMSV"))
        .stderr(predicate::str::contains("missing"));

    // Reported once, as the exit diagnostic
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert_eq!(stderr.matches("cannot run").count(), 1, "{}", stderr);

    // The output directory is still prepared; nothing else is written
    assert!(root.join("08.read2vec").is_dir());
    assert!(!output(root, "S1.gMSV2bed.bed").exists());
}

#[test]
fn test_missing_panel_fails() {
    let temp_dir = setup();
    let root = temp_dir.path();

    read2vec(root)
        .args(["--intersect-tool", "builtin"])
        .arg(root)
        .args(["S1", "no_such_panel"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no_such_panel"));

    // Stage 1 completed and is kept for the next run
    assert!(line_count(&output(root, "S1.gMSV2bed.bed")) >= 5);
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp_dir = setup();
    let root = temp_dir.path();

    read2vec(root)
        .args(["--dry-run", "--intersect-tool", "builtin"])
        .arg(root)
        .args(["S1", "1kg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run finished"));

    assert!(!root.join("08.read2vec").exists());
}

#[test]
fn test_json_report() {
    let temp_dir = setup();
    let root = temp_dir.path();

    let assert = read2vec(root)
        .args(["--json", "--intersect-tool", "builtin"])
        .arg(root)
        .args(["S1", "1kg"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(report["state"], "done");
    assert_eq!(report["sample"], "S1");
    assert_eq!(report["stages"].as_array().unwrap().len(), 4);
    assert_eq!(report["stages"][1]["status"], "created");
    assert_eq!(report["stages"][1]["records"], 6);
    assert!(report["duration_ms"].is_u64());
    assert!(report["stages"][1]["duration_ms"].is_u64());
}

#[test]
fn test_project_settings_file_is_used() {
    let temp_dir = setup();
    let root = temp_dir.path();
    std::fs::write(
        root.join("read2vec.yaml"),
        "min_lines: 7\nintersect:\n  tool: builtin\n",
    )
    .unwrap();

    // Six records never reach a threshold of seven lines, so stage 2 refuses
    // to consume the BED it just wrote.
    read2vec(root)
        .arg(root)
        .args(["S1", "1kg"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("S1.gMSV2bed.bed"))
        .stderr(predicate::str::contains("insufficient"));
}
