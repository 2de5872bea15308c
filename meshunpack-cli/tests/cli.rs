use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn chunk(payload: &[u8]) -> Vec<u8> {
    let mut v = (payload.len() as u32).to_le_bytes().to_vec();
    v.extend_from_slice(payload);
    v
}

fn meshunpack() -> Command {
    let mut cmd = Command::cargo_bin("meshunpack").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn empty_tree_reports_no_files() {
    let td = assert_fs::TempDir::new().unwrap();
    td.child("in/notes.txt").write_str("hello").unwrap();

    meshunpack()
        .args(["decompress", "--no-progress"])
        .arg(td.child("in").path())
        .arg(td.child("out").path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No .mc or .chunk files found"));
    td.child("out").assert(predicate::path::missing());
}

#[test]
fn missing_input_is_a_scan_error() {
    let td = assert_fs::TempDir::new().unwrap();

    meshunpack()
        .args(["decompress", "--no-progress"])
        .arg(td.child("absent").path())
        .arg(td.child("out").path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Error scanning: "));
}

#[cfg(not(feature = "native"))]
#[test]
fn stub_backend_counts_every_file_as_failed() {
    let td = assert_fs::TempDir::new().unwrap();
    td.child("in/a/x.chunk").write_binary(&chunk(b"one")).unwrap();
    td.child("in/a/b/y.chunk").write_binary(&chunk(b"two")).unwrap();
    let report = td.child("report.json");

    meshunpack()
        .args(["decompress", "--no-progress", "--work-buffer", "64K", "--report"])
        .arg(report.path())
        .arg(td.child("in").path())
        .arg(td.child("out").path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Complete! Success: 0, Failed: 2"))
        .stderr(predicate::str::contains("failed: "));

    report.assert(predicate::str::contains("\"failure\": 2"));
    td.child("out/a/x").assert(predicate::path::missing());
    // destination directories are created before decoding
    td.child("out/a/b").assert(predicate::path::is_dir());
}

#[test]
fn scan_lists_jobs_without_decoding() {
    let td = assert_fs::TempDir::new().unwrap();
    td.child("in/a/x.mc").write_binary(&[0u8; 12]).unwrap();
    td.child("in/a/b/y.chunk").write_binary(&chunk(b"y")).unwrap();
    td.child("in/z.txt").write_str("skip").unwrap();

    meshunpack()
        .arg("scan")
        .arg(td.child("in").path())
        .arg(td.child("out").path())
        .assert()
        .success()
        .stdout(predicate::str::contains("total: 2"))
        .stdout(predicate::str::contains("chunk\t"))
        .stdout(predicate::str::contains("z.txt").not());
    td.child("out").assert(predicate::path::missing());
}

#[test]
fn scan_honours_exclude() {
    let td = assert_fs::TempDir::new().unwrap();
    td.child("in/keep/a.chunk").write_binary(&chunk(b"a")).unwrap();
    td.child("in/skip/b.chunk").write_binary(&chunk(b"b")).unwrap();

    meshunpack()
        .args(["scan", "--exclude", "skip/**"])
        .arg(td.child("in").path())
        .arg(td.child("out").path())
        .assert()
        .success()
        .stdout(predicate::str::contains("total: 1"));
}

#[test]
fn inspect_prints_declared_size() {
    let td = assert_fs::TempDir::new().unwrap();
    let f = td.child("big.chunk");
    f.write_binary(&[0x00, 0x10, 0x00, 0x00, 0xAA]).unwrap();

    meshunpack()
        .arg("inspect")
        .arg(f.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("variant=chunk len=5 header=4 decompressed_size=4096"));
}

#[test]
fn inspect_flags_short_and_unknown_files() {
    let td = assert_fs::TempDir::new().unwrap();
    let short = td.child("short.mc");
    short.write_binary(&[1, 2, 3]).unwrap();
    let other = td.child("notes.txt");
    other.write_str("x").unwrap();

    meshunpack()
        .arg("inspect")
        .arg(short.path())
        .arg(other.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("shorter than the 12-byte mc header"))
        .stderr(predicate::str::contains("not a .mc or .chunk file"));
}

#[test]
fn bad_size_suffix_is_rejected() {
    meshunpack()
        .args(["decompress", "--work-buffer", "huge", "in", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad size huge"));
}
