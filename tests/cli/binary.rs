// Integration tests for the `backref` binary.
//
// Coverage:
//   - --help / --version exit 0
//   - a file is parsed, verified and reported on stdout
//   - directories are walked and every file reported
//   - unreadable inputs and out-of-range flags exit non-zero
//
// The binary is driven through `std::process::Command`; Cargo sets
// `CARGO_BIN_EXE_backref` for integration tests.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tempfile::TempDir;

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn backref_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_backref"))
}

fn setup_input(name: &str, content: &[u8]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("TempDir::new");
    let input = dir.path().join(name);
    fs::write(&input, content).expect("write input");
    (dir, input)
}

fn sample() -> Vec<u8> {
    b"all work and no play makes jack a dull boy\n"
        .iter()
        .copied()
        .cycle()
        .take(10_000)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Smoke tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn help_flag_exits_zero() {
    let status = Command::new(backref_bin())
        .arg("--help")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("spawn backref --help");
    assert_eq!(status.code(), Some(0));
}

#[test]
fn version_flag_exits_zero() {
    let out = Command::new(backref_bin())
        .arg("--version")
        .output()
        .expect("spawn backref --version");
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains(env!("CARGO_PKG_VERSION")));
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing files
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn verify_reports_digest() {
    let (_dir, input) = setup_input("jack.txt", &sample());
    let out = Command::new(backref_bin())
        .args(["-q", "11", "-j", "1", "--verify"])
        .arg(&input)
        .output()
        .expect("spawn backref");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("jack.txt"));
    assert!(stdout.contains("10000 bytes"));
    assert!(stdout.contains("verified xxh64"));
}

#[test]
fn directory_inputs_are_walked() {
    let dir = TempDir::new().expect("TempDir::new");
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("a.bin"), sample()).unwrap();
    fs::write(dir.path().join("sub").join("b.bin"), &sample()[..5_000]).unwrap();
    let out = Command::new(backref_bin())
        .args(["-q", "5"])
        .arg(dir.path())
        .output()
        .expect("spawn backref");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("a.bin"));
    assert!(stdout.contains("b.bin"));
}

#[test]
fn missing_input_fails() {
    let dir = TempDir::new().expect("TempDir::new");
    let status = Command::new(backref_bin())
        .arg(dir.path().join("nope.txt"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("spawn backref");
    assert_eq!(status.code(), Some(1));
}

#[test]
fn bad_quality_is_rejected() {
    let (_dir, input) = setup_input("x.txt", b"hello");
    let status = Command::new(backref_bin())
        .args(["-q", "99"])
        .arg(&input)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("spawn backref");
    assert!(!status.success());
}
