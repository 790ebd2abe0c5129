//! Integration tests for the `mdioctl` binary.
//!
//! These exercise the binary via `assert_cmd`: help levels, version, and
//! argument errors that must fail before any USB device is touched.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

fn cli() -> assert_cmd::Command {
    cargo_bin_cmd!("mdioctl")
}

// ── Help and version ──

#[test]
fn cli_help_succeeds() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mdioctl"));
}

#[test]
fn cli_short_help_hides_advanced_options() {
    cli()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("-P"))
        .stdout(predicate::str::contains("-V").not())
        .stdout(predicate::str::contains("STRM_LEN").not());
}

#[test]
fn cli_repeated_help_shows_advanced_options() {
    cli()
        .arg("-hh")
        .assert()
        .success()
        .stdout(predicate::str::contains("-V"))
        .stdout(predicate::str::contains("-i"))
        .stdout(predicate::str::contains("STRM_LEN"));
}

#[test]
fn cli_version_prints_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// ── Argument errors (exit 1, no device needed) ──

/// Helper: an empty config file, so no platform config is consulted.
fn empty_config() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "").unwrap();
    (dir, path)
}

#[test]
fn cli_phy_out_of_range_fails() {
    cli().args(["-i", "40"]).assert().code(1);
}

#[test]
fn cli_malformed_numeric_option_fails() {
    cli()
        .args(["-P", "0xzz"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("0xzz"));
}

#[test]
fn cli_zero_timeout_fails() {
    cli().args(["-t", "0"]).assert().code(1);
}

#[test]
fn cli_receive_buffer_too_large_fails() {
    cli().args(["-G", "-l", "2048"]).assert().code(1);
}

#[test]
fn cli_bad_mac_fails_before_open() {
    let (_dir, config) = empty_config();
    cli()
        .arg("--config")
        .arg(&config)
        .args(["-S", "AABB"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("MAC address"));
}

#[test]
fn cli_packet_filter_with_undefined_bits_fails() {
    let (_dir, config) = empty_config();
    cli()
        .arg("--config")
        .arg(&config)
        .args(["-f", "0x40"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("packet filter"));
}

#[test]
fn cli_invalid_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "phy = 99\n").unwrap();
    cli()
        .arg("--config")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Config error"));
}

#[test]
fn cli_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    cli()
        .arg("--config")
        .arg(dir.path().join("board.tmol"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Config error"))
        .stderr(predicate::str::contains("board.tmol"));
}

#[test]
fn cli_verbose_flag_accepted() {
    cli().args(["-v", "--help"]).assert().success();
}
