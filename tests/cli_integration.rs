//! Integration tests for the asn-finder CLI
//!
//! Runs only use invalid and special-use addresses, which are answered
//! without network access.

#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;

fn asn_finder(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("asn-finder").expect("Failed to find asn-finder binary");
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .args(["-c", "no-such-config.toml"]);
    cmd
}

fn workspace(input: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("ips.txt"), input).unwrap();
    dir
}

#[test]
fn test_help_output() {
    let mut cmd = Command::cargo_bin("asn-finder").expect("Failed to find asn-finder binary");
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Look up ASN information"))
        .stdout(predicate::str::contains("--threads"))
        .stdout(predicate::str::contains("--detect-vpn"))
        .stdout(predicate::str::contains("--cloudflare-action"))
        .stdout(predicate::str::contains("--separate-by"));
}

#[test]
fn test_version_output() {
    let mut cmd = Command::cargo_bin("asn-finder").expect("Failed to find asn-finder binary");
    cmd.arg("--version");

    let output = cmd.output().expect("Failed to execute command");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("asn-finder "));
    if cfg!(debug_assertions) {
        assert!(stdout.contains("-UNRELEASED"));
    }
}

#[test]
fn test_missing_input_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    asn_finder(dir.path())
        .arg("missing.txt")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
    assert!(!dir.path().join("exports").exists());
}

#[test]
fn test_invalid_thread_counts_fail() {
    for threads in ["0", "-4"] {
        let dir = workspace("10.0.0.1\n");
        asn_finder(dir.path())
            .args(["ips.txt", "-t", threads])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("Invalid thread count"));
    }
}

#[test]
fn test_unknown_format_rejected() {
    let dir = workspace("10.0.0.1\n");
    asn_finder(dir.path())
        .args(["ips.txt", "-f", "xml"])
        .assert()
        .failure();
}

#[test]
fn test_offline_csv_run() {
    let dir = workspace("# lab hosts\n10.0.0.1\nnot-an-ip\n127.0.0.1\n");
    asn_finder(dir.path())
        .args(["ips.txt", "-t", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "10.0.0.1: ✗ Whois error: Private Network address has no public ASN",
        ))
        .stdout(predicate::str::contains("not-an-ip: ✗ Invalid IP format"))
        .stdout(predicate::str::contains("Successful queries: 0"))
        .stdout(predicate::str::contains("Errors/Invalid: 3"));

    let csv = fs::read_to_string(dir.path().join("exports/asn_results.csv")).unwrap();
    assert_eq!(
        csv,
        "IP,ASN,Error\n\
         10.0.0.1,N/A,Whois error: Private Network address has no public ASN\n\
         not-an-ip,N/A,Invalid IP format\n\
         127.0.0.1,N/A,Whois error: Loopback address has no public ASN\n"
    );
}

#[test]
fn test_offline_json_run_with_full_details() {
    let dir = workspace("192.168.1.10\n100.64.0.1\n");
    asn_finder(dir.path())
        .args(["ips.txt", "-o", "out.json", "--full"])
        .assert()
        .success();

    let json: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("exports/out.json")).unwrap())
            .unwrap();
    assert_eq!(json[0]["IP"], "192.168.1.10");
    assert_eq!(json[0]["AS Name"], "N/A");
    assert_eq!(
        json[0]["Error"],
        "Whois error: Private Network address has no public ASN"
    );
    assert_eq!(
        json[1]["Error"],
        "Whois error: Carrier Grade NAT address has no public ASN"
    );
}

#[test]
fn test_output_outside_exports_dir_is_moved_in() {
    let dir = workspace("10.0.0.1\n");
    asn_finder(dir.path())
        .args(["ips.txt", "-o", "elsewhere/report.html", "--exports-dir", "out"])
        .assert()
        .success();

    assert!(dir.path().join("out/report.html").is_file());
    assert!(!dir.path().join("elsewhere").exists());
}

#[test]
fn test_config_file_values_apply() {
    let dir = workspace("10.0.0.1\n");
    fs::write(
        dir.path().join("settings.toml"),
        "[defaults]\noutput_file = \"from_config.sql\"\nexports_dir = \"sql_out\"\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("asn-finder").unwrap();
    cmd.current_dir(dir.path())
        .args(["ips.txt", "-c", "settings.toml"])
        .assert()
        .success();

    let sql = fs::read_to_string(dir.path().join("sql_out/from_config.sql")).unwrap();
    assert!(sql.contains("CREATE TABLE IF NOT EXISTS from_config"));
}

#[test]
fn test_cloudflare_export_without_asns_fails() {
    let dir = workspace("10.0.0.1\n");
    asn_finder(dir.path())
        .args(["ips.txt", "-o", "rules_cloudflare.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No valid ASNs found to export"));
}

#[test]
fn test_empty_input_succeeds_without_export() {
    let dir = workspace("# nothing\n\n");
    asn_finder(dir.path())
        .arg("ips.txt")
        .assert()
        .success()
        .stdout(predicate::str::contains("No IP addresses found"));
    assert!(!dir.path().join("exports/asn_results.csv").exists());
}
