#![allow(deprecated)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin;
use mockito::{Matcher, Server};
use predicates::prelude::*;
use tempfile::TempDir;

const UNREACHABLE: &str = "http://127.0.0.1:1";

fn netclip(url: &str, key_file: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("netclip"));
    cmd.env("NETCLIP_URL", url)
        .env("NETCLIP_KEY_FILE", key_file)
        .env_remove("NETCLIP_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn key_file(dir: &TempDir) -> PathBuf {
    dir.path().join(".netclip_key")
}

#[test]
fn version_prints_bare_version() {
    let dir = TempDir::new().unwrap();
    netclip(UNREACHABLE, &key_file(&dir))
        .arg("--version")
        .assert()
        .success()
        .stdout(format!("{}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn help_lists_flags() {
    let dir = TempDir::new().unwrap();
    netclip(UNREACHABLE, &key_file(&dir))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--register").and(predicate::str::contains("--key")));
}

#[test]
fn unknown_flag_fails() {
    let dir = TempDir::new().unwrap();
    netclip(UNREACHABLE, &key_file(&dir))
        .arg("--bogus")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--bogus"));
}

#[test]
fn zero_timeout_is_rejected() {
    let dir = TempDir::new().unwrap();
    netclip(UNREACHABLE, &key_file(&dir))
        .args(["--timeout", "0", "--get"])
        .assert()
        .code(1)
        .stdout("");
}

#[test]
fn no_key_exits_one_with_instructions() {
    let dir = TempDir::new().unwrap();
    netclip(UNREACHABLE, &key_file(&dir))
        .write_stdin("hello\n")
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("No API key set."));
}

#[test]
fn set_key_writes_credential_file() {
    let dir = TempDir::new().unwrap();
    netclip(UNREACHABLE, &key_file(&dir))
        .args(["--key", "abc123"])
        .assert()
        .success()
        .stdout("Your API key has been set.\n");
    assert_eq!(fs::read_to_string(key_file(&dir)).unwrap(), "abc123");

    // A second --key replaces the read-only file.
    netclip(UNREACHABLE, &key_file(&dir))
        .args(["--key", "def456"])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(key_file(&dir)).unwrap(), "def456");
}

#[test]
fn register_then_save_piped_clip() {
    let mut server = Server::new();
    let dir = TempDir::new().unwrap();
    let register = server
        .mock("POST", "/register")
        .match_body(Matcher::UrlEncoded("action".into(), "register".into()))
        .with_body(r#"{"status":"200","message":"abc123"}"#)
        .expect(1)
        .create();
    let save = server
        .mock("POST", "/clip/save/abc123")
        .match_body(Matcher::UrlEncoded("clip".into(), "hello\nworld".into()))
        .with_body(r#"{"status":"200","message":"Clip saved"}"#)
        .create();

    netclip(&server.url(), &key_file(&dir))
        .arg("--register")
        .assert()
        .success()
        .stdout("Your API key is: abc123\n");

    netclip(&server.url(), &key_file(&dir))
        .arg("--register")
        .assert()
        .success()
        .stdout("You have already registered this machine. Your API key is: abc123\n");

    netclip(&server.url(), &key_file(&dir))
        .write_stdin("hello\nworld\n")
        .assert()
        .success()
        .stdout("Clip saved\n");

    register.assert();
    save.assert();
}

#[test]
fn get_flag_fetches_and_logs_remote_errors_to_stderr() {
    let mut server = Server::new();
    let dir = TempDir::new().unwrap();
    server
        .mock("GET", "/clip/get/abc123")
        .with_body(r#"{"status":"500","message":"server error"}"#)
        .create();

    netclip(&server.url(), &key_file(&dir))
        .args(["--key", "abc123"])
        .assert()
        .success();

    netclip(&server.url(), &key_file(&dir))
        .arg("--get")
        .assert()
        .success()
        .stdout("server error\n")
        .stderr(predicate::str::contains("service returned an error"));
}

#[test]
fn unreachable_service_still_exits_zero() {
    let dir = TempDir::new().unwrap();
    netclip(UNREACHABLE, &key_file(&dir))
        .args(["--key", "abc123"])
        .assert()
        .success();

    netclip(UNREACHABLE, &key_file(&dir))
        .write_stdin("hello\n")
        .assert()
        .success()
        .stdout("\n")
        .stderr(predicate::str::contains("clip/save request failed"));
}
