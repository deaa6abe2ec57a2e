//! End-to-end CLI integration tests.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

const KEY: &str = "327235753878214125442a472d4b6150645367566b597033733676397924423f";

fn tbx() -> Command {
    let mut cmd = Command::cargo_bin("tbx").expect("binary not found");
    cmd.env_remove("TBX_HEAP_SIZE").env_remove("TBX_AES_KEY");
    cmd
}

#[test]
fn help_flag() {
    tbx()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("memory pools"));
}

#[test]
fn version_flag() {
    tbx()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tbx"));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    tbx().assert().failure().code(2);
}

#[test]
fn info_shows_versions() {
    tbx()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("toolbox 1.0.0"))
        .stdout(predicate::str::contains("heap size:      2048 bytes"));
}

#[test]
fn env_var_heap_size() {
    tbx()
        .env("TBX_HEAP_SIZE", "8192")
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("8192 bytes"));
}

#[test]
fn checksum_crc16_and_crc32() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("ramp.bin");
    fs::write(&path, (0u8..32).collect::<Vec<u8>>()).unwrap();

    tbx()
        .args(["checksum", "--algo", "crc16"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("23b3"));

    tbx()
        .arg("checksum")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("8f819950"));
}

#[test]
fn checksum_of_empty_file_is_a_config_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("empty.bin");
    fs::write(&path, b"").unwrap();

    tbx()
        .arg("checksum")
        .arg(&path)
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("is empty"));
}

#[test]
fn checksum_missing_file_fails() {
    tbx()
        .args(["checksum", "/nonexistent/tbx-input.bin"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn encrypt_matches_known_vector_and_decrypts_back() {
    let tmp = tempfile::TempDir::new().unwrap();
    let plain = tmp.path().join("plain.bin");
    let cipher = tmp.path().join("cipher.bin");
    let restored = tmp.path().join("restored.bin");
    let data: Vec<u8> = (0u8..32).collect();
    fs::write(&plain, &data).unwrap();

    tbx()
        .args(["encrypt", "--key", KEY])
        .arg(&plain)
        .arg("-o")
        .arg(&cipher)
        .assert()
        .success()
        .stdout(predicate::str::contains("encrypted 32 bytes"));
    assert_eq!(
        hex::encode(fs::read(&cipher).unwrap()),
        "c12a81c06cc3db9f705474b4b93ea31bf7a2ecaf390f9d43000f82f8bcfe231a"
    );

    tbx()
        .args(["decrypt", "--key", KEY])
        .arg(&cipher)
        .arg("-o")
        .arg(&restored)
        .assert()
        .success();
    assert_eq!(fs::read(&restored).unwrap(), data);
}

#[test]
fn encrypt_requires_block_multiple_unless_padded() {
    let tmp = tempfile::TempDir::new().unwrap();
    let plain = tmp.path().join("short.txt");
    let cipher = tmp.path().join("short.enc");
    fs::write(&plain, b"hello").unwrap();

    tbx()
        .args(["encrypt", "--key", KEY])
        .arg(&plain)
        .arg("-o")
        .arg(&cipher)
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("--pad"));

    tbx()
        .args(["encrypt", "--pad", "--key", KEY])
        .arg(&plain)
        .arg("-o")
        .arg(&cipher)
        .assert()
        .success();
    assert_eq!(fs::read(&cipher).unwrap().len(), 16);
}

#[test]
fn encrypt_rejects_short_key() {
    tbx()
        .args(["encrypt", "--key", "00ff", "in.bin", "-o", "out.bin"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("key must be 32 bytes"));
}

#[test]
fn random_seeded_is_reproducible() {
    let first = tbx()
        .args(["random", "-n", "5", "--seed", "1234"])
        .output()
        .unwrap();
    let second = tbx()
        .args(["random", "-n", "5", "--seed", "1234"])
        .output()
        .unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    assert_eq!(String::from_utf8_lossy(&first.stdout).lines().count(), 5);
}

#[test]
fn pools_table() {
    tbx()
        .args(["pools", "2x16", "4x32"])
        .assert()
        .success()
        .stdout(predicate::str::contains("block size"))
        .stdout(predicate::str::contains("heap: 2048 bytes, 1888 free"));
}

#[test]
fn pools_json() {
    let output = tbx()
        .args(["pools", "2x16", "--exercise", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["heap_capacity"], 2048);
    assert_eq!(report["classes"][0]["block_count"], 2);
    assert_eq!(report["stats"]["allocations"], 2);
    assert_eq!(report["stats"]["failures"], 0);
}

#[test]
fn pools_out_of_heap_exit_code() {
    tbx()
        .args(["--heap-size", "64", "pools", "4x32"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("out of heap memory"));
}

#[test]
fn pools_invalid_layout() {
    tbx().args(["pools", "4by16"]).assert().failure().code(2);
}

#[test]
fn shell_completion_bash() {
    tbx()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tbx"));
}

#[test]
fn shell_completion_zsh() {
    tbx()
        .args(["completion", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tbx"));
}
