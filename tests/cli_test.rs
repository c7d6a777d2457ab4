//! CLI end-to-end tests
//!
//! Tests for the mediaforge command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the mediaforge binary
#[allow(deprecated)]
fn mediaforge_cmd() -> Command {
    Command::cargo_bin("mediaforge").unwrap()
}

fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    let content = format!(
        "[storage]\nroot = {:?}\n\n[conversion]\n{}\n",
        dir.join("content").display().to_string(),
        extra
    );
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_cli_no_args_shows_help() {
    mediaforge_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    mediaforge_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mediaforge"));
}

#[test]
fn test_cli_check_tools_command() {
    mediaforge_cmd()
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg").or(predicate::str::contains("tools")));
}

#[test]
fn test_cli_validate_valid_config() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "max_concurrent = 2");

    mediaforge_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Max concurrent conversions: 2"));
}

#[test]
fn test_cli_validate_rejects_zero_port() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[server]\nport = 0\n").unwrap();

    mediaforge_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("port"));
}

#[test]
fn test_cli_convert_unknown_kind() {
    mediaforge_cmd()
        .args(["convert", "image", "a.png", "jpg"])
        .assert()
        .failure();
}

#[test]
fn test_cli_convert_missing_source() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");

    mediaforge_cmd()
        .arg("--config")
        .arg(&config)
        .args(["convert", "audio", "ghost.wav", "mp3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[cfg(unix)]
#[test]
fn test_cli_convert_with_fake_tool() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let tool = dir.path().join("fake-ffmpeg");
    fs::write(&tool, "#!/bin/sh\ncp \"$3\" \"$4\"\n").unwrap();
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

    let config = write_config(dir.path(), &format!("ffmpeg_path = {:?}", tool.display().to_string()));
    let audios = dir.path().join("content/audios");
    fs::create_dir_all(&audios).unwrap();
    fs::write(audios.join("song.wav"), b"pcm").unwrap();

    mediaforge_cmd()
        .arg("--config")
        .arg(&config)
        .args(["convert", "audio", "song.wav", "mp3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Conversion complete"))
        .stdout(predicate::str::contains("song_converted.mp3"));

    let output = dir.path().join("content/converted/song_converted.mp3");
    assert_eq!(fs::read(output).unwrap(), b"pcm");
}
