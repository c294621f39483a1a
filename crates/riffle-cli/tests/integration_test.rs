//! Integration tests for the riffle CLI binary.
//!
//! Builds small RIFF files byte by byte in a temp directory and checks what
//! `riffle tree` and `riffle scan` report about them.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use predicates::prelude::*;
use tempfile::TempDir;

// ──────────────────────── helpers ────────────────────────

fn write_chunk<E: ByteOrder>(out: &mut Vec<u8>, id: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(id);
    out.write_u32::<E>(payload.len() as u32).unwrap();
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
}

fn write_group<E: ByteOrder>(out: &mut Vec<u8>, id: &[u8; 4], sub_type: &[u8; 4], body: &[u8]) {
    out.extend_from_slice(id);
    out.write_u32::<E>(4 + body.len() as u32).unwrap();
    out.extend_from_slice(sub_type);
    out.extend_from_slice(body);
}

/// A WAVE file with a 16-byte `fmt ` chunk, a 3-byte `data` chunk and,
/// optionally, an `INFO` list naming it.
fn wave_bytes<E: ByteOrder>(with_info: bool) -> Vec<u8> {
    let mut body = Vec::new();
    write_chunk::<E>(&mut body, b"fmt ", &[0u8; 16]);
    write_chunk::<E>(&mut body, b"data", &[1, 2, 3]);
    if with_info {
        let mut info = Vec::new();
        write_chunk::<E>(&mut info, b"INAM", b"Demo\0");
        write_group::<E>(&mut body, b"LIST", b"INFO", &info);
    }
    let mut out = Vec::new();
    write_group::<E>(&mut out, b"RIFF", b"WAVE", &body);
    out
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("Failed to write test file");
    path
}

/// Get a `Command` for the `riffle` CLI binary.
#[allow(deprecated)]
fn riffle_cmd() -> Command {
    Command::cargo_bin("riffle").expect("Failed to find `riffle` binary")
}

// ──────────────────────── tests ─────────────────────────

#[test]
fn test_tree_prints_outline() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(tmp.path(), "tone.wav", &wave_bytes::<LittleEndian>(false));

    riffle_cmd()
        .args(["tree", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("(48 bytes)"))
        .stdout(predicate::str::contains("RIFF 'WAVE' WAVE form (40 bytes @ 0)"))
        .stdout(predicate::str::contains("fmt  Format (16 bytes @ 12)"))
        .stdout(predicate::str::contains("data Data (3 bytes @ 36)"))
        .stdout(predicate::str::contains("unparsed").not());
}

#[test]
fn test_tree_json_structure() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(tmp.path(), "tone.wav", &wave_bytes::<LittleEndian>(true));

    let output = riffle_cmd()
        .args(["tree", path.to_str().unwrap(), "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("tree --json output should be valid JSON");

    assert_eq!(json["file_size"], 66);
    assert_eq!(json["consumed"], 66);
    let root = &json["roots"][0];
    assert_eq!(root["id"], "RIFF");
    assert_eq!(root["sub_type"], "WAVE");
    assert_eq!(root["encoded_size"], 66);
    assert_eq!(root["children"].as_array().unwrap().len(), 3);
    assert_eq!(root["children"][1]["id"], "data");
    assert_eq!(root["children"][1]["size"], 3);
    assert_eq!(root["children"][2]["sub_type"], "INFO");
    assert_eq!(root["children"][2]["children"][0]["id"], "INAM");
}

#[test]
fn test_tree_with_declared_property() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(tmp.path(), "named.wav", &wave_bytes::<LittleEndian>(true));

    riffle_cmd()
        .args(["tree", path.to_str().unwrap(), "--property", "INFO:INAM"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"= INAM "Demo""#))
        // Undeclared chunks are still listed.
        .stdout(predicate::str::contains("fmt  Format (16 bytes @ 12)"));
}

#[test]
fn test_tree_rejects_malformed_rule() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(tmp.path(), "tone.wav", &wave_bytes::<LittleEndian>(false));

    riffle_cmd()
        .args(["tree", path.to_str().unwrap(), "--property", "INFONAME"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONTAINER:ID"));
}

#[test]
fn test_scan_summarizes_structure() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(tmp.path(), "named.wav", &wave_bytes::<LittleEndian>(true));

    riffle_cmd()
        .args(["scan", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("RIFF 'WAVE'"))
        .stdout(predicate::str::contains("LIST 'INFO'"))
        .stdout(predicate::str::contains("2 groups, 3 chunks, 24 B of payload skipped"));
}

#[test]
fn test_big_endian_lengths() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(tmp.path(), "rifx.wav", &wave_bytes::<BigEndian>(false));

    riffle_cmd()
        .args(["tree", path.to_str().unwrap(), "--big-endian"])
        .assert()
        .success()
        .stdout(predicate::str::contains("data Data (3 bytes @ 36)"));
}

#[test]
fn test_unknown_top_level_fails_unless_ignored() {
    let tmp = TempDir::new().unwrap();
    let mut bytes = b"FORM".to_vec();
    bytes.write_u32::<LittleEndian>(4).unwrap();
    bytes.extend_from_slice(b"AIFF");
    let path = write_file(tmp.path(), "other.bin", &bytes);

    riffle_cmd()
        .args(["tree", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"));

    riffle_cmd()
        .args(["tree", path.to_str().unwrap(), "--ignore-unknown"])
        .assert()
        .success()
        .stdout(predicate::str::contains("12 unparsed bytes at offset 0"));
}

#[test]
fn test_truncated_file_reports_note() {
    let tmp = TempDir::new().unwrap();
    let bytes = wave_bytes::<LittleEndian>(false);
    let path = write_file(tmp.path(), "cut.wav", &bytes[..bytes.len() - 4]);

    riffle_cmd()
        .args(["tree", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("! unexpected end after"));
}

#[test]
fn test_missing_file_fails() {
    riffle_cmd()
        .args(["scan", "/nonexistent/path/file.wav"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open file"));
}
