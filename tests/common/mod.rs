//! Shared helpers for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Path to a sketch under `tests/data`.
#[allow(dead_code)]
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

#[allow(dead_code)]
pub fn read_fixture(name: &str) -> String {
    let path = fixture_path(name);
    fs::read_to_string(&path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()))
}

/// Run the built binary with `args`.
#[allow(dead_code)]
pub fn run_ino2ubi(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ino2ubi"))
        .args(args)
        .env_remove("INO2UBI_LOG")
        .output()
        .expect("spawn ino2ubi")
}

/// Decode a UTF-16LE file with a byte-order mark.
#[allow(dead_code)]
pub fn decode_utf16_with_bom(bytes: &[u8]) -> String {
    assert!(bytes.len() >= 2, "file too short for a BOM");
    assert_eq!(&bytes[..2], &[0xFF, 0xFE], "missing UTF-16LE BOM");
    let units: Vec<u16> = bytes[2..]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).expect("valid UTF-16")
}

/// Text of every `name` String node directly inside the named collection.
#[allow(dead_code)]
pub fn collection_names(doc: &str, collection: &str) -> Vec<String> {
    let open = format!("sixx.name=\"{collection}\" sixx.type=\"OrderedCollection\"");
    let Some(start) = doc.find(&open) else {
        return Vec::new();
    };
    let section = &doc[start..];
    let end = section.find("\n\t\t<sixx.object").unwrap_or(section.len());
    let marker = "sixx.name=\"name\" sixx.type=\"String\" sixx.env=\"Core\" >";
    section[..end]
        .match_indices(marker)
        .map(|(at, _)| {
            let rest = &section[at + marker.len()..];
            rest[..rest.find('<').unwrap_or(rest.len())].to_string()
        })
        .collect()
}
