//! Writing rendered documents to disk.
//!
//! FLProg reads block files as UTF-16 with a byte-order mark. Writes go
//! through a temp file in the destination directory and are persisted with a
//! rename, so a failed write never truncates an existing file.
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const BLOCK_EXTENSION: &str = "ubi";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf16Le,
    Utf8,
}

/// Encode `text`, prefixing the byte-order mark for UTF-16.
pub fn encode_document(text: &str, encoding: Encoding) -> Vec<u8> {
    match encoding {
        Encoding::Utf8 => text.as_bytes().to_vec(),
        Encoding::Utf16Le => {
            let mut bytes = Vec::with_capacity(2 + text.len() * 2);
            bytes.extend_from_slice(&[0xFF, 0xFE]);
            for unit in text.encode_utf16() {
                bytes.extend_from_slice(&unit.to_le_bytes());
            }
            bytes
        }
    }
}

/// Append `.ubi` unless the path already ends with it (any case).
pub fn with_block_extension(path: &Path) -> PathBuf {
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(BLOCK_EXTENSION));
    if has_extension {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(BLOCK_EXTENSION);
    PathBuf::from(name)
}

/// Output path for a sketch when none is given: same stem, `.ubi` extension.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension(BLOCK_EXTENSION)
}

/// Atomically replace `path` with `bytes`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    staged
        .write_all(bytes)
        .with_context(|| format!("write {}", staged.path().display()))?;
    staged
        .as_file()
        .sync_all()
        .with_context(|| format!("sync {}", staged.path().display()))?;
    staged
        .persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("persist {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote block file");
    Ok(())
}
