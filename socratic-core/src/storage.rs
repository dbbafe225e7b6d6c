//! Whole-file JSON persistence helpers.
//!
//! Every durable structure in the crate is written as a complete file: a
//! reader never observes a partial delta, only the last successful write.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Create a directory (and parents) if it does not exist.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| Error::persistence(dir, e))
}

/// Serialize `value` and overwrite `path` with it.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body).map_err(|e| Error::persistence(path, e))
}

/// Read and parse `path`, returning `None` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::persistence(path, e)),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| Error::persistence(path, format!("unparseable contents: {}", e)))
}
