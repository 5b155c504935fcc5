//! TOML persistence of the table set, with optional gzip compression.
//!
//! Compressed and plain files are told apart by the gzip magic bytes rather than by trying one
//! decoder and falling back to the other, so a damaged archive reports as a parse failure and an
//! unreadable file as an I/O failure.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;

use crate::error::{HwConfigError, Result};
use crate::model::Tables;

/// Leading bytes of every gzip stream
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Check whether a byte buffer starts with a gzip header
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Serialize the tables to TOML text.
pub fn encode(tables: &Tables) -> Result<String> {
    Ok(toml::to_string(tables)?)
}

/// Parse tables from file contents, decompressing first if the contents are gzipped.
///
/// Errors are returned as the reason text of a parse failure.
fn decode(bytes: &[u8]) -> std::result::Result<Tables, String> {
    let text = if is_gzip(bytes) {
        let mut decoder = GzDecoder::new(bytes);
        let mut text = String::new();
        decoder
            .read_to_string(&mut text)
            .map_err(|e| format!("corrupt gzip stream: {}", e))?;
        text
    } else {
        String::from_utf8(bytes.to_vec()).map_err(|e| format!("invalid UTF-8: {}", e))?
    };

    toml::from_str(&text).map_err(|e| e.to_string())
}

/// Read a table set from a plain or gzipped TOML file.
pub fn read_tables(path: &Path) -> Result<Tables> {
    let bytes = fs::read(path)?;
    debug!(
        "Read {} bytes from {} (gzip: {})",
        bytes.len(),
        path.display(),
        is_gzip(&bytes)
    );

    decode(&bytes).map_err(|reason| HwConfigError::Parse {
        path: path.to_path_buf(),
        reason,
    })
}

/// Write a table set to a TOML file, gzipped if `compress` is set.
///
/// Without `overwrite` the file is created exclusively and an existing path is left untouched.
pub fn write_tables(path: &Path, tables: &Tables, overwrite: bool, compress: bool) -> Result<()> {
    // Encode before touching the filesystem so a failure leaves no partial file behind
    let text = encode(tables)?;

    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let file = options.open(path).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => HwConfigError::AlreadyExists(path.to_path_buf()),
        _ => HwConfigError::Io(e),
    })?;

    if compress {
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(text.as_bytes())?;
        encoder.finish()?.sync_all()?;
    } else {
        let mut file = file;
        file.write_all(text.as_bytes())?;
        file.sync_all()?;
    }

    debug!(
        "Wrote {} bytes of TOML to {} (compressed: {})",
        text.len(),
        path.display(),
        compress
    );
    Ok(())
}
