use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The tables of a hardware configuration, used to name where a lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Bands,
    Wafers,
    Tubes,
    Telescopes,
    Cards,
    Crates,
    Detectors,
}

impl TableKind {
    /// Persisted top-level key of the table
    pub fn key(&self) -> &'static str {
        match self {
            TableKind::Bands => "bands",
            TableKind::Wafers => "wafers",
            TableKind::Tubes => "tubes",
            TableKind::Telescopes => "telescopes",
            TableKind::Cards => "cards",
            TableKind::Crates => "crates",
            TableKind::Detectors => "detectors",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Error, Debug)]
pub enum HwConfigError {
    #[error("Failed to parse hardware config {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Dump path {} already exists, use the overwrite option", .0.display())]
    AlreadyExists(PathBuf),

    #[error("No {table} entry for '{id}'")]
    Lookup { table: TableKind, id: String },

    #[error("Invalid match expression for '{field}': {source}")]
    MalformedCriterion {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize hardware config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl HwConfigError {
    pub(crate) fn lookup(table: TableKind, id: impl Into<String>) -> Self {
        HwConfigError::Lookup {
            table,
            id: id.into(),
        }
    }

    /// True for the lookup failures raised on dangling or unknown ids
    pub fn is_lookup(&self) -> bool {
        matches!(self, HwConfigError::Lookup { .. })
    }
}

pub type Result<T> = std::result::Result<T, HwConfigError>;
