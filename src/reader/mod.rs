//! Format readers: source file → raw records.
//!
//! Each supported format has one reader. JSON and TSV readers are built in;
//! spreadsheet support is split in two: the fixed header convention lives
//! in [`SheetReader`], while the binary grid decoding behind it is a
//! [`SheetDecoder`] the embedding application supplies.

mod json;
mod sheet;
mod tsv;

pub use json::JsonReader;
pub use sheet::{SheetDecoder, SheetReader};
pub use tsv::TsvReader;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::record::RawRecord;

/// Source file formats the scanner recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// Spreadsheet workbooks (`.xlsx`, `.xls`).
    Sheet,
    /// JSON array-of-objects files (`.json`).
    Json,
    /// Tab-separated files with a header line (`.tsv`).
    Tsv,
}

impl SourceFormat {
    /// Classifies a file extension; `None` for anything unrecognized.
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xls") {
            Some(SourceFormat::Sheet)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(SourceFormat::Json)
        } else if ext.eq_ignore_ascii_case("tsv") {
            Some(SourceFormat::Tsv)
        } else {
            None
        }
    }

    /// Identifier column probed when none of the standard `id` spellings
    /// are present. Spreadsheet exports conventionally use `itemId`.
    pub(crate) fn id_fallback(self) -> Option<&'static str> {
        match self {
            SourceFormat::Sheet => Some("itemId"),
            SourceFormat::Json | SourceFormat::Tsv => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceFormat::Sheet => "sheet",
            SourceFormat::Json => "json",
            SourceFormat::Tsv => "tsv",
        }
    }
}

/// Errors reading one source file. A failed file never takes down the rest
/// of a load pass; the error lands in the engine's per-config journal.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

impl ReadError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ReadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(path: &Path, reason: impl Into<String>) -> Self {
        ReadError::Parse {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Extracts the raw records of one source file.
pub trait FormatReader: Send + Sync {
    fn read(&self, name: &str, path: &Path) -> Result<Vec<RawRecord>, ReadError>;
}

/// The engine's format → reader table.
#[derive(Default)]
pub(crate) struct ReaderSet {
    readers: DashMap<SourceFormat, Arc<dyn FormatReader>>,
}

impl ReaderSet {
    /// A set with the built-in JSON and TSV readers installed. Sheet
    /// reading stays empty until a decoder is registered.
    pub(crate) fn with_defaults() -> Self {
        let set = Self::default();
        set.register(SourceFormat::Json, Arc::new(JsonReader));
        set.register(SourceFormat::Tsv, Arc::new(TsvReader));
        set
    }

    /// Installs or replaces the reader for a format.
    pub(crate) fn register(&self, format: SourceFormat, reader: Arc<dyn FormatReader>) {
        self.readers.insert(format, reader);
    }

    pub(crate) fn get(&self, format: SourceFormat) -> Option<Arc<dyn FormatReader>> {
        self.readers.get(&format).map(|entry| entry.value().clone())
    }
}
