//! Importer error types.

use sct_store::StoreError;
use thiserror::Error;

/// Errors that can occur while discovering, parsing or importing RF2 files.
#[derive(Error, Debug)]
pub enum Rf2Error {
    /// I/O error reading an RF2 file.
    #[error("IO error reading RF2 file: {0}")]
    Io(#[from] std::io::Error),

    /// CSV-level parsing error (ragged row, invalid UTF-8).
    #[error("malformed RF2 row: {0}")]
    Csv(#[from] csv::Error),

    /// The release root could not be walked.
    #[error("unable to walk release directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// No importable files were found beneath the given roots.
    #[error("no importable RF2 files found in {path}")]
    NoImportableFiles {
        /// The release root that was searched.
        path: String,
    },

    /// Header row does not match the expected column schema.
    #[error("{file}: expecting column names {expected:?}, got {found:?}")]
    UnexpectedHeader {
        /// The offending file.
        file: String,
        /// Expected column names, in order.
        expected: Vec<String>,
        /// Column names found in the file.
        found: Vec<String>,
    },

    /// A row has the wrong number of columns.
    #[error("{file}: row {row} has {found} columns, expected {expected}")]
    ColumnCount {
        /// The offending file.
        file: String,
        /// 1-based row number (excluding the header).
        row: u64,
        /// Expected column count.
        expected: usize,
        /// Found column count.
        found: usize,
    },

    /// A field that should hold an SCTID is not a decimal integer.
    #[error("invalid identifier {value:?}")]
    InvalidIdentifier {
        /// The invalid value that was encountered.
        value: String,
    },

    /// A boolean field holds something other than "0" or "1".
    #[error("invalid boolean value {value:?} (expected 0 or 1)")]
    InvalidBoolean {
        /// The invalid value that was encountered.
        value: String,
    },

    /// A date field is not an 8-digit YYYYMMDD value.
    #[error("invalid effectiveTime {value:?}")]
    InvalidDate {
        /// The invalid value that was encountered.
        value: String,
    },

    /// A coded-value column holds an identifier outside its value set.
    #[error("unknown {field} value {value}")]
    UnknownCodedValue {
        /// The RF2 column name.
        field: &'static str,
        /// The out-of-set identifier.
        value: i64,
    },

    /// Writing a batch to the store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for RF2 operations.
pub type Rf2Result<T> = Result<T, Rf2Error>;
