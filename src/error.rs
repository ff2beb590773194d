//! Error types for txfrecord
//!
//! Every decode failure is one of these variants. None of them is fatal to
//! the caller: a failed decode leaves the target record reset.

use thiserror::Error;

/// Main error type for record decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxfError {
    #[error("invalid {what} value too small: needed {needed} bytes, got {got}")]
    TooSmall {
        what: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("invalid {what} value exceeds maximum: {value} > {maximum}")]
    ExceedsMaximum {
        what: &'static str,
        value: usize,
        maximum: usize,
    },

    /// The declared record size is too small for the record's kind
    #[error("invalid {what} record size too small: needed {needed} bytes, declared {declared}")]
    RecordTooSmall {
        what: &'static str,
        needed: usize,
        declared: usize,
    },

    #[error("{what} value out of bounds: {size} bytes at offset {offset} exceed limit {limit}")]
    OutOfBounds {
        what: &'static str,
        offset: u64,
        size: u64,
        limit: u64,
    },

    #[error("unable to read USN record at offset {offset}: {source}")]
    InputFailed {
        offset: usize,
        #[source]
        source: UsnError,
    },
}

/// Errors reported by the embedded USN record decoder
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsnError {
    #[error("USN record data too small: needed {needed}, got {got}")]
    TooSmall { needed: usize, got: usize },

    #[error("unsupported USN record major version: {0}")]
    UnsupportedVersion(u16),

    #[error("USN record length {length} out of bounds (minimum {minimum}, available {available})")]
    RecordLengthOutOfBounds {
        length: u32,
        minimum: usize,
        available: usize,
    },

    #[error("USN record name ({size} bytes at offset {offset}) exceeds record length {length}")]
    NameOutOfBounds { offset: u16, size: u16, length: u32 },

    #[error("USN record decoder did not advance")]
    NoProgress,
}

/// Broad classification of a decode failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDomain {
    /// The caller handed over an unusable buffer
    Arguments,
    /// The record bytes are malformed or inconsistent
    Input,
    /// The embedded sub-record decoder rejected its slice
    Io,
}

/// Result type alias for record decoding
pub type Result<T> = std::result::Result<T, TxfError>;

impl TxfError {
    pub(crate) fn out_of_bounds(what: &'static str, offset: usize, size: usize, limit: usize) -> Self {
        TxfError::OutOfBounds {
            what,
            offset: offset as u64,
            size: size as u64,
            limit: limit as u64,
        }
    }

    /// Which part of the error taxonomy this failure belongs to
    pub fn domain(&self) -> ErrorDomain {
        match self {
            TxfError::TooSmall { .. } | TxfError::ExceedsMaximum { .. } => ErrorDomain::Arguments,
            TxfError::RecordTooSmall { .. } | TxfError::OutOfBounds { .. } => ErrorDomain::Input,
            TxfError::InputFailed { .. } => ErrorDomain::Io,
        }
    }

    /// Check if this error was caused by the record bytes rather than the call
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            TxfError::RecordTooSmall { .. }
                | TxfError::OutOfBounds { .. }
                | TxfError::InputFailed { .. }
        )
    }
}
