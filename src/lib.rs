//! txfrecord - Transactional NTFS (TxF) log record decoder
//!
//! Decodes single TxF log records from a byte buffer: the fixed header,
//! update journal entry lists with their embedded USN records, and the
//! generic bodies of every other record kind.
//!
//! # Features
//!
//! - **Bounds-checked decoding**: every read is validated against the
//!   declared record size, malformed input fails with a typed error
//! - **Schema-driven bodies**: per-kind layouts live in one table
//! - **Pluggable USN decoder**: the embedded sub-record decoder is injected
//! - **Debug sink**: every decoded field can be routed to `tracing`
//!
//! # Example
//!
//! ```no_run
//! use txfrecord::{DecodeOptions, Record, TracingSink};
//!
//! fn main() -> txfrecord::Result<()> {
//!     let data = std::fs::read("record.bin").unwrap_or_default();
//!
//!     let options = DecodeOptions::new().with_sink(&TracingSink);
//!     let mut record = Record::new();
//!     record.decode_with(&data, &options)?;
//!
//!     if let Some(list) = record.entry_list() {
//!         for entry in &list.entries {
//!             println!("{}: {}", entry.offset, entry.usn.file_name);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod ntfs;
pub mod txf;

// Re-export main types
pub use config::{DecodeOptions, DEFAULT_MAX_DATA_SIZE};
pub use error::{ErrorDomain, Result, TxfError, UsnError};
pub use logging::{DebugSink, MemorySink, NoopSink, TracingSink};
pub use txf::{
    check_data_size, EntryListHeader, GenericBody, JournalEntry, Record, RecordBody,
    RecordHeader, UpdateJournalEntryList,
};

// Re-export NTFS types that users might need
pub use ntfs::{UsnDecoder, UsnRecord, UsnRecordDecoder};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
