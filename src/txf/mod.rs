//! TxF log record decoding
//!
//! - `header`: the fixed 80-byte record header
//! - `journal`: update journal entry lists
//! - `body`: the schema-driven body of every other kind
//! - `record`: dispatch between the two and the decoded [`Record`]

pub mod body;
pub mod cursor;
pub mod header;
pub mod journal;
pub mod record;

pub use body::{schema_for, BodyField, BodySchema, GenericBody};
pub use header::{
    check_data_size, RecordHeader, RECORD_HEADER_SIZE, RECORD_KIND_UPDATE_JOURNAL_ENTRIES_LIST,
};
pub use journal::{EntryListHeader, JournalEntries, JournalEntry, UpdateJournalEntryList};
pub use record::{Record, RecordBody};
