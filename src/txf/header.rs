//! The 80-byte header shared by every TxF record kind

use crate::error::{Result, TxfError};
use crate::logging::DebugSink;
use crate::ntfs::structs::{
    filetime_to_datetime, format_filetime, guid_from_bytes, mft_entry, sequence_number,
};
use crate::txf::cursor::BoundedCursor;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Size of the fixed record header
pub const RECORD_HEADER_SIZE: usize = 80;

/// Kind code of records carrying an update journal entry list
pub const RECORD_KIND_UPDATE_JOURNAL_ENTRIES_LIST: u16 = 0x0017;

/// Fields are named by their offset where their meaning is unknown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordHeader {
    pub unknown_0x00: u32,
    pub kind: u16,
    pub unknown_0x06: u16,
    pub file_identifier: u64,
    pub file_reference: u64,
    pub unknown_0x18: u32,
    pub unknown_0x1c: u32,
    pub guid: [u8; 16],
    pub unknown_0x30: u64,
    pub timestamp: u64,
    /// Declared size of the whole record, header included
    pub record_size: u32,
    pub unknown_0x44: u32,
    pub unknown_0x48: u64,
}

/// Reject buffers outside `[RECORD_HEADER_SIZE, maximum]`
///
/// The maximum is checked first so that an oversized length is reported
/// without looking at the data.
pub fn check_data_size(size: usize, maximum: usize) -> Result<()> {
    if size > maximum {
        return Err(TxfError::ExceedsMaximum {
            what: "record data size",
            value: size,
            maximum,
        });
    }
    if size < RECORD_HEADER_SIZE {
        return Err(TxfError::TooSmall {
            what: "record data",
            needed: RECORD_HEADER_SIZE,
            got: size,
        });
    }
    Ok(())
}

impl RecordHeader {
    /// Parse the header from the start of `data`
    ///
    /// Only the buffer length is validated here; the declared record size is
    /// checked by the caller.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < RECORD_HEADER_SIZE {
            return Err(TxfError::TooSmall {
                what: "record data",
                needed: RECORD_HEADER_SIZE,
                got: data.len(),
            });
        }

        let mut cursor = BoundedCursor::new(&data[..RECORD_HEADER_SIZE]);

        Ok(Self {
            unknown_0x00: cursor.read_u32("record header")?,
            kind: cursor.read_u16("record type")?,
            unknown_0x06: cursor.read_u16("record header")?,
            file_identifier: cursor.read_u64("file identifier")?,
            file_reference: cursor.read_u64("file reference")?,
            unknown_0x18: cursor.read_u32("record header")?,
            unknown_0x1c: cursor.read_u32("record header")?,
            guid: cursor.read_array("record header GUID")?,
            unknown_0x30: cursor.read_u64("record header")?,
            timestamp: cursor.read_u64("record header timestamp")?,
            record_size: cursor.read_u32("record size")?,
            unknown_0x44: cursor.read_u32("record header")?,
            unknown_0x48: cursor.read_u64("record header")?,
        })
    }

    /// Check if this record carries an update journal entry list
    pub fn is_update_journal_entries_list(&self) -> bool {
        self.kind == RECORD_KIND_UPDATE_JOURNAL_ENTRIES_LIST
    }

    /// Get the MFT entry index of the file reference (lower 48 bits)
    pub fn mft_entry(&self) -> u64 {
        mft_entry(self.file_reference)
    }

    /// Get the sequence number of the file reference (upper 16 bits)
    pub fn sequence_number(&self) -> u16 {
        sequence_number(self.file_reference)
    }

    pub fn guid(&self) -> Uuid {
        guid_from_bytes(self.guid)
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        filetime_to_datetime(self.timestamp)
    }

    pub(crate) fn report(&self, sink: &dyn DebugSink) {
        const SCOPE: &str = "record header";
        sink.value(SCOPE, "unknown 0x00", &format_args!("0x{:08x}", self.unknown_0x00));
        sink.value(SCOPE, "record type", &format_args!("0x{:04x}", self.kind));
        sink.value(SCOPE, "unknown 0x06", &format_args!("0x{:04x}", self.unknown_0x06));
        sink.value(SCOPE, "file identifier", &format_args!("0x{:016x}", self.file_identifier));
        sink.value(
            SCOPE,
            "file reference",
            &format_args!("MFT entry: {}, sequence: {}", self.mft_entry(), self.sequence_number()),
        );
        sink.value(SCOPE, "unknown 0x18", &format_args!("0x{:08x}", self.unknown_0x18));
        sink.value(SCOPE, "unknown 0x1c", &format_args!("0x{:08x}", self.unknown_0x1c));
        sink.value(SCOPE, "GUID", &self.guid());
        sink.value(SCOPE, "unknown 0x30", &format_args!("0x{:016x}", self.unknown_0x30));
        sink.value(SCOPE, "timestamp", &format_filetime(self.timestamp));
        sink.value(SCOPE, "record size", &self.record_size);
        sink.value(SCOPE, "unknown 0x44", &format_args!("0x{:08x}", self.unknown_0x44));
        sink.value(SCOPE, "unknown 0x48", &format_args!("0x{:016x}", self.unknown_0x48));
    }
}
