//! Update journal entry lists
//!
//! A record of kind [`RECORD_KIND_UPDATE_JOURNAL_ENTRIES_LIST`] carries a
//! 16-byte list header after the record header, optional padding, and then
//! a run of entries up to the declared record size. Each entry is an opaque
//! 8-byte value followed by a USN record whose own length decides where the
//! next entry starts.
//!
//! [`RECORD_KIND_UPDATE_JOURNAL_ENTRIES_LIST`]: crate::txf::header::RECORD_KIND_UPDATE_JOURNAL_ENTRIES_LIST

use crate::error::{Result, TxfError, UsnError};
use crate::logging::DebugSink;
use crate::ntfs::structs::format_filetime;
use crate::ntfs::usn::{describe_usn_reason_flags, UsnDecoder, UsnRecord};
use crate::txf::cursor::BoundedCursor;
use crate::txf::header::RECORD_HEADER_SIZE;
use serde::Serialize;
use std::iter::FusedIterator;

/// Size of the list header that follows the record header
pub const ENTRY_LIST_HEADER_SIZE: usize = 16;

/// First offset an entry may start at
pub const ENTRIES_MIN_OFFSET: usize = RECORD_HEADER_SIZE + ENTRY_LIST_HEADER_SIZE;

const SCOPE: &str = "update journal entries list";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntryListHeader {
    /// LSN of the next list in the chain
    pub next_lsn: u64,
    /// Offset of the first entry, relative to the record start
    pub entries_offset: u32,
    pub entries_length: u32,
}

impl EntryListHeader {
    /// Parse and validate the list header
    ///
    /// `data` is the record cut to its declared size.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < ENTRIES_MIN_OFFSET {
            return Err(TxfError::RecordTooSmall {
                what: "update journal entries list",
                needed: ENTRIES_MIN_OFFSET,
                declared: data.len(),
            });
        }

        let mut cursor = BoundedCursor::at(data, RECORD_HEADER_SIZE)?;
        let header = Self {
            next_lsn: cursor.read_u64("next LSN")?,
            entries_offset: cursor.read_u32("entries offset")?,
            entries_length: cursor.read_u32("entries length")?,
        };

        let offset = header.entries_offset as usize;
        if offset < ENTRIES_MIN_OFFSET || offset > data.len() {
            return Err(TxfError::out_of_bounds("entries offset", offset, 0, data.len()));
        }
        // The entries must reach at least the end of the record
        let end = header.entries_offset as u64 + header.entries_length as u64;
        if end < data.len() as u64 {
            return Err(TxfError::out_of_bounds(
                "entries length",
                offset,
                header.entries_length as usize,
                data.len(),
            ));
        }
        Ok(header)
    }

    /// Iterate over the entries of `data`, decoding each USN record with `decoder`
    pub fn entries<'a>(
        &self,
        data: &'a [u8],
        decoder: &'a dyn UsnDecoder,
        sink: &'a dyn DebugSink,
    ) -> JournalEntries<'a> {
        JournalEntries {
            cursor: BoundedCursor::at(data, self.entries_offset as usize)
                .unwrap_or_else(|_| BoundedCursor::at_end(data)),
            decoder,
            sink,
            done: false,
        }
    }

    fn report(&self, sink: &dyn DebugSink) {
        sink.value(SCOPE, "next LSN", &format_args!("0x{:016x}", self.next_lsn));
        sink.value(SCOPE, "entries offset", &format_args!("0x{:08x}", self.entries_offset));
        sink.value(SCOPE, "entries length", &self.entries_length);
    }
}

/// One entry of an update journal entry list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub unknown: u64,
    /// Offset of the USN record, relative to the record start
    pub offset: usize,
    /// Bytes taken by the USN record
    pub size: usize,
    pub usn: UsnRecord,
}

/// Lazy iterator over the entries of a list
///
/// Yields at most one error, after which it is exhausted.
pub struct JournalEntries<'a> {
    cursor: BoundedCursor<'a>,
    decoder: &'a dyn UsnDecoder,
    sink: &'a dyn DebugSink,
    done: bool,
}

impl JournalEntries<'_> {
    /// Offset the next entry would be read from
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    fn read_entry(&mut self) -> Result<JournalEntry> {
        let unknown = self.cursor.read_u64("update journal entry")?;
        let offset = self.cursor.position();
        let available = self.cursor.rest();

        let usn = self
            .decoder
            .decode(available)
            .map_err(|source| TxfError::InputFailed { offset, source })?;

        let size = usn.size();
        if size == 0 {
            return Err(TxfError::InputFailed {
                offset,
                source: UsnError::NoProgress,
            });
        }
        if size > available.len() {
            return Err(TxfError::out_of_bounds("USN record size", offset, size, self.cursor.limit()));
        }
        self.cursor.skip("USN record", size)?;

        if self.sink.is_enabled() {
            report_entry(self.sink, unknown, offset, &usn);
        }
        Ok(JournalEntry { unknown, offset, size, usn })
    }
}

impl Iterator for JournalEntries<'_> {
    type Item = Result<JournalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor.is_at_end() {
            return None;
        }
        let entry = self.read_entry();
        if entry.is_err() {
            self.done = true;
        }
        Some(entry)
    }
}

impl FusedIterator for JournalEntries<'_> {}

fn report_entry(sink: &dyn DebugSink, unknown: u64, offset: usize, usn: &UsnRecord) {
    const ENTRY: &str = "update journal entry";
    sink.value(ENTRY, "unknown value", &format_args!("0x{:016x}", unknown));
    sink.value(ENTRY, "USN record offset", &format_args!("0x{:08x}", offset));
    sink.value(ENTRY, "USN record size", &usn.record_length);
    sink.value(
        ENTRY,
        "version",
        &format_args!("{}.{}", usn.major_version, usn.minor_version),
    );
    sink.value(
        ENTRY,
        "file reference",
        &format_args!("MFT entry: {}", usn.file_record_number()),
    );
    sink.value(
        ENTRY,
        "parent file reference",
        &format_args!("MFT entry: {}", usn.parent_record_number()),
    );
    sink.value(ENTRY, "USN", &usn.usn);
    sink.value(ENTRY, "timestamp", &format_filetime(usn.timestamp));
    sink.value(ENTRY, "reason", &format_args!("0x{:08x}", usn.reason));
    for name in describe_usn_reason_flags(usn.reason) {
        sink.value(ENTRY, "reason flag", &name);
    }
    sink.value(ENTRY, "name", &usn.file_name);
}

/// A fully decoded update journal entry list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateJournalEntryList {
    pub header: EntryListHeader,
    pub entries: Vec<JournalEntry>,
}

impl UpdateJournalEntryList {
    /// Decode the list header and every entry of `data`
    pub fn decode(data: &[u8], decoder: &dyn UsnDecoder, sink: &dyn DebugSink) -> Result<Self> {
        let header = EntryListHeader::parse(data)?;
        if sink.is_enabled() {
            header.report(sink);
        }
        let entries = header.entries(data, decoder, sink).collect::<Result<Vec<_>>>()?;
        Ok(Self { header, entries })
    }
}
