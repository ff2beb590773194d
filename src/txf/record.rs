//! Record decoding
//!
//! [`Record`] validates the header, cuts the buffer to the declared record
//! size and hands the rest to the entry list or generic body decoder.

use crate::config::DecodeOptions;
use crate::error::{Result, TxfError};
use crate::logging::LOG_TARGET;
use crate::txf::body::GenericBody;
use crate::txf::header::{check_data_size, RecordHeader, RECORD_HEADER_SIZE};
use crate::txf::journal::UpdateJournalEntryList;
use serde::Serialize;

/// The decoded body of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordBody {
    EntryList(UpdateJournalEntryList),
    Generic(GenericBody),
}

/// A decoded TxF log record
///
/// An empty record has no header. A successful decode fills every field and
/// a failed one leaves the record empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    size: u32,
    header: Option<RecordHeader>,
    body: Option<RecordBody>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a record in one step with default options
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut record = Self::new();
        record.decode(data)?;
        Ok(record)
    }

    /// Drop all decoded state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Decode `data` with default options, replacing any earlier contents
    pub fn decode(&mut self, data: &[u8]) -> Result<()> {
        self.decode_with(data, &DecodeOptions::default())
    }

    /// Decode `data`, replacing any earlier contents
    ///
    /// On error the record is reset.
    pub fn decode_with(&mut self, data: &[u8], options: &DecodeOptions<'_>) -> Result<()> {
        self.reset();
        match Self::decode_parts(data, options) {
            Ok((header, body)) => {
                self.size = header.record_size;
                self.header = Some(header);
                self.body = Some(body);
                Ok(())
            }
            Err(e) => {
                tracing::debug!(target: LOG_TARGET, error = %e, length = data.len(), "unable to decode record");
                Err(e)
            }
        }
    }

    fn decode_parts(data: &[u8], options: &DecodeOptions<'_>) -> Result<(RecordHeader, RecordBody)> {
        check_data_size(data.len(), options.max_data_size)?;

        let sink = options.sink;
        if sink.is_enabled() {
            sink.data("record", "record data", data);
        }

        let header = RecordHeader::from_bytes(data)?;
        if sink.is_enabled() {
            header.report(sink);
        }

        let declared = header.record_size as usize;
        if declared < RECORD_HEADER_SIZE || declared > data.len() {
            return Err(TxfError::out_of_bounds("record size", 0, declared, data.len()));
        }
        let data = &data[..declared];

        let body = if header.is_update_journal_entries_list() {
            RecordBody::EntryList(UpdateJournalEntryList::decode(data, options.usn_decoder, sink)?)
        } else {
            RecordBody::Generic(GenericBody::decode(data, header.kind, sink)?)
        };
        Ok((header, body))
    }

    /// Declared size of the record, 0 when empty
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_none()
    }

    pub fn header(&self) -> Option<&RecordHeader> {
        self.header.as_ref()
    }

    /// Kind code from the header
    pub fn kind(&self) -> Option<u16> {
        self.header.as_ref().map(|header| header.kind)
    }

    pub fn body(&self) -> Option<&RecordBody> {
        self.body.as_ref()
    }

    /// The entry list, for records of the entry list kind
    pub fn entry_list(&self) -> Option<&UpdateJournalEntryList> {
        match &self.body {
            Some(RecordBody::EntryList(list)) => Some(list),
            _ => None,
        }
    }

    /// The generic body, for every other kind
    pub fn generic_body(&self) -> Option<&GenericBody> {
        match &self.body {
            Some(RecordBody::Generic(body)) => Some(body),
            _ => None,
        }
    }

    /// Decoded name of a generic body, if it has one
    pub fn name(&self) -> Option<String> {
        self.generic_body().and_then(GenericBody::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;

    fn generic_record(kind: u16, size: usize) -> Vec<u8> {
        let mut data = vec![0u8; size];
        data[4..6].copy_from_slice(&kind.to_le_bytes());
        data[64..68].copy_from_slice(&(size as u32).to_le_bytes());
        data
    }

    #[test]
    fn new_record_is_empty() {
        let record = Record::new();
        assert!(record.is_empty());
        assert_eq!(record.size(), 0);
        assert!(record.body().is_none());
        assert_eq!(record, Record::default());
    }

    #[test]
    fn decode_generic_record() {
        let record = Record::from_bytes(&generic_record(0x00, 88)).unwrap();
        assert_eq!(record.size(), 88);
        assert_eq!(record.kind(), Some(0));
        assert!(record.entry_list().is_none());
        assert_eq!(record.generic_body().unwrap().unknown_leading, 0);
        assert!(record.name().is_none());
    }

    #[test]
    fn declared_size_bounds() {
        let mut data = generic_record(0x00, 88);
        data[64..68].copy_from_slice(&79u32.to_le_bytes());
        assert!(matches!(
            Record::from_bytes(&data),
            Err(TxfError::OutOfBounds { what: "record size", size: 79, .. })
        ));

        data[64..68].copy_from_slice(&89u32.to_le_bytes());
        assert!(matches!(
            Record::from_bytes(&data),
            Err(TxfError::OutOfBounds { what: "record size", size: 89, limit: 88, .. })
        ));
    }

    #[test]
    fn bytes_past_declared_size_are_ignored() {
        let mut data = generic_record(0x00, 88);
        data.extend_from_slice(&[0xff; 40]);
        let record = Record::from_bytes(&data).unwrap();
        assert_eq!(record.size(), 88);
    }

    #[test]
    fn body_reads_stop_at_declared_size() {
        // The name descriptor would sit past the declared size
        let mut data = generic_record(0x33, 88);
        data.extend_from_slice(&[0u8; 8]);
        assert!(matches!(
            Record::from_bytes(&data),
            Err(TxfError::OutOfBounds { what: "name descriptor", .. })
        ));
    }

    #[test]
    fn failed_decode_resets_record() {
        let mut record = Record::from_bytes(&generic_record(0x00, 88)).unwrap();
        assert!(!record.is_empty());

        let err = record.decode(&[0u8; 12]).unwrap_err();
        assert!(matches!(err, TxfError::TooSmall { got: 12, .. }));
        assert!(record.is_empty());
        assert_eq!(record.size(), 0);
    }

    #[test]
    fn redecode_replaces_state() {
        let mut record = Record::from_bytes(&generic_record(0x00, 88)).unwrap();
        record.decode(&generic_record(0x15, 96)).unwrap();
        assert_eq!(record.kind(), Some(0x15));
        assert_eq!(record.size(), 96);

        record.reset();
        record.reset();
        assert!(record.is_empty());
    }

    #[test]
    fn maximum_is_checked_first() {
        let options = DecodeOptions::new().with_max_data_size(64);
        let mut record = Record::new();
        assert!(matches!(
            record.decode_with(&generic_record(0x00, 88), &options),
            Err(TxfError::ExceedsMaximum { value: 88, maximum: 64, .. })
        ));
        // Below the header size as well, but the maximum wins
        let options = DecodeOptions::new().with_max_data_size(8);
        assert!(matches!(
            record.decode_with(&[0u8; 16], &options),
            Err(TxfError::ExceedsMaximum { .. })
        ));
    }

    #[test]
    fn sink_sees_header_and_body() {
        let sink = MemorySink::new();
        let options = DecodeOptions::new().with_sink(&sink);
        let mut record = Record::new();
        record.decode_with(&generic_record(0x15, 96), &options).unwrap();

        let lines = sink.take();
        assert!(lines[0].starts_with("record: record data:\n"));
        assert!(lines.iter().any(|line| line == "record header: record size: 96"));
        assert!(lines.iter().any(|line| line.starts_with("record body: unknown leading value")));
    }

    #[test]
    fn serializes_body_with_type_tag() {
        let record = Record::from_bytes(&generic_record(0x15, 96)).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["size"], 96);
        assert_eq!(json["body"]["type"], "generic");
        assert_eq!(json["header"]["kind"], 0x15);
    }
}
