//! Integration tests for record decoding

use proptest::collection::vec;
use proptest::prelude::*;
use txfrecord::ntfs::usn::usn_reason;
use txfrecord::{
    check_data_size, DecodeOptions, ErrorDomain, MemorySink, Record, RecordBody, TxfError,
    UsnError, UsnRecord, DEFAULT_MAX_DATA_SIZE,
};

const NAME: &str = "transaction_log_00.txt";

fn put_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u64(data: &mut [u8], offset: usize, value: u64) {
    data[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

fn record_header(kind: u16, size: u32) -> Vec<u8> {
    let mut data = vec![0u8; 80];
    put_u16(&mut data, 4, kind);
    put_u64(&mut data, 16, 0x0001_0000_0000_0040);
    put_u64(&mut data, 56, 130_960_800_000_000_000);
    put_u32(&mut data, 64, size);
    data
}

/// A version 2 USN record naming `name`
fn usn_v2(name: &str) -> Vec<u8> {
    let name: Vec<u8> = name.encode_utf16().flat_map(u16::to_le_bytes).collect();
    let length = 60 + name.len();
    let mut data = vec![0u8; length];
    put_u32(&mut data, 0, length as u32);
    put_u16(&mut data, 4, 2);
    put_u64(&mut data, 8, 0x0003_0000_0000_1a2b);
    put_u64(&mut data, 16, 0x0005_0000_0000_0005);
    put_u64(&mut data, 24, 0x2f40);
    put_u64(&mut data, 32, 130_960_800_000_000_000);
    put_u32(&mut data, 40, usn_reason::FILE_CREATE | usn_reason::TRANSACTED_CHANGE);
    put_u32(&mut data, 52, 0x20);
    put_u16(&mut data, 56, name.len() as u16);
    put_u16(&mut data, 58, 60);
    data[60..].copy_from_slice(&name);
    data
}

/// A 208-byte update journal entries list holding one entry
fn entry_list_record() -> Vec<u8> {
    let mut data = record_header(0x0017, 208);
    data.extend_from_slice(&[0u8; 16]);
    put_u64(&mut data, 80, 0);
    put_u32(&mut data, 88, 96);
    put_u32(&mut data, 92, 112);
    data.extend_from_slice(&0x0b49u64.to_le_bytes());
    data.extend_from_slice(&usn_v2(NAME));
    assert_eq!(data.len(), 208);
    data
}

#[test]
fn decode_update_journal_entries_list() {
    let record = Record::from_bytes(&entry_list_record()).unwrap();
    assert_eq!(record.size(), 208);
    assert_eq!(record.kind(), Some(0x0017));
    assert!(record.generic_body().is_none());

    let list = record.entry_list().unwrap();
    assert_eq!(list.header.next_lsn, 0);
    assert_eq!(list.header.entries_offset, 96);
    assert_eq!(list.header.entries_length, 112);
    assert_eq!(list.entries.len(), 1);

    let entry = &list.entries[0];
    assert_eq!(entry.unknown, 0x0b49);
    assert_eq!(entry.offset, 104);
    assert_eq!(entry.size, 104);
    assert_eq!(entry.offset + entry.size, 208);
    assert_eq!(entry.usn.file_name, NAME);
    assert_eq!(entry.usn.file_record_number(), 0x1a2b);
    assert_eq!(entry.usn.parent_record_number(), 5);
    assert_ne!(entry.usn.reason & usn_reason::TRANSACTED_CHANGE, 0);
}

#[test]
fn empty_buffer_is_too_small() {
    let data = entry_list_record();
    let mut record = Record::new();
    let err = record.decode(&data[..0]).unwrap_err();
    assert!(matches!(err, TxfError::TooSmall { needed: 80, got: 0, .. }));
    assert_eq!(err.domain(), ErrorDomain::Arguments);
    assert!(record.is_empty());
}

#[test]
fn entries_offset_inside_list_header_is_rejected() {
    let mut data = entry_list_record();
    put_u32(&mut data, 88, 95);
    let err = Record::from_bytes(&data).unwrap_err();
    assert!(matches!(err, TxfError::OutOfBounds { what: "entries offset", .. }));
    assert!(err.is_malformed_input());
}

#[test]
fn oversized_buffer_exceeds_maximum() {
    let err = check_data_size(isize::MAX as usize + 1, DEFAULT_MAX_DATA_SIZE).unwrap_err();
    assert!(matches!(err, TxfError::ExceedsMaximum { .. }));

    // A configured maximum is applied before the header is looked at
    let options = DecodeOptions::new().with_max_data_size(207);
    let mut record = Record::new();
    let err = record.decode_with(&entry_list_record(), &options).unwrap_err();
    assert!(matches!(err, TxfError::ExceedsMaximum { value: 208, maximum: 207, .. }));
}

#[test]
fn kind_0x15_skips_name_extraction() {
    // The descriptor points far outside the record
    let mut data = record_header(0x15, 96);
    data.extend_from_slice(&0x77u64.to_le_bytes());
    data.extend_from_slice(&[0xff; 8]);
    let record = Record::from_bytes(&data).unwrap();
    let body = record.generic_body().unwrap();
    assert_eq!(body.unknown_leading, 0x77);
    assert_eq!(body.name_descriptor.unwrap().name_length, 0xffff);
    assert!(body.name_data.is_none());
    assert!(record.name().is_none());
}

#[test]
fn short_entry_list_is_malformed_input() {
    let mut data = record_header(0x0017, 88);
    data.extend_from_slice(&[0u8; 8]);
    let err = Record::from_bytes(&data).unwrap_err();
    assert!(matches!(
        err,
        TxfError::RecordTooSmall { needed: 96, declared: 88, .. }
    ));
    assert_eq!(err.domain(), ErrorDomain::Input);
    assert!(err.is_malformed_input());
}

#[test]
fn decode_file_information_record() {
    let name: Vec<u8> = "ledger.db".encode_utf16().flat_map(u16::to_le_bytes).collect();
    let size = 80 + 92 + name.len();
    let mut data = record_header(0x02, size as u32);
    data.resize(80 + 92, 0);
    put_u64(&mut data, 80, 1);
    put_u16(&mut data, 88, 9);
    put_u16(&mut data, 90, 172);
    put_u64(&mut data, 120, 130_960_800_000_000_000);
    put_u64(&mut data, 152, 8192);
    put_u64(&mut data, 160, 5000);
    put_u32(&mut data, 168, 0x2020);
    data.extend_from_slice(&name);

    let record = Record::from_bytes(&data).unwrap();
    assert_eq!(record.name().as_deref(), Some("ledger.db"));
    let body = record.generic_body().unwrap();
    assert_eq!(body.file_times.unwrap().creation, 130_960_800_000_000_000);
    assert_eq!(body.file_sizes.unwrap().data_size, 5000);
    assert_eq!(body.file_attributes, Some(0x2020));
}

#[test]
fn trailing_bytes_after_list_are_ignored() {
    let mut data = entry_list_record();
    data.extend_from_slice(&[0xee; 32]);
    let record = Record::from_bytes(&data).unwrap();
    assert_eq!(record.entry_list().unwrap().entries.len(), 1);
}

#[test]
fn reset_after_failure() {
    let mut record = Record::from_bytes(&entry_list_record()).unwrap();
    let mut data = entry_list_record();
    put_u16(&mut data, 104 + 4, 9);
    let err = record.decode(&data).unwrap_err();
    assert_eq!(
        err,
        TxfError::InputFailed { offset: 104, source: UsnError::UnsupportedVersion(9) }
    );
    assert_eq!(err.domain(), ErrorDomain::Io);
    assert!(record.is_empty());
    assert!(record.body().is_none());
}

#[test]
fn custom_usn_decoder() {
    let decoder = |data: &[u8]| -> Result<UsnRecord, UsnError> {
        Ok(UsnRecord {
            record_length: data.len() as u32,
            file_name: "stub".to_string(),
            ..Default::default()
        })
    };
    let options = DecodeOptions::new().with_usn_decoder(&decoder);
    let mut record = Record::new();
    record.decode_with(&entry_list_record(), &options).unwrap();
    assert_eq!(record.entry_list().unwrap().entries[0].usn.file_name, "stub");
}

#[test]
fn debug_sink_receives_every_layer() {
    let sink = MemorySink::new();
    let options = DecodeOptions::new().with_sink(&sink);
    let mut record = Record::new();
    record.decode_with(&entry_list_record(), &options).unwrap();

    let lines = sink.take();
    assert!(lines.iter().any(|l| l == "record header: record type: 0x0017"));
    assert!(lines.iter().any(|l| l == "update journal entries list: entries length: 112"));
    assert!(lines.iter().any(|l| l == &format!("update journal entry: name: {}", NAME)));
    assert!(lines.iter().any(|l| l == "update journal entry: reason flag: transacted change"));
}

#[test]
fn json_output_shape() {
    let record = Record::from_bytes(&entry_list_record()).unwrap();
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["body"]["type"], "entry_list");
    assert_eq!(json["body"]["entries"][0]["usn"]["file_name"], NAME);
    assert!(matches!(record.body(), Some(RecordBody::EntryList(_))));
}

proptest! {
    #[test]
    fn short_buffers_are_too_small(data in vec(any::<u8>(), 0..80)) {
        let mut record = Record::new();
        let err = record.decode(&data).unwrap_err();
        let is_too_small = matches!(err, TxfError::TooSmall { .. });
        prop_assert!(is_too_small);
        prop_assert!(record.is_empty());
    }

    #[test]
    fn declared_size_past_buffer_is_out_of_bounds(length in 80usize..208) {
        let data = entry_list_record();
        let err = Record::from_bytes(&data[..length]).unwrap_err();
        let is_out_of_bounds = matches!(err, TxfError::OutOfBounds { what: "record size", .. });
        prop_assert!(is_out_of_bounds);
    }

    #[test]
    fn crafted_list_fields_never_panic(
        offset in any::<u32>(),
        length in any::<u32>(),
        usn_length in any::<u32>(),
        name_offset in any::<u16>(),
        name_length in any::<u16>(),
    ) {
        let mut data = entry_list_record();
        put_u32(&mut data, 88, offset);
        put_u32(&mut data, 92, length);
        put_u32(&mut data, 104, usn_length);
        put_u16(&mut data, 104 + 56, name_length);
        put_u16(&mut data, 104 + 58, name_offset);

        if let Ok(record) = Record::from_bytes(&data) {
            let list = record.entry_list().unwrap();
            prop_assert!(list.header.entries_offset >= 96);
            prop_assert!(list.header.entries_offset <= 208);
            for entry in &list.entries {
                prop_assert!(entry.size > 0);
                prop_assert!(entry.offset + entry.size <= 208);
            }
        }
    }

    #[test]
    fn crafted_name_fields_never_panic(
        kind in prop::sample::select(vec![0x00u16, 0x02, 0x07, 0x0b, 0x15, 0x33]),
        body in vec(any::<u8>(), 0..160),
    ) {
        let mut data = record_header(kind, (80 + body.len()) as u32);
        data.extend_from_slice(&body);

        if let Ok(record) = Record::from_bytes(&data) {
            let body = record.generic_body().unwrap();
            if let (Some(name), Some(descriptor)) = (&body.name_data, &body.name_descriptor) {
                prop_assert_eq!(name.len(), descriptor.name_length as usize * 2);
                prop_assert!(descriptor.name_offset as usize + name.len() <= data.len());
            }
        }
    }

    #[test]
    fn decoding_is_deterministic(
        kind in any::<u16>(),
        body in vec(any::<u8>(), 0..256),
    ) {
        let mut data = record_header(kind, (80 + body.len()) as u32);
        data.extend_from_slice(&body);

        let first = Record::from_bytes(&data);
        let second = Record::from_bytes(&data);
        prop_assert_eq!(first, second);
    }
}
