//! NTFS structures shared by the TxF decoder
//!
//! - File references, FILETIME, GUID and UTF-16 name decoding
//! - File attribute flags
//! - USN change journal records embedded in update journal entry lists

pub mod structs;
pub mod usn;

// Re-export commonly used types
pub use structs::{
    describe_file_attribute_flags, filetime_to_datetime, format_filetime, guid_from_bytes,
    mft_entry, sequence_number, utf16le_to_string,
};
pub use usn::{describe_usn_reason_flags, UsnDecoder, UsnRecord, UsnRecordDecoder};
