//! USN change journal records
//!
//! Update journal entry lists embed one USN record per entry. The record
//! declares its own length, which tells the list walker how far to advance.

use crate::error::UsnError;
use crate::ntfs::structs::{mft_entry, utf16le_to_string};
use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;
use std::io::Cursor;

/// Fixed part of a version 2 record
pub const USN_RECORD_V2_HEADER_SIZE: usize = 60;

/// Fixed part of a version 3 record
pub const USN_RECORD_V3_HEADER_SIZE: usize = 76;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsnRecord {
    pub record_length: u32,
    pub major_version: u16,
    pub minor_version: u16,
    /// Lower 64 bits for version 3 records
    pub file_reference_number: u64,
    /// Lower 64 bits for version 3 records
    pub parent_file_reference_number: u64,
    pub usn: u64,
    pub timestamp: u64,
    pub reason: u32,
    pub source_info: u32,
    pub security_id: u32,
    pub file_attributes: u32,
    pub file_name_length: u16,
    pub file_name_offset: u16,
    pub file_name: String,
}

impl UsnRecord {
    /// Parse a USN record (V2 or V3) from the start of `data`
    ///
    /// `data` may extend past the record; only `record_length` bytes belong to it.
    pub fn from_bytes(data: &[u8]) -> Result<Self, UsnError> {
        if data.len() < 8 {
            return Err(UsnError::TooSmall { needed: 8, got: data.len() });
        }

        let mut cursor = Cursor::new(data);
        let record_length = read_u32(&mut cursor)?;
        let major_version = read_u16(&mut cursor)?;
        let minor_version = read_u16(&mut cursor)?;

        let header_size = match major_version {
            2 => USN_RECORD_V2_HEADER_SIZE,
            3 => USN_RECORD_V3_HEADER_SIZE,
            other => return Err(UsnError::UnsupportedVersion(other)),
        };
        if data.len() < header_size {
            return Err(UsnError::TooSmall { needed: header_size, got: data.len() });
        }
        if (record_length as usize) < header_size || record_length as usize > data.len() {
            return Err(UsnError::RecordLengthOutOfBounds {
                length: record_length,
                minimum: header_size,
                available: data.len(),
            });
        }

        let (file_reference_number, parent_file_reference_number) = if major_version == 3 {
            // V3 layout: 128-bit file references
            // Offset 8: FileReferenceNumber (16 bytes)
            // Offset 24: ParentFileReferenceNumber (16 bytes)
            let file_ref = read_u64(&mut cursor)?;
            let _file_ref_high = read_u64(&mut cursor)?;
            let parent_ref = read_u64(&mut cursor)?;
            let _parent_ref_high = read_u64(&mut cursor)?;
            (file_ref, parent_ref)
        } else {
            // V2 layout: 64-bit file references
            // Offset 8: FileReferenceNumber (8 bytes)
            // Offset 16: ParentFileReferenceNumber (8 bytes)
            (read_u64(&mut cursor)?, read_u64(&mut cursor)?)
        };

        // Shared tail: Usn, TimeStamp, Reason, SourceInfo, SecurityId,
        // FileAttributes, FileNameLength, FileNameOffset
        let usn = read_u64(&mut cursor)?;
        let timestamp = read_u64(&mut cursor)?;
        let reason = read_u32(&mut cursor)?;
        let source_info = read_u32(&mut cursor)?;
        let security_id = read_u32(&mut cursor)?;
        let file_attributes = read_u32(&mut cursor)?;
        let file_name_length = read_u16(&mut cursor)?;
        let file_name_offset = read_u16(&mut cursor)?;

        let name_start = file_name_offset as usize;
        let name_end = name_start + file_name_length as usize;
        if name_end > record_length as usize {
            return Err(UsnError::NameOutOfBounds {
                offset: file_name_offset,
                size: file_name_length,
                length: record_length,
            });
        }
        let file_name = utf16le_to_string(&data[name_start..name_end]);

        Ok(Self {
            record_length,
            major_version,
            minor_version,
            file_reference_number,
            parent_file_reference_number,
            usn,
            timestamp,
            reason,
            source_info,
            security_id,
            file_attributes,
            file_name_length,
            file_name_offset,
            file_name,
        })
    }

    /// Number of bytes this record occupies
    pub fn size(&self) -> usize {
        self.record_length as usize
    }

    /// Get file reference number (lower 48 bits)
    pub fn file_record_number(&self) -> u64 {
        mft_entry(self.file_reference_number)
    }

    /// Get parent reference number (lower 48 bits)
    pub fn parent_record_number(&self) -> u64 {
        mft_entry(self.parent_file_reference_number)
    }
}

fn read_u16(cursor: &mut Cursor<&[u8]>) -> Result<u16, UsnError> {
    cursor.read_u16::<LittleEndian>().map_err(|_| truncated(cursor))
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32, UsnError> {
    cursor.read_u32::<LittleEndian>().map_err(|_| truncated(cursor))
}

fn read_u64(cursor: &mut Cursor<&[u8]>) -> Result<u64, UsnError> {
    cursor.read_u64::<LittleEndian>().map_err(|_| truncated(cursor))
}

fn truncated(cursor: &Cursor<&[u8]>) -> UsnError {
    UsnError::TooSmall {
        needed: cursor.position() as usize + 1,
        got: cursor.get_ref().len(),
    }
}

// ============================================================================
// Sub-record decoder seam
// ============================================================================

/// Decodes the sub-record embedded in each journal entry
///
/// Implementations must report, through [`UsnRecord::size`], how many bytes
/// of `data` the record occupies. The entry-list walker rejects a size of
/// zero or one larger than `data`.
pub trait UsnDecoder {
    fn decode(&self, data: &[u8]) -> Result<UsnRecord, UsnError>;
}

/// The default decoder: [`UsnRecord::from_bytes`]
#[derive(Debug, Clone, Copy, Default)]
pub struct UsnRecordDecoder;

impl UsnDecoder for UsnRecordDecoder {
    fn decode(&self, data: &[u8]) -> Result<UsnRecord, UsnError> {
        UsnRecord::from_bytes(data)
    }
}

impl<F> UsnDecoder for F
where
    F: Fn(&[u8]) -> Result<UsnRecord, UsnError>,
{
    fn decode(&self, data: &[u8]) -> Result<UsnRecord, UsnError> {
        self(data)
    }
}

/// Reason flags of a USN record
pub mod usn_reason {
    pub const DATA_OVERWRITE: u32 = 0x00000001;
    pub const DATA_EXTEND: u32 = 0x00000002;
    pub const DATA_TRUNCATION: u32 = 0x00000004;
    pub const NAMED_DATA_OVERWRITE: u32 = 0x00000010;
    pub const NAMED_DATA_EXTEND: u32 = 0x00000020;
    pub const NAMED_DATA_TRUNCATION: u32 = 0x00000040;
    pub const FILE_CREATE: u32 = 0x00000100;
    pub const FILE_DELETE: u32 = 0x00000200;
    pub const EA_CHANGE: u32 = 0x00000400;
    pub const SECURITY_CHANGE: u32 = 0x00000800;
    pub const RENAME_OLD_NAME: u32 = 0x00001000;
    pub const RENAME_NEW_NAME: u32 = 0x00002000;
    pub const INDEXABLE_CHANGE: u32 = 0x00004000;
    pub const BASIC_INFO_CHANGE: u32 = 0x00008000;
    pub const HARD_LINK_CHANGE: u32 = 0x00010000;
    pub const COMPRESSION_CHANGE: u32 = 0x00020000;
    pub const ENCRYPTION_CHANGE: u32 = 0x00040000;
    pub const OBJECT_ID_CHANGE: u32 = 0x00080000;
    pub const REPARSE_POINT_CHANGE: u32 = 0x00100000;
    pub const STREAM_CHANGE: u32 = 0x00200000;
    pub const TRANSACTED_CHANGE: u32 = 0x00400000;
    pub const CLOSE: u32 = 0x80000000;

    /// Short names in bit order
    pub const NAMES: &[(u32, &str)] = &[
        (DATA_OVERWRITE, "data overwrite"),
        (DATA_EXTEND, "data extend"),
        (DATA_TRUNCATION, "data truncation"),
        (NAMED_DATA_OVERWRITE, "named data overwrite"),
        (NAMED_DATA_EXTEND, "named data extend"),
        (NAMED_DATA_TRUNCATION, "named data truncation"),
        (FILE_CREATE, "file create"),
        (FILE_DELETE, "file delete"),
        (EA_CHANGE, "extended attribute change"),
        (SECURITY_CHANGE, "security change"),
        (RENAME_OLD_NAME, "rename old name"),
        (RENAME_NEW_NAME, "rename new name"),
        (INDEXABLE_CHANGE, "indexable change"),
        (BASIC_INFO_CHANGE, "basic info change"),
        (HARD_LINK_CHANGE, "hard link change"),
        (COMPRESSION_CHANGE, "compression change"),
        (ENCRYPTION_CHANGE, "encryption change"),
        (OBJECT_ID_CHANGE, "object identifier change"),
        (REPARSE_POINT_CHANGE, "reparse point change"),
        (STREAM_CHANGE, "stream change"),
        (TRANSACTED_CHANGE, "transacted change"),
        (CLOSE, "close"),
    ];
}

/// Decompose USN reason flags into their names
///
/// Bits without a known name are reported once as a hexadecimal remainder.
pub fn describe_usn_reason_flags(reason: u32) -> Vec<String> {
    let mut names = Vec::new();
    let mut known = 0u32;

    for &(flag, name) in usn_reason::NAMES {
        known |= flag;
        if reason & flag != 0 {
            names.push(name.to_string());
        }
    }

    let unknown = reason & !known;
    if unknown != 0 {
        names.push(format!("unknown 0x{:08x}", unknown));
    }
    names
}
