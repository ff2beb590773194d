//! NTFS value types and decoders shared by TxF and USN records

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

// ============================================================================
// File References
// ============================================================================

/// Mask selecting the MFT entry index (lower 48 bits) of a file reference
pub const MFT_ENTRY_MASK: u64 = 0x0000_FFFF_FFFF_FFFF;

/// Get the MFT entry index of a file reference (lower 48 bits)
pub fn mft_entry(file_reference: u64) -> u64 {
    file_reference & MFT_ENTRY_MASK
}

/// Get the sequence number of a file reference (upper 16 bits)
pub fn sequence_number(file_reference: u64) -> u16 {
    (file_reference >> 48) as u16
}

// ============================================================================
// FILETIME conversion utilities
// ============================================================================

/// Difference between 1601-01-01 and 1970-01-01 in 100-nanosecond intervals
const EPOCH_DIFF: u64 = 116_444_736_000_000_000;

/// Convert Windows FILETIME (100-nanosecond intervals since 1601) to chrono DateTime
///
/// Values before the Unix epoch yield `None`.
pub fn filetime_to_datetime(filetime: u64) -> Option<DateTime<Utc>> {
    let since_unix = filetime.checked_sub(EPOCH_DIFF)?;
    let seconds = (since_unix / 10_000_000) as i64;
    let nanoseconds = ((since_unix % 10_000_000) * 100) as u32;
    Utc.timestamp_opt(seconds, nanoseconds).single()
}

/// Format a FILETIME with nanosecond precision, or the raw value if it is out of range
pub fn format_filetime(filetime: u64) -> String {
    match filetime_to_datetime(filetime) {
        Some(datetime) => datetime.format("%b %d, %Y %H:%M:%S%.9f UTC").to_string(),
        None if filetime == 0 => String::from("Not set (0)"),
        None => format!("0x{:016x}", filetime),
    }
}

// ============================================================================
// GUID
// ============================================================================

/// Decode a little-endian (Windows layout) GUID
pub fn guid_from_bytes(bytes: [u8; 16]) -> Uuid {
    Uuid::from_bytes_le(bytes)
}

// ============================================================================
// UTF-16 names
// ============================================================================

/// Transcode a UTF-16LE byte stream, replacing invalid sequences
///
/// A trailing odd byte is ignored.
pub fn utf16le_to_string(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

// ============================================================================
// File Attributes
// ============================================================================

pub mod file_attributes {
    pub const READONLY: u32 = 0x00000001;
    pub const HIDDEN: u32 = 0x00000002;
    pub const SYSTEM: u32 = 0x00000004;
    pub const DIRECTORY: u32 = 0x00000010;
    pub const ARCHIVE: u32 = 0x00000020;
    pub const DEVICE: u32 = 0x00000040;
    pub const NORMAL: u32 = 0x00000080;
    pub const TEMPORARY: u32 = 0x00000100;
    pub const SPARSE_FILE: u32 = 0x00000200;
    pub const REPARSE_POINT: u32 = 0x00000400;
    pub const COMPRESSED: u32 = 0x00000800;
    pub const OFFLINE: u32 = 0x00001000;
    pub const NOT_CONTENT_INDEXED: u32 = 0x00002000;
    pub const ENCRYPTED: u32 = 0x00004000;
    pub const VIRTUAL: u32 = 0x00010000;

    /// Flag names in bit order
    pub const NAMES: &[(u32, &str)] = &[
        (READONLY, "Is read-only (FILE_ATTRIBUTE_READ_ONLY)"),
        (HIDDEN, "Is hidden (FILE_ATTRIBUTE_HIDDEN)"),
        (SYSTEM, "Is system (FILE_ATTRIBUTE_SYSTEM)"),
        (DIRECTORY, "Is directory (FILE_ATTRIBUTE_DIRECTORY)"),
        (ARCHIVE, "Should be archived (FILE_ATTRIBUTE_ARCHIVE)"),
        (DEVICE, "Is device (FILE_ATTRIBUTE_DEVICE)"),
        (NORMAL, "Is normal (FILE_ATTRIBUTE_NORMAL)"),
        (TEMPORARY, "Is temporary (FILE_ATTRIBUTE_TEMPORARY)"),
        (SPARSE_FILE, "Is a sparse file (FILE_ATTRIBUTE_SPARSE_FILE)"),
        (REPARSE_POINT, "Is a reparse point or symbolic link (FILE_ATTRIBUTE_FLAG_REPARSE_POINT)"),
        (COMPRESSED, "Is compressed (FILE_ATTRIBUTE_COMPRESSED)"),
        (OFFLINE, "Is offline (FILE_ATTRIBUTE_OFFLINE)"),
        (NOT_CONTENT_INDEXED, "Content should not be indexed (FILE_ATTRIBUTE_NOT_CONTENT_INDEXED)"),
        (ENCRYPTED, "Is encrypted (FILE_ATTRIBUTE_ENCRYPTED)"),
        (VIRTUAL, "Is virtual (FILE_ATTRIBUTE_VIRTUAL)"),
    ];
}

/// Decompose file attribute flags into their names
///
/// Bits without a known name are reported once as a hexadecimal remainder.
pub fn describe_file_attribute_flags(flags: u32) -> Vec<String> {
    let mut names = Vec::new();
    let mut known = 0u32;

    for &(flag, name) in file_attributes::NAMES {
        known |= flag;
        if flags & flag != 0 {
            names.push(name.to_string());
        }
    }

    let unknown = flags & !known;
    if unknown != 0 {
        names.push(format!("Unknown flags: 0x{:08x}", unknown));
    }
    names
}
