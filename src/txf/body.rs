//! Generic record bodies
//!
//! Every kind other than the update journal entry list shares one body
//! grammar: a leading 8-byte value, usually a name descriptor, and a tail
//! that depends on the kind. The per-kind layout lives in [`SCHEMA_TABLE`]
//! and is evaluated by [`GenericBody::decode`].

use crate::error::{Result, TxfError};
use crate::logging::DebugSink;
use crate::ntfs::structs::{describe_file_attribute_flags, format_filetime, utf16le_to_string};
use crate::txf::cursor::BoundedCursor;
use crate::txf::header::RECORD_HEADER_SIZE;
use serde::Serialize;

/// A typed field read by the body interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyField {
    /// Opaque 8-byte value present in every body
    Leading,
    /// Name length, name offset and an opaque 4-byte value
    Name,
    /// 24 opaque bytes
    Reserved,
    /// Creation, modification, entry modification and access FILETIMEs
    Times,
    /// Allocated size then data size
    Sizes,
    Attributes,
    /// Opaque 8-byte value after the name descriptor
    Trailing,
}

impl BodyField {
    /// Number of bytes the field occupies
    pub const fn size(self) -> usize {
        match self {
            BodyField::Leading => 8,
            BodyField::Name => 8,
            BodyField::Reserved => 24,
            BodyField::Times => 32,
            BodyField::Sizes => 16,
            BodyField::Attributes => 4,
            BodyField::Trailing => 8,
        }
    }
}

/// Ordered field list for one record kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodySchema {
    pub fields: &'static [BodyField],
    /// Whether the name referenced by the descriptor is copied out
    pub reads_name: bool,
}

impl BodySchema {
    /// Bytes the schema reads after the record header, name excluded
    pub fn fixed_size(&self) -> usize {
        self.fields.iter().map(|field| field.size()).sum()
    }
}

const FILE_INFORMATION: &[BodyField] = &[
    BodyField::Leading,
    BodyField::Name,
    BodyField::Reserved,
    BodyField::Times,
    BodyField::Sizes,
    BodyField::Attributes,
];

/// Kinds with a dedicated layout
pub const SCHEMA_TABLE: &[(u16, BodySchema)] = &[
    (0x00, BodySchema { fields: &[BodyField::Leading], reads_name: false }),
    (0x02, BodySchema { fields: FILE_INFORMATION, reads_name: true }),
    (
        0x07,
        BodySchema {
            fields: &[
                BodyField::Leading,
                BodyField::Name,
                BodyField::Times,
                BodyField::Sizes,
                BodyField::Attributes,
            ],
            reads_name: true,
        },
    ),
    (
        0x0b,
        BodySchema {
            fields: &[BodyField::Leading, BodyField::Name, BodyField::Trailing],
            reads_name: true,
        },
    ),
    // The descriptor is kept but the name it points at is not copied
    (
        0x15,
        BodySchema {
            fields: &[BodyField::Leading, BodyField::Name],
            reads_name: false,
        },
    ),
];

/// Layout of every kind missing from [`SCHEMA_TABLE`]
pub const DEFAULT_SCHEMA: BodySchema = BodySchema {
    fields: &[BodyField::Leading, BodyField::Name],
    reads_name: true,
};

/// Look up the body layout of a record kind
pub fn schema_for(kind: u16) -> BodySchema {
    SCHEMA_TABLE
        .iter()
        .find(|(code, _)| *code == kind)
        .map(|(_, schema)| *schema)
        .unwrap_or(DEFAULT_SCHEMA)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NameDescriptor {
    /// Length in UTF-16 code units
    pub name_length: u16,
    /// Absolute offset into the record
    pub name_offset: u16,
    pub unknown: u32,
}

impl NameDescriptor {
    pub fn name_size(&self) -> usize {
        self.name_length as usize * 2
    }
}

/// Raw FILETIME values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileTimes {
    pub creation: u64,
    pub modification: u64,
    pub entry_modification: u64,
    pub access: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileSizes {
    pub allocated_size: u64,
    pub data_size: u64,
}

/// Body of a record that is not an update journal entry list
///
/// Fields the record's schema does not contain are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenericBody {
    pub unknown_leading: u64,
    pub name_descriptor: Option<NameDescriptor>,
    pub reserved: Option<[u8; 24]>,
    pub file_times: Option<FileTimes>,
    pub file_sizes: Option<FileSizes>,
    pub file_attributes: Option<u32>,
    pub unknown_trailing: Option<u64>,
    /// Raw UTF-16LE name bytes
    pub name_data: Option<Vec<u8>>,
}

const SCOPE: &str = "record body";

impl GenericBody {
    /// Decode the body following the record header
    ///
    /// `data` must already be cut to the declared record size, which bounds
    /// every read including the name.
    pub fn decode(data: &[u8], kind: u16, sink: &dyn DebugSink) -> Result<Self> {
        let schema = schema_for(kind);
        let mut cursor = BoundedCursor::at(data, RECORD_HEADER_SIZE)?;
        let mut body = GenericBody::default();

        for field in schema.fields {
            body.read_field(*field, &mut cursor, sink)?;
        }

        if !schema.reads_name {
            return Ok(body);
        }
        if let Some(descriptor) = body.name_descriptor.filter(|d| d.name_length > 0) {
            let offset = descriptor.name_offset as usize;
            let size = descriptor.name_size();
            if offset + size > data.len() {
                return Err(TxfError::out_of_bounds("name", offset, size, data.len()));
            }
            let name_data = &data[offset..offset + size];
            if sink.is_enabled() {
                sink.data(SCOPE, "name data", name_data);
                sink.value(SCOPE, "name", &utf16le_to_string(name_data));
            }
            body.name_data = Some(name_data.to_vec());
        }
        Ok(body)
    }

    fn read_field(
        &mut self,
        field: BodyField,
        cursor: &mut BoundedCursor<'_>,
        sink: &dyn DebugSink,
    ) -> Result<()> {
        // A short field fails before any of it is consumed
        cursor.ensure(field_name(field), field.size())?;

        match field {
            BodyField::Leading => {
                self.unknown_leading = cursor.read_u64("unknown leading value")?;
                if sink.is_enabled() {
                    sink.value(SCOPE, "unknown leading value", &format_args!("0x{:016x}", self.unknown_leading));
                }
            }
            BodyField::Name => {
                let descriptor = NameDescriptor {
                    name_length: cursor.read_u16("name length")?,
                    name_offset: cursor.read_u16("name offset")?,
                    unknown: cursor.read_u32("name descriptor")?,
                };
                if sink.is_enabled() {
                    sink.value(SCOPE, "name size", &descriptor.name_size());
                    sink.value(SCOPE, "name offset", &format_args!("0x{:04x}", descriptor.name_offset));
                    sink.value(SCOPE, "unknown descriptor value", &format_args!("0x{:08x}", descriptor.unknown));
                }
                self.name_descriptor = Some(descriptor);
            }
            BodyField::Reserved => {
                let reserved: [u8; 24] = cursor.read_array("reserved data")?;
                if sink.is_enabled() {
                    sink.data(SCOPE, "reserved data", &reserved);
                }
                self.reserved = Some(reserved);
            }
            BodyField::Times => {
                let times = FileTimes {
                    creation: cursor.read_u64("creation time")?,
                    modification: cursor.read_u64("modification time")?,
                    entry_modification: cursor.read_u64("entry modification time")?,
                    access: cursor.read_u64("access time")?,
                };
                if sink.is_enabled() {
                    sink.value(SCOPE, "creation time", &format_filetime(times.creation));
                    sink.value(SCOPE, "modification time", &format_filetime(times.modification));
                    sink.value(SCOPE, "entry modification time", &format_filetime(times.entry_modification));
                    sink.value(SCOPE, "access time", &format_filetime(times.access));
                }
                self.file_times = Some(times);
            }
            BodyField::Sizes => {
                let sizes = FileSizes {
                    allocated_size: cursor.read_u64("allocated size")?,
                    data_size: cursor.read_u64("data size")?,
                };
                if sink.is_enabled() {
                    sink.value(SCOPE, "allocated size", &sizes.allocated_size);
                    sink.value(SCOPE, "data size", &sizes.data_size);
                }
                self.file_sizes = Some(sizes);
            }
            BodyField::Attributes => {
                let flags = cursor.read_u32("file attribute flags")?;
                if sink.is_enabled() {
                    sink.value(SCOPE, "file attribute flags", &format_args!("0x{:08x}", flags));
                    for name in describe_file_attribute_flags(flags) {
                        sink.value(SCOPE, "attribute", &name);
                    }
                }
                self.file_attributes = Some(flags);
            }
            BodyField::Trailing => {
                let value = cursor.read_u64("unknown trailing value")?;
                if sink.is_enabled() {
                    sink.value(SCOPE, "unknown trailing value", &format_args!("0x{:016x}", value));
                }
                self.unknown_trailing = Some(value);
            }
        }
        Ok(())
    }

    /// Decode the name to a string, replacing invalid UTF-16
    pub fn name(&self) -> Option<String> {
        self.name_data.as_deref().map(utf16le_to_string)
    }
}

fn field_name(field: BodyField) -> &'static str {
    match field {
        BodyField::Leading => "unknown leading value",
        BodyField::Name => "name descriptor",
        BodyField::Reserved => "reserved data",
        BodyField::Times => "file times",
        BodyField::Sizes => "file sizes",
        BodyField::Attributes => "file attribute flags",
        BodyField::Trailing => "unknown trailing value",
    }
}
