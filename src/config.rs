//! Decoder configuration

use crate::logging::{DebugSink, NoopSink};
use crate::ntfs::usn::{UsnDecoder, UsnRecordDecoder};
use std::fmt;

/// Largest buffer a decode call accepts by default
pub const DEFAULT_MAX_DATA_SIZE: usize = isize::MAX as usize;

/// Options for a single decode call
#[derive(Clone, Copy)]
pub struct DecodeOptions<'a> {
    /// Buffers longer than this are rejected before any byte is read
    pub max_data_size: usize,
    /// Receives every decoded field
    pub sink: &'a dyn DebugSink,
    /// Decodes the USN records embedded in update journal entry lists
    pub usn_decoder: &'a dyn UsnDecoder,
}

impl Default for DecodeOptions<'static> {
    fn default() -> Self {
        Self {
            max_data_size: DEFAULT_MAX_DATA_SIZE,
            sink: &NoopSink,
            usn_decoder: &UsnRecordDecoder,
        }
    }
}

impl DecodeOptions<'static> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'a> DecodeOptions<'a> {
    /// Sets the maximum accepted buffer size
    pub fn with_max_data_size(mut self, max_data_size: usize) -> Self {
        self.max_data_size = max_data_size;
        self
    }

    /// Sets the debug sink
    pub fn with_sink<'b>(self, sink: &'b dyn DebugSink) -> DecodeOptions<'b>
    where
        'a: 'b,
    {
        DecodeOptions {
            max_data_size: self.max_data_size,
            sink,
            usn_decoder: self.usn_decoder,
        }
    }

    /// Sets the USN record decoder
    pub fn with_usn_decoder<'b>(self, usn_decoder: &'b dyn UsnDecoder) -> DecodeOptions<'b>
    where
        'a: 'b,
    {
        DecodeOptions {
            max_data_size: self.max_data_size,
            sink: self.sink,
            usn_decoder,
        }
    }
}

impl fmt::Debug for DecodeOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeOptions")
            .field("max_data_size", &self.max_data_size)
            .field("sink_enabled", &self.sink.is_enabled())
            .finish_non_exhaustive()
    }
}
