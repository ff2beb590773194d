//! Debug output for record decoding
//!
//! Decoders report every field they read to a [`DebugSink`]. The sink is
//! handed in through [`DecodeOptions`](crate::DecodeOptions); there is no
//! global verbosity switch. The default [`NoopSink`] is disabled, so
//! decoders skip all formatting work.

use std::fmt::{self, Write as _};
use std::sync::Mutex;

/// Log target used for all decoder events
pub const LOG_TARGET: &str = "txfrecord";

/// Receiver for the values a decoder reads
pub trait DebugSink {
    /// Decoders skip formatting entirely when this returns false
    fn is_enabled(&self) -> bool {
        true
    }

    /// A single decoded field
    fn value(&self, scope: &'static str, label: &'static str, value: &dyn fmt::Display);

    /// A block of raw bytes
    fn data(&self, scope: &'static str, label: &'static str, data: &[u8]);
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DebugSink for NoopSink {
    fn is_enabled(&self) -> bool {
        false
    }

    fn value(&self, _scope: &'static str, _label: &'static str, _value: &dyn fmt::Display) {}

    fn data(&self, _scope: &'static str, _label: &'static str, _data: &[u8]) {}
}

/// Sink that forwards to `tracing`
///
/// Fields are emitted at DEBUG level, raw data blocks at TRACE level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DebugSink for TracingSink {
    fn is_enabled(&self) -> bool {
        tracing::enabled!(target: LOG_TARGET, tracing::Level::DEBUG)
    }

    fn value(&self, scope: &'static str, label: &'static str, value: &dyn fmt::Display) {
        tracing::debug!(target: LOG_TARGET, scope, "{}: {}", label, value);
    }

    fn data(&self, scope: &'static str, label: &'static str, data: &[u8]) {
        tracing::trace!(target: LOG_TARGET, scope, "{} ({} bytes):\n{}", label, data.len(), hex_dump(data));
    }
}

/// Sink that keeps formatted lines in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the collected lines, leaving the sink empty
    pub fn take(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(mut lines) => std::mem::take(&mut *lines),
            Err(_) => Vec::new(),
        }
    }

    fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

impl DebugSink for MemorySink {
    fn value(&self, scope: &'static str, label: &'static str, value: &dyn fmt::Display) {
        self.push(format!("{}: {}: {}", scope, label, value));
    }

    fn data(&self, scope: &'static str, label: &'static str, data: &[u8]) {
        self.push(format!("{}: {}:\n{}", scope, label, hex_dump(data)));
    }
}

/// Render bytes as offset, hexadecimal and ASCII columns, 16 bytes per line
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() / 16 * 80 + 80);

    for (line, chunk) in data.chunks(16).enumerate() {
        let _ = write!(out, "{:08x}: ", line * 16);
        for index in 0..16 {
            match chunk.get(index) {
                Some(byte) => {
                    let _ = write!(out, "{:02x} ", byte);
                }
                None => out.push_str("   "),
            }
            if index == 7 {
                out.push(' ');
            }
        }
        out.push(' ');
        for &byte in chunk {
            out.push(if byte.is_ascii_graphic() || byte == b' ' { byte as char } else { '.' });
        }
        out.push('\n');
    }
    out
}
