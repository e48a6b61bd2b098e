//! Stream header parsing for the metadata root.
//!
//! Each stream header records the name, offset and size of one metadata
//! stream. Headers are variable-length: the NUL-terminated name is padded to a
//! 4-byte boundary and capped at 32 bytes.
//!
//! # Reference
//! - ECMA-335 6th Edition, Partition II.24.2.2

use crate::{file::parser::Parser, Result};

/// The names a metadata stream may carry.
const KNOWN_STREAMS: [&str; 5] = ["#~", "#Strings", "#US", "#Blob", "#GUID"];

/// One stream directory entry: where a stream lives inside the metadata root
/// and what it is called.
pub struct StreamHeader {
    /// Offset of the stream, relative to the start of the metadata root
    pub offset: u32,
    /// Size of the stream in bytes
    pub size: u32,
    /// Name of the stream, at most 32 characters
    pub name: String,
}

impl StreamHeader {
    /// Read one stream header at the parser's current position, leaving the
    /// parser aligned on the next header.
    ///
    /// # Errors
    /// Returns an error if the data is truncated or the name is not one of
    /// the five streams defined by ECMA-335.
    pub fn read(parser: &mut Parser<'_>) -> Result<StreamHeader> {
        let offset = parser.read_le::<u32>()?;
        let size = parser.read_le::<u32>()?;

        let mut name = String::with_capacity(32);
        for _ in 0..32 {
            let byte = parser.read_le::<u8>()?;
            if byte == 0 {
                break;
            }

            name.push(char::from(byte));
        }

        if !KNOWN_STREAMS.contains(&name.as_str()) {
            return Err(malformed_error!("Invalid stream header name - {}", name));
        }

        parser.align(4)?;

        Ok(StreamHeader { offset, size, name })
    }
}
