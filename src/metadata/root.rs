//! Metadata root parsing.
//!
//! The metadata root sits at the metadata RVA recorded in the CLI runtime
//! header. It starts with the `BSJB` signature, carries a variable-length
//! version string, and ends with the stream directory.
//!
//! # Reference
//! - ECMA-335 6th Edition, Partition II.24.2.1

use crate::{
    file::parser::Parser, metadata::streams::StreamHeader, Error::OutOfBounds, Result,
};

/// The magic value at the start of the metadata root ("BSJB")
pub const METADATA_MAGIC: u32 = 0x424A_5342;

/// The parsed metadata root: version information plus the stream directory.
///
/// Stream offsets inside the headers are relative to the start of the
/// metadata root; the caller rebases them against the file.
pub struct Root {
    /// Magic signature for physical metadata, always `BSJB`
    pub signature: u32,
    /// Major version, shall be 1
    pub major_version: u16,
    /// Minor version, shall be 1
    pub minor_version: u16,
    /// Reserved, always 0
    pub reserved: u32,
    /// Number of bytes allocated to hold the version string
    pub length: u32,
    /// The version string, without trailing NUL padding
    pub version: String,
    /// Reserved flags, always 0
    pub flags: u16,
    /// Number of streams
    pub stream_number: u16,
    /// The stream directory
    pub stream_headers: Vec<StreamHeader>,
}

impl Root {
    /// Reads a [`Root`] from the metadata byte range.
    ///
    /// # Arguments
    /// * `data` - The metadata root bytes, spanning the full metadata size
    ///   recorded in the CLI header
    ///
    /// # Errors
    /// Returns an error if the signature is wrong, the version string is
    /// malformed, or any stream header lies outside the metadata range.
    pub fn read(data: &[u8]) -> Result<Root> {
        if data.len() < 20 {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(data);

        let signature = parser.read_le::<u32>()?;
        if signature != METADATA_MAGIC {
            return Err(malformed_error!(
                "Metadata signature 0x{:08x} is not BSJB",
                signature
            ));
        }

        let major_version = parser.read_le::<u16>()?;
        let minor_version = parser.read_le::<u16>()?;
        let reserved = parser.read_le::<u32>()?;

        let length = parser.read_le::<u32>()?;
        if length == 0 || length > 255 {
            return Err(malformed_error!(
                "Version string length {} is out of range",
                length
            ));
        }

        let mut version = String::with_capacity(length as usize);
        for _ in 0..length {
            let byte = parser.read_le::<u8>()?;
            if byte == 0 {
                break;
            }

            version.push(char::from(byte));
        }
        parser.seek(16 + length as usize)?;

        if !version.starts_with('v') {
            return Err(malformed_error!(
                "Version string '{}' must start with 'v'",
                version
            ));
        }

        let flags = parser.read_le::<u16>()?;
        let stream_number = parser.read_le::<u16>()?;
        if stream_number == 0 || stream_number > 6 {
            // The five defined streams plus a possible #- variant; anything
            // beyond that count cannot be valid
            return Err(malformed_error!("Invalid stream count {}", stream_number));
        }

        let mut stream_headers = Vec::with_capacity(stream_number as usize);
        for _ in 0..stream_number {
            let header = StreamHeader::read(&mut parser)?;

            let Some(stream_end) = header.offset.checked_add(header.size) else {
                return Err(malformed_error!(
                    "Stream '{}' offset and size overflow",
                    header.name
                ));
            };

            if stream_end as usize > data.len() {
                return Err(OutOfBounds);
            }

            stream_headers.push(header);
        }

        Ok(Root {
            signature,
            major_version,
            minor_version,
            reserved,
            length,
            version,
            flags,
            stream_number,
            stream_headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_bytes() -> Vec<u8> {
        #[rustfmt::skip]
        let bytes = vec![
            0x42, 0x53, 0x4A, 0x42, // BSJB
            0x01, 0x00,             // major
            0x01, 0x00,             // minor
            0x00, 0x00, 0x00, 0x00, // reserved
            0x0C, 0x00, 0x00, 0x00, // length = 12
            b'v', b'4', b'.', b'0', b'.', b'3', b'0', b'3', b'1', b'9', 0x00, 0x00,
            0x00, 0x00,             // flags
            0x01, 0x00,             // one stream
            0x48, 0x00, 0x00, 0x00, // offset
            0x10, 0x00, 0x00, 0x00, // size
            0x23, 0x7E, 0x00, 0x00, // "#~"
            // stream payload filler up to offset + size
        ];
        let mut bytes = bytes;
        bytes.resize(0x58, 0);
        bytes
    }

    #[test]
    fn crafted() {
        let root = Root::read(&root_bytes()).unwrap();

        assert_eq!(root.version, "v4.0.30319");
        assert_eq!(root.stream_number, 1);
        assert_eq!(root.stream_headers[0].name, "#~");
        assert_eq!(root.stream_headers[0].offset, 0x48);
    }

    #[test]
    fn bad_signature() {
        let mut bytes = root_bytes();
        bytes[0] = 0x41;
        assert!(Root::read(&bytes).is_err());
    }

    #[test]
    fn stream_outside_metadata() {
        let mut bytes = root_bytes();
        // Grow the declared stream size past the metadata range
        bytes[0x24] = 0xFF;
        assert!(Root::read(&bytes).is_err());
    }

    #[test]
    fn version_without_prefix() {
        let mut bytes = root_bytes();
        bytes[16] = b'x';
        assert!(Root::read(&bytes).is_err());
    }
}
