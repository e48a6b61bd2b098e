//! User string heap (`#US`) access.
//!
//! The `#US` heap stores string literals referenced by `ldstr`. Entries are
//! blobs whose payload is UTF-16 code units followed by a single terminal
//! byte; the accessor decodes them to owned UTF-8 strings.
//!
//! # Reference
//! - ECMA-335 6th Edition, Partition II.24.2.4

use widestring::U16Str;

use crate::{metadata::streams::Blob, Result};

/// View over the `#US` heap.
pub struct UserStrings<'a> {
    blob: Blob<'a>,
}

impl<'a> UserStrings<'a> {
    /// Create a `UserStrings` view over the heap bytes
    ///
    /// # Errors
    /// Returns an error if the heap is empty or does not start with NUL
    pub fn from(data: &'a [u8]) -> Result<UserStrings<'a>> {
        Ok(UserStrings {
            blob: Blob::from(data)?,
        })
    }

    /// Decode the user string at the given heap offset to UTF-8
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds, the payload length is
    /// not UTF-16 shaped, or the code units are invalid
    pub fn get(&self, index: usize) -> Result<String> {
        let payload = self.blob.get(index)?;
        if payload.is_empty() {
            return Ok(String::new());
        }

        // The final byte is a terminal flag, not part of the string
        let units = &payload[..payload.len() - 1];
        if units.len() % 2 != 0 {
            return Err(malformed_error!(
                "User string at index {} is not UTF-16 shaped",
                index
            ));
        }

        let mut decoded = Vec::with_capacity(units.len() / 2);
        for pair in units.chunks_exact(2) {
            decoded.push(u16::from_le_bytes([pair[0], pair[1]]));
        }

        match U16Str::from_slice(&decoded).to_string() {
            Ok(result) => Ok(result),
            Err(_) => Err(malformed_error!(
                "Invalid user string at index - {}",
                index
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data = [
            0x00,
            0x1B, // blob length: 13 UTF-16 units + terminal byte
            0x48, 0x00, 0x65, 0x00, 0x6C, 0x00, 0x6C, 0x00, 0x6F, 0x00, 0x2C, 0x00,
            0x20, 0x00, 0x57, 0x00, 0x6F, 0x00, 0x72, 0x00, 0x6C, 0x00, 0x64, 0x00,
            0x21, 0x00,
            0x00,
        ];

        let us = UserStrings::from(&data).unwrap();
        assert_eq!(us.get(1).unwrap(), "Hello, World!");
    }

    #[test]
    fn empty_entry() {
        let data = [0x00, 0x00];
        let us = UserStrings::from(&data).unwrap();
        assert_eq!(us.get(1).unwrap(), "");
    }

    #[test]
    fn invalid() {
        assert!(UserStrings::from(&[]).is_err());

        // Even payload length cannot be UTF-16 units + terminal byte
        let bad_shape = [0x00, 0x02, 0x48, 0x00];
        let us = UserStrings::from(&bad_shape).unwrap();
        assert!(us.get(1).is_err());

        let out_of_range = [0x00, 0x01, 0x00];
        let us = UserStrings::from(&out_of_range).unwrap();
        assert!(us.get(9).is_err());
    }
}
