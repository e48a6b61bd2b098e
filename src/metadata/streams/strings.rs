//! String heap (`#Strings`) access.
//!
//! The `#Strings` heap stores identifier strings (type names, method names,
//! namespaces) as NUL-terminated UTF-8, referenced by byte offset from the
//! metadata tables.
//!
//! # Reference
//! - ECMA-335 6th Edition, Partition II.24.2.3

use std::ffi::CStr;

use crate::{Error::OutOfBounds, Result};

/// View over the `#Strings` heap.
///
/// Index 0 always holds the empty string, so a valid heap starts with a NUL
/// byte.
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Create a `Strings` view over the heap bytes
    ///
    /// # Errors
    /// Returns an error if the heap is empty or does not start with NUL
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Provided #Strings heap is invalid"));
        }

        Ok(Strings { data })
    }

    /// Get the NUL-terminated UTF-8 string at the given heap offset
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds or the bytes are not
    /// valid UTF-8
    pub fn get(&self, index: usize) -> Result<&'a str> {
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        match CStr::from_bytes_until_nul(&self.data[index..]) {
            Ok(raw) => match raw.to_str() {
                Ok(result) => Ok(result),
                Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
            },
            Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
        }
    }
}
