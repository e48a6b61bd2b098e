//! GUID heap (`#GUID`) access.
//!
//! The `#GUID` heap is a flat sequence of 16-byte GUIDs, referenced by
//! 1-based index from the metadata tables. Index 0 means "no GUID".
//!
//! # Reference
//! - ECMA-335 6th Edition, Partition II.24.2.5

use crate::{Error::OutOfBounds, Result};

/// View over the `#GUID` heap.
pub struct Guids<'a> {
    data: &'a [u8],
}

impl<'a> Guids<'a> {
    /// Create a `Guids` view over the heap bytes
    ///
    /// # Errors
    /// Returns an error if the heap length is not a multiple of 16
    pub fn from(data: &'a [u8]) -> Result<Guids<'a>> {
        if data.len() % 16 != 0 {
            return Err(malformed_error!("Provided #GUID heap is invalid"));
        }

        Ok(Guids { data })
    }

    /// Get the GUID at the given 1-based index
    ///
    /// # Errors
    /// Returns an error if the index is 0 or past the end of the heap
    pub fn get(&self, index: usize) -> Result<[u8; 16]> {
        if index == 0 {
            return Err(OutOfBounds);
        }

        let start = (index - 1) * 16;
        let Some(bytes) = self.data.get(start..start + 16) else {
            return Err(OutOfBounds);
        };

        let mut guid = [0u8; 16];
        guid.copy_from_slice(bytes);
        Ok(guid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        let mut data = vec![0u8; 32];
        data[16] = 0xAA;
        data[31] = 0xBB;

        let guids = Guids::from(&data).unwrap();
        assert_eq!(guids.get(1).unwrap(), [0u8; 16]);

        let second = guids.get(2).unwrap();
        assert_eq!(second[0], 0xAA);
        assert_eq!(second[15], 0xBB);
    }

    #[test]
    fn invalid() {
        assert!(Guids::from(&[0u8; 15]).is_err());

        let guids = Guids::from(&[0u8; 16]).unwrap();
        assert!(guids.get(0).is_err());
        assert!(guids.get(2).is_err());
    }
}
