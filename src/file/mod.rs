//! PE file abstraction for CLI assemblies.
//!
//! This module abstracts over the data source of a Portable Executable file
//! (disk or memory) and exposes the pieces of the PE envelope the interpreter
//! needs: the Optional header's stack reserve, the CLR runtime header data
//! directory, and RVA to file-offset translation through the section table.
//!
//! The PE envelope itself is parsed with `goblin`; everything inside the CLR
//! runtime header is parsed by [`crate::metadata`].
//!
//! # Key Components
//!
//! - [`File`] - a loaded PE32+ image with validated .NET metadata directory
//! - [`Backend`] - trait over data sources (memory-mapped file, owned buffer)
//! - [`parser::Parser`] - cursor-based bounds-checked reader
//! - [`io`] - little-endian primitive reads

pub mod io;
pub mod parser;

use std::{fs, path::Path};

use crate::{
    Error::{Empty, GoblinErr, OutOfBounds},
    Result,
};
use goblin::pe::{optional_header::MAGIC_64, PE};
use memmap2::Mmap;
use ouroboros::self_referencing;

/// Backend trait for file data sources.
///
/// A backend only supplies the raw bytes; slicing and bounds checking are
/// shared across all backends through the provided methods, so every data
/// source rejects out-of-range reads the same way.
pub trait Backend: Send + Sync {
    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize {
        self.data().len()
    }

    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Errors
    /// Returns [`OutOfBounds`] if `offset + len` overflows or reaches past
    /// the end of the data.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data().get(offset..end))
            .ok_or(OutOfBounds)
    }
}

/// Input file held in an owned memory buffer
struct Memory(Vec<u8>);

impl Backend for Memory {
    fn data(&self) -> &[u8] {
        &self.0
    }
}

/// Input file memory-mapped from disk
struct Physical(Mmap);

impl Physical {
    /// Map the file at `path` into memory
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or mapped
    fn new(path: &Path) -> Result<Physical> {
        let file = fs::File::open(path)?;
        let mapping = unsafe { Mmap::map(&file) }?;

        Ok(Physical(mapping))
    }
}

impl Backend for Physical {
    fn data(&self) -> &[u8] {
        self.0.as_ref()
    }
}

#[self_referencing]
/// A loaded PE32+ file carrying CLI metadata.
///
/// Owns the raw bytes (through a [`Backend`]) together with the parsed
/// `goblin` PE view. Loading validates that the image is PE32+ and that a CLR
/// runtime header data directory is present; anything else is rejected with a
/// load error naming the missing piece.
pub struct File {
    /// The underlying data source (memory or file).
    data: Box<dyn Backend>,
    /// The parsed PE structure, referencing the data.
    #[borrows(data)]
    #[not_covariant]
    pe: PE<'this>,
}

impl File {
    /// Loads a PE file from the given path.
    ///
    /// The file is memory-mapped for access.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, is not valid PE32+, or
    /// carries no CLR runtime header directory.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Loads a PE file from a memory buffer.
    ///
    /// # Errors
    /// Returns an error if the buffer is empty, not valid PE32+, or carries
    /// no CLR runtime header directory.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory(data);

        Self::load(input)
    }

    /// Internal loader for any backend.
    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let data = Box::new(data);

        File::try_new(data, |data| {
            let pe = match PE::parse(data.data()) {
                Ok(pe) => pe,
                Err(error) => return Err(GoblinErr(error)),
            };

            let Some(optional_header) = pe.header.optional_header else {
                return Err(malformed_error!("File does not have an OptionalHeader"));
            };

            if optional_header.standard_fields.magic != MAGIC_64 {
                return Err(malformed_error!(
                    "OptionalHeader magic 0x{:x} does not select PE32+",
                    optional_header.standard_fields.magic
                ));
            }

            if optional_header
                .data_directories
                .get_clr_runtime_header()
                .is_none()
            {
                return Err(malformed_error!(
                    "File does not have a CLR runtime header directory"
                ));
            }

            Ok(pe)
        })
    }

    /// Returns the total size of the loaded file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.with_data(|data| data.len())
    }

    /// Returns `true` if the file has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entire file data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.with_data(|data| data.data())
    }

    /// Returns a bounds-checked slice of the file data.
    ///
    /// # Errors
    /// Returns an error if the requested range is out of bounds.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.with_data(|data| data.data_slice(offset, len))
    }

    /// Returns the Optional header's stack reserve, used to size the
    /// evaluation stack.
    #[must_use]
    pub fn stack_reserve(&self) -> u64 {
        self.with_pe(|pe| {
            // Presence was validated at load
            pe.header
                .optional_header
                .map_or(0, |header| header.windows_fields.size_of_stack_reserve)
        })
    }

    /// Returns the RVA and size of the CLR runtime header.
    #[must_use]
    pub fn clr(&self) -> (usize, usize) {
        self.with_pe(|pe| {
            pe.header
                .optional_header
                .and_then(|header| {
                    header
                        .data_directories
                        .get_clr_runtime_header()
                        .map(|dir| (dir.virtual_address as usize, dir.size as usize))
                })
                .unwrap_or((0, 0))
        })
    }

    /// Translates an RVA to a file offset through the section table.
    ///
    /// An RVA belongs to a section iff it lies inside
    /// `[virtual_address, virtual_address + virtual_size)`.
    ///
    /// # Errors
    /// Returns [`OutOfBounds`] if no section contains the RVA.
    pub fn rva_to_offset(&self, rva: usize) -> Result<usize> {
        self.with_pe(|pe| {
            for section in &pe.sections {
                let start = section.virtual_address as usize;
                let end = start + section.virtual_size as usize;

                if rva >= start && rva < end {
                    return Ok(section.pointer_to_raw_data as usize + (rva - start));
                }
            }

            Err(OutOfBounds)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_slicing() {
        let mut bytes = vec![0xCC_u8; 64];
        bytes[10..15].fill(0xBB);

        let memory = Memory(bytes);

        assert_eq!(memory.len(), 64);
        assert_eq!(memory.data()[0], 0xCC);
        assert_eq!(memory.data_slice(10, 5).unwrap(), &[0xBB; 5]);
        assert_eq!(memory.data_slice(64, 0).unwrap(), &[] as &[u8]);

        assert!(memory.data_slice(60, 8).is_err());
        assert!(memory.data_slice(65, 0).is_err());
        assert!(memory.data_slice(usize::MAX, 2).is_err());
    }

    #[test]
    fn memory_backend_empty() {
        let memory = Memory(Vec::new());

        assert_eq!(memory.len(), 0);
        assert_eq!(memory.data_slice(0, 0).unwrap(), &[] as &[u8]);
        assert!(memory.data_slice(0, 1).is_err());
    }

    #[test]
    fn physical_backend_missing_file() {
        match Physical::new(Path::new("/nonexistent/path/to/file.dll")) {
            Err(crate::Error::FileError(io_error)) => {
                assert_eq!(io_error.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected FileError"),
        }
    }

    #[test]
    fn physical_backend_mapped_file() {
        let temp_path = std::env::temp_dir().join("cilrun_backend_test.bin");
        std::fs::write(&temp_path, [0x4D, 0x5A, 0x00, 0x01]).unwrap();

        let physical = Physical::new(&temp_path).unwrap();
        assert_eq!(physical.len(), 4);
        assert_eq!(physical.data_slice(0, 2).unwrap(), &[0x4D, 0x5A]);
        assert!(physical.data_slice(2, 4).is_err());

        drop(physical);
        std::fs::remove_file(&temp_path).unwrap();
    }

    #[test]
    fn empty_input() {
        assert!(matches!(File::from_mem(vec![]), Err(Empty)));
    }

    #[test]
    fn not_a_pe() {
        assert!(File::from_mem(vec![0xCC; 128]).is_err());
    }
}
