//! Tables stream (`#~`) parsing.
//!
//! The `#~` stream starts with the tilde header (schema version, heap size
//! flags, the 64-bit `valid` mask), followed by one 32-bit row count per set
//! bit of `valid`, followed by the packed table rows in table-id order.
//!
//! Rows are laid out with the fixed per-table sizes from
//! [`crate::metadata::tables::row_size`]; the layout records one
//! `(offset, row count)` slot per table id so rows can be sliced on demand.
//!
//! # Reference
//! - ECMA-335 6th Edition, Partition II.24.2.6

use crate::{
    file::parser::Parser,
    metadata::tables::row_size,
    Error::OutOfBounds,
    Result,
};

/// Location of one table inside the `#~` stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct TableSlot {
    /// Offset of the first row, relative to the start of the stream
    pub offset: usize,
    /// Number of rows, 0 when the table is absent
    pub row_count: u32,
}

/// The parsed `#~` stream: header fields plus the location of every table.
pub struct TablesStream {
    /// Major version of the table schema, shall be 2
    pub major_version: u8,
    /// Minor version of the table schema, shall be 0
    pub minor_version: u8,
    /// Heap size flag bits (0x01 strings, 0x02 guid, 0x04 blob)
    pub heap_sizes: u8,
    /// Bit vector of present tables
    pub valid: u64,
    /// Bit vector of sorted tables
    pub sorted: u64,
    /// `#Strings` indices are 4 bytes wide
    pub large_strings: bool,
    /// `#GUID` indices are 4 bytes wide
    pub large_guids: bool,
    /// `#Blob` indices are 4 bytes wide
    pub large_blobs: bool,
    /// Per-table location, indexed by raw table id
    slots: [TableSlot; 64],
}

impl TablesStream {
    /// Parse the `#~` stream from its byte range.
    ///
    /// # Errors
    /// Returns an error if the header is truncated, no table has rows, or
    /// the declared rows overrun the stream.
    pub fn from(data: &[u8]) -> Result<TablesStream> {
        if data.len() < 24 {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(data);

        let _reserved = parser.read_le::<u32>()?;
        let major_version = parser.read_le::<u8>()?;
        let minor_version = parser.read_le::<u8>()?;
        let heap_sizes = parser.read_le::<u8>()?;
        let _reserved2 = parser.read_le::<u8>()?;

        let valid = parser.read_le::<u64>()?;
        if valid == 0 {
            return Err(malformed_error!("No valid rows in any of the tables"));
        }

        let sorted = parser.read_le::<u64>()?;

        let mut row_counts = [0u32; 64];
        for (id, count) in row_counts.iter_mut().enumerate() {
            if valid & (1 << id) != 0 {
                *count = parser.read_le::<u32>()?;
            }
        }

        let mut slots = [TableSlot::default(); 64];
        let mut cursor = parser.pos();
        for (id, slot) in slots.iter_mut().enumerate() {
            let count = row_counts[id];
            if count == 0 {
                continue;
            }

            let size = row_size(id as u8) as usize;
            let Some(table_bytes) = size.checked_mul(count as usize) else {
                return Err(OutOfBounds);
            };

            let Some(end) = cursor.checked_add(table_bytes) else {
                return Err(OutOfBounds);
            };

            if end > data.len() {
                return Err(OutOfBounds);
            }

            *slot = TableSlot {
                offset: cursor,
                row_count: count,
            };
            cursor = end;
        }

        Ok(TablesStream {
            major_version,
            minor_version,
            heap_sizes,
            valid,
            sorted,
            large_strings: heap_sizes & 0x01 != 0,
            large_guids: heap_sizes & 0x02 != 0,
            large_blobs: heap_sizes & 0x04 != 0,
            slots,
        })
    }

    /// Location of the given table, `row_count == 0` when absent
    #[must_use]
    pub fn slot(&self, id: u8) -> TableSlot {
        self.slots.get(id as usize).copied().unwrap_or_default()
    }

    /// Number of rows in the given table
    #[must_use]
    pub fn row_count(&self, id: u8) -> u32 {
        self.slot(id).row_count
    }

    /// Byte range of one row (1-based index) relative to the stream start
    ///
    /// Returns `None` for a zero index, an out-of-range index, or a table
    /// without a supported row layout.
    #[must_use]
    pub fn row_range(&self, id: u8, rid: u32) -> Option<std::ops::Range<usize>> {
        let slot = self.slot(id);
        if rid == 0 || rid > slot.row_count {
            return None;
        }

        let size = row_size(id) as usize;
        if size == 0 {
            return None;
        }

        let start = slot.offset + (rid as usize - 1) * size;
        Some(start..start + size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::TableId;

    fn stream_with_module_and_typedef() -> Vec<u8> {
        #[rustfmt::skip]
        let mut data = vec![
            0x00, 0x00, 0x00, 0x00, // reserved
            0x02,                   // major
            0x00,                   // minor
            0x00,                   // heap_sizes
            0x01,                   // reserved
            0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // valid: Module | TypeDef
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // sorted
            0x01, 0x00, 0x00, 0x00, // Module rows
            0x02, 0x00, 0x00, 0x00, // TypeDef rows
        ];
        data.resize(32 + 10 + 2 * 14, 0xCC);
        data
    }

    #[test]
    fn layout() {
        let stream = TablesStream::from(&stream_with_module_and_typedef()).unwrap();

        assert_eq!(stream.major_version, 2);
        assert_eq!(stream.row_count(TableId::Module as u8), 1);
        assert_eq!(stream.row_count(TableId::TypeDef as u8), 2);
        assert_eq!(stream.row_count(TableId::MethodDef as u8), 0);

        // Tables pack in id order right after the row counts
        assert_eq!(stream.row_range(TableId::Module as u8, 1).unwrap(), 32..42);
        assert_eq!(
            stream.row_range(TableId::TypeDef as u8, 1).unwrap(),
            42..56
        );
        assert_eq!(
            stream.row_range(TableId::TypeDef as u8, 2).unwrap(),
            56..70
        );
    }

    #[test]
    fn row_range_bounds() {
        let stream = TablesStream::from(&stream_with_module_and_typedef()).unwrap();

        assert!(stream.row_range(TableId::Module as u8, 0).is_none());
        assert!(stream.row_range(TableId::Module as u8, 2).is_none());
        assert!(stream.row_range(TableId::MethodDef as u8, 1).is_none());
    }

    #[test]
    fn heap_size_flags() {
        let mut data = stream_with_module_and_typedef();
        data[6] = 0x05; // large strings + large blobs

        let stream = TablesStream::from(&data).unwrap();
        assert!(stream.large_strings);
        assert!(!stream.large_guids);
        assert!(stream.large_blobs);
    }

    #[test]
    fn invalid() {
        // Too short for the header
        assert!(TablesStream::from(&[0u8; 16]).is_err());

        // Empty valid mask
        let mut data = stream_with_module_and_typedef();
        data[8..16].fill(0);
        assert!(TablesStream::from(&data).is_err());

        // Declared rows overrun the stream
        let mut data = stream_with_module_and_typedef();
        data.truncate(40);
        assert!(TablesStream::from(&data).is_err());
    }
}
