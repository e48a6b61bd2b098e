//! Metadata stream access.
//!
//! A CLI metadata root carries up to five streams: the tables stream `#~`
//! and the four heaps `#Strings`, `#US`, `#Blob` and `#GUID`. This module
//! provides one view type per stream plus the stream directory entry type.
//!
//! The heap views borrow the underlying file data and validate on access, so
//! a malformed heap index surfaces as an error at the lookup site.

mod blob;
mod guid;
mod header;
mod strings;
mod tables;
mod userstrings;

pub use blob::Blob;
pub use guid::Guids;
pub use header::StreamHeader;
pub use strings::Strings;
pub use tables::{TableSlot, TablesStream};
pub use userstrings::UserStrings;
