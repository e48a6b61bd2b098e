//! Convenient re-exports of the most commonly used types.
//!
//! Import this module to get quick access to the essential types for loading
//! and executing CLI assemblies.

/// The main error type for all cilrun operations
pub use crate::Error;

/// The result type used throughout cilrun
pub use crate::Result;

/// Low-level file parsing utilities
pub use crate::{File, Parser};

/// The loaded assembly and qualified member names
pub use crate::metadata::assembly::{Assembly, QualifiedName};

/// Metadata token type referencing table rows
pub use crate::metadata::token::Token;

/// Metadata table identifiers
pub use crate::metadata::tables::TableId;

/// Instruction decoding
pub use crate::disassembler::{decode_instruction, decode_stream, Instruction};

/// The execution engine and its value types
pub use crate::runtime::{Runtime, SlotValue, ValueType};
