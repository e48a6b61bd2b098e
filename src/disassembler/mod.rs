//! CIL instruction decoding.
//!
//! Decodes raw method bytes into [`Instruction`] values: one or two opcode
//! bytes (the `0xFE` prefix selects the extended space) followed by operands
//! whose widths come from the opcode descriptor tables.
//!
//! # Key Types
//! - [`Instruction`] - one decoded instruction with typed operand extractors
//! - [`Operand`] / [`Immediate`] - operand values
//! - [`OpcodeInfo`] / [`OperandType`] - static opcode descriptors
//!
//! # Main Functions
//! - [`decode_instruction`] - decode a single instruction
//! - [`decode_stream`] - decode a full byte range
//!
//! # Example
//! ```rust
//! use cilrun::disassembler::decode_stream;
//! let code = [0x00, 0x2A]; // nop, ret
//! let instructions = decode_stream(&code)?;
//! assert_eq!(instructions[0].mnemonic, "nop");
//! assert_eq!(instructions[1].mnemonic, "ret");
//! # Ok::<(), cilrun::Error>(())
//! ```

mod decoder;
mod instruction;
mod opcodes;

pub use decoder::{decode_instruction, decode_stream};
pub use instruction::{Immediate, Instruction, Operand};
pub use opcodes::{OpcodeInfo, OperandType, INSTRUCTIONS, INSTRUCTIONS_FE};
