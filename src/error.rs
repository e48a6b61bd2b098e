use thiserror::Error;

use crate::{metadata::token::Token, runtime::ValueType};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, covering every failure this crate can surface.
///
/// The first group of variants is raised while parsing the PE envelope and the
/// CLI metadata; the second group is raised by the execution engine. No variant
/// is recovered locally - every error unwinds dispatch and propagates to the
/// top of [`Runtime::run`](crate::runtime::Runtime::run).
#[derive(Error, Debug)]
pub enum Error {
    /// The file is damaged and could not be parsed.
    ///
    /// The message names the offending header or stream, and the source
    /// location records where the malformation was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This file type is not supported.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error from the goblin crate during PE envelope parsing.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),

    /// A method body header is neither tiny nor fat.
    ///
    /// The associated [`Token`] identifies the method whose body could not be
    /// decoded.
    #[error("Method {0} has an unsupported body header")]
    UnsupportedMethodHeader(Token),

    /// A token's row index does not fall inside its table.
    #[error("Token {0} is out of range for its table")]
    TokenOutOfRange(Token),

    /// A null token (row index 0) was used where a row reference is required.
    #[error("Null token used where a table row is required")]
    NullToken,

    /// A stack pop observed a different type tag than the one requested.
    #[error("Stack type mismatch - expected {expected}, found {actual}")]
    TypeMismatch {
        /// The tag the caller asked to pop
        expected: ValueType,
        /// The tag actually on top of the stack
        actual: ValueType,
    },

    /// A pop would retract the evaluation stack below its base.
    #[error("Evaluation stack underflow")]
    StackUnderflow,

    /// A push would grow the evaluation stack past its reserved capacity.
    #[error("Evaluation stack overflow")]
    StackOverflow,

    /// No registered assembly loader could supply the named assembly.
    #[error("Could not find assembly '{0}'")]
    AssemblyNotFound(String),

    /// The assembly was loaded but does not contain the referenced member.
    #[error("Member '{0}' not found")]
    MemberNotFound(String),

    /// `call` or `newobj` was given a token from an unsupported table.
    #[error("Invalid call token type - table 0x{0:02x}")]
    InvalidCallToken(u8),

    /// The opcode decoded fine but no handler is implemented for it.
    #[error("Unimplemented opcode '{mnemonic}' (0x{opcode:04x})")]
    UnimplementedOpcode {
        /// Mnemonic of the decoded instruction
        mnemonic: &'static str,
        /// Opcode value, with the 0xFE prefix folded into the high byte
        opcode: u16,
    },

    /// An instruction operand was extracted with the wrong accessor.
    #[error("Invalid operand for '{instruction}' - expected {expected}")]
    InvalidOperand {
        /// Mnemonic of the instruction whose operand was requested
        instruction: &'static str,
        /// Description of the expected operand kind
        expected: &'static str,
    },

    /// An operation observed an `Invalid`-tagged or missing value.
    #[error("Operation on an invalid value")]
    InvalidValueType,

    /// A freshly allocated heap handle was already present in the heap.
    #[error("Heap object 0x{0:x} already exists")]
    HeapCollision(u64),
}
