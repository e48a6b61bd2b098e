//! Decoded CIL instructions and their operands.

use crate::{
    metadata::token::Token,
    Error::InvalidOperand,
    Result,
};

/// An immediate operand value.
#[derive(Clone, Copy, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum Immediate {
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
}

/// The operand of one decoded instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// No operand
    None,
    /// An immediate value
    Immediate(Immediate),
    /// A metadata token
    Token(Token),
    /// The branch target list of a `switch`
    Switch(Vec<u32>),
}

/// One decoded CIL instruction.
///
/// `offset` and `size` are in bytes relative to the start of the method's
/// code; advancing the program counter by `size` reaches the next
/// instruction.
#[derive(Clone, Debug)]
pub struct Instruction {
    /// Byte offset of this instruction inside the method code
    pub offset: u64,
    /// Total encoded size, opcode bytes plus operand bytes
    pub size: u64,
    /// Prefix byte, 0 for the base space and 0xFE for the extended space
    pub prefix: u8,
    /// Opcode byte within its space
    pub opcode: u8,
    /// Mnemonic from the descriptor table
    pub mnemonic: &'static str,
    /// Decoded operand
    pub operand: Operand,
}

impl Instruction {
    fn expected(&self, expected: &'static str) -> crate::Error {
        InvalidOperand {
            instruction: self.mnemonic,
            expected,
        }
    }

    /// The token operand
    ///
    /// # Errors
    /// Returns an error if this instruction has no token operand
    pub fn token_operand(&self) -> Result<Token> {
        match self.operand {
            Operand::Token(token) => Ok(token),
            _ => Err(self.expected("token")),
        }
    }

    /// The 8-bit signed immediate operand
    ///
    /// # Errors
    /// Returns an error if this instruction has no such operand
    pub fn i8_operand(&self) -> Result<i8> {
        match self.operand {
            Operand::Immediate(Immediate::Int8(value)) => Ok(value),
            _ => Err(self.expected("int8 immediate")),
        }
    }

    /// The 8-bit unsigned immediate operand
    ///
    /// # Errors
    /// Returns an error if this instruction has no such operand
    pub fn u8_operand(&self) -> Result<u8> {
        match self.operand {
            Operand::Immediate(Immediate::UInt8(value)) => Ok(value),
            _ => Err(self.expected("uint8 immediate")),
        }
    }

    /// The 16-bit unsigned immediate operand
    ///
    /// # Errors
    /// Returns an error if this instruction has no such operand
    pub fn u16_operand(&self) -> Result<u16> {
        match self.operand {
            Operand::Immediate(Immediate::UInt16(value)) => Ok(value),
            _ => Err(self.expected("uint16 immediate")),
        }
    }

    /// The 32-bit signed immediate operand
    ///
    /// # Errors
    /// Returns an error if this instruction has no such operand
    pub fn i32_operand(&self) -> Result<i32> {
        match self.operand {
            Operand::Immediate(Immediate::Int32(value)) => Ok(value),
            _ => Err(self.expected("int32 immediate")),
        }
    }

    /// The 64-bit signed immediate operand
    ///
    /// # Errors
    /// Returns an error if this instruction has no such operand
    pub fn i64_operand(&self) -> Result<i64> {
        match self.operand {
            Operand::Immediate(Immediate::Int64(value)) => Ok(value),
            _ => Err(self.expected("int64 immediate")),
        }
    }

    /// The 32-bit float immediate operand
    ///
    /// # Errors
    /// Returns an error if this instruction has no such operand
    pub fn f32_operand(&self) -> Result<f32> {
        match self.operand {
            Operand::Immediate(Immediate::Float32(value)) => Ok(value),
            _ => Err(self.expected("float32 immediate")),
        }
    }

    /// The 64-bit float immediate operand
    ///
    /// # Errors
    /// Returns an error if this instruction has no such operand
    pub fn f64_operand(&self) -> Result<f64> {
        match self.operand {
            Operand::Immediate(Immediate::Float64(value)) => Ok(value),
            _ => Err(self.expected("float64 immediate")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instruction(operand: Operand) -> Instruction {
        Instruction {
            offset: 0,
            size: 5,
            prefix: 0,
            opcode: 0x28,
            mnemonic: "call",
            operand,
        }
    }

    #[test]
    fn operand_extraction() {
        let ins = instruction(Operand::Token(Token(0x0A00_0001)));
        assert_eq!(ins.token_operand().unwrap(), Token(0x0A00_0001));
        assert!(ins.i8_operand().is_err());

        let ins = instruction(Operand::Immediate(Immediate::Int8(-4)));
        assert_eq!(ins.i8_operand().unwrap(), -4);
        assert!(ins.token_operand().is_err());
    }

    #[test]
    fn mismatch_names_instruction() {
        let ins = instruction(Operand::None);
        match ins.token_operand() {
            Err(InvalidOperand { instruction, .. }) => assert_eq!(instruction, "call"),
            _ => panic!("expected InvalidOperand"),
        }
    }
}
