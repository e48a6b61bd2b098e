//! CIL instruction decoding.
//!
//! [`decode_instruction`] decodes one instruction at the parser's current
//! position; [`decode_stream`] decodes a whole byte range. The method frame
//! drives `decode_instruction` directly so that branches can move the program
//! counter between steps.

use crate::{
    disassembler::{
        instruction::{Immediate, Instruction, Operand},
        opcodes::{OperandType, INSTRUCTIONS, INSTRUCTIONS_FE},
    },
    file::parser::Parser,
    Result,
};

/// Decode a single instruction at the parser's current position.
///
/// # Arguments
/// * `parser` - Positioned at the first opcode byte
/// * `offset` - Byte offset of that position inside the method code,
///   recorded on the returned instruction
///
/// # Errors
/// Returns an error on a reserved or unknown opcode, or when the operand is
/// truncated.
pub fn decode_instruction(parser: &mut Parser<'_>, offset: u64) -> Result<Instruction> {
    let start = parser.pos();
    let first_byte = parser.read_le::<u8>()?;

    let (info, prefix, opcode) = match first_byte {
        0xFE => {
            let second_byte = parser.read_le::<u8>()?;

            match INSTRUCTIONS_FE.get(second_byte as usize) {
                Some(info) => (info, 0xFE_u8, second_byte),
                None => {
                    return Err(malformed_error!("Invalid opcode: FE {:02X}", second_byte))
                }
            }
        }
        _ => (&INSTRUCTIONS[first_byte as usize], 0, first_byte),
    };

    if info.mnemonic.is_empty() {
        return Err(malformed_error!(
            "Reserved opcode: {:02X} {:02X}",
            prefix,
            opcode
        ));
    }

    let operand = match info.operand {
        OperandType::None => Operand::None,
        OperandType::Int8 => Operand::Immediate(Immediate::Int8(parser.read_le::<i8>()?)),
        OperandType::UInt8 => Operand::Immediate(Immediate::UInt8(parser.read_le::<u8>()?)),
        OperandType::Int16 => Operand::Immediate(Immediate::Int16(parser.read_le::<i16>()?)),
        OperandType::UInt16 => Operand::Immediate(Immediate::UInt16(parser.read_le::<u16>()?)),
        OperandType::Int32 => Operand::Immediate(Immediate::Int32(parser.read_le::<i32>()?)),
        OperandType::UInt32 => Operand::Immediate(Immediate::UInt32(parser.read_le::<u32>()?)),
        OperandType::Int64 => Operand::Immediate(Immediate::Int64(parser.read_le::<i64>()?)),
        OperandType::UInt64 => Operand::Immediate(Immediate::UInt64(parser.read_le::<u64>()?)),
        OperandType::Float32 => {
            Operand::Immediate(Immediate::Float32(parser.read_le::<f32>()?))
        }
        OperandType::Float64 => {
            Operand::Immediate(Immediate::Float64(parser.read_le::<f64>()?))
        }
        OperandType::Token => Operand::Token(parser.read_le::<u32>()?.into()),
        OperandType::Switch => {
            let case_count = parser.read_le::<u32>()?;

            let mut targets = Vec::with_capacity(case_count as usize);
            for _ in 0..case_count {
                targets.push(parser.read_le::<u32>()?);
            }

            Operand::Switch(targets)
        }
    };

    Ok(Instruction {
        offset,
        size: (parser.pos() - start) as u64,
        prefix,
        opcode,
        mnemonic: info.mnemonic,
        operand,
    })
}

/// Decode every instruction in the given byte range.
///
/// # Errors
/// Returns an error as soon as one instruction fails to decode.
pub fn decode_stream(code: &[u8]) -> Result<Vec<Instruction>> {
    let mut parser = Parser::new(code);
    let mut instructions = Vec::new();

    while parser.has_more_data() {
        let offset = parser.pos() as u64;
        instructions.push(decode_instruction(&mut parser, offset)?);
    }

    Ok(instructions)
}
