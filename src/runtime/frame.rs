//! The method frame.
//!
//! A [`Frame`] is one entry of the call stack: a method token, the owning
//! assembly, up to 256 typed local slots, and a signed program counter that
//! is a byte offset into the method's code. The code location is resolved
//! lazily from the MethodDef row's RVA through the tiny/fat body header.
//!
//! Instructions are yielded restartably at the PC: every [`Frame::step`]
//! re-reads the PC, decodes one instruction there, and advances the PC by
//! the instruction length. A branch handler may move the PC between steps,
//! so no lookahead is ever cached.

use std::{cell::OnceCell, sync::Arc};

use crate::{
    disassembler::{decode_instruction, Instruction},
    file::parser::Parser,
    metadata::{assembly::Assembly, method::MethodBody, tables::MethodDefRow, token::Token},
    runtime::value::SlotValue,
    Error::{OutOfBounds, TokenOutOfRange},
    Result,
};

/// Number of local variable slots per frame.
pub const LOCAL_SLOTS: usize = 256;

/// One call frame: method identity, local slots, and the program counter.
pub struct Frame {
    assembly: Arc<Assembly>,
    token: Token,
    method_def: OnceCell<MethodDefRow>,
    /// Resolved `(start, len)` of the code bytes inside the file
    code: OnceCell<(usize, usize)>,
    pc: i64,
    locals: [Option<SlotValue>; LOCAL_SLOTS],
}

impl Frame {
    /// Create a frame for the given method token in the given assembly
    #[must_use]
    pub fn new(assembly: Arc<Assembly>, token: Token) -> Self {
        Frame {
            assembly,
            token,
            method_def: OnceCell::new(),
            code: OnceCell::new(),
            pc: 0,
            locals: [None; LOCAL_SLOTS],
        }
    }

    /// The assembly this frame executes in
    #[must_use]
    pub fn assembly(&self) -> &Arc<Assembly> {
        &self.assembly
    }

    /// The method token of this frame
    #[must_use]
    pub fn token(&self) -> Token {
        self.token
    }

    /// The `MethodDef` row of this frame's method, resolved lazily
    ///
    /// # Errors
    /// Returns [`TokenOutOfRange`] if the token does not resolve to a
    /// `MethodDef` row.
    pub fn method_def(&self) -> Result<MethodDefRow> {
        if let Some(row) = self.method_def.get() {
            return Ok(*row);
        }

        let row = self
            .assembly
            .row::<MethodDefRow>(self.token)
            .ok_or(TokenOutOfRange(self.token))?;

        Ok(*self.method_def.get_or_init(|| row))
    }

    /// The `(start, len)` file range of this method's code, resolved lazily
    /// through the tiny/fat body header.
    fn code_location(&self) -> Result<(usize, usize)> {
        if let Some(location) = self.code.get() {
            return Ok(*location);
        }

        let method_def = self.method_def()?;
        let body_offset = self.assembly.rva_to_offset(method_def.rva as usize)?;
        let body = MethodBody::parse(self.assembly.data_from(body_offset)?, self.token)?;

        let location = (body_offset + body.size_header, body.size_code);
        Ok(*self.code.get_or_init(|| location))
    }

    /// The current program counter, a byte offset into the code
    #[must_use]
    pub fn pc(&self) -> i64 {
        self.pc
    }

    /// Add a signed offset to the program counter (branch instructions)
    pub fn offset_pc(&mut self, offset: i64) {
        self.pc += offset;
    }

    /// Decode the instruction at the current PC and advance past it.
    ///
    /// Returns `Ok(None)` when the PC has reached (or left) the code range,
    /// which ends the frame's instruction stream.
    ///
    /// # Errors
    /// Returns an error if the body header is unsupported or the bytes at
    /// the PC do not decode.
    pub fn step(&mut self) -> Result<Option<Instruction>> {
        let (start, len) = self.code_location()?;

        let Ok(pc) = usize::try_from(self.pc) else {
            return Ok(None);
        };

        if pc >= len {
            return Ok(None);
        }

        let code = self.assembly.data_slice(start + pc, len - pc)?;
        let instruction = decode_instruction(&mut Parser::new(code), pc as u64)?;

        self.pc += instruction.size as i64;
        Ok(Some(instruction))
    }

    /// The value in local slot `index`, if the slot holds one
    ///
    /// # Errors
    /// Returns [`OutOfBounds`] for slot indices past the 256 slots.
    pub fn local(&self, index: u16) -> Result<Option<SlotValue>> {
        match self.locals.get(index as usize) {
            Some(slot) => Ok(*slot),
            None => Err(OutOfBounds),
        }
    }

    /// Store a value in local slot `index`, overwriting prior contents
    ///
    /// # Errors
    /// Returns [`OutOfBounds`] for slot indices past the 256 slots.
    pub fn set_local(&mut self, index: u16, value: SlotValue) -> Result<()> {
        match self.locals.get_mut(index as usize) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(OutOfBounds),
        }
    }

    /// Clear local slot `index`
    ///
    /// # Errors
    /// Returns [`OutOfBounds`] for slot indices past the 256 slots.
    pub fn clear_local(&mut self, index: u16) -> Result<()> {
        match self.locals.get_mut(index as usize) {
            Some(slot) => {
                *slot = None;
                Ok(())
            }
            None => Err(OutOfBounds),
        }
    }
}
