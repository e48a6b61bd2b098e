//! Per-opcode handlers and the dispatch loop.
//!
//! [`Runtime::execute`] steps a frame's instruction stream and routes each
//! opcode to its handler. Handlers mutate the evaluation stack, the frame's
//! locals or PC, or global state (statics, heap, assembly registry), and
//! `call`/`newobj` recursively enter `execute` on a callee frame. `ret` ends
//! dispatch for the frame; a decodable opcode without a handler raises
//! [`UnimplementedOpcode`].

use std::sync::Arc;

use crate::{
    metadata::{
        assembly::Assembly,
        tables::{FieldRow, MethodDefRow, TableId},
        token::Token,
    },
    runtime::{Frame, ManagedPointer, Runtime, StaticKey, UnmanagedPointer},
    Error::{
        InvalidCallToken, InvalidValueType, MemberNotFound, NullToken, TokenOutOfRange,
        UnimplementedOpcode,
    },
    Result,
};

impl Runtime {
    /// Execute a frame's instructions until `ret` or the end of its code.
    ///
    /// # Errors
    /// Returns the first error any handler raises; nothing is recovered
    /// locally.
    pub(crate) fn execute(&mut self, mut frame: Frame) -> Result<()> {
        Self::log_method_entry(&frame);

        loop {
            let Some(instruction) = frame.step()? else {
                return Ok(());
            };

            log::trace!("{}", instruction.mnemonic);

            match (instruction.prefix, instruction.opcode) {
                // nop
                (0, 0x00) => {}
                // break
                (0, 0x01) => Self::brk(),
                // ldarg.0 .. ldarg.3
                (0, code @ 0x02..=0x05) => self.ldarg(&frame, u16::from(code - 0x02)),
                // ldloc.0 .. ldloc.3
                (0, code @ 0x06..=0x09) => self.ldloc(&mut frame, u16::from(code - 0x06))?,
                // stloc.0 .. stloc.3
                (0, code @ 0x0A..=0x0D) => self.stloc(&mut frame, u16::from(code - 0x0A))?,
                // ldarg.s
                (0, 0x0E) => self.ldarg(&frame, u16::from(instruction.u8_operand()?)),
                // ldloc.s
                (0, 0x11) => self.ldloc(&mut frame, u16::from(instruction.u8_operand()?))?,
                // ldloca.s
                (0, 0x12) => self.ldloca(u16::from(instruction.u8_operand()?))?,
                // stloc.s
                (0, 0x13) => self.stloc(&mut frame, u16::from(instruction.u8_operand()?))?,
                // ldc.i4.m1
                (0, 0x15) => self.ldc_i4(-1)?,
                // ldc.i4.0 .. ldc.i4.8
                (0, code @ 0x16..=0x1E) => self.ldc_i4(i32::from(code) - 0x16)?,
                // ldc.i4.s
                (0, 0x1F) => self.ldc_i4(i32::from(instruction.i8_operand()?))?,
                // ldc.i4
                (0, 0x20) => self.ldc_i4(instruction.i32_operand()?)?,
                // ldc.i8
                (0, 0x21) => self.ldc_i8(instruction.i64_operand()?)?,
                // ldc.r4
                (0, 0x22) => self.ldc_r(f64::from(instruction.f32_operand()?))?,
                // ldc.r8
                (0, 0x23) => self.ldc_r(instruction.f64_operand()?)?,
                // pop
                (0, 0x26) => self.pop_discard()?,
                // call
                (0, 0x28) => self.call(&frame, instruction.token_operand()?)?,
                // ret
                (0, 0x2A) => return Ok(()),
                // br.s
                (0, 0x2B) => frame.offset_pc(i64::from(instruction.i8_operand()?)),
                // br
                (0, 0x38) => frame.offset_pc(i64::from(instruction.i32_operand()?)),
                // ldstr
                (0, 0x72) => self.ldstr(instruction.token_operand()?)?,
                // newobj
                (0, 0x73) => self.newobj(&frame, instruction.token_operand()?)?,
                // ldsfld
                (0, 0x7E) => self.ldsfld(&frame, instruction.token_operand()?)?,
                // ldsflda
                (0, 0x7F) => self.ldsflda(&frame, instruction.token_operand()?)?,
                // stsfld
                (0, 0x80) => self.stsfld(&frame, instruction.token_operand()?)?,
                // ldarg (extended)
                (0xFE, 0x09) => self.ldarg(&frame, instruction.u16_operand()?),
                // ldloc (extended)
                (0xFE, 0x0C) => self.ldloc(&mut frame, instruction.u16_operand()?)?,
                // stloc (extended)
                (0xFE, 0x0E) => self.stloc(&mut frame, instruction.u16_operand()?)?,
                (prefix, opcode) => {
                    return Err(UnimplementedOpcode {
                        mnemonic: instruction.mnemonic,
                        opcode: if prefix == 0xFE {
                            0xFE00 | u16::from(opcode)
                        } else {
                            u16::from(opcode)
                        },
                    })
                }
            }
        }
    }

    fn log_method_entry(frame: &Frame) {
        let assembly = frame.assembly();

        let Ok(method) = frame.method_def() else {
            return;
        };

        if let Some(type_def) = assembly.type_def_of_method(method.rid) {
            log::debug!(
                "executing method '[{}]{}.{}::{}'",
                assembly.name(),
                assembly
                    .string(type_def.type_namespace as usize)
                    .unwrap_or(""),
                assembly.string(type_def.type_name as usize).unwrap_or(""),
                assembly.string(method.name as usize).unwrap_or("")
            );
        }
    }

    fn brk() {
        unsafe {
            libc::raise(libc::SIGILL);
        }
    }

    fn ldc_i4(&mut self, value: i32) -> Result<()> {
        self.stack.push(value)
    }

    fn ldc_i8(&mut self, value: i64) -> Result<()> {
        self.stack.push(value)
    }

    fn ldc_r(&mut self, value: f64) -> Result<()> {
        self.stack.push(value)
    }

    /// Push an `O` reference whose payload is the user string token value.
    fn ldstr(&mut self, token: Token) -> Result<()> {
        self.stack.push(ManagedPointer(u64::from(token.value())))
    }

    /// Accepted with no stack effect; argument slots are not implemented.
    #[allow(clippy::unused_self)]
    fn ldarg(&self, _frame: &Frame, _index: u16) {}

    fn stloc(&mut self, frame: &mut Frame, index: u16) -> Result<()> {
        let value = self.stack.pop_slot()?;
        frame.set_local(index, value)
    }

    /// Push local `index`; with move semantics enabled the slot is cleared
    /// after the value is pushed.
    fn ldloc(&mut self, frame: &mut Frame, index: u16) -> Result<()> {
        let Some(value) = frame.local(index)? else {
            return Err(InvalidValueType);
        };

        self.stack.push_slot(value)?;

        if self.ldloc_moves {
            frame.clear_local(index)?;
        }

        Ok(())
    }

    /// Push an unmanaged pointer whose payload is the local slot index.
    ///
    /// The payload is an opaque identifier, not a native address. A pointer
    /// taken from a frame that has since been popped is dangling; its later
    /// use is undefined and not detected.
    fn ldloca(&mut self, index: u16) -> Result<()> {
        self.stack.push(UnmanagedPointer(u64::from(index)))
    }

    fn pop_discard(&mut self) -> Result<()> {
        self.stack.pop_slot()?;
        Ok(())
    }

    fn ldsfld(&mut self, frame: &Frame, token: Token) -> Result<()> {
        let key = self.load_static_field(frame, token)?;

        let Some(value) = self.statics.get(&key) else {
            return Err(InvalidValueType);
        };

        self.stack.push_slot(value)
    }

    /// Push an `O` whose payload is the field token value, an opaque
    /// identifier for the field's storage.
    fn ldsflda(&mut self, frame: &Frame, token: Token) -> Result<()> {
        let key = self.load_static_field(frame, token)?;

        self.stack
            .push(ManagedPointer(u64::from(key.field.value())))
    }

    fn stsfld(&mut self, frame: &Frame, token: Token) -> Result<()> {
        let key = self.load_static_field(frame, token)?;
        let value = self.stack.pop_slot()?;

        self.statics.set(key, value);
        Ok(())
    }

    /// Resolve a static field access: find the Field row and its declaring
    /// type, and run the type's `.cctor` if this is the first access.
    ///
    /// The type is marked initialized *before* the `.cctor` frame executes,
    /// so a static access from inside the `.cctor` does not recurse.
    fn load_static_field(&mut self, frame: &Frame, token: Token) -> Result<StaticKey> {
        if token.is_null() {
            return Err(NullToken);
        }

        let assembly = frame.assembly().clone();
        let field = assembly
            .row::<FieldRow>(token)
            .ok_or(TokenOutOfRange(token))?;

        let type_def = assembly.type_def_of_field(field.rid).ok_or_else(|| {
            malformed_error!("Field {} is not owned by any TypeDef", token)
        })?;

        if self
            .statics
            .mark_type_initialized(assembly.name(), type_def.token)
        {
            log::debug!(
                "initializing type '{}'",
                assembly.string(type_def.type_name as usize).unwrap_or("")
            );

            if let Some(cctor) = assembly.method_of_type(type_def.rid, ".cctor") {
                self.execute(Frame::new(assembly.clone(), cctor.token))?;
            }
        }

        log::trace!(
            "accessing field '{}'",
            assembly.string(field.name as usize).unwrap_or("")
        );

        Ok(StaticKey::new(assembly.name().clone(), token))
    }

    /// Dispatch a `call` by the token's table.
    fn call(&mut self, frame: &Frame, token: Token) -> Result<()> {
        match token.table() {
            id if id == TableId::MethodDef as u8 => {
                self.execute(Frame::new(frame.assembly().clone(), token))
            }
            id if id == TableId::MemberRef as u8 => {
                let (assembly, method_token) = self.resolve_member(frame, token)?;
                self.execute(Frame::new(assembly, method_token))
            }
            id => Err(InvalidCallToken(id)),
        }
    }

    /// `newobj`: allocate a heap object sized by the constructor's enclosing
    /// type, push the `O` handle, then run the constructor frame.
    fn newobj(&mut self, frame: &Frame, token: Token) -> Result<()> {
        let (assembly, method_token) = match token.table() {
            id if id == TableId::MethodDef as u8 => (frame.assembly().clone(), token),
            id if id == TableId::MemberRef as u8 => self.resolve_member(frame, token)?,
            id => return Err(InvalidCallToken(id)),
        };

        let method = assembly
            .row::<MethodDefRow>(method_token)
            .ok_or(TokenOutOfRange(method_token))?;

        let type_def = assembly.type_def_of_method(method.rid).ok_or_else(|| {
            malformed_error!("Constructor {} is not owned by any TypeDef", method_token)
        })?;

        let size = assembly.type_size(type_def.rid)?;
        let handle = self.heap.alloc(size)?;
        self.stack.push(ManagedPointer(handle))?;

        self.execute(Frame::new(assembly, method_token))
    }

    /// Resolve a `MemberRef` to a `(assembly, MethodDef token)` pair,
    /// consulting the loader chain when the target assembly is not yet in
    /// the registry.
    fn resolve_member(
        &mut self,
        frame: &Frame,
        token: Token,
    ) -> Result<(Arc<Assembly>, Token)> {
        let qualified = frame.assembly().qualified_member_name(token)?;
        let assembly = self.resolve_assembly(&qualified.assembly)?;

        let method = assembly
            .method_by_name(&qualified.namespace, &qualified.type_name, &qualified.method)
            .ok_or_else(|| MemberNotFound(qualified.to_string()))?;

        Ok((assembly, method.token))
    }
}
