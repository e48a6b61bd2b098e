//! CIL opcode descriptor tables.
//!
//! Two tables describe the instruction encoding: [`INSTRUCTIONS`] covers the
//! single-byte base space, [`INSTRUCTIONS_FE`] the extended space selected by
//! the `0xFE` prefix byte. Each entry carries the mnemonic and the operand
//! kind; reserved slots carry an empty mnemonic and decode to an error.
//!
//! # Reference
//! - ECMA-335 6th Edition, Partition III

/// The operand encoding of one opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandType {
    /// No inline operand
    None,
    /// 8-bit signed immediate
    Int8,
    /// 8-bit unsigned immediate
    UInt8,
    /// 16-bit signed immediate
    Int16,
    /// 16-bit unsigned immediate
    UInt16,
    /// 32-bit signed immediate
    Int32,
    /// 32-bit unsigned immediate
    UInt32,
    /// 64-bit signed immediate
    Int64,
    /// 64-bit unsigned immediate
    UInt64,
    /// 32-bit float immediate
    Float32,
    /// 64-bit float immediate
    Float64,
    /// 32-bit metadata token
    Token,
    /// 32-bit case count followed by that many 32-bit branch targets
    Switch,
}

/// Static description of one opcode slot.
#[derive(Clone, Copy, Debug)]
pub struct OpcodeInfo {
    /// Mnemonic, empty for reserved slots
    pub mnemonic: &'static str,
    /// Operand encoding
    pub operand: OperandType,
}

const fn op(mnemonic: &'static str, operand: OperandType) -> OpcodeInfo {
    OpcodeInfo { mnemonic, operand }
}

const RESERVED: OpcodeInfo = op("", OperandType::None);

/// Descriptors for the single-byte opcode space.
pub static INSTRUCTIONS: [OpcodeInfo; 256] = {
    use OperandType::{Float32, Float64, Int32, Int64, Int8, None, Switch, Token, UInt8};

    let mut t = [RESERVED; 256];

    t[0x00] = op("nop", None);
    t[0x01] = op("break", None);
    t[0x02] = op("ldarg.0", None);
    t[0x03] = op("ldarg.1", None);
    t[0x04] = op("ldarg.2", None);
    t[0x05] = op("ldarg.3", None);
    t[0x06] = op("ldloc.0", None);
    t[0x07] = op("ldloc.1", None);
    t[0x08] = op("ldloc.2", None);
    t[0x09] = op("ldloc.3", None);
    t[0x0A] = op("stloc.0", None);
    t[0x0B] = op("stloc.1", None);
    t[0x0C] = op("stloc.2", None);
    t[0x0D] = op("stloc.3", None);
    t[0x0E] = op("ldarg.s", UInt8);
    t[0x0F] = op("ldarga.s", UInt8);
    t[0x10] = op("starg.s", UInt8);
    t[0x11] = op("ldloc.s", UInt8);
    t[0x12] = op("ldloca.s", UInt8);
    t[0x13] = op("stloc.s", UInt8);
    t[0x14] = op("ldnull", None);
    t[0x15] = op("ldc.i4.m1", None);
    t[0x16] = op("ldc.i4.0", None);
    t[0x17] = op("ldc.i4.1", None);
    t[0x18] = op("ldc.i4.2", None);
    t[0x19] = op("ldc.i4.3", None);
    t[0x1A] = op("ldc.i4.4", None);
    t[0x1B] = op("ldc.i4.5", None);
    t[0x1C] = op("ldc.i4.6", None);
    t[0x1D] = op("ldc.i4.7", None);
    t[0x1E] = op("ldc.i4.8", None);
    t[0x1F] = op("ldc.i4.s", Int8);
    t[0x20] = op("ldc.i4", Int32);
    t[0x21] = op("ldc.i8", Int64);
    t[0x22] = op("ldc.r4", Float32);
    t[0x23] = op("ldc.r8", Float64);
    t[0x25] = op("dup", None);
    t[0x26] = op("pop", None);
    t[0x27] = op("jmp", Token);
    t[0x28] = op("call", Token);
    t[0x29] = op("calli", Token);
    t[0x2A] = op("ret", None);
    t[0x2B] = op("br.s", Int8);
    t[0x2C] = op("brfalse.s", Int8);
    t[0x2D] = op("brtrue.s", Int8);
    t[0x2E] = op("beq.s", Int8);
    t[0x2F] = op("bge.s", Int8);
    t[0x30] = op("bgt.s", Int8);
    t[0x31] = op("ble.s", Int8);
    t[0x32] = op("blt.s", Int8);
    t[0x33] = op("bne.un.s", Int8);
    t[0x34] = op("bge.un.s", Int8);
    t[0x35] = op("bgt.un.s", Int8);
    t[0x36] = op("ble.un.s", Int8);
    t[0x37] = op("blt.un.s", Int8);
    t[0x38] = op("br", Int32);
    t[0x39] = op("brfalse", Int32);
    t[0x3A] = op("brtrue", Int32);
    t[0x3B] = op("beq", Int32);
    t[0x3C] = op("bge", Int32);
    t[0x3D] = op("bgt", Int32);
    t[0x3E] = op("ble", Int32);
    t[0x3F] = op("blt", Int32);
    t[0x40] = op("bne.un", Int32);
    t[0x41] = op("bge.un", Int32);
    t[0x42] = op("bgt.un", Int32);
    t[0x43] = op("ble.un", Int32);
    t[0x44] = op("blt.un", Int32);
    t[0x45] = op("switch", Switch);
    t[0x46] = op("ldind.i1", None);
    t[0x47] = op("ldind.u1", None);
    t[0x48] = op("ldind.i2", None);
    t[0x49] = op("ldind.u2", None);
    t[0x4A] = op("ldind.i4", None);
    t[0x4B] = op("ldind.u4", None);
    t[0x4C] = op("ldind.i8", None);
    t[0x4D] = op("ldind.i", None);
    t[0x4E] = op("ldind.r4", None);
    t[0x4F] = op("ldind.r8", None);
    t[0x50] = op("ldind.ref", None);
    t[0x51] = op("stind.ref", None);
    t[0x52] = op("stind.i1", None);
    t[0x53] = op("stind.i2", None);
    t[0x54] = op("stind.i4", None);
    t[0x55] = op("stind.i8", None);
    t[0x56] = op("stind.r4", None);
    t[0x57] = op("stind.r8", None);
    t[0x58] = op("add", None);
    t[0x59] = op("sub", None);
    t[0x5A] = op("mul", None);
    t[0x5B] = op("div", None);
    t[0x5C] = op("div.un", None);
    t[0x5D] = op("rem", None);
    t[0x5E] = op("rem.un", None);
    t[0x5F] = op("and", None);
    t[0x60] = op("or", None);
    t[0x61] = op("xor", None);
    t[0x62] = op("shl", None);
    t[0x63] = op("shr", None);
    t[0x64] = op("shr.un", None);
    t[0x65] = op("neg", None);
    t[0x66] = op("not", None);
    t[0x67] = op("conv.i1", None);
    t[0x68] = op("conv.i2", None);
    t[0x69] = op("conv.i4", None);
    t[0x6A] = op("conv.i8", None);
    t[0x6B] = op("conv.r4", None);
    t[0x6C] = op("conv.r8", None);
    t[0x6D] = op("conv.u4", None);
    t[0x6E] = op("conv.u8", None);
    t[0x6F] = op("callvirt", Token);
    t[0x70] = op("cpobj", Token);
    t[0x71] = op("ldobj", Token);
    t[0x72] = op("ldstr", Token);
    t[0x73] = op("newobj", Token);
    t[0x74] = op("castclass", Token);
    t[0x75] = op("isinst", Token);
    t[0x76] = op("conv.r.un", None);
    t[0x79] = op("unbox", Token);
    t[0x7A] = op("throw", None);
    t[0x7B] = op("ldfld", Token);
    t[0x7C] = op("ldflda", Token);
    t[0x7D] = op("stfld", Token);
    t[0x7E] = op("ldsfld", Token);
    t[0x7F] = op("ldsflda", Token);
    t[0x80] = op("stsfld", Token);
    t[0x81] = op("stobj", Token);
    t[0x82] = op("conv.ovf.i1.un", None);
    t[0x83] = op("conv.ovf.i2.un", None);
    t[0x84] = op("conv.ovf.i4.un", None);
    t[0x85] = op("conv.ovf.i8.un", None);
    t[0x86] = op("conv.ovf.u1.un", None);
    t[0x87] = op("conv.ovf.u2.un", None);
    t[0x88] = op("conv.ovf.u4.un", None);
    t[0x89] = op("conv.ovf.u8.un", None);
    t[0x8A] = op("conv.ovf.i.un", None);
    t[0x8B] = op("conv.ovf.u.un", None);
    t[0x8C] = op("box", Token);
    t[0x8D] = op("newarr", Token);
    t[0x8E] = op("ldlen", None);
    t[0x8F] = op("ldelema", Token);
    t[0x90] = op("ldelem.i1", None);
    t[0x91] = op("ldelem.u1", None);
    t[0x92] = op("ldelem.i2", None);
    t[0x93] = op("ldelem.u2", None);
    t[0x94] = op("ldelem.i4", None);
    t[0x95] = op("ldelem.u4", None);
    t[0x96] = op("ldelem.i8", None);
    t[0x97] = op("ldelem.i", None);
    t[0x98] = op("ldelem.r4", None);
    t[0x99] = op("ldelem.r8", None);
    t[0x9A] = op("ldelem.ref", None);
    t[0x9B] = op("stelem.i", None);
    t[0x9C] = op("stelem.i1", None);
    t[0x9D] = op("stelem.i2", None);
    t[0x9E] = op("stelem.i4", None);
    t[0x9F] = op("stelem.i8", None);
    t[0xA0] = op("stelem.r4", None);
    t[0xA1] = op("stelem.r8", None);
    t[0xA2] = op("stelem.ref", None);
    t[0xA3] = op("ldelem", Token);
    t[0xA4] = op("stelem", Token);
    t[0xA5] = op("unbox.any", Token);
    t[0xB3] = op("conv.ovf.i1", None);
    t[0xB4] = op("conv.ovf.u1", None);
    t[0xB5] = op("conv.ovf.i2", None);
    t[0xB6] = op("conv.ovf.u2", None);
    t[0xB7] = op("conv.ovf.i4", None);
    t[0xB8] = op("conv.ovf.u4", None);
    t[0xB9] = op("conv.ovf.i8", None);
    t[0xBA] = op("conv.ovf.u8", None);
    t[0xC2] = op("refanyval", Token);
    t[0xC3] = op("ckfinite", None);
    t[0xC6] = op("mkrefany", Token);
    t[0xD0] = op("ldtoken", Token);
    t[0xD1] = op("conv.u2", None);
    t[0xD2] = op("conv.u1", None);
    t[0xD3] = op("conv.i", None);
    t[0xD4] = op("conv.ovf.i", None);
    t[0xD5] = op("conv.ovf.u", None);
    t[0xD6] = op("add.ovf", None);
    t[0xD7] = op("add.ovf.un", None);
    t[0xD8] = op("mul.ovf", None);
    t[0xD9] = op("mul.ovf.un", None);
    t[0xDA] = op("sub.ovf", None);
    t[0xDB] = op("sub.ovf.un", None);
    t[0xDC] = op("endfinally", None);
    t[0xDD] = op("leave", Int32);
    t[0xDE] = op("leave.s", Int8);
    t[0xDF] = op("stind.i", None);
    t[0xE0] = op("conv.u", None);

    t
};

/// Descriptors for the `0xFE`-prefixed opcode space.
pub static INSTRUCTIONS_FE: [OpcodeInfo; 0x1F] = {
    use OperandType::{None, Token, UInt16, UInt8};

    let mut t = [RESERVED; 0x1F];

    t[0x00] = op("arglist", None);
    t[0x01] = op("ceq", None);
    t[0x02] = op("cgt", None);
    t[0x03] = op("cgt.un", None);
    t[0x04] = op("clt", None);
    t[0x05] = op("clt.un", None);
    t[0x06] = op("ldftn", Token);
    t[0x07] = op("ldvirtftn", Token);
    t[0x09] = op("ldarg", UInt16);
    t[0x0A] = op("ldarga", UInt16);
    t[0x0B] = op("starg", UInt16);
    t[0x0C] = op("ldloc", UInt16);
    t[0x0D] = op("ldloca", UInt16);
    t[0x0E] = op("stloc", UInt16);
    t[0x0F] = op("localloc", None);
    t[0x11] = op("endfilter", None);
    t[0x12] = op("unaligned.", UInt8);
    t[0x13] = op("volatile.", None);
    t[0x14] = op("tail.", None);
    t[0x15] = op("initobj", Token);
    t[0x16] = op("constrained.", Token);
    t[0x17] = op("cpblk", None);
    t[0x18] = op("initblk", None);
    t[0x19] = op("no.", UInt8);
    t[0x1A] = op("rethrow", None);
    t[0x1C] = op("sizeof", Token);
    t[0x1D] = op("refanytype", None);
    t[0x1E] = op("readonly.", None);

    t
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_slots() {
        assert_eq!(INSTRUCTIONS[0x00].mnemonic, "nop");
        assert_eq!(INSTRUCTIONS[0x28].mnemonic, "call");
        assert_eq!(INSTRUCTIONS[0x28].operand, OperandType::Token);
        assert_eq!(INSTRUCTIONS[0x2B].mnemonic, "br.s");
        assert_eq!(INSTRUCTIONS[0x2B].operand, OperandType::Int8);
        assert_eq!(INSTRUCTIONS[0xE0].mnemonic, "conv.u");

        assert_eq!(INSTRUCTIONS_FE[0x01].mnemonic, "ceq");
        assert_eq!(INSTRUCTIONS_FE[0x0C].mnemonic, "ldloc");
        assert_eq!(INSTRUCTIONS_FE[0x0C].operand, OperandType::UInt16);
    }

    #[test]
    fn reserved_slots() {
        assert!(INSTRUCTIONS[0x24].mnemonic.is_empty());
        assert!(INSTRUCTIONS[0xFF].mnemonic.is_empty());
        assert!(INSTRUCTIONS_FE[0x08].mnemonic.is_empty());
    }
}
