//! CIL method body header parsing.
//!
//! A method body starts with either a tiny header (one byte, code size in the
//! upper six bits) or a fat header (12 bytes carrying flags, max stack, code
//! size and the local variable signature token). Anything else is rejected as
//! an unsupported header.
//!
//! # Reference
//! - ECMA-335 6th Edition, Partition II.25.4

use bitflags::bitflags;

use crate::{
    file::io::read_le,
    metadata::token::Token,
    Error::{OutOfBounds, UnsupportedMethodHeader},
    Result,
};

bitflags! {
    /// Flag bits of a method body header.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct MethodBodyFlags: u16 {
        /// The body uses the tiny, single-byte header format
        const TINY_FORMAT = 0x0002;
        /// The body uses the fat, multi-DWORD header format
        const FAT_FORMAT = 0x0003;
        /// Extra data sections follow the code (exception tables)
        const MORE_SECTS = 0x0008;
        /// Locals shall be zero-initialized on entry
        const INIT_LOCALS = 0x0010;
    }
}

/// The decoded header of one CIL method body.
pub struct MethodBody {
    /// Size of the code in bytes, not counting the header
    pub size_code: usize,
    /// Size of the header in bytes
    pub size_header: usize,
    /// Token describing the layout of the local variables, 0 when absent
    pub local_var_sig_token: u32,
    /// Maximum number of items on the evaluation stack
    pub max_stack: usize,
    /// The body uses the fat header format
    pub is_fat: bool,
    /// Locals shall be zero-initialized on entry
    pub is_init_local: bool,
}

impl MethodBody {
    /// Decode a method body header from the bytes at the method's RVA.
    ///
    /// # Arguments
    /// * `data` - The bytes starting at the method body, running at least to
    ///   the end of the code
    /// * `token` - The method's token, used in the error when the header is
    ///   neither tiny nor fat
    ///
    /// # Errors
    /// Returns [`UnsupportedMethodHeader`] if the format bits select neither
    /// format, or [`OutOfBounds`] if the declared code overruns `data`.
    pub fn parse(data: &[u8], token: Token) -> Result<MethodBody> {
        if data.is_empty() {
            return Err(OutOfBounds);
        }

        let first_byte = read_le::<u8>(data)?;
        match MethodBodyFlags::from_bits_truncate(u16::from(first_byte & 0x03)) {
            MethodBodyFlags::TINY_FORMAT => {
                let size_code = (first_byte >> 2) as usize;
                if 1 + size_code > data.len() {
                    return Err(OutOfBounds);
                }

                Ok(MethodBody {
                    size_code,
                    size_header: 1,
                    local_var_sig_token: 0,
                    max_stack: 8,
                    is_fat: false,
                    is_init_local: false,
                })
            }
            MethodBodyFlags::FAT_FORMAT => {
                if data.len() < 12 {
                    return Err(OutOfBounds);
                }

                let first_duo = read_le::<u16>(data)?;
                let flags = MethodBodyFlags::from_bits_truncate(first_duo & 0x0FFF);

                let size_header = ((first_duo >> 12) as usize) * 4;
                let max_stack = read_le::<u16>(&data[2..])? as usize;
                let size_code = read_le::<u32>(&data[4..])? as usize;
                let local_var_sig_token = read_le::<u32>(&data[8..])?;

                let Some(body_end) = size_header.checked_add(size_code) else {
                    return Err(OutOfBounds);
                };

                if size_header < 12 || body_end > data.len() {
                    return Err(OutOfBounds);
                }

                Ok(MethodBody {
                    size_code,
                    size_header,
                    local_var_sig_token,
                    max_stack,
                    is_fat: true,
                    is_init_local: flags.contains(MethodBodyFlags::INIT_LOCALS),
                })
            }
            _ => Err(UnsupportedMethodHeader(token)),
        }
    }
}
