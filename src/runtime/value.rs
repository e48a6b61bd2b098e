//! Runtime value types.
//!
//! Every value on the evaluation stack, in a local slot or in the static
//! field store carries one of the [`ValueType`] tags. Values that leave the
//! stack for a store are materialized as [`SlotValue`], a tagged union with a
//! small inline payload.

use std::fmt;

/// The type tag of one stack slot or stored variable.
///
/// Each tag has a fixed payload size: `Int32` occupies 4 bytes, every other
/// value-bearing tag occupies 8. `Invalid` marks a slot that holds nothing
/// and has size 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    /// No value
    Invalid,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// Native-sized signed integer
    NativeInt,
    /// Native-sized unsigned integer
    NativeUnsignedInt,
    /// Double-precision float
    F,
    /// Managed reference, carried as an opaque 64-bit handle
    O,
    /// Unmanaged pointer-sized integer
    Pointer,
}

impl ValueType {
    /// The payload size of this tag in bytes
    #[must_use]
    pub const fn size(self) -> u8 {
        match self {
            ValueType::Invalid => 0,
            ValueType::Int32 => 4,
            _ => 8,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Invalid => "invalid",
            ValueType::Int32 => "int32",
            ValueType::Int64 => "int64",
            ValueType::NativeInt => "native int",
            ValueType::NativeUnsignedInt => "native uint",
            ValueType::F => "F",
            ValueType::O => "O",
            ValueType::Pointer => "pointer",
        };

        f.write_str(name)
    }
}

/// Native-sized signed integer, 64-bit in this implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct NativeInt(pub i64);

/// Native-sized unsigned integer, 64-bit in this implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct NativeUint(pub u64);

/// A managed reference (`O` tag).
///
/// The payload is an opaque 64-bit identifier - a heap handle, a user string
/// token, or a static field token - never a native address. Dereferencing
/// goes through the owning map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct ManagedPointer(pub u64);

/// An unmanaged pointer-sized integer (`Pointer` tag).
///
/// Carried as an opaque identifier; the interpreter never dereferences it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct UnmanagedPointer(pub u64);

/// A typed value outside the evaluation stack: a local slot, a static field,
/// or a transient for stack-to-store moves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SlotValue {
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// Native-sized signed integer
    NativeInt(NativeInt),
    /// Native-sized unsigned integer
    NativeUint(NativeUint),
    /// Double-precision float
    Float(f64),
    /// Managed reference
    ObjectRef(ManagedPointer),
    /// Unmanaged pointer
    Pointer(UnmanagedPointer),
}

impl SlotValue {
    /// The tag of this value
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            SlotValue::Int32(_) => ValueType::Int32,
            SlotValue::Int64(_) => ValueType::Int64,
            SlotValue::NativeInt(_) => ValueType::NativeInt,
            SlotValue::NativeUint(_) => ValueType::NativeUnsignedInt,
            SlotValue::Float(_) => ValueType::F,
            SlotValue::ObjectRef(_) => ValueType::O,
            SlotValue::Pointer(_) => ValueType::Pointer,
        }
    }
}
