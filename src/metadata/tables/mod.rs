//! Typed metadata table rows and table identifiers.
//!
//! Each CLI metadata table is identified by a [`TableId`] (the high byte of a
//! token) and stores fixed-size rows. The `#~` stream parser lays tables out
//! with [`row_size`]; the typed row structs in this module decode individual
//! rows on demand.
//!
//! Row sizes here assume that no heap and no table exceeds 2^16 entries, so
//! every heap index and every table index is 2 bytes wide. Larger assemblies
//! would need the `heap_sizes`-driven widening described in ECMA-335
//! II.24.2.6; that widening is deliberately not implemented.
//!
//! # Reference
//! - ECMA-335 6th Edition, Partition II.22

mod assemblyref;
mod classlayout;
mod field;
mod memberref;
mod methoddef;
mod module;
mod typedef;
mod typeref;

pub use assemblyref::AssemblyRefRow;
pub use classlayout::ClassLayoutRow;
pub use field::FieldRow;
pub use memberref::{member_ref_parent_type_ref, MemberRefRow};
pub use methoddef::MethodDefRow;
pub use module::ModuleRow;
pub use typedef::TypeDefRow;
pub use typeref::{resolution_scope_assembly_ref, TypeRefRow};

use strum::{EnumIter, FromRepr};

use crate::Result;

/// Identifier of one CLI metadata table, matching the high byte of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, FromRepr)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum TableId {
    Module = 0x00,
    TypeRef = 0x01,
    TypeDef = 0x02,
    Field = 0x04,
    MethodDef = 0x06,
    Param = 0x08,
    InterfaceImpl = 0x09,
    MemberRef = 0x0A,
    Constant = 0x0B,
    CustomAttribute = 0x0C,
    FieldMarshal = 0x0D,
    DeclSecurity = 0x0E,
    ClassLayout = 0x0F,
    FieldLayout = 0x10,
    StandAloneSig = 0x11,
    EventMap = 0x12,
    Event = 0x14,
    PropertyMap = 0x15,
    Property = 0x17,
    MethodSemantics = 0x18,
    MethodImpl = 0x19,
    ModuleRef = 0x1A,
    TypeSpec = 0x1B,
    ImplMap = 0x1C,
    FieldRva = 0x1D,
    Assembly = 0x20,
    AssemblyProcessor = 0x21,
    AssemblyOs = 0x22,
    AssemblyRef = 0x23,
    AssemblyRefProcessor = 0x24,
    AssemblyRefOs = 0x25,
    File = 0x26,
    ExportedType = 0x27,
    ManifestResource = 0x28,
    NestedClass = 0x29,
    GenericParam = 0x2A,
    MethodSpec = 0x2B,
    GenericParamConstraint = 0x2C,
}

/// The fixed row size in bytes for the given table id.
///
/// Ids without a supported row layout report 0; their rows occupy no bytes in
/// the computed table layout, which restricts this loader to assemblies whose
/// extra tables are empty.
#[must_use]
pub const fn row_size(id: u8) -> u8 {
    match TableId::from_repr(id) {
        Some(TableId::Module) => 0x0A,
        Some(TableId::TypeRef) => 0x06,
        Some(TableId::TypeDef) => 0x0E,
        Some(TableId::Field) => 0x06,
        Some(TableId::MethodDef) => 0x0E,
        Some(TableId::Param) => 0x06,
        Some(TableId::MemberRef) => 0x06,
        Some(TableId::CustomAttribute) => 0x06,
        Some(TableId::ClassLayout) => 0x08,
        Some(TableId::StandAloneSig) => 0x02,
        Some(TableId::Assembly) => 0x16,
        Some(TableId::AssemblyRef) => 0x14,
        _ => 0,
    }
}

/// One typed metadata table row, decodable from its fixed-size byte slice.
pub trait TableRow: Sized {
    /// The table this row type belongs to
    const TABLE: TableId;

    /// Decode one row from its raw bytes
    ///
    /// # Arguments
    /// * `data` - Exactly one row worth of bytes
    /// * `rid` - The 1-based row index, used to form the row's token
    ///
    /// # Errors
    /// Returns an error if `data` is shorter than the fixed row size
    fn read(data: &[u8], rid: u32) -> Result<Self>;
}
