use crate::{
    file::io::read_le_at,
    metadata::{
        tables::{TableId, TableRow},
        token::Token,
    },
    Result,
};

/// One row of the `TypeRef` table (0x01): a type defined in another module.
#[derive(Clone, Copy, Debug)]
pub struct TypeRefRow {
    /// `RowID`
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// `ResolutionScope` coded index: where the type is defined
    pub resolution_scope: u16,
    /// Index into `#Strings`: the type name
    pub type_name: u16,
    /// Index into `#Strings`: the type namespace
    pub type_namespace: u16,
}

impl TableRow for TypeRefRow {
    const TABLE: TableId = TableId::TypeRef;

    fn read(data: &[u8], rid: u32) -> Result<Self> {
        let mut offset = 0;

        Ok(TypeRefRow {
            rid,
            token: Token::from_parts(Self::TABLE as u8, rid),
            resolution_scope: read_le_at::<u16>(data, &mut offset)?,
            type_name: read_le_at::<u16>(data, &mut offset)?,
            type_namespace: read_le_at::<u16>(data, &mut offset)?,
        })
    }
}

/// Decode a `ResolutionScope` coded index, accepting only the `AssemblyRef`
/// tag (2-bit tag value 2) and returning the 1-based `AssemblyRef` row index.
///
/// Module, `ModuleRef` and nested `TypeRef` scopes are outside the supported
/// resolution path and yield `None`.
#[must_use]
pub fn resolution_scope_assembly_ref(coded: u16) -> Option<u32> {
    if coded & 0x3 == 2 {
        Some(u32::from(coded >> 2))
    } else {
        None
    }
}
