use crate::{
    file::io::read_le_at,
    metadata::{
        tables::{TableId, TableRow},
        token::Token,
    },
    Result,
};

/// One row of the `MemberRef` table (0x0A): a member defined elsewhere,
/// referenced from this module.
#[derive(Clone, Copy, Debug)]
pub struct MemberRefRow {
    /// `RowID`
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// `MemberRefParent` coded index: the class declaring the member
    pub class: u16,
    /// Index into `#Strings`: the member name
    pub name: u16,
    /// Index into `#Blob`: the member signature
    pub signature: u16,
}

impl TableRow for MemberRefRow {
    const TABLE: TableId = TableId::MemberRef;

    fn read(data: &[u8], rid: u32) -> Result<Self> {
        let mut offset = 0;

        Ok(MemberRefRow {
            rid,
            token: Token::from_parts(Self::TABLE as u8, rid),
            class: read_le_at::<u16>(data, &mut offset)?,
            name: read_le_at::<u16>(data, &mut offset)?,
            signature: read_le_at::<u16>(data, &mut offset)?,
        })
    }
}

/// Decode a `MemberRefParent` coded index, accepting only the `TypeRef` tag
/// (3-bit tag value 1) and returning the 1-based `TypeRef` row index.
///
/// `TypeDef`, `ModuleRef`, `MethodDef` and `TypeSpec` parents are outside the
/// supported resolution path and yield `None`.
#[must_use]
pub fn member_ref_parent_type_ref(coded: u16) -> Option<u32> {
    if coded & 0x7 == 1 {
        Some(u32::from(coded >> 3))
    } else {
        None
    }
}
