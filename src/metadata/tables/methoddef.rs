use crate::{
    file::io::read_le_at,
    metadata::{
        tables::{TableId, TableRow},
        token::Token,
    },
    Result,
};

/// One row of the `MethodDef` table (0x06): a method defined in this module.
#[derive(Clone, Copy, Debug)]
pub struct MethodDefRow {
    /// `RowID`
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// RVA of the method body, 0 for abstract and runtime-provided methods
    pub rva: u32,
    /// `MethodImplAttributes` bit mask
    pub impl_flags: u16,
    /// `MethodAttributes` bit mask
    pub flags: u16,
    /// Index into `#Strings`: the method name
    pub name: u16,
    /// Index into `#Blob`: the method signature
    pub signature: u16,
    /// Index into the `Param` table: first parameter of this method
    pub param_list: u16,
}

impl TableRow for MethodDefRow {
    const TABLE: TableId = TableId::MethodDef;

    fn read(data: &[u8], rid: u32) -> Result<Self> {
        let mut offset = 0;

        Ok(MethodDefRow {
            rid,
            token: Token::from_parts(Self::TABLE as u8, rid),
            rva: read_le_at::<u32>(data, &mut offset)?,
            impl_flags: read_le_at::<u16>(data, &mut offset)?,
            flags: read_le_at::<u16>(data, &mut offset)?,
            name: read_le_at::<u16>(data, &mut offset)?,
            signature: read_le_at::<u16>(data, &mut offset)?,
            param_list: read_le_at::<u16>(data, &mut offset)?,
        })
    }
}
