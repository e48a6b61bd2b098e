use crate::{
    file::io::read_le_at,
    metadata::{
        tables::{TableId, TableRow},
        token::Token,
    },
    Result,
};

/// One row of the `ClassLayout` table (0x0F): explicit size and packing for a
/// type.
#[derive(Clone, Copy, Debug)]
pub struct ClassLayoutRow {
    /// `RowID`
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Alignment of fields within the class
    pub packing_size: u16,
    /// Explicit byte size of the class
    pub class_size: u32,
    /// Index into the `TypeDef` table: the type this layout applies to
    pub parent: u16,
}

impl TableRow for ClassLayoutRow {
    const TABLE: TableId = TableId::ClassLayout;

    fn read(data: &[u8], rid: u32) -> Result<Self> {
        let mut offset = 0;

        Ok(ClassLayoutRow {
            rid,
            token: Token::from_parts(Self::TABLE as u8, rid),
            packing_size: read_le_at::<u16>(data, &mut offset)?,
            class_size: read_le_at::<u32>(data, &mut offset)?,
            parent: read_le_at::<u16>(data, &mut offset)?,
        })
    }
}
