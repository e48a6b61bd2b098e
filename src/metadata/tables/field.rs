use crate::{
    file::io::read_le_at,
    metadata::{
        tables::{TableId, TableRow},
        token::Token,
    },
    Result,
};

/// One row of the `Field` table (0x04): a field declared by a type.
#[derive(Clone, Copy, Debug)]
pub struct FieldRow {
    /// `RowID`
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// `FieldAttributes` bit mask
    pub flags: u16,
    /// Index into `#Strings`: the field name
    pub name: u16,
    /// Index into `#Blob`: the field signature
    pub signature: u16,
}

impl TableRow for FieldRow {
    const TABLE: TableId = TableId::Field;

    fn read(data: &[u8], rid: u32) -> Result<Self> {
        let mut offset = 0;

        Ok(FieldRow {
            rid,
            token: Token::from_parts(Self::TABLE as u8, rid),
            flags: read_le_at::<u16>(data, &mut offset)?,
            name: read_le_at::<u16>(data, &mut offset)?,
            signature: read_le_at::<u16>(data, &mut offset)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data = [
            0x16, 0x00, // flags: static | public
            0x2A, 0x00, // name
            0x03, 0x00, // signature
        ];

        let row = FieldRow::read(&data, 1).unwrap();

        assert_eq!(row.token.value(), 0x0400_0001);
        assert_eq!(row.flags, 0x16);
        assert_eq!(row.name, 0x2A);
        assert_eq!(row.signature, 3);
    }
}
