use crate::{
    file::io::read_le_at,
    metadata::{
        tables::{TableId, TableRow},
        token::Token,
    },
    Result,
};

/// One row of the `TypeDef` table (0x02): a type defined in this module.
///
/// `field_list` and `method_list` are the starts of this type's member
/// ranges; the ranges end where the next row's lists begin, and the last row
/// owns the tail of the member tables.
#[derive(Clone, Copy, Debug)]
pub struct TypeDefRow {
    /// `RowID`
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// `TypeAttributes` bit mask
    pub flags: u32,
    /// Index into `#Strings`: the type name
    pub type_name: u16,
    /// Index into `#Strings`: the type namespace
    pub type_namespace: u16,
    /// `TypeDefOrRef` coded index: the base type
    pub extends: u16,
    /// Index into the `Field` table: first field owned by this type
    pub field_list: u16,
    /// Index into the `MethodDef` table: first method owned by this type
    pub method_list: u16,
}

impl TableRow for TypeDefRow {
    const TABLE: TableId = TableId::TypeDef;

    fn read(data: &[u8], rid: u32) -> Result<Self> {
        let mut offset = 0;

        Ok(TypeDefRow {
            rid,
            token: Token::from_parts(Self::TABLE as u8, rid),
            flags: read_le_at::<u32>(data, &mut offset)?,
            type_name: read_le_at::<u16>(data, &mut offset)?,
            type_namespace: read_le_at::<u16>(data, &mut offset)?,
            extends: read_le_at::<u16>(data, &mut offset)?,
            field_list: read_le_at::<u16>(data, &mut offset)?,
            method_list: read_le_at::<u16>(data, &mut offset)?,
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
            0x00, 0x00, 0x10, 0x00, // flags
            0x0B, 0x00,             // type_name
            0x05, 0x00,             // type_namespace
            0x00, 0x00,             // extends
            0x01, 0x00,             // field_list
            0x02, 0x00,             // method_list
        ];

        let row = TypeDefRow::read(&data, 2).unwrap();

        assert_eq!(row.token.value(), 0x0200_0002);
        assert_eq!(row.flags, 0x0010_0000);
        assert_eq!(row.type_name, 0x0B);
        assert_eq!(row.field_list, 1);
        assert_eq!(row.method_list, 2);
    }

    #[test]
    fn truncated() {
        assert!(TypeDefRow::read(&[0x00; 10], 1).is_err());
    }
}
