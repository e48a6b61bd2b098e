use crate::{
    file::io::read_le_at,
    metadata::{
        tables::{TableId, TableRow},
        token::Token,
    },
    Result,
};

/// One row of the `Module` table (0x00): the identity of the current module.
#[derive(Clone, Copy, Debug)]
pub struct ModuleRow {
    /// `RowID`
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Reserved, shall be 0
    pub generation: u16,
    /// Index into `#Strings`: the module name
    pub name: u16,
    /// Index into `#GUID`: the module version id
    pub mvid: u16,
    /// Index into `#GUID`, reserved
    pub enc_id: u16,
    /// Index into `#GUID`, reserved
    pub enc_base_id: u16,
}

impl TableRow for ModuleRow {
    const TABLE: TableId = TableId::Module;

    fn read(data: &[u8], rid: u32) -> Result<Self> {
        let mut offset = 0;

        Ok(ModuleRow {
            rid,
            token: Token::from_parts(Self::TABLE as u8, rid),
            generation: read_le_at::<u16>(data, &mut offset)?,
            name: read_le_at::<u16>(data, &mut offset)?,
            mvid: read_le_at::<u16>(data, &mut offset)?,
            enc_id: read_le_at::<u16>(data, &mut offset)?,
            enc_base_id: read_le_at::<u16>(data, &mut offset)?,
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
            0x00, 0x00, // generation
            0x01, 0x00, // name
            0x01, 0x00, // mvid
            0x00, 0x00, // enc_id
            0x00, 0x00, // enc_base_id
        ];

        let row = ModuleRow::read(&data, 1).unwrap();

        assert_eq!(row.rid, 1);
        assert_eq!(row.token.value(), 0x0000_0001);
        assert_eq!(row.name, 1);
        assert_eq!(row.mvid, 1);
    }

    #[test]
    fn truncated() {
        assert!(ModuleRow::read(&[0x00; 4], 1).is_err());
    }
}
