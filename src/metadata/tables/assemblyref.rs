use crate::{
    file::io::read_le_at,
    metadata::{
        tables::{TableId, TableRow},
        token::Token,
    },
    Result,
};

/// One row of the `AssemblyRef` table (0x23): an assembly this module depends
/// on.
#[derive(Clone, Copy, Debug)]
pub struct AssemblyRefRow {
    /// `RowID`
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Major version of the referenced assembly
    pub major_version: u16,
    /// Minor version of the referenced assembly
    pub minor_version: u16,
    /// Build number of the referenced assembly
    pub build_number: u16,
    /// Revision number of the referenced assembly
    pub revision_number: u16,
    /// `AssemblyFlags` bit mask
    pub flags: u32,
    /// Index into `#Blob`: public key or token of the referenced assembly
    pub public_key_or_token: u16,
    /// Index into `#Strings`: the assembly name
    pub name: u16,
    /// Index into `#Strings`: the assembly culture
    pub culture: u16,
    /// Index into `#Blob`: hash of the referenced assembly
    pub hash_value: u16,
}

impl TableRow for AssemblyRefRow {
    const TABLE: TableId = TableId::AssemblyRef;

    fn read(data: &[u8], rid: u32) -> Result<Self> {
        let mut offset = 0;

        Ok(AssemblyRefRow {
            rid,
            token: Token::from_parts(Self::TABLE as u8, rid),
            major_version: read_le_at::<u16>(data, &mut offset)?,
            minor_version: read_le_at::<u16>(data, &mut offset)?,
            build_number: read_le_at::<u16>(data, &mut offset)?,
            revision_number: read_le_at::<u16>(data, &mut offset)?,
            flags: read_le_at::<u32>(data, &mut offset)?,
            public_key_or_token: read_le_at::<u16>(data, &mut offset)?,
            name: read_le_at::<u16>(data, &mut offset)?,
            culture: read_le_at::<u16>(data, &mut offset)?,
            hash_value: read_le_at::<u16>(data, &mut offset)?,
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
            0x08, 0x00,             // major_version = 8
            0x00, 0x00,             // minor_version
            0x00, 0x00,             // build_number
            0x00, 0x00,             // revision_number
            0x00, 0x00, 0x00, 0x00, // flags
            0x00, 0x00,             // public_key_or_token
            0x41, 0x00,             // name
            0x00, 0x00,             // culture
            0x00, 0x00,             // hash_value
        ];

        let row = AssemblyRefRow::read(&data, 1).unwrap();

        assert_eq!(row.token.value(), 0x2300_0001);
        assert_eq!(row.major_version, 8);
        assert_eq!(row.name, 0x41);
    }

    #[test]
    fn truncated() {
        assert!(AssemblyRefRow::read(&[0x00; 19], 1).is_err());
    }
}
