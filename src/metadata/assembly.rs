//! The loaded CLI assembly.
//!
//! [`Assembly`] owns the PE file and the fully parsed metadata: the CLI
//! runtime header, the metadata root, the stream locations, and the `#~`
//! table layout. On top of that it provides token-based row lookup, heap
//! accessors, and the cross-table queries the execution engine needs
//! (method ownership, member-reference resolution, type sizes).
//!
//! Parsing is eager: construction walks every phase (PE envelope, CLI
//! header, metadata root, streams, tables) and fails with an error naming
//! the offending structure. Row decoding is lazy: typed rows are produced on
//! demand from the table byte ranges.

use std::{fmt, ops::Range, path::Path, sync::Arc};

use crate::{
    file::File,
    metadata::{
        cor20::Cor20Header,
        root::Root,
        streams::{Blob, Guids, Strings, TablesStream, UserStrings},
        tables::{
            member_ref_parent_type_ref, resolution_scope_assembly_ref, AssemblyRefRow,
            ClassLayoutRow, FieldRow, MemberRefRow, MethodDefRow, ModuleRow, TableId, TableRow,
            TypeDefRow, TypeRefRow,
        },
        token::Token,
    },
    Error::{NullToken, TokenOutOfRange},
    Result,
};

use strum::IntoEnumIterator;

/// The fully qualified name of a member referenced across assemblies.
///
/// Produced by [`Assembly::qualified_member_name`] from a `MemberRef` token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualifiedName {
    /// Name of the assembly declaring the member
    pub assembly: String,
    /// Namespace of the declaring type
    pub namespace: String,
    /// Name of the declaring type
    pub type_name: String,
    /// Name of the member itself
    pub method: String,
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]{}.{}::{}",
            self.assembly, self.namespace, self.type_name, self.method
        )
    }
}

/// File-offset ranges of the metadata heaps.
#[derive(Default)]
struct HeapRanges {
    strings: Option<Range<usize>>,
    user_strings: Option<Range<usize>>,
    blobs: Option<Range<usize>>,
    guids: Option<Range<usize>>,
}

/// One loaded CLI assembly: raw bytes plus parsed metadata.
pub struct Assembly {
    file: File,
    cor20: Cor20Header,
    root: Root,
    tables: TablesStream,
    tilde_offset: usize,
    heaps: HeapRanges,
    name: Arc<str>,
}

impl Assembly {
    /// Load an assembly from a file on disk.
    ///
    /// # Errors
    /// Returns an error naming the phase (PE envelope, CLI header, metadata
    /// root, stream, tables) that failed to parse.
    pub fn from_file(path: &Path) -> Result<Assembly> {
        Self::parse(File::from_file(path)?)
    }

    /// Load an assembly from a byte buffer.
    ///
    /// # Errors
    /// Returns an error naming the phase that failed to parse.
    pub fn from_mem(data: Vec<u8>) -> Result<Assembly> {
        Self::parse(File::from_mem(data)?)
    }

    fn parse(file: File) -> Result<Assembly> {
        let (clr_rva, clr_size) = file.clr();
        if clr_size < 72 {
            return Err(malformed_error!(
                "CLR runtime header directory is too small ({} bytes)",
                clr_size
            ));
        }

        let clr_offset = file.rva_to_offset(clr_rva)?;
        let cor20 = Cor20Header::read(file.data_slice(clr_offset, 72)?)?;

        let metadata_offset = file.rva_to_offset(cor20.meta_data_rva as usize)?;
        let metadata = file.data_slice(metadata_offset, cor20.meta_data_size as usize)?;
        let root = Root::read(metadata)?;

        let mut heaps = HeapRanges::default();
        let mut tilde: Option<Range<usize>> = None;
        for header in &root.stream_headers {
            let start = metadata_offset + header.offset as usize;
            let range = start..start + header.size as usize;

            match header.name.as_str() {
                "#~" => tilde = Some(range),
                "#Strings" => heaps.strings = Some(range),
                "#US" => heaps.user_strings = Some(range),
                "#Blob" => heaps.blobs = Some(range),
                "#GUID" => heaps.guids = Some(range),
                _ => {}
            }
        }

        let Some(tilde) = tilde else {
            return Err(malformed_error!("Assembly has no #~ stream"));
        };

        let tilde_offset = tilde.start;
        let tables = TablesStream::from(file.data_slice(tilde_offset, tilde.len())?)?;

        let name: Arc<str> = {
            let Some(row_range) = tables.row_range(TableId::Module as u8, 1) else {
                return Err(malformed_error!("Assembly has no Module row"));
            };

            let module = ModuleRow::read(
                file.data_slice(tilde_offset + row_range.start, row_range.len())?,
                1,
            )?;

            let Some(strings) = &heaps.strings else {
                return Err(malformed_error!("Assembly has no #Strings heap"));
            };

            let strings = Strings::from(file.data_slice(strings.start, strings.len())?)?;
            Arc::from(strings.get(module.name as usize)?)
        };

        Ok(Assembly {
            file,
            cor20,
            root,
            tables,
            tilde_offset,
            heaps,
            name,
        })
    }

    /// The module name of this assembly, from the Module row
    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// The metadata version string from the metadata root
    #[must_use]
    pub fn version(&self) -> &str {
        &self.root.version
    }

    /// The entrypoint token recorded in the CLI runtime header
    #[must_use]
    pub fn entry_point(&self) -> Token {
        self.cor20.entry_point()
    }

    /// The Optional header's stack reserve, used to size the evaluation stack
    #[must_use]
    pub fn stack_reserve(&self) -> u64 {
        self.file.stack_reserve()
    }

    /// The module version id from the `#GUID` heap
    ///
    /// # Errors
    /// Returns an error if the Module row or the GUID heap is missing
    pub fn mvid(&self) -> Result<[u8; 16]> {
        let module = self
            .row_by_index::<ModuleRow>(1)
            .ok_or_else(|| malformed_error!("Assembly has no Module row"))?;

        self.guids()?.get(module.mvid as usize)
    }

    /// Translate an RVA to a file offset through the section table
    ///
    /// # Errors
    /// Returns an error if no section contains the RVA
    pub fn rva_to_offset(&self, rva: usize) -> Result<usize> {
        self.file.rva_to_offset(rva)
    }

    /// A bounds-checked slice of the raw file data
    ///
    /// # Errors
    /// Returns an error if the range is out of bounds
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.file.data_slice(offset, len)
    }

    /// The raw file data from `offset` to the end of the file
    ///
    /// # Errors
    /// Returns an error if `offset` is past the end of the file
    pub fn data_from(&self, offset: usize) -> Result<&[u8]> {
        let len = self.file.len();
        if offset > len {
            return Err(crate::Error::OutOfBounds);
        }

        self.file.data_slice(offset, len - offset)
    }

    fn heap(&self, range: &Option<Range<usize>>, name: &str) -> Result<&[u8]> {
        match range {
            Some(range) => self.file.data_slice(range.start, range.len()),
            None => Err(malformed_error!("Assembly has no {} heap", name)),
        }
    }

    /// View over the `#Strings` heap
    ///
    /// # Errors
    /// Returns an error if the heap is absent or malformed
    pub fn strings(&self) -> Result<Strings<'_>> {
        Strings::from(self.heap(&self.heaps.strings, "#Strings")?)
    }

    /// View over the `#US` heap
    ///
    /// # Errors
    /// Returns an error if the heap is absent or malformed
    pub fn user_strings(&self) -> Result<UserStrings<'_>> {
        UserStrings::from(self.heap(&self.heaps.user_strings, "#US")?)
    }

    /// View over the `#Blob` heap
    ///
    /// # Errors
    /// Returns an error if the heap is absent or malformed
    pub fn blobs(&self) -> Result<Blob<'_>> {
        Blob::from(self.heap(&self.heaps.blobs, "#Blob")?)
    }

    /// View over the `#GUID` heap
    ///
    /// # Errors
    /// Returns an error if the heap is absent or malformed
    pub fn guids(&self) -> Result<Guids<'_>> {
        Guids::from(self.heap(&self.heaps.guids, "#GUID")?)
    }

    /// The string at the given `#Strings` heap offset
    ///
    /// # Errors
    /// Returns an error if the heap is absent or the index is invalid
    pub fn string(&self, index: usize) -> Result<&str> {
        self.strings()?.get(index)
    }

    /// The decoded user string at the given `#US` heap offset
    ///
    /// # Errors
    /// Returns an error if the heap is absent or the index is invalid
    pub fn user_string(&self, index: usize) -> Result<String> {
        self.user_strings()?.get(index)
    }

    /// The blob payload at the given `#Blob` heap offset
    ///
    /// # Errors
    /// Returns an error if the heap is absent or the index is invalid
    pub fn blob(&self, index: usize) -> Result<&[u8]> {
        self.blobs()?.get(index)
    }

    /// Number of rows in the given table
    #[must_use]
    pub fn row_count(&self, id: TableId) -> u32 {
        self.tables.row_count(id as u8)
    }

    /// Row counts of every non-empty table, in table-id order
    #[must_use]
    pub fn table_counts(&self) -> Vec<(TableId, u32)> {
        TableId::iter()
            .filter_map(|id| {
                let count = self.row_count(id);
                (count > 0).then_some((id, count))
            })
            .collect()
    }

    /// Resolve a token to a typed table row.
    ///
    /// Returns `None` for a null token, a token of a different table, or a
    /// row index outside the table.
    #[must_use]
    pub fn row<T: TableRow>(&self, token: Token) -> Option<T> {
        if token.table() != T::TABLE as u8 || token.is_null() {
            return None;
        }

        self.row_by_index(token.row())
    }

    /// Resolve a 1-based row index to a typed table row.
    ///
    /// Returns `None` for index 0 or an index outside the table.
    #[must_use]
    pub fn row_by_index<T: TableRow>(&self, rid: u32) -> Option<T> {
        let range = self.tables.row_range(T::TABLE as u8, rid)?;
        let data = self
            .file
            .data_slice(self.tilde_offset + range.start, range.len())
            .ok()?;

        T::read(data, rid).ok()
    }

    /// The methods owned by the given type: `[method_list, next method_list)`,
    /// where the last type owns the tail of the `MethodDef` table.
    #[must_use]
    pub fn method_range_of_type(&self, type_rid: u32) -> Option<Range<u32>> {
        let ty = self.row_by_index::<TypeDefRow>(type_rid)?;
        let start = u32::from(ty.method_list);
        let end = match self.row_by_index::<TypeDefRow>(type_rid + 1) {
            Some(next) => u32::from(next.method_list),
            None => self.row_count(TableId::MethodDef) + 1,
        };

        Some(start..end)
    }

    /// The fields owned by the given type, same scheme as
    /// [`Self::method_range_of_type`].
    #[must_use]
    pub fn field_range_of_type(&self, type_rid: u32) -> Option<Range<u32>> {
        let ty = self.row_by_index::<TypeDefRow>(type_rid)?;
        let start = u32::from(ty.field_list);
        let end = match self.row_by_index::<TypeDefRow>(type_rid + 1) {
            Some(next) => u32::from(next.field_list),
            None => self.row_count(TableId::Field) + 1,
        };

        Some(start..end)
    }

    /// The type whose method range contains the given `MethodDef` row
    #[must_use]
    pub fn type_def_of_method(&self, method_rid: u32) -> Option<TypeDefRow> {
        for type_rid in 1..=self.row_count(TableId::TypeDef) {
            if self.method_range_of_type(type_rid)?.contains(&method_rid) {
                return self.row_by_index(type_rid);
            }
        }

        None
    }

    /// The type whose field range contains the given `Field` row
    #[must_use]
    pub fn type_def_of_field(&self, field_rid: u32) -> Option<TypeDefRow> {
        for type_rid in 1..=self.row_count(TableId::TypeDef) {
            if self.field_range_of_type(type_rid)?.contains(&field_rid) {
                return self.row_by_index(type_rid);
            }
        }

        None
    }

    /// Find a method by namespace, type name and method name.
    ///
    /// Scans the `TypeDef` table linearly; once a type matches, only that
    /// type's method range is searched.
    #[must_use]
    pub fn method_by_name(
        &self,
        namespace: &str,
        type_name: &str,
        method: &str,
    ) -> Option<MethodDefRow> {
        let strings = self.strings().ok()?;

        for type_rid in 1..=self.row_count(TableId::TypeDef) {
            let ty = self.row_by_index::<TypeDefRow>(type_rid)?;

            if strings.get(ty.type_namespace as usize).ok()? != namespace {
                continue;
            }
            if strings.get(ty.type_name as usize).ok()? != type_name {
                continue;
            }

            return self.method_in_range(self.method_range_of_type(type_rid)?, method);
        }

        None
    }

    /// Find a method by name inside one type's method range.
    ///
    /// Used to locate `.cctor` on a type that is about to be initialized.
    #[must_use]
    pub fn method_of_type(&self, type_rid: u32, method: &str) -> Option<MethodDefRow> {
        self.method_in_range(self.method_range_of_type(type_rid)?, method)
    }

    fn method_in_range(&self, range: Range<u32>, method: &str) -> Option<MethodDefRow> {
        let strings = self.strings().ok()?;

        for rid in range {
            let row = self.row_by_index::<MethodDefRow>(rid)?;
            if strings.get(row.name as usize).ok()? == method {
                return Some(row);
            }
        }

        None
    }

    /// Resolve a `MemberRef` token to its fully qualified name via
    /// `MemberRef` → `TypeRef` → `AssemblyRef`.
    ///
    /// # Errors
    /// Returns an error if the token is null or out of range, if the parent
    /// chain uses an unsupported coded-index tag, or if a name cannot be
    /// read from the string heap.
    pub fn qualified_member_name(&self, token: Token) -> Result<QualifiedName> {
        if token.is_null() {
            return Err(NullToken);
        }

        let member = self
            .row::<MemberRefRow>(token)
            .ok_or(TokenOutOfRange(token))?;

        let type_ref_rid = member_ref_parent_type_ref(member.class).ok_or_else(|| {
            malformed_error!("MemberRef {} parent is not a TypeRef", member.token)
        })?;
        let type_ref = self
            .row_by_index::<TypeRefRow>(type_ref_rid)
            .ok_or_else(|| {
                TokenOutOfRange(Token::from_parts(TableId::TypeRef as u8, type_ref_rid))
            })?;

        let assembly_ref_rid =
            resolution_scope_assembly_ref(type_ref.resolution_scope).ok_or_else(|| {
                malformed_error!("TypeRef {} scope is not an AssemblyRef", type_ref.token)
            })?;
        let assembly_ref = self
            .row_by_index::<AssemblyRefRow>(assembly_ref_rid)
            .ok_or_else(|| {
                TokenOutOfRange(Token::from_parts(
                    TableId::AssemblyRef as u8,
                    assembly_ref_rid,
                ))
            })?;

        let strings = self.strings()?;
        Ok(QualifiedName {
            assembly: strings.get(assembly_ref.name as usize)?.to_string(),
            namespace: strings.get(type_ref.type_namespace as usize)?.to_string(),
            type_name: strings.get(type_ref.type_name as usize)?.to_string(),
            method: strings.get(member.name as usize)?.to_string(),
        })
    }

    /// The `ClassLayout` row whose parent is the given type, if any
    #[must_use]
    pub fn class_layout_of_type(&self, type_rid: u32) -> Option<ClassLayoutRow> {
        for rid in 1..=self.row_count(TableId::ClassLayout) {
            let layout = self.row_by_index::<ClassLayoutRow>(rid)?;
            if u32::from(layout.parent) == type_rid {
                return Some(layout);
            }
        }

        None
    }

    /// The byte size of instances of the given type.
    ///
    /// Uses the explicit `ClassLayout` size when present, otherwise sums the
    /// declared field sizes derived from each field's signature blob.
    ///
    /// # Errors
    /// Returns an error if the type does not exist or a field signature
    /// cannot be read.
    pub fn type_size(&self, type_rid: u32) -> Result<usize> {
        if let Some(layout) = self.class_layout_of_type(type_rid) {
            return Ok(layout.class_size as usize);
        }

        let range = self
            .field_range_of_type(type_rid)
            .ok_or_else(|| malformed_error!("TypeDef row {} does not exist", type_rid))?;

        let mut size = 0;
        for rid in range {
            let field = self.row_by_index::<FieldRow>(rid).ok_or_else(|| {
                TokenOutOfRange(Token::from_parts(TableId::Field as u8, rid))
            })?;

            size += self.field_size(&field)?;
        }

        Ok(size)
    }

    /// Byte size of one field, from the element type of its FIELD signature.
    fn field_size(&self, field: &FieldRow) -> Result<usize> {
        let signature = self.blob(field.signature as usize)?;

        Ok(match signature.get(1).copied() {
            Some(0x02 | 0x04 | 0x05) => 1, // bool, i1, u1
            Some(0x03 | 0x06 | 0x07) => 2, // char, i2, u2
            Some(0x08 | 0x09 | 0x0C) => 4, // i4, u4, r4
            _ => 8,                        // i8, u8, r8, references, pointers
        })
    }
}

impl fmt::Debug for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assembly")
            .field("name", &self.name)
            .field("version", &self.root.version)
            .field("entry_point", &self.entry_point())
            .finish_non_exhaustive()
    }
}
