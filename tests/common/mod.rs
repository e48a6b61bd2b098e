#![allow(dead_code)]
//! In-memory builder for minimal PE32+ CLI images.
//!
//! Produces complete single-section assemblies - DOS/COFF/Optional headers,
//! CLR runtime header, metadata root, the `#~`/`#Strings`/`#US`/`#GUID`/
//! `#Blob` streams and tiny-header method bodies - so the interpreter can be
//! driven end-to-end from crafted bytes.

use std::collections::BTreeMap;

/// RVA of the single `.text` section.
const SECTION_RVA: u32 = 0x1000;
/// File offset of the single `.text` section.
const SECTION_FILE_OFFSET: u32 = 0x200;
/// Stack reserve recorded in the Optional header.
pub const STACK_RESERVE: u64 = 0x10_0000;

fn align_up(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

/// Builder for one assembly image.
pub struct ImageBuilder {
    strings: Vec<u8>,
    user_strings: Vec<u8>,
    blobs: Vec<u8>,
    guids: Vec<u8>,
    bodies: Vec<u8>,
    /// table id -> (row size, rows)
    tables: BTreeMap<u8, (usize, Vec<Vec<u8>>)>,
    entry_token: u32,
}

impl ImageBuilder {
    /// Start an image whose Module row carries `module_name`.
    pub fn new(module_name: &str) -> Self {
        let mut builder = ImageBuilder {
            strings: vec![0],
            user_strings: vec![0],
            blobs: vec![0],
            guids: (0..16).map(|i| 0x10 | i).collect(),
            bodies: Vec::new(),
            tables: BTreeMap::new(),
            entry_token: 0x0600_0001,
        };

        let name = builder.string(module_name);
        let mut row = Vec::new();
        row.extend_from_slice(&0u16.to_le_bytes()); // generation
        row.extend_from_slice(&name.to_le_bytes());
        row.extend_from_slice(&1u16.to_le_bytes()); // mvid
        row.extend_from_slice(&0u16.to_le_bytes());
        row.extend_from_slice(&0u16.to_le_bytes());
        builder.push_row(0x00, 10, row);

        builder
    }

    /// The mvid every built image carries.
    pub fn mvid() -> [u8; 16] {
        let mut mvid = [0u8; 16];
        for (i, byte) in mvid.iter_mut().enumerate() {
            *byte = 0x10 | i as u8;
        }
        mvid
    }

    /// Intern a string in `#Strings`, returning its heap offset.
    pub fn string(&mut self, value: &str) -> u16 {
        let offset = self.strings.len() as u16;
        self.strings.extend_from_slice(value.as_bytes());
        self.strings.push(0);
        offset
    }

    /// Add a user string to `#US`, returning its `ldstr` token.
    pub fn user_string(&mut self, value: &str) -> u32 {
        let offset = self.user_strings.len() as u32;

        let mut payload = Vec::new();
        for unit in value.encode_utf16() {
            payload.extend_from_slice(&unit.to_le_bytes());
        }
        payload.push(0); // terminal byte

        assert!(payload.len() < 0x80, "user string too long for the builder");
        self.user_strings.push(payload.len() as u8);
        self.user_strings.extend_from_slice(&payload);

        0x7000_0000 | offset
    }

    /// Add a blob to `#Blob`, returning its heap offset.
    pub fn blob(&mut self, bytes: &[u8]) -> u16 {
        assert!(bytes.len() < 0x80, "blob too long for the builder");

        let offset = self.blobs.len() as u16;
        self.blobs.push(bytes.len() as u8);
        self.blobs.extend_from_slice(bytes);
        offset
    }

    /// Add a tiny-header method body, returning its RVA.
    pub fn method_body_tiny(&mut self, code: &[u8]) -> u32 {
        assert!(code.len() < 0x40, "tiny bodies hold at most 63 code bytes");

        let mut body = vec![((code.len() as u8) << 2) | 0x02];
        body.extend_from_slice(code);
        self.method_body_raw(&body)
    }

    /// Add raw method body bytes (header included), returning their RVA.
    pub fn method_body_raw(&mut self, body: &[u8]) -> u32 {
        let aligned = align_up(self.bodies.len(), 4);
        self.bodies.resize(aligned, 0);

        let rva = SECTION_RVA + 72 + aligned as u32;
        self.bodies.extend_from_slice(body);
        rva
    }

    fn push_row(&mut self, id: u8, row_size: usize, row: Vec<u8>) -> u32 {
        assert_eq!(row.len(), row_size, "row bytes must match the row size");

        let (_, rows) = self
            .tables
            .entry(id)
            .or_insert_with(|| (row_size, Vec::new()));
        rows.push(row);
        rows.len() as u32
    }

    /// Add a TypeDef row, returning its rid.
    pub fn add_type(
        &mut self,
        namespace: &str,
        name: &str,
        field_list: u16,
        method_list: u16,
    ) -> u32 {
        let name = self.string(name);
        let namespace = self.string(namespace);

        let mut row = Vec::new();
        row.extend_from_slice(&0u32.to_le_bytes()); // flags
        row.extend_from_slice(&name.to_le_bytes());
        row.extend_from_slice(&namespace.to_le_bytes());
        row.extend_from_slice(&0u16.to_le_bytes()); // extends
        row.extend_from_slice(&field_list.to_le_bytes());
        row.extend_from_slice(&method_list.to_le_bytes());
        self.push_row(0x02, 14, row)
    }

    /// Add a MethodDef row, returning its rid.
    pub fn add_method(&mut self, name: &str, rva: u32) -> u32 {
        let name = self.string(name);
        let signature = self.blob(&[0x00, 0x00, 0x01]);

        let mut row = Vec::new();
        row.extend_from_slice(&rva.to_le_bytes());
        row.extend_from_slice(&0u16.to_le_bytes()); // impl_flags
        row.extend_from_slice(&0x0096u16.to_le_bytes()); // flags: public static hidebysig
        row.extend_from_slice(&name.to_le_bytes());
        row.extend_from_slice(&signature.to_le_bytes());
        row.extend_from_slice(&1u16.to_le_bytes()); // param_list
        self.push_row(0x06, 14, row)
    }

    /// Add a Field row with the given FIELD signature blob, returning its
    /// rid (and its token as `0x04000000 | rid`).
    pub fn add_field(&mut self, name: &str, signature: &[u8]) -> u32 {
        let name = self.string(name);
        let signature = self.blob(signature);

        let mut row = Vec::new();
        row.extend_from_slice(&0x0016u16.to_le_bytes()); // flags: public static
        row.extend_from_slice(&name.to_le_bytes());
        row.extend_from_slice(&signature.to_le_bytes());
        self.push_row(0x04, 6, row)
    }

    /// Add a TypeRef row scoped to an AssemblyRef, returning its rid.
    pub fn add_type_ref(&mut self, assembly_ref_rid: u32, namespace: &str, name: &str) -> u32 {
        let name = self.string(name);
        let namespace = self.string(namespace);
        let scope = ((assembly_ref_rid as u16) << 2) | 2;

        let mut row = Vec::new();
        row.extend_from_slice(&scope.to_le_bytes());
        row.extend_from_slice(&name.to_le_bytes());
        row.extend_from_slice(&namespace.to_le_bytes());
        self.push_row(0x01, 6, row)
    }

    /// Add a MemberRef row parented on a TypeRef, returning its rid.
    pub fn add_member_ref(&mut self, type_ref_rid: u32, name: &str) -> u32 {
        let name = self.string(name);
        let signature = self.blob(&[0x00, 0x00, 0x01]);
        let class = ((type_ref_rid as u16) << 3) | 1;

        let mut row = Vec::new();
        row.extend_from_slice(&class.to_le_bytes());
        row.extend_from_slice(&name.to_le_bytes());
        row.extend_from_slice(&signature.to_le_bytes());
        self.push_row(0x0A, 6, row)
    }

    /// Add an AssemblyRef row, returning its rid.
    pub fn add_assembly_ref(&mut self, name: &str) -> u32 {
        let name = self.string(name);

        let mut row = Vec::new();
        row.extend_from_slice(&1u16.to_le_bytes()); // major_version
        row.extend_from_slice(&0u16.to_le_bytes());
        row.extend_from_slice(&0u16.to_le_bytes());
        row.extend_from_slice(&0u16.to_le_bytes());
        row.extend_from_slice(&0u32.to_le_bytes()); // flags
        row.extend_from_slice(&0u16.to_le_bytes()); // public_key_or_token
        row.extend_from_slice(&name.to_le_bytes());
        row.extend_from_slice(&0u16.to_le_bytes()); // culture
        row.extend_from_slice(&0u16.to_le_bytes()); // hash_value
        self.push_row(0x23, 20, row)
    }

    /// Add a ClassLayout row for a TypeDef, returning its rid.
    pub fn add_class_layout(&mut self, type_def_rid: u32, class_size: u32) -> u32 {
        let mut row = Vec::new();
        row.extend_from_slice(&1u16.to_le_bytes()); // packing_size
        row.extend_from_slice(&class_size.to_le_bytes());
        row.extend_from_slice(&(type_def_rid as u16).to_le_bytes());
        self.push_row(0x0F, 8, row)
    }

    /// Set the entrypoint token recorded in the CLR runtime header.
    pub fn entry_point(&mut self, token: u32) {
        self.entry_token = token;
    }

    fn build_tables_stream(&self) -> Vec<u8> {
        let mut stream = Vec::new();

        let mut valid = 0u64;
        for &id in self.tables.keys() {
            valid |= 1 << id;
        }

        stream.extend_from_slice(&0u32.to_le_bytes()); // reserved
        stream.push(2); // major
        stream.push(0); // minor
        stream.push(0); // heap_sizes
        stream.push(1); // reserved
        stream.extend_from_slice(&valid.to_le_bytes());
        stream.extend_from_slice(&0u64.to_le_bytes()); // sorted

        for (_, (_, rows)) in &self.tables {
            stream.extend_from_slice(&(rows.len() as u32).to_le_bytes());
        }

        for (_, (_, rows)) in &self.tables {
            for row in rows {
                stream.extend_from_slice(row);
            }
        }

        stream
    }

    fn build_metadata(&self) -> Vec<u8> {
        let tilde = self.build_tables_stream();

        let pad4 = |data: &[u8]| align_up(data.len().max(1), 4);
        let tilde_len = pad4(&tilde);
        let strings_len = pad4(&self.strings);
        let us_len = pad4(&self.user_strings);
        let guid_len = pad4(&self.guids);
        let blob_len = pad4(&self.blobs);

        // Root prefix (32) plus the five stream headers (12+20+12+16+16)
        let headers_end = 32 + 76;
        let tilde_off = headers_end;
        let strings_off = tilde_off + tilde_len;
        let us_off = strings_off + strings_len;
        let guid_off = us_off + us_len;
        let blob_off = guid_off + guid_len;

        let mut metadata = Vec::new();
        metadata.extend_from_slice(&0x424A_5342u32.to_le_bytes()); // BSJB
        metadata.extend_from_slice(&1u16.to_le_bytes());
        metadata.extend_from_slice(&1u16.to_le_bytes());
        metadata.extend_from_slice(&0u32.to_le_bytes()); // reserved
        metadata.extend_from_slice(&12u32.to_le_bytes()); // version length
        metadata.extend_from_slice(b"v4.0.30319\0\0");
        metadata.extend_from_slice(&0u16.to_le_bytes()); // flags
        metadata.extend_from_slice(&5u16.to_le_bytes()); // stream count

        let mut header = |offset: usize, size: usize, name: &[u8]| {
            metadata.extend_from_slice(&(offset as u32).to_le_bytes());
            metadata.extend_from_slice(&(size as u32).to_le_bytes());
            metadata.extend_from_slice(name);
        };

        header(tilde_off, tilde_len, b"#~\0\0");
        header(strings_off, strings_len, b"#Strings\0\0\0\0");
        header(us_off, us_len, b"#US\0");
        header(guid_off, guid_len, b"#GUID\0\0\0");
        header(blob_off, blob_len, b"#Blob\0\0\0");
        assert_eq!(metadata.len(), headers_end);

        let mut stream = |data: &[u8], padded: usize| {
            metadata.extend_from_slice(data);
            metadata.resize(metadata.len() + padded - data.len(), 0);
        };

        stream(&tilde, tilde_len);
        stream(&self.strings, strings_len);
        stream(&self.user_strings, us_len);
        stream(&self.guids, guid_len);
        stream(&self.blobs, blob_len);

        metadata
    }

    /// Assemble the complete PE32+ image.
    pub fn build(&self) -> Vec<u8> {
        let metadata = self.build_metadata();

        // Section content: CLR header, method bodies, metadata
        let bodies_len = align_up(self.bodies.len(), 4);
        let metadata_off = 72 + bodies_len;
        let metadata_rva = SECTION_RVA + metadata_off as u32;

        let mut content = Vec::new();
        content.extend_from_slice(&72u32.to_le_bytes()); // cb
        content.extend_from_slice(&2u16.to_le_bytes()); // major runtime
        content.extend_from_slice(&5u16.to_le_bytes()); // minor runtime
        content.extend_from_slice(&metadata_rva.to_le_bytes());
        content.extend_from_slice(&(metadata.len() as u32).to_le_bytes());
        content.extend_from_slice(&1u32.to_le_bytes()); // flags: ILONLY
        content.extend_from_slice(&self.entry_token.to_le_bytes());
        content.resize(72, 0); // remaining header fields zero

        content.extend_from_slice(&self.bodies);
        content.resize(72 + bodies_len, 0);
        content.extend_from_slice(&metadata);

        let virtual_size = content.len() as u32;
        let raw_size = align_up(content.len(), 0x200) as u32;

        let mut image = Vec::new();

        // DOS header
        image.extend_from_slice(b"MZ");
        image.resize(0x3C, 0);
        image.extend_from_slice(&0x80u32.to_le_bytes()); // e_lfanew
        image.resize(0x80, 0);

        // PE signature + COFF header
        image.extend_from_slice(b"PE\0\0");
        image.extend_from_slice(&0x8664u16.to_le_bytes()); // machine: x86-64
        image.extend_from_slice(&1u16.to_le_bytes()); // sections
        image.extend_from_slice(&0u32.to_le_bytes()); // timestamp
        image.extend_from_slice(&0u32.to_le_bytes()); // symbol table
        image.extend_from_slice(&0u32.to_le_bytes()); // symbol count
        image.extend_from_slice(&0xF0u16.to_le_bytes()); // optional header size
        image.extend_from_slice(&0x0022u16.to_le_bytes()); // characteristics

        // Optional header, PE32+
        image.extend_from_slice(&0x020Bu16.to_le_bytes()); // magic
        image.push(48); // linker major
        image.push(0); // linker minor
        image.extend_from_slice(&raw_size.to_le_bytes()); // size of code
        image.extend_from_slice(&0u32.to_le_bytes()); // initialized data
        image.extend_from_slice(&0u32.to_le_bytes()); // uninitialized data
        image.extend_from_slice(&0u32.to_le_bytes()); // entry point
        image.extend_from_slice(&SECTION_RVA.to_le_bytes()); // base of code
        image.extend_from_slice(&0x1_4000_0000u64.to_le_bytes()); // image base
        image.extend_from_slice(&0x1000u32.to_le_bytes()); // section alignment
        image.extend_from_slice(&0x200u32.to_le_bytes()); // file alignment
        image.extend_from_slice(&6u16.to_le_bytes()); // os major
        image.extend_from_slice(&0u16.to_le_bytes()); // os minor
        image.extend_from_slice(&0u16.to_le_bytes()); // image major
        image.extend_from_slice(&0u16.to_le_bytes()); // image minor
        image.extend_from_slice(&6u16.to_le_bytes()); // subsystem major
        image.extend_from_slice(&0u16.to_le_bytes()); // subsystem minor
        image.extend_from_slice(&0u32.to_le_bytes()); // win32 version
        let size_of_image = SECTION_RVA + align_up(virtual_size as usize, 0x1000) as u32;
        image.extend_from_slice(&size_of_image.to_le_bytes());
        image.extend_from_slice(&0x200u32.to_le_bytes()); // size of headers
        image.extend_from_slice(&0u32.to_le_bytes()); // checksum
        image.extend_from_slice(&3u16.to_le_bytes()); // subsystem: console
        image.extend_from_slice(&0u16.to_le_bytes()); // dll characteristics
        image.extend_from_slice(&STACK_RESERVE.to_le_bytes());
        image.extend_from_slice(&0x1000u64.to_le_bytes()); // stack commit
        image.extend_from_slice(&0x10_0000u64.to_le_bytes()); // heap reserve
        image.extend_from_slice(&0x1000u64.to_le_bytes()); // heap commit
        image.extend_from_slice(&0u32.to_le_bytes()); // loader flags
        image.extend_from_slice(&16u32.to_le_bytes()); // directory count

        // Data directories: only the CLR runtime header (#14) is set
        for directory in 0..16u32 {
            if directory == 14 {
                image.extend_from_slice(&SECTION_RVA.to_le_bytes());
                image.extend_from_slice(&72u32.to_le_bytes());
            } else {
                image.extend_from_slice(&0u64.to_le_bytes());
            }
        }

        // Section header
        image.extend_from_slice(b".text\0\0\0");
        image.extend_from_slice(&virtual_size.to_le_bytes());
        image.extend_from_slice(&SECTION_RVA.to_le_bytes());
        image.extend_from_slice(&raw_size.to_le_bytes());
        image.extend_from_slice(&SECTION_FILE_OFFSET.to_le_bytes());
        image.extend_from_slice(&0u32.to_le_bytes()); // relocations
        image.extend_from_slice(&0u32.to_le_bytes()); // line numbers
        image.extend_from_slice(&0u16.to_le_bytes());
        image.extend_from_slice(&0u16.to_le_bytes());
        image.extend_from_slice(&0x6000_0020u32.to_le_bytes()); // code | execute | read

        // Pad headers to the section's file offset, then append the content
        image.resize(SECTION_FILE_OFFSET as usize, 0);
        image.extend_from_slice(&content);
        image.resize(SECTION_FILE_OFFSET as usize + raw_size as usize, 0);

        image
    }
}
