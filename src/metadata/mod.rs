//! ECMA-335 metadata parsing.
//!
//! Everything between the CLI runtime header and the typed table rows lives
//! here:
//!
//! - [`token::Token`] - the `(table, row)` encoding used throughout
//! - [`cor20::Cor20Header`] - the CLI runtime header
//! - [`root::Root`] - the metadata root and stream directory
//! - [`streams`] - the `#~` tables stream and the four heaps
//! - [`tables`] - typed row structs and table identifiers
//! - [`method::MethodBody`] - tiny/fat method body headers
//! - [`assembly::Assembly`] - the loaded assembly tying it all together

pub mod assembly;
pub mod cor20;
pub mod method;
pub mod root;
pub mod streams;
pub mod tables;
pub mod token;
