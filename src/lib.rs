// Copyright 2025-2026 the cilrun contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]

//! # cilrun
//!
//! An interpreter for CLI (Common Language Infrastructure) assemblies as
//! standardized by ECMA-335: Portable Executable files carrying CIL bytecode
//! plus descriptive metadata tables. Given such an assembly and a mechanism
//! for locating referenced assemblies on demand, `cilrun` loads the
//! entrypoint method and executes its instructions on a typed evaluation
//! stack, honoring cross-assembly references, static field initialization,
//! heap object creation, and control flow inside a method.
//!
//! # Architecture
//!
//! Two subsystems make up the core:
//!
//! - **Assembly loader** ([`metadata`], [`file`]) - parses the PE envelope,
//!   the CLI runtime header, the metadata root, the streams (`#~`,
//!   `#Strings`, `#US`, `#Blob`, `#GUID`) and the typed metadata tables,
//!   and exposes table-row lookup by token.
//! - **Execution engine** ([`runtime`], [`disassembler`]) - a stack-based
//!   interpreter over CIL opcodes with a typed evaluation stack, per-frame
//!   local slots, a cross-assembly call mechanism backed by pluggable
//!   loaders, lazy per-type static initialization, and a simple managed
//!   heap.
//!
//! # Usage
//!
//! ```rust,no_run
//! use cilrun::{metadata::assembly::Assembly, runtime::Runtime};
//! use std::path::Path;
//!
//! let mut runtime = Runtime::new();
//!
//! // Loaders supply assemblies referenced across assembly boundaries
//! runtime.add_assembly_loader(|name| {
//!     let path = format!("deps/{name}.dll");
//!     Assembly::from_file(Path::new(&path)).ok()
//! });
//!
//! let assembly = Assembly::from_file(Path::new("program.dll"))?;
//! let _exit_code = runtime.run(assembly)?;
//! # Ok::<(), cilrun::Error>(())
//! ```
//!
//! # Scope
//!
//! There is no garbage collector (objects live until the runtime is
//! dropped), no CIL verification, no JIT, no generics instantiation, no
//! exception handling, no P/Invoke and no managed threads. Opcodes outside
//! the implemented handler set are a hard [`Error::UnimplementedOpcode`].

#[macro_use]
pub(crate) mod error;

pub mod disassembler;
pub mod file;
pub mod metadata;
pub mod prelude;
pub mod runtime;

/// The result type used throughout this crate
pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;
pub use file::{parser::Parser, File};
