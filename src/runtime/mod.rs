//! The execution engine.
//!
//! [`Runtime`] owns all mutable interpreter state: the registry of loaded
//! assemblies, the chain of assembly loaders, the evaluation stack, the
//! static field store with its initialized-type set, and the managed heap.
//! [`Runtime::run`] seeds the registry with the entry assembly, sizes the
//! stack from the PE stack reserve, and drives instruction dispatch from the
//! entrypoint frame.
//!
//! Execution is single-threaded and synchronous: `call` and `newobj`
//! recursively enter dispatch on a new frame, so the interpreter call stack
//! is the native call stack. There is no suspension and no cancellation;
//! every error unwinds to the top of `run`.

mod dispatch;
mod frame;
mod heap;
mod stack;
mod statics;
mod value;

pub use frame::{Frame, LOCAL_SLOTS};
pub use heap::ManagedHeap;
pub use stack::{EvalStack, StackValue};
pub use statics::{StaticKey, StaticStore};
pub use value::{
    ManagedPointer, NativeInt, NativeUint, SlotValue, UnmanagedPointer, ValueType,
};

use std::{collections::HashMap, sync::Arc};

use crate::{
    metadata::assembly::Assembly,
    Error::{AssemblyNotFound, NullToken},
    Result,
};

/// An assembly loader callback: given an assembly name, produce the assembly
/// or decline with `None` so the next loader is consulted.
pub type AssemblyLoader = Box<dyn Fn(&str) -> Option<Assembly>>;

/// The interpreter runtime.
///
/// Construct with [`Runtime::new`], register loaders and pre-loaded
/// assemblies, then [`Runtime::run`] the entry assembly.
pub struct Runtime {
    assemblies: HashMap<String, Arc<Assembly>>,
    loaders: Vec<AssemblyLoader>,
    stack: EvalStack,
    statics: StaticStore,
    heap: ManagedHeap,
    ldloc_moves: bool,
}

impl Runtime {
    /// Construct an empty runtime with no assemblies and no loaders
    #[must_use]
    pub fn new() -> Self {
        Runtime {
            assemblies: HashMap::new(),
            loaders: Vec::new(),
            stack: EvalStack::new(),
            statics: StaticStore::new(),
            heap: ManagedHeap::new(),
            ldloc_moves: true,
        }
    }

    /// Append an assembly loader to the chain.
    ///
    /// Loaders are consulted in insertion order when a `call` or `newobj`
    /// references an assembly that is not in the registry; the first loader
    /// returning `Some` wins. Loaders may perform arbitrary I/O but must not
    /// reenter the runtime.
    pub fn add_assembly_loader<F>(&mut self, loader: F)
    where
        F: Fn(&str) -> Option<Assembly> + 'static,
    {
        self.loaders.push(Box::new(loader));
    }

    /// Pre-insert an assembly into the registry under its module name
    pub fn add_assembly(&mut self, assembly: Assembly) {
        self.intern(assembly);
    }

    /// Whether `ldloc` clears the local slot after pushing it.
    ///
    /// Enabled by default: loading a local *moves* it out of the slot, so a
    /// second `ldloc` of the same slot observes an empty slot and fails.
    /// Conventional CIL semantics copy instead; disable the move behavior to
    /// get copies.
    pub fn set_ldloc_moves(&mut self, moves: bool) {
        self.ldloc_moves = moves;
    }

    /// Run an assembly: intern it, size the evaluation stack from its stack
    /// reserve, and execute its entrypoint.
    ///
    /// # Errors
    /// Returns any parse or execution error that unwound dispatch.
    pub fn run(&mut self, assembly: Assembly) -> Result<i32> {
        let stack_reserve = assembly.stack_reserve();
        let entry_point = assembly.entry_point();
        let assembly = self.intern(assembly);

        if entry_point.is_null() {
            return Err(NullToken);
        }

        #[allow(clippy::cast_possible_truncation)]
        {
            self.stack = EvalStack::with_capacity(stack_reserve as usize);
        }

        log::debug!(
            "running entrypoint {} of assembly '{}'",
            entry_point,
            assembly.name()
        );

        let frame = Frame::new(assembly, entry_point);
        self.execute(frame)?;

        Ok(0)
    }

    /// The evaluation stack (introspection)
    #[must_use]
    pub fn stack(&self) -> &EvalStack {
        &self.stack
    }

    /// The managed heap (introspection)
    #[must_use]
    pub fn heap(&self) -> &ManagedHeap {
        &self.heap
    }

    /// The static field store (introspection)
    #[must_use]
    pub fn statics(&self) -> &StaticStore {
        &self.statics
    }

    /// The loaded assembly registered under `name`, if any
    #[must_use]
    pub fn assembly(&self, name: &str) -> Option<&Arc<Assembly>> {
        self.assemblies.get(name)
    }

    /// Insert an assembly under its module name, returning the shared handle
    fn intern(&mut self, assembly: Assembly) -> Arc<Assembly> {
        let name = assembly.name().to_string();
        let assembly = Arc::new(assembly);
        self.assemblies.insert(name, assembly.clone());
        assembly
    }

    /// Find an assembly by name, consulting the loader chain on a registry
    /// miss and installing the first result.
    fn resolve_assembly(&mut self, name: &str) -> Result<Arc<Assembly>> {
        if let Some(assembly) = self.assemblies.get(name) {
            return Ok(assembly.clone());
        }

        for loader in &self.loaders {
            let Some(assembly) = loader(name) else {
                continue;
            };

            log::debug!("loaded assembly '{}' through a loader", name);

            let assembly = Arc::new(assembly);
            self.assemblies.insert(name.to_string(), assembly.clone());
            return Ok(assembly);
        }

        Err(AssemblyNotFound(name.to_string()))
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
