//! Static field storage and type initialization tracking.
//!
//! Static fields are keyed by `(module name, field token)` so that field
//! tokens from different assemblies cannot collide. The store also tracks
//! which types have had their static constructor (`.cctor`) run; a type is
//! marked initialized *before* its `.cctor` executes so a self-referential
//! static access during initialization reads partial state instead of
//! recursing.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::{metadata::token::Token, runtime::value::SlotValue};

/// Identity of one static field across all loaded assemblies.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StaticKey {
    /// Module name of the assembly declaring the field
    pub module: Arc<str>,
    /// The `Field` token inside that assembly
    pub field: Token,
}

impl StaticKey {
    /// Create a key from a module name and a field token
    #[must_use]
    pub fn new(module: Arc<str>, field: Token) -> Self {
        StaticKey { module, field }
    }
}

/// Storage for static fields plus the initialized-type set.
pub struct StaticStore {
    fields: HashMap<StaticKey, SlotValue>,
    initialized_types: HashSet<(Arc<str>, Token)>,
}

impl StaticStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        StaticStore {
            fields: HashMap::new(),
            initialized_types: HashSet::new(),
        }
    }

    /// The stored value of a static field, if it was ever written
    #[must_use]
    pub fn get(&self, key: &StaticKey) -> Option<SlotValue> {
        self.fields.get(key).copied()
    }

    /// Store a static field value, replacing any prior value and tag
    pub fn set(&mut self, key: StaticKey, value: SlotValue) {
        self.fields.insert(key, value);
    }

    /// Whether the field was ever written
    #[must_use]
    pub fn contains(&self, key: &StaticKey) -> bool {
        self.fields.contains_key(key)
    }

    /// Mark a type initialized.
    ///
    /// Returns `true` if the type was not marked before - exactly the case
    /// in which the caller shall run the type's `.cctor`.
    pub fn mark_type_initialized(&mut self, module: &Arc<str>, type_token: Token) -> bool {
        self.initialized_types
            .insert((module.clone(), type_token))
    }

    /// Whether the type was already marked initialized
    #[must_use]
    pub fn is_type_initialized(&self, module: &Arc<str>, type_token: Token) -> bool {
        self.initialized_types
            .contains(&(module.clone(), type_token))
    }
}

impl Default for StaticStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_round_trip() {
        let mut store = StaticStore::new();
        let key = StaticKey::new(Arc::from("a.dll"), Token(0x0400_0001));

        assert!(store.get(&key).is_none());

        store.set(key.clone(), SlotValue::Int32(99));
        assert_eq!(store.get(&key), Some(SlotValue::Int32(99)));

        // A later store replaces value and tag
        store.set(key.clone(), SlotValue::Float(0.5));
        assert_eq!(store.get(&key), Some(SlotValue::Float(0.5)));
    }

    #[test]
    fn keys_are_per_module() {
        let mut store = StaticStore::new();
        let token = Token(0x0400_0001);

        store.set(
            StaticKey::new(Arc::from("a.dll"), token),
            SlotValue::Int32(1),
        );

        let other = StaticKey::new(Arc::from("b.dll"), token);
        assert!(!store.contains(&other));
    }

    #[test]
    fn type_initialization_marks_once() {
        let mut store = StaticStore::new();
        let module: Arc<str> = Arc::from("a.dll");
        let ty = Token(0x0200_0001);

        assert!(!store.is_type_initialized(&module, ty));
        assert!(store.mark_type_initialized(&module, ty));
        assert!(!store.mark_type_initialized(&module, ty));
        assert!(store.is_type_initialized(&module, ty));
    }
}
