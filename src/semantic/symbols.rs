//! Module-level symbol tables
//!
//! Five flat tables keyed by name. `create` returns `false` on a duplicate
//! and leaves the existing entry alone; callers turn that into a
//! duplicate-declaration error with the right span.

use rustc_hash::FxHashMap;

use crate::types::{TypeArena, TypeId};

/// name -> struct type
#[derive(Debug, Default)]
pub struct StructTable {
    entries: FxHashMap<String, TypeId>,
}

impl StructTable {
    /// Register an empty struct shell in `types` under `name`
    pub fn create(&mut self, types: &mut TypeArena, name: &str) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        match types.create_struct(name) {
            Some(id) => {
                self.entries.insert(name.to_string(), id);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<TypeId> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by name
    pub fn iter(&self) -> Vec<(&str, TypeId)> {
        sorted(&self.entries)
    }
}

/// name -> function signature
#[derive(Debug, Default)]
pub struct FunctionTable {
    entries: FxHashMap<String, TypeId>,
}

impl FunctionTable {
    pub fn create(&mut self, name: &str, signature: TypeId) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        self.entries.insert(name.to_string(), signature);
        true
    }

    pub fn get(&self, name: &str) -> Option<TypeId> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> Vec<(&str, TypeId)> {
        sorted(&self.entries)
    }
}

/// name -> enum type
#[derive(Debug, Default)]
pub struct EnumTable {
    entries: FxHashMap<String, TypeId>,
}

impl EnumTable {
    pub fn create(&mut self, types: &mut TypeArena, name: &str, variants: Vec<String>) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        let id = types.create_enum(name, variants);
        self.entries.insert(name.to_string(), id);
        true
    }

    pub fn get(&self, name: &str) -> Option<TypeId> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> Vec<(&str, TypeId)> {
        sorted(&self.entries)
    }
}

/// name -> ordered required methods
#[derive(Debug, Default)]
pub struct TraitTable {
    entries: FxHashMap<String, Vec<(String, TypeId)>>,
}

impl TraitTable {
    pub fn create(&mut self, name: &str) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        self.entries.insert(name.to_string(), Vec::new());
        true
    }

    /// Append a required method; `false` if the trait is unknown or the
    /// method is already listed
    pub fn insert_method(&mut self, name: &str, method: &str, signature: TypeId) -> bool {
        match self.entries.get_mut(name) {
            Some(methods) if !methods.iter().any(|(m, _)| m == method) => {
                methods.push((method.to_string(), signature));
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&[(String, TypeId)]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A constant's type and resolved value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstEntry {
    pub ty: TypeId,
    pub value: i64,
}

/// name -> (type, value)
#[derive(Debug, Default)]
pub struct ConstTable {
    entries: FxHashMap<String, ConstEntry>,
}

impl ConstTable {
    /// Register a constant whose value is not known yet
    pub fn create(&mut self, name: &str, ty: TypeId) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        self.entries.insert(name.to_string(), ConstEntry { ty, value: 0 });
        true
    }

    pub fn set_value(&mut self, name: &str, value: i64) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.value = value;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<ConstEntry> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> Vec<(&str, ConstEntry)> {
        sorted(&self.entries)
    }
}

fn sorted<V: Copy>(entries: &FxHashMap<String, V>) -> Vec<(&str, V)> {
    let mut out: Vec<(&str, V)> = entries.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    out.sort_by(|a, b| a.0.cmp(b.0));
    out
}

/// The declaration environment of one crate
#[derive(Debug, Default)]
pub struct SymbolTables {
    pub structs: StructTable,
    pub functions: FunctionTable,
    pub enums: EnumTable,
    pub traits: TraitTable,
    pub consts: ConstTable,
}

impl SymbolTables {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_is_false_on_duplicate() {
        let mut types = TypeArena::new();
        let mut tables = SymbolTables::new();

        assert!(tables.structs.create(&mut types, "P"));
        let p = tables.structs.get("P").unwrap();
        assert!(!tables.structs.create(&mut types, "P"));
        assert_eq!(tables.structs.get("P"), Some(p));

        let sig = types.function(vec![], TypeId::VOID);
        assert!(tables.functions.create("f", sig));
        assert!(!tables.functions.create("f", TypeId::I32));
        assert_eq!(tables.functions.get("f"), Some(sig));

        assert!(tables.enums.create(&mut types, "E", vec!["A".into()]));
        assert!(!tables.enums.create(&mut types, "E", vec![]));
    }

    #[test]
    fn test_trait_methods_keep_order() {
        let mut tables = SymbolTables::new();
        assert!(tables.traits.create("Shape"));
        assert!(tables.traits.insert_method("Shape", "area", TypeId::I32));
        assert!(tables.traits.insert_method("Shape", "sides", TypeId::U32));
        assert!(!tables.traits.insert_method("Shape", "area", TypeId::I32));
        assert!(!tables.traits.insert_method("Missing", "area", TypeId::I32));

        let names: Vec<&str> = tables
            .traits
            .get("Shape")
            .unwrap()
            .iter()
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(names, vec!["area", "sides"]);
    }

    #[test]
    fn test_const_values() {
        let mut tables = SymbolTables::new();
        assert!(tables.consts.create("N", TypeId::USIZE));
        assert_eq!(tables.consts.get("N").map(|c| c.value), Some(0));
        assert!(tables.consts.set_value("N", 8));
        assert_eq!(
            tables.consts.get("N"),
            Some(ConstEntry { ty: TypeId::USIZE, value: 8 })
        );
        assert!(!tables.consts.set_value("M", 1));
        assert!(!tables.consts.create("N", TypeId::I32));
    }
}
