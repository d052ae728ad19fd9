//! Type System for rlc
//!
//! All types live in a [`TypeArena`] owned by one compilation session and are
//! referred to by copyable [`TypeId`] handles. Compound types are hash-consed:
//! asking twice for the same pointer, array, function, string or integer
//! literal type yields the same handle, so identity comparison is a valid
//! fast path. Structs and enums are canonical by name.
//!
//! The one structural exception is the integer-literal type, which "equals"
//! every concrete integer type whose range contains the literal's value.

use rustc_hash::FxHashMap;

use crate::utils::{Error, Result, Span};

// ==================== Handles ====================

/// Handle to a type in a [`TypeArena`]. The index is the creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub const I32: TypeId = TypeId(0);
    pub const U32: TypeId = TypeId(1);
    pub const ISIZE: TypeId = TypeId(2);
    pub const USIZE: TypeId = TypeId(3);
    pub const BOOL: TypeId = TypeId(4);
    pub const CHAR: TypeId = TypeId(5);
    pub const VOID: TypeId = TypeId(6);

    /// Creation-order identity number
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Primitive (scalar) types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    I32,
    U32,
    Isize,
    Usize,
    Bool,
    Char,
    Void,
}

impl PrimitiveType {
    const ALL: [PrimitiveType; 7] = [
        Self::I32,
        Self::U32,
        Self::Isize,
        Self::Usize,
        Self::Bool,
        Self::Char,
        Self::Void,
    ];

    /// Check if this is a signed integer type
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::I32 | Self::Isize)
    }

    /// Check if this is an integer type
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::I32 | Self::U32 | Self::Isize | Self::Usize)
    }

    /// Inclusive value range of an integer type. Both `isize` and `usize`
    /// are 32 bits wide on the target.
    pub fn int_range(&self) -> Option<(i64, i64)> {
        match self {
            Self::I32 | Self::Isize => Some((i32::MIN as i64, i32::MAX as i64)),
            Self::U32 | Self::Usize => Some((0, u32::MAX as i64)),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::Isize => "isize",
            Self::Usize => "usize",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::Void => "()",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "i32" => Some(Self::I32),
            "u32" => Some(Self::U32),
            "isize" => Some(Self::Isize),
            "usize" => Some(Self::Usize),
            "bool" => Some(Self::Bool),
            "char" => Some(Self::Char),
            _ => None,
        }
    }

    pub fn id(&self) -> TypeId {
        match self {
            Self::I32 => TypeId::I32,
            Self::U32 => TypeId::U32,
            Self::Isize => TypeId::ISIZE,
            Self::Usize => TypeId::USIZE,
            Self::Bool => TypeId::BOOL,
            Self::Char => TypeId::CHAR,
            Self::Void => TypeId::VOID,
        }
    }
}

// ==================== Type Payloads ====================

/// Resolved type (after type checking)
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedType {
    Primitive(PrimitiveType),
    /// String type carrying its compile-time content (empty when unknown)
    Str(String),
    Pointer { mutable: bool, elem: TypeId },
    Array { elem: TypeId, len: u32 },
    Function { params: Vec<TypeId>, ret: TypeId },
    Struct(StructType),
    Enum(EnumType),
    /// Type of an integer literal not yet pinned to a width
    IntLiteral(i64),
}

/// Struct layout and method set. Mutable until sealed.
#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub name: String,
    fields: Vec<(String, TypeId)>,
    methods: Vec<(String, TypeId)>,
    sealed: bool,
}

impl StructType {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
            methods: Vec::new(),
            sealed: false,
        }
    }

    pub fn fields(&self) -> &[(String, TypeId)] {
        &self.fields
    }

    pub fn methods(&self) -> &[(String, TypeId)] {
        &self.methods
    }

    /// Field position and type
    pub fn field(&self, name: &str) -> Option<(usize, TypeId)> {
        self.fields
            .iter()
            .position(|(n, _)| n == name)
            .map(|i| (i, self.fields[i].1))
    }

    pub fn method(&self, name: &str) -> Option<TypeId> {
        self.methods.iter().find(|(n, _)| n == name).map(|(_, t)| *t)
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    variants: Vec<String>,
}

impl EnumType {
    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Ordinal of a variant
    pub fn index_of(&self, variant: &str) -> Option<usize> {
        self.variants.iter().position(|v| v == variant)
    }
}

/// Structural key of a hash-consed type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum InternKey {
    Pointer(bool, TypeId),
    Array(TypeId, u32),
    Function(Vec<TypeId>, TypeId),
    Str(String),
    IntLiteral(i64),
}

// ==================== Type Arena ====================

/// Session-owned type registry.
#[derive(Debug, Clone)]
pub struct TypeArena {
    types: Vec<ResolvedType>,
    interned: FxHashMap<InternKey, TypeId>,
    structs: FxHashMap<String, TypeId>,
    enums: FxHashMap<String, TypeId>,
}

impl TypeArena {
    pub fn new() -> Self {
        let mut arena = Self {
            types: Vec::new(),
            interned: FxHashMap::default(),
            structs: FxHashMap::default(),
            enums: FxHashMap::default(),
        };
        // Primitives occupy the fixed indices named by the TypeId constants.
        for prim in PrimitiveType::ALL {
            let id = arena.push(ResolvedType::Primitive(prim));
            debug_assert_eq!(id, prim.id());
        }
        arena
    }

    fn push(&mut self, ty: ResolvedType) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    fn intern(&mut self, key: InternKey, ty: ResolvedType) -> TypeId {
        if let Some(&id) = self.interned.get(&key) {
            return id;
        }
        let id = self.push(ty);
        self.interned.insert(key, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &ResolvedType {
        &self.types[id.index()]
    }

    /// Number of distinct types created so far
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // ==================== Canonical Constructors ====================

    pub fn pointer(&mut self, mutable: bool, elem: TypeId) -> TypeId {
        self.intern(
            InternKey::Pointer(mutable, elem),
            ResolvedType::Pointer { mutable, elem },
        )
    }

    pub fn array(&mut self, elem: TypeId, len: u32) -> TypeId {
        self.intern(InternKey::Array(elem, len), ResolvedType::Array { elem, len })
    }

    pub fn function(&mut self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.intern(
            InternKey::Function(params.clone(), ret),
            ResolvedType::Function { params, ret },
        )
    }

    pub fn str_type(&mut self, content: &str) -> TypeId {
        self.intern(
            InternKey::Str(content.to_string()),
            ResolvedType::Str(content.to_string()),
        )
    }

    /// `str` with no known content
    pub fn string(&mut self) -> TypeId {
        self.str_type("")
    }

    pub fn int_literal(&mut self, value: i64) -> TypeId {
        self.intern(InternKey::IntLiteral(value), ResolvedType::IntLiteral(value))
    }

    // ==================== Structs ====================

    /// Create an empty struct shell. Returns `None` if the name is taken.
    pub fn create_struct(&mut self, name: &str) -> Option<TypeId> {
        if self.structs.contains_key(name) {
            return None;
        }
        let id = self.push(ResolvedType::Struct(StructType::new(name)));
        self.structs.insert(name.to_string(), id);
        Some(id)
    }

    pub fn struct_by_name(&self, name: &str) -> Option<TypeId> {
        self.structs.get(name).copied()
    }

    pub fn struct_type(&self, id: TypeId) -> Option<&StructType> {
        match self.get(id) {
            ResolvedType::Struct(s) => Some(s),
            _ => None,
        }
    }

    fn struct_mut(&mut self, id: TypeId) -> Result<&mut StructType> {
        match &mut self.types[id.index()] {
            ResolvedType::Struct(s) if s.sealed => Err(Error::SealedStruct {
                name: s.name.clone(),
            }),
            ResolvedType::Struct(s) => Ok(s),
            other => Err(Error::Unsupported {
                what: format!("member insertion into non-struct type {:?}", other),
                span: Span::dummy(),
            }),
        }
    }

    pub fn insert_field(&mut self, id: TypeId, name: &str, ty: TypeId, span: Span) -> Result<()> {
        let s = self.struct_mut(id)?;
        if s.field(name).is_some() {
            return Err(Error::DuplicateDefinition {
                kind: "field",
                name: format!("{}.{}", s.name, name),
                span,
            });
        }
        s.fields.push((name.to_string(), ty));
        Ok(())
    }

    pub fn insert_method(&mut self, id: TypeId, name: &str, sig: TypeId, span: Span) -> Result<()> {
        let s = self.struct_mut(id)?;
        if s.method(name).is_some() {
            return Err(Error::DuplicateMethod {
                ty: s.name.clone(),
                method: name.to_string(),
                span,
            });
        }
        s.methods.push((name.to_string(), sig));
        Ok(())
    }

    /// Close every struct against further field or method insertion.
    pub fn seal_structs(&mut self) {
        for ty in &mut self.types {
            if let ResolvedType::Struct(s) = ty {
                s.sealed = true;
            }
        }
    }

    // ==================== Enums ====================

    /// Create (or fetch, when the name exists) an enum type.
    pub fn create_enum(&mut self, name: &str, variants: Vec<String>) -> TypeId {
        if let Some(&id) = self.enums.get(name) {
            return id;
        }
        let id = self.push(ResolvedType::Enum(EnumType {
            name: name.to_string(),
            variants,
        }));
        self.enums.insert(name.to_string(), id);
        id
    }

    pub fn enum_type(&self, id: TypeId) -> Option<&EnumType> {
        match self.get(id) {
            ResolvedType::Enum(e) => Some(e),
            _ => None,
        }
    }

    // ==================== Queries ====================

    pub fn is_literal(&self, id: TypeId) -> bool {
        matches!(self.get(id), ResolvedType::IntLiteral(_))
    }

    pub fn literal_value(&self, id: TypeId) -> Option<i64> {
        match self.get(id) {
            ResolvedType::IntLiteral(v) => Some(*v),
            _ => None,
        }
    }

    /// Concrete integer primitive
    pub fn is_integer(&self, id: TypeId) -> bool {
        matches!(self.get(id), ResolvedType::Primitive(p) if p.is_integer())
    }

    /// Concrete integer or integer literal
    pub fn is_int_like(&self, id: TypeId) -> bool {
        self.is_integer(id) || self.is_literal(id)
    }

    pub fn primitive(&self, id: TypeId) -> Option<PrimitiveType> {
        match self.get(id) {
            ResolvedType::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// `(mutable, elem)` of a pointer type
    pub fn pointee(&self, id: TypeId) -> Option<(bool, TypeId)> {
        match self.get(id) {
            ResolvedType::Pointer { mutable, elem } => Some((*mutable, *elem)),
            _ => None,
        }
    }

    pub fn as_array(&self, id: TypeId) -> Option<(TypeId, u32)> {
        match self.get(id) {
            ResolvedType::Array { elem, len } => Some((*elem, *len)),
            _ => None,
        }
    }

    pub fn as_function(&self, id: TypeId) -> Option<(&[TypeId], TypeId)> {
        match self.get(id) {
            ResolvedType::Function { params, ret } => Some((params.as_slice(), *ret)),
            _ => None,
        }
    }

    // ==================== Equality ====================

    /// Type equality.
    ///
    /// Identity for everything except pointers (element equality; the
    /// mutability flag is not compared), arrays (length and element), string
    /// types (the known content is ignored) and integer literals (range
    /// containment against concrete integer types, always true against
    /// another literal).
    pub fn equals(&self, a: TypeId, b: TypeId) -> bool {
        if let ResolvedType::IntLiteral(v) = self.get(b) {
            return self.literal_matches(*v, a);
        }
        match (self.get(a), self.get(b)) {
            (ResolvedType::IntLiteral(v), _) => self.literal_matches(*v, b),
            (ResolvedType::Pointer { elem: x, .. }, ResolvedType::Pointer { elem: y, .. }) => {
                self.equals(*x, *y)
            }
            (ResolvedType::Pointer { .. }, _) => false,
            (
                ResolvedType::Array { elem: x, len: n },
                ResolvedType::Array { elem: y, len: m },
            ) => n == m && self.equals(*x, *y),
            (ResolvedType::Str(_), ResolvedType::Str(_)) => true,
            _ => a == b,
        }
    }

    fn literal_matches(&self, value: i64, other: TypeId) -> bool {
        match self.get(other) {
            ResolvedType::IntLiteral(_) => true,
            ResolvedType::Primitive(p) => match p.int_range() {
                Some((lo, hi)) => lo <= value && value <= hi,
                None => false,
            },
            _ => false,
        }
    }

    // ==================== Display ====================

    pub fn display(&self, id: TypeId) -> String {
        match self.get(id) {
            ResolvedType::Primitive(p) => p.name().to_string(),
            ResolvedType::Str(s) if s.is_empty() => "str".to_string(),
            ResolvedType::Str(s) => format!("str({:?})", s),
            ResolvedType::Pointer { mutable: true, elem } => format!("&mut {}", self.display(*elem)),
            ResolvedType::Pointer { mutable: false, elem } => format!("&{}", self.display(*elem)),
            ResolvedType::Array { elem, len } => format!("[{}; {}]", self.display(*elem), len),
            ResolvedType::Function { params, ret } => {
                let params: Vec<String> = params.iter().map(|p| self.display(*p)).collect();
                format!("fn({}) -> {}", params.join(", "), self.display(*ret))
            }
            ResolvedType::Struct(s) => s.name.clone(),
            ResolvedType::Enum(e) => e.name.clone(),
            ResolvedType::IntLiteral(v) => format!("{{integer {}}}", v),
        }
    }
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_primitives_are_fixed() {
        let arena = TypeArena::new();
        for prim in PrimitiveType::ALL {
            assert_eq!(arena.get(prim.id()), &ResolvedType::Primitive(prim));
        }
        assert_eq!(arena.len(), 7);
    }

    #[test]
    fn test_canonicalization() {
        let mut arena = TypeArena::new();
        let p1 = arena.pointer(false, TypeId::I32);
        let p2 = arena.pointer(false, TypeId::I32);
        let p3 = arena.pointer(true, TypeId::I32);
        assert_eq!(p1, p2);
        assert_ne!(p1, p3);

        let a1 = arena.array(p1, 4);
        let a2 = arena.array(p2, 4);
        assert_eq!(a1, a2);
        assert_ne!(a1, arena.array(p1, 5));

        let f1 = arena.function(vec![p1, TypeId::BOOL], TypeId::VOID);
        let f2 = arena.function(vec![p2, TypeId::BOOL], TypeId::VOID);
        assert_eq!(f1, f2);

        assert_eq!(arena.int_literal(7), arena.int_literal(7));
        assert_eq!(arena.str_type("hi"), arena.str_type("hi"));
        assert_eq!(arena.string(), arena.str_type(""));
    }

    #[test]
    fn test_pointer_equality_ignores_mutability() {
        let mut arena = TypeArena::new();
        let shared = arena.pointer(false, TypeId::U32);
        let unique = arena.pointer(true, TypeId::U32);
        assert!(arena.equals(shared, unique));
        assert!(!arena.equals(shared, TypeId::U32));
    }

    #[test]
    fn test_literal_coercion_is_symmetric() {
        let mut arena = TypeArena::new();
        let values = [
            i32::MIN as i64 - 1,
            i32::MIN as i64,
            -1,
            0,
            1,
            i32::MAX as i64,
            i32::MAX as i64 + 1,
            u32::MAX as i64,
            u32::MAX as i64 + 1,
        ];
        let concrete = [
            PrimitiveType::I32,
            PrimitiveType::U32,
            PrimitiveType::Isize,
            PrimitiveType::Usize,
        ];
        for v in values {
            let lit = arena.int_literal(v);
            for prim in concrete {
                let (lo, hi) = prim.int_range().unwrap();
                let expected = lo <= v && v <= hi;
                assert_eq!(arena.equals(lit, prim.id()), expected, "{} vs {}", v, prim.name());
                assert_eq!(arena.equals(prim.id(), lit), expected, "{} vs {}", prim.name(), v);
            }
            assert!(!arena.equals(lit, TypeId::BOOL));
            assert!(!arena.equals(TypeId::CHAR, lit));
        }
        let a = arena.int_literal(-5);
        let b = arena.int_literal(9);
        assert!(arena.equals(a, b));
    }

    #[test]
    fn test_array_literal_elements() {
        let mut arena = TypeArena::new();
        let lit = arena.int_literal(3);
        let lit_array = arena.array(lit, 2);
        let i32_array = arena.array(TypeId::I32, 2);
        assert!(arena.equals(i32_array, lit_array));
        assert!(arena.equals(lit_array, i32_array));
        let longer = arena.array(TypeId::I32, 3);
        assert!(!arena.equals(i32_array, longer));
    }

    #[test]
    fn test_struct_members() {
        let mut arena = TypeArena::new();
        let p = arena.create_struct("P").unwrap();
        assert!(arena.create_struct("P").is_none());
        assert_eq!(arena.struct_by_name("P"), Some(p));

        arena.insert_field(p, "x", TypeId::I32, Span::dummy()).unwrap();
        let self_ptr = arena.pointer(false, p);
        let get = arena.function(vec![self_ptr], TypeId::I32);
        arena.insert_method(p, "get", get, Span::dummy()).unwrap();

        let err = arena.insert_method(p, "get", get, Span::dummy()).unwrap_err();
        assert!(matches!(err, Error::DuplicateMethod { .. }));

        let s = arena.struct_type(p).unwrap();
        assert_eq!(s.field("x"), Some((0, TypeId::I32)));
        assert_eq!(s.method("get"), Some(get));
        assert_eq!(arena.display(get), "fn(&P) -> i32");
    }

    #[test]
    fn test_sealed_struct_rejects_members() {
        let mut arena = TypeArena::new();
        let p = arena.create_struct("P").unwrap();
        arena.seal_structs();
        let err = arena.insert_field(p, "x", TypeId::I32, Span::dummy()).unwrap_err();
        assert_eq!(err, Error::SealedStruct { name: "P".into() });
    }

    #[test]
    fn test_enum_index_of() {
        let mut arena = TypeArena::new();
        let color = arena.create_enum("Color", vec!["Red".into(), "Green".into()]);
        assert_eq!(arena.create_enum("Color", Vec::new()), color);
        let e = arena.enum_type(color).unwrap();
        assert_eq!(e.index_of("Green"), Some(1));
        assert_eq!(e.index_of("Blue"), None);
    }

    #[test]
    fn test_string_content_is_ignored_by_equality() {
        let mut arena = TypeArena::new();
        let five = arena.str_type("5");
        let six = arena.str_type("6");
        let plain = arena.string();
        assert_ne!(five, six);
        assert!(arena.equals(five, six));
        assert!(arena.equals(plain, five));
        let p5 = arena.pointer(false, five);
        let owned = arena.pointer(false, plain);
        assert!(arena.equals(owned, p5));
        assert!(!arena.equals(five, TypeId::CHAR));
    }

    #[test]
    fn test_display() {
        let mut arena = TypeArena::new();
        let arr = arena.array(TypeId::USIZE, 3);
        let ptr = arena.pointer(true, arr);
        assert_eq!(arena.display(ptr), "&mut [usize; 3]");
        assert_eq!(arena.display(TypeId::VOID), "()");
        let lit = arena.int_literal(-2);
        assert_eq!(arena.display(lit), "{integer -2}");
    }
}
