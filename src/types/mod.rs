//! Type registry

mod type_system;

pub use type_system::{EnumType, PrimitiveType, ResolvedType, StructType, TypeArena, TypeId};
