//! Sift Types - the type table consumed by the pattern engine.
//!
//! The binder collaborator registers every type a pattern may mention:
//! classes with bases and interfaces, structs (including ref-like ones),
//! enums, nullable value types, spans, arrays, tuples and type parameters
//! with their constraints. Members and deconstructors are registered per
//! type.
//!
//! Queries answer the questions type tests need: nullability, value vs
//! reference classification, subtyping, disjointness and which pattern
//! conversions exist. See [`relations`](crate::TypeTable::is_disjoint).

mod flags;
mod relations;
mod table;

pub use flags::TypeFlags;
pub use relations::PatternConversion;
pub use table::{
    Member, MemberKind, ParamConstraint, Primitive, TypeKind, TypeTable, ValueFamily,
};
