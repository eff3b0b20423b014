//! Sift IR - shared data types for the pattern-matching engine.
//!
//! This crate holds everything the other crates exchange:
//! - Spans and interned names
//! - Type identifiers (resolved by the caller's type table)
//! - Constant values and relational operators
//! - Language versions and the pattern feature set they unlock
//! - The bound pattern tree, clauses, guards and scrutinees
//! - Decision dag nodes, tests, evaluations and the temp table
//!
//! # Design Philosophy
//!
//! - **Intern names**: member and variable names are `Name(u32)`.
//! - **Index, don't point**: dag nodes and temps live in arenas addressed
//!   by `NodeId` / `TempId`.
//! - Doubles are stored as bits so every type here is `Eq + Hash`.

mod clause;
pub mod dag;
mod name;
mod pattern;
mod span;
mod type_id;
mod value;
mod version;

pub use clause::{Clause, ClauseId, EscapeUse, Guard, GuardId, SafeContext, Scrutinee};
pub use dag::{
    Accessor, DagBinding, DagEval, DagNode, DagTest, DecisionDag, Leaf, NodeId, OperandPath,
    TempId, TempTable, TempTest,
};
pub use name::{Name, StringInterner};
pub use pattern::{ListPattern, Pattern, PatternKind, PropertySubpattern, RecursivePattern};
pub use span::Span;
pub use type_id::TypeId;
pub use value::{ConstValue, RelationalOp};
pub use version::{Feature, FeatureSet, LanguageVersion, VersionParseError};
