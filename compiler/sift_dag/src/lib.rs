//! Sift DAG - compiles pattern clauses into a decision dag.
//!
//! # Pipeline
//!
//! 1. [`translate`]: each clause's bound pattern lowers to a [`Cond`], a
//!    boolean tree over null, type, value and relational tests and the
//!    evaluations that produce the temps those tests read.
//! 2. [`build`]: a state machine over the ordered clauses turns the trees
//!    into a [`DecisionDag`](sift_ir::DecisionDag). States and nodes are
//!    shared, so each distinct test on a path runs at most once.
//! 3. [`lower`]: the dag becomes a block program with integer and string
//!    switches.
//!
//! [`eval`] runs a dag against runtime values and [`naive`] runs the
//! clauses one at a time; the two must always agree.

pub mod build;
pub mod cond;
pub mod eval;
pub mod knowledge;
pub mod lower;
pub mod naive;
mod stack;
pub mod translate;
pub mod value_set;

pub use build::{build_dag, DagBuilder, DagClause};
pub use cond::{Cond, Step};
pub use eval::{EvalError, Evaluator, Outcome, Value};
pub use knowledge::{Knowledge, TempFacts};
pub use lower::{
    compute_string_hash, lower_dag, BlockId, CharDispatch, LoweredDag, StringDispatch,
    StringDispatchPolicy, Terminator,
};
pub use naive::{first_match, matches};
pub use stack::ensure_sufficient_stack;
pub use translate::{Lowered, Translator};
pub use value_set::{DiscreteKind, OrdinalKind, ValueSet};
