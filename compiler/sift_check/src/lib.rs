//! Sift Check - binding and static analysis of pattern-matching constructs.
//!
//! Each entry point on [`PatternChecker`] binds the clauses against the
//! scrutinee's type, compiles them into one decision dag, and answers every
//! question from that dag:
//!
//! - [`reachability`]: subsumed, impossible and always-matching clauses,
//!   redundant sub-patterns, and exhaustiveness of switch expressions.
//! - [`escape`]: variables bound over ref-like values used outside the
//!   scope they may refer to.
//!
//! Diagnostics are accumulated and returned in a [`PatternReport`]; none
//! of the entry points fail.

pub mod bind;
pub mod escape;
pub mod explain;
mod options;
pub mod reachability;

use std::sync::Once;

use rayon::prelude::*;
use sift_dag::{lower_dag, DagBuilder, EvalError, Evaluator, LoweredDag, Outcome, Value};
use sift_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};
use sift_ir::{Clause, ClauseId, DagBinding, DecisionDag, Name, Scrutinee, Span, TypeId};
use sift_types::TypeTable;

pub use bind::Binder;
pub use options::CompileOptions;
pub use reachability::{ClauseStatus, Exhaustiveness, SwitchKind};

use crate::reachability::Analyzer;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=sift_dag=debug` or
/// `RUST_LOG=sift_check=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// Everything learned about one switch or `is` pattern.
#[derive(Clone, Debug)]
pub struct PatternReport {
    pub diagnostics: Vec<Diagnostic>,
    /// The clauses after binding.
    pub clauses: Vec<Clause>,
    pub statuses: Vec<ClauseStatus>,
    pub dag: DecisionDag,
    /// Variables bound by each clause, indexed by clause.
    pub bindings: Vec<Vec<DagBinding>>,
    pub lowered: LoweredDag,
    /// `Some` for switch expressions only.
    pub exhaustiveness: Option<Exhaustiveness>,
}

impl PatternReport {
    pub fn codes(&self) -> Vec<ErrorCode> {
        self.diagnostics.iter().map(|diag| diag.code).collect()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Run the lowered program on `input`, treating every guard as `true`.
    pub fn run(&self, evaluator: &Evaluator<'_>, input: &Value) -> Result<Outcome, EvalError> {
        self.run_with_guards(evaluator, input, |_, _| Ok(true))
    }

    pub fn run_with_guards<G>(
        &self,
        evaluator: &Evaluator<'_>,
        input: &Value,
        guard: G,
    ) -> Result<Outcome, EvalError>
    where
        G: FnMut(ClauseId, &[(Name, Value)]) -> Result<bool, EvalError>,
    {
        self.lowered.run(evaluator, input, guard)
    }

    /// Whether `input` selects a clause, with every guard `true`.
    pub fn matches(&self, types: &TypeTable, input: &Value) -> Result<bool, EvalError> {
        let outcome = self.run(&Evaluator::new(types), input)?;
        Ok(matches!(outcome, Outcome::Matched { .. }))
    }
}

pub struct PatternChecker<'a> {
    types: &'a TypeTable,
    options: &'a CompileOptions,
}

impl<'a> PatternChecker<'a> {
    pub fn new(types: &'a TypeTable, options: &'a CompileOptions) -> Self {
        PatternChecker { types, options }
    }

    pub fn check_switch_statement(&self, scrutinee: &Scrutinee, clauses: &[Clause]) -> PatternReport {
        self.check_switch(scrutinee, clauses, SwitchKind::Statement)
    }

    pub fn check_switch_expression(&self, scrutinee: &Scrutinee, clauses: &[Clause]) -> PatternReport {
        self.check_switch(scrutinee, clauses, SwitchKind::Expression)
    }

    fn check_switch(
        &self,
        scrutinee: &Scrutinee,
        clauses: &[Clause],
        kind: SwitchKind,
    ) -> PatternReport {
        let _span = tracing::debug_span!("check_switch", ?kind, clauses = clauses.len()).entered();
        let mut queue = DiagnosticQueue::with_config(self.options.diagnostics.clone());
        let clauses = self.bind(scrutinee, clauses, &mut queue);
        let dag = self.build(scrutinee.ty, &clauses);

        let mut analyzer = Analyzer::new(self.types, &mut queue);
        let statuses = analyzer.classify_clauses(scrutinee.ty, &clauses, &dag, kind);
        let exhaustiveness = (kind == SwitchKind::Expression)
            .then(|| analyzer.check_exhaustive(&dag, scrutinee.span));
        escape::check_escapes(self.types, scrutinee, &dag, &clauses, &mut queue);

        self.finish(queue, clauses, statuses, dag, exhaustiveness)
    }

    /// `e is pattern`, with `clause` carrying the pattern and the uses of
    /// its variables.
    pub fn check_is_pattern(&self, scrutinee: &Scrutinee, clause: &Clause) -> PatternReport {
        let _span = tracing::debug_span!("check_is_pattern").entered();
        let mut queue = DiagnosticQueue::with_config(self.options.diagnostics.clone());
        let clauses = self.bind(scrutinee, std::slice::from_ref(clause), &mut queue);
        let dag = self.build(scrutinee.ty, &clauses);

        let statuses = clauses
            .iter()
            .map(|clause| {
                Analyzer::new(self.types, &mut queue).classify_is_pattern(
                    scrutinee,
                    &clause.pattern,
                    &dag,
                )
            })
            .collect();
        escape::check_escapes(self.types, scrutinee, &dag, &clauses, &mut queue);

        self.finish(queue, clauses, statuses, dag, None)
    }

    /// Classic `e is T`. Returns the statically known answer, if any.
    pub fn check_is_type(
        &self,
        scrutinee: &Scrutinee,
        target: TypeId,
        span: Span,
    ) -> (Option<bool>, Vec<Diagnostic>) {
        let mut queue = DiagnosticQueue::with_config(self.options.diagnostics.clone());
        let answer = Analyzer::new(self.types, &mut queue).check_is_type(scrutinee.ty, target, span);
        (answer, queue.flush())
    }

    fn bind(&self, scrutinee: &Scrutinee, clauses: &[Clause], queue: &mut DiagnosticQueue) -> Vec<Clause> {
        let mut bound = clauses.to_vec();
        for clause in &mut bound {
            Binder::new(self.types, self.options, queue).bind(&mut clause.pattern, scrutinee.ty);
        }
        bound
    }

    fn build(&self, input: TypeId, clauses: &[Clause]) -> DecisionDag {
        let mut builder = DagBuilder::new(self.types, input);
        for clause in clauses {
            builder.add_pattern(&clause.pattern, clause.guard);
        }
        builder.build()
    }

    fn finish(
        &self,
        mut queue: DiagnosticQueue,
        clauses: Vec<Clause>,
        statuses: Vec<ClauseStatus>,
        dag: DecisionDag,
        exhaustiveness: Option<Exhaustiveness>,
    ) -> PatternReport {
        let lowered = lower_dag(self.types, &dag, self.options.dispatch);
        let diagnostics = queue.flush();
        tracing::debug!(
            nodes = dag.nodes.len(),
            blocks = lowered.blocks.len(),
            diagnostics = diagnostics.len(),
            "pattern check finished"
        );
        PatternReport {
            diagnostics,
            clauses,
            statuses,
            bindings: dag.bindings.clone(),
            dag,
            lowered,
            exhaustiveness,
        }
    }
}

/// One unit of work for [`check_batch`].
#[derive(Clone, Debug)]
pub enum SwitchJob {
    Statement(Scrutinee, Vec<Clause>),
    Expression(Scrutinee, Vec<Clause>),
    IsPattern(Scrutinee, Clause),
}

/// Check independent constructs in parallel. Reports come back in job order.
pub fn check_batch(
    types: &TypeTable,
    options: &CompileOptions,
    jobs: &[SwitchJob],
) -> Vec<PatternReport> {
    let checker = PatternChecker::new(types, options);
    jobs.par_iter()
        .map(|job| match job {
            SwitchJob::Statement(scrutinee, clauses) => {
                checker.check_switch_statement(scrutinee, clauses)
            }
            SwitchJob::Expression(scrutinee, clauses) => {
                checker.check_switch_expression(scrutinee, clauses)
            }
            SwitchJob::IsPattern(scrutinee, clause) => checker.check_is_pattern(scrutinee, clause),
        })
        .collect()
}
