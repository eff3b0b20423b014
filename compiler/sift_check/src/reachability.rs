//! Reachability, subsumption, redundancy and exhaustiveness.
//!
//! Every question here is answered by building a decision dag and asking
//! which leaves are reachable:
//!
//! - A clause whose leaf the switch's dag never reaches is subsumed, unless
//!   its pattern cannot match even on its own.
//! - A sub-pattern is redundant when a small dag over "this operand but not
//!   that one" has no reachable clause.
//! - A switch expression is exhaustive when its dag has no reachable
//!   `NoMatch` leaf; otherwise a path to that leaf names a missing value.

use sift_dag::{Cond, DagBuilder, Evaluator, Outcome, Translator, Value};
use sift_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};
use sift_ir::{
    Clause, ClauseId, ConstValue, DecisionDag, Pattern, PatternKind, RecursivePattern,
    Scrutinee, Span, TempId, TypeId,
};
use sift_types::TypeTable;

use crate::explain::{counterexample, find_no_match_path};

/// What the analyzer concluded about one clause or `is` pattern.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ClauseStatus {
    /// Matches every value of the input type.
    AlwaysMatches,
    MayMatch,
    /// Cannot match any value of the input type.
    NeverMatches,
    /// Every value it matches is taken by an earlier clause.
    Subsumed,
    /// Not analyzed: binding failed or the guard is constant `false`.
    Skipped,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SwitchKind {
    Statement,
    Expression,
}

/// How a switch expression fails to cover its input.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Exhaustiveness {
    Exhaustive,
    /// Some non-null value reaches no clause; the string is a sample pattern.
    Missing(String),
    /// Only `null` reaches no clause.
    MissingNull,
    /// Every unmatched value first fails a `when` clause.
    MissingWithGuard(String),
}

pub struct Analyzer<'a> {
    types: &'a TypeTable,
    diagnostics: &'a mut DiagnosticQueue,
}

impl<'a> Analyzer<'a> {
    pub fn new(types: &'a TypeTable, diagnostics: &'a mut DiagnosticQueue) -> Self {
        Analyzer { types, diagnostics }
    }

    /// Classify each clause of a switch compiled into `dag`.
    pub fn classify_clauses(
        &mut self,
        input: TypeId,
        clauses: &[Clause],
        dag: &DecisionDag,
        kind: SwitchKind,
    ) -> Vec<ClauseStatus> {
        let reachable = dag.reachable_clauses();
        let mut statuses = Vec::with_capacity(clauses.len());
        for (index, clause) in clauses.iter().enumerate() {
            let id = ClauseId::new(u32::try_from(index).unwrap_or(u32::MAX));
            let status = if clause.pattern.has_error() || clause.is_never_taken() {
                ClauseStatus::Skipped
            } else {
                let alone = self.coverage(input, &clause.pattern);
                if reachable.contains(&id) {
                    if alone.always {
                        ClauseStatus::AlwaysMatches
                    } else {
                        ClauseStatus::MayMatch
                    }
                } else if alone.can_match {
                    self.report_subsumed(clauses, index, kind);
                    ClauseStatus::Subsumed
                } else {
                    self.diagnostics.add(
                        Diagnostic::error(ErrorCode::PatternNeverMatches)
                            .with_message("the pattern is unreachable: it cannot match the input type")
                            .with_arg(self.types.name(input))
                            .with_label(clause.pattern.span, "never matches"),
                    );
                    ClauseStatus::NeverMatches
                }
            };
            tracing::debug!(clause = index, ?status, "clause classified");
            self.check_redundant_subpatterns(&clause.pattern);
            statuses.push(status);
        }
        statuses
    }

    fn report_subsumed(&mut self, clauses: &[Clause], index: usize, kind: SwitchKind) {
        let clause = &clauses[index];
        let span = clause.pattern.span;
        if kind == SwitchKind::Statement {
            if let PatternKind::Constant { value, .. } = &clause.pattern.kind {
                let duplicate = clauses[..index].iter().find(|earlier| {
                    earlier.is_unconditional()
                        && !earlier.pattern.has_error()
                        && matches!(&earlier.pattern.kind, PatternKind::Constant { value: v, .. } if v == value)
                });
                if let Some(earlier) = duplicate {
                    self.diagnostics.add(
                        Diagnostic::error(ErrorCode::DuplicateCaseLabel)
                            .with_message(format!(
                                "the switch statement contains multiple cases with the label value '{value}'"
                            ))
                            .with_arg(value.to_string())
                            .with_label(span, "duplicate label")
                            .with_secondary_label(earlier.pattern.span, "first used here"),
                    );
                    return;
                }
            }
        }
        let diagnostic = match kind {
            SwitchKind::Statement => Diagnostic::error(ErrorCode::SwitchCaseSubsumed).with_message(
                "the switch case is unreachable; it has already been handled by a previous case",
            ),
            SwitchKind::Expression => Diagnostic::error(ErrorCode::SwitchArmSubsumed).with_message(
                "the pattern has already been handled by a previous arm of the switch expression",
            ),
        };
        self.diagnostics
            .add(diagnostic.with_label(span, "subsumed by an earlier clause"));
    }

    /// Classify a stand-alone `e is pattern`, compiled into a one-clause `dag`.
    pub fn classify_is_pattern(
        &mut self,
        scrutinee: &Scrutinee,
        pattern: &Pattern,
        dag: &DecisionDag,
    ) -> ClauseStatus {
        if pattern.has_error() {
            return ClauseStatus::Skipped;
        }
        let span = pattern.span;
        let trivial = matches!(
            pattern.kind,
            PatternKind::Discard
                | PatternKind::Var(_)
                | PatternKind::Declaration { name: Some(_), .. }
        );

        if let Some(constant) = &scrutinee.constant {
            let value = runtime_value(self.types, scrutinee.ty, constant);
            let outcome = Evaluator::new(self.types).run(dag, &value, |_, _| Ok(true));
            let status = match outcome {
                Ok(Outcome::Matched { .. }) => {
                    if !trivial {
                        self.diagnostics.add(
                            Diagnostic::warning(ErrorCode::GivenExpressionAlwaysMatchesConstant)
                                .with_message("the given expression always matches the provided constant")
                                .with_arg(constant.to_string())
                                .with_label(span, "always true"),
                        );
                    }
                    ClauseStatus::AlwaysMatches
                }
                Ok(Outcome::NoMatch) => {
                    self.diagnostics.add(
                        Diagnostic::warning(ErrorCode::GivenExpressionNeverMatchesPattern)
                            .with_message("the given expression never matches the provided pattern")
                            .with_arg(constant.to_string())
                            .with_label(span, "always false"),
                    );
                    ClauseStatus::NeverMatches
                }
                Err(error) => {
                    tracing::warn!(%error, "constant scrutinee could not be evaluated");
                    ClauseStatus::MayMatch
                }
            };
            self.check_redundant_subpatterns(pattern);
            return status;
        }

        let status = if !dag.is_reachable(ClauseId::new(0)) {
            self.diagnostics.add(
                Diagnostic::error(ErrorCode::IsPatternImpossible)
                    .with_message(format!(
                        "an expression of type '{}' can never match the provided pattern",
                        self.types.name(scrutinee.ty)
                    ))
                    .with_arg(self.types.name(scrutinee.ty))
                    .with_label(span, "never matches"),
            );
            ClauseStatus::NeverMatches
        } else if !dag.reaches_no_match() {
            if !trivial {
                self.diagnostics.add(
                    Diagnostic::warning(ErrorCode::IsPatternAlways)
                        .with_message(format!(
                            "an expression of type '{}' always matches the provided pattern",
                            self.types.name(scrutinee.ty)
                        ))
                        .with_arg(self.types.name(scrutinee.ty))
                        .with_label(span, "always matches"),
                );
            }
            ClauseStatus::AlwaysMatches
        } else {
            ClauseStatus::MayMatch
        };
        tracing::debug!(?status, "is pattern classified");
        self.check_redundant_subpatterns(pattern);
        status
    }

    /// Warn when a switch expression's dag can fall through to `NoMatch`.
    pub fn check_exhaustive(&mut self, dag: &DecisionDag, span: Span) -> Exhaustiveness {
        let types = self.types;
        let result = if let Some(path) =
            find_no_match_path(dag, |step| !step.is_guard_failure() && !step.is_input_null())
        {
            Exhaustiveness::Missing(counterexample(types, dag, &path))
        } else if find_no_match_path(dag, |step| !step.is_guard_failure()).is_some() {
            Exhaustiveness::MissingNull
        } else if let Some(path) = find_no_match_path(dag, |_| true) {
            Exhaustiveness::MissingWithGuard(counterexample(types, dag, &path))
        } else {
            Exhaustiveness::Exhaustive
        };

        let diagnostic = match &result {
            Exhaustiveness::Exhaustive => None,
            Exhaustiveness::Missing(example) => Some(
                Diagnostic::warning(ErrorCode::SwitchExpressionNotExhaustive)
                    .with_message(format!(
                        "the switch expression does not handle all possible values of its input type (it is not exhaustive); for example, the pattern '{example}' is not covered"
                    ))
                    .with_arg(example.clone()),
            ),
            Exhaustiveness::MissingNull => Some(
                Diagnostic::warning(ErrorCode::SwitchExpressionNotExhaustiveForNull)
                    .with_message(
                        "the switch expression does not handle some null inputs (it is not exhaustive); for example, the pattern 'null' is not covered",
                    )
                    .with_arg("null"),
            ),
            Exhaustiveness::MissingWithGuard(example) => Some(
                Diagnostic::warning(ErrorCode::SwitchExpressionNotExhaustiveWithWhen)
                    .with_message(format!(
                        "the switch expression does not handle all possible values of its input type; the pattern '{example}' is covered only by arms with a 'when' clause"
                    ))
                    .with_arg(example.clone()),
            ),
        };
        if let Some(diagnostic) = diagnostic {
            tracing::debug!(?result, "switch expression is not exhaustive");
            self.diagnostics
                .add(diagnostic.with_label(span, "not exhaustive"));
        }
        result
    }

    /// Classic `e is T`: warn when the answer is known statically.
    pub fn check_is_type(&mut self, input: TypeId, target: TypeId, span: Span) -> Option<bool> {
        let types = self.types;
        if types.is_error(input) || types.is_error(target) {
            return None;
        }
        if types.is_value_type(input) && !types.may_be_null(input) && types.is_subtype(input, target)
        {
            self.diagnostics.add(
                Diagnostic::warning(ErrorCode::IsAlwaysTrue)
                    .with_message(format!(
                        "the given expression is always of the provided ('{}') type",
                        types.name(target)
                    ))
                    .with_arg(types.name(target))
                    .with_label(span, "always true"),
            );
            return Some(true);
        }
        if types.is_disjoint(input, target) {
            self.diagnostics.add(
                Diagnostic::warning(ErrorCode::IsAlwaysFalse)
                    .with_message(format!(
                        "the given expression is never of the provided ('{}') type",
                        types.name(target)
                    ))
                    .with_arg(types.name(target))
                    .with_label(span, "always false"),
            );
            return Some(false);
        }
        None
    }

    /// Whether `pattern` alone can match, and whether it always does.
    fn coverage(&self, input: TypeId, pattern: &Pattern) -> Coverage {
        let mut builder = DagBuilder::new(self.types, input);
        let clause = builder.add_pattern(pattern, None);
        let dag = builder.build();
        Coverage {
            can_match: dag.is_reachable(clause),
            always: !dag.reaches_no_match(),
        }
    }

    /// Whether the tree `build` produces can never be satisfied.
    fn unsatisfiable(
        &self,
        input: TypeId,
        build: impl FnOnce(&mut Translator<'a, '_>) -> Cond,
    ) -> bool {
        let mut builder = DagBuilder::new(self.types, input);
        let cond = build(&mut builder.translator());
        let clause = builder.add_cond(cond, Vec::new(), None);
        !builder.build().is_reachable(clause)
    }

    fn check_redundant_subpatterns(&mut self, pattern: &Pattern) {
        if pattern.has_error() {
            return;
        }
        let mut found = Vec::new();
        pattern.walk(&mut |node| match &node.kind {
            PatternKind::Or(left, right) => {
                let input = node.input_type;
                if self.unsatisfiable(input, |t| {
                    let right = t.lower(right, TempId::INPUT).cond;
                    let left = t.lower(left, TempId::INPUT).cond;
                    Cond::and(vec![right, Cond::not(left)])
                }) {
                    found.push(redundant(right.span));
                }
            }
            PatternKind::And(left, right) => {
                if matches!(right.kind, PatternKind::Discard) || right.has_designation() {
                    return;
                }
                let input = node.input_type;
                let left_possible = !self.unsatisfiable(input, |t| t.lower(left, TempId::INPUT).cond);
                if left_possible
                    && self.unsatisfiable(input, |t| {
                        let left = t.lower(left, TempId::INPUT);
                        let right = t.lower(right, left.narrowed).cond;
                        Cond::and(vec![left.cond, Cond::not(right)])
                    })
                {
                    found.push(redundant(right.span));
                }
            }
            PatternKind::Recursive(rec) => found.extend(self.hidden_property_retests(rec)),
            _ => {}
        });
        for diagnostic in found {
            self.diagnostics.add(diagnostic);
        }
    }

    /// `{ A: p, A: q }` where `p` already implies `q`.
    fn hidden_property_retests(&self, rec: &RecursivePattern) -> Vec<Diagnostic> {
        let Some(properties) = &rec.properties else {
            return Vec::new();
        };
        let mut found = Vec::new();
        for (index, later) in properties.iter().enumerate() {
            if later.pattern.has_designation() {
                continue;
            }
            let implied = properties[..index].iter().any(|earlier| {
                earlier.members == later.members
                    && self.unsatisfiable(later.pattern.input_type, |t| {
                        let earlier = t.lower(&earlier.pattern, TempId::INPUT).cond;
                        let later = t.lower(&later.pattern, TempId::INPUT).cond;
                        Cond::and(vec![earlier, Cond::not(later)])
                    })
            });
            if implied {
                found.push(
                    Diagnostic::hidden(ErrorCode::RedundantPatternHidden)
                        .with_message("the pattern is redundant; the member was already tested")
                        .with_label(later.span, "already implied by an earlier subpattern"),
                );
            }
        }
        found
    }
}

#[derive(Copy, Clone, Debug)]
struct Coverage {
    can_match: bool,
    always: bool,
}

fn redundant(span: Span) -> Diagnostic {
    Diagnostic::warning(ErrorCode::RedundantPattern)
        .with_message("the pattern is redundant")
        .with_label(span, "redundant")
}

/// The runtime value of a constant scrutinee of static type `ty`.
pub fn runtime_value(types: &TypeTable, ty: TypeId, constant: &ConstValue) -> Value {
    let closed = types.strip_nullable(ty);
    match constant {
        ConstValue::Null => Value::Null,
        ConstValue::Bool(b) => Value::Bool(*b),
        ConstValue::Char(c) => Value::Char(*c),
        ConstValue::Int(value) => {
            let ty = if types.value_family(closed).is_some() && closed != TypeId::DOUBLE {
                closed
            } else {
                TypeId::INT
            };
            Value::Int { ty, value: *value }
        }
        ConstValue::Double(bits) => Value::Double(f64::from_bits(*bits)),
        ConstValue::Str(text) if types.is_char_span(closed) => Value::char_span(closed, text),
        ConstValue::Str(text) => Value::string(text),
    }
}
