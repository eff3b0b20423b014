//! Decision dag construction.
//!
//! A state is the ordered list of clauses still possible on a path, each
//! with the part of its test tree not yet decided, plus what the path has
//! established about each tested temp. From a state the builder looks at
//! the first clause only:
//!
//! - its tree is `True`: a leaf, or a guard node whose false edge continues
//!   with the remaining clauses;
//! - its first pending step is an evaluation: an evaluation node, and the
//!   same evaluation is marked done in every clause;
//! - its first pending step is a test: a test node forking into a true and
//!   a false state, every clause simplified under the new fact.
//!
//! States are memoized by structural equality and nodes are hash-consed, so
//! equivalent sub-automata are built once and shared.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use sift_ir::{
    ClauseId, DagBinding, DagEval, DagNode, DecisionDag, Guard, Leaf, NodeId, Pattern, TempId,
    TempTable, TempTest, TypeId,
};
use sift_types::TypeTable;

use crate::cond::{Cond, Step};
use crate::knowledge::Knowledge;
use crate::stack::ensure_sufficient_stack;
use crate::translate::{Lowered, Translator};

/// A clause as the dag builder sees it.
#[derive(Copy, Clone, Debug)]
pub struct DagClause<'p> {
    pub pattern: &'p Pattern,
    pub guard: Option<Guard>,
}

impl<'p> DagClause<'p> {
    pub fn new(pattern: &'p Pattern) -> Self {
        DagClause {
            pattern,
            guard: None,
        }
    }

    #[must_use]
    pub fn with_guard(mut self, guard: Option<Guard>) -> Self {
        self.guard = guard;
        self
    }
}

/// Compile ordered clauses over an input of static type `input_ty`.
pub fn build_dag(types: &TypeTable, input_ty: TypeId, clauses: &[DagClause<'_>]) -> DecisionDag {
    let mut builder = DagBuilder::new(types, input_ty);
    for clause in clauses {
        builder.add_pattern(clause.pattern, clause.guard);
    }
    builder.build()
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
struct Case {
    clause: ClauseId,
    cond: Cond,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
struct State {
    cases: Vec<Case>,
    knowledge: Knowledge,
}

/// Collects clauses, then builds their dag.
///
/// Clauses can be added as patterns or as already-lowered test trees; the
/// latter lets analyses ask whether an arbitrary combination of patterns
/// is satisfiable.
pub struct DagBuilder<'a> {
    types: &'a TypeTable,
    temps: TempTable,
    cases: Vec<Case>,
    guards: Vec<Option<Guard>>,
    bindings: Vec<Vec<DagBinding>>,
}

impl<'a> DagBuilder<'a> {
    pub fn new(types: &'a TypeTable, input_ty: TypeId) -> Self {
        DagBuilder {
            types,
            temps: TempTable::new(input_ty),
            cases: Vec::new(),
            guards: Vec::new(),
            bindings: Vec::new(),
        }
    }

    pub fn temps(&self) -> &TempTable {
        &self.temps
    }

    /// A translator writing into this builder's temp table.
    pub fn translator(&mut self) -> Translator<'a, '_> {
        Translator::new(self.types, &mut self.temps)
    }

    /// Lower `pattern` against the input and append it as the next clause.
    pub fn add_pattern(&mut self, pattern: &Pattern, guard: Option<Guard>) -> ClauseId {
        let Lowered { cond, bindings, .. } = self.translator().lower(pattern, TempId::INPUT);
        self.add_cond(cond, bindings, guard)
    }

    /// Append an already-lowered clause.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` clauses are added.
    pub fn add_cond(
        &mut self,
        cond: Cond,
        bindings: Vec<DagBinding>,
        guard: Option<Guard>,
    ) -> ClauseId {
        let index = u32::try_from(self.cases.len())
            .unwrap_or_else(|_| panic!("dag builder exceeded u32::MAX clauses"));
        let clause = ClauseId::new(index);
        self.cases.push(Case { clause, cond });
        self.guards.push(guard);
        self.bindings.push(bindings);
        clause
    }

    pub fn build(self) -> DecisionDag {
        let DagBuilder {
            types,
            temps,
            cases,
            guards,
            bindings,
        } = self;
        let clause_count = cases.len();

        let mut machine = Machine {
            types,
            temps: &temps,
            guards: &guards,
            nodes: Vec::new(),
            interned: FxHashMap::default(),
            states: FxHashMap::default(),
        };
        let live = cases
            .into_iter()
            .filter(|case| !matches!(guards[case.clause.index()], Some(Guard::Constant(false))))
            .collect();
        let initial = machine.settle(live, Knowledge::default(), None);
        let root = machine.build_state(initial);

        tracing::debug!(
            clauses = clause_count,
            states = machine.states.len(),
            nodes = machine.nodes.len(),
            temps = temps.len(),
            "decision dag built"
        );

        DecisionDag {
            nodes: machine.nodes,
            root,
            temps,
            bindings,
        }
    }
}

struct Machine<'b> {
    types: &'b TypeTable,
    temps: &'b TempTable,
    guards: &'b [Option<Guard>],
    nodes: Vec<DagNode>,
    interned: FxHashMap<DagNode, NodeId>,
    states: FxHashMap<State, NodeId>,
}

impl Machine<'_> {
    fn intern(&mut self, node: DagNode) -> NodeId {
        if let Some(&id) = self.interned.get(&node) {
            return id;
        }
        let index = u32::try_from(self.nodes.len())
            .unwrap_or_else(|_| panic!("decision dag exceeded u32::MAX nodes"));
        let id = NodeId::from_index(index);
        self.nodes.push(node.clone());
        self.interned.insert(node, id);
        id
    }

    /// Simplify every case under `knowledge` (and the outcome of the test
    /// just taken), drop impossible cases, and forget facts about temps no
    /// remaining test inspects.
    fn settle(
        &self,
        cases: Vec<Case>,
        mut knowledge: Knowledge,
        decided: Option<(&TempTest, bool)>,
    ) -> State {
        let (types, temps) = (self.types, self.temps);
        let cases: Vec<Case> = {
            let mut known = |step: &Step| match step {
                Step::Test(test) => match decided {
                    Some((taken, outcome)) if taken == test => Some(outcome),
                    _ => knowledge.implies(types, temps, test),
                },
                Step::Eval(_) => None,
            };
            cases
                .into_iter()
                .map(|case| Case {
                    clause: case.clause,
                    cond: case.cond.rewrite(&mut known),
                })
                .filter(|case| !case.cond.is_false())
                .collect()
        };

        let mut tested = Vec::new();
        for case in &cases {
            case.cond.tested_temps(&mut tested);
        }
        let tested: BTreeSet<TempId> = tested.into_iter().collect();
        knowledge.retain_tested(temps, &tested);
        State { cases, knowledge }
    }

    fn build_state(&mut self, state: State) -> NodeId {
        if let Some(&id) = self.states.get(&state) {
            return id;
        }
        let id = ensure_sufficient_stack(|| self.build_uncached(&state));
        self.states.insert(state, id);
        id
    }

    fn build_uncached(&mut self, state: &State) -> NodeId {
        let Some(first) = state.cases.first() else {
            return self.intern(DagNode::Leaf(Leaf::NoMatch));
        };

        if first.cond.is_true() {
            let leaf = self.intern(DagNode::Leaf(Leaf::Clause(first.clause)));
            return match self.guards[first.clause.index()] {
                Some(Guard::Opaque(_)) => {
                    let rest = State {
                        cases: state.cases[1..].to_vec(),
                        knowledge: state.knowledge.clone(),
                    };
                    let when_false = self.build_state(rest);
                    self.intern(DagNode::Guard {
                        clause: first.clause,
                        when_true: leaf,
                        when_false,
                    })
                }
                _ => leaf,
            };
        }

        match first.cond.first_step().cloned() {
            Some(Step::Eval(eval)) => {
                let next = self.build_state(self.performed(state, eval));
                self.intern(DagNode::Evaluation { eval, next })
            }
            Some(Step::Test(test)) => {
                let mut when_true = state.knowledge.clone();
                when_true.learn(self.types, self.temps, &test, true);
                let when_true = self.settle(state.cases.clone(), when_true, Some((&test, true)));

                let mut when_false = state.knowledge.clone();
                when_false.learn(self.types, self.temps, &test, false);
                let when_false =
                    self.settle(state.cases.clone(), when_false, Some((&test, false)));

                let when_true = self.build_state(when_true);
                let when_false = self.build_state(when_false);
                if when_true == when_false {
                    return when_true;
                }
                self.intern(DagNode::Test {
                    test,
                    when_true,
                    when_false,
                })
            }
            // Settled trees are never `False`, and `True` was handled above.
            None => self.build_state(State {
                cases: state.cases[1..].to_vec(),
                knowledge: state.knowledge.clone(),
            }),
        }
    }

    /// The state after `eval` has run: every clause's copy of it is done.
    fn performed(&self, state: &State, eval: DagEval) -> State {
        let mut done = |step: &Step| match step {
            Step::Eval(other) if other.output == eval.output => Some(true),
            _ => None,
        };
        State {
            cases: state
                .cases
                .iter()
                .map(|case| Case {
                    clause: case.clause,
                    cond: case.cond.rewrite(&mut done),
                })
                .collect(),
            knowledge: state.knowledge.clone(),
        }
    }
}
