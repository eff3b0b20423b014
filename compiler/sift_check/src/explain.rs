//! Paths to the dag's `NoMatch` leaf and the counterexamples they imply.
//!
//! Rather than re-deriving coverage from the source patterns, we walk the
//! compiled dag: every root-to-`NoMatch` path is a set of values no clause
//! accepts. Replaying the path's test outcomes into [`Knowledge`] gives the
//! facts each temp satisfies, and the facts render as a pattern.

use rustc_hash::FxHashSet;
use sift_dag::{ensure_sufficient_stack, Knowledge};
use sift_ir::{
    Accessor, ClauseId, DagEval, DagNode, DagTest, DecisionDag, Leaf, NodeId, TempId, TempTest,
};
use sift_types::TypeTable;

/// One edge taken on a dag path.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum PathStep {
    Test(TempTest, bool),
    Eval(DagEval),
    /// The clause's guard evaluated to `false`.
    GuardFailed(ClauseId),
}

impl PathStep {
    pub fn is_guard_failure(&self) -> bool {
        matches!(self, PathStep::GuardFailed(_))
    }

    /// Whether taking this edge establishes that the input itself is null.
    pub fn is_input_null(&self) -> bool {
        match self {
            PathStep::Test(test, outcome) if test.temp == TempId::INPUT => matches!(
                (&test.test, outcome),
                (DagTest::NonNull, false) | (DagTest::ExplicitNull, true)
            ),
            _ => false,
        }
    }
}

/// A path from the root to a `NoMatch` leaf using only edges `allow` accepts.
pub fn find_no_match_path(
    dag: &DecisionDag,
    allow: impl Fn(&PathStep) -> bool,
) -> Option<Vec<PathStep>> {
    let mut search = Search {
        dag,
        allow: &allow,
        dead: FxHashSet::default(),
        path: Vec::new(),
    };
    search.visit(dag.root).then_some(search.path)
}

struct Search<'a, F> {
    dag: &'a DecisionDag,
    allow: &'a F,
    /// Nodes from which no allowed path reaches `NoMatch`.
    dead: FxHashSet<NodeId>,
    path: Vec<PathStep>,
}

impl<F: Fn(&PathStep) -> bool> Search<'_, F> {
    fn visit(&mut self, node: NodeId) -> bool {
        if self.dead.contains(&node) {
            return false;
        }
        let found = ensure_sufficient_stack(|| self.visit_uncached(node));
        if !found {
            self.dead.insert(node);
        }
        found
    }

    fn visit_uncached(&mut self, node: NodeId) -> bool {
        let edges: Vec<(PathStep, NodeId)> = match self.dag.node(node) {
            DagNode::Leaf(Leaf::NoMatch) => return true,
            DagNode::Leaf(Leaf::Clause(_)) => return false,
            DagNode::Test {
                test,
                when_true,
                when_false,
            } => vec![
                (PathStep::Test(test.clone(), true), *when_true),
                (PathStep::Test(test.clone(), false), *when_false),
            ],
            DagNode::Evaluation { eval, next } => vec![(PathStep::Eval(*eval), *next)],
            DagNode::Guard {
                clause, when_false, ..
            } => vec![(PathStep::GuardFailed(*clause), *when_false)],
        };
        for (step, next) in edges {
            if !(self.allow)(&step) {
                continue;
            }
            self.path.push(step);
            if self.visit(next) {
                return true;
            }
            self.path.pop();
        }
        false
    }
}

/// Render the values reaching the end of `path` as a pattern.
pub fn counterexample(types: &TypeTable, dag: &DecisionDag, path: &[PathStep]) -> String {
    let mut knowledge = Knowledge::default();
    let mut evaluated = Vec::new();
    for step in path {
        match step {
            PathStep::Test(test, outcome) => knowledge.learn(types, &dag.temps, test, *outcome),
            PathStep::Eval(eval) => evaluated.push(*eval),
            PathStep::GuardFailed(_) => {}
        }
    }
    Describer {
        types,
        dag,
        knowledge,
        evaluated,
    }
    .describe(TempId::INPUT)
}

struct Describer<'a> {
    types: &'a TypeTable,
    dag: &'a DecisionDag,
    knowledge: Knowledge,
    evaluated: Vec<DagEval>,
}

impl Describer<'_> {
    fn describe(&self, temp: TempId) -> String {
        ensure_sufficient_stack(|| self.describe_uncached(temp))
    }

    fn describe_uncached(&self, temp: TempId) -> String {
        let types = self.types;
        let temps = &self.dag.temps;
        let facts = self.knowledge.facts(temp);
        let null = facts.and_then(|facts| facts.null);
        if null == Some(true) {
            return String::from("null");
        }
        if let Some(sample) = self
            .knowledge
            .value_set(types, temps, temp)
            .filter(|values| !values.is_full())
            .and_then(|values| values.sample())
        {
            return sample.to_string();
        }

        let mut positional: Vec<(u32, String)> = Vec::new();
        let mut arity = 0;
        let mut properties: Vec<(String, String)> = Vec::new();
        for eval in self.evaluated.iter().filter(|eval| eval.input == temp) {
            match eval.accessor {
                Accessor::Convert(ty) => {
                    let inner = self.describe(eval.output);
                    let name = types.name(ty);
                    return if inner == "_" || inner == "not null" {
                        name.to_owned()
                    } else if inner.starts_with('(') {
                        format!("{name}{inner}")
                    } else if inner.starts_with('{') {
                        format!("{name} {inner}")
                    } else {
                        inner
                    };
                }
                Accessor::Property(name) => {
                    properties.push((types.name_text(name).to_owned(), self.describe(eval.output)));
                }
                Accessor::Length => {
                    properties.push((String::from("Length"), self.describe(eval.output)));
                }
                Accessor::TupleElement(index) => {
                    arity = types
                        .tuple_elements(temps.ty(temp))
                        .map_or(0, <[_]>::len);
                    positional.push((index, self.describe(eval.output)));
                }
                Accessor::DeconstructOutput {
                    index,
                    arity: outputs,
                } => {
                    arity = outputs as usize;
                    positional.push((index, self.describe(eval.output)));
                }
                Accessor::Index(_) | Accessor::IndexFromEnd(_) | Accessor::Slice { .. } => {}
            }
        }

        let mut parts = Vec::new();
        if positional.iter().any(|(_, text)| text != "_") {
            let mut slots = vec![String::from("_"); arity.max(positional.len())];
            for (index, text) in positional {
                if let Some(slot) = slots.get_mut(index as usize) {
                    *slot = text;
                }
            }
            parts.push(format!("({})", slots.join(", ")));
        }
        let shown: Vec<String> = properties
            .into_iter()
            .filter(|(_, text)| text != "_")
            .map(|(name, text)| format!("{name}: {text}"))
            .collect();
        if !shown.is_empty() {
            parts.push(format!("{{ {} }}", shown.join(", ")));
        }
        if !parts.is_empty() {
            return parts.join(" ");
        }
        if null == Some(false) && types.may_be_null(temps.ty(temp)) {
            return String::from("not null");
        }
        String::from("_")
    }
}
