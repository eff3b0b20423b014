//! Decision dag data types.
//!
//! A [`DecisionDag`] is an arena of [`DagNode`]s addressed by [`NodeId`].
//! Every value the dag inspects is a *temp*: an [`OperandPath`] rooted at the
//! input, registered once in the dag's [`TempTable`] and shared by every
//! clause that needs it.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::{ClauseId, ConstValue, Name, RelationalOp, StringInterner, TypeId};

/// Index of a temp in a [`TempTable`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TempId(u32);

impl TempId {
    /// The matched input.
    pub const INPUT: TempId = TempId(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// One step from a temp to a derived value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum Accessor {
    /// Reference/unboxing/nullable-unwrap conversion after a successful type test.
    Convert(TypeId),
    Property(Name),
    TupleElement(u32),
    DeconstructOutput { index: u32, arity: u32 },
    Length,
    Index(u32),
    /// `^n`, with `n >= 1`.
    IndexFromEnd(u32),
    /// `[start..^end_from_end]`
    Slice { start: u32, end_from_end: u32 },
}

/// Accessors from the input to a temp.
pub type OperandPath = SmallVec<[Accessor; 4]>;

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Temp {
    pub parent: Option<TempId>,
    pub accessor: Option<Accessor>,
    pub ty: TypeId,
}

/// Per-dag registry of temps, deduplicated by (parent, accessor).
#[derive(Clone, Debug)]
pub struct TempTable {
    temps: Vec<Temp>,
    by_step: FxHashMap<(TempId, Accessor), TempId>,
}

impl TempTable {
    /// A table holding only the input temp of type `input_ty`.
    pub fn new(input_ty: TypeId) -> Self {
        TempTable {
            temps: vec![Temp {
                parent: None,
                accessor: None,
                ty: input_ty,
            }],
            by_step: FxHashMap::default(),
        }
    }

    /// The temp reached from `parent` through `accessor`, creating it on first use.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` temps are registered.
    pub fn derive(&mut self, parent: TempId, accessor: Accessor, ty: TypeId) -> TempId {
        if let Some(&existing) = self.by_step.get(&(parent, accessor)) {
            return existing;
        }
        let id = TempId(
            u32::try_from(self.temps.len())
                .unwrap_or_else(|_| panic!("temp table exceeded u32::MAX entries")),
        );
        self.temps.push(Temp {
            parent: Some(parent),
            accessor: Some(accessor),
            ty,
        });
        self.by_step.insert((parent, accessor), id);
        id
    }

    /// Look up an existing derived temp without creating it.
    pub fn find(&self, parent: TempId, accessor: Accessor) -> Option<TempId> {
        self.by_step.get(&(parent, accessor)).copied()
    }

    #[inline]
    pub fn get(&self, temp: TempId) -> &Temp {
        &self.temps[temp.index()]
    }

    #[inline]
    pub fn ty(&self, temp: TempId) -> TypeId {
        self.temps[temp.index()].ty
    }

    pub fn len(&self) -> usize {
        self.temps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TempId, &Temp)> {
        self.temps
            .iter()
            .enumerate()
            .map(|(i, temp)| (TempId(i as u32), temp))
    }

    /// Temps derived directly from `parent`, in creation order.
    pub fn children(&self, parent: TempId) -> impl Iterator<Item = (TempId, &Temp)> {
        self.iter()
            .filter(move |(_, temp)| temp.parent == Some(parent))
    }

    pub fn path(&self, temp: TempId) -> OperandPath {
        let mut path = OperandPath::new();
        let mut current = temp;
        while let Temp {
            parent: Some(parent),
            accessor: Some(accessor),
            ..
        } = self.get(current)
        {
            path.push(*accessor);
            current = *parent;
        }
        path.reverse();
        path
    }

    /// Render a temp's path as source-like text, e.g. `input.Items[^1]`.
    pub fn display_path(&self, temp: TempId, interner: &StringInterner) -> String {
        let mut out = String::from("input");
        for accessor in self.path(temp) {
            match accessor {
                Accessor::Convert(ty) => {
                    out = format!("(({}){out})", ty.builtin_name().unwrap_or("T"));
                }
                Accessor::Property(name) => {
                    out.push('.');
                    out.push_str(interner.lookup(name));
                }
                Accessor::TupleElement(i) => out.push_str(&format!(".Item{}", i + 1)),
                Accessor::DeconstructOutput { index, .. } => {
                    out.push_str(&format!(".Deconstruct#{index}"));
                }
                Accessor::Length => out.push_str(".Length"),
                Accessor::Index(i) => out.push_str(&format!("[{i}]")),
                Accessor::IndexFromEnd(i) => out.push_str(&format!("[^{i}]")),
                Accessor::Slice {
                    start,
                    end_from_end,
                } => out.push_str(&format!("[{start}..^{end_from_end}]")),
            }
        }
        out
    }
}

/// An evaluation storing `input.accessor` into `output`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct DagEval {
    pub input: TempId,
    pub accessor: Accessor,
    pub output: TempId,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum DagTest {
    NonNull,
    ExplicitNull,
    /// Runtime type test; succeeds only for non-null values.
    Type(TypeId),
    Value(ConstValue),
    Relational(RelationalOp, ConstValue),
}

/// A test applied to one temp.
#[derive(Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct TempTest {
    pub temp: TempId,
    pub test: DagTest,
}

impl TempTest {
    pub fn new(temp: TempId, test: DagTest) -> Self {
        TempTest { temp, test }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn from_index(index: u32) -> Self {
        NodeId(index)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Leaf {
    Clause(ClauseId),
    NoMatch,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum DagNode {
    Test {
        test: TempTest,
        when_true: NodeId,
        when_false: NodeId,
    },
    Evaluation {
        eval: DagEval,
        next: NodeId,
    },
    /// Evaluate the clause's guard with its bindings live.
    Guard {
        clause: ClauseId,
        when_true: NodeId,
        when_false: NodeId,
    },
    Leaf(Leaf),
}

impl DagNode {
    pub fn successors(&self) -> SmallVec<[NodeId; 2]> {
        match self {
            DagNode::Test {
                when_true,
                when_false,
                ..
            }
            | DagNode::Guard {
                when_true,
                when_false,
                ..
            } => SmallVec::from_slice(&[*when_true, *when_false]),
            DagNode::Evaluation { next, .. } => SmallVec::from_slice(&[*next]),
            DagNode::Leaf(_) => SmallVec::new(),
        }
    }
}

/// A pattern variable and the temp holding its value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct DagBinding {
    pub name: Name,
    pub temp: TempId,
}

/// The compiled automaton for one switch or `is` expression.
#[derive(Clone, Debug)]
pub struct DecisionDag {
    pub nodes: Vec<DagNode>,
    pub root: NodeId,
    pub temps: TempTable,
    /// Bindings live at each clause's guard and body, indexed by clause.
    pub bindings: Vec<Vec<DagBinding>>,
}

impl DecisionDag {
    #[inline]
    pub fn node(&self, id: NodeId) -> &DagNode {
        &self.nodes[id.index()]
    }

    pub fn clause_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn bindings_of(&self, clause: ClauseId) -> &[DagBinding] {
        self.bindings
            .get(clause.index())
            .map_or(&[], Vec::as_slice)
    }

    /// Nodes reachable from the root in depth-first pre-order.
    pub fn reachable_nodes(&self) -> Vec<NodeId> {
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            let successors = self.node(id).successors();
            stack.extend(successors.into_iter().rev());
        }
        order
    }

    /// Clauses whose leaf or guard is reachable.
    pub fn reachable_clauses(&self) -> FxHashSet<ClauseId> {
        self.reachable_nodes()
            .into_iter()
            .filter_map(|id| match self.node(id) {
                DagNode::Leaf(Leaf::Clause(clause)) | DagNode::Guard { clause, .. } => {
                    Some(*clause)
                }
                _ => None,
            })
            .collect()
    }

    pub fn is_reachable(&self, clause: ClauseId) -> bool {
        self.reachable_clauses().contains(&clause)
    }

    pub fn reaches_no_match(&self) -> bool {
        self.reachable_nodes()
            .into_iter()
            .any(|id| matches!(self.node(id), DagNode::Leaf(Leaf::NoMatch)))
    }

    pub fn test_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, DagNode::Test { .. }))
            .count()
    }
}
