//! Lowering a decision dag to a block program.
//!
//! Each dag node becomes a block ending in one [`Terminator`]. Chains of
//! value tests on the same temp (each test's false edge leading to the
//! next) collapse into a single `SwitchInt` or `SwitchString`. String
//! switches pick a dispatch strategy from the [`StringDispatchPolicy`].
//!
//! The program is executable so every backend path can be checked against
//! the dag evaluator.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;
use sift_ir::{
    ClauseId, ConstValue, DagBinding, DagEval, DagNode, DagTest, DecisionDag, Leaf, Name, NodeId,
    TempId, TempTest,
};
use sift_types::{TypeTable, ValueFamily};

use crate::eval::{collect_bindings, EvalError, Evaluator, Outcome, Value};

/// FNV-1a over UTF-16 code units.
pub fn compute_string_hash(units: &[u16]) -> u32 {
    const OFFSET_BASIS: u32 = 2_166_136_261;
    const PRIME: u32 = 16_777_619;
    units
        .iter()
        .fold(OFFSET_BASIS, |hash, unit| (u32::from(*unit) ^ hash).wrapping_mul(PRIME))
}

/// How string switches are dispatched.
#[derive(Copy, Clone)]
pub struct StringDispatchPolicy {
    /// Bucket by length and switch on characters instead of hashing.
    pub length_based: bool,
    /// Switches with fewer candidates compare sequentially.
    pub hash_threshold: usize,
    pub hash_fn: fn(&[u16]) -> u32,
}

impl Default for StringDispatchPolicy {
    fn default() -> Self {
        StringDispatchPolicy {
            length_based: true,
            hash_threshold: 7,
            hash_fn: compute_string_hash,
        }
    }
}

impl StringDispatchPolicy {
    #[must_use]
    pub fn with_length_based(mut self, length_based: bool) -> Self {
        self.length_based = length_based;
        self
    }

    #[must_use]
    pub fn with_hash_threshold(mut self, threshold: usize) -> Self {
        self.hash_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_hash_fn(mut self, hash_fn: fn(&[u16]) -> u32) -> Self {
        self.hash_fn = hash_fn;
        self
    }
}

impl fmt::Debug for StringDispatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringDispatchPolicy")
            .field("length_based", &self.length_based)
            .field("hash_threshold", &self.hash_threshold)
            .finish_non_exhaustive()
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct BlockId(u32);

impl BlockId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// Narrowing of a same-length bucket by one code unit position.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum CharDispatch {
    /// Indices into the switch's cases, each verified by full comparison.
    Candidates(Vec<usize>),
    Switch {
        position: usize,
        arms: Vec<(u16, CharDispatch)>,
    },
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum StringDispatch {
    Sequential,
    LengthBased(Vec<(usize, CharDispatch)>),
    /// `(hash, candidate indices)`, sorted by hash.
    Hashed(Vec<(u32, Vec<usize>)>),
}

#[derive(Clone, PartialEq, Debug)]
pub enum Terminator {
    Branch {
        test: TempTest,
        then_block: BlockId,
        else_block: BlockId,
    },
    /// Cases sorted by value.
    SwitchInt {
        temp: TempId,
        cases: Vec<(ConstValue, BlockId)>,
        default: BlockId,
    },
    /// Case texts are held as UTF-16 code units.
    SwitchString {
        temp: TempId,
        cases: Vec<(Vec<u16>, BlockId)>,
        dispatch: StringDispatch,
        default: BlockId,
    },
    Eval {
        eval: DagEval,
        next: BlockId,
    },
    Guard {
        clause: ClauseId,
        then_block: BlockId,
        else_block: BlockId,
    },
    Arm(ClauseId),
    NoMatch,
}

/// The block program for one dag.
#[derive(Clone, Debug)]
pub struct LoweredDag {
    pub blocks: Vec<Terminator>,
    pub entry: BlockId,
    pub bindings: Vec<Vec<DagBinding>>,
    temp_count: usize,
    hash_fn: fn(&[u16]) -> u32,
}

pub fn lower_dag(types: &TypeTable, dag: &DecisionDag, policy: StringDispatchPolicy) -> LoweredDag {
    let mut lowerer = Lowerer {
        types,
        dag,
        policy,
        blocks: Vec::new(),
        block_of: FxHashMap::default(),
    };
    let entry = lowerer.block_for(dag.root);
    let switches = lowerer
        .blocks
        .iter()
        .filter(|block| {
            matches!(
                block,
                Some(Terminator::SwitchInt { .. } | Terminator::SwitchString { .. })
            )
        })
        .count();
    tracing::debug!(
        blocks = lowerer.blocks.len(),
        switches,
        "decision dag lowered"
    );
    LoweredDag {
        blocks: lowerer
            .blocks
            .into_iter()
            .map(|block| block.unwrap_or(Terminator::NoMatch))
            .collect(),
        entry,
        bindings: dag.bindings.clone(),
        temp_count: dag.temps.len(),
        hash_fn: policy.hash_fn,
    }
}

#[derive(Copy, Clone, Eq, PartialEq)]
enum SwitchKind {
    Int,
    String,
}

struct Lowerer<'a> {
    types: &'a TypeTable,
    dag: &'a DecisionDag,
    policy: StringDispatchPolicy,
    /// `None` while a block's successors are being lowered.
    blocks: Vec<Option<Terminator>>,
    block_of: FxHashMap<NodeId, BlockId>,
}

impl Lowerer<'_> {
    fn block_for(&mut self, node: NodeId) -> BlockId {
        if let Some(&block) = self.block_of.get(&node) {
            return block;
        }
        let block = BlockId(u32::try_from(self.blocks.len()).unwrap_or(u32::MAX));
        self.blocks.push(None);
        self.block_of.insert(node, block);
        let terminator = crate::stack::ensure_sufficient_stack(|| self.terminator(node));
        self.blocks[block.index()] = Some(terminator);
        block
    }

    fn terminator(&mut self, node: NodeId) -> Terminator {
        match self.dag.node(node).clone() {
            DagNode::Test {
                test,
                when_true,
                when_false,
            } => {
                if let Some(switch) = self.switch_chain(&test, node) {
                    return switch;
                }
                Terminator::Branch {
                    test,
                    then_block: self.block_for(when_true),
                    else_block: self.block_for(when_false),
                }
            }
            DagNode::Evaluation { eval, next } => Terminator::Eval {
                eval,
                next: self.block_for(next),
            },
            DagNode::Guard {
                clause,
                when_true,
                when_false,
            } => Terminator::Guard {
                clause,
                then_block: self.block_for(when_true),
                else_block: self.block_for(when_false),
            },
            DagNode::Leaf(Leaf::Clause(clause)) => Terminator::Arm(clause),
            DagNode::Leaf(Leaf::NoMatch) => Terminator::NoMatch,
        }
    }

    fn switch_kind(&self, temp: TempId) -> Option<SwitchKind> {
        match self.types.value_family(self.dag.temps.ty(temp))? {
            ValueFamily::Bool | ValueFamily::Integral { .. } => Some(SwitchKind::Int),
            ValueFamily::String => Some(SwitchKind::String),
            ValueFamily::Double => None,
        }
    }

    /// Collapse `x == a ? A : x == b ? B : ... : D` into one switch.
    fn switch_chain(&mut self, first: &TempTest, start: NodeId) -> Option<Terminator> {
        let DagTest::Value(_) = first.test else {
            return None;
        };
        let temp = first.temp;
        let kind = self.switch_kind(temp)?;

        let mut arms: Vec<(ConstValue, NodeId)> = Vec::new();
        let mut current = start;
        while let DagNode::Test {
            test:
                TempTest {
                    temp: tested,
                    test: DagTest::Value(value),
                },
            when_true,
            when_false,
        } = self.dag.node(current)
        {
            if *tested != temp || arms.iter().any(|(seen, _)| seen == value) {
                break;
            }
            arms.push((value.clone(), *when_true));
            current = *when_false;
        }
        if arms.len() < 2 {
            return None;
        }

        let default = self.block_for(current);
        match kind {
            SwitchKind::Int => {
                let mut cases: Vec<(ConstValue, BlockId)> = arms
                    .into_iter()
                    .map(|(value, target)| (value, self.block_for(target)))
                    .collect();
                cases.sort_by_key(|(value, _)| value.as_ordinal());
                Some(Terminator::SwitchInt {
                    temp,
                    cases,
                    default,
                })
            }
            SwitchKind::String => {
                let cases: Vec<(Vec<u16>, BlockId)> = arms
                    .into_iter()
                    .filter_map(|(value, target)| match value {
                        ConstValue::Str(text) => {
                            Some((text.encode_utf16().collect(), self.block_for(target)))
                        }
                        _ => None,
                    })
                    .collect();
                let dispatch = self.string_dispatch(&cases);
                Some(Terminator::SwitchString {
                    temp,
                    cases,
                    dispatch,
                    default,
                })
            }
        }
    }

    fn string_dispatch(&self, cases: &[(Vec<u16>, BlockId)]) -> StringDispatch {
        let policy = self.policy;
        let dispatch = if cases.len() < policy.hash_threshold {
            StringDispatch::Sequential
        } else if policy.length_based {
            let mut by_length: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
            for (index, (text, _)) in cases.iter().enumerate() {
                by_length.entry(text.len()).or_default().push(index);
            }
            StringDispatch::LengthBased(
                by_length
                    .into_iter()
                    .map(|(length, candidates)| (length, char_dispatch(cases, candidates)))
                    .collect(),
            )
        } else {
            let mut by_hash: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
            for (index, (text, _)) in cases.iter().enumerate() {
                by_hash.entry((policy.hash_fn)(text)).or_default().push(index);
            }
            StringDispatch::Hashed(by_hash.into_iter().collect())
        };
        tracing::trace!(
            cases = cases.len(),
            strategy = match dispatch {
                StringDispatch::Sequential => "sequential",
                StringDispatch::LengthBased(_) => "length",
                StringDispatch::Hashed(_) => "hash",
            },
            "string switch dispatch"
        );
        dispatch
    }
}

/// Split same-length candidates on the position with the most distinct
/// code units, recursively, until each group holds one candidate.
fn char_dispatch(cases: &[(Vec<u16>, BlockId)], candidates: Vec<usize>) -> CharDispatch {
    if candidates.len() < 2 {
        return CharDispatch::Candidates(candidates);
    }
    let chars: Vec<&[u16]> = candidates
        .iter()
        .map(|&index| cases[index].0.as_slice())
        .collect();
    let length = chars[0].len();
    let best = (0..length)
        .map(|position| {
            let mut distinct: Vec<u16> = chars.iter().map(|text| text[position]).collect();
            distinct.sort_unstable();
            distinct.dedup();
            (distinct.len(), position)
        })
        .max_by(|(a, pa), (b, pb)| a.cmp(b).then(pb.cmp(pa)));
    let Some((distinct, position)) = best else {
        return CharDispatch::Candidates(candidates);
    };
    if distinct < 2 {
        return CharDispatch::Candidates(candidates);
    }
    let mut groups: BTreeMap<u16, Vec<usize>> = BTreeMap::new();
    for (slot, &index) in candidates.iter().enumerate() {
        groups.entry(chars[slot][position]).or_default().push(index);
    }
    CharDispatch::Switch {
        position,
        arms: groups
            .into_iter()
            .map(|(c, group)| (c, char_dispatch(cases, group)))
            .collect(),
    }
}

impl LoweredDag {
    pub fn block(&self, id: BlockId) -> &Terminator {
        &self.blocks[id.index()]
    }

    /// Execute the program on `input`.
    pub fn run<G>(
        &self,
        evaluator: &Evaluator<'_>,
        input: &Value,
        mut guard: G,
    ) -> Result<Outcome, EvalError>
    where
        G: FnMut(ClauseId, &[(Name, Value)]) -> Result<bool, EvalError>,
    {
        let mut temps: Vec<Option<Value>> = vec![None; self.temp_count];
        temps[TempId::INPUT.index()] = Some(input.clone());
        let read = |temps: &[Option<Value>], temp: TempId| -> Result<Value, EvalError> {
            temps
                .get(temp.index())
                .and_then(Clone::clone)
                .ok_or(EvalError::TempNotEvaluated(temp))
        };

        let mut current = self.entry;
        loop {
            let block = self
                .blocks
                .get(current.index())
                .ok_or(EvalError::MalformedDag(current.index()))?;
            current = match block {
                Terminator::Branch {
                    test,
                    then_block,
                    else_block,
                } => {
                    if evaluator.test(&read(&temps, test.temp)?, &test.test) {
                        *then_block
                    } else {
                        *else_block
                    }
                }
                Terminator::SwitchInt {
                    temp,
                    cases,
                    default,
                } => {
                    let value = read(&temps, *temp)?;
                    value
                        .as_ordinal()
                        .and_then(|v| {
                            cases
                                .binary_search_by_key(&Some(v), |(c, _)| c.as_ordinal())
                                .ok()
                        })
                        .map_or(*default, |found| cases[found].1)
                }
                Terminator::SwitchString {
                    temp,
                    cases,
                    dispatch,
                    default,
                } => {
                    let value = read(&temps, *temp)?;
                    value
                        .as_units()
                        .and_then(|units| self.dispatch_string(&units, cases, dispatch))
                        .unwrap_or(*default)
                }
                Terminator::Eval { eval, next } => {
                    let value = read(&temps, eval.input)?;
                    temps[eval.output.index()] = Some(evaluator.access(&value, eval.accessor)?);
                    *next
                }
                Terminator::Guard {
                    clause,
                    then_block,
                    else_block,
                } => {
                    let bindings = self.bindings_of(*clause, &temps)?;
                    if guard(*clause, &bindings)? {
                        *then_block
                    } else {
                        *else_block
                    }
                }
                Terminator::Arm(clause) => {
                    return Ok(Outcome::Matched {
                        clause: *clause,
                        bindings: self.bindings_of(*clause, &temps)?,
                    });
                }
                Terminator::NoMatch => return Ok(Outcome::NoMatch),
            };
        }
    }

    fn bindings_of(
        &self,
        clause: ClauseId,
        temps: &[Option<Value>],
    ) -> Result<Vec<(Name, Value)>, EvalError> {
        let bindings = self.bindings.get(clause.index()).map_or(&[][..], Vec::as_slice);
        collect_bindings(bindings, temps)
    }

    fn dispatch_string(
        &self,
        text: &[u16],
        cases: &[(Vec<u16>, BlockId)],
        dispatch: &StringDispatch,
    ) -> Option<BlockId> {
        let verify = |index: &usize| cases.get(*index).filter(|(case, _)| case == text);
        let found = match dispatch {
            StringDispatch::Sequential => cases.iter().find(|(case, _)| case == text),
            StringDispatch::LengthBased(buckets) => {
                let (_, tree) = buckets.iter().find(|(len, _)| *len == text.len())?;
                let mut node = tree;
                loop {
                    match node {
                        CharDispatch::Candidates(candidates) => {
                            break candidates.iter().find_map(verify);
                        }
                        CharDispatch::Switch { position, arms } => {
                            let c = text.get(*position)?;
                            node = &arms.iter().find(|(arm, _)| arm == c)?.1;
                        }
                    }
                }
            }
            StringDispatch::Hashed(buckets) => {
                let hash = (self.hash_fn)(text);
                let slot = buckets.binary_search_by_key(&hash, |(h, _)| *h).ok()?;
                buckets[slot].1.iter().find_map(verify)
            }
        };
        found.map(|(_, block)| *block)
    }
}

#[cfg(test)]
mod tests;
