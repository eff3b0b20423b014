//! Running a decision dag against runtime values.
//!
//! Runtime values carry their exact runtime type, so type tests against
//! type parameters are answered through the instantiation supplied in
//! [`Evaluator::with_type_arg`].

use rustc_hash::FxHashMap;
use sift_ir::{
    Accessor, ClauseId, ConstValue, DagBinding, DagNode, DagTest, DecisionDag, Leaf, Name,
    TempId, TypeId,
};
use sift_types::TypeTable;

/// A runtime value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// A UTF-16 code unit.
    Char(u16),
    /// Any integral or enum value; `ty` is its exact runtime type.
    Int { ty: TypeId, value: i64 },
    Double(f64),
    /// A string as UTF-16 code units, so lengths and indices count units.
    Str(Vec<u16>),
    /// A class or struct instance.
    Object {
        ty: TypeId,
        fields: Vec<(Name, Value)>,
        /// Results of `Deconstruct`, in order.
        outputs: Vec<Value>,
    },
    Tuple { ty: TypeId, items: Vec<Value> },
    /// An array or span.
    Seq { ty: TypeId, items: Vec<Value> },
}

impl Value {
    pub fn int(value: i64) -> Self {
        Value::Int {
            ty: TypeId::INT,
            value,
        }
    }

    pub fn string(value: &str) -> Self {
        Value::Str(value.encode_utf16().collect())
    }

    /// A span of chars holding the UTF-16 units of `text`.
    pub fn char_span(ty: TypeId, text: &str) -> Self {
        Value::Seq {
            ty,
            items: text.encode_utf16().map(Value::Char).collect(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Exact runtime type; `None` for null.
    pub fn runtime_type(&self) -> Option<TypeId> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(TypeId::BOOL),
            Value::Char(_) => Some(TypeId::CHAR),
            Value::Double(_) => Some(TypeId::DOUBLE),
            Value::Str(_) => Some(TypeId::STRING),
            Value::Int { ty, .. }
            | Value::Object { ty, .. }
            | Value::Tuple { ty, .. }
            | Value::Seq { ty, .. } => Some(*ty),
        }
    }

    /// Position on the integer line, for integral, char and bool values.
    pub fn as_ordinal(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Char(c) => Some(i64::from(*c)),
            Value::Int { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// The code units of a string or char span.
    pub fn as_units(&self) -> Option<Vec<u16>> {
        match self {
            Value::Str(units) => Some(units.clone()),
            Value::Seq { items, .. } => items
                .iter()
                .map(|item| match item {
                    Value::Char(c) => Some(*c),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("value of type {ty:?} has no member {member:?}")]
    MissingMember { ty: Option<TypeId>, member: Name },
    #[error("{accessor:?} cannot be applied to {value}")]
    WrongShape { accessor: Accessor, value: String },
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("temp {0:?} read before it was evaluated")]
    TempNotEvaluated(TempId),
    #[error("dag has no node {0}")]
    MalformedDag(usize),
}

/// The result of matching one input.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Matched {
        clause: ClauseId,
        bindings: Vec<(Name, Value)>,
    },
    NoMatch,
}

impl Outcome {
    pub fn clause(&self) -> Option<ClauseId> {
        match self {
            Outcome::Matched { clause, .. } => Some(*clause),
            Outcome::NoMatch => None,
        }
    }
}

/// Evaluates tests and accessors over runtime values.
pub struct Evaluator<'a> {
    types: &'a TypeTable,
    type_args: FxHashMap<TypeId, TypeId>,
}

impl<'a> Evaluator<'a> {
    pub fn new(types: &'a TypeTable) -> Self {
        Evaluator {
            types,
            type_args: FxHashMap::default(),
        }
    }

    /// Instantiate type parameter `param` with `arg` for this run.
    #[must_use]
    pub fn with_type_arg(mut self, param: TypeId, arg: TypeId) -> Self {
        self.type_args.insert(param, arg);
        self
    }

    pub fn types(&self) -> &'a TypeTable {
        self.types
    }

    pub fn resolve(&self, ty: TypeId) -> TypeId {
        self.type_args.get(&ty).copied().unwrap_or(ty)
    }

    /// Whether a non-null `value` is an instance of `ty`.
    pub fn is_instance(&self, value: &Value, ty: TypeId) -> bool {
        let target = self.resolve(ty);
        match value.runtime_type() {
            Some(runtime) => self.types.is_instance(runtime, target),
            None => false,
        }
    }

    pub fn test(&self, value: &Value, test: &DagTest) -> bool {
        match test {
            DagTest::NonNull => !value.is_null(),
            DagTest::ExplicitNull => value.is_null(),
            DagTest::Type(ty) => self.is_instance(value, *ty),
            DagTest::Value(constant) => value_equals(value, constant),
            DagTest::Relational(op, constant) => {
                compare(value, constant).is_some_and(|ordering| op.holds(ordering))
            }
        }
    }

    pub fn access(&self, value: &Value, accessor: Accessor) -> Result<Value, EvalError> {
        let wrong_shape = || EvalError::WrongShape {
            accessor,
            value: format!("{value:?}"),
        };
        match accessor {
            Accessor::Convert(_) => Ok(value.clone()),
            Accessor::Property(member) => match value {
                Value::Object { fields, .. } => fields
                    .iter()
                    .find(|(name, _)| *name == member)
                    .map(|(_, field)| field.clone())
                    .ok_or(EvalError::MissingMember {
                        ty: value.runtime_type(),
                        member,
                    }),
                _ => Err(EvalError::MissingMember {
                    ty: value.runtime_type(),
                    member,
                }),
            },
            Accessor::TupleElement(index) => match value {
                Value::Tuple { items, .. } => item(items, i64::from(index)),
                _ => Err(wrong_shape()),
            },
            Accessor::DeconstructOutput { index, .. } => match value {
                Value::Object { outputs, .. } => item(outputs, i64::from(index)),
                _ => Err(wrong_shape()),
            },
            Accessor::Length => {
                let len = sequence_len(value).ok_or_else(wrong_shape)?;
                Ok(Value::int(i64::try_from(len).unwrap_or(i64::MAX)))
            }
            Accessor::Index(index) => element(value, i64::from(index)).ok_or_else(wrong_shape)?,
            Accessor::IndexFromEnd(from_end) => {
                let len = sequence_len(value).ok_or_else(wrong_shape)?;
                let index = i64::try_from(len).unwrap_or(i64::MAX) - i64::from(from_end);
                element(value, index).ok_or_else(wrong_shape)?
            }
            Accessor::Slice {
                start,
                end_from_end,
            } => {
                let len = sequence_len(value).ok_or_else(wrong_shape)?;
                let (start, end_from_end) = (start as usize, end_from_end as usize);
                if start + end_from_end > len {
                    return Err(EvalError::IndexOutOfRange {
                        index: i64::try_from(start).unwrap_or(i64::MAX),
                        len,
                    });
                }
                let end = len - end_from_end;
                match value {
                    Value::Str(units) => Ok(Value::Str(units[start..end].to_vec())),
                    Value::Seq { ty, items } => Ok(Value::Seq {
                        ty: *ty,
                        items: items[start..end].to_vec(),
                    }),
                    _ => Err(wrong_shape()),
                }
            }
        }
    }

    /// Run `dag` on `input`.
    ///
    /// `guard` is called with the clause and its bindings whenever a guard
    /// node is reached.
    pub fn run<G>(&self, dag: &DecisionDag, input: &Value, mut guard: G) -> Result<Outcome, EvalError>
    where
        G: FnMut(ClauseId, &[(Name, Value)]) -> Result<bool, EvalError>,
    {
        let mut temps: Vec<Option<Value>> = vec![None; dag.temps.len()];
        temps[TempId::INPUT.index()] = Some(input.clone());
        let read = |temps: &[Option<Value>], temp: TempId| -> Result<Value, EvalError> {
            temps
                .get(temp.index())
                .and_then(Clone::clone)
                .ok_or(EvalError::TempNotEvaluated(temp))
        };

        let mut current = dag.root;
        loop {
            let node = dag
                .nodes
                .get(current.index())
                .ok_or(EvalError::MalformedDag(current.index()))?;
            match node {
                DagNode::Test {
                    test,
                    when_true,
                    when_false,
                } => {
                    let value = read(&temps, test.temp)?;
                    current = if self.test(&value, &test.test) {
                        *when_true
                    } else {
                        *when_false
                    };
                }
                DagNode::Evaluation { eval, next } => {
                    let value = read(&temps, eval.input)?;
                    temps[eval.output.index()] = Some(self.access(&value, eval.accessor)?);
                    current = *next;
                }
                DagNode::Guard {
                    clause,
                    when_true,
                    when_false,
                } => {
                    let bindings = collect_bindings(dag.bindings_of(*clause), &temps)?;
                    current = if guard(*clause, &bindings)? {
                        *when_true
                    } else {
                        *when_false
                    };
                }
                DagNode::Leaf(Leaf::Clause(clause)) => {
                    return Ok(Outcome::Matched {
                        clause: *clause,
                        bindings: collect_bindings(dag.bindings_of(*clause), &temps)?,
                    });
                }
                DagNode::Leaf(Leaf::NoMatch) => return Ok(Outcome::NoMatch),
            }
        }
    }
}

pub(crate) fn collect_bindings(
    bindings: &[DagBinding],
    temps: &[Option<Value>],
) -> Result<Vec<(Name, Value)>, EvalError> {
    bindings
        .iter()
        .map(|binding| {
            temps
                .get(binding.temp.index())
                .and_then(Clone::clone)
                .map(|value| (binding.name, value))
                .ok_or(EvalError::TempNotEvaluated(binding.temp))
        })
        .collect()
}

fn item(items: &[Value], index: i64) -> Result<Value, EvalError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or(EvalError::IndexOutOfRange {
            index,
            len: items.len(),
        })
}

fn sequence_len(value: &Value) -> Option<usize> {
    match value {
        Value::Str(units) => Some(units.len()),
        Value::Seq { items, .. } => Some(items.len()),
        _ => None,
    }
}

fn element(value: &Value, index: i64) -> Option<Result<Value, EvalError>> {
    match value {
        Value::Str(units) => Some(
            usize::try_from(index)
                .ok()
                .and_then(|i| units.get(i))
                .map(|unit| Value::Char(*unit))
                .ok_or(EvalError::IndexOutOfRange {
                    index,
                    len: units.len(),
                }),
        ),
        Value::Seq { items, .. } => Some(item(items, index)),
        _ => None,
    }
}

/// Constant equality; doubles compare NaN equal to NaN.
pub fn value_equals(value: &Value, constant: &ConstValue) -> bool {
    match (value, constant) {
        (Value::Null, ConstValue::Null) => true,
        (Value::Double(d), ConstValue::Double(_)) => constant
            .as_f64()
            .is_some_and(|c| (d.is_nan() && c.is_nan()) || *d == c),
        (Value::Str(_) | Value::Seq { .. }, ConstValue::Str(s)) => {
            value.as_units().is_some_and(|units| units.iter().copied().eq(s.encode_utf16()))
        }
        (Value::Bool(_) | Value::Char(_) | Value::Int { .. }, _) => {
            match (value.as_ordinal(), constant.as_ordinal()) {
                (Some(v), Some(c)) => v == c,
                _ => false,
            }
        }
        _ => false,
    }
}

fn compare(value: &Value, constant: &ConstValue) -> Option<std::cmp::Ordering> {
    match value {
        Value::Double(d) => d.partial_cmp(&constant.as_f64()?),
        _ => Some(value.as_ordinal()?.cmp(&constant.as_ordinal()?)),
    }
}
