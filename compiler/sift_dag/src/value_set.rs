//! Sets of values a temp may still hold on a dag path.
//!
//! Integral types, chars and bools live on the integer line and are tracked
//! as sorted disjoint inclusive ranges. Strings and doubles are tracked as
//! finite or cofinite sets of constants; relational tests on doubles are not
//! representable and leave the set unchanged.

use std::collections::BTreeSet;

use sift_ir::{ConstValue, DagTest, RelationalOp};
use sift_types::ValueFamily;

/// How ordinals map back to constants.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum OrdinalKind {
    Bool,
    Char,
    Int,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DiscreteKind {
    String,
    Double,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum ValueSet {
    Ranges {
        kind: OrdinalKind,
        min: i64,
        max: i64,
        ranges: Vec<(i64, i64)>,
    },
    Discrete {
        kind: DiscreteKind,
        /// When set, the set is everything *except* `values`.
        cofinite: bool,
        values: BTreeSet<ConstValue>,
    },
}

impl ValueSet {
    /// Every value of the family.
    pub fn full(family: ValueFamily, is_char: bool) -> Self {
        match family {
            ValueFamily::Bool => Self::ranges(OrdinalKind::Bool, 0, 1),
            ValueFamily::Integral { min, max } => {
                let kind = if is_char {
                    OrdinalKind::Char
                } else {
                    OrdinalKind::Int
                };
                Self::ranges(kind, min, max)
            }
            ValueFamily::Double => Self::everything(DiscreteKind::Double),
            ValueFamily::String => Self::everything(DiscreteKind::String),
        }
    }

    fn ranges(kind: OrdinalKind, min: i64, max: i64) -> Self {
        ValueSet::Ranges {
            kind,
            min,
            max,
            ranges: vec![(min, max)],
        }
    }

    fn everything(kind: DiscreteKind) -> Self {
        ValueSet::Discrete {
            kind,
            cofinite: true,
            values: BTreeSet::new(),
        }
    }

    /// Values of this set's family that pass `test`.
    ///
    /// `None` when the test is not a value test or the family cannot
    /// represent its outcome.
    pub fn passing(&self, test: &DagTest) -> Option<ValueSet> {
        match (self, test) {
            (ValueSet::Ranges { kind, min, max, .. }, DagTest::Value(value)) => {
                let v = value.as_ordinal()?;
                let ranges = if v < *min || v > *max {
                    Vec::new()
                } else {
                    vec![(v, v)]
                };
                Some(ValueSet::Ranges {
                    kind: *kind,
                    min: *min,
                    max: *max,
                    ranges,
                })
            }
            (ValueSet::Ranges { kind, min, max, .. }, DagTest::Relational(op, value)) => {
                let v = value.as_ordinal()?;
                let (lo, hi) = match op {
                    RelationalOp::Lt => (*min, v.checked_sub(1)?),
                    RelationalOp::Le => (*min, v),
                    RelationalOp::Gt => (v.checked_add(1)?, *max),
                    RelationalOp::Ge => (v, *max),
                };
                let (lo, hi) = (lo.max(*min), hi.min(*max));
                let ranges = if lo <= hi { vec![(lo, hi)] } else { Vec::new() };
                Some(ValueSet::Ranges {
                    kind: *kind,
                    min: *min,
                    max: *max,
                    ranges,
                })
            }
            (ValueSet::Discrete { kind, .. }, DagTest::Value(value)) => Some(ValueSet::Discrete {
                kind: *kind,
                cofinite: false,
                values: BTreeSet::from([value.clone().canonical()]),
            }),
            _ => None,
        }
    }

    #[must_use]
    pub fn complement(&self) -> ValueSet {
        match self {
            ValueSet::Ranges {
                kind,
                min,
                max,
                ranges,
            } => {
                let mut out = Vec::new();
                let mut next = Some(*min);
                for &(lo, hi) in ranges {
                    if let Some(start) = next {
                        if start < lo {
                            out.push((start, lo - 1));
                        }
                    }
                    next = hi.checked_add(1);
                }
                if let Some(start) = next {
                    if start <= *max {
                        out.push((start, *max));
                    }
                }
                ValueSet::Ranges {
                    kind: *kind,
                    min: *min,
                    max: *max,
                    ranges: out,
                }
            }
            ValueSet::Discrete {
                kind,
                cofinite,
                values,
            } => ValueSet::Discrete {
                kind: *kind,
                cofinite: !cofinite,
                values: values.clone(),
            },
        }
    }

    #[must_use]
    pub fn intersect(&self, other: &ValueSet) -> ValueSet {
        match (self, other) {
            (
                ValueSet::Ranges {
                    kind,
                    min,
                    max,
                    ranges: a,
                },
                ValueSet::Ranges { ranges: b, .. },
            ) => {
                let mut out = Vec::new();
                let (mut i, mut j) = (0, 0);
                while i < a.len() && j < b.len() {
                    let lo = a[i].0.max(b[j].0);
                    let hi = a[i].1.min(b[j].1);
                    if lo <= hi {
                        out.push((lo, hi));
                    }
                    if a[i].1 < b[j].1 {
                        i += 1;
                    } else {
                        j += 1;
                    }
                }
                ValueSet::Ranges {
                    kind: *kind,
                    min: *min,
                    max: *max,
                    ranges: out,
                }
            }
            (
                ValueSet::Discrete {
                    kind,
                    cofinite: a_co,
                    values: a,
                },
                ValueSet::Discrete {
                    cofinite: b_co,
                    values: b,
                    ..
                },
            ) => {
                let (cofinite, values) = match (a_co, b_co) {
                    (false, false) => (false, a.intersection(b).cloned().collect()),
                    (false, true) => (false, a.difference(b).cloned().collect()),
                    (true, false) => (false, b.difference(a).cloned().collect()),
                    (true, true) => (true, a.union(b).cloned().collect()),
                };
                ValueSet::Discrete {
                    kind: *kind,
                    cofinite,
                    values,
                }
            }
            // Mismatched families never meet on one temp; keep what we know.
            _ => self.clone(),
        }
    }

    #[must_use]
    pub fn subtract(&self, other: &ValueSet) -> ValueSet {
        self.intersect(&other.complement())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ValueSet::Ranges { ranges, .. } => ranges.is_empty(),
            ValueSet::Discrete {
                cofinite, values, ..
            } => !cofinite && values.is_empty(),
        }
    }

    pub fn is_subset_of(&self, other: &ValueSet) -> bool {
        self.subtract(other).is_empty()
    }

    /// The ordinal of the only remaining value.
    pub fn single_ordinal(&self) -> Option<i64> {
        match self {
            ValueSet::Ranges { ranges, .. } => match ranges.as_slice() {
                [(lo, hi)] if lo == hi => Some(*lo),
                _ => None,
            },
            ValueSet::Discrete { .. } => None,
        }
    }

    /// Whether nothing has been excluded yet.
    pub fn is_full(&self) -> bool {
        match self {
            ValueSet::Ranges {
                min, max, ranges, ..
            } => ranges.as_slice() == [(*min, *max)],
            ValueSet::Discrete {
                cofinite, values, ..
            } => *cofinite && values.is_empty(),
        }
    }

    /// A representative member, for counterexamples.
    ///
    /// Integers prefer the member closest to zero.
    pub fn sample(&self) -> Option<ConstValue> {
        match self {
            ValueSet::Ranges {
                kind: OrdinalKind::Int,
                ranges,
                ..
            } => ranges
                .iter()
                .map(|&(lo, hi)| lo.max(0).min(hi))
                .min_by_key(|v| v.unsigned_abs())
                .map(ConstValue::Int),
            ValueSet::Ranges { kind, ranges, .. } => {
                ranges.iter().find_map(|&(lo, _)| ordinal_to_const(*kind, lo))
            }
            ValueSet::Discrete {
                cofinite: false,
                values,
                ..
            } => values.iter().next().cloned(),
            ValueSet::Discrete {
                kind,
                cofinite: true,
                values,
            } => {
                let mut candidates = (0..=values.len()).map(|i| match kind {
                    DiscreteKind::String => ConstValue::Str(fresh_string(i)),
                    #[expect(
                        clippy::cast_precision_loss,
                        reason = "candidate indices are small"
                    )]
                    DiscreteKind::Double => ConstValue::double(i as f64),
                });
                candidates.find(|c| !values.contains(c))
            }
        }
    }
}

fn ordinal_to_const(kind: OrdinalKind, v: i64) -> Option<ConstValue> {
    match kind {
        OrdinalKind::Bool => Some(ConstValue::Bool(v != 0)),
        OrdinalKind::Char => u16::try_from(v).ok().map(ConstValue::Char),
        OrdinalKind::Int => Some(ConstValue::Int(v)),
    }
}

/// `""`, `"a"`, `"b"`, ... `"z"`, `"aa"`, ...
fn fresh_string(index: usize) -> String {
    if index == 0 {
        return String::new();
    }
    let mut n = index - 1;
    let mut out = Vec::new();
    loop {
        out.push(b'a' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
