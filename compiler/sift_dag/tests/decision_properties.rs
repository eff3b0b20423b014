//! Property-based tests for decision dags.
//!
//! Random clause lists over a small type universe are compiled and run on
//! random inputs. For every input, the dag evaluator, the sequential
//! matcher and the lowered block program must pick the same clause with
//! the same bindings. Switches are generated over ints, objects, doubles
//! (signed zeros and NaN payloads included), int arrays with slices, and
//! strings and char spans holding surrogate pairs.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::cast_possible_truncation,
    clippy::needless_pass_by_value,
    reason = "Proptest strategies pass generated values by value"
)]

use proptest::prelude::*;
use sift_dag::{
    compute_string_hash, first_match, lower_dag, DagBuilder, EvalError, Evaluator, Outcome,
    StringDispatchPolicy, Value,
};
use sift_ir::{
    ClauseId, ConstValue, Guard, GuardId, Name, Pattern, PropertySubpattern, RecursivePattern,
    RelationalOp, TypeId,
};
use sift_types::TypeTable;

// -- Universe --

struct Universe {
    types: TypeTable,
    point: TypeId,
    ints: TypeId,
    chars: TypeId,
    x: Name,
    y: Name,
    names: [Name; 3],
}

const STRINGS: [&str; 3] = ["", "a", "ab"];

fn universe() -> Universe {
    let mut types = TypeTable::new();
    let point = types.class("Point", None);
    let x = types.add_property(point, "X", TypeId::INT);
    let y = types.add_property(point, "Y", TypeId::INT);
    types.set_deconstruct(point, vec![TypeId::INT, TypeId::INT]);
    let ints = types.array(TypeId::INT);
    let chars = types.read_only_span(TypeId::CHAR);
    let names = [types.intern("a"), types.intern("b"), types.intern("c")];
    Universe {
        types,
        point,
        ints,
        chars,
        x,
        y,
        names,
    }
}

/// Mark every node as successfully bound.
fn bound(mut pattern: Pattern) -> Pattern {
    pattern.walk_mut(&mut |p| p.narrowed_type = TypeId::OBJECT);
    pattern
}

// -- Pattern shapes --

#[derive(Clone, Debug)]
enum IntPat {
    Any,
    Bind(u8),
    Eq(i64),
    Rel(u8, i64),
    Not(Box<IntPat>),
    And(Box<IntPat>, Box<IntPat>),
    Or(Box<IntPat>, Box<IntPat>),
}

#[derive(Clone, Debug)]
enum ObjPat {
    Any,
    Bind(u8),
    Null,
    Int(IntPat),
    Str(u8),
    DeclStr(u8),
    Point {
        x: IntPat,
        y: IntPat,
        positional: bool,
    },
    List {
        items: Vec<IntPat>,
        slice: Option<usize>,
    },
    Not(Box<ObjPat>),
    Or(Box<ObjPat>, Box<ObjPat>),
}

fn relational_op(op: u8) -> RelationalOp {
    match op % 4 {
        0 => RelationalOp::Lt,
        1 => RelationalOp::Le,
        2 => RelationalOp::Gt,
        _ => RelationalOp::Ge,
    }
}

impl IntPat {
    fn to_pattern(&self, u: &Universe, allow_bind: bool) -> Pattern {
        match self {
            IntPat::Any => Pattern::discard(),
            IntPat::Bind(n) if allow_bind => Pattern::var(u.names[*n as usize % 3]),
            IntPat::Bind(_) => Pattern::discard(),
            IntPat::Eq(v) => Pattern::int(*v),
            IntPat::Rel(op, v) => {
                Pattern::relational(relational_op(*op), ConstValue::Int(*v), TypeId::INT)
            }
            IntPat::Not(p) => Pattern::not(p.to_pattern(u, false)),
            IntPat::And(p, q) => Pattern::and(p.to_pattern(u, allow_bind), q.to_pattern(u, allow_bind)),
            IntPat::Or(p, q) => Pattern::or(p.to_pattern(u, false), q.to_pattern(u, false)),
        }
    }
}

impl ObjPat {
    fn to_pattern(&self, u: &Universe, allow_bind: bool) -> Pattern {
        match self {
            ObjPat::Any => Pattern::discard(),
            ObjPat::Bind(n) if allow_bind => Pattern::var(u.names[*n as usize % 3]),
            ObjPat::Bind(_) => Pattern::discard(),
            ObjPat::Null => Pattern::null(),
            ObjPat::Int(p) => Pattern::and(
                Pattern::type_pattern(TypeId::INT),
                p.to_pattern(u, allow_bind),
            ),
            ObjPat::Str(i) => Pattern::string(STRINGS[*i as usize % 3]),
            ObjPat::DeclStr(n) if allow_bind => {
                Pattern::declaration(TypeId::STRING, u.names[*n as usize % 3])
            }
            ObjPat::DeclStr(_) => Pattern::declaration_discard(TypeId::STRING),
            ObjPat::Point { x, y, positional } => {
                let (px, py) = (x.to_pattern(u, allow_bind), y.to_pattern(u, allow_bind));
                let (positional, properties) = if *positional {
                    (Some(vec![px, py]), None)
                } else {
                    (
                        None,
                        Some(vec![
                            PropertySubpattern::new(u.x, px),
                            PropertySubpattern::new(u.y, py),
                        ]),
                    )
                };
                Pattern::recursive(RecursivePattern {
                    ty: Some(u.point),
                    positional,
                    properties,
                    designation: None,
                })
            }
            ObjPat::List { items, slice } => {
                let mut elements: Vec<Pattern> =
                    items.iter().map(|p| p.to_pattern(u, allow_bind)).collect();
                if let Some(at) = slice {
                    elements.insert(at % (elements.len() + 1), Pattern::slice(None));
                }
                Pattern::and(Pattern::type_pattern(u.ints), Pattern::list(elements, None))
            }
            ObjPat::Not(p) => Pattern::not(p.to_pattern(u, false)),
            ObjPat::Or(p, q) => Pattern::or(p.to_pattern(u, false), q.to_pattern(u, false)),
        }
    }
}

fn int_pat() -> impl Strategy<Value = IntPat> {
    let leaf = prop_oneof![
        Just(IntPat::Any),
        (0u8..3).prop_map(IntPat::Bind),
        (-1i64..4).prop_map(IntPat::Eq),
        (0u8..4, -1i64..4).prop_map(|(op, v)| IntPat::Rel(op, v)),
    ];
    leaf.prop_recursive(3, 12, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|p| IntPat::Not(Box::new(p))),
            (inner.clone(), inner.clone()).prop_map(|(p, q)| IntPat::And(Box::new(p), Box::new(q))),
            (inner.clone(), inner).prop_map(|(p, q)| IntPat::Or(Box::new(p), Box::new(q))),
        ]
    })
}

fn obj_pat() -> impl Strategy<Value = ObjPat> {
    let leaf = prop_oneof![
        Just(ObjPat::Any),
        (0u8..3).prop_map(ObjPat::Bind),
        Just(ObjPat::Null),
        int_pat().prop_map(ObjPat::Int),
        (0u8..3).prop_map(ObjPat::Str),
        (0u8..3).prop_map(ObjPat::DeclStr),
        (int_pat(), int_pat(), any::<bool>())
            .prop_map(|(x, y, positional)| ObjPat::Point { x, y, positional }),
        (
            prop::collection::vec(int_pat(), 0..3),
            prop::option::of(0usize..4)
        )
            .prop_map(|(items, slice)| ObjPat::List { items, slice }),
    ];
    leaf.prop_recursive(2, 8, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|p| ObjPat::Not(Box::new(p))),
            (inner.clone(), inner).prop_map(|(p, q)| ObjPat::Or(Box::new(p), Box::new(q))),
        ]
    })
}

#[derive(Clone, Debug)]
enum DblPat {
    Any,
    Eq(u8),
    Rel(u8, u8),
    Not(Box<DblPat>),
    And(Box<DblPat>, Box<DblPat>),
    Or(Box<DblPat>, Box<DblPat>),
}

/// Constants are kept as raw bits, so `-0.0` and the second NaN payload
/// reach the dag uncanonicalized.
fn doubles() -> [f64; 7] {
    let other_nan = f64::from_bits(0x7ff8_0000_0000_0001);
    [-1.0, -0.0, 0.0, 0.5, f64::NAN, f64::INFINITY, other_nan]
}

impl DblPat {
    fn to_pattern(&self) -> Pattern {
        let constant = |i: u8| ConstValue::Double(doubles()[i as usize % 7].to_bits());
        match self {
            DblPat::Any => Pattern::discard(),
            DblPat::Eq(i) => Pattern::constant(constant(*i), TypeId::DOUBLE),
            DblPat::Rel(op, i) => Pattern::relational(relational_op(*op), constant(*i), TypeId::DOUBLE),
            DblPat::Not(p) => Pattern::not(p.to_pattern()),
            DblPat::And(p, q) => Pattern::and(p.to_pattern(), q.to_pattern()),
            DblPat::Or(p, q) => Pattern::or(p.to_pattern(), q.to_pattern()),
        }
    }
}

fn dbl_pat() -> impl Strategy<Value = DblPat> {
    let leaf = prop_oneof![
        Just(DblPat::Any),
        (0u8..7).prop_map(DblPat::Eq),
        (0u8..4, 0u8..7).prop_map(|(op, i)| DblPat::Rel(op, i)),
    ];
    leaf.prop_recursive(3, 10, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|p| DblPat::Not(Box::new(p))),
            (inner.clone(), inner.clone()).prop_map(|(p, q)| DblPat::And(Box::new(p), Box::new(q))),
            (inner.clone(), inner).prop_map(|(p, q)| DblPat::Or(Box::new(p), Box::new(q))),
        ]
    })
}

/// What a slice subpattern (`..p`) matches.
#[derive(Clone, Debug)]
enum SliceInner {
    Discard,
    Bind(u8),
    Empty,
    Head(IntPat),
}

#[derive(Clone, Debug)]
struct ListPat {
    items: Vec<IntPat>,
    slice: Option<(usize, SliceInner)>,
    designated: bool,
}

impl ListPat {
    fn to_pattern(&self, u: &Universe) -> Pattern {
        let mut elements: Vec<Pattern> = self.items.iter().map(|p| p.to_pattern(u, true)).collect();
        if let Some((at, inner)) = &self.slice {
            let inner = match inner {
                SliceInner::Discard => None,
                SliceInner::Bind(n) => Some(Pattern::var(u.names[*n as usize % 3])),
                SliceInner::Empty => Some(Pattern::list(Vec::new(), None)),
                SliceInner::Head(p) => Some(Pattern::list(
                    vec![p.to_pattern(u, true), Pattern::slice(None)],
                    None,
                )),
            };
            elements.insert(at % (elements.len() + 1), Pattern::slice(inner));
        }
        Pattern::list(elements, self.designated.then_some(u.names[2]))
    }
}

fn list_pat() -> impl Strategy<Value = ListPat> {
    let inner = prop_oneof![
        Just(SliceInner::Discard),
        (0u8..3).prop_map(SliceInner::Bind),
        Just(SliceInner::Empty),
        int_pat().prop_map(SliceInner::Head),
    ];
    (
        prop::collection::vec(int_pat(), 0..4),
        prop::option::of((0usize..5, inner)),
        any::<bool>(),
    )
        .prop_map(|(items, slice, designated)| ListPat {
            items,
            slice,
            designated,
        })
}

#[derive(Clone, Debug)]
enum UnitPat {
    Any,
    Bind(u8),
    Eq(u8),
    Rel(u8, u8),
}

/// Two BMP letters, both halves of U+1F600, and the last code unit.
const UNITS: [u16; 5] = [0x61, 0x62, 0xD83D, 0xDE00, 0xFFFF];
const TEXTS: [&str; 6] = ["", "a", "ab", "\u{1F600}", "a\u{1F600}", "\u{FFFF}"];

impl UnitPat {
    fn to_pattern(&self, u: &Universe) -> Pattern {
        let unit = |i: u8| UNITS[i as usize % UNITS.len()];
        match self {
            UnitPat::Any => Pattern::discard(),
            UnitPat::Bind(n) => Pattern::var(u.names[*n as usize % 3]),
            UnitPat::Eq(i) => Pattern::char(unit(*i)),
            UnitPat::Rel(op, i) => {
                Pattern::relational(relational_op(*op), ConstValue::Char(unit(*i)), TypeId::CHAR)
            }
        }
    }
}

#[derive(Clone, Debug)]
enum TextPat {
    Any,
    Str(u8),
    List {
        items: Vec<UnitPat>,
        slice: Option<usize>,
    },
    Not(Box<TextPat>),
    Or(Box<TextPat>, Box<TextPat>),
}

impl TextPat {
    fn to_pattern(&self, u: &Universe, allow_bind: bool) -> Pattern {
        match self {
            TextPat::Any => Pattern::discard(),
            TextPat::Str(i) => Pattern::string(TEXTS[*i as usize % TEXTS.len()]),
            TextPat::List { items, slice } => {
                let mut elements: Vec<Pattern> = items
                    .iter()
                    .map(|p| match p {
                        UnitPat::Bind(_) if !allow_bind => Pattern::discard(),
                        _ => p.to_pattern(u),
                    })
                    .collect();
                if let Some(at) = slice {
                    elements.insert(at % (elements.len() + 1), Pattern::slice(None));
                }
                Pattern::list(elements, None)
            }
            TextPat::Not(p) => Pattern::not(p.to_pattern(u, false)),
            TextPat::Or(p, q) => Pattern::or(p.to_pattern(u, false), q.to_pattern(u, false)),
        }
    }
}

fn text_pat() -> impl Strategy<Value = TextPat> {
    let unit = prop_oneof![
        Just(UnitPat::Any),
        (0u8..3).prop_map(UnitPat::Bind),
        (0u8..5).prop_map(UnitPat::Eq),
        (0u8..4, 0u8..5).prop_map(|(op, i)| UnitPat::Rel(op, i)),
    ];
    let leaf = prop_oneof![
        Just(TextPat::Any),
        (0u8..6).prop_map(TextPat::Str),
        (prop::collection::vec(unit, 0..3), prop::option::of(0usize..4))
            .prop_map(|(items, slice)| TextPat::List { items, slice }),
    ];
    leaf.prop_recursive(2, 8, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|p| TextPat::Not(Box::new(p))),
            (inner.clone(), inner).prop_map(|(p, q)| TextPat::Or(Box::new(p), Box::new(q))),
        ]
    })
}

/// Inputs for text switches: the constant texts, plus raw unit sequences
/// that may hold lone surrogates.
fn text_units() -> impl Strategy<Value = Vec<u16>> {
    prop_oneof![
        (0usize..TEXTS.len()).prop_map(|i| TEXTS[i].encode_utf16().collect()),
        prop::collection::vec(prop::sample::select(UNITS.to_vec()), 0..4),
    ]
}

// -- Values --

#[derive(Clone, Debug)]
enum ObjVal {
    Null,
    Int(i64),
    Bool(bool),
    Str(u8),
    Point(i64, i64),
    Ints(Vec<i64>),
}

impl ObjVal {
    fn to_value(&self, u: &Universe) -> Value {
        match self {
            ObjVal::Null => Value::Null,
            ObjVal::Int(v) => Value::int(*v),
            ObjVal::Bool(b) => Value::Bool(*b),
            ObjVal::Str(i) => Value::string(STRINGS[*i as usize % 3]),
            ObjVal::Point(x, y) => Value::Object {
                ty: u.point,
                fields: vec![(u.x, Value::int(*x)), (u.y, Value::int(*y))],
                outputs: vec![Value::int(*x), Value::int(*y)],
            },
            ObjVal::Ints(items) => Value::Seq {
                ty: u.ints,
                items: items.iter().map(|v| Value::int(*v)).collect(),
            },
        }
    }
}

fn obj_val() -> impl Strategy<Value = ObjVal> {
    prop_oneof![
        Just(ObjVal::Null),
        (-1i64..5).prop_map(ObjVal::Int),
        any::<bool>().prop_map(ObjVal::Bool),
        (0u8..3).prop_map(ObjVal::Str),
        (-1i64..4, -1i64..4).prop_map(|(x, y)| ObjVal::Point(x, y)),
        prop::collection::vec(-1i64..4, 0..4).prop_map(ObjVal::Ints),
    ]
}

fn guard_of(code: u8, index: usize) -> Option<Guard> {
    match code % 4 {
        0 => None,
        1 => Some(Guard::Constant(true)),
        2 => Some(Guard::Constant(false)),
        _ => Some(Guard::Opaque(GuardId(index as u32))),
    }
}

/// Deterministic stand-in for user guard code.
fn guard_oracle(clause: ClauseId, bindings: &[(Name, Value)]) -> Result<bool, EvalError> {
    Ok((clause.raw() as usize + bindings.len()) % 2 == 0)
}

fn check_agreement(
    u: &Universe,
    input: TypeId,
    patterns: &[Pattern],
    guards: &[Option<Guard>],
    values: &[Value],
) -> Result<(), TestCaseError> {
    let mut builder = DagBuilder::new(&u.types, input);
    for (pattern, guard) in patterns.iter().zip(guards) {
        builder.add_pattern(pattern, *guard);
    }
    let dag = builder.build();
    let by_length = lower_dag(&u.types, &dag, StringDispatchPolicy::default().with_hash_threshold(0));
    let by_hash = lower_dag(
        &u.types,
        &dag,
        StringDispatchPolicy::default()
            .with_length_based(false)
            .with_hash_threshold(0),
    );
    let evaluator = Evaluator::new(&u.types);
    let clauses: Vec<(&Pattern, Option<Guard>)> =
        patterns.iter().zip(guards.iter().copied()).collect();

    for value in values {
        let expected = first_match(&evaluator, &clauses, value, guard_oracle).unwrap();
        let from_dag = evaluator.run(&dag, value, guard_oracle).unwrap();
        prop_assert_eq!(&from_dag, &expected, "dag vs naive on {:?}", value);
        let lowered = by_length.run(&evaluator, value, guard_oracle).unwrap();
        prop_assert_eq!(&lowered, &expected, "length-based lowering on {:?}", value);
        let hashed = by_hash.run(&evaluator, value, guard_oracle).unwrap();
        prop_assert_eq!(&hashed, &expected, "hashed lowering on {:?}", value);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn int_switches_agree_with_sequential_matching(
        clauses in prop::collection::vec((int_pat(), 0u8..4), 1..6),
    ) {
        let u = universe();
        let patterns: Vec<Pattern> =
            clauses.iter().map(|(p, _)| bound(p.to_pattern(&u, true))).collect();
        let guards: Vec<Option<Guard>> =
            clauses.iter().enumerate().map(|(i, (_, g))| guard_of(*g, i)).collect();
        let values: Vec<Value> = (-2..6).map(Value::int).collect();
        check_agreement(&u, TypeId::INT, &patterns, &guards, &values)?;
    }

    #[test]
    fn object_switches_agree_with_sequential_matching(
        clauses in prop::collection::vec((obj_pat(), 0u8..4), 1..6),
        inputs in prop::collection::vec(obj_val(), 1..12),
    ) {
        let u = universe();
        let patterns: Vec<Pattern> =
            clauses.iter().map(|(p, _)| bound(p.to_pattern(&u, true))).collect();
        let guards: Vec<Option<Guard>> =
            clauses.iter().enumerate().map(|(i, (_, g))| guard_of(*g, i)).collect();
        let values: Vec<Value> = inputs.iter().map(|v| v.to_value(&u)).collect();
        check_agreement(&u, TypeId::OBJECT, &patterns, &guards, &values)?;
    }

    #[test]
    fn double_switches_agree_with_sequential_matching(
        clauses in prop::collection::vec((dbl_pat(), 0u8..4), 1..6),
    ) {
        let u = universe();
        let patterns: Vec<Pattern> = clauses.iter().map(|(p, _)| bound(p.to_pattern())).collect();
        let guards: Vec<Option<Guard>> =
            clauses.iter().enumerate().map(|(i, (_, g))| guard_of(*g, i)).collect();
        let mut values: Vec<Value> = doubles().map(Value::Double).to_vec();
        values.extend([2.0, f64::NEG_INFINITY, -f64::NAN].map(Value::Double));
        check_agreement(&u, TypeId::DOUBLE, &patterns, &guards, &values)?;
    }

    #[test]
    fn list_switches_agree_with_sequential_matching(
        clauses in prop::collection::vec((list_pat(), 0u8..4), 1..6),
        inputs in prop::collection::vec(prop::collection::vec(-1i64..4, 0..6), 1..12),
    ) {
        let u = universe();
        let patterns: Vec<Pattern> = clauses.iter().map(|(p, _)| bound(p.to_pattern(&u))).collect();
        let guards: Vec<Option<Guard>> =
            clauses.iter().enumerate().map(|(i, (_, g))| guard_of(*g, i)).collect();
        let mut values: Vec<Value> = inputs
            .iter()
            .map(|items| Value::Seq {
                ty: u.ints,
                items: items.iter().map(|v| Value::int(*v)).collect(),
            })
            .collect();
        values.push(Value::Null);
        check_agreement(&u, u.ints, &patterns, &guards, &values)?;
    }

    #[test]
    fn text_switches_agree_with_sequential_matching(
        clauses in prop::collection::vec((text_pat(), 0u8..4), 1..6),
        inputs in prop::collection::vec(text_units(), 1..10),
    ) {
        let u = universe();
        let patterns: Vec<Pattern> =
            clauses.iter().map(|(p, _)| bound(p.to_pattern(&u, true))).collect();
        let guards: Vec<Option<Guard>> =
            clauses.iter().enumerate().map(|(i, (_, g))| guard_of(*g, i)).collect();

        let spans: Vec<Value> = inputs
            .iter()
            .map(|units| Value::Seq {
                ty: u.chars,
                items: units.iter().map(|unit| Value::Char(*unit)).collect(),
            })
            .collect();
        check_agreement(&u, u.chars, &patterns, &guards, &spans)?;

        let mut strings: Vec<Value> = inputs.iter().map(|units| Value::Str(units.clone())).collect();
        strings.push(Value::Null);
        check_agreement(&u, TypeId::STRING, &patterns, &guards, &strings)?;
    }

    #[test]
    fn string_switches_survive_hash_collisions(
        cases in prop::collection::btree_set("[a-c]{0,3}", 1..10),
        probe in "[a-c]{0,3}",
    ) {
        let mut types = TypeTable::new();
        let chars = types.read_only_span(TypeId::CHAR);
        let cases: Vec<String> = cases.into_iter().collect();
        let mut builder = DagBuilder::new(&types, chars);
        for case in &cases {
            builder.add_pattern(&bound(Pattern::string(case)), None);
        }
        let dag = builder.build();
        let colliding = StringDispatchPolicy::default()
            .with_length_based(false)
            .with_hash_threshold(0)
            .with_hash_fn(|text| (text.len() % 2) as u32);
        let lowered = lower_dag(&types, &dag, colliding);
        let evaluator = Evaluator::new(&types);
        let expected = cases
            .iter()
            .position(|case| *case == probe)
            .map(|i| ClauseId::new(i as u32));
        let outcome = lowered
            .run(&evaluator, &Value::char_span(chars, &probe), guard_oracle)
            .unwrap();
        prop_assert_eq!(outcome.clause(), expected);
    }

    #[test]
    fn string_hash_is_fnv1a_over_utf16(text in "\\PC{0,12}") {
        let expected = text
            .encode_utf16()
            .fold(0x811c_9dc5u32, |hash, unit| (hash ^ u32::from(unit)).wrapping_mul(0x0100_0193));
        let units: Vec<u16> = text.encode_utf16().collect();
        prop_assert_eq!(compute_string_hash(&units), expected);
    }

    #[test]
    fn unreachable_clauses_are_covered_by_earlier_ones(p in int_pat(), q in int_pat()) {
        let u = universe();
        let (p, q) = (bound(p.to_pattern(&u, false)), bound(q.to_pattern(&u, false)));
        let mut builder = DagBuilder::new(&u.types, TypeId::INT);
        builder.add_pattern(&p, None);
        let second = builder.add_pattern(&q, None);
        let dag = builder.build();
        if !dag.is_reachable(second) {
            let evaluator = Evaluator::new(&u.types);
            for v in -3..7 {
                let value = Value::int(v);
                let clauses = [(&p, None), (&q, None)];
                let outcome = first_match(&evaluator, &clauses, &value, guard_oracle).unwrap();
                prop_assert_ne!(outcome.clause(), Some(second), "value {} reaches {:?}", v, second);
            }
        }
    }
}

#[test]
fn no_match_is_reported_for_uncovered_inputs() {
    let u = universe();
    let patterns = vec![bound(Pattern::int(1))];
    let mut builder = DagBuilder::new(&u.types, TypeId::INT);
    builder.add_pattern(&patterns[0], None);
    let dag = builder.build();
    let evaluator = Evaluator::new(&u.types);
    assert_eq!(
        evaluator.run(&dag, &Value::int(2), guard_oracle).unwrap(),
        Outcome::NoMatch
    );
}
