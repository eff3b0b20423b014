use pretty_assertions::assert_eq;
use sift_ir::{ClauseId, Name, Pattern, TypeId};
use sift_types::TypeTable;

use super::*;
use crate::build::DagBuilder;

fn bound(mut pattern: Pattern) -> Pattern {
    pattern.walk_mut(&mut |p| p.narrowed_type = TypeId::OBJECT);
    pattern
}

fn compile(types: &TypeTable, input: TypeId, patterns: Vec<Pattern>) -> DecisionDag {
    let mut builder = DagBuilder::new(types, input);
    for pattern in patterns {
        builder.add_pattern(&bound(pattern), None);
    }
    builder.build()
}

fn no_guards(_: ClauseId, _: &[(Name, Value)]) -> Result<bool, EvalError> {
    Ok(true)
}

fn string_switch(types: &mut TypeTable, cases: &[&str]) -> (TypeId, DecisionDag) {
    let chars = types.read_only_span(TypeId::CHAR);
    let mut patterns: Vec<Pattern> = cases.iter().map(|text| Pattern::string(text)).collect();
    patterns.push(Pattern::discard());
    let dag = compile(types, chars, patterns);
    (chars, dag)
}

fn switch_of(lowered: &LoweredDag) -> Option<&Terminator> {
    lowered
        .blocks
        .iter()
        .find(|block| matches!(block, Terminator::SwitchString { .. } | Terminator::SwitchInt { .. }))
}

#[test]
fn hash_is_fnv1a_over_utf16_units() {
    let units = |text: &str| -> Vec<u16> { text.encode_utf16().collect() };
    assert_eq!(compute_string_hash(&units("")), 0x811c_9dc5);
    assert_eq!(compute_string_hash(&units("a")), 0xe40c_292c);
    // Non-BMP characters hash as two surrogate units.
    let manual = [0xD83Du16, 0xDE00]
        .iter()
        .fold(2_166_136_261u32, |h, u| (u32::from(*u) ^ h).wrapping_mul(16_777_619));
    assert_eq!(compute_string_hash(&units("\u{1F600}")), manual);
}

#[test]
fn length_buckets_count_code_units() {
    let mut types = TypeTable::new();
    let cases = ["\u{1F600}", "ab", "c"];
    let (chars, dag) = string_switch(&mut types, &cases);
    let policy = StringDispatchPolicy::default().with_hash_threshold(2);
    let lowered = lower_dag(&types, &dag, policy);

    let Some(Terminator::SwitchString {
        dispatch: StringDispatch::LengthBased(buckets),
        ..
    }) = switch_of(&lowered)
    else {
        panic!("expected a length-based string switch");
    };
    let lengths: Vec<usize> = buckets.iter().map(|(len, _)| *len).collect();
    assert_eq!(lengths, vec![1, 2]);

    let evaluator = Evaluator::new(&types);
    for (index, text) in cases.iter().enumerate() {
        let outcome = lowered
            .run(&evaluator, &Value::char_span(chars, text), no_guards)
            .unwrap();
        assert_eq!(outcome.clause(), Some(ClauseId::new(index as u32)));
    }
    let high_only = Value::Seq {
        ty: chars,
        items: vec![Value::Char(0xD83D), Value::Char(0xDE01)],
    };
    let miss = lowered.run(&evaluator, &high_only, no_guards).unwrap();
    assert_eq!(miss.clause(), Some(ClauseId::new(3)));
}

#[test]
fn small_span_switch_is_sequential_and_picks_the_right_arm() {
    let mut types = TypeTable::new();
    let (chars, dag) = string_switch(&mut types, &["", "string 1", "string 2"]);
    let lowered = lower_dag(&types, &dag, StringDispatchPolicy::default());
    assert!(matches!(
        switch_of(&lowered),
        Some(Terminator::SwitchString {
            dispatch: StringDispatch::Sequential,
            ..
        })
    ));
    let evaluator = Evaluator::new(&types);
    let outcome = lowered
        .run(&evaluator, &Value::char_span(chars, "string 2"), no_guards)
        .unwrap();
    assert_eq!(outcome.clause(), Some(ClauseId::new(2)));
    let other = lowered
        .run(&evaluator, &Value::char_span(chars, "string 3"), no_guards)
        .unwrap();
    assert_eq!(other.clause(), Some(ClauseId::new(3)));
}

#[test]
fn length_based_dispatch_splits_on_characters() {
    let mut types = TypeTable::new();
    let cases = ["ab", "ac", "bc", "b", ""];
    let (chars, dag) = string_switch(&mut types, &cases);
    let policy = StringDispatchPolicy::default().with_hash_threshold(2);
    let lowered = lower_dag(&types, &dag, policy);

    let Some(Terminator::SwitchString {
        dispatch: StringDispatch::LengthBased(buckets),
        ..
    }) = switch_of(&lowered)
    else {
        panic!("expected a length-based string switch");
    };
    let lengths: Vec<usize> = buckets.iter().map(|(len, _)| *len).collect();
    assert_eq!(lengths, vec![0, 1, 2]);
    assert!(matches!(buckets[2].1, CharDispatch::Switch { .. }));

    let evaluator = Evaluator::new(&types);
    for (index, text) in cases.iter().enumerate() {
        let outcome = lowered
            .run(&evaluator, &Value::char_span(chars, text), no_guards)
            .unwrap();
        assert_eq!(outcome.clause(), Some(ClauseId::new(index as u32)));
    }
    let miss = lowered
        .run(&evaluator, &Value::char_span(chars, "ad"), no_guards)
        .unwrap();
    assert_eq!(miss.clause(), Some(ClauseId::new(cases.len() as u32)));
}

#[test]
fn colliding_hashes_are_verified() {
    let mut types = TypeTable::new();
    let cases = ["x", "y", "z"];
    let (chars, dag) = string_switch(&mut types, &cases);
    let policy = StringDispatchPolicy::default()
        .with_length_based(false)
        .with_hash_threshold(0)
        .with_hash_fn(|_| 0);
    let lowered = lower_dag(&types, &dag, policy);
    assert!(matches!(
        switch_of(&lowered),
        Some(Terminator::SwitchString {
            dispatch: StringDispatch::Hashed(buckets),
            ..
        }) if buckets.len() == 1
    ));
    let evaluator = Evaluator::new(&types);
    let outcome = lowered
        .run(&evaluator, &Value::char_span(chars, "z"), no_guards)
        .unwrap();
    assert_eq!(outcome.clause(), Some(ClauseId::new(2)));
    let miss = lowered
        .run(&evaluator, &Value::char_span(chars, "w"), no_guards)
        .unwrap();
    assert_eq!(miss.clause(), Some(ClauseId::new(3)));
}

#[test]
fn integer_chains_become_a_sorted_switch() {
    let types = TypeTable::new();
    let dag = compile(
        &types,
        TypeId::INT,
        vec![Pattern::int(3), Pattern::int(1), Pattern::int(2)],
    );
    let lowered = lower_dag(&types, &dag, StringDispatchPolicy::default());
    let Some(Terminator::SwitchInt { cases, .. }) = switch_of(&lowered) else {
        panic!("expected an integer switch");
    };
    let values: Vec<ConstValue> = cases.iter().map(|(value, _)| value.clone()).collect();
    assert_eq!(
        values,
        vec![ConstValue::Int(1), ConstValue::Int(2), ConstValue::Int(3)]
    );

    let evaluator = Evaluator::new(&types);
    for (value, clause) in [(3, Some(0)), (1, Some(1)), (2, Some(2)), (4, None)] {
        let outcome = lowered.run(&evaluator, &Value::int(value), no_guards).unwrap();
        assert_eq!(outcome.clause(), clause.map(ClauseId::new));
    }
}

#[test]
fn single_value_test_stays_a_branch() {
    let types = TypeTable::new();
    let dag = compile(&types, TypeId::INT, vec![Pattern::int(3)]);
    let lowered = lower_dag(&types, &dag, StringDispatchPolicy::default());
    assert!(switch_of(&lowered).is_none());
    assert!(matches!(
        lowered.block(lowered.entry),
        Terminator::Branch { .. }
    ));
}
