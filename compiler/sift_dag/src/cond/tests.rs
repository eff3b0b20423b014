use pretty_assertions::assert_eq;
use sift_ir::{Accessor, ConstValue, DagEval, DagTest, TempId, TempTest};

use super::*;

fn non_null() -> Cond {
    Cond::test(TempTest::new(TempId::INPUT, DagTest::NonNull))
}

fn value(v: i64) -> Cond {
    Cond::test(TempTest::new(TempId::INPUT, DagTest::Value(ConstValue::Int(v))))
}

#[test]
fn and_flattens_and_short_circuits() {
    assert_eq!(Cond::and(vec![]), Cond::True);
    assert_eq!(Cond::and(vec![Cond::True, value(1)]), value(1));
    assert_eq!(Cond::and(vec![value(1), Cond::False]), Cond::False);
    assert_eq!(
        Cond::and(vec![Cond::and(vec![non_null(), value(1)]), value(2)]),
        Cond::And(vec![non_null(), value(1), value(2)])
    );
}

#[test]
fn or_flattens_and_short_circuits() {
    assert_eq!(Cond::or(vec![]), Cond::False);
    assert_eq!(Cond::or(vec![Cond::False, value(1)]), value(1));
    assert_eq!(Cond::or(vec![value(1), Cond::True]), Cond::True);
    assert_eq!(
        Cond::or(vec![value(1), Cond::or(vec![value(2), value(3)])]),
        Cond::Or(vec![value(1), value(2), value(3)])
    );
}

#[test]
fn not_cancels() {
    assert_eq!(Cond::not(Cond::True), Cond::False);
    assert_eq!(Cond::not(Cond::not(value(1))), value(1));
}

#[test]
fn first_step_is_leftmost() {
    let cond = Cond::not(Cond::or(vec![
        Cond::and(vec![non_null(), value(1)]),
        value(2),
    ]));
    assert_eq!(
        cond.first_step(),
        Some(&Step::Test(TempTest::new(TempId::INPUT, DagTest::NonNull)))
    );
    assert_eq!(Cond::True.first_step(), None);
}

#[test]
fn rewrite_resolves_known_steps() {
    let cond = Cond::or(vec![
        Cond::and(vec![non_null(), value(1)]),
        Cond::and(vec![non_null(), value(2)]),
    ]);
    let mut known = |step: &Step| match step {
        Step::Test(TempTest {
            test: DagTest::NonNull,
            ..
        }) => Some(true),
        Step::Test(TempTest {
            test: DagTest::Value(ConstValue::Int(1)),
            ..
        }) => Some(false),
        _ => None,
    };
    assert_eq!(cond.rewrite(&mut known), value(2));
}

#[test]
fn tested_temps_skip_evaluations() {
    let eval = DagEval {
        input: TempId::INPUT,
        accessor: Accessor::Length,
        output: TempId::INPUT,
    };
    let cond = Cond::and(vec![non_null(), Cond::eval(eval), value(1)]);
    let mut temps = Vec::new();
    cond.tested_temps(&mut temps);
    assert_eq!(temps, vec![TempId::INPUT, TempId::INPUT]);
}
