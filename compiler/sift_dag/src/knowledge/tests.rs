use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use sift_ir::{Accessor, ConstValue, DagTest, RelationalOp, TempId, TempTable, TempTest, TypeId};
use sift_types::{ParamConstraint, TypeTable};

use super::*;

fn test(temp: TempId, test: DagTest) -> TempTest {
    TempTest::new(temp, test)
}

#[test]
fn null_tests_follow_each_other() {
    let types = TypeTable::new();
    let temps = TempTable::new(TypeId::OBJECT);
    let mut k = Knowledge::default();
    let non_null = test(TempId::INPUT, DagTest::NonNull);
    let null = test(TempId::INPUT, DagTest::ExplicitNull);
    assert_eq!(k.implies(&types, &temps, &non_null), None);

    k.learn(&types, &temps, &non_null, false);
    assert_eq!(k.implies(&types, &temps, &non_null), Some(false));
    assert_eq!(k.implies(&types, &temps, &null), Some(true));
    assert_eq!(
        k.implies(&types, &temps, &test(TempId::INPUT, DagTest::Type(TypeId::INT))),
        Some(false)
    );
}

#[test]
fn value_types_are_never_null() {
    let types = TypeTable::new();
    let temps = TempTable::new(TypeId::INT);
    let k = Knowledge::default();
    assert_eq!(
        k.implies(&types, &temps, &test(TempId::INPUT, DagTest::NonNull)),
        Some(true)
    );
}

#[test]
fn type_success_implies_non_null_and_supertypes() {
    let mut types = TypeTable::new();
    let animal = types.class("Animal", None);
    let dog = types.class("Dog", Some(animal));
    let car = types.sealed_class("Car", None);
    let temps = TempTable::new(TypeId::OBJECT);
    let mut k = Knowledge::default();
    k.learn(&types, &temps, &test(TempId::INPUT, DagTest::Type(dog)), true);

    assert_eq!(
        k.implies(&types, &temps, &test(TempId::INPUT, DagTest::NonNull)),
        Some(true)
    );
    assert_eq!(
        k.implies(&types, &temps, &test(TempId::INPUT, DagTest::Type(animal))),
        Some(true)
    );
    assert_eq!(
        k.implies(&types, &temps, &test(TempId::INPUT, DagTest::Type(car))),
        Some(false)
    );
}

#[test]
fn type_failure_excludes_subtypes() {
    let mut types = TypeTable::new();
    let animal = types.class("Animal", None);
    let dog = types.class("Dog", Some(animal));
    let temps = TempTable::new(TypeId::OBJECT);
    let mut k = Knowledge::default();
    k.learn(&types, &temps, &test(TempId::INPUT, DagTest::Type(animal)), false);

    assert_eq!(
        k.implies(&types, &temps, &test(TempId::INPUT, DagTest::Type(dog))),
        Some(false)
    );
    assert_eq!(
        k.implies(&types, &temps, &test(TempId::INPUT, DagTest::NonNull)),
        None
    );
}

#[test]
fn open_type_parameter_is_never_decided() {
    let mut types = TypeTable::new();
    let t = types.type_param("T", ParamConstraint::None, None);
    let temps = TempTable::new(TypeId::OBJECT);
    let mut k = Knowledge::default();
    k.learn(&types, &temps, &test(TempId::INPUT, DagTest::Type(t)), true);
    assert_eq!(
        k.implies(&types, &temps, &test(TempId::INPUT, DagTest::Type(TypeId::INT))),
        None
    );
}

#[test]
fn value_outcomes_narrow_the_set() {
    let types = TypeTable::new();
    let temps = TempTable::new(TypeId::BOOL);
    let mut k = Knowledge::default();
    let is_true = test(TempId::INPUT, DagTest::Value(ConstValue::Bool(true)));
    let is_false = test(TempId::INPUT, DagTest::Value(ConstValue::Bool(false)));
    k.learn(&types, &temps, &is_true, false);
    assert_eq!(k.implies(&types, &temps, &is_true), Some(false));
    assert_eq!(k.implies(&types, &temps, &is_false), Some(true));
}

#[test]
fn relational_outcomes_decide_contained_ranges() {
    let types = TypeTable::new();
    let mut temps = TempTable::new(TypeId::STRING);
    let length = temps.derive(TempId::INPUT, Accessor::Length, TypeId::INT);
    let mut k = Knowledge::default();
    let at_least_two = test(
        length,
        DagTest::Relational(RelationalOp::Ge, ConstValue::Int(2)),
    );
    k.learn(&types, &temps, &at_least_two, true);

    assert_eq!(
        k.implies(&types, &temps, &test(length, DagTest::Value(ConstValue::Int(1)))),
        Some(false)
    );
    assert_eq!(
        k.implies(
            &types,
            &temps,
            &test(length, DagTest::Relational(RelationalOp::Gt, ConstValue::Int(0)))
        ),
        Some(true)
    );
    assert_eq!(
        k.implies(&types, &temps, &test(length, DagTest::Value(ConstValue::Int(3)))),
        None
    );
}

#[test]
fn string_values_on_nullable_temps_stay_undecided_until_non_null() {
    let types = TypeTable::new();
    let temps = TempTable::new(TypeId::STRING);
    let mut k = Knowledge::default();
    let a = test(TempId::INPUT, DagTest::Value(ConstValue::string("a")));
    let b = test(TempId::INPUT, DagTest::Value(ConstValue::string("b")));
    k.learn(&types, &temps, &a, true);
    assert_eq!(k.implies(&types, &temps, &b), Some(false));
    assert_eq!(
        k.implies(&types, &temps, &test(TempId::INPUT, DagTest::NonNull)),
        Some(true)
    );
}

#[test]
fn retain_drops_unreferenced_temps() {
    let types = TypeTable::new();
    let temps = TempTable::new(TypeId::OBJECT);
    let mut k = Knowledge::default();
    k.learn(&types, &temps, &test(TempId::INPUT, DagTest::NonNull), true);
    assert!(!k.is_empty());
    k.retain_tested(&temps, &BTreeSet::new());
    assert!(k.is_empty());
}

#[test]
fn end_reads_share_facts_once_length_is_exact() {
    let mut types = TypeTable::new();
    let ints = types.array(TypeId::INT);
    let mut temps = TempTable::new(ints);
    let length = temps.derive(TempId::INPUT, Accessor::Length, TypeId::INT);
    let last = temps.derive(TempId::INPUT, Accessor::IndexFromEnd(1), TypeId::INT);
    let second = temps.derive(TempId::INPUT, Accessor::Index(1), TypeId::INT);
    let mut k = Knowledge::default();

    k.learn(&types, &temps, &test(last, DagTest::Value(ConstValue::Int(2))), false);
    assert_eq!(k.resolve(&temps, last), last);
    assert_eq!(
        k.implies(&types, &temps, &test(second, DagTest::Value(ConstValue::Int(2)))),
        None
    );

    k.learn(&types, &temps, &test(length, DagTest::Value(ConstValue::Int(2))), true);
    assert_eq!(k.resolve(&temps, last), second);
    assert_eq!(
        k.implies(&types, &temps, &test(second, DagTest::Value(ConstValue::Int(2)))),
        Some(false)
    );

    // The length stays while the element is still tested.
    k.retain_tested(&temps, &BTreeSet::from([second]));
    assert_eq!(k.resolve(&temps, last), second);
    assert!(k.facts(length).is_some());
}

#[test]
fn end_reads_stay_apart_when_length_is_open() {
    let mut types = TypeTable::new();
    let ints = types.array(TypeId::INT);
    let mut temps = TempTable::new(ints);
    let length = temps.derive(TempId::INPUT, Accessor::Length, TypeId::INT);
    let last = temps.derive(TempId::INPUT, Accessor::IndexFromEnd(1), TypeId::INT);
    let second = temps.derive(TempId::INPUT, Accessor::Index(1), TypeId::INT);
    let mut k = Knowledge::default();

    let at_least_two = DagTest::Relational(RelationalOp::Ge, ConstValue::Int(2));
    k.learn(&types, &temps, &test(length, at_least_two), true);
    k.learn(&types, &temps, &test(last, DagTest::Value(ConstValue::Int(2))), false);
    assert_eq!(k.resolve(&temps, last), last);
    assert_eq!(
        k.implies(&types, &temps, &test(second, DagTest::Value(ConstValue::Int(2)))),
        None
    );
}
