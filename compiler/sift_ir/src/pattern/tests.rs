use pretty_assertions::assert_eq;

use super::*;

fn name(raw: u32) -> Name {
    Name::from_raw(raw)
}

#[test]
fn designations_are_collected_in_source_order() {
    // Point(var x, int y) { Z: var z } p
    let pattern = Pattern::recursive(RecursivePattern {
        ty: Some(TypeId::new(20)),
        positional: Some(vec![
            Pattern::var(name(1)),
            Pattern::declaration(TypeId::INT, name(2)),
        ]),
        properties: Some(vec![PropertySubpattern::new(name(9), Pattern::var(name(3)))]),
        designation: Some(name(4)),
    });
    assert_eq!(
        pattern.designations(),
        vec![name(4), name(1), name(2), name(3)]
    );
    assert!(pattern.has_designation());
}

#[test]
fn discards_and_type_patterns_designate_nothing() {
    let pattern = Pattern::or(
        Pattern::declaration_discard(TypeId::INT),
        Pattern::and(Pattern::type_pattern(TypeId::STRING), Pattern::discard()),
    );
    assert!(!pattern.has_designation());
}

#[test]
fn slice_index_finds_first_slice() {
    let list = ListPattern {
        elements: vec![
            Pattern::int(1),
            Pattern::slice(None),
            Pattern::int(3),
        ],
        designation: None,
    };
    assert_eq!(list.slice_index(), Some(1));
}

#[test]
fn unbound_patterns_report_errors() {
    let mut pattern = Pattern::not(Pattern::int(0));
    assert!(pattern.has_error());

    pattern.input_type = TypeId::INT;
    pattern.narrowed_type = TypeId::INT;
    if let PatternKind::Not(inner) = &mut pattern.kind {
        inner.input_type = TypeId::INT;
        inner.narrowed_type = TypeId::INT;
    }
    assert!(!pattern.has_error());
}

#[test]
fn walk_visits_every_node() {
    let pattern = Pattern::list(
        vec![Pattern::int(1), Pattern::slice(Some(Pattern::var(name(1))))],
        None,
    );
    let mut count = 0;
    pattern.walk(&mut |_| count += 1);
    assert_eq!(count, 4);
}
