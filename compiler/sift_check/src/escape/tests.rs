use pretty_assertions::assert_eq;
use sift_dag::DagBuilder;
use sift_diagnostic::{DiagnosticConfig, DiagnosticQueue, ErrorCode};
use sift_ir::{
    Clause, DecisionDag, Name, Pattern, PropertySubpattern, SafeContext, Scrutinee, Span, TypeId,
};
use sift_types::TypeTable;

use super::{check_escapes, temp_contexts};
use crate::bind::Binder;
use crate::CompileOptions;

const RETURN: SafeContext = SafeContext::RETURN_ONLY;

fn compile(types: &TypeTable, scrutinee: &Scrutinee, clauses: &mut [Clause]) -> DecisionDag {
    let options = CompileOptions::default();
    let mut queue = DiagnosticQueue::new();
    let mut builder = DagBuilder::new(types, scrutinee.ty);
    for clause in clauses.iter_mut() {
        Binder::new(types, &options, &mut queue).bind(&mut clause.pattern, scrutinee.ty);
        builder.add_pattern(&clause.pattern, clause.guard);
    }
    assert!(queue.is_empty(), "unexpected binding errors: {:?}", queue.flush());
    builder.build()
}

/// Names whose `return` was rejected.
fn escaping(types: &TypeTable, scrutinee: &Scrutinee, pattern: Pattern, names: &[Name]) -> Vec<Name> {
    let mut clause = Clause::new(pattern);
    for (i, name) in names.iter().enumerate() {
        let offset = u32::try_from(i).unwrap();
        clause = clause.with_use(*name, RETURN, Span::new(offset * 10, offset * 10 + 1));
    }
    let mut clauses = vec![clause];
    let dag = compile(types, scrutinee, &mut clauses);
    let mut queue = DiagnosticQueue::with_config(DiagnosticConfig::unlimited());
    check_escapes(types, scrutinee, &dag, &clauses, &mut queue);
    queue
        .flush()
        .into_iter()
        .map(|diag| {
            assert_eq!(diag.code, ErrorCode::EscapeVariable);
            types.intern(&diag.args[0])
        })
        .collect()
}

fn stack_span(types: &mut TypeTable) -> Scrutinee {
    let span = types.span(TypeId::INT);
    Scrutinee::of_type(span).with_context(SafeContext::CURRENT_METHOD)
}

#[test]
fn simple_variable_over_stack_span() {
    let mut types = TypeTable::new();
    let scrutinee = stack_span(&mut types);
    let s = types.intern("s");

    assert_eq!(escaping(&types, &scrutinee, Pattern::var(s), &[s]), vec![s]);

    let mut clauses = vec![Clause::new(Pattern::var(s)).with_use(
        s,
        SafeContext::block(0),
        Span::DUMMY,
    )];
    let dag = compile(&types, &scrutinee, &mut clauses);
    let mut queue = DiagnosticQueue::new();
    assert_eq!(check_escapes(&types, &scrutinee, &dag, &clauses, &mut queue), 0);
}

#[test]
fn non_ref_like_values_may_escape() {
    let mut types = TypeTable::new();
    let s = types.intern("s");
    let text = Scrutinee::of_type(TypeId::STRING).with_context(SafeContext::CURRENT_METHOD);
    assert_eq!(escaping(&types, &text, Pattern::var(s), &[s]), vec![]);

    let heap_span = Scrutinee::of_type(types.span(TypeId::INT));
    assert_eq!(escaping(&types, &heap_span, Pattern::var(s), &[s]), vec![]);
}

#[test]
fn nested_property_bindings_inherit_the_receiver() {
    let mut types = TypeTable::new();
    let span = types.span(TypeId::INT);
    let holder = types.ref_struct("Holder");
    let items = types.add_property(holder, "Items", span);
    let count = types.add_property(holder, "Count", TypeId::INT);
    let (a, b) = (types.intern("a"), types.intern("b"));
    let scrutinee = Scrutinee::of_type(holder).with_context(SafeContext::CURRENT_METHOD);

    let pattern = Pattern::properties(vec![
        PropertySubpattern::new(items, Pattern::var(a)),
        PropertySubpattern::new(count, Pattern::var(b)),
    ]);
    assert_eq!(escaping(&types, &scrutinee, pattern, &[a, b]), vec![a]);
}

#[test]
fn nested_positional_bindings_inherit_the_receiver() {
    let mut types = TypeTable::new();
    let span = types.span(TypeId::INT);
    let holder = types.ref_struct("Holder");
    types.set_deconstruct(holder, vec![span, TypeId::INT]);
    let (a, b) = (types.intern("a"), types.intern("b"));
    let scrutinee = Scrutinee::of_type(holder).with_context(SafeContext::CURRENT_METHOD);

    let pattern = Pattern::positional(vec![Pattern::var(a), Pattern::var(b)]);
    assert_eq!(escaping(&types, &scrutinee, pattern, &[a, b]), vec![a]);
}

#[test]
fn list_elements_escape_but_slices_do_not() {
    let mut types = TypeTable::new();
    let scrutinee = stack_span(&mut types);
    let (first, rest) = (types.intern("first"), types.intern("rest"));

    let pattern = Pattern::list(
        vec![Pattern::var(first), Pattern::slice(Some(Pattern::var(rest)))],
        None,
    );
    assert_eq!(escaping(&types, &scrutinee, pattern, &[first, rest]), vec![rest]);
}

#[test]
fn combinator_bindings_are_checked() {
    let mut types = TypeTable::new();
    let scrutinee = stack_span(&mut types);
    let s = types.intern("s");

    let pattern = Pattern::and(Pattern::discard(), Pattern::var(s));
    assert_eq!(escaping(&types, &scrutinee, pattern, &[s]), vec![s]);
}

#[test]
fn contexts_follow_the_operand_path() {
    let mut types = TypeTable::new();
    let span = types.span(TypeId::INT);
    let holder = types.class("Holder", None);
    types.add_property(holder, "Items", span);
    let scrutinee = Scrutinee::of_type(holder).with_context(SafeContext::CURRENT_METHOD);
    let items = types.intern("Items");
    let a = types.intern("a");

    let mut clauses = vec![Clause::new(Pattern::properties(vec![PropertySubpattern::new(
        items,
        Pattern::var(a),
    )]))];
    let dag = compile(&types, &scrutinee, &mut clauses);
    let contexts = temp_contexts(&types, &dag.temps, scrutinee.safe_context);
    assert!(contexts
        .iter()
        .all(|context| *context == SafeContext::CALLING_METHOD));
}
