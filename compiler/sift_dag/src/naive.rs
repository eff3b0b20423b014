//! A sequential reference matcher.
//!
//! Tries each clause in source order by walking its pattern directly, the
//! way an interpreter without a decision dag would. The dag evaluator and
//! the lowered program must always agree with it.

use sift_ir::{ClauseId, Guard, ListPattern, Name, Pattern, PatternKind, RecursivePattern};

use crate::eval::{value_equals, EvalError, Evaluator, Outcome, Value};
use crate::stack::ensure_sufficient_stack;

/// Whether `pattern` matches `value`, appending its bindings on success.
pub fn matches(
    evaluator: &Evaluator<'_>,
    pattern: &Pattern,
    value: &Value,
    bindings: &mut Vec<(Name, Value)>,
) -> Result<bool, EvalError> {
    if pattern.has_error() {
        return Ok(false);
    }
    let mark = bindings.len();
    let matched = ensure_sufficient_stack(|| walk(evaluator, pattern, value, bindings))?;
    if !matched {
        bindings.truncate(mark);
    }
    Ok(matched)
}

/// The first clause whose pattern matches and whose guard passes.
pub fn first_match<G>(
    evaluator: &Evaluator<'_>,
    clauses: &[(&Pattern, Option<Guard>)],
    value: &Value,
    mut guard: G,
) -> Result<Outcome, EvalError>
where
    G: FnMut(ClauseId, &[(Name, Value)]) -> Result<bool, EvalError>,
{
    for (index, (pattern, clause_guard)) in clauses.iter().enumerate() {
        let clause = ClauseId::new(u32::try_from(index).unwrap_or(u32::MAX));
        let mut bindings = Vec::new();
        if !matches(evaluator, pattern, value, &mut bindings)? {
            continue;
        }
        let taken = match clause_guard {
            None | Some(Guard::Constant(true)) => true,
            Some(Guard::Constant(false)) => false,
            Some(Guard::Opaque(_)) => guard(clause, &bindings)?,
        };
        if taken {
            return Ok(Outcome::Matched { clause, bindings });
        }
    }
    Ok(Outcome::NoMatch)
}

fn walk(
    evaluator: &Evaluator<'_>,
    pattern: &Pattern,
    value: &Value,
    bindings: &mut Vec<(Name, Value)>,
) -> Result<bool, EvalError> {
    match &pattern.kind {
        PatternKind::Discard => Ok(true),
        PatternKind::Var(name) => {
            bindings.push((*name, value.clone()));
            Ok(true)
        }
        PatternKind::Declaration { ty, name } => {
            let matched = evaluator.is_instance(value, *ty);
            if let (true, Some(name)) = (matched, name) {
                bindings.push((*name, value.clone()));
            }
            Ok(matched)
        }
        PatternKind::Type(ty) => Ok(evaluator.is_instance(value, *ty)),
        PatternKind::Constant { value: constant, ty } => {
            if constant.is_null() {
                return Ok(value.is_null());
            }
            Ok(constant_type_matches(evaluator, value, *ty) && value_equals(value, constant))
        }
        PatternKind::Relational {
            op,
            value: constant,
            ty,
        } => Ok(constant_type_matches(evaluator, value, *ty)
            && evaluator.test(
                value,
                &sift_ir::DagTest::Relational(*op, constant.clone()),
            )),
        PatternKind::Recursive(rec) => recursive(evaluator, rec, value, bindings),
        PatternKind::List(list) => self::list(evaluator, list, value, bindings),
        PatternKind::DefaultLiteral | PatternKind::Slice(_) => Ok(false),
        PatternKind::Not(inner) => {
            let mut scratch = Vec::new();
            Ok(!walk(evaluator, inner, value, &mut scratch)?)
        }
        PatternKind::And(left, right) => {
            Ok(walk(evaluator, left, value, bindings)? && walk(evaluator, right, value, bindings)?)
        }
        PatternKind::Or(left, right) => {
            let mut scratch = Vec::new();
            Ok(walk(evaluator, left, value, &mut scratch)?
                || walk(evaluator, right, value, &mut scratch)?)
        }
    }
}

/// A constant of type `ty` only matches values of that runtime type; a
/// string constant also matches a char span.
fn constant_type_matches(evaluator: &Evaluator<'_>, value: &Value, ty: sift_ir::TypeId) -> bool {
    if value.is_null() {
        return false;
    }
    if let Value::Seq { ty: seq_ty, .. } = value {
        if evaluator.types().is_char_span(*seq_ty) {
            return ty == sift_ir::TypeId::STRING;
        }
    }
    evaluator.is_instance(value, ty)
}

fn recursive(
    evaluator: &Evaluator<'_>,
    rec: &RecursivePattern,
    value: &Value,
    bindings: &mut Vec<(Name, Value)>,
) -> Result<bool, EvalError> {
    if value.is_null() {
        return Ok(false);
    }
    if let Some(ty) = rec.ty {
        if !evaluator.is_instance(value, ty) {
            return Ok(false);
        }
    }
    if let Some(subpatterns) = &rec.positional {
        let parts = match value {
            Value::Tuple { items, .. } => items,
            Value::Object { outputs, .. } => outputs,
            _ => return Ok(false),
        };
        if parts.len() != subpatterns.len() {
            return Ok(false);
        }
        for (sub, part) in subpatterns.iter().zip(parts) {
            if !walk(evaluator, sub, part, bindings)? {
                return Ok(false);
            }
        }
    }
    for prop in rec.properties.iter().flatten() {
        let mut current = value.clone();
        for (position, member) in prop.members.iter().enumerate() {
            if position > 0 && current.is_null() {
                return Ok(false);
            }
            current = if *member == evaluator.types().length_name()
                && matches!(current, Value::Str(_) | Value::Seq { .. })
            {
                evaluator.access(&current, sift_ir::Accessor::Length)?
            } else {
                evaluator.access(&current, sift_ir::Accessor::Property(*member))?
            };
        }
        if !walk(evaluator, &prop.pattern, &current, bindings)? {
            return Ok(false);
        }
    }
    if let Some(name) = rec.designation {
        bindings.push((name, value.clone()));
    }
    Ok(true)
}

fn list(
    evaluator: &Evaluator<'_>,
    list: &ListPattern,
    value: &Value,
    bindings: &mut Vec<(Name, Value)>,
) -> Result<bool, EvalError> {
    let items: Vec<Value> = match value {
        Value::Str(units) => units.iter().map(|unit| Value::Char(*unit)).collect(),
        Value::Seq { items, .. } => items.clone(),
        _ => return Ok(false),
    };
    let count = list.elements.len();
    let slice = list.slice_index();
    let fixed = count - usize::from(slice.is_some());
    let length_ok = match slice {
        Some(_) => items.len() >= fixed,
        None => items.len() == fixed,
    };
    if !length_ok {
        return Ok(false);
    }
    for (index, element) in list.elements.iter().enumerate() {
        if Some(index) == slice {
            if let PatternKind::Slice(Some(inner)) = &element.kind {
                let sliced = evaluator.access(
                    value,
                    sift_ir::Accessor::Slice {
                        start: u32::try_from(index).unwrap_or(u32::MAX),
                        end_from_end: u32::try_from(count - index - 1).unwrap_or(u32::MAX),
                    },
                )?;
                if !walk(evaluator, inner, &sliced, bindings)? {
                    return Ok(false);
                }
            }
            continue;
        }
        let position = match slice {
            Some(slice) if index > slice => items.len() - (count - index),
            _ => index,
        };
        if !walk(evaluator, element, &items[position], bindings)? {
            return Ok(false);
        }
    }
    if let Some(name) = list.designation {
        bindings.push((name, value.clone()));
    }
    Ok(true)
}
