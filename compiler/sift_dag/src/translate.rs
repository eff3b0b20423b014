//! Lowering bound patterns to test trees.
//!
//! Steps come out cheapest first: null test, type test, conversion, then
//! value, length and element tests. Every value a step reads is a temp
//! registered in the shared [`TempTable`], so equal operand paths in
//! different clauses become the same temp and their tests can be shared.

use sift_ir::{
    Accessor, ConstValue, DagBinding, DagEval, DagTest, ListPattern, Pattern, PatternKind,
    PropertySubpattern, RecursivePattern, RelationalOp, TempId, TempTable, TempTest, TypeId,
};
use sift_types::{MemberKind, TypeTable};

use crate::cond::Cond;

/// A lowered pattern.
#[derive(Clone, Debug)]
pub struct Lowered {
    pub cond: Cond,
    /// The temp holding the input at the pattern's narrowed type.
    pub narrowed: TempId,
    pub bindings: Vec<DagBinding>,
}

pub struct Translator<'a, 't> {
    types: &'a TypeTable,
    temps: &'t mut TempTable,
}

impl<'a, 't> Translator<'a, 't> {
    pub fn new(types: &'a TypeTable, temps: &'t mut TempTable) -> Self {
        Translator { types, temps }
    }

    /// Lower a whole clause pattern matched against `input`.
    ///
    /// A pattern that failed binding never matches, so one binding error
    /// does not produce follow-on reachability diagnostics.
    pub fn lower(&mut self, pattern: &Pattern, input: TempId) -> Lowered {
        let mut bindings = Vec::new();
        if pattern.has_error() {
            return Lowered {
                cond: Cond::False,
                narrowed: input,
                bindings,
            };
        }
        let (cond, narrowed) = self.pattern(pattern, input, &mut bindings);
        Lowered {
            cond,
            narrowed,
            bindings,
        }
    }

    fn pattern(
        &mut self,
        pattern: &Pattern,
        input: TempId,
        bindings: &mut Vec<DagBinding>,
    ) -> (Cond, TempId) {
        match &pattern.kind {
            PatternKind::Discard => (Cond::True, input),
            PatternKind::Var(name) => {
                bindings.push(DagBinding {
                    name: *name,
                    temp: input,
                });
                (Cond::True, input)
            }
            PatternKind::Declaration { ty, name } => {
                let (parts, narrowed) = self.type_prelude(input, *ty);
                if let Some(name) = name {
                    bindings.push(DagBinding {
                        name: *name,
                        temp: narrowed,
                    });
                }
                (Cond::and(parts), narrowed)
            }
            PatternKind::Type(ty) => {
                let (parts, narrowed) = self.type_prelude(input, *ty);
                (Cond::and(parts), narrowed)
            }
            PatternKind::Constant { value, ty } => {
                if value.is_null() {
                    return (self.test(input, DagTest::ExplicitNull), input);
                }
                self.value_test(input, *ty, DagTest::Value(value.clone().canonical()))
            }
            PatternKind::Relational { op, value, ty } => {
                self.value_test(input, *ty, DagTest::Relational(*op, value.clone().canonical()))
            }
            PatternKind::Recursive(rec) => self.recursive(rec, input, bindings),
            PatternKind::List(list) => self.list(list, input, bindings),
            // Bound patterns never contain these; binding marks them as errors.
            PatternKind::DefaultLiteral | PatternKind::Slice(_) => (Cond::False, input),
            // Variables under `not` and `or` are rejected by binding; the
            // dag never exposes them.
            PatternKind::Not(inner) => {
                let (cond, _) = self.pattern(inner, input, &mut Vec::new());
                (Cond::not(cond), input)
            }
            PatternKind::And(left, right) => {
                let (left, narrowed) = self.pattern(left, input, bindings);
                let (right, narrowed) = self.pattern(right, narrowed, bindings);
                (Cond::and(vec![left, right]), narrowed)
            }
            PatternKind::Or(left, right) => {
                let (left, _) = self.pattern(left, input, &mut Vec::new());
                let (right, _) = self.pattern(right, input, &mut Vec::new());
                (Cond::or(vec![left, right]), input)
            }
        }
    }

    fn test(&self, temp: TempId, test: DagTest) -> Cond {
        Cond::test(TempTest::new(temp, test))
    }

    fn eval(&mut self, input: TempId, accessor: Accessor, ty: TypeId) -> (Cond, TempId) {
        let output = self.temps.derive(input, accessor, ty);
        (
            Cond::eval(DagEval {
                input,
                accessor,
                output,
            }),
            output,
        )
    }

    /// Null test, type test and conversion narrowing `input` to `target`.
    fn type_prelude(&mut self, input: TempId, target: TypeId) -> (Vec<Cond>, TempId) {
        let types = self.types;
        let static_ty = self.temps.ty(input);
        let mut parts = Vec::new();
        if types.may_be_null(static_ty) {
            parts.push(self.test(input, DagTest::NonNull));
        }
        if static_ty == target {
            return (parts, input);
        }
        // Unwrapping `T?` to `T` needs only the null test.
        if types.strip_nullable(static_ty) != target && !types.is_subtype(static_ty, target) {
            parts.push(self.test(input, DagTest::Type(target)));
        }
        let (convert, narrowed) = self.eval(input, Accessor::Convert(target), target);
        parts.push(convert);
        (parts, narrowed)
    }

    /// A value or relational test, preceded by whatever gets the input to
    /// a temp of the constant's type.
    fn value_test(&mut self, input: TempId, const_ty: TypeId, test: DagTest) -> (Cond, TempId) {
        let types = self.types;
        let static_ty = self.temps.ty(input);
        if types.value_family(static_ty).is_some() {
            // Strings may be null; a value test on null simply fails.
            return (self.test(input, test), input);
        }
        let inner = types.strip_nullable(static_ty);
        let target = if inner != static_ty && types.value_family(inner).is_some() {
            inner
        } else {
            const_ty
        };
        let (mut parts, narrowed) = self.type_prelude(input, target);
        parts.push(self.test(narrowed, test));
        (Cond::and(parts), narrowed)
    }

    fn recursive(
        &mut self,
        rec: &RecursivePattern,
        input: TempId,
        bindings: &mut Vec<DagBinding>,
    ) -> (Cond, TempId) {
        let types = self.types;
        let (mut parts, narrowed) = match rec.ty {
            Some(ty) => self.type_prelude(input, ty),
            None => {
                let static_ty = self.temps.ty(input);
                if types.is_nullable(static_ty) {
                    let inner = types.strip_nullable(static_ty);
                    self.type_prelude(input, inner)
                } else if types.may_be_null(static_ty) {
                    (vec![self.test(input, DagTest::NonNull)], input)
                } else {
                    (Vec::new(), input)
                }
            }
        };
        let narrowed_ty = self.temps.ty(narrowed);

        if let Some(subpatterns) = &rec.positional {
            let tuple = types
                .tuple_elements(narrowed_ty)
                .filter(|elements| elements.len() == subpatterns.len())
                .map(<[TypeId]>::to_vec);
            let outputs = match tuple {
                Some(elements) => Some((true, elements)),
                None => types
                    .deconstruct(narrowed_ty)
                    .map(|outputs| (false, outputs.to_vec())),
            };
            let Some((is_tuple, outputs)) = outputs else {
                return (Cond::False, input);
            };
            if outputs.len() != subpatterns.len() {
                return (Cond::False, input);
            }
            let arity = u32_len(outputs.len());
            for (index, (sub, ty)) in subpatterns.iter().zip(outputs).enumerate() {
                let index = u32_len(index);
                let accessor = if is_tuple {
                    Accessor::TupleElement(index)
                } else {
                    Accessor::DeconstructOutput { index, arity }
                };
                let (eval, temp) = self.eval(narrowed, accessor, ty);
                parts.push(eval);
                let (cond, _) = self.pattern(sub, temp, bindings);
                parts.push(cond);
            }
        }

        for prop in rec.properties.iter().flatten() {
            match self.property(prop, narrowed, bindings) {
                Some(cond) => parts.push(cond),
                None => return (Cond::False, input),
            }
        }

        if let Some(name) = rec.designation {
            bindings.push(DagBinding {
                name,
                temp: narrowed,
            });
        }
        (Cond::and(parts), narrowed)
    }

    /// `A.B.C: p`; intermediate members get a null test before the next read.
    fn property(
        &mut self,
        prop: &PropertySubpattern,
        receiver: TempId,
        bindings: &mut Vec<DagBinding>,
    ) -> Option<Cond> {
        let types = self.types;
        let mut parts = Vec::new();
        let mut current = receiver;
        for (position, member_name) in prop.members.iter().enumerate() {
            let member = types.member(self.temps.ty(current), *member_name)?;
            let accessor = match member.kind {
                MemberKind::Length => Accessor::Length,
                MemberKind::Property => Accessor::Property(*member_name),
            };
            let (eval, next) = self.eval(current, accessor, member.ty);
            parts.push(eval);
            let is_last = position + 1 == prop.members.len();
            if !is_last && types.may_be_null(member.ty) {
                parts.push(self.test(next, DagTest::NonNull));
            }
            current = next;
        }
        let (cond, _) = self.pattern(&prop.pattern, current, bindings);
        parts.push(cond);
        Some(Cond::and(parts))
    }

    fn list(
        &mut self,
        list: &ListPattern,
        input: TempId,
        bindings: &mut Vec<DagBinding>,
    ) -> (Cond, TempId) {
        let types = self.types;
        let static_ty = self.temps.ty(input);
        let Some(element_ty) = types.element_type(static_ty) else {
            return (Cond::False, input);
        };
        let mut parts = Vec::new();
        if types.may_be_null(static_ty) {
            parts.push(self.test(input, DagTest::NonNull));
        }
        let (eval, length) = self.eval(input, Accessor::Length, TypeId::INT);
        parts.push(eval);

        let slice = list.slice_index();
        let count = list.elements.len();
        let fixed = i64::try_from(count - usize::from(slice.is_some())).unwrap_or(i64::MAX);
        parts.push(self.test(
            length,
            match slice {
                Some(_) => DagTest::Relational(RelationalOp::Ge, ConstValue::Int(fixed)),
                None => DagTest::Value(ConstValue::Int(fixed)),
            },
        ));

        for (index, element) in list.elements.iter().enumerate() {
            if Some(index) == slice {
                if let PatternKind::Slice(Some(inner)) = &element.kind {
                    let accessor = Accessor::Slice {
                        start: u32_len(index),
                        end_from_end: u32_len(count - index - 1),
                    };
                    let slice_ty = types.slice_type(static_ty).unwrap_or(static_ty);
                    let (eval, temp) = self.eval(input, accessor, slice_ty);
                    parts.push(eval);
                    let (cond, _) = self.pattern(inner, temp, bindings);
                    parts.push(cond);
                }
                continue;
            }
            if matches!(element.kind, PatternKind::Discard) {
                continue;
            }
            let accessor = match slice {
                Some(slice) if index > slice => Accessor::IndexFromEnd(u32_len(count - index)),
                _ => Accessor::Index(u32_len(index)),
            };
            let (eval, temp) = self.eval(input, accessor, element_ty);
            parts.push(eval);
            let (cond, _) = self.pattern(element, temp, bindings);
            parts.push(cond);
        }

        if let Some(name) = list.designation {
            bindings.push(DagBinding { name, temp: input });
        }
        (Cond::and(parts), input)
    }
}

fn u32_len(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
