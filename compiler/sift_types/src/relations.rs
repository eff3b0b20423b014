//! Relations between types used by type tests.
//!
//! Every question here is about *non-null runtime values*: "is every value
//! of `a` also a `b`?" ([`TypeTable::is_subtype`]), "can one value be both?"
//! ([`TypeTable::is_disjoint`]), and "may a pattern of type `b` be applied
//! to an input of type `a` at all?" ([`TypeTable::pattern_conversion`]).
//!
//! Type parameters are treated as a domain of possible runtime types bounded
//! by their constraint kind and bound, never as a single concrete type.

use sift_ir::TypeId;

use crate::{ParamConstraint, TypeKind, TypeTable};

/// Outcome of asking whether a pattern type applies to an input type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PatternConversion {
    /// An identity, reference, boxing, unboxing or nullable conversion exists.
    Exists,
    /// Legal only with open-type pattern support.
    OpenTypeOnly,
    None,
}

/// Coarse runtime shape of a type's non-null values.
enum Shape {
    /// Object, non-sealed classes and interfaces: subclasses may add interfaces.
    Open,
    /// Exactly this runtime type (value types, strings, arrays, sealed classes).
    Exact,
    Param {
        constraint: ParamConstraint,
        bound: Option<TypeId>,
    },
    Never,
}

impl TypeTable {
    fn shape(&self, ty: TypeId) -> Shape {
        match self.kind(ty) {
            TypeKind::Object | TypeKind::Interface { .. } => Shape::Open,
            TypeKind::Class { sealed, .. } => {
                if *sealed {
                    Shape::Exact
                } else {
                    Shape::Open
                }
            }
            TypeKind::TypeParam { constraint, bound } => Shape::Param {
                constraint: *constraint,
                bound: *bound,
            },
            TypeKind::Error => Shape::Never,
            TypeKind::Nullable(inner) => self.shape(*inner),
            _ => Shape::Exact,
        }
    }

    /// Whether every non-null value of static type `a` is an instance of `b`.
    ///
    /// Covers identity, implicit reference and boxing conversions. Nullable
    /// inputs are judged by their underlying type.
    pub fn is_subtype(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        if self.is_error(a) || self.is_error(b) {
            return false;
        }
        if matches!(self.kind(b), TypeKind::Object) {
            return !self.is_ref_like(a);
        }
        match self.kind(a) {
            TypeKind::Class {
                base, interfaces, ..
            } => {
                base.is_some_and(|base| self.is_subtype(base, b))
                    || interfaces.iter().any(|i| self.is_subtype(*i, b))
            }
            TypeKind::Struct { interfaces, .. } => {
                interfaces.iter().any(|i| self.is_subtype(*i, b))
            }
            TypeKind::Interface { bases } => bases.iter().any(|i| self.is_subtype(*i, b)),
            TypeKind::Nullable(inner) => self.is_subtype(*inner, b),
            TypeKind::TypeParam { bound, .. } => {
                bound.is_some_and(|bound| self.is_subtype(bound, b))
            }
            _ => false,
        }
    }

    /// Whether no non-null runtime value can be an instance of both types.
    pub fn is_disjoint(&self, a: TypeId, b: TypeId) -> bool {
        !self.may_share_instance(a, b)
    }

    fn may_share_instance(&self, a: TypeId, b: TypeId) -> bool {
        let (a, b) = (self.strip_nullable(a), self.strip_nullable(b));
        if self.is_subtype(a, b) || self.is_subtype(b, a) {
            return true;
        }
        match (self.shape(a), self.shape(b)) {
            (Shape::Never, _) | (_, Shape::Never) => false,
            (Shape::Param { constraint, bound }, _) => self.param_may_hold(constraint, bound, b),
            (_, Shape::Param { constraint, bound }) => self.param_may_hold(constraint, bound, a),
            // Neither derives from the other and one type is exact.
            (Shape::Exact, _) | (_, Shape::Exact) => false,
            // A subclass of a non-sealed class may implement any interface.
            (Shape::Open, Shape::Open) => self.is_interface(a) || self.is_interface(b),
        }
    }

    fn param_may_hold(
        &self,
        constraint: ParamConstraint,
        bound: Option<TypeId>,
        other: TypeId,
    ) -> bool {
        if let TypeKind::TypeParam {
            constraint: other_constraint,
            bound: other_bound,
        } = self.kind(other)
        {
            let conflict = matches!(
                (constraint, *other_constraint),
                (ParamConstraint::Class, ParamConstraint::Struct)
                    | (ParamConstraint::Struct, ParamConstraint::Class)
            );
            return !conflict
                && match (bound, *other_bound) {
                    (Some(x), Some(y)) => self.may_share_instance(x, y),
                    _ => true,
                };
        }
        let kind_ok = match constraint {
            ParamConstraint::None => true,
            ParamConstraint::Class => !self.is_value_type(other) || self.is_interface(other),
            ParamConstraint::Struct => {
                self.is_value_type(other)
                    || self.is_interface(other)
                    || matches!(self.kind(other), TypeKind::Object)
            }
        };
        kind_ok && bound.map_or(true, |bound| self.may_share_instance(bound, other))
    }

    /// Whether a pattern testing for `target` may be applied to an `input`.
    pub fn pattern_conversion(&self, input: TypeId, target: TypeId) -> PatternConversion {
        if self.is_error(input) || self.is_error(target) {
            return PatternConversion::Exists;
        }
        let input = self.strip_nullable(input);
        let target = self.strip_nullable(target);
        if self.is_subtype(input, target) || self.is_subtype(target, input) {
            return PatternConversion::Exists;
        }
        if self.is_ref_like(input) || self.is_ref_like(target) {
            return PatternConversion::None;
        }
        let open = self.is_open(input) || self.is_open(target);
        let may_share = self.may_share_instance(input, target);
        if open {
            let other = if self.is_open(input) { target } else { input };
            let classic = self.is_interface(other)
                || matches!(self.kind(other), TypeKind::Object)
                || self.is_open(other);
            if classic && may_share {
                PatternConversion::Exists
            } else if may_share {
                PatternConversion::OpenTypeOnly
            } else {
                PatternConversion::None
            }
        } else if may_share {
            PatternConversion::Exists
        } else {
            PatternConversion::None
        }
    }

    /// Whether a value whose exact runtime type is `runtime` passes a type
    /// test for the closed type `target`.
    pub fn is_instance(&self, runtime: TypeId, target: TypeId) -> bool {
        self.is_subtype(runtime, target)
            || matches!(self.kind(target), TypeKind::Nullable(inner) if *inner == runtime)
    }
}
