//! The bound pattern tree.
//!
//! Patterns arrive from the binder with type references already resolved to
//! [`TypeId`]s and member names interned. The binding pass in `sift_check`
//! fills [`Pattern::input_type`] and [`Pattern::narrowed_type`]; a pattern
//! that fails binding keeps [`TypeId::ERROR`] as its narrowed type and lowers
//! to a test that never succeeds.

use smallvec::SmallVec;

use crate::{ConstValue, Name, RelationalOp, Span, TypeId};

/// A pattern node with its span and bound types.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
    /// Static type of the value this pattern is matched against.
    pub input_type: TypeId,
    /// Static type established on the success path.
    pub narrowed_type: TypeId,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum PatternKind {
    /// `_`
    Discard,
    /// `var x`
    Var(Name),
    /// `T x` or `T _`.
    Declaration { ty: TypeId, name: Option<Name> },
    /// `T`
    Type(TypeId),
    /// A literal or constant expression; `ty` is the constant's type.
    Constant { value: ConstValue, ty: TypeId },
    /// The `default` literal used as a pattern. Always rejected.
    DefaultLiteral,
    /// `< c`, `<= c`, `> c`, `>= c`.
    Relational {
        op: RelationalOp,
        value: ConstValue,
        ty: TypeId,
    },
    /// `T (p, q) { A: r } x`
    Recursive(Box<RecursivePattern>),
    /// `[p, .., q] x`
    List(Box<ListPattern>),
    /// `..` or `.. p`; only legal as a list element.
    Slice(Option<Box<Pattern>>),
    Not(Box<Pattern>),
    And(Box<Pattern>, Box<Pattern>),
    Or(Box<Pattern>, Box<Pattern>),
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct RecursivePattern {
    pub ty: Option<TypeId>,
    /// `None` when no parenthesized clause was written.
    pub positional: Option<Vec<Pattern>>,
    /// `None` when no property clause was written.
    pub properties: Option<Vec<PropertySubpattern>>,
    pub designation: Option<Name>,
}

/// `A.B.C: pattern` inside a property clause.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct PropertySubpattern {
    pub members: SmallVec<[Name; 2]>,
    pub pattern: Pattern,
    pub span: Span,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ListPattern {
    pub elements: Vec<Pattern>,
    pub designation: Option<Name>,
}

impl ListPattern {
    /// Position of the first slice element, if any.
    pub fn slice_index(&self) -> Option<usize> {
        self.elements
            .iter()
            .position(|element| matches!(element.kind, PatternKind::Slice(_)))
    }
}

impl Pattern {
    pub fn new(kind: PatternKind) -> Self {
        Pattern {
            kind,
            span: Span::DUMMY,
            input_type: TypeId::ERROR,
            narrowed_type: TypeId::ERROR,
        }
    }

    #[must_use]
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn discard() -> Self {
        Self::new(PatternKind::Discard)
    }

    pub fn var(name: Name) -> Self {
        Self::new(PatternKind::Var(name))
    }

    pub fn declaration(ty: TypeId, name: Name) -> Self {
        Self::new(PatternKind::Declaration {
            ty,
            name: Some(name),
        })
    }

    /// `T _`
    pub fn declaration_discard(ty: TypeId) -> Self {
        Self::new(PatternKind::Declaration { ty, name: None })
    }

    pub fn type_pattern(ty: TypeId) -> Self {
        Self::new(PatternKind::Type(ty))
    }

    pub fn constant(value: ConstValue, ty: TypeId) -> Self {
        Self::new(PatternKind::Constant { value, ty })
    }

    pub fn int(value: i64) -> Self {
        Self::constant(ConstValue::Int(value), TypeId::INT)
    }

    pub fn bool(value: bool) -> Self {
        Self::constant(ConstValue::Bool(value), TypeId::BOOL)
    }

    /// A char constant; `unit` is a UTF-16 code unit.
    pub fn char(unit: u16) -> Self {
        Self::constant(ConstValue::Char(unit), TypeId::CHAR)
    }

    pub fn string(value: &str) -> Self {
        Self::constant(ConstValue::string(value), TypeId::STRING)
    }

    pub fn null() -> Self {
        Self::constant(ConstValue::Null, TypeId::OBJECT)
    }

    pub fn default_literal() -> Self {
        Self::new(PatternKind::DefaultLiteral)
    }

    pub fn relational(op: RelationalOp, value: ConstValue, ty: TypeId) -> Self {
        Self::new(PatternKind::Relational { op, value, ty })
    }

    pub fn recursive(pattern: RecursivePattern) -> Self {
        Self::new(PatternKind::Recursive(Box::new(pattern)))
    }

    /// `(p, q, ...)` with no type or property clause.
    pub fn positional(subpatterns: Vec<Pattern>) -> Self {
        Self::recursive(RecursivePattern {
            ty: None,
            positional: Some(subpatterns),
            properties: None,
            designation: None,
        })
    }

    /// `{ A: p, B.C: q }` with no type clause.
    pub fn properties(subpatterns: Vec<PropertySubpattern>) -> Self {
        Self::recursive(RecursivePattern {
            ty: None,
            positional: None,
            properties: Some(subpatterns),
            designation: None,
        })
    }

    pub fn list(elements: Vec<Pattern>, designation: Option<Name>) -> Self {
        Self::new(PatternKind::List(Box::new(ListPattern {
            elements,
            designation,
        })))
    }

    pub fn slice(inner: Option<Pattern>) -> Self {
        Self::new(PatternKind::Slice(inner.map(Box::new)))
    }

    #[expect(
        clippy::should_implement_trait,
        reason = "pattern combinator constructor, not boolean negation"
    )]
    pub fn not(inner: Pattern) -> Self {
        Self::new(PatternKind::Not(Box::new(inner)))
    }

    pub fn and(left: Pattern, right: Pattern) -> Self {
        Self::new(PatternKind::And(Box::new(left), Box::new(right)))
    }

    pub fn or(left: Pattern, right: Pattern) -> Self {
        Self::new(PatternKind::Or(Box::new(left), Box::new(right)))
    }

    /// Whether binding recorded an error somewhere in this pattern.
    pub fn has_error(&self) -> bool {
        let mut found = false;
        self.walk(&mut |pattern| found |= pattern.narrowed_type.is_error());
        found
    }

    /// Variables designated anywhere in this pattern, in source order.
    pub fn designations(&self) -> Vec<Name> {
        let mut names = Vec::new();
        self.walk(&mut |pattern| match &pattern.kind {
            PatternKind::Var(name)
            | PatternKind::Declaration {
                name: Some(name), ..
            } => names.push(*name),
            PatternKind::Recursive(rec) => names.extend(rec.designation),
            PatternKind::List(list) => names.extend(list.designation),
            _ => {}
        });
        names
    }

    pub fn has_designation(&self) -> bool {
        !self.designations().is_empty()
    }

    /// Pre-order traversal over this pattern and every subpattern.
    pub fn walk(&self, f: &mut impl FnMut(&Pattern)) {
        f(self);
        match &self.kind {
            PatternKind::Discard
            | PatternKind::Var(_)
            | PatternKind::Declaration { .. }
            | PatternKind::Type(_)
            | PatternKind::Constant { .. }
            | PatternKind::DefaultLiteral
            | PatternKind::Relational { .. }
            | PatternKind::Slice(None) => {}
            PatternKind::Recursive(rec) => {
                for sub in rec.positional.iter().flatten() {
                    sub.walk(f);
                }
                for prop in rec.properties.iter().flatten() {
                    prop.pattern.walk(f);
                }
            }
            PatternKind::List(list) => {
                for element in &list.elements {
                    element.walk(f);
                }
            }
            PatternKind::Slice(Some(inner)) | PatternKind::Not(inner) => inner.walk(f),
            PatternKind::And(left, right) | PatternKind::Or(left, right) => {
                left.walk(f);
                right.walk(f);
            }
        }
    }

    /// Mutable pre-order traversal, used by the binding pass to fill types.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Pattern)) {
        f(self);
        match &mut self.kind {
            PatternKind::Discard
            | PatternKind::Var(_)
            | PatternKind::Declaration { .. }
            | PatternKind::Type(_)
            | PatternKind::Constant { .. }
            | PatternKind::DefaultLiteral
            | PatternKind::Relational { .. }
            | PatternKind::Slice(None) => {}
            PatternKind::Recursive(rec) => {
                for sub in rec.positional.iter_mut().flatten() {
                    sub.walk_mut(f);
                }
                for prop in rec.properties.iter_mut().flatten() {
                    prop.pattern.walk_mut(f);
                }
            }
            PatternKind::List(list) => {
                for element in &mut list.elements {
                    element.walk_mut(f);
                }
            }
            PatternKind::Slice(Some(inner)) | PatternKind::Not(inner) => inner.walk_mut(f),
            PatternKind::And(left, right) | PatternKind::Or(left, right) => {
                left.walk_mut(f);
                right.walk_mut(f);
            }
        }
    }
}

impl PropertySubpattern {
    pub fn new(member: Name, pattern: Pattern) -> Self {
        PropertySubpattern {
            members: SmallVec::from_slice(&[member]),
            pattern,
            span: Span::DUMMY,
        }
    }

    /// `A.B.C: pattern`
    pub fn extended(members: &[Name], pattern: Pattern) -> Self {
        PropertySubpattern {
            members: SmallVec::from_slice(members),
            pattern,
            span: Span::DUMMY,
        }
    }

    #[must_use]
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[cfg(test)]
mod tests;
