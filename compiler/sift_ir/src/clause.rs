//! Clauses, guards, scrutinees and the safe contexts used by escape analysis.

use std::fmt;

use crate::{ConstValue, Name, Pattern, Span, TypeId};

/// Opaque handle for a guard expression the caller evaluates.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct GuardId(pub u32);

/// A `when` clause.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Guard {
    /// `when true` / `when false`.
    Constant(bool),
    Opaque(GuardId),
}

/// Position of a clause in its switch, in source order.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ClauseId(u32);

impl ClauseId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        ClauseId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ClauseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clause#{}", self.0)
    }
}

/// How far a value may flow before its storage dies.
///
/// Lower is wider. A value may move to a destination whose context is at
/// least as narrow as its own.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct SafeContext(u32);

impl SafeContext {
    /// Safe to return to any caller.
    pub const CALLING_METHOD: SafeContext = SafeContext(0);
    /// Safe to return through a `ref`/`out` result only.
    pub const RETURN_ONLY: SafeContext = SafeContext(1);
    /// Valid until the current method returns (e.g. `stackalloc` storage).
    pub const CURRENT_METHOD: SafeContext = SafeContext(2);

    /// A nested block at `depth` inside the method body.
    pub const fn block(depth: u32) -> Self {
        SafeContext(3 + depth)
    }

    pub const fn depth(self) -> u32 {
        self.0
    }

    /// Whether a value with this context may flow into `destination`.
    #[inline]
    pub const fn can_flow_to(self, destination: SafeContext) -> bool {
        self.0 <= destination.0
    }
}

impl fmt::Display for SafeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => f.write_str("calling method"),
            1 => f.write_str("return-only"),
            2 => f.write_str("current method"),
            depth => write!(f, "block depth {}", depth - 3),
        }
    }
}

/// A use of a pattern variable that moves it to another context.
///
/// `return x` flows to [`SafeContext::RETURN_ONLY`]; assigning to a local
/// declared in an enclosing block flows to that block's context.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct EscapeUse {
    pub name: Name,
    pub destination: SafeContext,
    pub span: Span,
}

/// One `case`/arm of a switch.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Clause {
    pub pattern: Pattern,
    pub guard: Option<Guard>,
    pub span: Span,
    /// Escaping uses of this clause's variables inside its guard or body.
    pub uses: Vec<EscapeUse>,
}

impl Clause {
    pub fn new(pattern: Pattern) -> Self {
        let span = pattern.span;
        Clause {
            pattern,
            guard: None,
            span,
            uses: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    #[must_use]
    pub fn with_use(mut self, name: Name, destination: SafeContext, span: Span) -> Self {
        self.uses.push(EscapeUse {
            name,
            destination,
            span,
        });
        self
    }

    #[must_use]
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// No guard, or a guard that is constantly true.
    pub fn is_unconditional(&self) -> bool {
        matches!(self.guard, None | Some(Guard::Constant(true)))
    }

    pub fn is_never_taken(&self) -> bool {
        matches!(self.guard, Some(Guard::Constant(false)))
    }
}

/// The value being matched.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Scrutinee {
    pub ty: TypeId,
    /// Set when the scrutinee is a compile-time constant.
    pub constant: Option<ConstValue>,
    pub span: Span,
    /// Context of the scrutinee's storage. Only meaningful for ref-like types.
    pub safe_context: SafeContext,
}

impl Scrutinee {
    pub fn of_type(ty: TypeId) -> Self {
        Scrutinee {
            ty,
            constant: None,
            span: Span::DUMMY,
            safe_context: SafeContext::CALLING_METHOD,
        }
    }

    pub fn constant(ty: TypeId, value: ConstValue) -> Self {
        Scrutinee {
            constant: Some(value),
            ..Self::of_type(ty)
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: SafeContext) -> Self {
        self.safe_context = context;
        self
    }

    #[must_use]
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}
