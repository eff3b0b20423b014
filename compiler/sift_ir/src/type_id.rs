//! Type identifiers handed out by the binder's type table.
//!
//! The built-in types that patterns special-case (constants, lengths,
//! indices, span constant strings) are pre-registered at fixed indices so
//! the dag compiler can name them without a table lookup.

use std::fmt;

/// Index into a `TypeTable`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    pub const OBJECT: TypeId = TypeId(0);
    pub const BOOL: TypeId = TypeId(1);
    pub const CHAR: TypeId = TypeId(2);
    pub const BYTE: TypeId = TypeId(3);
    pub const INT: TypeId = TypeId(4);
    pub const LONG: TypeId = TypeId(5);
    pub const DOUBLE: TypeId = TypeId(6);
    pub const STRING: TypeId = TypeId(7);
    /// Produced for patterns that failed to bind.
    pub const ERROR: TypeId = TypeId(8);

    /// First index available to user-declared and compound types.
    pub const FIRST_DECLARED: u32 = 9;

    #[inline]
    pub const fn new(index: u32) -> Self {
        TypeId(index)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.0 < Self::FIRST_DECLARED
    }

    #[inline]
    pub const fn is_error(self) -> bool {
        self.0 == Self::ERROR.0
    }

    /// Name of a pre-registered type, if this is one.
    pub const fn builtin_name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("object"),
            1 => Some("bool"),
            2 => Some("char"),
            3 => Some("byte"),
            4 => Some("int"),
            5 => Some("long"),
            6 => Some("double"),
            7 => Some("string"),
            8 => Some("<error>"),
            _ => None,
        }
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.builtin_name() {
            Some(name) => write!(f, "TypeId({name})"),
            None => write!(f, "TypeId({})", self.0),
        }
    }
}
