//! Pre-computed type classification flags.
//!
//! Flags are computed once when a type is registered so the dag compiler can
//! ask "may this be null?" or "is this ref-like?" without walking the kind.

use bitflags::bitflags;

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct TypeFlags: u16 {
        /// Instances are copied by value (primitives, structs, enums, nullables, tuples).
        const IS_VALUE_TYPE = 1 << 0;
        /// Instances are heap references.
        const IS_REFERENCE_TYPE = 1 << 1;
        /// `null` is a possible value of this static type.
        const MAY_BE_NULL = 1 << 2;
        /// Stack-only type (spans, ref structs). Cannot be boxed.
        const IS_REF_LIKE = 1 << 3;
        /// Byte, int, long, char, enums.
        const IS_INTEGRAL = 1 << 4;
        /// Supports `<`, `<=`, `>`, `>=` patterns.
        const IS_ORDERED = 1 << 5;
        /// A type parameter whose runtime type is only known per instantiation.
        const IS_OPEN = 1 << 6;
        /// Has a `Length` and an `int` indexer, so list patterns apply.
        const IS_SEQUENCE = 1 << 7;
        /// Primitive, string or enum: accepts constant patterns directly.
        const ACCEPTS_CONSTANTS = 1 << 8;
        /// The `ERROR` type.
        const IS_ERROR = 1 << 9;
    }
}

impl TypeFlags {
    #[inline]
    pub fn is_value_type(self) -> bool {
        self.contains(Self::IS_VALUE_TYPE)
    }

    #[inline]
    pub fn may_be_null(self) -> bool {
        self.contains(Self::MAY_BE_NULL)
    }

    #[inline]
    pub fn is_ref_like(self) -> bool {
        self.contains(Self::IS_REF_LIKE)
    }
}

#[cfg(test)]
mod tests;
