//! Compile-time constants appearing in constant and relational patterns.

use std::cmp::Ordering;
use std::fmt;

/// A constant value after conversion to the pattern's input type.
///
/// Doubles are stored as raw bits so constants can be hashed and placed in
/// ordered sets. Build them through [`ConstValue::double`], which folds `-0.0`
/// into `0.0` and every NaN into one payload, so equal runtime values are
/// equal constants.
///
/// Chars are UTF-16 code units; lone surrogates are valid char constants.
#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstValue {
    Null,
    Bool(bool),
    Char(u16),
    /// Every integral type (byte, int, long, enums) widens to `i64`.
    Int(i64),
    Double(u64),
    Str(String),
}

impl ConstValue {
    #[inline]
    pub fn double(value: f64) -> Self {
        let value = if value.is_nan() {
            f64::NAN
        } else if value == 0.0 {
            0.0
        } else {
            value
        };
        ConstValue::Double(value.to_bits())
    }

    /// The same constant with any double folded to its canonical bits.
    #[must_use]
    pub fn canonical(self) -> Self {
        match self {
            ConstValue::Double(bits) => ConstValue::double(f64::from_bits(bits)),
            other => other,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        ConstValue::Str(value.into())
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, ConstValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConstValue::Double(bits) => Some(f64::from_bits(*bits)),
            #[expect(
                clippy::cast_precision_loss,
                reason = "relational comparisons between int constants and doubles mirror the language's implicit widening"
            )]
            ConstValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Position on the integer line for integral, char and bool constants.
    pub fn as_ordinal(&self) -> Option<i64> {
        match self {
            ConstValue::Int(v) => Some(*v),
            ConstValue::Char(c) => Some(i64::from(*c)),
            ConstValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Compare two constants of the same family.
    ///
    /// Returns `None` across families, for strings, and when a NaN is involved.
    pub fn compare(&self, other: &ConstValue) -> Option<Ordering> {
        match (self, other) {
            (ConstValue::Double(_), _) | (_, ConstValue::Double(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (ConstValue::Int(a), ConstValue::Int(b)) => Some(a.cmp(b)),
            (ConstValue::Char(a), ConstValue::Char(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Null => f.write_str("null"),
            ConstValue::Bool(b) => write!(f, "{b}"),
            ConstValue::Char(unit) => match char::from_u32(u32::from(*unit)) {
                Some(c) => write!(f, "'{}'", c.escape_default()),
                None => write!(f, "'\\u{unit:04X}'"),
            },
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Double(bits) => {
                let value = f64::from_bits(*bits);
                if value.is_nan() {
                    f.write_str("double.NaN")
                } else {
                    write!(f, "{value:?}")
                }
            }
            ConstValue::Str(s) => write!(f, "\"{}\"", s.escape_default()),
        }
    }
}

/// Operator of a relational pattern (`< c`, `<= c`, `> c`, `>= c`).
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum RelationalOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelationalOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            RelationalOp::Lt => "<",
            RelationalOp::Le => "<=",
            RelationalOp::Gt => ">",
            RelationalOp::Ge => ">=",
        }
    }

    /// Whether `value OP operand` holds given `value.cmp(operand)`.
    pub const fn holds(self, ordering: Ordering) -> bool {
        match self {
            RelationalOp::Lt => matches!(ordering, Ordering::Less),
            RelationalOp::Le => !matches!(ordering, Ordering::Greater),
            RelationalOp::Gt => matches!(ordering, Ordering::Greater),
            RelationalOp::Ge => !matches!(ordering, Ordering::Less),
        }
    }
}

impl fmt::Display for RelationalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
