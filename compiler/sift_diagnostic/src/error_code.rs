//! Error codes for every pattern diagnostic.
//!
//! Codes are grouped by the pass that reports them:
//! - E1xxx: binding and validation
//! - E2xxx / W2xxx / H2xxx: reachability, subsumption and exhaustiveness
//! - E3xxx: escape analysis

use std::fmt;
use std::str::FromStr;

use crate::Severity;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum ErrorCode {
    // Binding and validation (E1xxx)
    /// No pattern conversion between the input type and the pattern type.
    PatternWrongType,
    /// As above, with an open type, before generic type patterns were allowed.
    PatternWrongGenericTypeInVersion,
    /// Pattern form not available in the selected language version.
    FeatureNotAvailableInVersion,
    /// `null` matched against a non-nullable value type.
    ValueCantBeNull,
    /// `null` matched against `Span<char>` / `ReadOnlySpan<char>`.
    PatternSpanCharCannotBeStringNull,
    /// Constant not convertible to the input type.
    ConstantValueOfTypeExpected,
    /// `default` literal used as a pattern.
    DefaultPattern,
    /// Variable designated beneath `not` or `or`.
    DesignatorBeneathPatternCombinator,
    /// Relational pattern on a type without an ordering.
    UnsupportedTypeForRelationalPattern,
    /// `T?` used as a type pattern.
    PatternNullableType,
    /// List pattern on a type without `Length` and an indexer.
    ListPatternRequiresLength,
    /// Slice outside a list pattern, or more than one slice.
    MisplacedSlicePattern,
    /// Positional pattern on a type without a `Deconstruct`.
    MissingDeconstruct,
    /// Positional pattern arity differs from the deconstruction arity.
    WrongNumberOfSubpatterns,
    /// Property pattern names an unknown member.
    NoSuchMember,

    // Reachability (E2xxx, W2xxx, H2xxx)
    /// Switch statement case already handled by earlier cases.
    SwitchCaseSubsumed,
    /// Switch expression arm already handled by earlier arms.
    SwitchArmSubsumed,
    /// The same constant label appears twice.
    DuplicateCaseLabel,
    /// A case whose own pattern can never match its input.
    PatternNeverMatches,
    /// `is` pattern that can never succeed.
    IsPatternImpossible,
    /// `is` pattern that always succeeds.
    IsPatternAlways,
    GivenExpressionAlwaysMatchesConstant,
    GivenExpressionNeverMatchesPattern,
    /// Classic `e is T` that is always true.
    IsAlwaysTrue,
    /// Classic `e is T` that is always false.
    IsAlwaysFalse,
    /// Sub-pattern that cannot change the result of its combinator.
    RedundantPattern,
    /// Property sub-pattern already implied by an earlier one.
    RedundantPatternHidden,
    SwitchExpressionNotExhaustive,
    SwitchExpressionNotExhaustiveForNull,
    SwitchExpressionNotExhaustiveWithWhen,

    // Escape analysis (E3xxx)
    /// Pattern variable over ref-like storage escapes its safe context.
    EscapeVariable,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 31] = [
        ErrorCode::PatternWrongType,
        ErrorCode::PatternWrongGenericTypeInVersion,
        ErrorCode::FeatureNotAvailableInVersion,
        ErrorCode::ValueCantBeNull,
        ErrorCode::PatternSpanCharCannotBeStringNull,
        ErrorCode::ConstantValueOfTypeExpected,
        ErrorCode::DefaultPattern,
        ErrorCode::DesignatorBeneathPatternCombinator,
        ErrorCode::UnsupportedTypeForRelationalPattern,
        ErrorCode::PatternNullableType,
        ErrorCode::ListPatternRequiresLength,
        ErrorCode::MisplacedSlicePattern,
        ErrorCode::MissingDeconstruct,
        ErrorCode::WrongNumberOfSubpatterns,
        ErrorCode::NoSuchMember,
        ErrorCode::SwitchCaseSubsumed,
        ErrorCode::SwitchArmSubsumed,
        ErrorCode::DuplicateCaseLabel,
        ErrorCode::PatternNeverMatches,
        ErrorCode::IsPatternImpossible,
        ErrorCode::IsPatternAlways,
        ErrorCode::GivenExpressionAlwaysMatchesConstant,
        ErrorCode::GivenExpressionNeverMatchesPattern,
        ErrorCode::IsAlwaysTrue,
        ErrorCode::IsAlwaysFalse,
        ErrorCode::RedundantPattern,
        ErrorCode::RedundantPatternHidden,
        ErrorCode::SwitchExpressionNotExhaustive,
        ErrorCode::SwitchExpressionNotExhaustiveForNull,
        ErrorCode::SwitchExpressionNotExhaustiveWithWhen,
        ErrorCode::EscapeVariable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::PatternWrongType => "E1001",
            ErrorCode::PatternWrongGenericTypeInVersion => "E1002",
            ErrorCode::FeatureNotAvailableInVersion => "E1003",
            ErrorCode::ValueCantBeNull => "E1004",
            ErrorCode::PatternSpanCharCannotBeStringNull => "E1005",
            ErrorCode::ConstantValueOfTypeExpected => "E1006",
            ErrorCode::DefaultPattern => "E1007",
            ErrorCode::DesignatorBeneathPatternCombinator => "E1008",
            ErrorCode::UnsupportedTypeForRelationalPattern => "E1009",
            ErrorCode::PatternNullableType => "E1010",
            ErrorCode::ListPatternRequiresLength => "E1011",
            ErrorCode::MisplacedSlicePattern => "E1012",
            ErrorCode::MissingDeconstruct => "E1013",
            ErrorCode::WrongNumberOfSubpatterns => "E1014",
            ErrorCode::NoSuchMember => "E1015",
            ErrorCode::SwitchCaseSubsumed => "E2001",
            ErrorCode::SwitchArmSubsumed => "E2002",
            ErrorCode::DuplicateCaseLabel => "E2003",
            ErrorCode::PatternNeverMatches => "E2004",
            ErrorCode::IsPatternImpossible => "E2005",
            ErrorCode::IsPatternAlways => "W2001",
            ErrorCode::GivenExpressionAlwaysMatchesConstant => "W2002",
            ErrorCode::GivenExpressionNeverMatchesPattern => "W2003",
            ErrorCode::IsAlwaysTrue => "W2004",
            ErrorCode::IsAlwaysFalse => "W2005",
            ErrorCode::RedundantPattern => "W2006",
            ErrorCode::SwitchExpressionNotExhaustive => "W2007",
            ErrorCode::SwitchExpressionNotExhaustiveForNull => "W2008",
            ErrorCode::SwitchExpressionNotExhaustiveWithWhen => "W2009",
            ErrorCode::RedundantPatternHidden => "H2001",
            ErrorCode::EscapeVariable => "E3001",
        }
    }

    /// Severity this code is reported with.
    pub fn default_severity(&self) -> Severity {
        match self.as_str().as_bytes().first() {
            Some(b'W') => Severity::Warning,
            Some(b'H') => Severity::Hidden,
            _ => Severity::Error,
        }
    }

    pub fn is_binding_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }

    pub fn is_reachability(&self) -> bool {
        self.as_str()[1..].starts_with('2')
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.default_severity(), Severity::Warning)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .iter()
            .find(|code| code.as_str() == s)
            .copied()
            .ok_or(())
    }
}

#[cfg(test)]
mod tests;
