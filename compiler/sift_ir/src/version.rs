//! Language versions and the pattern features they unlock.
//!
//! Entry points take an explicit [`FeatureSet`]; nothing consults a global
//! version.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

/// Language version selected by the caller.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum LanguageVersion {
    V7,
    V7_1,
    V7_2,
    V7_3,
    V8,
    V9,
    V10,
    #[default]
    V11,
    Preview,
}

impl LanguageVersion {
    pub const LATEST: LanguageVersion = LanguageVersion::V11;

    pub const fn as_str(self) -> &'static str {
        match self {
            LanguageVersion::V7 => "7.0",
            LanguageVersion::V7_1 => "7.1",
            LanguageVersion::V7_2 => "7.2",
            LanguageVersion::V7_3 => "7.3",
            LanguageVersion::V8 => "8.0",
            LanguageVersion::V9 => "9.0",
            LanguageVersion::V10 => "10.0",
            LanguageVersion::V11 => "11.0",
            LanguageVersion::Preview => "preview",
        }
    }

    pub fn features(self) -> FeatureSet {
        FeatureSet::for_version(self)
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a language version string is not recognized.
#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
#[error("unrecognized language version `{0}`")]
pub struct VersionParseError(pub String);

impl FromStr for LanguageVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let version = match trimmed.to_ascii_lowercase().as_str() {
            "7" | "7.0" => LanguageVersion::V7,
            "7.1" => LanguageVersion::V7_1,
            "7.2" => LanguageVersion::V7_2,
            "7.3" => LanguageVersion::V7_3,
            "8" | "8.0" => LanguageVersion::V8,
            "9" | "9.0" => LanguageVersion::V9,
            "10" | "10.0" => LanguageVersion::V10,
            "11" | "11.0" | "latest" | "latestmajor" | "default" => LanguageVersion::LATEST,
            "preview" => LanguageVersion::Preview,
            _ => return Err(VersionParseError(trimmed.to_owned())),
        };
        Ok(version)
    }
}

/// A pattern-related language feature with a minimum version.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Feature {
    /// Type patterns whose type, or whose input type, is an open type parameter.
    GenericTypePatterns,
    /// Positional and property patterns.
    RecursivePatterns,
    /// `and`, `or`, `not` and parenthesized patterns.
    PatternCombinators,
    RelationalPatterns,
    /// `{ A.B: p }` member paths.
    ExtendedPropertyPatterns,
    ListPatterns,
    /// String constants matched against `Span<char>` / `ReadOnlySpan<char>`.
    SpanCharConstantPattern,
}

impl Feature {
    pub const fn required_version(self) -> LanguageVersion {
        match self {
            Feature::GenericTypePatterns => LanguageVersion::V7_1,
            Feature::RecursivePatterns => LanguageVersion::V8,
            Feature::PatternCombinators | Feature::RelationalPatterns => LanguageVersion::V9,
            Feature::ExtendedPropertyPatterns => LanguageVersion::V10,
            Feature::ListPatterns | Feature::SpanCharConstantPattern => LanguageVersion::V11,
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Feature::GenericTypePatterns => "pattern matching with generics",
            Feature::RecursivePatterns => "recursive patterns",
            Feature::PatternCombinators => "pattern combinators",
            Feature::RelationalPatterns => "relational patterns",
            Feature::ExtendedPropertyPatterns => "extended property patterns",
            Feature::ListPatterns => "list pattern",
            Feature::SpanCharConstantPattern => "pattern matching ReadOnly/Span<char> on constant string",
        }
    }

    const fn flag(self) -> FeatureSet {
        match self {
            Feature::GenericTypePatterns => FeatureSet::GENERIC_TYPE_PATTERNS,
            Feature::RecursivePatterns => FeatureSet::RECURSIVE_PATTERNS,
            Feature::PatternCombinators => FeatureSet::PATTERN_COMBINATORS,
            Feature::RelationalPatterns => FeatureSet::RELATIONAL_PATTERNS,
            Feature::ExtendedPropertyPatterns => FeatureSet::EXTENDED_PROPERTY_PATTERNS,
            Feature::ListPatterns => FeatureSet::LIST_PATTERNS,
            Feature::SpanCharConstantPattern => FeatureSet::SPAN_CHAR_CONSTANT_PATTERN,
        }
    }

    pub const ALL: [Feature; 7] = [
        Feature::GenericTypePatterns,
        Feature::RecursivePatterns,
        Feature::PatternCombinators,
        Feature::RelationalPatterns,
        Feature::ExtendedPropertyPatterns,
        Feature::ListPatterns,
        Feature::SpanCharConstantPattern,
    ];
}

bitflags! {
    /// Immutable set of enabled pattern features.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct FeatureSet: u16 {
        const GENERIC_TYPE_PATTERNS = 1 << 0;
        const RECURSIVE_PATTERNS = 1 << 1;
        const PATTERN_COMBINATORS = 1 << 2;
        const RELATIONAL_PATTERNS = 1 << 3;
        const EXTENDED_PROPERTY_PATTERNS = 1 << 4;
        const LIST_PATTERNS = 1 << 5;
        const SPAN_CHAR_CONSTANT_PATTERN = 1 << 6;
    }
}

impl FeatureSet {
    /// Every feature whose required version is at most `version`.
    pub fn for_version(version: LanguageVersion) -> Self {
        Feature::ALL
            .iter()
            .filter(|feature| feature.required_version() <= version)
            .fold(FeatureSet::empty(), |set, feature| set | feature.flag())
    }

    #[inline]
    pub fn has(self, feature: Feature) -> bool {
        self.contains(feature.flag())
    }

    #[must_use]
    pub fn with(self, feature: Feature) -> Self {
        self | feature.flag()
    }

    #[must_use]
    pub fn without(self, feature: Feature) -> Self {
        self - feature.flag()
    }
}

impl Default for FeatureSet {
    fn default() -> Self {
        FeatureSet::for_version(LanguageVersion::default())
    }
}
