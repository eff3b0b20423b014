//! Options threaded through every check.

use std::str::FromStr;

use sift_dag::StringDispatchPolicy;
use sift_diagnostic::DiagnosticConfig;
use sift_ir::{Feature, FeatureSet, LanguageVersion, VersionParseError};

/// Caller-selected configuration for one compilation.
///
/// The feature set starts as the one implied by `version`; individual
/// features can then be switched on or off for experiments.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    pub version: LanguageVersion,
    pub features: FeatureSet,
    pub dispatch: StringDispatchPolicy,
    pub diagnostics: DiagnosticConfig,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self::for_version(LanguageVersion::LATEST)
    }
}

impl CompileOptions {
    pub fn for_version(version: LanguageVersion) -> Self {
        CompileOptions {
            version,
            features: version.features(),
            dispatch: StringDispatchPolicy::default(),
            diagnostics: DiagnosticConfig::default(),
        }
    }

    /// Options for a version given as text, e.g. `"9"` or `"latest"`.
    pub fn parse_version(text: &str) -> Result<Self, VersionParseError> {
        LanguageVersion::from_str(text).map(Self::for_version)
    }

    /// Switch language version, resetting the feature set to match.
    #[must_use]
    pub fn with_version(mut self, version: LanguageVersion) -> Self {
        self.version = version;
        self.features = version.features();
        self
    }

    #[must_use]
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features = self.features.with(feature);
        self
    }

    #[must_use]
    pub fn without_feature(mut self, feature: Feature) -> Self {
        self.features = self.features.without(feature);
        self
    }

    #[must_use]
    pub fn with_dispatch(mut self, dispatch: StringDispatchPolicy) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Turn length-based string dispatch off, forcing hash buckets above
    /// the threshold.
    #[must_use]
    pub fn without_length_based_switch(mut self) -> Self {
        self.dispatch = self.dispatch.with_length_based(false);
        self
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticConfig) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}
