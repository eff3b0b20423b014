//! Diagnostic queue for collecting, deduplicating and sorting diagnostics.
//!
//! Features:
//! - Optional error limits
//! - Deduplication of the same diagnostic at the same real span
//! - Follow-on filtering of diagnostics that mention the error type

use sift_ir::Span;

use crate::Diagnostic;

/// Configuration for diagnostic processing.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DiagnosticConfig {
    /// Maximum number of errors kept (0 = unlimited).
    pub error_limit: usize,
    /// Drop diagnostics caused by an earlier binding error.
    pub filter_follow_on: bool,
    /// Drop a diagnostic identical to one already reported at the same
    /// primary span. Diagnostics without a real span are never dropped.
    pub deduplicate: bool,
}

/// Every problem of a batch is kept; only exact repeats and follow-on
/// errors are dropped.
impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            error_limit: 0,
            filter_follow_on: true,
            deduplicate: true,
        }
    }
}

impl DiagnosticConfig {
    /// Keep everything, follow-on errors and repeats included.
    pub fn unlimited() -> Self {
        DiagnosticConfig {
            error_limit: 0,
            filter_follow_on: false,
            deduplicate: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    config: DiagnosticConfig,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::with_config(DiagnosticConfig::default())
    }

    pub fn with_config(config: DiagnosticConfig) -> Self {
        DiagnosticQueue {
            diagnostics: Vec::new(),
            error_count: 0,
            config,
        }
    }

    /// Add a diagnostic. Returns `false` if it was filtered.
    pub fn add(&mut self, diag: Diagnostic) -> bool {
        let is_error = diag.is_error();

        if is_error && self.limit_reached() {
            return false;
        }

        if self.config.filter_follow_on && Self::is_follow_on(&diag) {
            return false;
        }

        if self.config.deduplicate && self.is_duplicate(&diag) {
            return false;
        }

        if is_error {
            self.error_count += 1;
        }
        self.diagnostics.push(diag);
        true
    }

    pub fn limit_reached(&self) -> bool {
        self.config.error_limit > 0 && self.error_count >= self.config.error_limit
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Sort diagnostics by primary span and return them, clearing the queue.
    ///
    /// The sort is stable, so diagnostics at the same position keep the
    /// order in which they were reported.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        let already_sorted = self
            .diagnostics
            .windows(2)
            .all(|w| Self::sort_key(&w[0]) <= Self::sort_key(&w[1]));
        if !already_sorted {
            self.diagnostics.sort_by_key(Self::sort_key);
        }
        self.error_count = 0;
        std::mem::take(&mut self.diagnostics)
    }

    fn sort_key(diag: &Diagnostic) -> (u32, u32) {
        let span = diag.primary_span().unwrap_or(Span::DUMMY);
        (span.start, span.end)
    }

    fn is_follow_on(diag: &Diagnostic) -> bool {
        diag.message.contains("<error>") || diag.args.iter().any(|arg| arg.contains("<error>"))
    }

    fn is_duplicate(&self, diag: &Diagnostic) -> bool {
        let Some(span) = diag.primary_span().filter(|span| *span != Span::DUMMY) else {
            return false;
        };
        self.diagnostics.iter().any(|existing| {
            existing.code == diag.code
                && existing.primary_span() == Some(span)
                && existing.args == diag.args
        })
    }
}
