//! Diagnostic system for pattern-matching analysis.
//!
//! Every diagnostic has:
//! - An error code for searchability
//! - A severity (error, warning or hidden)
//! - A message plus its arguments
//! - A primary span, and optional secondary labels and notes
//!
//! Passes accumulate diagnostics in a [`DiagnosticQueue`] and hand the batch
//! back to the caller; nothing is thrown.

mod diagnostic;
mod error_code;
mod queue;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use queue::{DiagnosticConfig, DiagnosticQueue};
