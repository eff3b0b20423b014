//! Escape checking for variables bound over ref-like values.
//!
//! Each temp gets the safe context of the storage it reads from: a
//! ref-like temp inherits its receiver's context (the scrutinee's, at the
//! root), and any other value may flow anywhere. A variable's context is
//! that of the temp it is bound to.

use sift_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};
use sift_ir::{Clause, ClauseId, DecisionDag, SafeContext, Scrutinee, TempTable};
use sift_types::TypeTable;

/// Safe context of every temp, indexed by temp.
pub fn temp_contexts(
    types: &TypeTable,
    temps: &TempTable,
    scrutinee: SafeContext,
) -> Vec<SafeContext> {
    let mut contexts: Vec<SafeContext> = Vec::with_capacity(temps.len());
    // Parents are always registered before their children.
    for (_, temp) in temps.iter() {
        let context = if !types.is_ref_like(temp.ty) {
            SafeContext::CALLING_METHOD
        } else {
            temp.parent
                .and_then(|parent| contexts.get(parent.index()).copied())
                .unwrap_or(scrutinee)
        };
        contexts.push(context);
    }
    contexts
}

/// Report uses that move a pattern variable to a wider context than its own.
///
/// Returns the number of violations found.
pub fn check_escapes(
    types: &TypeTable,
    scrutinee: &Scrutinee,
    dag: &DecisionDag,
    clauses: &[Clause],
    diagnostics: &mut DiagnosticQueue,
) -> usize {
    let contexts = temp_contexts(types, &dag.temps, scrutinee.safe_context);
    let mut violations = 0;
    for (index, clause) in clauses.iter().enumerate() {
        let id = ClauseId::new(u32::try_from(index).unwrap_or(u32::MAX));
        let bindings = dag.bindings_of(id);
        for escape in &clause.uses {
            let Some(binding) = bindings.iter().find(|binding| binding.name == escape.name) else {
                continue;
            };
            let context = contexts
                .get(binding.temp.index())
                .copied()
                .unwrap_or(SafeContext::CALLING_METHOD);
            if context.can_flow_to(escape.destination) {
                continue;
            }
            let name = types.name_text(escape.name);
            tracing::debug!(
                variable = name,
                %context,
                destination = %escape.destination,
                "pattern variable escapes"
            );
            diagnostics.add(
                Diagnostic::error(ErrorCode::EscapeVariable)
                    .with_message(format!(
                        "cannot use variable '{name}' in this context because it may expose referenced variables outside of their declaration scope"
                    ))
                    .with_arg(name)
                    .with_label(escape.span, format!("'{name}' escapes to the {}", escape.destination))
                    .with_secondary_label(clause.pattern.span, format!("bound here, valid within the {context}")),
            );
            violations += 1;
        }
    }
    violations
}

#[cfg(test)]
mod tests;
