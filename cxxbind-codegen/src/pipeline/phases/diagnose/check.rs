//! Check trait for post-creation diagnostics.

use crate::pipeline::{CompilationContext, Diagnostic};

/// A check that inspects a finished generation pass for problems.
pub trait Check: Send + Sync {
    /// The name of this check.
    fn name(&self) -> &'static str;

    /// A human-readable description of what this check looks for.
    fn description(&self) -> &'static str;

    /// Inspect the context and add any diagnostics.
    fn check(&self, ctx: &CompilationContext, diagnostics: &mut Vec<Diagnostic>);
}
