//! Check for exported declarations that use unexported ones.

use super::super::Check;
use crate::{
    dependencies::DependencyManager,
    pipeline::{CompilationContext, Diagnostic},
};

/// Check that warns once per unexported declaration that exported code
/// depends on.
pub struct UnexposedDependencyCheck;

impl Check for UnexposedDependencyCheck {
    fn name(&self) -> &'static str {
        "unexposed-dependency"
    }

    fn description(&self) -> &'static str {
        "Detect exported declarations depending on unexported ones"
    }

    fn check(&self, ctx: &CompilationContext, diagnostics: &mut Vec<Diagnostic>) {
        diagnostics.extend(DependencyManager::new(&ctx.graph, &ctx.exported).diagnostics());
    }
}
