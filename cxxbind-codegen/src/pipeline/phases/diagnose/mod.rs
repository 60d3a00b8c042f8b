//! Diagnose phase - reports problems of the generated module.

mod check;
pub mod checks;

pub use check::Check;
pub use checks::{DuplicateAliasCheck, NameCollisionCheck, UnexposedDependencyCheck};
use eyre::{Result, bail};

use crate::pipeline::{CompilationContext, Phase};

/// Phase that runs configurable checks over the created module.
pub struct DiagnosePhase {
    checks: Vec<Box<dyn Check>>,
}

impl DiagnosePhase {
    /// Create a new diagnose phase with the default checks.
    pub fn new() -> Self {
        Self {
            checks: vec![
                Box::new(UnexposedDependencyCheck),
                Box::new(DuplicateAliasCheck),
                Box::new(NameCollisionCheck),
            ],
        }
    }

    /// Create a diagnose phase with no checks.
    pub fn empty() -> Self {
        Self { checks: Vec::new() }
    }

    /// Add a custom check.
    pub fn with_check(mut self, check: impl Check + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Get the names of all checks that will be run.
    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }
}

impl Default for DiagnosePhase {
    fn default() -> Self {
        Self::new()
    }
}

impl Phase for DiagnosePhase {
    fn name(&self) -> &'static str {
        "diagnose"
    }

    fn description(&self) -> &'static str {
        "Report unexposed dependencies and conflicting names"
    }

    fn run(&self, ctx: &mut CompilationContext) -> Result<()> {
        let mut diagnostics = Vec::new();
        for check in &self.checks {
            check.check(ctx, &mut diagnostics);
        }
        ctx.diagnostics.extend(diagnostics);

        // Warnings are allowed
        if ctx.has_errors() {
            bail!("Generation failed with {} error(s)", ctx.error_count());
        }

        Ok(())
    }
}
