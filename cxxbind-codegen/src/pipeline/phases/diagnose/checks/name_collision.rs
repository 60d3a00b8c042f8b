//! Check for distinct names mangled to the same identifier.

use super::super::Check;
use crate::pipeline::{CompilationContext, Diagnostic};

/// Check that reports every mangling collision of the pass.
pub struct NameCollisionCheck;

impl Check for NameCollisionCheck {
    fn name(&self) -> &'static str {
        "name-collision"
    }

    fn description(&self) -> &'static str {
        "Detect distinct names that mangle to the same identifier"
    }

    fn check(&self, ctx: &CompilationContext, diagnostics: &mut Vec<Diagnostic>) {
        for collision in &ctx.collisions {
            diagnostics.push(
                Diagnostic::warning(
                    "diagnose",
                    format!(
                        "'{}' and '{}' are both exposed as '{}'",
                        collision.first, collision.second, collision.mangled
                    ),
                )
                .at(collision.second.clone()),
            );
        }
    }
}
