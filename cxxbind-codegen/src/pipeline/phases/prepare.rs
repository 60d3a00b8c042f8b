//! Prepare phase - selects the declarations to bind.

use cxxbind_decl::{DeclGraph, DeclId, DeclKind};
use eyre::Result;

use crate::{
    exportability,
    pipeline::{CompilationContext, Diagnostic, Phase},
};

/// Phase that walks the namespaces of the graph, drops ignored declarations
/// and records the exportability of everything else.
///
/// Namespace-level declarations that can be bound become the candidates of
/// the pass. Unexportable declarations are reported as warnings keyed by
/// their full name.
pub struct PreparePhase;

impl PreparePhase {
    fn visit_scope(&self, ctx: &mut CompilationContext, scope: DeclId) {
        let members = ctx.graph.members(scope).to_vec();
        for id in members {
            if matches!(ctx.graph[id].kind, DeclKind::Namespace { .. }) {
                if !ctx.graph.is_std_decl(id) && !ctx.graph[id].config.ignore {
                    self.visit_scope(ctx, id);
                }
                continue;
            }
            if ctx.graph.is_std_decl(id) {
                continue;
            }
            if self.record(ctx, id) {
                ctx.candidates.push(id);
            }
        }
    }

    /// Record the exportability of `id`, descending into classes. Returns
    /// whether `id` can be bound.
    fn record(&self, ctx: &mut CompilationContext, id: DeclId) -> bool {
        if exportability::is_excluded(&ctx.graph, id) {
            tracing::trace!(declaration = %ctx.graph.full_name(id), "excluded");
            return false;
        }
        let verdict = exportability::check(&ctx.graph, &ctx.options, id);
        let exportable = verdict.is_exportable();
        if let Some(reason) = verdict.reason() {
            let location = ctx.graph.full_name(id);
            tracing::debug!(declaration = %location, reason, "not exportable");
            ctx.add_diagnostic(Diagnostic::warning(self.name(), reason).at(location));
        }
        ctx.exportability.insert(id, verdict);

        if exportable && ctx.graph.is_class(id) {
            for member in exportability::candidate_members(&ctx.graph, id) {
                self.record(ctx, member);
            }
        }
        exportable
    }
}

impl Phase for PreparePhase {
    fn name(&self) -> &'static str {
        "prepare"
    }

    fn description(&self) -> &'static str {
        "Select candidate declarations and compute their exportability"
    }

    fn run(&self, ctx: &mut CompilationContext) -> Result<()> {
        self.visit_scope(ctx, DeclGraph::ROOT);
        tracing::debug!(
            candidates = ctx.candidates.len(),
            considered = ctx.exportability.len(),
            "declarations prepared"
        );
        Ok(())
    }
}
