//! Phase hooks and the plugins shipped with the pipeline.

use eyre::Result;

use super::CompilationContext;

/// Hooks run around every phase of a [`Pipeline`](super::Pipeline).
///
/// A plugin sees the context before and after each phase and may adjust it,
/// e.g. forcing `always_expose_using_scope` on every class before `create`.
/// Returning an error aborts the pass.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    #[allow(unused_variables)]
    fn on_before_phase(&self, phase: &str, ctx: &mut CompilationContext) -> Result<()> {
        Ok(())
    }

    #[allow(unused_variables)]
    fn on_after_phase(&self, phase: &str, ctx: &mut CompilationContext) -> Result<()> {
        Ok(())
    }
}

/// Logs what each built-in phase produced at `debug` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhaseLog;

impl PhaseLog {
    /// One line describing the state `phase` left behind, `None` for phases
    /// this plugin does not know.
    pub fn summary(phase: &str, ctx: &CompilationContext) -> Option<String> {
        let line = match phase {
            "prepare" => format!(
                "candidates: {}, not exportable: {}",
                ctx.candidates.len(),
                ctx.diagnostics.iter().filter(|d| d.phase == "prepare").count()
            ),
            "order" => {
                let order = ctx.order.as_ref()?;
                format!(
                    "ordered: {}, dependency cycles: {}",
                    order.declarations.len(),
                    order.back_edges.len()
                )
            }
            "create" => format!(
                "exported: {}, tree nodes: {}",
                ctx.exported.len(),
                ctx.tree.as_ref().map_or(0, |tree| tree.len())
            ),
            "diagnose" => format!(
                "errors: {}, warnings: {}",
                ctx.error_count(),
                ctx.warning_count()
            ),
            _ => return None,
        };
        Some(line)
    }
}

impl Plugin for PhaseLog {
    fn name(&self) -> &'static str {
        "phase-log"
    }

    fn on_after_phase(&self, phase: &str, ctx: &mut CompilationContext) -> Result<()> {
        if let Some(summary) = Self::summary(phase, ctx) {
            tracing::debug!(module = %ctx.options.name, phase, "{}", summary);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cxxbind_decl::{CallableDecl, CallableKind, CppType, DeclGraph, Fundamental};

    use super::*;
    use crate::{options::ModuleOptions, pipeline::Pipeline};

    fn graph() -> DeclGraph {
        let mut graph = DeclGraph::new();
        graph.add_class(DeclGraph::ROOT, "Point");
        graph.add_callable(
            DeclGraph::ROOT,
            "origin",
            CallableDecl::new(CallableKind::FreeFunction)
                .returns(CppType::fundamental(Fundamental::Int).pointer()),
        );
        graph
    }

    #[test]
    fn test_phase_log_summaries() {
        let ctx = Pipeline::new()
            .plugin(PhaseLog)
            .run(graph(), ModuleOptions::new("geo"))
            .expect("pipeline should succeed");

        assert_eq!(
            PhaseLog::summary("order", &ctx).as_deref(),
            Some("ordered: 2, dependency cycles: 0")
        );
        let create = PhaseLog::summary("create", &ctx).expect("create summary");
        assert!(create.starts_with("exported: 1, tree nodes: "), "{create}");
        assert!(ctx.has_warnings());
        assert_eq!(
            PhaseLog::summary("diagnose", &ctx),
            Some(format!("errors: 0, warnings: {}", ctx.warning_count()))
        );
        assert_eq!(PhaseLog::summary("custom", &ctx), None);
    }
}
