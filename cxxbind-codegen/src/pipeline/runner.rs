//! Pipeline orchestrator.

use std::sync::Arc;

use cxxbind_decl::DeclGraph;
use eyre::Result;

use super::{
    CompilationContext, Phase, Plugin,
    phases::{CreatePhase, DiagnosePhase, OrderPhase, PreparePhase},
};
use crate::{call_policies::CallPolicyResolver, options::ModuleOptions};

/// The generation pipeline orchestrator.
///
/// The pipeline manages the execution of generation phases and plugin hooks.
/// It runs built-in phases (prepare, order, create, diagnose) followed by any
/// user phases, calling plugin hooks before and after each phase.
///
/// # Example
///
/// ```ignore
/// let pipeline = Pipeline::new()
///     .resolver(CallPolicyResolver::default().rule(MyRule))
///     .plugin(MyPlugin::new());
///
/// let ctx = pipeline.run(graph, options)?;
/// ```
pub struct Pipeline {
    phases: Vec<Box<dyn Phase>>,
    plugins: Vec<Box<dyn Plugin>>,
    resolver: Arc<CallPolicyResolver>,
}

impl Pipeline {
    /// Create a new pipeline with the default call-policy rules.
    pub fn new() -> Self {
        Self {
            phases: Vec::new(),
            plugins: Vec::new(),
            resolver: Arc::new(CallPolicyResolver::default()),
        }
    }

    /// Add a phase to run after the built-in phases.
    pub fn phase(mut self, phase: impl Phase + 'static) -> Self {
        self.phases.push(Box::new(phase));
        self
    }

    /// Add a plugin to receive phase lifecycle hooks.
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Replace the call-policy rule chain used by the create phase.
    pub fn resolver(mut self, resolver: CallPolicyResolver) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Run the pipeline on a declaration graph.
    ///
    /// Executes all phases in order:
    /// 1. PreparePhase - selects candidates, records exportability
    /// 2. OrderPhase - computes the emission order
    /// 3. CreatePhase - builds the code-creator tree
    /// 4. DiagnosePhase - reports dependency and naming problems
    /// 5. User phases (if any)
    ///
    /// Plugin hooks are called before and after each phase.
    ///
    /// # Errors
    ///
    /// Returns an error if any phase fails fatally.
    pub fn run(&self, graph: DeclGraph, options: ModuleOptions) -> Result<CompilationContext> {
        let mut ctx = CompilationContext::new(graph, options);

        let builtin_phases: Vec<Box<dyn Phase>> = vec![
            Box::new(PreparePhase),
            Box::new(OrderPhase),
            Box::new(CreatePhase::new(Arc::clone(&self.resolver))),
            Box::new(DiagnosePhase::new()),
        ];

        for phase in builtin_phases.iter().chain(self.phases.iter()) {
            self.run_phase(phase.as_ref(), &mut ctx)?;
        }

        Ok(ctx)
    }

    /// Run a single phase with plugin hooks.
    fn run_phase(&self, phase: &dyn Phase, ctx: &mut CompilationContext) -> Result<()> {
        let phase_name = phase.name();

        for plugin in &self.plugins {
            plugin.on_before_phase(phase_name, ctx)?;
        }

        tracing::debug!(phase = phase_name, "{}", phase.description());
        phase.run(ctx)?;

        for plugin in &self.plugins {
            plugin.on_after_phase(phase_name, ctx)?;
        }

        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use cxxbind_decl::{CallableDecl, CallableKind, CppType, Fundamental};

    use super::*;
    use crate::pipeline::Diagnostic;

    struct CountingPlugin {
        before_count: Arc<AtomicUsize>,
        after_count: Arc<AtomicUsize>,
    }

    impl CountingPlugin {
        fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let before = Arc::new(AtomicUsize::new(0));
            let after = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    before_count: before.clone(),
                    after_count: after.clone(),
                },
                before,
                after,
            )
        }
    }

    impl Plugin for CountingPlugin {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn on_before_phase(&self, _phase: &str, _ctx: &mut CompilationContext) -> Result<()> {
            self.before_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_after_phase(&self, _phase: &str, _ctx: &mut CompilationContext) -> Result<()> {
            self.after_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn make_test_graph() -> DeclGraph {
        let mut graph = DeclGraph::new();
        graph.add_callable(
            DeclGraph::ROOT,
            "answer",
            CallableDecl::new(CallableKind::FreeFunction)
                .returns(CppType::fundamental(Fundamental::Int)),
        );
        graph
    }

    #[test]
    fn test_pipeline_runs_phases() {
        let pipeline = Pipeline::new();

        let ctx = pipeline
            .run(make_test_graph(), ModuleOptions::new("test"))
            .expect("pipeline should succeed");

        assert!(ctx.order.is_some());
        assert!(ctx.tree.is_some());
        assert_eq!(ctx.exported.len(), 1);
        assert!(ctx.render().expect("rendered").contains("\"answer\""));
    }

    #[test]
    fn test_pipeline_plugin_hooks() {
        let (plugin, before_count, after_count) = CountingPlugin::new();

        let pipeline = Pipeline::new().plugin(plugin);
        let _ = pipeline
            .run(make_test_graph(), ModuleOptions::new("test"))
            .expect("pipeline should succeed");

        // 4 built-in phases = 4 before + 4 after hooks
        assert_eq!(before_count.load(Ordering::SeqCst), 4);
        assert_eq!(after_count.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_custom_resolver() {
        let pipeline = Pipeline::new().resolver(CallPolicyResolver::empty());

        let ctx = pipeline
            .run(make_test_graph(), ModuleOptions::new("test"))
            .expect("pipeline should succeed");

        assert!(ctx.has_warnings());
        assert!(!ctx.render().expect("rendered").contains("\"answer\""));
    }

    struct IncludeReport;

    impl Phase for IncludeReport {
        fn name(&self) -> &'static str {
            "includes"
        }

        fn description(&self) -> &'static str {
            "Report the headers the module includes"
        }

        fn run(&self, ctx: &mut CompilationContext) -> Result<()> {
            let headers = ctx.required_headers()?.into_iter().collect::<Vec<_>>().join(", ");
            ctx.add_diagnostic(Diagnostic::info(self.name(), headers));
            Ok(())
        }
    }

    #[test]
    fn test_user_phase_runs_after_builtin_phases() {
        let (plugin, before_count, _) = CountingPlugin::new();
        let ctx = Pipeline::new()
            .phase(IncludeReport)
            .plugin(plugin)
            .run(make_test_graph(), ModuleOptions::new("test"))
            .expect("pipeline should succeed");

        assert_eq!(before_count.load(Ordering::SeqCst), 5);
        let last = ctx.diagnostics.last().expect("include report");
        assert_eq!(last.phase, "includes");
        let headers = ctx.required_headers().expect("tree created");
        assert_eq!(last.message, headers.into_iter().collect::<Vec<_>>().join(", "));
    }
}
