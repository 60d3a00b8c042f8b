//! Order phase - sorts the candidates into emission order.

use eyre::Result;

use crate::{
    ordering,
    pipeline::{CompilationContext, Diagnostic, Phase},
};

/// Phase that computes the emission order of the candidates.
///
/// Circular class dependencies are accepted in first-encounter order; each
/// edge closing a cycle is reported as an info diagnostic.
pub struct OrderPhase;

impl Phase for OrderPhase {
    fn name(&self) -> &'static str {
        "order"
    }

    fn description(&self) -> &'static str {
        "Sort declarations so that bases and default argument types come first"
    }

    fn run(&self, ctx: &mut CompilationContext) -> Result<()> {
        let order = ordering::order(&ctx.graph, &ctx.candidates);
        for (class, dependency) in &order.back_edges {
            let class_name = ctx.graph.full_name(*class);
            let message = format!(
                "circular dependency between {} and {}; emitted in first-encounter order",
                class_name,
                ctx.graph.full_name(*dependency)
            );
            ctx.add_diagnostic(Diagnostic::info(self.name(), message).at(class_name));
        }
        ctx.order = Some(order);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cxxbind_decl::{Argument, CallableDecl, CallableKind, CppType, DeclGraph};

    use super::*;
    use crate::{options::ModuleOptions, pipeline::Severity};

    #[test]
    fn test_cycles_are_reported_as_info() {
        let mut graph = DeclGraph::new();
        let a = graph.add_class(DeclGraph::ROOT, "A");
        let b = graph.add_class(DeclGraph::ROOT, "B");
        for (class, other) in [(a, b), (b, a)] {
            graph.add_callable(
                class,
                "f",
                CallableDecl::new(CallableKind::MemberFunction).arg(
                    Argument::new("o", CppType::Declared(other).constant().reference())
                        .with_default("Other()"),
                ),
            );
        }

        let mut ctx = CompilationContext::new(graph, ModuleOptions::new("m"));
        ctx.candidates = vec![a, b];
        OrderPhase.run(&mut ctx).expect("order succeeds");

        let order = ctx.order.as_ref().expect("order set");
        assert_eq!(order.declarations.len(), 2);
        assert_eq!(ctx.diagnostics.len(), 1);
        assert_eq!(ctx.diagnostics[0].severity, Severity::Info);
        assert_eq!(
            ctx.diagnostics[0].message,
            "circular dependency between ::B and ::A; emitted in first-encounter order"
        );
        assert!(!ctx.has_warnings());
    }
}
