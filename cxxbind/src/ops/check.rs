//! Check operation - a generation pass without output.

use std::path::Path;

use cxxbind_codegen::{
    creators::NodeKind,
    options::ModuleOptions,
    pipeline::{CompilationContext, PhaseLog, Pipeline, Severity},
};
use cxxbind_decl::DeclGraph;
use eyre::{Context, Result};

use crate::reports::{CheckReport, ModuleSummary};

/// Execute the check operation.
///
/// Runs the pipeline and returns its diagnostics with a module summary.
pub fn check(graph: DeclGraph, options: ModuleOptions, config_path: &Path) -> Result<CheckReport> {
    let ctx = Pipeline::new()
        .plugin(PhaseLog)
        .run(graph, options)
        .wrap_err("Generation failed")?;

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut infos = Vec::new();

    for diag in &ctx.diagnostics {
        let msg = if let Some(loc) = &diag.location {
            format!("{}\n  --> {}", diag.message, loc)
        } else {
            diag.message.clone()
        };

        match diag.severity {
            Severity::Error => errors.push(msg),
            Severity::Warning => warnings.push(msg),
            Severity::Info => infos.push(msg),
        }
    }

    Ok(CheckReport {
        config_path: config_path.to_path_buf(),
        summary: summarize(&ctx)?,
        errors,
        warnings,
        infos,
    })
}

/// Count what a finished pass exported.
pub(crate) fn summarize(ctx: &CompilationContext) -> Result<ModuleSummary> {
    let tree = ctx.tree()?;
    let wrappers = tree
        .descendants(tree.root())
        .into_iter()
        .filter(|id| matches!(tree.kind(*id), Some(NodeKind::ClassWrapper(_))))
        .count();

    Ok(ModuleSummary {
        module: ctx.options.name.clone(),
        classes: ctx.exported_count(|graph, id| graph.is_class(id)),
        functions: ctx.exported_count(|graph, id| graph.as_callable(id).is_some()),
        wrappers,
    })
}

#[cfg(test)]
mod tests {
    use cxxbind_codegen::testing::{geometry_graph, shape_graph};

    use super::*;

    #[test]
    fn test_check_shape() {
        let report = check(
            shape_graph(),
            ModuleOptions::new("shapes"),
            Path::new("cxxbind.toml"),
        )
        .expect("check runs");

        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
        assert_eq!(report.summary.module, "shapes");
        assert_eq!(report.summary.classes, 1);
        assert_eq!(report.summary.wrappers, 1);
    }

    #[test]
    fn test_check_reports_locations() {
        let mut graph = geometry_graph();
        let shape = graph.find_all("::geo::Shape")[0];
        graph[shape].config.ignore = true;

        let report = check(graph, ModuleOptions::new("geo"), Path::new("cxxbind.toml"))
            .expect("check runs");
        assert!(report.is_valid());
        assert!(
            report
                .warnings
                .iter()
                .any(|w| w.ends_with("\n  --> ::geo::Shape") && w.contains("::geo::Circle (base class)"))
        );
    }
}
