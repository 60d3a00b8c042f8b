//! Generate operation - render the module and write it out.

use std::path::Path;

use cxxbind_codegen::{
    options::ModuleOptions,
    pipeline::{PhaseLog, Pipeline, Severity},
};
use cxxbind_decl::DeclGraph;
use eyre::{Context, Result};

use super::check::summarize;
use crate::reports::{GenerateReport, GenerationResult, PreviewFile, WrittenResult};

/// Options for the generate operation.
pub struct GenerateOptions<'a> {
    /// Module source to write. Support headers land in the same directory.
    pub output: &'a Path,
    /// Whether to preview without writing files.
    pub dry_run: bool,
}

/// Execute the generate operation.
pub fn generate(
    graph: DeclGraph,
    options: ModuleOptions,
    opts: GenerateOptions,
) -> Result<GenerateReport> {
    let ctx = Pipeline::new()
        .plugin(PhaseLog)
        .run(graph, options)
        .wrap_err("Generation failed")?;

    let warnings: Vec<String> = ctx
        .diagnostics
        .iter()
        .filter(|d| matches!(d.severity, Severity::Warning))
        .map(|d| match &d.location {
            Some(loc) => format!("{}\n  --> {}", d.message, loc),
            None => d.message.clone(),
        })
        .collect();

    // The module source comes first; the rest are support headers.
    let mut files = ctx.output_files()?;
    if let Some((name, _)) = files.first_mut() {
        *name = opts.output.display().to_string();
    }
    let dir = opts.output.parent().unwrap_or_else(|| Path::new(""));
    for (name, _) in files.iter_mut().skip(1) {
        *name = dir.join(&*name).display().to_string();
    }

    let result = if opts.dry_run {
        GenerationResult::Preview(
            files
                .into_iter()
                .map(|(path, content)| PreviewFile { path, content })
                .collect(),
        )
    } else {
        let mut written = Vec::new();
        for (path, content) in files {
            if let Some(parent) = Path::new(&path).parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, content).wrap_err_with(|| format!("Failed to write {}", path))?;
            tracing::debug!(file = %path, "written");
            written.push(path);
        }
        GenerationResult::Written(WrittenResult { files: written })
    };

    Ok(GenerateReport {
        summary: summarize(&ctx)?,
        warnings,
        result,
    })
}

#[cfg(test)]
mod tests {
    use cxxbind_codegen::testing::{geometry_graph, shape_graph};
    use cxxbind_decl::{
        Argument, CallableDecl, CallableKind, CppType, DeclGraph, Fundamental, TransformerSpec,
    };
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_generate_writes_module() {
        let dir = TempDir::new().expect("temp dir");
        let output = dir.path().join("out").join("geo.cpp");

        let report = generate(
            geometry_graph(),
            ModuleOptions::new("geo"),
            GenerateOptions {
                output: &output,
                dry_run: false,
            },
        )
        .expect("generated");

        let GenerationResult::Written(written) = &report.result else {
            panic!("expected written files");
        };
        assert_eq!(written.files, vec![output.display().to_string()]);
        let code = std::fs::read_to_string(&output).expect("module written");
        assert!(code.contains("BOOST_PYTHON_MODULE(geo){"));
        assert!(report.warnings.is_empty());
        assert_eq!(report.summary.wrappers, 2);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().expect("temp dir");
        let output = dir.path().join("shapes.cpp");

        let report = generate(
            shape_graph(),
            ModuleOptions::new("shapes"),
            GenerateOptions {
                output: &output,
                dry_run: true,
            },
        )
        .expect("generated");

        assert!(!output.exists());
        let GenerationResult::Preview(files) = &report.result else {
            panic!("expected a preview");
        };
        assert_eq!(files.len(), 1);
        assert!(files[0].content.contains("bp::pure_virtual( &::Shape::area )"));
    }

    #[test]
    fn test_support_header_lands_next_to_module() {
        let mut graph = DeclGraph::new();
        let fill = graph.add_callable(
            DeclGraph::ROOT,
            "fill",
            CallableDecl::new(CallableKind::FreeFunction)
                .returns(CppType::void())
                .arg(Argument::new(
                    "values",
                    CppType::fundamental(Fundamental::Double).pointer(),
                )),
        );
        graph[fill].config.transformers = vec![TransformerSpec::InputArray { arg: 1, size: 3 }];

        let dir = TempDir::new().expect("temp dir");
        let output = dir.path().join("fill.cpp");
        generate(
            graph,
            ModuleOptions::new("fill"),
            GenerateOptions {
                output: &output,
                dry_run: false,
            },
        )
        .expect("generated");

        assert!(output.exists());
        assert!(dir.path().join("__convenience.pypp.hpp").exists());
    }
}
