//! Compilation context passed through pipeline phases.

use cxxbind_decl::{DeclGraph, DeclId};
use eyre::{Result, eyre};
use indexmap::IndexSet;

use super::diagnostic::{Diagnostic, Severity};
use crate::{
    code_repository, creators::CodeTree, exportability::ExportabilityTable, naming::NameCollision,
    options::ModuleOptions, ordering::EmissionOrder,
};

/// Context passed through all pipeline phases.
///
/// This struct carries the state of one generation pass through each
/// phase, accumulating results and diagnostics along the way.
#[derive(Debug)]
pub struct CompilationContext {
    /// The declaration graph being bound. Phases only read it.
    pub graph: DeclGraph,
    pub options: ModuleOptions,
    /// Exportability of every considered declaration (populated by PreparePhase).
    pub exportability: ExportabilityTable,
    /// Namespace-level declarations selected for export (populated by PreparePhase).
    pub candidates: Vec<DeclId>,
    /// Emission order of the candidates (populated by OrderPhase).
    pub order: Option<EmissionOrder>,
    /// The code-creator tree (populated by CreatePhase).
    pub tree: Option<CodeTree>,
    /// Declarations that received a node in the tree (populated by CreatePhase).
    pub exported: Vec<DeclId>,
    /// Mangled names claimed by more than one declaration.
    pub collisions: Vec<NameCollision>,
    /// Diagnostics collected during generation.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilationContext {
    /// Create a new compilation context.
    pub fn new(graph: DeclGraph, options: ModuleOptions) -> Self {
        Self {
            graph,
            options,
            exportability: ExportabilityTable::new(),
            candidates: Vec::new(),
            order: None,
            tree: None,
            exported: Vec::new(),
            collisions: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Check if any error diagnostics have been recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_error())
    }

    /// Check if any warning diagnostics have been recorded.
    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_warning())
    }

    /// Count the number of error diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity.is_error())
            .count()
    }

    /// Count the number of warning diagnostics.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity.is_warning())
            .count()
    }

    /// Add an error diagnostic.
    pub fn add_error(&mut self, phase: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(phase, message));
    }

    /// Add a warning diagnostic.
    pub fn add_warning(&mut self, phase: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::warning(phase, message));
    }

    /// Add an info diagnostic.
    pub fn add_info(&mut self, phase: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::info(phase, message));
    }

    /// Add a diagnostic with a location.
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Get all error diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d.severity, Severity::Error))
    }

    /// Get all warning diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d.severity, Severity::Warning))
    }

    /// The code-creator tree.
    ///
    /// # Errors
    ///
    /// Returns an error if CreatePhase hasn't run.
    pub fn tree(&self) -> Result<&CodeTree> {
        self.tree
            .as_ref()
            .ok_or_else(|| eyre!("code tree not set - did CreatePhase run?"))
    }

    /// Render the whole module.
    pub fn render(&self) -> Result<String> {
        let tree = self.tree()?;
        Ok(tree.render(tree.root()))
    }

    /// Headers the module needs, first seen first.
    pub fn required_headers(&self) -> Result<IndexSet<String>> {
        let tree = self.tree()?;
        Ok(tree.required_headers(tree.root()))
    }

    /// Every file of the generation pass as `(file name, contents)`: the
    /// module source followed by the support headers it includes.
    pub fn output_files(&self) -> Result<Vec<(String, String)>> {
        let mut files = vec![(self.options.output_file(), self.render()?)];
        for header in self.required_headers()? {
            if let Some(support) = code_repository::find(&header) {
                files.push((support.file_name.to_string(), support.code.to_string()));
            }
        }
        Ok(files)
    }

    /// Number of exported declarations matching `predicate`.
    pub fn exported_count(&self, predicate: impl Fn(&DeclGraph, DeclId) -> bool) -> usize {
        self.exported
            .iter()
            .filter(|id| predicate(&self.graph, **id))
            .count()
    }
}
