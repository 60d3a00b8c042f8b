//! The creator factory.
//!
//! Walks the ordered export set and builds the code-creator tree: one
//! registration node per class, enumeration, function and variable, plus
//! the wrapper classes and shims that virtual dispatch and protected access
//! need. Both the call-policy resolver and the name mangler are handed in
//! by the caller.
//!
//! ```ignore
//! let resolver = CallPolicyResolver::default();
//! let creation = CreatorFactory::new(&graph, &options, &table, &resolver, NameMangler::new())
//!     .create(&order.declarations)?;
//! println!("{}", creation.tree.render(creation.tree.root()));
//! ```

mod calldef;
mod class;
mod other;

use std::collections::{HashMap, HashSet};

use cxxbind_decl::{CallableKind, DeclGraph, DeclId, DeclKind};

use crate::{
    call_policies::CallPolicyResolver,
    creators::{CodeTree, NodeId, TreeError},
    exportability::{self, ExportabilityTable},
    naming::{NameCollision, NameMangler, is_valid_identifier},
    options::ModuleOptions,
    pipeline::Diagnostic,
    transformers::TransformError,
};

/// Fatal errors of a creation pass.
#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Everything a creation pass produces.
#[derive(Debug)]
pub struct Creation {
    pub tree: CodeTree,
    /// Declarations that received a node, in creation order.
    pub exported: Vec<DeclId>,
    pub diagnostics: Vec<Diagnostic>,
    pub collisions: Vec<NameCollision>,
}

const PHASE: &str = "create";

/// Builds the code-creator tree for one module.
pub struct CreatorFactory<'a> {
    graph: &'a DeclGraph,
    options: &'a ModuleOptions,
    exportability: &'a ExportabilityTable,
    resolver: &'a CallPolicyResolver,
    mangler: NameMangler,
    /// Class registrations, by class.
    class_nodes: HashMap<DeclId, NodeId>,
    /// Wrapper classes, by wrapped class.
    wrappers: HashMap<DeclId, NodeId>,
    /// `staticmethod` names already requested per class node.
    static_methods: HashMap<NodeId, Vec<String>>,
    /// Names of generated functions, qualified by their scope.
    generated_names: HashSet<String>,
    exported: Vec<DeclId>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> CreatorFactory<'a> {
    pub fn new(
        graph: &'a DeclGraph,
        options: &'a ModuleOptions,
        exportability: &'a ExportabilityTable,
        resolver: &'a CallPolicyResolver,
        mangler: NameMangler,
    ) -> Self {
        Self {
            graph,
            options,
            exportability,
            resolver,
            mangler,
            class_nodes: HashMap::new(),
            wrappers: HashMap::new(),
            static_methods: HashMap::new(),
            generated_names: HashSet::new(),
            exported: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Build the module tree for `declarations`, which must already be in
    /// emission order.
    pub fn create(mut self, declarations: &[DeclId]) -> Result<Creation, CreateError> {
        let mut tree = CodeTree::module(
            &self.options.name,
            self.options.license.as_deref(),
            &self.options.boost_python_ns,
        )?;
        let body = tree.body().ok_or(TreeError::UnknownNode(tree.root()))?;

        for id in declarations {
            self.visit(&mut tree, body, *id)?;
        }
        self.create_indexing_suites(&mut tree, body)?;
        self.create_includes(&mut tree)?;

        tracing::debug!(
            exported = self.exported.len(),
            wrappers = self.wrappers.len(),
            nodes = tree.len(),
            "code-creator tree built"
        );
        Ok(Creation {
            tree,
            exported: self.exported,
            diagnostics: self.diagnostics,
            collisions: self.mangler.collisions().to_vec(),
        })
    }

    fn visit(&mut self, tree: &mut CodeTree, body: NodeId, id: DeclId) -> Result<(), CreateError> {
        if !self.is_exportable(id) {
            return Ok(());
        }
        match &self.graph[id].kind {
            DeclKind::Class(_) => self.create_class(tree, body, id),
            DeclKind::Enum(_) => self.create_enum(tree, body, id),
            DeclKind::Callable(c) => match c.kind {
                CallableKind::FreeFunction => self.create_free_function(tree, body, id),
                CallableKind::FreeOperator { .. } => self.create_free_operator(tree, id),
                _ => Ok(()),
            },
            DeclKind::Variable(_) => self.create_global_variable(tree, body, id),
            DeclKind::Namespace { .. } | DeclKind::Typedef { .. } => Ok(()),
        }
    }

    /// Whether `id` takes part in the module at all.
    fn is_exportable(&self, id: DeclId) -> bool {
        if exportability::is_excluded(self.graph, id) {
            return false;
        }
        match self.exportability.get(&id) {
            Some(exportability) => exportability.is_exportable(),
            None => exportability::check(self.graph, self.options, id).is_exportable(),
        }
    }

    /// Name seen from Python. Invalid identifiers are mangled.
    fn alias(&mut self, id: DeclId) -> String {
        let alias = self.graph.alias(id);
        if is_valid_identifier(alias) {
            alias.to_string()
        } else {
            self.mangler.mangle(alias)
        }
    }

    /// Identifier unique across the module for a class: its qualified name,
    /// mangled.
    fn exposer(&mut self, class: DeclId) -> String {
        let full_name = self.graph.full_name(class);
        self.mangler.mangle(full_name.trim_start_matches("::"))
    }

    /// `base`, or `base_2`, `base_3`, ... when already taken in `scope`.
    fn unique_name(&mut self, scope: &str, base: &str) -> String {
        let mut name = base.to_string();
        let mut counter = 1;
        while !self.generated_names.insert(format!("{}::{}", scope, name)) {
            counter += 1;
            name = format!("{}_{}", base, counter);
        }
        name
    }

    fn warn(&mut self, id: DeclId, message: impl Into<String>) {
        let location = self.graph.full_name(id);
        let message = message.into();
        tracing::debug!(declaration = %location, %message, "declaration skipped");
        self.diagnostics
            .push(Diagnostic::warning(PHASE, message).at(location));
    }
}

#[cfg(test)]
mod tests {
    use cxxbind_decl::{Argument, CallableDecl, CppType, Fundamental};

    use super::*;

    pub(super) fn create(graph: &DeclGraph, options: &ModuleOptions) -> Creation {
        let table = ExportabilityTable::new();
        let resolver = CallPolicyResolver::default();
        let mut candidates: Vec<DeclId> = graph.members(DeclGraph::ROOT).to_vec();
        candidates.retain(|id| !graph.is_std_decl(*id));
        let order = crate::ordering::order(graph, &candidates);
        CreatorFactory::new(graph, options, &table, &resolver, NameMangler::new())
            .create(&order.declarations)
            .expect("creation succeeds")
    }

    pub(super) fn render(creation: &Creation) -> String {
        creation.tree.render(creation.tree.root())
    }

    #[test]
    fn test_unique_names() {
        let graph = DeclGraph::new();
        let options = ModuleOptions::new("m");
        let table = ExportabilityTable::new();
        let resolver = CallPolicyResolver::default();
        let mut factory =
            CreatorFactory::new(&graph, &options, &table, &resolver, NameMangler::new());
        assert_eq!(factory.unique_name("", "_py_f"), "_py_f");
        assert_eq!(factory.unique_name("", "_py_f"), "_py_f_2");
        assert_eq!(factory.unique_name("A_wrapper", "_py_f"), "_py_f");
    }

    #[test]
    fn test_non_exportable_declarations_are_skipped() {
        let mut graph = DeclGraph::new();
        let f = graph.add_callable(
            DeclGraph::ROOT,
            "fill",
            CallableDecl::new(CallableKind::FreeFunction).arg(Argument::new(
                "v",
                CppType::fundamental(Fundamental::Int).array(Some(3)),
            )),
        );
        let creation = create(&graph, &ModuleOptions::new("m"));
        assert!(!creation.exported.contains(&f));
        assert!(!render(&creation).contains("fill"));
    }

    #[test]
    fn test_invalid_aliases_are_mangled() {
        let mut graph = DeclGraph::new();
        let class = graph.add_class(DeclGraph::ROOT, "vector<int>");
        let options = ModuleOptions::new("m");
        let table = ExportabilityTable::new();
        let resolver = CallPolicyResolver::default();
        let mut factory =
            CreatorFactory::new(&graph, &options, &table, &resolver, NameMangler::new());
        assert_eq!(factory.alias(class), "vector_less_int_grate_");
        assert_eq!(factory.exposer(class), "vector_less_int_grate_");
    }
}
