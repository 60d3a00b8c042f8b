//! Exported declarations that depend on unexported ones.
//!
//! After creation, every exported declaration is checked against the
//! declarations it structurally depends on. A dependency that did not make it
//! into the module leaves the generated code referring to a type Python knows
//! nothing about. Such problems are grouped by the missing declaration and
//! reported as warnings; generation is never blocked.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use cxxbind_decl::{CallPolicy, DeclGraph, DeclId, DeclKind, Dependency, DependencyReason};

use crate::pipeline::Diagnostic;

const PHASE: &str = "diagnose";

/// One unexported declaration and everything exported that uses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnexposedDependency {
    pub target: DeclId,
    /// Dependents, sorted by full name.
    pub dependents: Vec<Dependency>,
}

pub struct DependencyManager<'a> {
    graph: &'a DeclGraph,
    exported: HashSet<DeclId>,
    order: Vec<DeclId>,
}

impl<'a> DependencyManager<'a> {
    pub fn new(graph: &'a DeclGraph, exported: &[DeclId]) -> Self {
        let mut seen = HashSet::new();
        let order = exported
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        Self {
            graph,
            exported: seen,
            order,
        }
    }

    /// Whether a missing `target` deserves a report.
    fn is_reportable(&self, dependency: &Dependency) -> bool {
        let graph = self.graph;
        let target = dependency.depend_on;
        if self.exported.contains(&target) {
            return false;
        }
        match &graph[target].kind {
            DeclKind::Class(class) if class.opaque => return false,
            DeclKind::Class(_) | DeclKind::Enum(_) => {}
            _ => return false,
        }
        if graph.is_std_decl(target) {
            // Standard classes are converted by the binding layer, except
            // for pairs which need a registration of their own.
            let name = &graph[target].name;
            if !name.starts_with("pair<") {
                return false;
            }
        }
        if dependency.reason == DependencyReason::ReturnType
            && graph[dependency.declaration].config.call_policy
                == Some(CallPolicy::ReturnOpaquePointer)
        {
            return false;
        }
        true
    }

    /// Unexported targets, sorted by full name.
    pub fn unexposed(&self) -> Vec<UnexposedDependency> {
        let graph = self.graph;
        let mut groups: BTreeMap<String, (DeclId, BTreeSet<(String, Dependency)>)> =
            BTreeMap::new();
        for id in &self.order {
            for dependency in graph.i_depend_on_them(*id) {
                if !self.is_reportable(&dependency) {
                    continue;
                }
                let target = dependency.depend_on;
                let entry = groups
                    .entry(graph.full_name(target))
                    .or_insert_with(|| (target, BTreeSet::new()));
                entry
                    .1
                    .insert((graph.full_name(dependency.declaration), dependency));
            }
        }
        groups
            .into_values()
            .map(|(target, dependents)| UnexposedDependency {
                target,
                dependents: dependents.into_iter().map(|(_, d)| d).collect(),
            })
            .collect()
    }

    /// One warning per unexported target, located at the target.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.unexposed()
            .into_iter()
            .map(|group| {
                let mut message =
                    String::from("there are declarations, which depend on the unexposed one:");
                for dependency in &group.dependents {
                    message.push_str(&format!(
                        "\n  {} ({})",
                        self.graph.full_name(dependency.declaration),
                        dependency.reason
                    ));
                }
                Diagnostic::warning(PHASE, message).at(self.graph.full_name(group.target))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use cxxbind_decl::{Access, Argument, CallableDecl, CallableKind, CppType};
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn test_exported_dependencies_are_fine() {
        let mut graph = DeclGraph::new();
        let point = graph.add_class(DeclGraph::ROOT, "Point");
        let origin = graph.add_callable(
            DeclGraph::ROOT,
            "origin",
            CallableDecl::new(CallableKind::FreeFunction).returns(CppType::Declared(point)),
        );

        let manager = DependencyManager::new(&graph, &[point, origin]);
        assert!(manager.unexposed().is_empty());
    }

    #[test]
    fn test_grouped_by_target() {
        let mut graph = DeclGraph::new();
        let hidden = graph.add_class(DeclGraph::ROOT, "Hidden");
        graph[hidden].config.ignore = true;
        let base = graph.add_class(DeclGraph::ROOT, "Base");
        let derived = graph.add_class(DeclGraph::ROOT, "Derived");
        graph.add_base(derived, hidden, Access::Public);
        let make = graph.add_callable(
            DeclGraph::ROOT,
            "make",
            CallableDecl::new(CallableKind::FreeFunction)
                .returns(CppType::Declared(hidden).pointer())
                .arg(Argument::new("b", CppType::Declared(base).constant().reference())),
        );

        let manager = DependencyManager::new(&graph, &[derived, make]);
        let groups = manager.unexposed();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].target, base);
        assert_eq!(groups[1].target, hidden);
        assert_eq!(groups[1].dependents.len(), 2);

        let diagnostics = manager.diagnostics();
        assert_eq!(diagnostics[1].location.as_deref(), Some("::Hidden"));
        assert_snapshot!(diagnostics[1].message, @r"
        there are declarations, which depend on the unexposed one:
          ::Derived (base class)
          ::make (return type)
        ");
    }

    #[test]
    fn test_std_and_opaque_targets_are_skipped() {
        let mut graph = DeclGraph::new();
        let namespace = graph.add_namespace(DeclGraph::ROOT, "std");
        let string = graph.add_class(namespace, "string");
        let pair = graph.add_class(namespace, "pair<int, int>");
        let handle = graph.add_class(DeclGraph::ROOT, "Handle");
        if let DeclKind::Class(class) = &mut graph[handle].kind {
            class.opaque = true;
        }
        let f = graph.add_callable(
            DeclGraph::ROOT,
            "f",
            CallableDecl::new(CallableKind::FreeFunction)
                .returns(CppType::Declared(pair))
                .arg(Argument::new("s", CppType::Declared(string)))
                .arg(Argument::new("h", CppType::Declared(handle).pointer())),
        );

        let groups = DependencyManager::new(&graph, &[f]).unexposed();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].target, pair);
    }

    #[test]
    fn test_opaque_return_policy_silences_return_type() {
        let mut graph = DeclGraph::new();
        let handle = graph.add_class(DeclGraph::ROOT, "Handle");
        let open = graph.add_callable(
            DeclGraph::ROOT,
            "open",
            CallableDecl::new(CallableKind::FreeFunction)
                .returns(CppType::Declared(handle).pointer()),
        );
        graph[open].config.call_policy = Some(CallPolicy::ReturnOpaquePointer);

        assert!(DependencyManager::new(&graph, &[open]).unexposed().is_empty());
    }
}
