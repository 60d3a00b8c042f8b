//! Structural dependencies between declarations.

use std::fmt;

use serde::Serialize;

use crate::{CppType, DeclGraph, DeclId, DeclKind};

/// Why one declaration needs another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyReason {
    BaseClass,
    DefaultArgumentType,
    ReturnType,
    ArgumentType,
    VariableType,
}

impl fmt::Display for DependencyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::BaseClass => "base class",
            Self::DefaultArgumentType => "default argument type",
            Self::ReturnType => "return type",
            Self::ArgumentType => "argument type",
            Self::VariableType => "variable type",
        };
        f.write_str(text)
    }
}

/// An edge `declaration -> depend_on`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Dependency {
    pub declaration: DeclId,
    pub depend_on: DeclId,
    pub reason: DependencyReason,
}

impl Dependency {
    fn new(declaration: DeclId, depend_on: DeclId, reason: DependencyReason) -> Self {
        Self {
            declaration,
            depend_on,
            reason,
        }
    }
}

impl DeclGraph {
    /// Declarations `id` structurally depends on.
    ///
    /// Only types resolving to a declaration of the graph produce edges;
    /// fundamental and named types are leaves.
    pub fn i_depend_on_them(&self, id: DeclId) -> Vec<Dependency> {
        let mut deps = Vec::new();
        let mut push = |ty: &CppType, reason| {
            if let Some(target) = ty.declared() {
                deps.push(Dependency::new(id, target, reason));
            }
            if let CppType::FunctionPointer {
                return_type,
                arguments,
            } = ty.base_type()
            {
                for inner in std::iter::once(return_type.as_ref()).chain(arguments.iter()) {
                    if let Some(target) = inner.declared() {
                        deps.push(Dependency::new(id, target, reason));
                    }
                }
            }
        };

        match self.get(id).map(|d| &d.kind) {
            Some(DeclKind::Class(class)) => {
                for base in &class.bases {
                    deps.push(Dependency::new(id, base.class, DependencyReason::BaseClass));
                }
            }
            Some(DeclKind::Callable(callable)) => {
                if let Some(ret) = &callable.return_type {
                    push(ret, DependencyReason::ReturnType);
                }
                for arg in &callable.arguments {
                    push(&arg.ty, DependencyReason::ArgumentType);
                    if arg.default_value.is_some() && !arg.has_null_pointer_default() {
                        push(&arg.ty, DependencyReason::DefaultArgumentType);
                    }
                }
            }
            Some(DeclKind::Variable(var)) => push(&var.ty, DependencyReason::VariableType),
            Some(DeclKind::Typedef { ty }) => push(ty, DependencyReason::VariableType),
            _ => {}
        }
        deps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Access, Argument, CallableDecl, CallableKind, Fundamental};

    #[test]
    fn test_class_depends_on_bases() {
        let mut graph = DeclGraph::new();
        let base = graph.add_class(DeclGraph::ROOT, "Base");
        let derived = graph.add_class(DeclGraph::ROOT, "Derived");
        graph.add_base(derived, base, Access::Public);

        let deps = graph.i_depend_on_them(derived);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].depend_on, base);
        assert_eq!(deps[0].reason, DependencyReason::BaseClass);
    }

    #[test]
    fn test_default_argument_edges_skip_null_pointers() {
        let mut graph = DeclGraph::new();
        let color = graph.add_class(DeclGraph::ROOT, "Color");
        let f = graph.add_callable(
            DeclGraph::ROOT,
            "paint",
            CallableDecl::new(CallableKind::FreeFunction)
                .returns(CppType::void())
                .arg(Argument::new("c", CppType::Declared(color)).with_default("Color()"))
                .arg(
                    Argument::new("p", CppType::Declared(color).pointer()).with_default("0"),
                )
                .arg(Argument::new("n", CppType::fundamental(Fundamental::Int))),
        );

        let deps = graph.i_depend_on_them(f);
        let defaults: Vec<_> = deps
            .iter()
            .filter(|d| d.reason == DependencyReason::DefaultArgumentType)
            .collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(
            deps.iter()
                .filter(|d| d.reason == DependencyReason::ArgumentType)
                .count(),
            2
        );
    }
}
