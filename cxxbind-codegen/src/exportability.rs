//! Structural exportability of declarations.
//!
//! A declaration that cannot be bound gets [`Exportability::No`] with a
//! human readable reason. The result lives in a side table owned by the
//! compilation context; the declaration graph itself is never written.

use std::collections::BTreeMap;

use cxxbind_decl::{
    Access, CallableDecl, CallableKind, CppType, DeclGraph, DeclId, DeclKind, Exportability,
    TransformerSpec, Virtuality,
};

use crate::options::ModuleOptions;

/// Exportability of every declaration considered by a pass.
pub type ExportabilityTable = BTreeMap<DeclId, Exportability>;

/// Binary operators the binding layer can express with `self`.
pub const BINARY_OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "^", "&", "|", "<<", ">>", "+=", "-=", "*=", "/=", "%=", "^=", "&=",
    "|=", "<<=", ">>=", "==", "!=", "<", ">", "<=", ">=",
];

/// Unary operators the binding layer can express with `self`.
pub const UNARY_OPERATORS: &[&str] = &["-", "+", "!", "~"];

/// Operators exposed as named methods.
pub const CALL_OPERATORS: &[(&str, &str)] = &[("()", "__call__"), ("[]", "__getitem__")];

/// Number of operands of an operator call, counting the implicit object.
fn operand_count(callable: &CallableDecl) -> usize {
    match callable.kind {
        CallableKind::MemberOperator { .. } => callable.arguments.len() + 1,
        _ => callable.arguments.len(),
    }
}

pub fn is_supported_operator(callable: &CallableDecl) -> bool {
    let Some(symbol) = callable.kind.symbol() else {
        return true;
    };
    if CALL_OPERATORS.iter().any(|(s, _)| *s == symbol) {
        return matches!(callable.kind, CallableKind::MemberOperator { .. });
    }
    match operand_count(callable) {
        1 => UNARY_OPERATORS.contains(&symbol),
        2 => BINARY_OPERATORS.contains(&symbol),
        _ => false,
    }
}

/// The first class in `ty` that is not public, if any.
fn non_public_class(graph: &DeclGraph, ty: &CppType) -> Option<DeclId> {
    ty.declared()
        .filter(|id| graph.is_class(*id) && !graph.is_public_class(*id))
}

/// Argument indices (1-based) handled by array transformers.
fn array_transformed(specs: &[TransformerSpec]) -> Vec<usize> {
    specs
        .iter()
        .filter_map(|spec| match spec {
            TransformerSpec::InputArray { arg, .. } | TransformerSpec::OutputArray { arg, .. } => {
                Some(*arg)
            }
            _ => None,
        })
        .collect()
}

fn callable(
    graph: &DeclGraph,
    options: &ModuleOptions,
    id: DeclId,
    callable: &CallableDecl,
) -> Exportability {
    if !is_supported_operator(callable) {
        let symbol = callable.kind.symbol().unwrap_or_default();
        return Exportability::No(format!("operator{} is not supported", symbol));
    }
    if callable.arguments.len() > options.max_arity {
        return Exportability::No(format!(
            "functions with more than {} arguments are not exportable",
            options.max_arity
        ));
    }

    let transformed = array_transformed(&graph[id].config.transformers);
    let ret = callable.return_type_or_void();
    let mut types: Vec<(Option<usize>, &CppType)> = vec![(None, &ret)];
    types.extend(
        callable
            .arguments
            .iter()
            .enumerate()
            .map(|(i, arg)| (Some(i + 1), &arg.ty)),
    );

    for (index, ty) in &types {
        if ty.has_function_pointer() {
            return Exportability::No(
                "functions taking or returning function pointers are not exportable".to_string(),
            );
        }
        let handled = index.is_some_and(|i| transformed.contains(&i));
        if ty.is_array() && !handled {
            return Exportability::No(
                "functions taking or returning C arrays are not exportable".to_string(),
            );
        }
        if let Some(class) = non_public_class(graph, ty) {
            return Exportability::No(format!(
                "declarations that involve non-public class '{}' are not exportable",
                graph.full_name(class)
            ));
        }
    }
    Exportability::Yes
}

fn variable(graph: &DeclGraph, id: DeclId, ty: &CppType) -> Exportability {
    if ty.is_array() {
        return Exportability::No("variables of C array type are not exportable".to_string());
    }
    if ty.has_function_pointer() {
        return Exportability::No(
            "variables of function pointer type are not exportable".to_string(),
        );
    }
    if graph.parent_class(id).is_some() {
        if ty.is_reference() {
            return Exportability::No("reference members are not exportable".to_string());
        }
        if let Some(pointee) = ty.pointee()
            && ty.is_pointer()
            && (pointee.is_fundamental() || graph.is_enum_type(pointee))
        {
            return Exportability::No(
                "pointer members of fundamental or enum type are not exportable".to_string(),
            );
        }
    }
    if let Some(class) = non_public_class(graph, ty) {
        return Exportability::No(format!(
            "declarations that involve non-public class '{}' are not exportable",
            graph.full_name(class)
        ));
    }
    Exportability::Yes
}

/// Decide whether `id` can be bound.
pub fn check(graph: &DeclGraph, options: &ModuleOptions, id: DeclId) -> Exportability {
    let decl = &graph[id];
    match &decl.kind {
        DeclKind::Class(_) if decl.name.is_empty() => {
            Exportability::No("unnamed classes are not exportable".to_string())
        }
        DeclKind::Class(_) if !graph.is_public_class(id) => {
            Exportability::No("non-public classes are not exportable".to_string())
        }
        DeclKind::Callable(c) => callable(graph, options, id, c),
        DeclKind::Variable(v) => variable(graph, id, &v.ty),
        DeclKind::Class(_)
        | DeclKind::Enum(_)
        | DeclKind::Namespace { .. }
        | DeclKind::Typedef { .. } => Exportability::Yes,
    }
}

/// Declarations left out without a diagnostic: ignored by the user,
/// destructors, assignment operators and compiler-generated functions
/// other than constructors.
pub fn is_excluded(graph: &DeclGraph, id: DeclId) -> bool {
    let decl = &graph[id];
    if decl.config.ignore {
        return true;
    }
    match &decl.kind {
        DeclKind::Callable(c) => match &c.kind {
            CallableKind::Destructor => true,
            CallableKind::MemberOperator { symbol } if symbol == "=" => true,
            CallableKind::Constructor { .. } => false,
            _ => decl.is_artificial,
        },
        DeclKind::Typedef { .. } => true,
        _ => false,
    }
}

/// Members of a class that take part in binding: public members, protected
/// functions, and private pure virtual functions.
pub fn candidate_members(graph: &DeclGraph, class: DeclId) -> Vec<DeclId> {
    graph
        .members(class)
        .iter()
        .copied()
        .filter(|m| {
            let decl = &graph[*m];
            match decl.access {
                Access::Public => true,
                Access::Protected => graph.as_callable(*m).is_some(),
                Access::Private => graph
                    .as_callable(*m)
                    .is_some_and(|c| c.virtuality == Virtuality::PureVirtual),
            }
        })
        .collect()
}
