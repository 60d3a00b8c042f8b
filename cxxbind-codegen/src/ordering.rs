//! Emission order of declarations.
//!
//! Classes are sorted topologically over their base classes and the class
//! types of non-trivial default arguments of their member functions. The
//! remaining declarations are interleaved by a fixed priority: enumerations,
//! classes, constructors (by source line), other functions (by name),
//! variables (by name).

use std::collections::{BTreeMap, HashSet};

use cxxbind_decl::{DeclGraph, DeclId, DeclKind};

/// Result of [`order`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmissionOrder {
    pub declarations: Vec<DeclId>,
    /// `(class, dependency)` pairs closing a dependency cycle. The
    /// dependency was already being visited and was skipped.
    pub back_edges: Vec<(DeclId, DeclId)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Gray,
    Black,
}

/// The class in `set` that `id` is, or is nested in.
fn owner_in(graph: &DeclGraph, id: DeclId, set: &HashSet<DeclId>) -> Option<DeclId> {
    let mut current = Some(id);
    while let Some(cur) = current {
        if set.contains(&cur) {
            return Some(cur);
        }
        current = graph.parent(cur);
    }
    None
}

/// Classes of `set` that `class` must be emitted after, sorted by full name.
fn dependencies(graph: &DeclGraph, class: DeclId, set: &HashSet<DeclId>) -> Vec<DeclId> {
    let mut deps = BTreeMap::new();
    let mut add = |id: DeclId| {
        if let Some(owner) = owner_in(graph, id, set)
            && owner != class
        {
            deps.insert(graph.full_name(owner), owner);
        }
    };
    if let Some(decl) = graph.as_class(class) {
        for base in &decl.bases {
            add(base.class);
        }
    }
    for member in graph.descendants(class) {
        let Some(callable) = graph.as_callable(member) else {
            continue;
        };
        for arg in &callable.arguments {
            if arg.default_value.is_some()
                && !arg.has_null_pointer_default()
                && let Some(dep) = arg.ty.declared()
                && graph.is_class(dep)
            {
                add(dep);
            }
        }
    }
    deps.into_values().collect()
}

fn visit(
    graph: &DeclGraph,
    class: DeclId,
    set: &HashSet<DeclId>,
    marks: &mut BTreeMap<DeclId, Mark>,
    order: &mut EmissionOrder,
    sorted: &mut Vec<DeclId>,
) {
    marks.insert(class, Mark::Gray);
    for dep in dependencies(graph, class, set) {
        match marks.get(&dep) {
            None => visit(graph, dep, set, marks, order, sorted),
            Some(Mark::Gray) => {
                tracing::debug!(
                    class = %graph.full_name(class),
                    dependency = %graph.full_name(dep),
                    "class dependency cycle"
                );
                order.back_edges.push((class, dep));
            }
            Some(Mark::Black) => {}
        }
    }
    marks.insert(class, Mark::Black);
    sorted.push(class);
}

/// Topological order of `classes`, dependencies first.
pub fn sort_classes(graph: &DeclGraph, classes: &[DeclId]) -> EmissionOrder {
    let set: HashSet<DeclId> = classes.iter().copied().collect();
    let mut roots: Vec<(String, DeclId)> = classes
        .iter()
        .map(|id| (graph.full_name(*id), *id))
        .collect();
    roots.sort();

    let mut order = EmissionOrder::default();
    let mut marks = BTreeMap::new();
    let mut sorted = Vec::new();
    for (_, class) in roots {
        if !marks.contains_key(&class) {
            visit(graph, class, &set, &mut marks, &mut order, &mut sorted);
        }
    }
    order.declarations = sorted;
    order
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Bucket {
    Enum,
    Class,
    Constructor,
    Function,
    Variable,
    Other,
}

fn bucket(graph: &DeclGraph, id: DeclId) -> Bucket {
    match &graph[id].kind {
        DeclKind::Enum(_) => Bucket::Enum,
        DeclKind::Class(_) => Bucket::Class,
        DeclKind::Callable(c) if c.is_constructor() => Bucket::Constructor,
        DeclKind::Callable(_) => Bucket::Function,
        DeclKind::Variable(_) => Bucket::Variable,
        DeclKind::Namespace { .. } | DeclKind::Typedef { .. } => Bucket::Other,
    }
}

/// Order `declarations` for emission.
pub fn order(graph: &DeclGraph, declarations: &[DeclId]) -> EmissionOrder {
    let mut buckets: BTreeMap<Bucket, Vec<DeclId>> = BTreeMap::new();
    for id in declarations {
        buckets.entry(bucket(graph, *id)).or_default().push(*id);
    }

    let mut result = EmissionOrder::default();
    for (bucket, mut ids) in buckets {
        match bucket {
            Bucket::Class => {
                let sorted = sort_classes(graph, &ids);
                result.back_edges = sorted.back_edges;
                ids = sorted.declarations;
            }
            Bucket::Constructor => ids.sort_by_key(|id| graph[*id].location.line),
            Bucket::Function | Bucket::Variable => ids.sort_by(|a, b| graph[*a].name.cmp(&graph[*b].name)),
            Bucket::Enum | Bucket::Other => {}
        }
        result.declarations.extend(ids);
    }
    result
}
