//! Arena of declarations produced by the C++ front end.

use std::{
    collections::HashSet,
    ops::{Index, IndexMut},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    Access, BaseSpec, CallableDecl, CallableKind, ClassDecl, CppType, DeclId, DeclKind, Declaration,
    EnumDecl, Location, VariableDecl, Virtuality,
};

/// Structural problems in a declaration graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("declaration {0} does not exist")]
    UnknownDecl(DeclId),
    #[error("the first declaration must be the global namespace")]
    MissingRoot,
    #[error("declaration {child} names {parent} as its parent, but {parent} does not list it")]
    ParentMismatch { child: DeclId, parent: DeclId },
    #[error("declaration {0} has members but is not a namespace or class")]
    NotAScope(DeclId),
    #[error("declaration {0} has no parent scope")]
    Orphan(DeclId),
    #[error("declaration {0} is listed as a member more than once")]
    DuplicateMember(DeclId),
    #[error("failed to decode declaration graph: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The finalized declaration tree, addressed by [`DeclId`].
///
/// Id 0 is always the global namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclGraph {
    declarations: Vec<Declaration>,
}

impl DeclGraph {
    pub const ROOT: DeclId = DeclId(0);

    /// Create a graph holding only the global namespace.
    pub fn new() -> Self {
        Self {
            declarations: vec![Declaration {
                name: "::".to_string(),
                kind: DeclKind::Namespace {
                    members: Vec::new(),
                },
                access: Access::Public,
                parent: None,
                location: Location::default(),
                is_artificial: false,
                config: Default::default(),
            }],
        }
    }

    /// Decode a graph from the JSON emitted by the front end and validate it.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let graph: Self = serde_json::from_str(json)?;
        graph.validate()?;
        Ok(graph)
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that ids resolve and that parent and member links agree.
    pub fn validate(&self) -> Result<(), GraphError> {
        match self.declarations.first() {
            Some(Declaration {
                kind: DeclKind::Namespace { .. },
                parent: None,
                ..
            }) => {}
            _ => return Err(GraphError::MissingRoot),
        }

        let mut seen = HashSet::new();
        for (index, decl) in self.declarations.iter().enumerate() {
            let id = DeclId(index as u32);
            for member in self.members(id) {
                self.check(*member)?;
                if !seen.insert(*member) {
                    return Err(GraphError::DuplicateMember(*member));
                }
                if self.declarations[member.index()].parent != Some(id) {
                    return Err(GraphError::ParentMismatch {
                        child: *member,
                        parent: id,
                    });
                }
            }
            if let Some(parent) = decl.parent {
                self.check(parent)?;
                if !self.members(parent).contains(&id) {
                    if self.is_scope(parent) {
                        return Err(GraphError::ParentMismatch { child: id, parent });
                    }
                    return Err(GraphError::NotAScope(parent));
                }
            } else if index != 0 {
                return Err(GraphError::Orphan(id));
            }
            if let DeclKind::Class(class) = &decl.kind {
                for base in &class.bases {
                    self.check(base.class)?;
                }
            }
        }
        Ok(())
    }

    fn check(&self, id: DeclId) -> Result<(), GraphError> {
        if id.index() < self.declarations.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownDecl(id))
        }
    }

    /// Append a declaration under `parent`.
    ///
    /// The new declaration is registered as a member when `parent` is a
    /// namespace or class; otherwise [`validate`](Self::validate) reports it.
    pub fn add(&mut self, parent: DeclId, name: impl Into<String>, kind: DeclKind) -> DeclId {
        let id = DeclId(self.declarations.len() as u32);
        self.declarations.push(Declaration {
            name: name.into(),
            kind,
            access: Access::Public,
            parent: Some(parent),
            location: Location::default(),
            is_artificial: false,
            config: Default::default(),
        });
        if let Some(members) = self
            .declarations
            .get_mut(parent.index())
            .and_then(|p| p.kind.members_mut())
        {
            members.push(id);
        }
        id
    }

    pub fn add_namespace(&mut self, parent: DeclId, name: impl Into<String>) -> DeclId {
        self.add(
            parent,
            name,
            DeclKind::Namespace {
                members: Vec::new(),
            },
        )
    }

    pub fn add_class(&mut self, parent: DeclId, name: impl Into<String>) -> DeclId {
        self.add(parent, name, DeclKind::Class(ClassDecl::default()))
    }

    pub fn add_callable(
        &mut self,
        parent: DeclId,
        name: impl Into<String>,
        callable: CallableDecl,
    ) -> DeclId {
        self.add(parent, name, DeclKind::Callable(callable))
    }

    pub fn add_variable(&mut self, parent: DeclId, name: impl Into<String>, ty: CppType) -> DeclId {
        self.add(
            parent,
            name,
            DeclKind::Variable(VariableDecl {
                ty,
                is_static: false,
                bits: None,
            }),
        )
    }

    pub fn add_enum(
        &mut self,
        parent: DeclId,
        name: impl Into<String>,
        values: &[(&str, i64)],
    ) -> DeclId {
        let values = values
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect();
        self.add(parent, name, DeclKind::Enum(EnumDecl { values }))
    }

    /// Record `base` as a base class of `class`.
    pub fn add_base(&mut self, class: DeclId, base: DeclId, access: Access) {
        if let Some(DeclKind::Class(decl)) =
            self.declarations.get_mut(class.index()).map(|d| &mut d.kind)
        {
            decl.bases.push(BaseSpec {
                class: base,
                access,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.len() <= 1
    }

    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.declarations.get(id.index())
    }

    pub fn ids(&self) -> impl Iterator<Item = DeclId> + '_ {
        (0..self.declarations.len()).map(|i| DeclId(i as u32))
    }

    /// Every declaration below `scope`, depth first in member order.
    pub fn descendants(&self, scope: DeclId) -> Vec<DeclId> {
        let mut out = Vec::new();
        let mut stack: Vec<DeclId> = self.members(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.members(id).iter().rev().copied());
        }
        out
    }

    pub fn members(&self, id: DeclId) -> &[DeclId] {
        match self.get(id).map(|d| &d.kind) {
            Some(DeclKind::Namespace { members }) => members,
            Some(DeclKind::Class(class)) => &class.members,
            _ => &[],
        }
    }

    /// Members of a class with the given access.
    pub fn members_with_access(&self, id: DeclId, access: Access) -> Vec<DeclId> {
        self.members(id)
            .iter()
            .copied()
            .filter(|m| self[*m].access == access)
            .collect()
    }

    pub fn public_members(&self, id: DeclId) -> Vec<DeclId> {
        self.members_with_access(id, Access::Public)
    }

    fn is_scope(&self, id: DeclId) -> bool {
        matches!(
            self.get(id).map(|d| &d.kind),
            Some(DeclKind::Namespace { .. }) | Some(DeclKind::Class(_))
        )
    }

    pub fn parent(&self, id: DeclId) -> Option<DeclId> {
        self.get(id).and_then(|d| d.parent)
    }

    /// Fully qualified name, e.g. `::geometry::Shape::area`.
    pub fn full_name(&self, id: DeclId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == Self::ROOT {
                break;
            }
            match self.get(cur) {
                Some(decl) => {
                    parts.push(decl.name.as_str());
                    current = decl.parent;
                }
                None => break,
            }
        }
        if parts.is_empty() {
            return "::".to_string();
        }
        parts.reverse();
        format!("::{}", parts.join("::"))
    }

    /// Qualified name of an enumerator, which lives in the scope enclosing its enum.
    pub fn enum_value_full_name(&self, enumeration: DeclId, value: &str) -> String {
        match self.parent(enumeration) {
            Some(parent) if parent != Self::ROOT => format!("{}::{}", self.full_name(parent), value),
            _ => format!("::{}", value),
        }
    }

    /// Name seen by the binding layer: the configured alias or the raw name.
    pub fn alias(&self, id: DeclId) -> &str {
        let decl = &self[id];
        decl.config.alias.as_deref().unwrap_or(&decl.name)
    }

    /// All declarations whose fully qualified name is `name`.
    pub fn find_all(&self, name: &str) -> Vec<DeclId> {
        let wanted = if name.starts_with("::") {
            name.to_string()
        } else {
            format!("::{}", name)
        };
        self.ids()
            .skip(1)
            .filter(|id| self.full_name(*id) == wanted)
            .collect()
    }

    pub fn as_class(&self, id: DeclId) -> Option<&ClassDecl> {
        match self.get(id).map(|d| &d.kind) {
            Some(DeclKind::Class(class)) => Some(class),
            _ => None,
        }
    }

    pub fn as_callable(&self, id: DeclId) -> Option<&CallableDecl> {
        match self.get(id).map(|d| &d.kind) {
            Some(DeclKind::Callable(callable)) => Some(callable),
            _ => None,
        }
    }

    pub fn as_variable(&self, id: DeclId) -> Option<&VariableDecl> {
        match self.get(id).map(|d| &d.kind) {
            Some(DeclKind::Variable(var)) => Some(var),
            _ => None,
        }
    }

    pub fn as_enum(&self, id: DeclId) -> Option<&EnumDecl> {
        match self.get(id).map(|d| &d.kind) {
            Some(DeclKind::Enum(e)) => Some(e),
            _ => None,
        }
    }

    pub fn is_class(&self, id: DeclId) -> bool {
        self.as_class(id).is_some()
    }

    pub fn is_enum(&self, id: DeclId) -> bool {
        self.as_enum(id).is_some()
    }

    /// The class directly enclosing `id`, if any.
    pub fn parent_class(&self, id: DeclId) -> Option<DeclId> {
        self.parent(id).filter(|p| self.is_class(*p))
    }

    /// Outermost class enclosing `id` (or `id` itself when it is a top level class).
    pub fn top_class(&self, id: DeclId) -> Option<DeclId> {
        let mut top = if self.is_class(id) { Some(id) } else { None };
        let mut current = self.parent(id);
        while let Some(cur) = current {
            if self.is_class(cur) {
                top = Some(cur);
            }
            current = self.parent(cur);
        }
        top
    }

    /// A class is public when it and every enclosing class are public.
    pub fn is_public_class(&self, id: DeclId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if !self.is_class(cur) {
                break;
            }
            if self[cur].access != Access::Public {
                return false;
            }
            current = self.parent(cur);
        }
        true
    }

    pub fn is_std_decl(&self, id: DeclId) -> bool {
        let name = self.full_name(id);
        name == "::std" || name.starts_with("::std::")
    }

    /// Callable members of `class` with the given kind filter.
    fn callables<'a>(
        &'a self,
        class: DeclId,
        filter: impl Fn(&CallableDecl) -> bool + 'a,
    ) -> impl Iterator<Item = (DeclId, &'a CallableDecl)> + 'a {
        self.members(class).iter().filter_map(move |m| {
            self.as_callable(*m)
                .filter(|c| filter(c))
                .map(|c| (*m, c))
        })
    }

    pub fn constructors(&self, class: DeclId) -> Vec<DeclId> {
        self.callables(class, |c| c.is_constructor())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn find_copy_constructor(&self, class: DeclId) -> Option<DeclId> {
        self.callables(class, |c| c.is_copy_constructor())
            .map(|(id, _)| id)
            .next()
    }

    /// The constructor callable without arguments.
    pub fn find_trivial_constructor(&self, class: DeclId) -> Option<DeclId> {
        self.callables(class, |c| c.is_constructor() && c.arguments.is_empty())
            .map(|(id, _)| id)
            .next()
    }

    /// True when the class can be copied through a public copy constructor,
    /// declared or implicit.
    pub fn has_trivial_copy(&self, class: DeclId) -> bool {
        match self.find_copy_constructor(class) {
            Some(ctor) => self[ctor].access == Access::Public,
            None => true,
        }
    }

    pub fn has_public_destructor(&self, class: DeclId) -> bool {
        self.callables(class, |c| matches!(c.kind, CallableKind::Destructor))
            .all(|(id, _)| self[id].access == Access::Public)
    }

    /// Classes that cannot be copied by the binding layer.
    pub fn is_noncopyable(&self, class: DeclId) -> bool {
        self.is_noncopyable_inner(class, &mut HashSet::new())
    }

    fn is_noncopyable_inner(&self, class: DeclId, visited: &mut HashSet<DeclId>) -> bool {
        if !visited.insert(class) {
            return false;
        }
        if let Some(value) = self[class].config.noncopyable {
            return value;
        }
        let Some(decl) = self.as_class(class) else {
            return false;
        };
        if !self.has_trivial_copy(class) || !self.has_public_destructor(class) {
            return true;
        }
        if self.is_abstract(class) {
            return true;
        }
        let const_or_ref_member = decl.members.iter().any(|m| {
            self.as_variable(*m)
                .is_some_and(|v| !v.is_static && (v.ty.is_const() || v.ty.is_reference()))
        });
        if const_or_ref_member {
            return true;
        }
        decl.bases
            .iter()
            .any(|base| self.is_noncopyable_inner(base.class, visited))
    }

    /// All base classes, nearest first, each listed once.
    pub fn recursive_bases(&self, class: DeclId) -> Vec<DeclId> {
        let mut out: Vec<DeclId> = Vec::new();
        let mut queue: Vec<DeclId> = vec![class];
        let mut index = 0;
        while index < queue.len() {
            let current = queue[index];
            index += 1;
            if let Some(decl) = self.as_class(current) {
                for base in &decl.bases {
                    if base.class != class && !out.contains(&base.class) {
                        out.push(base.class);
                        queue.push(base.class);
                    }
                }
            }
        }
        out
    }

    /// Returns true when `a` and `b` are member functions with the same
    /// name, argument types and constness.
    pub fn same_signature(&self, a: DeclId, b: DeclId) -> bool {
        match (self.as_callable(a), self.as_callable(b)) {
            (Some(ca), Some(cb)) => {
                self[a].name == self[b].name
                    && ca.is_const == cb.is_const
                    && ca.argument_types() == cb.argument_types()
            }
            _ => false,
        }
    }

    /// Pure virtual functions of the hierarchy not implemented by `class`
    /// or any class between it and the declaring base.
    pub fn unimplemented_pure_virtuals(&self, class: DeclId) -> Vec<DeclId> {
        let mut hierarchy = vec![class];
        hierarchy.extend(self.recursive_bases(class));

        let mut out = Vec::new();
        for (depth, owner) in hierarchy.iter().enumerate() {
            for (id, _) in self.callables(*owner, |c| c.virtuality == Virtuality::PureVirtual) {
                let overridden = hierarchy[..depth].iter().any(|derived| {
                    self.callables(*derived, |c| c.virtuality != Virtuality::PureVirtual)
                        .any(|(other, _)| self.same_signature(id, other))
                });
                if !overridden && !out.iter().any(|o| self.same_signature(*o, id)) {
                    out.push(id);
                }
            }
        }
        out
    }

    pub fn is_abstract(&self, class: DeclId) -> bool {
        !self.unimplemented_pure_virtuals(class).is_empty()
    }

    /// Member functions declared with the same name in the same scope.
    pub fn overloads(&self, id: DeclId) -> Vec<DeclId> {
        let Some(parent) = self.parent(id) else {
            return Vec::new();
        };
        let name = &self[id].name;
        self.members(parent)
            .iter()
            .copied()
            .filter(|m| *m != id && self.as_callable(*m).is_some() && &self[*m].name == name)
            .collect()
    }

    /// Whether the type names an enumeration, looking through cv qualifiers.
    pub fn is_enum_type(&self, ty: &CppType) -> bool {
        matches!(ty.remove_cv(), CppType::Declared(id) if self.is_enum(*id))
    }

    /// Whether the type names a class, looking through cv qualifiers.
    pub fn is_class_type(&self, ty: &CppType) -> bool {
        matches!(ty.remove_cv(), CppType::Declared(id) if self.is_class(*id))
    }
}

impl Default for DeclGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<DeclId> for DeclGraph {
    type Output = Declaration;

    fn index(&self, id: DeclId) -> &Declaration {
        &self.declarations[id.index()]
    }
}

impl IndexMut<DeclId> for DeclGraph {
    fn index_mut(&mut self, id: DeclId) -> &mut Declaration {
        &mut self.declarations[id.index()]
    }
}

impl DeclKind {
    fn members_mut(&mut self) -> Option<&mut Vec<DeclId>> {
        match self {
            Self::Namespace { members } => Some(members),
            Self::Class(class) => Some(&mut class.members),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Argument, Fundamental};

    fn shapes() -> (DeclGraph, DeclId, DeclId) {
        let mut graph = DeclGraph::new();
        let ns = graph.add_namespace(DeclGraph::ROOT, "geometry");
        let shape = graph.add_class(ns, "Shape");
        graph.add_callable(
            shape,
            "area",
            CallableDecl::new(CallableKind::MemberFunction)
                .returns(CppType::fundamental(Fundamental::Double))
                .virtuality(Virtuality::PureVirtual)
                .constant(),
        );
        let circle = graph.add_class(ns, "Circle");
        graph.add_base(circle, shape, Access::Public);
        (graph, shape, circle)
    }

    #[test]
    fn test_full_name() {
        let (graph, shape, _) = shapes();
        assert_eq!(graph.full_name(shape), "::geometry::Shape");
        assert_eq!(graph.full_name(DeclGraph::ROOT), "::");
        assert_eq!(graph.find_all("geometry::Shape"), vec![shape]);
    }

    #[test]
    fn test_abstract_until_overridden() {
        let (mut graph, shape, circle) = shapes();
        assert!(graph.is_abstract(shape));
        assert!(graph.is_abstract(circle));

        graph.add_callable(
            circle,
            "area",
            CallableDecl::new(CallableKind::MemberFunction)
                .returns(CppType::fundamental(Fundamental::Double))
                .virtuality(Virtuality::Virtual)
                .constant(),
        );
        assert!(!graph.is_abstract(circle));
        assert!(graph.is_noncopyable(shape));
    }

    #[test]
    fn test_trivial_copy() {
        let mut graph = DeclGraph::new();
        let class = graph.add_class(DeclGraph::ROOT, "Handle");
        assert!(graph.has_trivial_copy(class));

        let ctor = graph.add_callable(
            class,
            "Handle",
            CallableDecl::new(CallableKind::Constructor {
                is_copy: true,
                is_explicit: false,
            })
            .arg(Argument::new(
                "other",
                CppType::Declared(class).constant().reference(),
            )),
        );
        graph[ctor].access = Access::Private;
        assert!(!graph.has_trivial_copy(class));
        assert!(graph.is_noncopyable(class));
    }

    #[test]
    fn test_validate_round_trip() {
        let (graph, _, _) = shapes();
        let json = graph.to_json().expect("serializable");
        let decoded = DeclGraph::from_json(&json).expect("valid graph");
        assert_eq!(decoded, graph);
    }

    #[test]
    fn test_validate_rejects_dangling_base() {
        let (mut graph, _, circle) = shapes();
        graph.add_base(circle, DeclId(99), Access::Public);
        assert!(matches!(
            graph.validate(),
            Err(GraphError::UnknownDecl(DeclId(99)))
        ));
    }

    #[test]
    fn test_top_class() {
        let mut graph = DeclGraph::new();
        let outer = graph.add_class(DeclGraph::ROOT, "Outer");
        let inner = graph.add_class(outer, "Inner");
        let method = graph.add_callable(inner, "f", CallableDecl::new(CallableKind::MemberFunction));
        assert_eq!(graph.top_class(method), Some(outer));
        assert_eq!(graph.top_class(inner), Some(outer));
        assert_eq!(graph.parent_class(method), Some(inner));
    }
}
