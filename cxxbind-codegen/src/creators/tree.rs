//! Arena holding the code-creator nodes.

use std::{cell::OnceCell, fmt};

use cxxbind_decl::DeclId;
use indexmap::IndexSet;
use thiserror::Error;

use super::{NodeKind, kind::NamespaceAliasNode, render};

/// Handle of a node inside a [`CodeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Structural misuse of the tree. Always fatal for the current pass.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("{0} does not belong to this tree")]
    UnknownNode(NodeId),
    #[error("{child} already has parent {parent}")]
    AlreadyAdopted { child: NodeId, parent: NodeId },
    #[error("{0} is a leaf and cannot own children")]
    NotCompound(NodeId),
    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("adopting {child} into {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("position {position} is past the {len} children of {parent}")]
    PositionOutOfRange {
        parent: NodeId,
        position: usize,
        len: usize,
    },
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    /// Present iff the node is compound.
    children: Option<Vec<NodeId>>,
    headers: Vec<String>,
    decl: Option<DeclId>,
    kind: NodeKind,
    cache: OnceCell<String>,
}

/// The code-creator tree: an arena of nodes rooted at a module node.
///
/// Parents are plain indices and children are owned index lists, so the tree
/// never forms reference cycles. A node has at most one parent; adopting an
/// attached node is an error, use [`CodeTree::move_to`] to re-parent.
#[derive(Debug)]
pub struct CodeTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl CodeTree {
    /// A tree whose root renders `kind`.
    pub fn new(kind: NodeKind) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.create(kind);
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let children = kind.is_compound().then(Vec::new);
        self.nodes.push(Node {
            parent: None,
            children,
            headers: Vec::new(),
            decl: None,
            kind,
            cache: OnceCell::new(),
        });
        id
    }

    /// Create a detached node decorating `decl`.
    pub fn create_for(&mut self, kind: NodeKind, decl: DeclId) -> NodeId {
        let id = self.create(kind);
        self.nodes[id.index()].decl = Some(decl);
        id
    }

    fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes.get(id.index()).ok_or(TreeError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes.get_mut(id.index()).ok_or(TreeError::UnknownNode(id))
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.index()).map(|n| &n.kind)
    }

    /// Mutable access to a payload. Cached text of the node and its
    /// ancestors is dropped.
    pub fn kind_mut(&mut self, id: NodeId) -> Result<&mut NodeKind, TreeError> {
        self.node(id)?;
        self.invalidate(id);
        Ok(&mut self.nodes[id.index()].kind)
    }

    pub fn decl(&self, id: NodeId) -> Option<DeclId> {
        self.nodes.get(id.index()).and_then(|n| n.decl)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index()).and_then(|n| n.parent)
    }

    pub fn is_compound(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.index())
            .is_some_and(|n| n.children.is_some())
    }

    /// Children in emission order; empty for leaves.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.index())
            .and_then(|n| n.children.as_deref())
            .unwrap_or(&[])
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(cur) = current {
            out.push(cur);
            current = self.parent(cur);
        }
        out
    }

    /// `id` and everything below it, pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            out.push(cur);
            stack.extend(self.children(cur).iter().rev());
        }
        out
    }

    /// Append `child` to the children of `parent`.
    pub fn adopt(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let len = self.children(parent).len();
        self.adopt_at(parent, child, len)
    }

    /// Insert `child` at `position` among the children of `parent`.
    pub fn adopt_at(
        &mut self,
        parent: NodeId,
        child: NodeId,
        position: usize,
    ) -> Result<(), TreeError> {
        let child_node = self.node(child)?;
        if let Some(current) = child_node.parent {
            return Err(TreeError::AlreadyAdopted {
                child,
                parent: current,
            });
        }
        if child == parent || self.ancestors(parent).contains(&child) {
            return Err(TreeError::Cycle { parent, child });
        }
        let is_alias = matches!(child_node.kind, NodeKind::NamespaceAlias(_));
        let children = self
            .node_mut(parent)?
            .children
            .as_mut()
            .ok_or(TreeError::NotCompound(parent))?;
        if position > children.len() {
            return Err(TreeError::PositionOutOfRange {
                parent,
                position,
                len: children.len(),
            });
        }
        children.insert(position, child);
        self.nodes[child.index()].parent = Some(parent);
        if is_alias {
            // Identifiers of every node may shorten differently now.
            self.invalidate_all();
        } else {
            self.invalidate_subtree(child);
            self.invalidate(parent);
        }
        Ok(())
    }

    /// Detach `child` from `parent`. The node stays in the arena and can be
    /// adopted again.
    pub fn remove(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.node(child)?;
        let children = self
            .node_mut(parent)?
            .children
            .as_mut()
            .ok_or(TreeError::NotCompound(parent))?;
        let position = children
            .iter()
            .position(|c| *c == child)
            .ok_or(TreeError::NotAChild { parent, child })?;
        children.remove(position);
        let was_alias = matches!(self.nodes[child.index()].kind, NodeKind::NamespaceAlias(_));
        self.nodes[child.index()].parent = None;
        if was_alias {
            self.invalidate_all();
        } else {
            self.invalidate_subtree(child);
            self.invalidate(parent);
        }
        Ok(())
    }

    /// Detach `child` from its current parent (if any) and adopt it into
    /// `parent` at `position`.
    pub fn move_to(
        &mut self,
        parent: NodeId,
        child: NodeId,
        position: usize,
    ) -> Result<(), TreeError> {
        if let Some(current) = self.node(child)?.parent {
            self.remove(current, child)?;
        }
        let len = self.children(parent).len();
        self.adopt_at(parent, child, position.min(len))
    }

    /// Declare a header the node's code needs.
    pub fn add_header(&mut self, id: NodeId, header: impl Into<String>) -> Result<(), TreeError> {
        let header = header.into();
        let node = self.node_mut(id)?;
        if !node.headers.contains(&header) {
            node.headers.push(header);
        }
        Ok(())
    }

    /// Headers of `id` and, recursively, of its children, first seen first.
    pub fn required_headers(&self, id: NodeId) -> IndexSet<String> {
        self.descendants(id)
            .into_iter()
            .flat_map(|n| self.nodes[n.index()].headers.iter().cloned())
            .collect()
    }

    /// Render `id`. The result is memoized until the subtree changes.
    pub fn render(&self, id: NodeId) -> String {
        match self.nodes.get(id.index()) {
            Some(node) => node.cache.get_or_init(|| render::render(self, id)).clone(),
            None => String::new(),
        }
    }

    /// Shorten a fully qualified identifier through the nearest namespace
    /// alias declared before `id` (as a left sibling of `id` or of one of
    /// its ancestors). Names no alias covers are returned unchanged.
    pub fn create_identifier(&self, id: NodeId, full_name: &str) -> String {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            let siblings = self.children(parent);
            let position = siblings
                .iter()
                .position(|s| *s == current)
                .unwrap_or(siblings.len());
            for sibling in siblings[..position].iter().rev() {
                if let Some(NodeKind::NamespaceAlias(alias)) = self.kind(*sibling)
                    && let Some(shortened) = apply_alias(alias, full_name)
                {
                    return shortened;
                }
            }
            current = parent;
        }
        full_name.to_string()
    }

    fn invalidate(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = &mut self.nodes[cur.index()];
            node.cache.take();
            current = node.parent;
        }
    }

    /// Text below `id` depends on the aliases in scope, which change when the
    /// subtree is re-parented.
    fn invalidate_subtree(&mut self, id: NodeId) {
        for node in self.descendants(id) {
            self.nodes[node.index()].cache.take();
        }
    }

    fn invalidate_all(&mut self) {
        for node in &mut self.nodes {
            node.cache.take();
        }
    }
}

fn apply_alias(alias: &NamespaceAliasNode, full_name: &str) -> Option<String> {
    let rest = full_name.strip_prefix(alias.namespace.as_str())?;
    let rest = rest.strip_prefix("::")?;
    Some(format!("{}::{}", alias.alias, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creators::{CustomTextNode, MakerNode, MakerStyle, ModuleNode};
    use cxxbind_decl::CallPolicy;

    fn text(tree: &mut CodeTree, text: &str) -> NodeId {
        tree.create(NodeKind::CustomText(CustomTextNode {
            text: text.to_string(),
            works_on_instance: false,
        }))
    }

    fn module() -> CodeTree {
        CodeTree::new(NodeKind::Module(ModuleNode {
            name: "m".to_string(),
        }))
    }

    #[test]
    fn test_adopt_twice_is_an_error() {
        let mut tree = module();
        let root = tree.root();
        let node = text(&mut tree, "a");
        tree.adopt(root, node).expect("first adoption");
        assert_eq!(
            tree.adopt(root, node),
            Err(TreeError::AlreadyAdopted {
                child: node,
                parent: root
            })
        );
    }

    #[test]
    fn test_adopt_into_leaf_fails() {
        let mut tree = module();
        let leaf = text(&mut tree, "a");
        let other = text(&mut tree, "b");
        assert_eq!(tree.adopt(leaf, other), Err(TreeError::NotCompound(leaf)));
    }

    #[test]
    fn test_render_follows_child_order_and_invalidates() {
        let mut tree = module();
        let root = tree.root();
        let a = text(&mut tree, "a");
        let b = text(&mut tree, "b");
        tree.adopt(root, a).expect("adopt");
        tree.adopt(root, b).expect("adopt");
        assert_eq!(tree.render(root), "a\n\nb");

        tree.remove(root, a).expect("remove");
        assert_eq!(tree.render(root), "b");

        tree.adopt_at(root, a, 1).expect("re-adopt");
        assert_eq!(tree.render(root), "b\n\na");
        assert_eq!(tree.render(root), tree.render(root));
    }

    #[test]
    fn test_remove_non_child() {
        let mut tree = module();
        let root = tree.root();
        let a = text(&mut tree, "a");
        assert_eq!(
            tree.remove(root, a),
            Err(TreeError::NotAChild {
                parent: root,
                child: a
            })
        );
    }

    #[test]
    fn test_move_to_reparents() {
        let mut tree = module();
        let root = tree.root();
        let body = tree.create(NodeKind::ModuleBody(ModuleNode {
            name: "m".to_string(),
        }));
        let a = text(&mut tree, "a");
        tree.adopt(root, body).expect("adopt body");
        tree.adopt(root, a).expect("adopt a");
        tree.move_to(body, a, 0).expect("move");
        assert_eq!(tree.parent(a), Some(body));
        assert_eq!(tree.children(root), &[body]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut tree = module();
        let root = tree.root();
        let body = tree.create(NodeKind::ModuleBody(ModuleNode {
            name: "m".to_string(),
        }));
        tree.adopt(root, body).expect("adopt");
        let outer = tree.create(NodeKind::ModuleBody(ModuleNode {
            name: "n".to_string(),
        }));
        tree.adopt(body, outer).expect("adopt");
        tree.remove(root, body).expect("detach");
        assert_eq!(
            tree.adopt(outer, body),
            Err(TreeError::Cycle {
                parent: outer,
                child: body
            })
        );
    }

    #[test]
    fn test_required_headers_union() {
        let mut tree = module();
        let root = tree.root();
        let a = text(&mut tree, "a");
        let b = text(&mut tree, "b");
        tree.add_header(root, "boost/python.hpp").expect("header");
        tree.add_header(a, "x.hpp").expect("header");
        tree.add_header(b, "x.hpp").expect("header");
        tree.adopt(root, a).expect("adopt");
        tree.adopt(root, b).expect("adopt");
        let headers: Vec<_> = tree.required_headers(root).into_iter().collect();
        assert_eq!(headers, vec!["boost/python.hpp", "x.hpp"]);
    }

    #[test]
    fn test_create_identifier_uses_preceding_alias() {
        let mut tree = module();
        let root = tree.root();
        let before = text(&mut tree, "before");
        tree.adopt(root, before).expect("adopt");
        let alias = tree.create(NodeKind::NamespaceAlias(NamespaceAliasNode {
            alias: "bp".to_string(),
            namespace: "::boost::python".to_string(),
        }));
        tree.adopt(root, alias).expect("adopt");
        let body = tree.create(NodeKind::ModuleBody(ModuleNode {
            name: "m".to_string(),
        }));
        tree.adopt(root, body).expect("adopt");
        let inner = text(&mut tree, "x");
        tree.adopt(body, inner).expect("adopt");

        assert_eq!(tree.create_identifier(inner, "::boost::python::def"), "bp::def");
        assert_eq!(
            tree.create_identifier(before, "::boost::python::def"),
            "::boost::python::def"
        );
        assert_eq!(tree.create_identifier(inner, "::std::string"), "::std::string");
    }

    #[test]
    fn test_moving_subtree_out_of_alias_scope_rerenders() {
        let mut tree = module();
        let root = tree.root();
        let alias = tree.create(NodeKind::NamespaceAlias(NamespaceAliasNode {
            alias: "bp".to_string(),
            namespace: "::boost::python".to_string(),
        }));
        tree.adopt(root, alias).expect("adopt alias");
        let body = tree.create(NodeKind::ModuleBody(ModuleNode {
            name: "m".to_string(),
        }));
        tree.adopt(root, body).expect("adopt body");
        let maker = tree.create(NodeKind::Maker(MakerNode {
            style: MakerStyle::Free,
            alias: "f".to_string(),
            full_name: "::f".to_string(),
            function: "::f".to_string(),
            signature: None,
            keywords: Vec::new(),
            call_policy: CallPolicy::Default,
            documentation: None,
        }));
        tree.adopt(body, maker).expect("adopt maker");
        assert!(tree.render(maker).contains("bp::def("));

        tree.move_to(root, body, 0).expect("move body before alias");
        let code = tree.render(maker);
        assert!(!code.contains("bp::def("), "{code}");
        assert!(code.contains("::boost::python::def("), "{code}");
    }
}
