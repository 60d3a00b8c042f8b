//! The code-creator tree.
//!
//! The generated translation unit is modelled as a tree of nodes, each able
//! to render itself. Compound nodes (module, module body, class registration,
//! wrapper class) own an ordered child list; child order is emission order.
//!
//! ```text
//! Module
//! ├── License
//! ├── Include*
//! ├── NamespaceAlias*
//! ├── ClassWrapper* / Transformed*     (code outside the module body)
//! └── ModuleBody
//!     ├── Enum / Class / Maker ...
//!     └── Class
//!         ├── Constructor
//!         └── Maker ...
//! ```
//!
//! Rendering is a pure function of the tree: it never looks at the
//! declaration graph, so trees can be built by hand in tests.

mod kind;
mod render;
mod tree;

pub use kind::{
    AccessorNode, ArgPassing, CallCode, CastingMemberOperatorNode, ClassNode, ClassWrapperNode,
    ConstructorNode, ConstructorWrapperNode, ContainerKind, ConversionNode, CustomTextNode,
    EnumNode, EnumValue, ExportedValues, GlobalVariableNode, IndexingSuiteNode, Keyword,
    KeywordDefault, MakerNode, MakerStyle, MemberVariableNode, ModuleNode, NamespaceAliasNode,
    NodeKind, Operand, OperatorNode, PropertyNode, ShimArg, ShimKind, ShimNode,
    SpecialConstructorNode, TransformedKind, TransformedNode, UnnamedEnumNode,
};
pub use tree::{CodeTree, NodeId, TreeError};

impl CodeTree {
    /// A module tree with a license (optional), the core include, an alias
    /// for `::boost::python` (when `alias` is non-empty) and an empty body.
    pub fn module(name: &str, license: Option<&str>, alias: &str) -> Result<Self, TreeError> {
        let mut tree = Self::new(NodeKind::Module(ModuleNode {
            name: name.to_string(),
        }));
        let root = tree.root();
        if let Some(license) = license {
            let node = tree.create(NodeKind::License(license.to_string()));
            tree.adopt(root, node)?;
        }
        let include = tree.create(NodeKind::Include("boost/python.hpp".to_string()));
        tree.adopt(root, include)?;
        if !alias.is_empty() {
            let node = tree.create(NodeKind::NamespaceAlias(NamespaceAliasNode {
                alias: alias.to_string(),
                namespace: "::boost::python".to_string(),
            }));
            tree.adopt(root, node)?;
        }
        let body = tree.create(NodeKind::ModuleBody(ModuleNode {
            name: name.to_string(),
        }));
        tree.adopt(root, body)?;
        Ok(tree)
    }

    /// The `BOOST_PYTHON_MODULE` body of a module tree.
    pub fn body(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|c| matches!(self.kind(*c), Some(NodeKind::ModuleBody(_))))
    }

    /// Headers already included by the module.
    pub fn includes(&self) -> Vec<&str> {
        self.children(self.root())
            .iter()
            .filter_map(|c| match self.kind(*c) {
                Some(NodeKind::Include(header)) => Some(header.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Add an include after the existing license and include nodes.
    /// Already included headers are ignored.
    pub fn add_include(&mut self, header: &str) -> Result<(), TreeError> {
        if self.includes().contains(&header) {
            return Ok(());
        }
        let root = self.root();
        let position = self
            .children(root)
            .iter()
            .take_while(|c| matches!(self.kind(**c), Some(NodeKind::License(_) | NodeKind::Include(_))))
            .count();
        let node = self.create(NodeKind::Include(header.to_string()));
        self.adopt_at(root, node, position)
    }

    /// Adopt `node` into the module just before its body, where code that
    /// must precede the registrations (wrapper classes, helpers) lives.
    pub fn adopt_before_body(&mut self, node: NodeId) -> Result<(), TreeError> {
        let root = self.root();
        let position = self
            .children(root)
            .iter()
            .position(|c| matches!(self.kind(*c), Some(NodeKind::ModuleBody(_))))
            .unwrap_or(self.children(root).len());
        self.adopt_at(root, node, position)
    }

    /// Nodes below `id` whose payload matches `predicate`, pre-order.
    pub fn find_all(&self, id: NodeId, predicate: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| self.kind(*n).is_some_and(&predicate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn test_empty_module() {
        let mut tree = CodeTree::module("shapes", Some("// generated"), "bp").expect("module");
        tree.add_include("shapes.hpp").expect("include");
        let root = tree.root();
        assert_snapshot!(tree.render(root), @r#"
        // generated

        #include "boost/python.hpp"
        #include "shapes.hpp"

        namespace bp = boost::python;

        BOOST_PYTHON_MODULE(shapes){
        }
        "#);
    }

    #[test]
    fn test_add_include_is_idempotent() {
        let mut tree = CodeTree::module("m", None, "").expect("module");
        tree.add_include("a.hpp").expect("include");
        tree.add_include("a.hpp").expect("include");
        assert_eq!(tree.includes(), vec!["boost/python.hpp", "a.hpp"]);
    }

    #[test]
    fn test_adopt_before_body() {
        let mut tree = CodeTree::module("m", None, "bp").expect("module");
        let text = tree.create(NodeKind::CustomText(CustomTextNode {
            text: "struct X {};".to_string(),
            works_on_instance: false,
        }));
        tree.adopt_before_body(text).expect("adopt");
        let children = tree.children(tree.root());
        assert_eq!(children[children.len() - 2], text);
        assert_eq!(tree.body(), children.last().copied());
    }
}
